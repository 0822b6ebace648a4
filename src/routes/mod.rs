use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod customers;
pub mod doc;
pub mod gift_cards;
pub mod health;
pub mod items;
pub mod params;
pub mod receivings;
pub mod sales;
pub mod suppliers;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/items", items::router())
        .nest("/gift-cards", gift_cards::router())
        .nest("/customers", customers::router())
        .nest("/suppliers", suppliers::router())
        .nest("/sales", sales::router())
        .nest("/receivings", receivings::router())
}
