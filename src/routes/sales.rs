use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::sales::{
        CompleteHeldSaleRequest, CreateSaleRequest, HoldSaleRequest, SaleList, SaleWithItems,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Sale,
    response::ApiResponse,
    routes::params::SaleListQuery,
    services::sale_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales))
        .route("/", post(create_sale))
        .route("/held", get(list_held_sales))
        .route("/hold", post(hold_sale))
        .route("/{id}", get(get_sale))
        .route("/{id}/complete", post(complete_held_sale))
        .route("/{id}/void", post(void_held_sale))
}

#[utoipa::path(
    get,
    path = "/api/sales",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
        ("status" = Option<String>, Query, description = "Filter by sale status"),
        ("customer_id" = Option<Uuid>, Query, description = "Filter by customer"),
    ),
    responses(
        (status = 200, description = "List sales", body = ApiResponse<SaleList>)
    ),
    tag = "Sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SaleListQuery>,
) -> AppResult<Json<ApiResponse<SaleList>>> {
    let resp = sale_service::list_sales(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sales/held",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
    ),
    responses(
        (status = 200, description = "List held sales, oldest first", body = ApiResponse<SaleList>)
    ),
    tag = "Sales"
)]
pub async fn list_held_sales(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SaleListQuery>,
) -> AppResult<Json<ApiResponse<SaleList>>> {
    let resp = sale_service::list_held_sales(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    params(("id" = Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Get sale with items", body = ApiResponse<SaleWithItems>),
        (status = 404, description = "Sale not found"),
    ),
    tag = "Sales"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SaleWithItems>>> {
    let resp = sale_service::get_sale(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/sales",
    request_body = CreateSaleRequest,
    responses(
        (status = 200, description = "Sale settled", body = ApiResponse<SaleWithItems>),
        (status = 400, description = "Validation or payment failure"),
        (status = 409, description = "Insufficient stock"),
    ),
    tag = "Sales"
)]
pub async fn create_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSaleRequest>,
) -> AppResult<Json<ApiResponse<SaleWithItems>>> {
    let resp = sale_service::create_sale(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/sales/hold",
    request_body = HoldSaleRequest,
    responses(
        (status = 200, description = "Sale parked", body = ApiResponse<SaleWithItems>)
    ),
    tag = "Sales"
)]
pub async fn hold_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<HoldSaleRequest>,
) -> AppResult<Json<ApiResponse<SaleWithItems>>> {
    let resp = sale_service::hold_sale(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/sales/{id}/complete",
    params(("id" = Uuid, Path, description = "Sale ID")),
    request_body = CompleteHeldSaleRequest,
    responses(
        (status = 200, description = "Held sale settled", body = ApiResponse<SaleWithItems>),
        (status = 409, description = "Sale not held, or insufficient stock"),
    ),
    tag = "Sales"
)]
pub async fn complete_held_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteHeldSaleRequest>,
) -> AppResult<Json<ApiResponse<SaleWithItems>>> {
    let resp = sale_service::complete_held_sale(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/sales/{id}/void",
    params(("id" = Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Held sale voided", body = ApiResponse<Sale>),
        (status = 409, description = "Sale is not held"),
    ),
    tag = "Sales"
)]
pub async fn void_held_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Sale>>> {
    let resp = sale_service::void_held_sale(&state, &user, id).await?;
    Ok(Json(resp))
}
