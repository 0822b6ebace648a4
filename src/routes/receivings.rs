use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::receivings::{CreateReceivingRequest, ReceivingList, ReceivingWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::ReceivingListQuery,
    services::receiving_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_receivings))
        .route("/", post(create_receiving))
        .route("/{id}", get(get_receiving))
        .route("/{id}/complete", post(complete_receiving))
}

#[utoipa::path(
    get,
    path = "/api/receivings",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("supplier_id" = Option<Uuid>, Query, description = "Filter by supplier"),
    ),
    responses(
        (status = 200, description = "List receivings", body = ApiResponse<ReceivingList>)
    ),
    tag = "Receivings"
)]
pub async fn list_receivings(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ReceivingListQuery>,
) -> AppResult<Json<ApiResponse<ReceivingList>>> {
    let resp = receiving_service::list_receivings(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/receivings/{id}",
    params(("id" = Uuid, Path, description = "Receiving ID")),
    responses(
        (status = 200, description = "Get receiving with items", body = ApiResponse<ReceivingWithItems>),
        (status = 404, description = "Receiving not found"),
    ),
    tag = "Receivings"
)]
pub async fn get_receiving(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReceivingWithItems>>> {
    let resp = receiving_service::get_receiving(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/receivings",
    request_body = CreateReceivingRequest,
    responses(
        (status = 200, description = "Receiving created in pending state", body = ApiResponse<ReceivingWithItems>),
        (status = 400, description = "Validation failure"),
    ),
    tag = "Receivings"
)]
pub async fn create_receiving(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateReceivingRequest>,
) -> AppResult<Json<ApiResponse<ReceivingWithItems>>> {
    let resp = receiving_service::create_receiving(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/receivings/{id}/complete",
    params(("id" = Uuid, Path, description = "Receiving ID")),
    responses(
        (status = 200, description = "Receiving completed, stock incremented", body = ApiResponse<ReceivingWithItems>),
        (status = 409, description = "Receiving already completed"),
    ),
    tag = "Receivings"
)]
pub async fn complete_receiving(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReceivingWithItems>>> {
    let resp = receiving_service::complete_receiving(&state, &user, id).await?;
    Ok(Json(resp))
}
