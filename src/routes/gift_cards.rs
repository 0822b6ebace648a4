use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::gift_cards::{
        CardList, CreateCardRequest, CreateGiftCardRequest, GiftCardList, UpdateCardRequest,
        UpdateGiftCardRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Card, GiftCard},
    response::ApiResponse,
    routes::params::ArchiveQuery,
    services::gift_card_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_gift_cards))
        .route("/", post(create_gift_card))
        .route("/cards", get(list_cards))
        .route("/cards", post(create_card))
        .route("/cards/{id}", get(get_card))
        .route("/cards/{id}", put(update_card))
        .route("/cards/{id}/archive", post(archive_card))
        .route("/{id}", get(get_gift_card))
        .route("/{id}", put(update_gift_card))
        .route("/{id}/archive", post(archive_gift_card))
}

#[utoipa::path(
    get,
    path = "/api/gift-cards",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
        ("include_archived" = Option<bool>, Query, description = "Include archived cards"),
    ),
    responses(
        (status = 200, description = "List gift cards", body = ApiResponse<GiftCardList>)
    ),
    tag = "GiftCards"
)]
pub async fn list_gift_cards(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ArchiveQuery>,
) -> AppResult<Json<ApiResponse<GiftCardList>>> {
    let resp = gift_card_service::list_gift_cards(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/gift-cards/{id}",
    params(("id" = Uuid, Path, description = "Gift card ID")),
    responses(
        (status = 200, description = "Get gift card", body = ApiResponse<GiftCard>),
        (status = 404, description = "Gift card not found"),
    ),
    tag = "GiftCards"
)]
pub async fn get_gift_card(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<GiftCard>>> {
    let resp = gift_card_service::get_gift_card(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/gift-cards",
    request_body = CreateGiftCardRequest,
    responses(
        (status = 201, description = "Create gift card", body = ApiResponse<GiftCard>)
    ),
    tag = "GiftCards"
)]
pub async fn create_gift_card(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateGiftCardRequest>,
) -> AppResult<Json<ApiResponse<GiftCard>>> {
    let resp = gift_card_service::create_gift_card(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/gift-cards/{id}",
    params(("id" = Uuid, Path, description = "Gift card ID")),
    request_body = UpdateGiftCardRequest,
    responses(
        (status = 200, description = "Updated gift card", body = ApiResponse<GiftCard>)
    ),
    tag = "GiftCards"
)]
pub async fn update_gift_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGiftCardRequest>,
) -> AppResult<Json<ApiResponse<GiftCard>>> {
    let resp = gift_card_service::update_gift_card(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/gift-cards/{id}/archive",
    params(("id" = Uuid, Path, description = "Gift card ID")),
    responses(
        (status = 200, description = "Gift card archived", body = ApiResponse<GiftCard>),
        (status = 409, description = "Gift card already archived"),
    ),
    tag = "GiftCards"
)]
pub async fn archive_gift_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<GiftCard>>> {
    let resp = gift_card_service::archive_gift_card(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/gift-cards/cards",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
    ),
    responses(
        (status = 200, description = "List card types", body = ApiResponse<CardList>)
    ),
    tag = "GiftCards"
)]
pub async fn list_cards(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ArchiveQuery>,
) -> AppResult<Json<ApiResponse<CardList>>> {
    let resp = gift_card_service::list_cards(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/gift-cards/cards",
    request_body = CreateCardRequest,
    responses(
        (status = 201, description = "Create card type", body = ApiResponse<Card>)
    ),
    tag = "GiftCards"
)]
pub async fn create_card(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCardRequest>,
) -> AppResult<Json<ApiResponse<Card>>> {
    let resp = gift_card_service::create_card(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/gift-cards/cards/{id}",
    params(("id" = Uuid, Path, description = "Card ID")),
    responses(
        (status = 200, description = "Get card", body = ApiResponse<Card>),
        (status = 404, description = "Card not found"),
    ),
    tag = "GiftCards"
)]
pub async fn get_card(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Card>>> {
    let resp = gift_card_service::get_card(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/gift-cards/cards/{id}",
    params(("id" = Uuid, Path, description = "Card ID")),
    request_body = UpdateCardRequest,
    responses(
        (status = 200, description = "Updated card", body = ApiResponse<Card>)
    ),
    tag = "GiftCards"
)]
pub async fn update_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCardRequest>,
) -> AppResult<Json<ApiResponse<Card>>> {
    let resp = gift_card_service::update_card(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/gift-cards/cards/{id}/archive",
    params(("id" = Uuid, Path, description = "Card ID")),
    responses(
        (status = 200, description = "Card archived", body = ApiResponse<Card>),
        (status = 403, description = "Caller is not a manager"),
        (status = 409, description = "Card already archived"),
    ),
    tag = "GiftCards"
)]
pub async fn archive_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Card>>> {
    let resp = gift_card_service::archive_card(&state, &user, id).await?;
    Ok(Json(resp))
}
