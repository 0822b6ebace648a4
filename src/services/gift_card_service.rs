use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::record,
    dto::gift_cards::{
        CardList, CreateCardRequest, CreateGiftCardRequest, GiftCardList, UpdateCardRequest,
        UpdateGiftCardRequest,
    },
    entity::{
        cards::{ActiveModel as CardActive, Column as CardCol, Entity as Cards, Model as CardModel},
        gift_cards::{
            ActiveModel as GiftCardActive, Column as GiftCardCol, Entity as GiftCards,
            Model as GiftCardModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::{Card, GiftCard},
    response::{ApiResponse, Meta},
    routes::params::ArchiveQuery,
    state::AppState,
};

/// Gift card numbers are `GC-<year>-<short uuid>`; unique without a
/// per-card-type counter.
fn build_gift_card_number(id: Uuid) -> String {
    let year = Utc::now().format("%Y");
    let suffix = id.to_string();
    let short = &suffix[..8];
    format!("GC-{}-{}", year, short)
}

pub async fn create_gift_card(
    state: &AppState,
    user: &AuthUser,
    payload: CreateGiftCardRequest,
) -> AppResult<ApiResponse<GiftCard>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Gift card name is required".into()));
    }
    if payload.value < 0 {
        return Err(AppError::Validation("Face value must not be negative".into()));
    }
    if let Some(expiry) = payload.expiration_date {
        if expiry <= Utc::now().date_naive() {
            return Err(AppError::Validation(
                "Expiration date must be in the future".into(),
            ));
        }
    }

    let card_type = Cards::find_by_id(payload.card_id)
        .filter(CardCol::Status.eq("active"))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let id = Uuid::new_v4();
    let gift_card = GiftCardActive {
        id: Set(id),
        card_id: Set(card_type.id),
        gift_card_number: Set(build_gift_card_number(id)),
        name: Set(payload.name),
        description: Set(payload.description),
        value: Set(payload.value),
        // New cards start at face value.
        balance: Set(payload.value),
        expiration_date: Set(payload.expiration_date),
        customer_id: Set(payload.customer_id),
        is_active: Set(payload.value > 0),
        status: Set("active".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    record(
        &state.pool,
        Some(user.user_id),
        "gift_card_create",
        Some("gift_cards"),
        Some(serde_json::json!({ "gift_card_id": gift_card.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Gift card created successfully",
        gift_card_from_entity(gift_card),
        Some(Meta::empty()),
    ))
}

pub async fn list_gift_cards(
    state: &AppState,
    query: ArchiveQuery,
) -> AppResult<ApiResponse<GiftCardList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if !query.include_archived.unwrap_or(false) {
        condition = condition.add(GiftCardCol::Status.eq("active"));
    }

    let finder = GiftCards::find()
        .filter(condition)
        .order_by_desc(GiftCardCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(gift_card_from_entity)
        .collect();

    Ok(ApiResponse::paginated("Gift cards", GiftCardList { items }, page, limit, total))
}

pub async fn get_gift_card(state: &AppState, id: Uuid) -> AppResult<ApiResponse<GiftCard>> {
    let gift_card = GiftCards::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Gift card",
        gift_card_from_entity(gift_card),
        None,
    ))
}

/// Descriptive fields only. Balance and activation are owned by the sale
/// settlement path and cannot be edited here.
pub async fn update_gift_card(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateGiftCardRequest,
) -> AppResult<ApiResponse<GiftCard>> {
    let existing = GiftCards::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: GiftCardActive = existing.into();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Gift card name is required".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(expiration_date) = payload.expiration_date {
        active.expiration_date = Set(Some(expiration_date));
    }
    if let Some(customer_id) = payload.customer_id {
        active.customer_id = Set(Some(customer_id));
    }
    let gift_card = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "gift_card_update",
        Some("gift_cards"),
        Some(serde_json::json!({ "gift_card_id": gift_card.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Gift card updated",
        gift_card_from_entity(gift_card),
        Some(Meta::empty()),
    ))
}

pub async fn archive_gift_card(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<GiftCard>> {
    ensure_manager(user)?;
    let existing = GiftCards::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.status == "archived" {
        return Err(AppError::StateConflict("Gift card already archived".into()));
    }

    let mut active: GiftCardActive = existing.into();
    active.status = Set("archived".into());
    let gift_card = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "gift_card_archive",
        Some("gift_cards"),
        Some(serde_json::json!({ "gift_card_id": gift_card.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Gift card archived",
        gift_card_from_entity(gift_card),
        Some(Meta::empty()),
    ))
}

pub async fn create_card(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCardRequest,
) -> AppResult<ApiResponse<Card>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Card name is required".into()));
    }

    let card = CardActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        status: Set("active".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    record(
        &state.pool,
        Some(user.user_id),
        "card_create",
        Some("cards"),
        Some(serde_json::json!({ "card_id": card.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Card created",
        card_from_entity(card),
        Some(Meta::empty()),
    ))
}

pub async fn list_cards(state: &AppState, query: ArchiveQuery) -> AppResult<ApiResponse<CardList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if !query.include_archived.unwrap_or(false) {
        condition = condition.add(CardCol::Status.eq("active"));
    }

    let finder = Cards::find().filter(condition).order_by_asc(CardCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(card_from_entity)
        .collect();

    Ok(ApiResponse::paginated("Cards", CardList { items }, page, limit, total))
}

fn gift_card_from_entity(model: GiftCardModel) -> GiftCard {
    GiftCard {
        id: model.id,
        card_id: model.card_id,
        gift_card_number: model.gift_card_number,
        name: model.name,
        description: model.description,
        value: model.value,
        balance: model.balance,
        expiration_date: model.expiration_date,
        customer_id: model.customer_id,
        is_active: model.is_active,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub async fn get_card(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Card>> {
    let card = Cards::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Card", card_from_entity(card), None))
}

pub async fn update_card(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCardRequest,
) -> AppResult<ApiResponse<Card>> {
    let existing = Cards::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CardActive = existing.into();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Card name is required".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    let card = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "card_update",
        Some("cards"),
        Some(serde_json::json!({ "card_id": card.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Card updated",
        card_from_entity(card),
        Some(Meta::empty()),
    ))
}

/// Archiving a card type keeps its issued gift cards redeemable; it only
/// stops new gift cards from being issued against it.
pub async fn archive_card(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Card>> {
    ensure_manager(user)?;
    let existing = Cards::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.status == "archived" {
        return Err(AppError::StateConflict("Card already archived".into()));
    }

    let mut active: CardActive = existing.into();
    active.status = Set("archived".into());
    let card = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "card_archive",
        Some("cards"),
        Some(serde_json::json!({ "card_id": card.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Card archived",
        card_from_entity(card),
        Some(Meta::empty()),
    ))
}

fn card_from_entity(model: CardModel) -> Card {
    Card {
        id: model.id,
        name: model.name,
        description: model.description,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_has_prefix_year_and_short_id() {
        let id = Uuid::new_v4();
        let number = build_gift_card_number(id);
        let year = Utc::now().format("%Y").to_string();
        assert!(number.starts_with(&format!("GC-{}-", year)));
        assert!(number.ends_with(&id.to_string()[..8]));
    }
}
