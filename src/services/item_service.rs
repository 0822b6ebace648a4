use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit::record,
    dto::items::{
        CategoryList, CreateCategoryRequest, CreateItemRequest, ItemList, UpdateCategoryRequest,
        UpdateItemRequest,
    },
    entity::{
        categories::{
            ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories,
            Model as CategoryModel,
        },
        items::{ActiveModel as ItemActive, Column as ItemCol, Entity as Items, Model as ItemModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::{Category, Item},
    response::{ApiResponse, Meta},
    routes::params::{ArchiveQuery, ItemQuery},
    state::AppState,
};

pub async fn list_items(state: &AppState, query: ItemQuery) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if !query.include_archived.unwrap_or(false) {
        condition = condition.add(ItemCol::Status.eq("active"));
    }

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ItemCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ItemCol::Barcode).ilike(pattern)),
        );
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(ItemCol::CategoryId.eq(category_id));
    }

    if let Some(supplier_id) = query.supplier_id {
        condition = condition.add(ItemCol::SupplierId.eq(supplier_id));
    }

    if query.low_stock.unwrap_or(false) {
        condition = condition.add(Expr::col(ItemCol::Stock).lte(Expr::col(ItemCol::MinStock)));
    }

    let finder = Items::find()
        .filter(condition)
        .order_by_asc(ItemCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(item_from_entity)
        .collect();

    Ok(ApiResponse::paginated("Items", ItemList { items }, page, limit, total))
}

pub async fn get_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Item>> {
    let item = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Item", item_from_entity(item), None))
}

pub async fn create_item(
    state: &AppState,
    user: &AuthUser,
    payload: CreateItemRequest,
) -> AppResult<ApiResponse<Item>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Item name is required".into()));
    }
    if payload.price < 0 || payload.cost < 0 {
        return Err(AppError::Validation("Price and cost must not be negative".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::Validation("Stock must not be negative".into()));
    }

    let item = ItemActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        category_id: Set(payload.category_id),
        supplier_id: Set(payload.supplier_id),
        cost: Set(payload.cost),
        price: Set(payload.price),
        stock: Set(payload.stock),
        min_stock: Set(payload.min_stock.unwrap_or(0)),
        barcode: Set(payload.barcode),
        status: Set("active".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    record(
        &state.pool,
        Some(user.user_id),
        "item_create",
        Some("items"),
        Some(serde_json::json!({ "item_id": item.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Item created",
        item_from_entity(item),
        Some(Meta::empty()),
    ))
}

/// Catalog edits never touch stock; stock only moves through settlement
/// (sales decrement, receivings increment).
pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateItemRequest,
) -> AppResult<ApiResponse<Item>> {
    let existing = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if payload.price.is_some_and(|p| p < 0) || payload.cost.is_some_and(|c| c < 0) {
        return Err(AppError::Validation("Price and cost must not be negative".into()));
    }

    let mut active: ItemActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(supplier_id) = payload.supplier_id {
        active.supplier_id = Set(Some(supplier_id));
    }
    if let Some(cost) = payload.cost {
        active.cost = Set(cost);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(min_stock) = payload.min_stock {
        active.min_stock = Set(min_stock);
    }
    if let Some(barcode) = payload.barcode {
        active.barcode = Set(Some(barcode));
    }
    let item = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "item_update",
        Some("items"),
        Some(serde_json::json!({ "item_id": item.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Item updated",
        item_from_entity(item),
        Some(Meta::empty()),
    ))
}

/// Soft delete. Archived items stay readable (sale history references
/// them) but are excluded from settlement lookups and default listings.
pub async fn archive_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Item>> {
    ensure_manager(user)?;
    let existing = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.status == "archived" {
        return Err(AppError::StateConflict("Item already archived".into()));
    }

    let mut active: ItemActive = existing.into();
    active.status = Set("archived".into());
    let item = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "item_archive",
        Some("items"),
        Some(serde_json::json!({ "item_id": item.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Item archived",
        item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Category name is required".into()));
    }

    let category = CategoryActive {
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
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(
    state: &AppState,
    query: ArchiveQuery,
) -> AppResult<ApiResponse<CategoryList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if !query.include_archived.unwrap_or(false) {
        condition = condition.add(CategoryCol::Status.eq("active"));
    }

    let finder = Categories::find()
        .filter(condition)
        .order_by_asc(CategoryCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    Ok(ApiResponse::paginated("Categories", CategoryList { items }, page, limit, total))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Category",
        category_from_entity(category),
        None,
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CategoryActive = existing.into();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Category name is required".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    let category = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "category_update",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Category updated",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn archive_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Category>> {
    ensure_manager(user)?;
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.status == "archived" {
        return Err(AppError::StateConflict("Category already archived".into()));
    }

    let mut active: CategoryActive = existing.into();
    active.status = Set("archived".into());
    let category = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "category_archive",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Category archived",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

fn item_from_entity(model: ItemModel) -> Item {
    Item {
        id: model.id,
        name: model.name,
        description: model.description,
        category_id: model.category_id,
        supplier_id: model.supplier_id,
        cost: model.cost,
        price: model.price,
        stock: model.stock,
        min_stock: model.min_stock,
        barcode: model.barcode,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        description: model.description,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
