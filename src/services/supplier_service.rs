use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::record,
    dto::suppliers::{CreateSupplierRequest, SupplierList, UpdateSupplierRequest},
    entity::suppliers::{
        ActiveModel as SupplierActive, Column as SupplierCol, Entity as Suppliers,
        Model as SupplierModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::Supplier,
    response::{ApiResponse, Meta},
    routes::params::ArchiveQuery,
    state::AppState,
};

pub async fn list_suppliers(
    state: &AppState,
    query: ArchiveQuery,
) -> AppResult<ApiResponse<SupplierList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if !query.include_archived.unwrap_or(false) {
        condition = condition.add(SupplierCol::Status.eq("active"));
    }

    let finder = Suppliers::find()
        .filter(condition)
        .order_by_asc(SupplierCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(supplier_from_entity)
        .collect();

    Ok(ApiResponse::paginated("Suppliers", SupplierList { items }, page, limit, total))
}

pub async fn get_supplier(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Supplier>> {
    let supplier = Suppliers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Supplier",
        supplier_from_entity(supplier),
        None,
    ))
}

pub async fn create_supplier(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSupplierRequest,
) -> AppResult<ApiResponse<Supplier>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Supplier name is required".into()));
    }

    let supplier = SupplierActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        contact_person: Set(payload.contact_person),
        email: Set(payload.email),
        phone: Set(payload.phone),
        status: Set("active".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    record(
        &state.pool,
        Some(user.user_id),
        "supplier_create",
        Some("suppliers"),
        Some(serde_json::json!({ "supplier_id": supplier.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Supplier created",
        supplier_from_entity(supplier),
        Some(Meta::empty()),
    ))
}

pub async fn update_supplier(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateSupplierRequest,
) -> AppResult<ApiResponse<Supplier>> {
    let existing = Suppliers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: SupplierActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(contact_person) = payload.contact_person {
        active.contact_person = Set(Some(contact_person));
    }
    if let Some(email) = payload.email {
        active.email = Set(Some(email));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    let supplier = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "supplier_update",
        Some("suppliers"),
        Some(serde_json::json!({ "supplier_id": supplier.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Supplier updated",
        supplier_from_entity(supplier),
        Some(Meta::empty()),
    ))
}

pub async fn archive_supplier(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Supplier>> {
    ensure_manager(user)?;
    let existing = Suppliers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.status == "archived" {
        return Err(AppError::StateConflict("Supplier already archived".into()));
    }

    let mut active: SupplierActive = existing.into();
    active.status = Set("archived".into());
    let supplier = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "supplier_archive",
        Some("suppliers"),
        Some(serde_json::json!({ "supplier_id": supplier.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Supplier archived",
        supplier_from_entity(supplier),
        Some(Meta::empty()),
    ))
}

fn supplier_from_entity(model: SupplierModel) -> Supplier {
    Supplier {
        id: model.id,
        name: model.name,
        contact_person: model.contact_person,
        email: model.email,
        phone: model.phone,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
