use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::record,
    dto::customers::{CreateCustomerRequest, CustomerList, UpdateCustomerRequest},
    entity::customers::{
        ActiveModel as CustomerActive, Column as CustomerCol, Entity as Customers,
        Model as CustomerModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::Customer,
    response::{ApiResponse, Meta},
    routes::params::ArchiveQuery,
    state::AppState,
};

pub async fn list_customers(
    state: &AppState,
    query: ArchiveQuery,
) -> AppResult<ApiResponse<CustomerList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if !query.include_archived.unwrap_or(false) {
        condition = condition.add(CustomerCol::Status.eq("active"));
    }

    let finder = Customers::find()
        .filter(condition)
        .order_by_asc(CustomerCol::LastName);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(customer_from_entity)
        .collect();

    Ok(ApiResponse::paginated("Customers", CustomerList { items }, page, limit, total))
}

pub async fn get_customer(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Customer>> {
    let customer = Customers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Customer",
        customer_from_entity(customer),
        None,
    ))
}

pub async fn create_customer(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCustomerRequest,
) -> AppResult<ApiResponse<Customer>> {
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Customer first and last name are required".into(),
        ));
    }

    let customer = CustomerActive {
        id: Set(Uuid::new_v4()),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
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
        "customer_create",
        Some("customers"),
        Some(serde_json::json!({ "customer_id": customer.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Customer created",
        customer_from_entity(customer),
        Some(Meta::empty()),
    ))
}

pub async fn update_customer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCustomerRequest,
) -> AppResult<ApiResponse<Customer>> {
    let existing = Customers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CustomerActive = existing.into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(email) = payload.email {
        active.email = Set(Some(email));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    let customer = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "customer_update",
        Some("customers"),
        Some(serde_json::json!({ "customer_id": customer.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Customer updated",
        customer_from_entity(customer),
        Some(Meta::empty()),
    ))
}

pub async fn archive_customer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Customer>> {
    ensure_manager(user)?;
    let existing = Customers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.status == "archived" {
        return Err(AppError::StateConflict("Customer already archived".into()));
    }

    let mut active: CustomerActive = existing.into();
    active.status = Set("archived".into());
    let customer = active.update(&state.orm).await?;

    record(
        &state.pool,
        Some(user.user_id),
        "customer_archive",
        Some("customers"),
        Some(serde_json::json!({ "customer_id": customer.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Customer archived",
        customer_from_entity(customer),
        Some(Meta::empty()),
    ))
}

fn customer_from_entity(model: CustomerModel) -> Customer {
    Customer {
        id: model.id,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        phone: model.phone,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
