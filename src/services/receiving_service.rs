use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::record,
    dto::receivings::{
        CreateReceivingRequest, ReceivingLineRequest, ReceivingList, ReceivingWithItems,
    },
    entity::{
        items::{Column as ItemCol, Entity as Items, Model as ItemModel},
        receiving_items::{
            ActiveModel as ReceivingItemActive, Column as ReceivingItemCol,
            Entity as ReceivingItems, Model as ReceivingItemModel,
        },
        receivings::{
            ActiveModel as ReceivingActive, Column as ReceivingCol, Entity as Receivings,
            Model as ReceivingModel,
        },
        suppliers::{Column as SupplierCol, Entity as Suppliers},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_manager},
    models::{Receiving, ReceivingItem},
    response::{ApiResponse, Meta},
    routes::params::ReceivingListQuery,
    state::AppState,
};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_COMPLETED: &str = "completed";

/// Per-line money for a receiving: gross cost, whole-percent discount and
/// the net amount actually owed. Integer cents, discount rounded down.
pub fn receiving_line_totals(cost: i64, qty: i32, discount_pct: i32) -> (i64, i64, i64) {
    let gross = cost * qty as i64;
    let discount = gross * discount_pct as i64 / 100;
    (gross, discount, gross - discount)
}

fn validate_lines(lines: &[ReceivingLineRequest]) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::Validation(
            "Receiving needs at least one line".into(),
        ));
    }
    for line in lines {
        if line.qty < 1 {
            return Err(AppError::Validation("Line quantity must be at least 1".into()));
        }
        if let Some(pct) = line.discount_pct {
            if !(0..=100).contains(&pct) {
                return Err(AppError::Validation(
                    "Line discount must be between 0 and 100 percent".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Create a purchase order in `pending` state. Costs are snapshotted from
/// the catalog; stock is untouched until completion.
pub async fn create_receiving(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReceivingRequest,
) -> AppResult<ApiResponse<ReceivingWithItems>> {
    ensure_manager(user)?;
    validate_lines(&payload.items)?;

    let txn = state.orm.begin().await?;

    let supplier = Suppliers::find_by_id(payload.supplier_id)
        .filter(SupplierCol::Status.eq("active"))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    // Every line must come from the selected supplier; a purchase order
    // cannot mix catalogs.
    let mut resolved: Vec<(ItemModel, &ReceivingLineRequest)> =
        Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        let item = Items::find_by_id(line.item_id)
            .filter(ItemCol::Status.eq("active"))
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        if item.supplier_id != Some(supplier.id) {
            return Err(AppError::Validation(format!(
                "Item {} does not belong to the selected supplier",
                item.name
            )));
        }
        resolved.push((item, line));
    }

    let mut total = 0;
    let mut discount_total = 0;
    for (item, line) in &resolved {
        let (gross, discount, _) =
            receiving_line_totals(item.cost, line.qty, line.discount_pct.unwrap_or(0));
        total += gross;
        discount_total += discount;
    }

    let receiving = ReceivingActive {
        id: Set(Uuid::new_v4()),
        supplier_id: Set(supplier.id),
        expected_delivery_date: Set(payload.expected_delivery_date),
        order_notes: Set(payload.order_notes.clone()),
        total: Set(total),
        discount_total: Set(discount_total),
        amount_due: Set(total - discount_total),
        status: Set(STATUS_PENDING.into()),
        created_by: Set(user.user_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut receiving_items = Vec::with_capacity(resolved.len());
    for (item, line) in &resolved {
        let pct = line.discount_pct.unwrap_or(0);
        let (_, _, net) = receiving_line_totals(item.cost, line.qty, pct);
        let row = ReceivingItemActive {
            id: Set(Uuid::new_v4()),
            receiving_id: Set(receiving.id),
            item_id: Set(item.id),
            cost: Set(item.cost),
            qty: Set(line.qty),
            discount_pct: Set(pct),
            total: Set(net),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        receiving_items.push(receiving_item_from_entity(row));
    }

    txn.commit().await?;

    record(
        &state.pool,
        Some(user.user_id),
        "receiving_create",
        Some("receivings"),
        Some(serde_json::json!({
            "receiving_id": receiving.id,
            "amount_due": receiving.amount_due,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Receiving created successfully",
        ReceivingWithItems {
            receiving: receiving_from_entity(receiving),
            items: receiving_items,
        },
        Some(Meta::empty()),
    ))
}

/// One-way completion: increments stock per line exactly once. The locked
/// status check is the idempotency guard; a second completion attempt
/// fails with a state conflict instead of double-applying stock.
pub async fn complete_receiving(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ReceivingWithItems>> {
    ensure_manager(user)?;
    let txn = state.orm.begin().await?;

    let receiving = Receivings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if receiving.status == STATUS_COMPLETED {
        return Err(AppError::StateConflict(
            "Receiving already completed".into(),
        ));
    }

    let lines = ReceivingItems::find()
        .filter(ReceivingItemCol::ReceivingId.eq(receiving.id))
        .all(&txn)
        .await?;

    for line in &lines {
        Items::update_many()
            .col_expr(ItemCol::Stock, Expr::col(ItemCol::Stock).add(line.qty))
            .filter(ItemCol::Id.eq(line.item_id))
            .exec(&txn)
            .await?;
    }

    let mut active: ReceivingActive = receiving.into();
    active.status = Set(STATUS_COMPLETED.into());
    active.updated_at = Set(Utc::now().into());
    let receiving = active.update(&txn).await?;

    txn.commit().await?;

    record(
        &state.pool,
        Some(user.user_id),
        "receiving_complete",
        Some("receivings"),
        Some(serde_json::json!({ "receiving_id": receiving.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Receiving completed and stock updated",
        ReceivingWithItems {
            receiving: receiving_from_entity(receiving),
            items: lines.into_iter().map(receiving_item_from_entity).collect(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_receivings(
    state: &AppState,
    query: ReceivingListQuery,
) -> AppResult<ApiResponse<ReceivingList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ReceivingCol::Status.eq(status.clone()));
    }
    if let Some(supplier_id) = query.supplier_id {
        condition = condition.add(ReceivingCol::SupplierId.eq(supplier_id));
    }

    let finder = Receivings::find()
        .filter(condition)
        .order_by_desc(ReceivingCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let receivings = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(receiving_from_entity)
        .collect();

    Ok(ApiResponse::paginated(
        "Receivings",
        ReceivingList { items: receivings },
        page,
        limit,
        total,
    ))
}

pub async fn get_receiving(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<ReceivingWithItems>> {
    let receiving = Receivings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = ReceivingItems::find()
        .filter(ReceivingItemCol::ReceivingId.eq(receiving.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(receiving_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Receiving found",
        ReceivingWithItems {
            receiving: receiving_from_entity(receiving),
            items,
        },
        Some(Meta::empty()),
    ))
}

fn receiving_from_entity(model: ReceivingModel) -> Receiving {
    Receiving {
        id: model.id,
        supplier_id: model.supplier_id,
        expected_delivery_date: model.expected_delivery_date,
        order_notes: model.order_notes,
        total: model.total,
        discount_total: model.discount_total,
        amount_due: model.amount_due,
        status: model.status,
        created_by: model.created_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn receiving_item_from_entity(model: ReceivingItemModel) -> ReceivingItem {
    ReceivingItem {
        id: model.id,
        receiving_id: model.receiving_id,
        item_id: model.item_id,
        cost: model.cost,
        qty: model.qty,
        discount_pct: model.discount_pct,
        total: model.total,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
