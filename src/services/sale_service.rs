use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::record,
    dto::sales::{
        CompleteHeldSaleRequest, CreateSaleRequest, HoldSaleRequest, Receipt, ReceiptLine,
        SaleLineRequest, SaleList, SaleWithItems,
    },
    entity::{
        customers::{Column as CustomerCol, Entity as Customers},
        gift_cards::{
            ActiveModel as GiftCardActive, Column as GiftCardCol, Entity as GiftCards,
            Model as GiftCardModel,
        },
        items::{Column as ItemCol, Entity as Items, Model as ItemModel},
        sale_items::{
            ActiveModel as SaleItemActive, Column as SaleItemCol, Entity as SaleItems,
            Model as SaleItemModel,
        },
        sales::{ActiveModel as SaleActive, Column as SaleCol, Entity as Sales, Model as SaleModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Sale, SaleItem},
    response::{ApiResponse, Meta},
    routes::params::{SaleListQuery, SortOrder},
    state::AppState,
};

pub const STATUS_HELD: &str = "held";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_VOIDED: &str = "voided";

const PAYMENT_TYPES: [&str; 3] = ["cash", "card", "e_wallet"];

/// Outcome of debiting a gift card against a sale total. Pure arithmetic;
/// nothing is persisted until the caller writes it back inside the
/// settlement transaction.
#[derive(Debug, PartialEq, Eq)]
pub struct GiftCardDebit {
    pub discount: i64,
    pub new_balance: i64,
    pub still_active: bool,
}

/// discount = min(balance, total); the card dies when its balance hits zero.
pub fn gift_card_debit(balance: i64, total: i64) -> GiftCardDebit {
    let discount = balance.min(total);
    let new_balance = balance - discount;
    GiftCardDebit {
        discount,
        new_balance,
        still_active: new_balance > 0,
    }
}

fn validate_payment_type(payment_type: Option<&str>) -> AppResult<String> {
    // The original register defaults to cash when the cashier picks nothing.
    let pt = payment_type.unwrap_or("cash");
    if PAYMENT_TYPES.contains(&pt) {
        Ok(pt.to_string())
    } else {
        Err(AppError::Validation(format!(
            "Unknown payment type '{pt}'"
        )))
    }
}

fn validate_lines(lines: &[SaleLineRequest]) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::Validation("Sale needs at least one line".into()));
    }
    if lines.iter().any(|l| l.qty < 1) {
        return Err(AppError::Validation("Line quantity must be at least 1".into()));
    }
    Ok(())
}

async fn ensure_customer_exists(
    txn: &DatabaseTransaction,
    customer_id: Option<Uuid>,
) -> AppResult<()> {
    if let Some(id) = customer_id {
        let found = Customers::find_by_id(id)
            .filter(CustomerCol::Status.eq("active"))
            .one(txn)
            .await?;
        if found.is_none() {
            return Err(AppError::NotFound);
        }
    }
    Ok(())
}

/// Lock and validate every requested line before anything is written. Each
/// item row stays locked for the rest of the transaction, so the stock
/// figures checked here are the ones the decrements run against. A basket
/// may list the same item on several lines, so quantities are summed per
/// item before they are held against stock.
async fn lock_and_check_lines(
    txn: &DatabaseTransaction,
    lines: &[SaleLineRequest],
) -> AppResult<Vec<(ItemModel, i32)>> {
    let mut checked = Vec::with_capacity(lines.len());
    let mut requested: HashMap<Uuid, i32> = HashMap::new();
    for line in lines {
        let item = Items::find_by_id(line.item_id)
            .filter(ItemCol::Status.eq("active"))
            .lock(LockType::Update)
            .one(txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let qty = requested.entry(item.id).or_insert(0);
        *qty += line.qty;
        if *qty > item.stock {
            return Err(AppError::InsufficientStock { item: item.name });
        }
        checked.push((item, line.qty));
    }
    Ok(checked)
}

/// Resolve an active, non-archived gift card, debit it against `total` and
/// deactivate it when the balance reaches zero. Caller must already be
/// inside the settlement transaction.
async fn apply_gift_card(
    txn: &DatabaseTransaction,
    gift_card_id: Uuid,
    total: i64,
) -> AppResult<i64> {
    let card: GiftCardModel = GiftCards::find_by_id(gift_card_id)
        .filter(
            Condition::all()
                .add(GiftCardCol::IsActive.eq(true))
                .add(GiftCardCol::Status.eq("active")),
        )
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let debit = gift_card_debit(card.balance, total);

    let mut active: GiftCardActive = card.into();
    active.balance = Set(debit.new_balance);
    active.is_active = Set(debit.still_active);
    active.update(txn).await?;

    Ok(debit.discount)
}

async fn insert_lines_and_decrement(
    txn: &DatabaseTransaction,
    sale_id: Uuid,
    checked: &[(ItemModel, i32)],
) -> AppResult<Vec<SaleItem>> {
    let mut sale_items = Vec::with_capacity(checked.len());
    for (item, qty) in checked {
        let line = SaleItemActive {
            id: Set(Uuid::new_v4()),
            sale_id: Set(sale_id),
            item_id: Set(item.id),
            quantity: Set(*qty),
            price: Set(item.price),
            total: Set(item.price * (*qty as i64)),
            created_at: NotSet,
        }
        .insert(txn)
        .await?;
        sale_items.push(sale_item_from_entity(line));

        Items::update_many()
            .col_expr(ItemCol::Stock, Expr::col(ItemCol::Stock).sub(*qty))
            .filter(ItemCol::Id.eq(item.id))
            .exec(txn)
            .await?;
    }
    Ok(sale_items)
}

fn build_receipt(sale: &Sale, items: &[SaleItem], checked: &[(ItemModel, i32)]) -> Receipt {
    let lines = items
        .iter()
        .map(|line| {
            let name = checked
                .iter()
                .find(|(item, _)| item.id == line.item_id)
                .map(|(item, _)| item.name.clone())
                .unwrap_or_default();
            ReceiptLine {
                item_name: name,
                quantity: line.quantity,
                price: line.price,
                total: line.total,
            }
        })
        .collect();

    Receipt {
        sale_id: sale.id,
        lines,
        total_amount: sale.total_amount,
        discount: sale.discount,
        net_amount: sale.net_amount,
        payment_type: sale.payment_type.clone().unwrap_or_default(),
        amount_paid: sale.amount_paid,
        change: sale.change,
        issued_at: Utc::now(),
    }
}

/// Immediate sale: validate, debit gift card, take payment and decrement
/// stock as one transaction. Any failure rolls the whole settlement back.
pub async fn create_sale(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSaleRequest,
) -> AppResult<ApiResponse<SaleWithItems>> {
    validate_lines(&payload.items)?;
    let payment_type = validate_payment_type(payload.payment_type.as_deref())?;

    let txn = state.orm.begin().await?;

    ensure_customer_exists(&txn, payload.customer_id).await?;
    let checked = lock_and_check_lines(&txn, &payload.items).await?;

    let total_amount: i64 = checked
        .iter()
        .map(|(item, qty)| item.price * (*qty as i64))
        .sum();

    let mut discount = 0;
    if let Some(gift_card_id) = payload.gift_card_id {
        discount = apply_gift_card(&txn, gift_card_id, total_amount).await?;
    }

    let net_amount = total_amount - discount;
    if payload.amount_paid < net_amount {
        return Err(AppError::InsufficientPayment {
            required: net_amount,
            paid: payload.amount_paid,
        });
    }
    let change = payload.amount_paid - net_amount;

    let sale = SaleActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(payload.customer_id),
        gift_card_id: Set(payload.gift_card_id),
        total_amount: Set(total_amount),
        discount: Set(discount),
        net_amount: Set(net_amount),
        payment_type: Set(Some(payment_type)),
        amount_paid: Set(payload.amount_paid),
        change: Set(change),
        status: Set(STATUS_COMPLETED.into()),
        created_by: Set(user.user_id),
        held_by: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let sale_items = insert_lines_and_decrement(&txn, sale.id, &checked).await?;

    txn.commit().await?;

    let sale = sale_from_entity(sale);
    let receipt = build_receipt(&sale, &sale_items, &checked);

    record(
        &state.pool,
        Some(user.user_id),
        "sale_create",
        Some("sales"),
        Some(serde_json::json!({ "sale_id": sale.id, "net_amount": sale.net_amount })),
    )
    .await;

    Ok(ApiResponse::success(
        "Sale created successfully",
        SaleWithItems {
            sale,
            items: sale_items,
            receipt: Some(receipt),
        },
        Some(Meta::empty()),
    ))
}

/// Park a sale. Prices are snapshotted now, but no stock is reserved and
/// no payment or gift card is touched.
pub async fn hold_sale(
    state: &AppState,
    user: &AuthUser,
    payload: HoldSaleRequest,
) -> AppResult<ApiResponse<SaleWithItems>> {
    validate_lines(&payload.items)?;

    let txn = state.orm.begin().await?;

    ensure_customer_exists(&txn, payload.customer_id).await?;

    // Lines must resolve, but held sales reserve nothing, so stock is not
    // checked here. CompleteHeldSale re-checks against live stock.
    let mut resolved: Vec<(ItemModel, i32)> = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        let item = Items::find_by_id(line.item_id)
            .filter(ItemCol::Status.eq("active"))
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        resolved.push((item, line.qty));
    }

    let total_amount: i64 = resolved
        .iter()
        .map(|(item, qty)| item.price * (*qty as i64))
        .sum();

    let sale = SaleActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(payload.customer_id),
        gift_card_id: Set(None),
        total_amount: Set(total_amount),
        discount: Set(0),
        net_amount: Set(total_amount),
        payment_type: Set(None),
        amount_paid: Set(0),
        change: Set(0),
        status: Set(STATUS_HELD.into()),
        created_by: Set(user.user_id),
        held_by: Set(Some(user.user_id)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut sale_items = Vec::with_capacity(resolved.len());
    for (item, qty) in &resolved {
        let line = SaleItemActive {
            id: Set(Uuid::new_v4()),
            sale_id: Set(sale.id),
            item_id: Set(item.id),
            quantity: Set(*qty),
            price: Set(item.price),
            total: Set(item.price * (*qty as i64)),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        sale_items.push(sale_item_from_entity(line));
    }

    txn.commit().await?;

    record(
        &state.pool,
        Some(user.user_id),
        "sale_hold",
        Some("sales"),
        Some(serde_json::json!({ "sale_id": sale.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Sale placed on hold successfully",
        SaleWithItems {
            sale: sale_from_entity(sale),
            items: sale_items,
            receipt: None,
        },
        Some(Meta::empty()),
    ))
}

/// Complete a held sale: re-check stock against the live catalog, apply
/// payment and an optional gift card, and flip the status, atomically.
/// The totals stay as they were at hold time; lines are not re-priced.
pub async fn complete_held_sale(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CompleteHeldSaleRequest,
) -> AppResult<ApiResponse<SaleWithItems>> {
    let payment_type = validate_payment_type(payload.payment_type.as_deref())?;

    let txn = state.orm.begin().await?;

    // The row lock serializes concurrent completions; whoever loses the
    // race sees a terminal status here and gets a clean conflict.
    let sale = Sales::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if sale.status != STATUS_HELD {
        return Err(AppError::StateConflict(format!(
            "Sale is {}, only held sales can be completed",
            sale.status
        )));
    }

    let lines = SaleItems::find()
        .filter(SaleItemCol::SaleId.eq(sale.id))
        .all(&txn)
        .await?;

    // Mandatory stock re-check: holding reserved nothing and stock may
    // have been sold elsewhere since. Quantities are summed per item the
    // same way the immediate path does it.
    let mut checked: Vec<(ItemModel, i32)> = Vec::with_capacity(lines.len());
    let mut requested: HashMap<Uuid, i32> = HashMap::new();
    for line in &lines {
        let item = Items::find_by_id(line.item_id)
            .filter(ItemCol::Status.eq("active"))
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let qty = requested.entry(item.id).or_insert(0);
        *qty += line.quantity;
        if *qty > item.stock {
            return Err(AppError::InsufficientStock { item: item.name });
        }
        checked.push((item, line.quantity));
    }

    let mut discount = 0;
    if let Some(gift_card_id) = payload.gift_card_id {
        discount = apply_gift_card(&txn, gift_card_id, sale.total_amount).await?;
    }

    let net_amount = sale.total_amount - discount;
    if payload.amount_paid < net_amount {
        return Err(AppError::InsufficientPayment {
            required: net_amount,
            paid: payload.amount_paid,
        });
    }
    let change = payload.amount_paid - net_amount;

    for (item, qty) in &checked {
        Items::update_many()
            .col_expr(ItemCol::Stock, Expr::col(ItemCol::Stock).sub(*qty))
            .filter(ItemCol::Id.eq(item.id))
            .exec(&txn)
            .await?;
    }

    let mut active: SaleActive = sale.into();
    active.gift_card_id = Set(payload.gift_card_id);
    active.discount = Set(discount);
    active.net_amount = Set(net_amount);
    active.payment_type = Set(Some(payment_type));
    active.amount_paid = Set(payload.amount_paid);
    active.change = Set(change);
    active.status = Set(STATUS_COMPLETED.into());
    active.updated_at = Set(Utc::now().into());
    let sale = active.update(&txn).await?;

    txn.commit().await?;

    let sale = sale_from_entity(sale);
    let items: Vec<SaleItem> = lines.into_iter().map(sale_item_from_entity).collect();
    let receipt = build_receipt(&sale, &items, &checked);

    record(
        &state.pool,
        Some(user.user_id),
        "sale_complete",
        Some("sales"),
        Some(serde_json::json!({ "sale_id": sale.id, "net_amount": sale.net_amount })),
    )
    .await;

    Ok(ApiResponse::success(
        "Held sale completed successfully",
        SaleWithItems {
            sale,
            items,
            receipt: Some(receipt),
        },
        Some(Meta::empty()),
    ))
}

/// Discard a held sale. Nothing was reserved or debited at hold time, so
/// voiding only flips the status; completed sales are immutable.
pub async fn void_held_sale(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Sale>> {
    let txn = state.orm.begin().await?;

    let sale = Sales::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if sale.status != STATUS_HELD {
        return Err(AppError::StateConflict(format!(
            "Sale is {}, only held sales can be voided",
            sale.status
        )));
    }

    let mut active: SaleActive = sale.into();
    active.status = Set(STATUS_VOIDED.into());
    active.updated_at = Set(Utc::now().into());
    let sale = active.update(&txn).await?;

    txn.commit().await?;

    record(
        &state.pool,
        Some(user.user_id),
        "sale_void",
        Some("sales"),
        Some(serde_json::json!({ "sale_id": sale.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Held sale voided",
        sale_from_entity(sale),
        Some(Meta::empty()),
    ))
}

pub async fn list_sales(
    state: &AppState,
    query: SaleListQuery,
) -> AppResult<ApiResponse<SaleList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(SaleCol::Status.eq(status.clone()));
    }
    if let Some(customer_id) = query.customer_id {
        condition = condition.add(SaleCol::CustomerId.eq(customer_id));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Sales::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(SaleCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(SaleCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let sales = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(sale_from_entity)
        .collect();

    Ok(ApiResponse::paginated("Sales", SaleList { items: sales }, page, limit, total))
}

/// Held sales are listed oldest first: the register picks parked tickets
/// back up in the order they were parked.
pub async fn list_held_sales(
    state: &AppState,
    query: SaleListQuery,
) -> AppResult<ApiResponse<SaleList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let finder = Sales::find()
        .filter(SaleCol::Status.eq(STATUS_HELD))
        .order_by_asc(SaleCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let sales = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(sale_from_entity)
        .collect();

    Ok(ApiResponse::paginated("Held sales", SaleList { items: sales }, page, limit, total))
}

pub async fn get_sale(state: &AppState, id: Uuid) -> AppResult<ApiResponse<SaleWithItems>> {
    let sale = Sales::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = SaleItems::find()
        .filter(SaleItemCol::SaleId.eq(sale.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(sale_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Sale found",
        SaleWithItems {
            sale: sale_from_entity(sale),
            items,
            receipt: None,
        },
        Some(Meta::empty()),
    ))
}

fn sale_from_entity(model: SaleModel) -> Sale {
    Sale {
        id: model.id,
        customer_id: model.customer_id,
        gift_card_id: model.gift_card_id,
        total_amount: model.total_amount,
        discount: model.discount,
        net_amount: model.net_amount,
        payment_type: model.payment_type,
        amount_paid: model.amount_paid,
        change: model.change,
        status: model.status,
        created_by: model.created_by,
        held_by: model.held_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn sale_item_from_entity(model: SaleItemModel) -> SaleItem {
    SaleItem {
        id: model.id,
        sale_id: model.sale_id,
        item_id: model.item_id,
        quantity: model.quantity,
        price: model.price,
        total: model.total,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_caps_at_balance() {
        // balance 50 against a 120 total: card is drained and dies
        let debit = gift_card_debit(50, 120);
        assert_eq!(debit.discount, 50);
        assert_eq!(debit.new_balance, 0);
        assert!(!debit.still_active);
    }

    #[test]
    fn debit_caps_at_total() {
        let debit = gift_card_debit(500, 120);
        assert_eq!(debit.discount, 120);
        assert_eq!(debit.new_balance, 380);
        assert!(debit.still_active);
    }

    #[test]
    fn debit_exact_balance_deactivates() {
        let debit = gift_card_debit(120, 120);
        assert_eq!(debit.discount, 120);
        assert_eq!(debit.new_balance, 0);
        assert!(!debit.still_active);
    }

    #[test]
    fn empty_card_contributes_nothing() {
        let debit = gift_card_debit(0, 120);
        assert_eq!(debit.discount, 0);
        assert_eq!(debit.new_balance, 0);
    }

    #[test]
    fn payment_type_defaults_to_cash() {
        assert_eq!(validate_payment_type(None).unwrap(), "cash");
        assert_eq!(validate_payment_type(Some("card")).unwrap(), "card");
        assert_eq!(validate_payment_type(Some("e_wallet")).unwrap(), "e_wallet");
        assert!(validate_payment_type(Some("barter")).is_err());
    }

    #[test]
    fn lines_must_be_non_empty_and_positive() {
        assert!(matches!(
            validate_lines(&[]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_lines(&[SaleLineRequest {
                item_id: Uuid::new_v4(),
                qty: 0
            }]),
            Err(AppError::Validation(_))
        ));
        assert!(
            validate_lines(&[SaleLineRequest {
                item_id: Uuid::new_v4(),
                qty: 3
            }])
            .is_ok()
        );
    }
}
