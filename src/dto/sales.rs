use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Sale, SaleItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaleLineRequest {
    pub item_id: Uuid,
    pub qty: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSaleRequest {
    pub customer_id: Option<Uuid>,
    pub items: Vec<SaleLineRequest>,
    pub gift_card_id: Option<Uuid>,
    pub payment_type: Option<String>,
    pub amount_paid: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct HoldSaleRequest {
    pub customer_id: Option<Uuid>,
    pub items: Vec<SaleLineRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteHeldSaleRequest {
    pub gift_card_id: Option<Uuid>,
    pub payment_type: Option<String>,
    pub amount_paid: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleList {
    pub items: Vec<Sale>,
}

/// Derived receipt projection returned alongside a completed sale.
/// Purely a view over the persisted sale; never stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct Receipt {
    pub sale_id: Uuid,
    pub lines: Vec<ReceiptLine>,
    pub total_amount: i64,
    pub discount: i64,
    pub net_amount: i64,
    pub payment_type: String,
    pub amount_paid: i64,
    pub change: i64,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptLine {
    pub item_name: String,
    pub quantity: i32,
    pub price: i64,
    pub total: i64,
}
