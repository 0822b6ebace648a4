use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Receiving, ReceivingItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReceivingLineRequest {
    pub item_id: Uuid,
    pub qty: i32,
    /// Whole-percent line discount, 0..=100.
    pub discount_pct: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReceivingRequest {
    pub supplier_id: Uuid,
    pub expected_delivery_date: Option<NaiveDate>,
    pub order_notes: Option<String>,
    pub items: Vec<ReceivingLineRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceivingWithItems {
    pub receiving: Receiving,
    pub items: Vec<ReceivingItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceivingList {
    pub items: Vec<Receiving>,
}
