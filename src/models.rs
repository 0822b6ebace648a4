use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Card {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Catalog item. `price` and `cost` are integer minor units (cents).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub cost: i64,
    pub price: i64,
    pub stock: i32,
    pub min_stock: i32,
    pub barcode: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GiftCard {
    pub id: Uuid,
    pub card_id: Uuid,
    pub gift_card_number: String,
    pub name: String,
    pub description: Option<String>,
    pub value: i64,
    pub balance: i64,
    pub expiration_date: Option<NaiveDate>,
    pub customer_id: Option<Uuid>,
    pub is_active: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Sale {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub gift_card_id: Option<Uuid>,
    pub total_amount: i64,
    pub discount: i64,
    pub net_amount: i64,
    pub payment_type: Option<String>,
    pub amount_paid: i64,
    pub change: i64,
    pub status: String,
    pub created_by: Uuid,
    pub held_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One catalog line within a sale. `price` is a snapshot taken when the
/// line was created and never re-read from the catalog.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub price: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Receiving {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub expected_delivery_date: Option<NaiveDate>,
    pub order_notes: Option<String>,
    pub total: i64,
    pub discount_total: i64,
    pub amount_due: i64,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReceivingItem {
    pub id: Uuid,
    pub receiving_id: Uuid,
    pub item_id: Uuid,
    pub cost: i64,
    pub qty: i32,
    pub discount_pct: i32,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}
