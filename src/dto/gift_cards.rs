use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Card, GiftCard};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGiftCardRequest {
    pub card_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub value: i64,
    pub expiration_date: Option<NaiveDate>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateGiftCardRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GiftCardList {
    pub items: Vec<GiftCard>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCardRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCardRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CardList {
    pub items: Vec<Card>,
}
