pub mod auth;
pub mod customers;
pub mod gift_cards;
pub mod items;
pub mod receivings;
pub mod sales;
pub mod suppliers;
