pub mod auth_service;
pub mod customer_service;
pub mod gift_card_service;
pub mod item_service;
pub mod receiving_service;
pub mod sale_service;
pub mod supplier_service;
