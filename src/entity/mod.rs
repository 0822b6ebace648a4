pub mod cards;
pub mod categories;
pub mod customers;
pub mod gift_cards;
pub mod items;
pub mod receiving_items;
pub mod receivings;
pub mod sale_items;
pub mod sales;
pub mod suppliers;
pub mod users;

pub use cards::Entity as Cards;
pub use categories::Entity as Categories;
pub use customers::Entity as Customers;
pub use gift_cards::Entity as GiftCards;
pub use items::Entity as Items;
pub use receiving_items::Entity as ReceivingItems;
pub use receivings::Entity as Receivings;
pub use sale_items::Entity as SaleItems;
pub use sales::Entity as Sales;
pub use suppliers::Entity as Suppliers;
pub use users::Entity as Users;
