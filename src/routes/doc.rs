use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        customers::CustomerList,
        gift_cards::{CardList, GiftCardList},
        items::{CategoryList, ItemList},
        receivings::{ReceivingList, ReceivingWithItems},
        sales::{Receipt, ReceiptLine, SaleList, SaleWithItems},
        suppliers::SupplierList,
    },
    models::{
        Card, Category, Customer, GiftCard, Item, Receiving, ReceivingItem, Sale, SaleItem,
        Supplier, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        auth, customers, gift_cards, health, items, params, receivings, sales, suppliers,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::archive_item,
        items::list_categories,
        items::create_category,
        items::get_category,
        items::update_category,
        items::archive_category,
        gift_cards::list_gift_cards,
        gift_cards::get_gift_card,
        gift_cards::create_gift_card,
        gift_cards::update_gift_card,
        gift_cards::archive_gift_card,
        gift_cards::list_cards,
        gift_cards::create_card,
        gift_cards::get_card,
        gift_cards::update_card,
        gift_cards::archive_card,
        customers::list_customers,
        customers::get_customer,
        customers::create_customer,
        customers::update_customer,
        customers::archive_customer,
        suppliers::list_suppliers,
        suppliers::get_supplier,
        suppliers::create_supplier,
        suppliers::update_supplier,
        suppliers::archive_supplier,
        sales::list_sales,
        sales::list_held_sales,
        sales::get_sale,
        sales::create_sale,
        sales::hold_sale,
        sales::complete_held_sale,
        sales::void_held_sale,
        receivings::list_receivings,
        receivings::get_receiving,
        receivings::create_receiving,
        receivings::complete_receiving
    ),
    components(
        schemas(
            User,
            Customer,
            Supplier,
            Category,
            Card,
            Item,
            GiftCard,
            Sale,
            SaleItem,
            Receiving,
            ReceivingItem,
            ItemList,
            CategoryList,
            GiftCardList,
            CardList,
            CustomerList,
            SupplierList,
            SaleList,
            SaleWithItems,
            Receipt,
            ReceiptLine,
            ReceivingList,
            ReceivingWithItems,
            params::Pagination,
            params::ItemQuery,
            params::SaleListQuery,
            params::ReceivingListQuery,
            Meta,
            ApiResponse<Item>,
            ApiResponse<ItemList>,
            ApiResponse<GiftCard>,
            ApiResponse<SaleWithItems>,
            ApiResponse<SaleList>,
            ApiResponse<ReceivingWithItems>,
            ApiResponse<ReceivingList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Items", description = "Catalog item endpoints"),
        (name = "GiftCards", description = "Gift card endpoints"),
        (name = "Customers", description = "Customer endpoints"),
        (name = "Suppliers", description = "Supplier endpoints"),
        (name = "Sales", description = "Sale settlement endpoints"),
        (name = "Receivings", description = "Purchase receiving endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
