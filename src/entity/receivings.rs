use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "receivings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub expected_delivery_date: Option<Date>,
    pub order_notes: Option<String>,
    pub total: i64,
    pub discount_total: i64,
    pub amount_due: i64,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id"
    )]
    Suppliers,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::receiving_items::Entity")]
    ReceivingItems,
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suppliers.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::receiving_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceivingItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
