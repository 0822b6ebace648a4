use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "receiving_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub receiving_id: Uuid,
    pub item_id: Uuid,
    pub cost: i64,
    pub qty: i32,
    pub discount_pct: i32,
    pub total: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::receivings::Entity",
        from = "Column::ReceivingId",
        to = "super::receivings::Column::Id"
    )]
    Receivings,
    #[sea_orm(
        belongs_to = "super::items::Entity",
        from = "Column::ItemId",
        to = "super::items::Column::Id"
    )]
    Items,
}

impl Related<super::receivings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receivings.def()
    }
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
