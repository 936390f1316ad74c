//! `SeaORM` Entity for sales
//!
//! Only rows with `sale_status_desc = 'COMPLETED'` participate in any
//! analytic aggregate; cancelled and in-flight sales stay in the table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub store_id: i64,
    pub channel_id: i64,
    /// Null for guest checkouts
    pub customer_id: Option<i64>,
    pub created_at: DateTimeWithTimeZone,
    pub total_amount: f64,
    pub total_discount: f64,
    pub delivery_fee: f64,
    /// Null for non-delivery sales
    pub delivery_seconds: Option<i32>,
    pub sale_status_desc: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
    #[sea_orm(
        belongs_to = "super::channel::Entity",
        from = "Column::ChannelId",
        to = "super::channel::Column::Id"
    )]
    Channel,
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(has_many = "super::product_sale::Entity")]
    ProductSale,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Channel.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::product_sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductSale.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
