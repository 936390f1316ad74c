//! `SeaORM` Entity for products

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_sale::Entity")]
    ProductSale,
}

impl Related<super::product_sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductSale.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
