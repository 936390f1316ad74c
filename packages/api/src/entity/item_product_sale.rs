//! `SeaORM` Entity for line-item customizations
//! The existence of any row marks the parent line item as customized.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_product_sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_sale_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_sale::Entity",
        from = "Column::ProductSaleId",
        to = "super::product_sale::Column::Id"
    )]
    ProductSale,
}

impl Related<super::product_sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductSale.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
