//! `SeaORM` entities for the sales dataset.
//!
//! Every table is owned and populated by the external ingestion pipeline;
//! this service only ever reads from them.

pub mod brand;
pub mod channel;
pub mod customer;
pub mod item_product_sale;
pub mod product;
pub mod product_sale;
pub mod sale;
pub mod store;
