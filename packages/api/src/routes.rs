use serde::Deserialize;

pub mod analytics;
pub mod brand;
pub mod health;
pub mod sale;

/// Query parameters shared by the analytics endpoints that take nothing but
/// an optional brand scope. Absence of `brand_id` means "all brands".
#[derive(Clone, Debug, Deserialize)]
pub struct BrandScope {
    pub brand_id: Option<i64>,
}
