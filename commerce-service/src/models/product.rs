//! Product catalog models, read-only to the pipeline.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Catalog product. Prices are in the smallest currency unit (rupiah).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub base_price: i64,
    pub stock: i32,
    pub min_stock: i32,
}

/// Volume pricing tier for a product.
///
/// `max_quantity = None` means the tier is unbounded above. Inactive tiers
/// are excluded from price resolution but retained for audit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PricingTier {
    pub tier_id: Uuid,
    pub product_id: Uuid,
    pub min_quantity: i64,
    pub max_quantity: Option<i64>,
    pub price_per_unit: i64,
    pub active: bool,
}
