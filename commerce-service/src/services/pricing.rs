//! Volume price resolution.
//!
//! A product's unit price depends on the ordered quantity: the most
//! specific active tier that bounds the quantity wins, the base price is
//! the fallback. Resolution is pure; quotation items snapshot the result
//! and never re-resolve.

use crate::models::PricingTier;

/// Resolve the unit price for `quantity` units of a product.
///
/// Among active tiers where `quantity >= min_quantity` and `quantity <=
/// max_quantity` (unbounded when `max_quantity` is `None`), the tier with
/// the highest `min_quantity` wins. With no matching tier the base price
/// applies. Callers must reject `quantity < 1` before resolving.
pub fn resolve_unit_price(base_price: i64, tiers: &[PricingTier], quantity: i64) -> i64 {
    tiers
        .iter()
        .filter(|tier| tier.active)
        .filter(|tier| {
            quantity >= tier.min_quantity
                && tier.max_quantity.map_or(true, |max| quantity <= max)
        })
        .max_by_key(|tier| tier.min_quantity)
        .map_or(base_price, |tier| tier.price_per_unit)
}

/// Line total for a resolved unit price.
pub fn line_total(unit_price: i64, quantity: i64) -> i64 {
    unit_price * quantity
}
