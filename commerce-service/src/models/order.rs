//! Order models: the binding document materialized from an approved quotation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Order fulfillment status. Mutated by the external fulfillment flow;
/// this pipeline only ever creates orders as `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "processing" => OrderStatus::Processing,
            "shipped" => OrderStatus::Shipped,
            "delivered" => OrderStatus::Delivered,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::New,
        }
    }
}

/// Order document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub quotation_id: Option<Uuid>,
    pub status: String,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Line item on an order, copied verbatim from the quotation snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
}

/// Input for persisting an order during quotation conversion.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub quotation_id: Uuid,
    pub items: Vec<OrderItem>,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
