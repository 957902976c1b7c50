//! Quotation models: the entry document of the sales pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Quotation status.
///
/// Legal transitions: `Pending -> {Approved, Rejected, Expired}` and
/// `Approved -> Converted`. `Expired` is derived from `valid_until` at read
/// time and never written back; see [`Quotation::effective_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
    Converted,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Pending => "pending",
            QuotationStatus::Approved => "approved",
            QuotationStatus::Rejected => "rejected",
            QuotationStatus::Expired => "expired",
            QuotationStatus::Converted => "converted",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "approved" => QuotationStatus::Approved,
            "rejected" => QuotationStatus::Rejected,
            "expired" => QuotationStatus::Expired,
            "converted" => QuotationStatus::Converted,
            _ => QuotationStatus::Pending,
        }
    }

    /// Strict parser for caller-supplied status strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Some(QuotationStatus::Pending),
            "approved" => Some(QuotationStatus::Approved),
            "rejected" => Some(QuotationStatus::Rejected),
            "expired" => Some(QuotationStatus::Expired),
            "converted" => Some(QuotationStatus::Converted),
            _ => None,
        }
    }

    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QuotationStatus::Rejected | QuotationStatus::Expired | QuotationStatus::Converted
        )
    }
}

/// Requested handling speed; determines how long the quotation stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    VeryUrgent,
    Urgent,
    Normal,
}

impl Urgency {
    pub fn validity_days(&self) -> i64 {
        match self {
            Urgency::VeryUrgent => 1,
            Urgency::Urgent => 3,
            Urgency::Normal => 7,
        }
    }
}

/// Quotation document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quotation {
    pub quotation_id: Uuid,
    pub quotation_number: String,
    pub customer_id: Uuid,
    pub status: String,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub valid_until: DateTime<Utc>,
    pub converted_order_id: Option<Uuid>,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Quotation {
    pub fn status(&self) -> QuotationStatus {
        QuotationStatus::from_string(&self.status)
    }

    /// Status as observed at `now`: a stored `pending` past its validity
    /// window reads as `expired`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> QuotationStatus {
        match self.status() {
            QuotationStatus::Pending if now > self.valid_until => QuotationStatus::Expired,
            status => status,
        }
    }

    /// Copy of the row with the derived status written into the status field.
    pub fn with_effective_status(mut self, now: DateTime<Utc>) -> Self {
        self.status = self.effective_status(now).as_str().to_string();
        self
    }
}

/// Line item on a quotation. `unit_price` is the price resolved when the
/// quotation was created; it is never re-derived from the live tiers.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuotationItem {
    pub quotation_item_id: Uuid,
    pub quotation_id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
}

/// Append-only record of a status change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuotationStatusLog {
    pub log_id: Uuid,
    pub quotation_id: Uuid,
    pub from_status: String,
    pub to_status: String,
    pub actor: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for persisting a freshly created quotation with its items.
#[derive(Debug, Clone)]
pub struct NewQuotation {
    pub quotation_id: Uuid,
    pub quotation_number: String,
    pub customer_id: Uuid,
    pub items: Vec<QuotationItem>,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub valid_until: DateTime<Utc>,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
