//! Tax invoice (Faktur Pajak) model: the fiscal document issued for a paid
//! B2B invoice. At most one exists per invoice; immutable once created.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaxInvoice {
    pub tax_invoice_id: Uuid,
    pub tax_invoice_number: String,
    pub invoice_id: Uuid,
    pub ppn_rate: Decimal,
    pub ppn_amount: i64,
    pub total_with_ppn: i64,
    pub issued_at: DateTime<Utc>,
    pub issued_by: String,
}
