//! Persistence boundary for the pipeline.
//!
//! Every read-then-write the pipeline performs is a single method here, so
//! each implementation can make it atomic: `PgStore` wraps it in one
//! Postgres transaction, `MemoryStore` in one mutex hold. Guarded
//! transitions return `Ok(None)` when the guard misses (wrong status,
//! expired, already converted); callers re-read to diagnose.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    Company, Customer, Invoice, NewOrder, NewQuotation, Order, OrderItem, PricingTier, Product,
    Quotation, QuotationItem, QuotationStatus, QuotationStatusLog, TaxInvoice,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CommerceStore: Send + Sync {
    // -- catalog and party reads (owned by external flows) --

    async fn product(&self, product_id: Uuid) -> Result<Option<Product>, AppError>;
    async fn pricing_tiers(&self, product_id: Uuid) -> Result<Vec<PricingTier>, AppError>;
    async fn customer(&self, customer_id: Uuid) -> Result<Option<Customer>, AppError>;
    async fn company(&self, company_id: Uuid) -> Result<Option<Company>, AppError>;
    async fn invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError>;

    // -- quotations --

    /// Persists the quotation and all of its items atomically.
    async fn insert_quotation(&self, quotation: &NewQuotation) -> Result<Quotation, AppError>;

    async fn quotation(&self, quotation_id: Uuid) -> Result<Option<Quotation>, AppError>;

    async fn quotation_items(&self, quotation_id: Uuid) -> Result<Vec<QuotationItem>, AppError>;

    async fn quotations_with_status(
        &self,
        status: QuotationStatus,
    ) -> Result<Vec<Quotation>, AppError>;

    async fn quotation_status_log(
        &self,
        quotation_id: Uuid,
    ) -> Result<Vec<QuotationStatusLog>, AppError>;

    /// Guarded `pending -> approved/rejected` flip plus status-log append.
    /// The guard requires stored status `pending` and `valid_until > now`;
    /// returns `Ok(None)` when it misses.
    async fn transition_quotation(
        &self,
        quotation_id: Uuid,
        target: QuotationStatus,
        actor: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Quotation>, AppError>;

    // -- orders --

    /// Guarded `approved -> converted` flip: inserts the order with its
    /// items, sets `converted_order_id`, and appends the status log entry,
    /// all in one transaction. Returns `Ok(None)` when the quotation is not
    /// `approved` or was already converted.
    async fn convert_quotation(
        &self,
        quotation_id: Uuid,
        order: &NewOrder,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, AppError>;

    async fn order(&self, order_id: Uuid) -> Result<Option<Order>, AppError>;

    async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError>;

    // -- tax invoices --

    async fn tax_invoice_for_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<TaxInvoice>, AppError>;

    /// Inserts the tax invoice and flags the invoice as requested, in one
    /// transaction. A duplicate for the invoice or a number collision maps
    /// to `AppError::Conflict`.
    async fn insert_tax_invoice(&self, tax_invoice: &TaxInvoice) -> Result<TaxInvoice, AppError>;

    // -- document numbering --

    /// Atomically increments and returns the counter for `(kind, year)`.
    /// Starts at 1 for the first call of each year.
    async fn next_sequence(&self, kind: &str, year: i32) -> Result<i64, AppError>;

    // -- upstream writers (catalog sync, invoicing flow, test seeding) --

    async fn insert_product(
        &self,
        product: &Product,
        tiers: &[PricingTier],
    ) -> Result<(), AppError>;

    async fn insert_customer(&self, customer: &Customer) -> Result<(), AppError>;

    async fn insert_company(&self, company: &Company) -> Result<(), AppError>;

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), AppError>;
}
