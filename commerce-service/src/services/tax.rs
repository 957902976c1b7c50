//! PPN computation and tax invoice (Faktur Pajak) issuance.
//!
//! A tax invoice is a B2B-only fiscal document issued at most once per paid
//! invoice. PPN is computed on the invoice subtotal (Dasar Pengenaan
//! Pajak), not on the total; any discount or charge baked into the total
//! stays outside the tax base.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::models::{Company, Customer, CustomerType, InvoiceStatus, TaxInvoice};
use crate::services::metrics::PPN_AMOUNT_TOTAL;
use crate::services::numbering::{DocumentKind, DocumentNumberer};
use crate::store::CommerceStore;

/// PPN rate: 11%.
pub static PPN_RATE: Lazy<Decimal> = Lazy::new(|| Decimal::new(11, 2));

/// Canonical NPWP format, e.g. `01.234.567.8-901.000`.
static NPWP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}\.\d{3}\.\d{3}\.\d{1}-\d{3}\.\d{3}$").expect("invalid NPWP pattern")
});

/// Number collision retries before giving up.
const MAX_NUMBER_ATTEMPTS: u32 = 3;

/// PPN on a subtotal, rounded half-up to the smallest currency unit.
pub fn ppn_amount(subtotal: i64) -> i64 {
    (Decimal::from(subtotal) * *PPN_RATE)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

pub fn is_valid_npwp(tax_id: &str) -> bool {
    NPWP_REGEX.is_match(tax_id)
}

/// Every company-profile rule the customer violates, so the caller can
/// present all remediation steps at once.
pub fn company_validation_errors(customer: &Customer, company: Option<&Company>) -> Vec<String> {
    let mut errors = Vec::new();

    if customer.customer_type() != CustomerType::B2b {
        errors.push("Faktur pajak hanya dapat diterbitkan untuk pelanggan B2B".to_string());
    }

    let Some(company) = company else {
        errors.push("Pelanggan belum memiliki data perusahaan".to_string());
        return errors;
    };

    match company.tax_id.as_deref().map(str::trim) {
        None | Some("") => errors.push("NPWP perusahaan belum diisi".to_string()),
        Some(tax_id) if !is_valid_npwp(tax_id) => errors.push(format!(
            "Format NPWP tidak valid: {tax_id} (contoh: 01.234.567.8-901.000)"
        )),
        Some(_) => {}
    }

    if blank(&company.registration_number) {
        errors.push("Nomor registrasi perusahaan belum diisi".to_string());
    }

    let mut missing_address = Vec::new();
    if blank(&company.address) {
        missing_address.push("alamat");
    }
    if blank(&company.city) {
        missing_address.push("kota");
    }
    if blank(&company.province) {
        missing_address.push("provinsi");
    }
    if !missing_address.is_empty() {
        errors.push(format!(
            "Alamat perusahaan belum lengkap: {}",
            missing_address.join(", ")
        ));
    }

    errors
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

#[derive(Clone)]
pub struct TaxInvoiceService {
    store: Arc<dyn CommerceStore>,
    numberer: DocumentNumberer,
}

impl TaxInvoiceService {
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        let numberer = DocumentNumberer::new(store.clone());
        Self { store, numberer }
    }

    /// Issue the tax invoice for a paid B2B invoice.
    ///
    /// All eligibility checks run before any mutation; a failed check
    /// leaves the invoice untouched. The insert and the
    /// `tax_invoice_requested` flag commit atomically. A number collision
    /// re-allocates and retries; a duplicate for the invoice is terminal.
    #[instrument(skip(self), fields(invoice_id = %invoice_id, issued_by = issued_by))]
    pub async fn issue(
        &self,
        invoice_id: Uuid,
        issued_by: &str,
        now: DateTime<Utc>,
    ) -> Result<TaxInvoice, AppError> {
        let invoice = self
            .store
            .invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Invoice tidak ditemukan")))?;

        if invoice.status() != InvoiceStatus::Paid {
            return Err(AppError::InvalidTransition(anyhow!(
                "Faktur pajak hanya dapat diterbitkan untuk invoice yang sudah lunas \
                 (status saat ini: {})",
                invoice.status
            )));
        }

        if self.store.tax_invoice_for_invoice(invoice_id).await?.is_some() {
            return Err(AppError::Conflict(anyhow!(
                "Faktur pajak untuk invoice ini sudah diterbitkan"
            )));
        }

        let order = self
            .store
            .order(invoice.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Order untuk invoice ini tidak ditemukan")))?;
        let customer = self
            .store
            .customer(order.customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Pelanggan tidak ditemukan")))?;
        let company = match customer.company_id {
            Some(company_id) => self.store.company(company_id).await?,
            None => None,
        };

        let errors = company_validation_errors(&customer, company.as_ref());
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let ppn = ppn_amount(invoice.subtotal);

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let tax_invoice_number = self.numberer.next(DocumentKind::TaxInvoice, now).await?;
            let tax_invoice = TaxInvoice {
                tax_invoice_id: Uuid::new_v4(),
                tax_invoice_number,
                invoice_id,
                ppn_rate: *PPN_RATE,
                ppn_amount: ppn,
                total_with_ppn: invoice.subtotal + ppn,
                issued_at: now,
                issued_by: issued_by.to_string(),
            };

            match self.store.insert_tax_invoice(&tax_invoice).await {
                Ok(created) => {
                    PPN_AMOUNT_TOTAL
                        .with_label_values(&["IDR"])
                        .inc_by(ppn as f64);
                    return Ok(created);
                }
                Err(AppError::Conflict(err)) => {
                    // Either another issuer won the 1:1 race, or the number
                    // collided; only the latter is retryable.
                    if self.store.tax_invoice_for_invoice(invoice_id).await?.is_some() {
                        return Err(AppError::Conflict(anyhow!(
                            "Faktur pajak untuk invoice ini sudah diterbitkan"
                        )));
                    }
                    warn!(
                        attempt = attempt,
                        error = %err,
                        "Tax invoice number collision, regenerating"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(AppError::Conflict(anyhow!(
            "Gagal mengalokasikan nomor faktur pajak, coba lagi"
        )))
    }

    /// Tax invoice previously issued for an invoice.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn for_invoice(&self, invoice_id: Uuid) -> Result<TaxInvoice, AppError> {
        self.store
            .tax_invoice_for_invoice(invoice_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow!("Faktur pajak untuk invoice ini belum diterbitkan"))
            })
    }
}
