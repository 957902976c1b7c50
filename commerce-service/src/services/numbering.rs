//! Document numbering.
//!
//! Quotation numbers are time-derived. Orders, invoices, and tax invoices
//! draw from a per-(kind, year) counter advanced atomically by the store,
//! so concurrent issuers can never compute the same number. The persisted
//! columns carry unique indexes as a second line: a violation there is a
//! retry signal, not corruption.

use chrono::{DateTime, Datelike, Utc};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

use crate::services::metrics::DOCUMENTS_ISSUED_TOTAL;
use crate::store::CommerceStore;

/// Document kinds with independent number sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Quotation,
    Order,
    Invoice,
    TaxInvoice,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "quotation",
            DocumentKind::Order => "order",
            DocumentKind::Invoice => "invoice",
            DocumentKind::TaxInvoice => "tax_invoice",
        }
    }
}

/// Allocates formatted document numbers.
#[derive(Clone)]
pub struct DocumentNumberer {
    store: Arc<dyn CommerceStore>,
}

impl DocumentNumberer {
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self { store }
    }

    /// Next number for `kind` as of `now`. Sequential kinds restart at 1
    /// with each calendar year.
    #[instrument(skip(self), fields(kind = kind.as_str()))]
    pub async fn next(&self, kind: DocumentKind, now: DateTime<Utc>) -> Result<String, AppError> {
        let number = match kind {
            DocumentKind::Quotation => quotation_number(now),
            DocumentKind::Order => order_number(now.year(), self.next_seq(kind, now).await?),
            DocumentKind::Invoice => invoice_number(now.year(), self.next_seq(kind, now).await?),
            DocumentKind::TaxInvoice => {
                tax_invoice_number(now.year(), self.next_seq(kind, now).await?)
            }
        };

        DOCUMENTS_ISSUED_TOTAL
            .with_label_values(&[kind.as_str()])
            .inc();

        Ok(number)
    }

    async fn next_seq(&self, kind: DocumentKind, now: DateTime<Utc>) -> Result<i64, AppError> {
        self.store.next_sequence(kind.as_str(), now.year()).await
    }
}

/// `QUO-YYYYMMDD-NNNNNN`, suffix derived from the creation timestamp.
pub fn quotation_number(now: DateTime<Utc>) -> String {
    let suffix = now.timestamp_millis().rem_euclid(1_000_000);
    format!("QUO-{}-{:06}", now.format("%Y%m%d"), suffix)
}

/// `ORD-YYYY-NNNNNN`, per-year sequence.
pub fn order_number(year: i32, seq: i64) -> String {
    format!("ORD-{year}-{seq:06}")
}

/// `INV-YYYY-NNNNNN`, per-year sequence.
pub fn invoice_number(year: i32, seq: i64) -> String {
    format!("INV-{year}-{seq:06}")
}

/// `010.000-YY.NNNNNNNN`: the fixed Faktur Pajak prefix, two-digit year,
/// eight-digit per-year sequence.
pub fn tax_invoice_number(year: i32, seq: i64) -> String {
    format!("010.000-{:02}.{seq:08}", year.rem_euclid(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn quotation_number_embeds_date_and_six_digit_suffix() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 9, 30, 0).unwrap();
        let number = quotation_number(now);
        assert!(number.starts_with("QUO-20260806-"));
        let suffix = number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn order_number_is_zero_padded() {
        assert_eq!(order_number(2026, 1), "ORD-2026-000001");
        assert_eq!(order_number(2026, 123_456), "ORD-2026-123456");
    }

    #[test]
    fn invoice_number_is_zero_padded() {
        assert_eq!(invoice_number(2026, 42), "INV-2026-000042");
    }

    #[test]
    fn tax_invoice_number_matches_fiscal_format() {
        assert_eq!(tax_invoice_number(2026, 1), "010.000-26.00000001");
        assert_eq!(tax_invoice_number(2026, 12_345_678), "010.000-26.12345678");
        assert_eq!(tax_invoice_number(2030, 99), "010.000-30.00000099");

        let re = regex::Regex::new(r"^010\.000-\d{2}\.\d{8}$").unwrap();
        assert!(re.is_match(&tax_invoice_number(2026, 1)));
        assert!(re.is_match(&tax_invoice_number(2099, 99_999_999)));
    }
}
