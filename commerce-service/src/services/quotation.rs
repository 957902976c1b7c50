//! Quotation lifecycle: creation, status transitions, effective-status reads.

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{NewQuotation, Quotation, QuotationItem, QuotationStatus, QuotationStatusLog, Urgency};
use crate::services::metrics::QUOTATION_TRANSITIONS_TOTAL;
use crate::services::numbering::{DocumentKind, DocumentNumberer};
use crate::services::pricing;
use crate::services::tax;
use crate::store::CommerceStore;

/// Input for creating a quotation.
#[derive(Debug, Clone)]
pub struct CreateQuotation {
    pub customer_id: Uuid,
    pub items: Vec<QuotationItemInput>,
    pub urgency: Urgency,
    pub shipping_address: Option<String>,
}

/// One requested cart line.
#[derive(Debug, Clone)]
pub struct QuotationItemInput {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Quotation row together with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct QuotationDetail {
    #[serde(flatten)]
    pub quotation: Quotation,
    pub items: Vec<QuotationItem>,
}

#[derive(Clone)]
pub struct QuotationService {
    store: Arc<dyn CommerceStore>,
    numberer: DocumentNumberer,
}

impl QuotationService {
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        let numberer = DocumentNumberer::new(store.clone());
        Self { store, numberer }
    }

    /// Create a `pending` quotation from a cart of (product, quantity)
    /// lines. Unit prices are resolved against the product's active tiers
    /// and snapshotted onto the items; they are never re-derived later.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create(
        &self,
        input: CreateQuotation,
        now: DateTime<Utc>,
    ) -> Result<QuotationDetail, AppError> {
        if input.items.is_empty() {
            return Err(AppError::BadRequest(anyhow!(
                "Penawaran harus memiliki minimal satu item"
            )));
        }
        if input.items.iter().any(|item| item.quantity < 1) {
            return Err(AppError::BadRequest(anyhow!(
                "Jumlah pesanan setiap item minimal 1"
            )));
        }

        self.store
            .customer(input.customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Pelanggan tidak ditemukan")))?;

        let quotation_id = Uuid::new_v4();
        let mut items = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let product = self.store.product(line.product_id).await?.ok_or_else(|| {
                AppError::NotFound(anyhow!("Produk {} tidak ditemukan", line.product_id))
            })?;
            let tiers = self.store.pricing_tiers(line.product_id).await?;
            let unit_price = pricing::resolve_unit_price(product.base_price, &tiers, line.quantity);
            items.push(QuotationItem {
                quotation_item_id: Uuid::new_v4(),
                quotation_id,
                product_id: product.product_id,
                sku: product.sku,
                name: product.name,
                quantity: line.quantity,
                unit_price,
                total_price: pricing::line_total(unit_price, line.quantity),
            });
        }

        let subtotal: i64 = items.iter().map(|item| item.total_price).sum();
        let tax_amount = tax::ppn_amount(subtotal);
        let quotation_number = self.numberer.next(DocumentKind::Quotation, now).await?;

        let quotation = self
            .store
            .insert_quotation(&NewQuotation {
                quotation_id,
                quotation_number,
                customer_id: input.customer_id,
                items: items.clone(),
                subtotal,
                tax_amount,
                total_amount: subtotal + tax_amount,
                valid_until: now + Duration::days(input.urgency.validity_days()),
                shipping_address: input.shipping_address,
                created_at: now,
            })
            .await?;

        Ok(QuotationDetail { quotation, items })
    }

    /// Approve or reject a pending quotation. Any other target, a terminal
    /// status, or an elapsed validity window is an invalid transition; a
    /// concurrent loser observes the committed state and fails the same way.
    #[instrument(skip(self, notes), fields(quotation_id = %quotation_id, target = target.as_str()))]
    pub async fn transition(
        &self,
        quotation_id: Uuid,
        target: QuotationStatus,
        actor: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Quotation, AppError> {
        if !matches!(target, QuotationStatus::Approved | QuotationStatus::Rejected) {
            return Err(AppError::InvalidTransition(anyhow!(
                "Status tujuan {} tidak diizinkan; penawaran hanya dapat disetujui atau ditolak",
                target.as_str()
            )));
        }

        let quotation = self
            .store
            .quotation(quotation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Penawaran tidak ditemukan")))?;

        if quotation.effective_status(now) != QuotationStatus::Pending {
            return Err(transition_blocked(&quotation, now));
        }

        match self
            .store
            .transition_quotation(quotation_id, target, actor, notes, now)
            .await?
        {
            Some(updated) => {
                QUOTATION_TRANSITIONS_TOTAL
                    .with_label_values(&[target.as_str()])
                    .inc();
                Ok(updated)
            }
            None => {
                // Lost a race: the guard saw a state other than the one read
                // above. Report the committed state.
                let current = self
                    .store
                    .quotation(quotation_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(anyhow!("Penawaran tidak ditemukan")))?;
                Err(transition_blocked(&current, now))
            }
        }
    }

    /// Quotation with items; status reported as effective at `now`.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn get(
        &self,
        quotation_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<QuotationDetail, AppError> {
        let quotation = self
            .store
            .quotation(quotation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Penawaran tidak ditemukan")))?;
        let items = self.store.quotation_items(quotation_id).await?;
        Ok(QuotationDetail {
            quotation: quotation.with_effective_status(now),
            items,
        })
    }

    /// Quotations whose effective status at `now` equals `status`.
    ///
    /// `Expired` selects stored-pending rows past their validity window;
    /// `Pending` excludes them.
    #[instrument(skip(self), fields(status = status.as_str()))]
    pub async fn list_by_status(
        &self,
        status: QuotationStatus,
        now: DateTime<Utc>,
    ) -> Result<Vec<Quotation>, AppError> {
        let quotations = match status {
            QuotationStatus::Pending => self
                .store
                .quotations_with_status(QuotationStatus::Pending)
                .await?
                .into_iter()
                .filter(|q| q.valid_until >= now)
                .collect(),
            QuotationStatus::Expired => self
                .store
                .quotations_with_status(QuotationStatus::Pending)
                .await?
                .into_iter()
                .filter(|q| now > q.valid_until)
                .map(|q| q.with_effective_status(now))
                .collect(),
            _ => self.store.quotations_with_status(status).await?,
        };
        Ok(quotations)
    }

    /// Append-only transition history.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn status_log(
        &self,
        quotation_id: Uuid,
    ) -> Result<Vec<QuotationStatusLog>, AppError> {
        self.store.quotation_status_log(quotation_id).await
    }
}

fn transition_blocked(quotation: &Quotation, now: DateTime<Utc>) -> AppError {
    match quotation.effective_status(now) {
        QuotationStatus::Expired => AppError::InvalidTransition(anyhow!(
            "Penawaran {} sudah kedaluwarsa sejak {}",
            quotation.quotation_number,
            quotation.valid_until.format("%Y-%m-%d %H:%M")
        )),
        QuotationStatus::Pending => AppError::Conflict(anyhow!(
            "Penawaran {} sedang diproses, coba lagi",
            quotation.quotation_number
        )),
        status => AppError::InvalidTransition(anyhow!(
            "Penawaran {} sudah berstatus {}",
            quotation.quotation_number,
            status.as_str()
        )),
    }
}
