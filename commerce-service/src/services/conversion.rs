//! Quotation-to-order conversion.
//!
//! An approved quotation materializes into exactly one order. Line items
//! are copied from the quotation snapshot; prices locked at quotation time
//! are never re-resolved against the live tiers.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{NewOrder, Order, OrderItem, Quotation, QuotationStatus};
use crate::services::metrics::QUOTATION_TRANSITIONS_TOTAL;
use crate::services::numbering::{DocumentKind, DocumentNumberer};
use crate::store::CommerceStore;

/// Order row together with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Clone)]
pub struct ConversionService {
    store: Arc<dyn CommerceStore>,
    numberer: DocumentNumberer,
}

impl ConversionService {
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        let numberer = DocumentNumberer::new(store.clone());
        Self { store, numberer }
    }

    /// Convert an approved quotation into an order, exactly once. The store
    /// flips the quotation to `converted` and inserts the order in one
    /// transaction; a concurrent second call loses the guard and fails.
    #[instrument(skip(self), fields(quotation_id = %quotation_id, actor = actor))]
    pub async fn convert(
        &self,
        quotation_id: Uuid,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<OrderDetail, AppError> {
        let quotation = self
            .store
            .quotation(quotation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Penawaran tidak ditemukan")))?;

        if let Some(blocked) = conversion_blocked(&quotation, now) {
            return Err(blocked);
        }

        let snapshot = self.store.quotation_items(quotation_id).await?;
        let order_id = Uuid::new_v4();
        let items: Vec<OrderItem> = snapshot
            .into_iter()
            .map(|item| OrderItem {
                order_item_id: Uuid::new_v4(),
                order_id,
                product_id: item.product_id,
                sku: item.sku,
                name: item.name,
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.total_price,
            })
            .collect();

        let order_number = self.numberer.next(DocumentKind::Order, now).await?;
        let new_order = NewOrder {
            order_id,
            order_number,
            customer_id: quotation.customer_id,
            quotation_id,
            items: items.clone(),
            subtotal: quotation.subtotal,
            tax_amount: quotation.tax_amount,
            total_amount: quotation.total_amount,
            shipping_address: quotation.shipping_address.clone(),
            created_at: now,
        };

        match self
            .store
            .convert_quotation(quotation_id, &new_order, actor, now)
            .await?
        {
            Some(order) => {
                QUOTATION_TRANSITIONS_TOTAL
                    .with_label_values(&[QuotationStatus::Converted.as_str()])
                    .inc();
                Ok(OrderDetail { order, items })
            }
            None => {
                // Lost a race with another conversion or transition.
                let current = self
                    .store
                    .quotation(quotation_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(anyhow!("Penawaran tidak ditemukan")))?;
                Err(conversion_blocked(&current, now).unwrap_or_else(|| {
                    AppError::Conflict(anyhow!(
                        "Penawaran {} sedang diproses, coba lagi",
                        current.quotation_number
                    ))
                }))
            }
        }
    }

    /// Order with items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get(&self, order_id: Uuid) -> Result<OrderDetail, AppError> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow!("Order tidak ditemukan")))?;
        let items = self.store.order_items(order_id).await?;
        Ok(OrderDetail { order, items })
    }
}

fn conversion_blocked(quotation: &Quotation, now: DateTime<Utc>) -> Option<AppError> {
    if quotation.converted_order_id.is_some() {
        return Some(AppError::InvalidTransition(anyhow!(
            "Penawaran {} sudah dikonversi menjadi order",
            quotation.quotation_number
        )));
    }
    match quotation.effective_status(now) {
        QuotationStatus::Approved => None,
        status => Some(AppError::InvalidTransition(anyhow!(
            "Hanya penawaran yang disetujui yang dapat dikonversi (status saat ini: {})",
            status.as_str()
        ))),
    }
}
