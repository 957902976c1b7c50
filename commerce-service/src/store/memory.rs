//! In-memory implementation of the commerce store.
//!
//! Backs the test suite and local runs without PostgreSQL. One dataset
//! behind one `tokio::sync::Mutex`: a single lock hold is the unit of
//! atomicity, mirroring the transaction scope of `PgStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    Company, Customer, Invoice, NewOrder, NewQuotation, Order, OrderItem, PricingTier, Product,
    Quotation, QuotationItem, QuotationStatus, QuotationStatusLog, TaxInvoice,
};
use crate::store::CommerceStore;

#[derive(Default)]
struct MemoryState {
    products: HashMap<Uuid, Product>,
    pricing_tiers: HashMap<Uuid, Vec<PricingTier>>,
    customers: HashMap<Uuid, Customer>,
    companies: HashMap<Uuid, Company>,
    invoices: HashMap<Uuid, Invoice>,
    quotations: HashMap<Uuid, Quotation>,
    quotation_items: HashMap<Uuid, Vec<QuotationItem>>,
    status_log: HashMap<Uuid, Vec<QuotationStatusLog>>,
    orders: HashMap<Uuid, Order>,
    order_items: HashMap<Uuid, Vec<OrderItem>>,
    tax_invoices: HashMap<Uuid, TaxInvoice>,
    document_numbers: HashSet<String>,
    counters: HashMap<(String, i32), i64>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommerceStore for MemoryStore {
    async fn product(&self, product_id: Uuid) -> Result<Option<Product>, AppError> {
        let state = self.state.lock().await;
        Ok(state.products.get(&product_id).cloned())
    }

    async fn pricing_tiers(&self, product_id: Uuid) -> Result<Vec<PricingTier>, AppError> {
        let state = self.state.lock().await;
        let mut tiers = state
            .pricing_tiers
            .get(&product_id)
            .cloned()
            .unwrap_or_default();
        tiers.sort_by_key(|t| t.min_quantity);
        Ok(tiers)
    }

    async fn customer(&self, customer_id: Uuid) -> Result<Option<Customer>, AppError> {
        let state = self.state.lock().await;
        Ok(state.customers.get(&customer_id).cloned())
    }

    async fn company(&self, company_id: Uuid) -> Result<Option<Company>, AppError> {
        let state = self.state.lock().await;
        Ok(state.companies.get(&company_id).cloned())
    }

    async fn invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let state = self.state.lock().await;
        Ok(state.invoices.get(&invoice_id).cloned())
    }

    async fn insert_quotation(&self, quotation: &NewQuotation) -> Result<Quotation, AppError> {
        let mut state = self.state.lock().await;

        if !state
            .document_numbers
            .insert(quotation.quotation_number.clone())
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Nomor penawaran {} sudah terpakai",
                quotation.quotation_number
            )));
        }

        let row = Quotation {
            quotation_id: quotation.quotation_id,
            quotation_number: quotation.quotation_number.clone(),
            customer_id: quotation.customer_id,
            status: QuotationStatus::Pending.as_str().to_string(),
            subtotal: quotation.subtotal,
            tax_amount: quotation.tax_amount,
            total_amount: quotation.total_amount,
            valid_until: quotation.valid_until,
            converted_order_id: None,
            shipping_address: quotation.shipping_address.clone(),
            created_at: quotation.created_at,
        };

        state.quotations.insert(row.quotation_id, row.clone());
        state
            .quotation_items
            .insert(row.quotation_id, quotation.items.clone());

        info!(
            quotation_id = %row.quotation_id,
            quotation_number = %row.quotation_number,
            "Quotation created"
        );

        Ok(row)
    }

    async fn quotation(&self, quotation_id: Uuid) -> Result<Option<Quotation>, AppError> {
        let state = self.state.lock().await;
        Ok(state.quotations.get(&quotation_id).cloned())
    }

    async fn quotation_items(&self, quotation_id: Uuid) -> Result<Vec<QuotationItem>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .quotation_items
            .get(&quotation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn quotations_with_status(
        &self,
        status: QuotationStatus,
    ) -> Result<Vec<Quotation>, AppError> {
        let state = self.state.lock().await;
        let mut quotations: Vec<Quotation> = state
            .quotations
            .values()
            .filter(|q| q.status == status.as_str())
            .cloned()
            .collect();
        quotations.sort_by_key(|q| q.created_at);
        Ok(quotations)
    }

    async fn quotation_status_log(
        &self,
        quotation_id: Uuid,
    ) -> Result<Vec<QuotationStatusLog>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .status_log
            .get(&quotation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn transition_quotation(
        &self,
        quotation_id: Uuid,
        target: QuotationStatus,
        actor: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Quotation>, AppError> {
        let mut state = self.state.lock().await;

        let guard_passed = state
            .quotations
            .get(&quotation_id)
            .map(|q| q.status == QuotationStatus::Pending.as_str() && q.valid_until > now)
            .unwrap_or(false);
        if !guard_passed {
            return Ok(None);
        }

        let quotation = match state.quotations.get_mut(&quotation_id) {
            Some(q) => {
                q.status = target.as_str().to_string();
                q.clone()
            }
            None => return Ok(None),
        };

        state
            .status_log
            .entry(quotation_id)
            .or_default()
            .push(QuotationStatusLog {
                log_id: Uuid::new_v4(),
                quotation_id,
                from_status: QuotationStatus::Pending.as_str().to_string(),
                to_status: target.as_str().to_string(),
                actor: actor.to_string(),
                notes: notes.map(str::to_string),
                created_at: now,
            });

        info!(
            quotation_id = %quotation_id,
            status = target.as_str(),
            actor = actor,
            "Quotation transitioned"
        );

        Ok(Some(quotation))
    }

    async fn convert_quotation(
        &self,
        quotation_id: Uuid,
        order: &NewOrder,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, AppError> {
        let mut state = self.state.lock().await;

        let guard_passed = state
            .quotations
            .get(&quotation_id)
            .map(|q| {
                q.status == QuotationStatus::Approved.as_str() && q.converted_order_id.is_none()
            })
            .unwrap_or(false);
        if !guard_passed {
            return Ok(None);
        }

        if !state.document_numbers.insert(order.order_number.clone()) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Nomor order {} sudah terpakai",
                order.order_number
            )));
        }

        if let Some(q) = state.quotations.get_mut(&quotation_id) {
            q.status = QuotationStatus::Converted.as_str().to_string();
            q.converted_order_id = Some(order.order_id);
        }

        let row = Order {
            order_id: order.order_id,
            order_number: order.order_number.clone(),
            customer_id: order.customer_id,
            quotation_id: Some(order.quotation_id),
            status: "new".to_string(),
            subtotal: order.subtotal,
            tax_amount: order.tax_amount,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address.clone(),
            created_at: order.created_at,
        };

        state.orders.insert(row.order_id, row.clone());
        state.order_items.insert(row.order_id, order.items.clone());
        state
            .status_log
            .entry(quotation_id)
            .or_default()
            .push(QuotationStatusLog {
                log_id: Uuid::new_v4(),
                quotation_id,
                from_status: QuotationStatus::Approved.as_str().to_string(),
                to_status: QuotationStatus::Converted.as_str().to_string(),
                actor: actor.to_string(),
                notes: None,
                created_at: now,
            });

        info!(
            quotation_id = %quotation_id,
            order_id = %row.order_id,
            order_number = %row.order_number,
            "Quotation converted to order"
        );

        Ok(Some(row))
    }

    async fn order(&self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&order_id).cloned())
    }

    async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        let state = self.state.lock().await;
        Ok(state.order_items.get(&order_id).cloned().unwrap_or_default())
    }

    async fn tax_invoice_for_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<TaxInvoice>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .tax_invoices
            .values()
            .find(|t| t.invoice_id == invoice_id)
            .cloned())
    }

    async fn insert_tax_invoice(&self, tax_invoice: &TaxInvoice) -> Result<TaxInvoice, AppError> {
        let mut state = self.state.lock().await;

        if state
            .tax_invoices
            .values()
            .any(|t| t.invoice_id == tax_invoice.invoice_id)
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Faktur pajak untuk invoice ini sudah diterbitkan"
            )));
        }

        if !state
            .document_numbers
            .insert(tax_invoice.tax_invoice_number.clone())
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Nomor faktur pajak {} sudah terpakai",
                tax_invoice.tax_invoice_number
            )));
        }

        if let Some(invoice) = state.invoices.get_mut(&tax_invoice.invoice_id) {
            invoice.tax_invoice_requested = true;
        }

        state
            .tax_invoices
            .insert(tax_invoice.tax_invoice_id, tax_invoice.clone());

        info!(
            tax_invoice_id = %tax_invoice.tax_invoice_id,
            tax_invoice_number = %tax_invoice.tax_invoice_number,
            "Tax invoice issued"
        );

        Ok(tax_invoice.clone())
    }

    async fn next_sequence(&self, kind: &str, year: i32) -> Result<i64, AppError> {
        let mut state = self.state.lock().await;
        let counter = state
            .counters
            .entry((kind.to_string(), year))
            .or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn insert_product(
        &self,
        product: &Product,
        tiers: &[PricingTier],
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;

        if state.products.values().any(|p| p.sku == product.sku) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "SKU {} sudah terdaftar",
                product.sku
            )));
        }

        state.products.insert(product.product_id, product.clone());
        state
            .pricing_tiers
            .insert(product.product_id, tiers.to_vec());
        Ok(())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state
            .customers
            .insert(customer.customer_id, customer.clone());
        Ok(())
    }

    async fn insert_company(&self, company: &Company) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.companies.insert(company.company_id, company.clone());
        Ok(())
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), AppError> {
        let mut state = self.state.lock().await;

        if !state
            .document_numbers
            .insert(invoice.invoice_number.clone())
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Nomor invoice {} sudah terpakai",
                invoice.invoice_number
            )));
        }

        state.invoices.insert(invoice.invoice_id, invoice.clone());
        Ok(())
    }
}
