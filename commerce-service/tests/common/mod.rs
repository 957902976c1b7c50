//! Shared harness for the pipeline integration tests.
//!
//! Tests run against the in-memory store; seeding goes through the same
//! `CommerceStore` trait the services use.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use commerce_service::models::{
    Company, Customer, Invoice, PricingTier, Product, QuotationStatus, Urgency,
};
use commerce_service::services::conversion::{ConversionService, OrderDetail};
use commerce_service::services::numbering;
use commerce_service::services::quotation::{
    CreateQuotation, QuotationDetail, QuotationItemInput, QuotationService,
};
use commerce_service::services::tax::TaxInvoiceService;
use commerce_service::store::{CommerceStore, MemoryStore};

pub const ACTOR: &str = "admin";

pub struct TestApp {
    pub store: Arc<dyn CommerceStore>,
    pub quotations: QuotationService,
    pub conversions: ConversionService,
    pub tax_invoices: TaxInvoiceService,
}

impl TestApp {
    pub fn new() -> Self {
        let store: Arc<dyn CommerceStore> = Arc::new(MemoryStore::new());
        Self {
            quotations: QuotationService::new(store.clone()),
            conversions: ConversionService::new(store.clone()),
            tax_invoices: TaxInvoiceService::new(store.clone()),
            store,
        }
    }

    /// Nitrile glove product with the standard volume tiers:
    /// base 50_000, 100-499 at 45_000, 500+ at 40_000.
    pub async fn seed_glove_product(&self) -> Uuid {
        self.seed_product(
            "GLV-NIT-001",
            "Sarung Tangan Nitril",
            50_000,
            &[(100, Some(499), 45_000), (500, None, 40_000)],
        )
        .await
    }

    pub async fn seed_product(
        &self,
        sku: &str,
        name: &str,
        base_price: i64,
        tiers: &[(i64, Option<i64>, i64)],
    ) -> Uuid {
        let product_id = Uuid::new_v4();
        let product = Product {
            product_id,
            sku: sku.to_string(),
            name: name.to_string(),
            base_price,
            stock: 10_000,
            min_stock: 100,
        };
        let tiers: Vec<PricingTier> = tiers
            .iter()
            .map(|(min, max, price)| PricingTier {
                tier_id: Uuid::new_v4(),
                product_id,
                min_quantity: *min,
                max_quantity: *max,
                price_per_unit: *price,
                active: true,
            })
            .collect();
        self.store
            .insert_product(&product, &tiers)
            .await
            .expect("Failed to seed product");
        product_id
    }

    /// B2B customer with a complete, tax-invoice-eligible company profile.
    pub async fn seed_b2b_customer(&self) -> Uuid {
        self.seed_b2b_customer_with_company(complete_company()).await
    }

    pub async fn seed_b2b_customer_with_company(&self, company: Company) -> Uuid {
        let customer_id = Uuid::new_v4();
        let customer = Customer {
            customer_id,
            name: "PT Maju Bersama".to_string(),
            email: "purchasing@majubersama.co.id".to_string(),
            customer_type: "b2b".to_string(),
            company_id: Some(company.company_id),
        };
        self.store
            .insert_company(&company)
            .await
            .expect("Failed to seed company");
        self.store
            .insert_customer(&customer)
            .await
            .expect("Failed to seed customer");
        customer_id
    }

    pub async fn seed_b2c_customer(&self) -> Uuid {
        let customer_id = Uuid::new_v4();
        let customer = Customer {
            customer_id,
            name: "Budi Santoso".to_string(),
            email: "budi@example.com".to_string(),
            customer_type: "b2c".to_string(),
            company_id: None,
        };
        self.store
            .insert_customer(&customer)
            .await
            .expect("Failed to seed customer");
        customer_id
    }

    pub async fn create_pending_quotation(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        urgency: Urgency,
        now: DateTime<Utc>,
    ) -> QuotationDetail {
        self.quotations
            .create(
                CreateQuotation {
                    customer_id,
                    items: vec![QuotationItemInput {
                        product_id,
                        quantity,
                    }],
                    urgency,
                    shipping_address: Some("Jl. Kawasan Industri Blok C2, Bekasi".to_string()),
                },
                now,
            )
            .await
            .expect("Failed to create quotation")
    }

    pub async fn approved_quotation(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> QuotationDetail {
        let detail = self
            .create_pending_quotation(customer_id, product_id, quantity, Urgency::Normal, now)
            .await;
        self.quotations
            .transition(
                detail.quotation.quotation_id,
                QuotationStatus::Approved,
                ACTOR,
                None,
                now,
            )
            .await
            .expect("Failed to approve quotation");
        detail
    }

    pub async fn converted_order(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> OrderDetail {
        let detail = self
            .approved_quotation(customer_id, product_id, quantity, now)
            .await;
        self.conversions
            .convert(detail.quotation.quotation_id, ACTOR, now)
            .await
            .expect("Failed to convert quotation")
    }

    /// Paid invoice for an order, as the external invoicing flow would
    /// leave it.
    pub async fn seed_paid_invoice(
        &self,
        order_id: Uuid,
        subtotal: i64,
        total_amount: i64,
        now: DateTime<Utc>,
    ) -> Uuid {
        self.seed_invoice(order_id, subtotal, total_amount, "paid", Some(now), now)
            .await
    }

    pub async fn seed_invoice(
        &self,
        order_id: Uuid,
        subtotal: i64,
        total_amount: i64,
        status: &str,
        paid_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Uuid {
        let seq = self
            .store
            .next_sequence("invoice", 2026)
            .await
            .expect("Failed to advance invoice counter");
        let invoice_id = Uuid::new_v4();
        let invoice = Invoice {
            invoice_id,
            invoice_number: numbering::invoice_number(2026, seq),
            order_id,
            status: status.to_string(),
            subtotal,
            total_amount,
            due_date: now + Duration::days(30),
            paid_at,
            tax_invoice_requested: false,
            created_at: now,
        };
        self.store
            .insert_invoice(&invoice)
            .await
            .expect("Failed to seed invoice");
        invoice_id
    }
}

/// Fixed instant so validity windows and year markers are deterministic.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap()
}

pub fn complete_company() -> Company {
    Company {
        company_id: Uuid::new_v4(),
        name: "PT Maju Bersama".to_string(),
        tax_id: Some("01.234.567.8-901.000".to_string()),
        registration_number: Some("AHU-0012345.AH.01.01".to_string()),
        address: Some("Jl. Industri Raya No. 8".to_string()),
        city: Some("Bekasi".to_string()),
        province: Some("Jawa Barat".to_string()),
    }
}
