//! PostgreSQL implementation of the commerce store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    Company, Customer, Invoice, NewOrder, NewQuotation, Order, OrderItem, PricingTier, Product,
    Quotation, QuotationItem, QuotationStatus, QuotationStatusLog, TaxInvoice,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::store::CommerceStore;

const QUOTATION_COLUMNS: &str = "quotation_id, quotation_number, customer_id, status, subtotal, \
     tax_amount, total_amount, valid_until, converted_order_id, shipping_address, created_at";

const ORDER_COLUMNS: &str = "order_id, order_number, customer_id, quotation_id, status, subtotal, \
     tax_amount, total_amount, shipping_address, created_at";

const TAX_INVOICE_COLUMNS: &str = "tax_invoice_id, tax_invoice_number, invoice_id, ppn_rate, \
     ppn_amount, total_with_ppn, issued_at, issued_by";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "commerce-service"))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl CommerceStore for PgStore {
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn product(&self, product_id: Uuid) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION.with_label_values(&["product"]).start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, sku, name, base_price, stock, min_stock
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        timer.observe_duration();

        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn pricing_tiers(&self, product_id: Uuid) -> Result<Vec<PricingTier>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["pricing_tiers"])
            .start_timer();

        let tiers = sqlx::query_as::<_, PricingTier>(
            r#"
            SELECT tier_id, product_id, min_quantity, max_quantity, price_per_unit, active
            FROM pricing_tiers
            WHERE product_id = $1
            ORDER BY min_quantity
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get pricing tiers: {}", e))
        })?;

        timer.observe_duration();

        Ok(tiers)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn customer(&self, customer_id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, name, email, customer_type, company_id
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        Ok(customer)
    }

    #[instrument(skip(self), fields(company_id = %company_id))]
    async fn company(&self, company_id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT company_id, name, tax_id, registration_number, address, city, province
            FROM companies
            WHERE company_id = $1
            "#,
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get company: {}", e)))?;

        Ok(company)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, invoice_number, order_id, status, subtotal, total_amount,
                due_date, paid_at, tax_invoice_requested, created_at
            FROM invoices
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        Ok(invoice)
    }

    #[instrument(skip(self, quotation), fields(quotation_number = %quotation.quotation_number))]
    async fn insert_quotation(&self, quotation: &NewQuotation) -> Result<Quotation, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_quotation"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let row = sqlx::query_as::<_, Quotation>(&format!(
            r#"
            INSERT INTO quotations (
                quotation_id, quotation_number, customer_id, status, subtotal, tax_amount,
                total_amount, valid_until, shipping_address, created_at
            )
            VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8, $9)
            RETURNING {QUOTATION_COLUMNS}
            "#
        ))
        .bind(quotation.quotation_id)
        .bind(&quotation.quotation_number)
        .bind(quotation.customer_id)
        .bind(quotation.subtotal)
        .bind(quotation.tax_amount)
        .bind(quotation.total_amount)
        .bind(quotation.valid_until)
        .bind(&quotation.shipping_address)
        .bind(quotation.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Nomor penawaran {} sudah terpakai",
                    quotation.quotation_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert quotation: {}", e)),
        })?;

        for item in &quotation.items {
            sqlx::query(
                r#"
                INSERT INTO quotation_items (
                    quotation_item_id, quotation_id, product_id, sku, name, quantity,
                    unit_price, total_price
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.quotation_item_id)
            .bind(item.quotation_id)
            .bind(item.product_id)
            .bind(&item.sku)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert quotation item: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit quotation: {}", e))
        })?;

        timer.observe_duration();

        info!(
            quotation_id = %row.quotation_id,
            quotation_number = %row.quotation_number,
            "Quotation created"
        );

        Ok(row)
    }

    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    async fn quotation(&self, quotation_id: Uuid) -> Result<Option<Quotation>, AppError> {
        let quotation = sqlx::query_as::<_, Quotation>(&format!(
            r#"
            SELECT {QUOTATION_COLUMNS}
            FROM quotations
            WHERE quotation_id = $1
            "#
        ))
        .bind(quotation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get quotation: {}", e)))?;

        Ok(quotation)
    }

    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    async fn quotation_items(&self, quotation_id: Uuid) -> Result<Vec<QuotationItem>, AppError> {
        let items = sqlx::query_as::<_, QuotationItem>(
            r#"
            SELECT quotation_item_id, quotation_id, product_id, sku, name, quantity,
                unit_price, total_price
            FROM quotation_items
            WHERE quotation_id = $1
            ORDER BY sku
            "#,
        )
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get quotation items: {}", e))
        })?;

        Ok(items)
    }

    #[instrument(skip(self))]
    async fn quotations_with_status(
        &self,
        status: QuotationStatus,
    ) -> Result<Vec<Quotation>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["quotations_with_status"])
            .start_timer();

        let quotations = sqlx::query_as::<_, Quotation>(&format!(
            r#"
            SELECT {QUOTATION_COLUMNS}
            FROM quotations
            WHERE status = $1
            ORDER BY created_at
            "#
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list quotations: {}", e))
        })?;

        timer.observe_duration();

        Ok(quotations)
    }

    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    async fn quotation_status_log(
        &self,
        quotation_id: Uuid,
    ) -> Result<Vec<QuotationStatusLog>, AppError> {
        let entries = sqlx::query_as::<_, QuotationStatusLog>(
            r#"
            SELECT log_id, quotation_id, from_status, to_status, actor, notes, created_at
            FROM quotation_status_log
            WHERE quotation_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get status log: {}", e)))?;

        Ok(entries)
    }

    #[instrument(skip(self, notes), fields(quotation_id = %quotation_id, target = target.as_str()))]
    async fn transition_quotation(
        &self,
        quotation_id: Uuid,
        target: QuotationStatus,
        actor: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Quotation>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transition_quotation"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        // The guard re-checks status and validity inside the transaction, so
        // exactly one of two racing transitions can commit.
        let updated = sqlx::query_as::<_, Quotation>(&format!(
            r#"
            UPDATE quotations
            SET status = $2
            WHERE quotation_id = $1 AND status = 'pending' AND valid_until > $3
            RETURNING {QUOTATION_COLUMNS}
            "#
        ))
        .bind(quotation_id)
        .bind(target.as_str())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to transition quotation: {}", e))
        })?;

        let Some(quotation) = updated else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO quotation_status_log (
                log_id, quotation_id, from_status, to_status, actor, notes, created_at
            )
            VALUES ($1, $2, 'pending', $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(quotation_id)
        .bind(target.as_str())
        .bind(actor)
        .bind(notes)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to append status log: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transition: {}", e))
        })?;

        timer.observe_duration();

        info!(
            quotation_id = %quotation_id,
            status = target.as_str(),
            actor = actor,
            "Quotation transitioned"
        );

        Ok(Some(quotation))
    }

    #[instrument(skip(self, order), fields(quotation_id = %quotation_id, order_number = %order.order_number))]
    async fn convert_quotation(
        &self,
        quotation_id: Uuid,
        order: &NewOrder,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["convert_quotation"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let flipped = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE quotations
            SET status = 'converted', converted_order_id = $2
            WHERE quotation_id = $1 AND status = 'approved' AND converted_order_id IS NULL
            RETURNING quotation_id
            "#,
        )
        .bind(quotation_id)
        .bind(order.order_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to convert quotation: {}", e))
        })?;

        if flipped.is_none() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (
                order_id, order_number, customer_id, quotation_id, status, subtotal,
                tax_amount, total_amount, shipping_address, created_at
            )
            VALUES ($1, $2, $3, $4, 'new', $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.order_id)
        .bind(&order.order_number)
        .bind(order.customer_id)
        .bind(order.quotation_id)
        .bind(order.subtotal)
        .bind(order.tax_amount)
        .bind(order.total_amount)
        .bind(&order.shipping_address)
        .bind(order.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Nomor order {} sudah terpakai",
                    order.order_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert order: {}", e)),
        })?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_item_id, order_id, product_id, sku, name, quantity,
                    unit_price, total_price
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.order_item_id)
            .bind(item.order_id)
            .bind(item.product_id)
            .bind(&item.sku)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert order item: {}", e))
            })?;
        }

        sqlx::query(
            r#"
            INSERT INTO quotation_status_log (
                log_id, quotation_id, from_status, to_status, actor, notes, created_at
            )
            VALUES ($1, $2, 'approved', 'converted', $3, NULL, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(quotation_id)
        .bind(actor)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to append status log: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit conversion: {}", e))
        })?;

        timer.observe_duration();

        info!(
            quotation_id = %quotation_id,
            order_id = %row.order_id,
            order_number = %row.order_number,
            "Quotation converted to order"
        );

        Ok(Some(row))
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn order(&self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE order_id = $1
            "#
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get order: {}", e)))?;

        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT order_item_id, order_id, product_id, sku, name, quantity,
                unit_price, total_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY sku
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get order items: {}", e)))?;

        Ok(items)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn tax_invoice_for_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<TaxInvoice>, AppError> {
        let tax_invoice = sqlx::query_as::<_, TaxInvoice>(&format!(
            r#"
            SELECT {TAX_INVOICE_COLUMNS}
            FROM tax_invoices
            WHERE invoice_id = $1
            "#
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get tax invoice: {}", e)))?;

        Ok(tax_invoice)
    }

    #[instrument(skip(self, tax_invoice), fields(invoice_id = %tax_invoice.invoice_id))]
    async fn insert_tax_invoice(&self, tax_invoice: &TaxInvoice) -> Result<TaxInvoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_tax_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let row = sqlx::query_as::<_, TaxInvoice>(&format!(
            r#"
            INSERT INTO tax_invoices (
                tax_invoice_id, tax_invoice_number, invoice_id, ppn_rate, ppn_amount,
                total_with_ppn, issued_at, issued_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TAX_INVOICE_COLUMNS}
            "#
        ))
        .bind(tax_invoice.tax_invoice_id)
        .bind(&tax_invoice.tax_invoice_number)
        .bind(tax_invoice.invoice_id)
        .bind(tax_invoice.ppn_rate)
        .bind(tax_invoice.ppn_amount)
        .bind(tax_invoice.total_with_ppn)
        .bind(tax_invoice.issued_at)
        .bind(&tax_invoice.issued_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some("tax_invoices_invoice_id_key") => AppError::Conflict(anyhow::anyhow!(
                        "Faktur pajak untuk invoice ini sudah diterbitkan"
                    )),
                    _ => AppError::Conflict(anyhow::anyhow!(
                        "Nomor faktur pajak {} sudah terpakai",
                        tax_invoice.tax_invoice_number
                    )),
                }
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert tax invoice: {}", e)),
        })?;

        sqlx::query(
            r#"
            UPDATE invoices
            SET tax_invoice_requested = TRUE
            WHERE invoice_id = $1
            "#,
        )
        .bind(tax_invoice.invoice_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to flag invoice: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit tax invoice: {}", e))
        })?;

        timer.observe_duration();

        info!(
            tax_invoice_id = %row.tax_invoice_id,
            tax_invoice_number = %row.tax_invoice_number,
            "Tax invoice issued"
        );

        Ok(row)
    }

    #[instrument(skip(self))]
    async fn next_sequence(&self, kind: &str, year: i32) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["next_sequence"])
            .start_timer();

        let value = sqlx::query_scalar::<_, i64>("SELECT next_document_number($1, $2)")
            .bind(kind)
            .bind(year)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to advance counter: {}", e))
            })?;

        timer.observe_duration();

        Ok(value)
    }

    #[instrument(skip(self, product, tiers), fields(sku = %product.sku))]
    async fn insert_product(
        &self,
        product: &Product,
        tiers: &[PricingTier],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO products (product_id, sku, name, base_price, stock, min_stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.product_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.base_price)
        .bind(product.stock)
        .bind(product.min_stock)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("SKU {} sudah terdaftar", product.sku))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert product: {}", e)),
        })?;

        for tier in tiers {
            sqlx::query(
                r#"
                INSERT INTO pricing_tiers (
                    tier_id, product_id, min_quantity, max_quantity, price_per_unit, active
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(tier.tier_id)
            .bind(tier.product_id)
            .bind(tier.min_quantity)
            .bind(tier.max_quantity)
            .bind(tier.price_per_unit)
            .bind(tier.active)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert pricing tier: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit product: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.customer_id))]
    async fn insert_customer(&self, customer: &Customer) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO customers (customer_id, name, email, customer_type, company_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(customer.customer_id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.customer_type)
        .bind(customer.company_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert customer: {}", e)))?;

        Ok(())
    }

    #[instrument(skip(self, company), fields(company_id = %company.company_id))]
    async fn insert_company(&self, company: &Company) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO companies (
                company_id, name, tax_id, registration_number, address, city, province
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(company.company_id)
        .bind(&company.name)
        .bind(&company.tax_id)
        .bind(&company.registration_number)
        .bind(&company.address)
        .bind(&company.city)
        .bind(&company.province)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert company: {}", e)))?;

        Ok(())
    }

    #[instrument(skip(self, invoice), fields(invoice_number = %invoice.invoice_number))]
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_id, invoice_number, order_id, status, subtotal, total_amount,
                due_date, paid_at, tax_invoice_requested, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(&invoice.invoice_number)
        .bind(invoice.order_id)
        .bind(&invoice.status)
        .bind(invoice.subtotal)
        .bind(invoice.total_amount)
        .bind(invoice.due_date)
        .bind(invoice.paid_at)
        .bind(invoice.tax_invoice_requested)
        .bind(invoice.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Nomor invoice {} sudah terpakai",
                    invoice.invoice_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert invoice: {}", e)),
        })?;

        Ok(())
    }
}
