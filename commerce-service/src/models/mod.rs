//! Domain models for commerce-service.

mod customer;
mod invoice;
mod order;
mod product;
mod quotation;
mod tax_invoice;

pub use customer::{Company, Customer, CustomerType};
pub use invoice::{Invoice, InvoiceStatus};
pub use order::{NewOrder, Order, OrderItem, OrderStatus};
pub use product::{PricingTier, Product};
pub use quotation::{
    NewQuotation, Quotation, QuotationItem, QuotationStatus, QuotationStatusLog, Urgency,
};
pub use tax_invoice::TaxInvoice;
