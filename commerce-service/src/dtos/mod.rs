//! Request DTOs for the HTTP surface.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::Urgency;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuotationRequest {
    pub customer_id: Uuid,
    pub urgency: Urgency,
    #[validate(
        length(min = 1, message = "Penawaran harus memiliki minimal satu item"),
        nested
    )]
    pub items: Vec<QuotationItemRequest>,
    pub shipping_address: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct QuotationItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Jumlah pesanan minimal 1"))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransitionQuotationRequest {
    pub target_status: String,
    #[validate(length(min = 1, message = "Nama petugas wajib diisi"))]
    pub actor: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConvertQuotationRequest {
    #[validate(length(min = 1, message = "Nama petugas wajib diisi"))]
    pub actor: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct IssueTaxInvoiceRequest {
    #[validate(length(min = 1, message = "Nama penerbit wajib diisi"))]
    pub issued_by: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}
