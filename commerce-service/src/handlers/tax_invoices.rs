//! Tax invoice handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::IssueTaxInvoiceRequest;
use crate::models::TaxInvoice;
use crate::startup::AppState;

/// Issue the tax invoice for a paid B2B invoice.
pub async fn issue_tax_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<IssueTaxInvoiceRequest>,
) -> Result<(StatusCode, Json<TaxInvoice>), AppError> {
    payload.validate()?;

    tracing::info!(
        invoice_id = %invoice_id,
        issued_by = %payload.issued_by,
        "Issuing tax invoice"
    );

    let tax_invoice = state
        .tax_invoices
        .issue(invoice_id, &payload.issued_by, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(tax_invoice)))
}

/// Get the tax invoice issued for an invoice.
pub async fn get_tax_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<TaxInvoice>, AppError> {
    let tax_invoice = state.tax_invoices.for_invoice(invoice_id).await?;
    Ok(Json(tax_invoice))
}
