//! Quotation handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{CreateQuotationRequest, StatusQuery, TransitionQuotationRequest};
use crate::models::{Quotation, QuotationStatus};
use crate::services::quotation::{CreateQuotation, QuotationDetail, QuotationItemInput};
use crate::startup::AppState;

/// Create a new quotation from a cart of product lines.
pub async fn create_quotation(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuotationRequest>,
) -> Result<(StatusCode, Json<QuotationDetail>), AppError> {
    payload.validate()?;

    tracing::info!(
        customer_id = %payload.customer_id,
        items = payload.items.len(),
        "Creating quotation"
    );

    let input = CreateQuotation {
        customer_id: payload.customer_id,
        urgency: payload.urgency,
        items: payload
            .items
            .iter()
            .map(|item| QuotationItemInput {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
        shipping_address: payload.shipping_address,
    };

    let detail = state.quotations.create(input, Utc::now()).await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// Get a quotation with its items.
pub async fn get_quotation(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
) -> Result<Json<QuotationDetail>, AppError> {
    let detail = state.quotations.get(quotation_id, Utc::now()).await?;
    Ok(Json(detail))
}

/// List quotations by effective status.
pub async fn list_quotations(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Quotation>>, AppError> {
    let status = QuotationStatus::parse(&query.status).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Status {} tidak dikenal", query.status))
    })?;

    let quotations = state.quotations.list_by_status(status, Utc::now()).await?;
    Ok(Json(quotations))
}

/// Approve or reject a pending quotation.
pub async fn transition_quotation(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
    Json(payload): Json<TransitionQuotationRequest>,
) -> Result<Json<Quotation>, AppError> {
    payload.validate()?;

    let target = QuotationStatus::parse(&payload.target_status).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Status tujuan {} tidak dikenal",
            payload.target_status
        ))
    })?;

    tracing::info!(
        quotation_id = %quotation_id,
        target = target.as_str(),
        actor = %payload.actor,
        "Transitioning quotation"
    );

    let quotation = state
        .quotations
        .transition(
            quotation_id,
            target,
            &payload.actor,
            payload.notes.as_deref(),
            Utc::now(),
        )
        .await?;

    Ok(Json(quotation))
}
