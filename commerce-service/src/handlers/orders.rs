//! Order handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::ConvertQuotationRequest;
use crate::services::conversion::OrderDetail;
use crate::startup::AppState;

/// Convert an approved quotation into an order.
pub async fn convert_quotation(
    State(state): State<AppState>,
    Path(quotation_id): Path<Uuid>,
    Json(payload): Json<ConvertQuotationRequest>,
) -> Result<(StatusCode, Json<OrderDetail>), AppError> {
    payload.validate()?;

    tracing::info!(
        quotation_id = %quotation_id,
        actor = %payload.actor,
        "Converting quotation"
    );

    let detail = state
        .conversions
        .convert(quotation_id, &payload.actor, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// Get an order with its items.
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetail>, AppError> {
    let detail = state.conversions.get(order_id).await?;
    Ok(Json(detail))
}
