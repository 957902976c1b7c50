//! Application startup and lifecycle management.

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use secrecy::ExposeSecret;
use serde_json::json;
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::handlers;
use crate::services::conversion::ConversionService;
use crate::services::metrics::{get_metrics, init_metrics};
use crate::services::quotation::QuotationService;
use crate::services::tax::TaxInvoiceService;
use crate::store::{CommerceStore, MemoryStore, PgStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CommerceStore>,
    pub quotations: QuotationService,
    pub conversions: ConversionService,
    pub tax_invoices: TaxInvoiceService,
}

impl AppState {
    pub fn new(store: Arc<dyn CommerceStore>) -> Self {
        Self {
            quotations: QuotationService::new(store.clone()),
            conversions: ConversionService::new(store.clone()),
            tax_invoices: TaxInvoiceService::new(store.clone()),
            store,
        }
    }
}

/// Health check endpoint for Docker/K8s liveness probes.
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "commerce-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check endpoint for K8s readiness probes.
async fn readiness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}

/// Prometheus metrics endpoint.
async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

/// Pipeline routes plus operational endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .route(
            "/quotations",
            post(handlers::create_quotation).get(handlers::list_quotations),
        )
        .route("/quotations/:quotation_id", get(handlers::get_quotation))
        .route(
            "/quotations/:quotation_id/transition",
            post(handlers::transition_quotation),
        )
        .route(
            "/quotations/:quotation_id/convert",
            post(handlers::convert_quotation),
        )
        .route("/orders/:order_id", get(handlers::get_order))
        .route(
            "/invoices/:invoice_id/tax-invoice",
            post(handlers::issue_tax_invoice).get(handlers::get_tax_invoice),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        init_metrics();

        let store: Arc<dyn CommerceStore> = match &config.database.url {
            Some(url) => {
                let store = PgStore::connect(
                    url.expose_secret(),
                    config.database.max_connections,
                    config.database.min_connections,
                )
                .await?;
                store.run_migrations().await?;
                Arc::new(store)
            }
            None => {
                tracing::warn!(
                    "APP__DATABASE__URL not set, falling back to the in-memory store"
                );
                Arc::new(MemoryStore::new())
            }
        };

        let state = AppState::new(store);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the process is stopped.
    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        tracing::info!(port = self.port, "commerce-service listening");
        axum::serve(self.listener, router(self.state)).await?;
        Ok(())
    }
}
