//! Prometheus metrics for commerce-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Documents issued by kind (quotation, order, invoice, tax_invoice).
pub static DOCUMENTS_ISSUED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "commerce_documents_issued_total",
        "Total number of documents issued by kind",
        &["kind"]
    )
    .expect("Failed to register documents_issued_total")
});

/// Quotation status transitions by target status.
pub static QUOTATION_TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "commerce_quotation_transitions_total",
        "Total number of quotation status transitions by target status",
        &["status"]
    )
    .expect("Failed to register quotation_transitions_total")
});

/// PPN amount issued on tax invoices, in rupiah.
pub static PPN_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "commerce_ppn_amount_total",
        "Total PPN amount on issued tax invoices",
        &["currency"]
    )
    .expect("Failed to register ppn_amount_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "commerce_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DOCUMENTS_ISSUED_TOTAL);
    Lazy::force(&QUOTATION_TRANSITIONS_TOTAL);
    Lazy::force(&PPN_AMOUNT_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
