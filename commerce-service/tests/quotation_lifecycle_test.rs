//! Quotation lifecycle integration tests: creation, snapshot pricing,
//! status transitions, and derived expiry.

mod common;

use chrono::Duration;
use common::{test_now, TestApp, ACTOR};
use commerce_service::models::{QuotationStatus, Urgency};
use commerce_service::services::quotation::{CreateQuotation, QuotationItemInput};
use service_core::error::AppError;
use uuid::Uuid;

#[tokio::test]
async fn create_quotation_snapshots_tier_prices_and_totals() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;

    let detail = app
        .create_pending_quotation(customer_id, product_id, 250, Urgency::Normal, test_now())
        .await;

    assert_eq!(detail.quotation.status, "pending");
    assert!(detail.quotation.quotation_number.starts_with("QUO-20260806-"));
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].unit_price, 45_000);
    assert_eq!(detail.items[0].total_price, 11_250_000);
    assert_eq!(detail.quotation.subtotal, 11_250_000);
    assert_eq!(detail.quotation.tax_amount, 1_237_500);
    assert_eq!(detail.quotation.total_amount, 12_487_500);
    assert_eq!(detail.quotation.valid_until, test_now() + Duration::days(7));
    assert!(detail.quotation.converted_order_id.is_none());
}

#[tokio::test]
async fn quantity_below_first_tier_uses_base_price() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;

    let detail = app
        .create_pending_quotation(customer_id, product_id, 5, Urgency::Normal, test_now())
        .await;

    assert_eq!(detail.items[0].unit_price, 50_000);
    assert_eq!(detail.quotation.subtotal, 250_000);
}

#[tokio::test]
async fn urgency_controls_validity_window() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;

    let very_urgent = app
        .create_pending_quotation(customer_id, product_id, 10, Urgency::VeryUrgent, test_now())
        .await;
    // A later instant keeps the time-derived quotation numbers distinct.
    let urgent_created_at = test_now() + Duration::milliseconds(1);
    let urgent = app
        .create_pending_quotation(customer_id, product_id, 10, Urgency::Urgent, urgent_created_at)
        .await;

    assert_eq!(
        very_urgent.quotation.valid_until,
        test_now() + Duration::days(1)
    );
    assert_eq!(
        urgent.quotation.valid_until,
        urgent_created_at + Duration::days(3)
    );
}

#[tokio::test]
async fn create_with_unknown_customer_fails() {
    let app = TestApp::new();
    let product_id = app.seed_glove_product().await;

    let result = app
        .quotations
        .create(
            CreateQuotation {
                customer_id: Uuid::new_v4(),
                items: vec![QuotationItemInput {
                    product_id,
                    quantity: 10,
                }],
                urgency: Urgency::Normal,
                shipping_address: None,
            },
            test_now(),
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn create_with_unknown_product_fails() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;

    let result = app
        .quotations
        .create(
            CreateQuotation {
                customer_id,
                items: vec![QuotationItemInput {
                    product_id: Uuid::new_v4(),
                    quantity: 10,
                }],
                urgency: Urgency::Normal,
                shipping_address: None,
            },
            test_now(),
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn create_with_empty_cart_fails() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;

    let result = app
        .quotations
        .create(
            CreateQuotation {
                customer_id,
                items: vec![],
                urgency: Urgency::Normal,
                shipping_address: None,
            },
            test_now(),
        )
        .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn approve_pending_quotation_appends_status_log() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let detail = app
        .create_pending_quotation(customer_id, product_id, 100, Urgency::Normal, test_now())
        .await;

    let approved = app
        .quotations
        .transition(
            detail.quotation.quotation_id,
            QuotationStatus::Approved,
            ACTOR,
            Some("Harga sudah dicek"),
            test_now(),
        )
        .await
        .expect("Failed to approve");

    assert_eq!(approved.status, "approved");

    let log = app
        .quotations
        .status_log(detail.quotation.quotation_id)
        .await
        .expect("Failed to read status log");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].from_status, "pending");
    assert_eq!(log[0].to_status, "approved");
    assert_eq!(log[0].actor, ACTOR);
    assert_eq!(log[0].notes.as_deref(), Some("Harga sudah dicek"));
}

#[tokio::test]
async fn reject_pending_quotation_succeeds() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let detail = app
        .create_pending_quotation(customer_id, product_id, 100, Urgency::Normal, test_now())
        .await;

    let rejected = app
        .quotations
        .transition(
            detail.quotation.quotation_id,
            QuotationStatus::Rejected,
            ACTOR,
            Some("Stok tidak mencukupi"),
            test_now(),
        )
        .await
        .expect("Failed to reject");

    assert_eq!(rejected.status, "rejected");
}

#[tokio::test]
async fn transition_from_terminal_status_fails_and_leaves_status_unchanged() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let detail = app
        .create_pending_quotation(customer_id, product_id, 100, Urgency::Normal, test_now())
        .await;
    let quotation_id = detail.quotation.quotation_id;

    app.quotations
        .transition(quotation_id, QuotationStatus::Rejected, ACTOR, None, test_now())
        .await
        .expect("Failed to reject");

    let result = app
        .quotations
        .transition(quotation_id, QuotationStatus::Approved, ACTOR, None, test_now())
        .await;
    assert!(matches!(result, Err(AppError::InvalidTransition(_))));

    let current = app
        .quotations
        .get(quotation_id, test_now())
        .await
        .expect("Failed to read quotation");
    assert_eq!(current.quotation.status, "rejected");

    let log = app
        .quotations
        .status_log(quotation_id)
        .await
        .expect("Failed to read status log");
    assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn transition_to_disallowed_target_fails() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let detail = app
        .create_pending_quotation(customer_id, product_id, 100, Urgency::Normal, test_now())
        .await;

    for target in [
        QuotationStatus::Pending,
        QuotationStatus::Expired,
        QuotationStatus::Converted,
    ] {
        let result = app
            .quotations
            .transition(detail.quotation.quotation_id, target, ACTOR, None, test_now())
            .await;
        assert!(
            matches!(result, Err(AppError::InvalidTransition(_))),
            "target {} should be rejected",
            target.as_str()
        );
    }
}

#[tokio::test]
async fn expired_quotation_cannot_be_transitioned() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let detail = app
        .create_pending_quotation(customer_id, product_id, 100, Urgency::VeryUrgent, test_now())
        .await;

    let later = test_now() + Duration::days(2);
    let result = app
        .quotations
        .transition(
            detail.quotation.quotation_id,
            QuotationStatus::Approved,
            ACTOR,
            None,
            later,
        )
        .await;

    assert!(matches!(result, Err(AppError::InvalidTransition(_))));
}

#[tokio::test]
async fn reads_report_derived_expiry() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let detail = app
        .create_pending_quotation(customer_id, product_id, 100, Urgency::VeryUrgent, test_now())
        .await;

    let fresh = app
        .quotations
        .get(detail.quotation.quotation_id, test_now())
        .await
        .expect("Failed to read quotation");
    assert_eq!(fresh.quotation.status, "pending");

    let later = test_now() + Duration::days(2);
    let stale = app
        .quotations
        .get(detail.quotation.quotation_id, later)
        .await
        .expect("Failed to read quotation");
    assert_eq!(stale.quotation.status, "expired");
}

#[tokio::test]
async fn list_by_status_separates_pending_from_expired() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;

    let short_lived = app
        .create_pending_quotation(customer_id, product_id, 100, Urgency::VeryUrgent, test_now())
        .await;
    let long_lived = app
        .create_pending_quotation(
            customer_id,
            product_id,
            100,
            Urgency::Normal,
            test_now() + Duration::milliseconds(1),
        )
        .await;

    let later = test_now() + Duration::days(2);

    let pending = app
        .quotations
        .list_by_status(QuotationStatus::Pending, later)
        .await
        .expect("Failed to list pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(
        pending[0].quotation_id,
        long_lived.quotation.quotation_id
    );

    let expired = app
        .quotations
        .list_by_status(QuotationStatus::Expired, later)
        .await
        .expect("Failed to list expired");
    assert_eq!(expired.len(), 1);
    assert_eq!(
        expired[0].quotation_id,
        short_lived.quotation.quotation_id
    );
    assert_eq!(expired[0].status, "expired");
}

#[tokio::test]
async fn concurrent_transitions_serialize_to_one_winner() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let detail = app
        .create_pending_quotation(customer_id, product_id, 100, Urgency::Normal, test_now())
        .await;
    let quotation_id = detail.quotation.quotation_id;

    let approve = {
        let service = app.quotations.clone();
        tokio::spawn(async move {
            service
                .transition(quotation_id, QuotationStatus::Approved, "admin-a", None, test_now())
                .await
        })
    };
    let reject = {
        let service = app.quotations.clone();
        tokio::spawn(async move {
            service
                .transition(quotation_id, QuotationStatus::Rejected, "admin-b", None, test_now())
                .await
        })
    };

    let approve_result = approve.await.expect("approve task panicked");
    let reject_result = reject.await.expect("reject task panicked");

    assert_eq!(
        approve_result.is_ok() as u8 + reject_result.is_ok() as u8,
        1,
        "exactly one transition must win"
    );
    for result in [&approve_result, &reject_result] {
        if let Err(err) = result {
            assert!(matches!(err, AppError::InvalidTransition(_)));
        }
    }

    let log = app
        .quotations
        .status_log(quotation_id)
        .await
        .expect("Failed to read status log");
    assert_eq!(log.len(), 1, "the loser must not append a log entry");

    let current = app
        .quotations
        .get(quotation_id, test_now())
        .await
        .expect("Failed to read quotation");
    let winner_status = if approve_result.is_ok() {
        "approved"
    } else {
        "rejected"
    };
    assert_eq!(current.quotation.status, winner_status);
}
