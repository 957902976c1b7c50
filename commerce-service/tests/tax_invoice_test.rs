//! Tax invoice issuance tests: eligibility, PPN arithmetic, and the 1:1
//! boundary with the invoice.

mod common;

use common::{complete_company, test_now, TestApp, ACTOR};
use commerce_service::models::Company;
use service_core::error::AppError;
use uuid::Uuid;

#[tokio::test]
async fn issue_tax_invoice_for_paid_b2b_invoice() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let order = app
        .converted_order(customer_id, product_id, 250, test_now())
        .await;
    let invoice_id = app
        .seed_paid_invoice(
            order.order.order_id,
            order.order.subtotal,
            order.order.total_amount,
            test_now(),
        )
        .await;

    let tax_invoice = app
        .tax_invoices
        .issue(invoice_id, ACTOR, test_now())
        .await
        .expect("Failed to issue tax invoice");

    assert_eq!(tax_invoice.tax_invoice_number, "010.000-26.00000001");
    assert_eq!(tax_invoice.invoice_id, invoice_id);
    // 11_250_000 * 0.11
    assert_eq!(tax_invoice.ppn_amount, 1_237_500);
    assert_eq!(tax_invoice.total_with_ppn, 12_487_500);
    assert_eq!(tax_invoice.issued_by, ACTOR);

    let regex = regex::Regex::new(r"^010\.000-\d{2}\.\d{8}$").unwrap();
    assert!(regex.is_match(&tax_invoice.tax_invoice_number));

    let invoice = app
        .store
        .invoice(invoice_id)
        .await
        .expect("Failed to read invoice")
        .expect("Invoice must exist");
    assert!(invoice.tax_invoice_requested);
}

#[tokio::test]
async fn ppn_base_is_subtotal_not_total() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let order = app
        .converted_order(customer_id, product_id, 100, test_now())
        .await;
    // A total that already carries other charges must not widen the PPN base.
    let invoice_id = app
        .seed_paid_invoice(order.order.order_id, 100_000, 150_000, test_now())
        .await;

    let tax_invoice = app
        .tax_invoices
        .issue(invoice_id, ACTOR, test_now())
        .await
        .expect("Failed to issue tax invoice");

    assert_eq!(tax_invoice.ppn_amount, 11_000);
    assert_eq!(tax_invoice.total_with_ppn, 111_000);
}

#[tokio::test]
async fn issue_for_unpaid_invoice_fails_without_side_effects() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let order = app
        .converted_order(customer_id, product_id, 100, test_now())
        .await;
    let invoice_id = app
        .seed_invoice(
            order.order.order_id,
            order.order.subtotal,
            order.order.total_amount,
            "pending",
            None,
            test_now(),
        )
        .await;

    let result = app.tax_invoices.issue(invoice_id, ACTOR, test_now()).await;
    assert!(matches!(result, Err(AppError::InvalidTransition(_))));

    let invoice = app
        .store
        .invoice(invoice_id)
        .await
        .expect("Failed to read invoice")
        .expect("Invoice must exist");
    assert!(!invoice.tax_invoice_requested);
    assert!(app
        .store
        .tax_invoice_for_invoice(invoice_id)
        .await
        .expect("Failed to read tax invoice")
        .is_none());
}

#[tokio::test]
async fn issue_twice_fails_and_keeps_a_single_tax_invoice() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let order = app
        .converted_order(customer_id, product_id, 100, test_now())
        .await;
    let invoice_id = app
        .seed_paid_invoice(
            order.order.order_id,
            order.order.subtotal,
            order.order.total_amount,
            test_now(),
        )
        .await;

    let first = app
        .tax_invoices
        .issue(invoice_id, ACTOR, test_now())
        .await
        .expect("First issuance must succeed");

    let second = app.tax_invoices.issue(invoice_id, ACTOR, test_now()).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    let stored = app
        .tax_invoices
        .for_invoice(invoice_id)
        .await
        .expect("Failed to read tax invoice");
    assert_eq!(stored.tax_invoice_id, first.tax_invoice_id);
    assert_eq!(stored.tax_invoice_number, first.tax_invoice_number);
}

#[tokio::test]
async fn issue_for_b2c_customer_reports_validation_errors() {
    let app = TestApp::new();
    let customer_id = app.seed_b2c_customer().await;
    let product_id = app.seed_glove_product().await;
    let order = app
        .converted_order(customer_id, product_id, 100, test_now())
        .await;
    let invoice_id = app
        .seed_paid_invoice(
            order.order.order_id,
            order.order.subtotal,
            order.order.total_amount,
            test_now(),
        )
        .await;

    let result = app.tax_invoices.issue(invoice_id, ACTOR, test_now()).await;

    match result {
        Err(AppError::Validation(errors)) => {
            assert_eq!(errors.len(), 2);
            assert!(errors[0].contains("B2B"));
            assert!(errors[1].contains("perusahaan"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn incomplete_company_reports_every_violated_rule_at_once() {
    let app = TestApp::new();
    let company = Company {
        tax_id: Some("01-234-567-8-901-000".to_string()),
        registration_number: None,
        province: None,
        ..complete_company()
    };
    let customer_id = app.seed_b2b_customer_with_company(company).await;
    let product_id = app.seed_glove_product().await;
    let order = app
        .converted_order(customer_id, product_id, 100, test_now())
        .await;
    let invoice_id = app
        .seed_paid_invoice(
            order.order.order_id,
            order.order.subtotal,
            order.order.total_amount,
            test_now(),
        )
        .await;

    let result = app.tax_invoices.issue(invoice_id, ACTOR, test_now()).await;

    match result {
        Err(AppError::Validation(errors)) => {
            assert_eq!(errors.len(), 3);
            assert!(errors[0].contains("Format NPWP tidak valid"));
            assert!(errors[1].contains("registrasi"));
            assert!(errors[2].contains("provinsi"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    assert!(app
        .store
        .tax_invoice_for_invoice(invoice_id)
        .await
        .expect("Failed to read tax invoice")
        .is_none());
}

#[tokio::test]
async fn issue_for_unknown_invoice_fails() {
    let app = TestApp::new();
    let result = app
        .tax_invoices
        .issue(Uuid::new_v4(), ACTOR, test_now())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn get_tax_invoice_before_issuance_fails() {
    let app = TestApp::new();
    let customer_id = app.seed_b2b_customer().await;
    let product_id = app.seed_glove_product().await;
    let order = app
        .converted_order(customer_id, product_id, 100, test_now())
        .await;
    let invoice_id = app
        .seed_paid_invoice(
            order.order.order_id,
            order.order.subtotal,
            order.order.total_amount,
            test_now(),
        )
        .await;

    let result = app.tax_invoices.for_invoice(invoice_id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
