//! End-to-end flow tests: scan relay → draft aggregation → finalization →
//! payment reconciliation, against a real embedded database.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use shared::draft::TxMode;
use shared::error::{AppResult, ErrorCode};
use shared::message::{BillingPush, ClientRole};
use shared::models::{BillStatus, PaymentMode, ProductType, VerifyRequest};

use till_server::billing::{
    BillingSession, FinalizeOutcome, FinalizeRequest, ProductLookup, ScanOutcome,
};
use till_server::core::{Config, ServerState};
use till_server::payment::{GatewayOrder, PaymentGateway, gateway};
use till_server::relay::{ClientHandle, forward_scan};

const TEST_SECRET: &str = "test_gateway_secret";

/// In-memory gateway that hands out sequential order ids
#[derive(Debug, Default)]
struct MockGateway {
    counter: AtomicUsize,
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        _receipt: &str,
    ) -> AppResult<GatewayOrder> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayOrder {
            id: format!("order_test_{n}"),
            amount_minor,
            currency: currency.to_string(),
        })
    }
}

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

async fn test_state() -> (ServerState, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = Config::with_overrides(tmp.path().to_string_lossy().to_string(), 0);
    config.gateway_key_secret = TEST_SECRET.to_string();
    let state =
        ServerState::initialize_with_gateway(&config, Arc::new(MockGateway::default())).await;
    (state, tmp)
}

/// Seed one product type with one unsold unit and return its barcode
async fn seed_product(state: &ServerState, barcode: &str, price: &str, discount: &str) {
    let repo = state.product_repo();
    let type_id = repo
        .create_type(&ProductType {
            id: None,
            name: "Ghee 500ml".to_string(),
            brand: "Amul".to_string(),
            category: "Dairy".to_string(),
            unit: "pcs".to_string(),
            image_url: String::new(),
            price: d(price),
            discount: discount.to_string(),
        })
        .await
        .unwrap();
    repo.create_unit(&type_id, barcode).await.unwrap();
}

fn finalize_request(
    draft: &shared::draft::DraftTransaction,
    customer: &str,
    staff: &str,
    payment_mode: PaymentMode,
) -> FinalizeRequest {
    let json = serde_json::json!({
        "customer": { "name": customer, "phone": "9999900000" },
        "staff": staff,
        "paymentMode": payment_mode,
        "mode": draft.mode.expect("draft mode must be locked before finalize"),
        "items": draft.items.iter().map(|i| serde_json::json!({
            "barcode": i.barcode,
            "name": i.name,
            "brand": i.brand,
            "category": i.category,
            "unit": i.unit,
            "imageUrl": i.image_url,
            "originalPrice": i.original_price,
            "discount": i.discount,
            "qty": i.qty,
        })).collect::<Vec<_>>(),
    });
    serde_json::from_value(json).unwrap()
}

/// The full scan-to-bill happy path: staff S1 scans an unsold unit
/// (price 200, discount 5%), the draft shows 190.00, and a cash finalize
/// persists the bill, marks the unit sold and returns an invoice
/// referencing the customer.
#[tokio::test]
async fn test_cash_sale_end_to_end() {
    let (state, _tmp) = test_state().await;
    seed_product(&state, "12345", "200", "5%").await;

    // staff S1 registers a bill session; the scan session relays a scan
    let (bill_tx, mut bill_rx) = tokio::sync::mpsc::channel(8);
    state.registry.register(
        "S1",
        ClientRole::Bill,
        ClientHandle {
            conn_id: uuid::Uuid::new_v4(),
            tx: bill_tx,
        },
    );
    assert!(forward_scan(&state.registry, "S1", "12345", None).await);

    let BillingPush::BarcodeBroadcast { barcode, action } = bill_rx.recv().await.unwrap();
    assert_eq!(barcode, "12345");
    assert_eq!(action, TxMode::Sell);

    // the bill session aggregates the delivered event into its draft
    let mut session = BillingSession::new(
        Arc::new(state.product_lookup()),
        Duration::from_millis(1_500),
    );
    let outcome = session.handle_scan(&barcode, action).await.unwrap();
    let draft = match outcome {
        ScanOutcome::Accepted(draft) => draft,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(draft.items.len(), 1);
    assert_eq!(draft.items[0].final_price, d("190.00"));
    assert_eq!(draft.total(), d("190.00"));

    // customer entered, cash finalize
    let req = finalize_request(&draft, "Asha", "S1", PaymentMode::Cash);
    let outcome = state.finalize_service().finalize(req).await.unwrap();
    let invoice = match outcome {
        FinalizeOutcome::Invoice(invoice) => invoice,
        other => panic!("expected invoice, got {other:?}"),
    };
    assert_eq!(invoice.customer.name, "Asha");
    assert_eq!(invoice.total, d("190.00"));
    assert!(invoice.html.contains("Asha"));

    // bill persisted with total 190.00
    let bills = state.bill_repo().list().await.unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].total, d("190.00"));
    assert_eq!(bills[0].status, BillStatus::Completed);

    // inventory: unit 12345 flipped to sold exactly once
    let unit = state.product_repo().find_unit("12345").await.unwrap().unwrap();
    assert!(unit.sold);

    // the sold unit is no longer available for a sell lookup
    let err = state
        .product_lookup()
        .lookup("12345", TxMode::Sell)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProductNotFound);
}

/// A return bill flips the unit back to available.
#[tokio::test]
async fn test_return_flow_restores_inventory() {
    let (state, _tmp) = test_state().await;
    seed_product(&state, "55555", "100", "").await;
    state.product_repo().set_sold("55555", true).await.unwrap();

    let mut session = BillingSession::new(
        Arc::new(state.product_lookup()),
        Duration::from_millis(1_500),
    );
    let draft = match session.handle_scan("55555", TxMode::Return).await.unwrap() {
        ScanOutcome::Accepted(draft) => draft,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(draft.mode, Some(TxMode::Return));

    let req = finalize_request(&draft, "Ravi", "S2", PaymentMode::Cash);
    state.finalize_service().finalize(req).await.unwrap();

    let unit = state.product_repo().find_unit("55555").await.unwrap().unwrap();
    assert!(!unit.sold);
}

/// Validation failures abort with no partial writes.
#[tokio::test]
async fn test_validation_failure_writes_nothing() {
    let (state, _tmp) = test_state().await;
    seed_product(&state, "77777", "50", "").await;

    let req: FinalizeRequest = serde_json::from_value(serde_json::json!({
        "customer": { "name": "" },
        "staff": "S1",
        "paymentMode": "cash",
        "mode": "sell",
        "items": [{
            "barcode": "77777",
            "name": "Ghee 500ml",
            "originalPrice": 50.0,
            "qty": 1,
        }],
    }))
    .unwrap();

    let err = state.finalize_service().finalize(req).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    assert!(state.bill_repo().list().await.unwrap().is_empty());
    let unit = state.product_repo().find_unit("77777").await.unwrap().unwrap();
    assert!(!unit.sold);
}

/// Online path: pending bill + order handle, inventory untouched until the
/// gateway confirms; reconciliation applies effects exactly once.
#[tokio::test]
async fn test_online_payment_reconciliation_is_idempotent() {
    let (state, _tmp) = test_state().await;
    seed_product(&state, "12345", "200", "5%").await;

    let mut session = BillingSession::new(
        Arc::new(state.product_lookup()),
        Duration::from_millis(1_500),
    );
    let draft = match session.handle_scan("12345", TxMode::Sell).await.unwrap() {
        ScanOutcome::Accepted(draft) => draft,
        other => panic!("unexpected outcome: {other:?}"),
    };

    let req = finalize_request(&draft, "Asha", "S1", PaymentMode::Online);
    let checkout = match state.finalize_service().finalize(req).await.unwrap() {
        FinalizeOutcome::Checkout(checkout) => checkout,
        other => panic!("expected checkout handle, got {other:?}"),
    };
    assert_eq!(checkout.amount_minor, 19_000);

    // inventory and invoice deferred: unit still available, bill pending
    let unit = state.product_repo().find_unit("12345").await.unwrap().unwrap();
    assert!(!unit.sold);
    let bill = state
        .bill_repo()
        .find_by_id(&checkout.bill_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bill.status, BillStatus::Pending);

    // an invalid signature never applies state, however often it retries
    for _ in 0..3 {
        let err = state
            .reconcile_service()
            .verify(&VerifyRequest {
                order_id: checkout.order_id.clone(),
                payment_id: "pay_1".to_string(),
                signature: "deadbeef".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentAuthFailed);
    }
    let unit = state.product_repo().find_unit("12345").await.unwrap().unwrap();
    assert!(!unit.sold);

    // a valid confirmation completes the deferred finalization
    let verify = VerifyRequest {
        order_id: checkout.order_id.clone(),
        payment_id: "pay_1".to_string(),
        signature: gateway::sign(TEST_SECRET, &checkout.order_id, "pay_1"),
    };
    let invoice = state.reconcile_service().verify(&verify).await.unwrap();
    assert_eq!(invoice.total, d("190.00"));
    assert_eq!(invoice.customer.name, "Asha");

    let unit = state.product_repo().find_unit("12345").await.unwrap().unwrap();
    assert!(unit.sold);
    let bill = state
        .bill_repo()
        .find_by_id(&checkout.bill_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bill.status, BillStatus::Completed);

    // the same confirmation again is a safe no-op
    let err = state.reconcile_service().verify(&verify).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadyReconciled);
    let unit = state.product_repo().find_unit("12345").await.unwrap().unwrap();
    assert!(unit.sold, "retried reconciliation must not re-apply inventory");
}

/// Abandoned pending orders are expired by TTL: the mapping goes away,
/// the bill is voided, and a late confirmation is refused.
#[tokio::test]
async fn test_pending_order_expiry_voids_bill() {
    let (state, _tmp) = test_state().await;
    seed_product(&state, "88888", "80", "").await;

    let mut session = BillingSession::new(
        Arc::new(state.product_lookup()),
        Duration::from_millis(1_500),
    );
    let draft = match session.handle_scan("88888", TxMode::Sell).await.unwrap() {
        ScanOutcome::Accepted(draft) => draft,
        other => panic!("unexpected outcome: {other:?}"),
    };
    let req = finalize_request(&draft, "Asha", "S1", PaymentMode::Online);
    let checkout = match state.finalize_service().finalize(req).await.unwrap() {
        FinalizeOutcome::Checkout(checkout) => checkout,
        other => panic!("expected checkout handle, got {other:?}"),
    };

    // TTL of zero: everything pending is stale. The cutoff comparison is
    // strict, so let at least one millisecond pass first.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let expired = state
        .reconcile_service()
        .expire_stale(Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(expired, 1);

    let bill = state
        .bill_repo()
        .find_by_id(&checkout.bill_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bill.status, BillStatus::Void);

    // a late but correctly signed confirmation is an idempotent refusal
    let verify = VerifyRequest {
        order_id: checkout.order_id.clone(),
        payment_id: "pay_late".to_string(),
        signature: gateway::sign(TEST_SECRET, &checkout.order_id, "pay_late"),
    };
    let err = state.reconcile_service().verify(&verify).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadyReconciled);

    let unit = state.product_repo().find_unit("88888").await.unwrap().unwrap();
    assert!(!unit.sold);
}
