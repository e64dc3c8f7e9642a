//! 收银台演示：进程内驱动扫码 → 草稿 → 现金定稿的完整链路
//!
//! ```bash
//! cargo run -p till-server --example billing_terminal
//! ```

use std::sync::Arc;
use std::time::Duration;

use shared::draft::TxMode;
use shared::models::{PaymentMode, ProductType};

use till_server::billing::{BillingSession, FinalizeOutcome, FinalizeRequest, ScanOutcome};
use till_server::core::{Config, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    till_server::utils::logger::init_logger();

    let tmp = tempfile::tempdir()?;
    let config = Config::with_overrides(tmp.path().to_string_lossy().to_string(), 0);
    let state = ServerState::initialize(&config).await;

    // 1. Seed one product with two physical units
    let products = state.product_repo();
    let type_id = products
        .create_type(&ProductType {
            id: None,
            name: "Ghee 500ml".to_string(),
            brand: "Amul".to_string(),
            category: "Dairy".to_string(),
            unit: "pcs".to_string(),
            image_url: String::new(),
            price: "200".parse()?,
            discount: "5%".to_string(),
        })
        .await?;
    let barcode_a = products.generate_barcode().await?;
    let barcode_b = products.generate_barcode().await?;
    products.create_unit(&type_id, &barcode_a).await?;
    products.create_unit(&type_id, &barcode_b).await?;
    println!("Seeded units: {barcode_a}, {barcode_b}");

    // 2. The billing session aggregates scans into a draft
    let mut session = BillingSession::new(
        Arc::new(state.product_lookup()),
        Duration::from_millis(config.scan_debounce_ms),
    );

    for barcode in [&barcode_a, &barcode_b] {
        match session.handle_scan(barcode, TxMode::Sell).await? {
            ScanOutcome::Accepted(draft) => {
                println!(
                    "Scanned {barcode}: {} line(s), total {}",
                    draft.items.len(),
                    draft.total()
                );
            }
            ScanOutcome::DuplicateSuppressed => println!("Duplicate delivery of {barcode}"),
        }
    }

    // 3. Cash finalize
    let draft = session.draft();
    let request: FinalizeRequest = serde_json::from_value(serde_json::json!({
        "customer": { "name": "Asha", "phone": "9999900000" },
        "staff": "S1",
        "paymentMode": PaymentMode::Cash,
        "mode": draft.mode.expect("mode locked by first scan"),
        "items": draft.items.iter().map(|i| serde_json::json!({
            "barcode": i.barcode,
            "name": i.name,
            "brand": i.brand,
            "category": i.category,
            "unit": i.unit,
            "originalPrice": i.original_price,
            "discount": i.discount,
            "qty": i.qty,
        })).collect::<Vec<_>>(),
    }))?;

    match state.finalize_service().finalize(request).await? {
        FinalizeOutcome::Invoice(invoice) => {
            println!(
                "Finalized bill {} for {}: total {}",
                invoice.bill_id, invoice.customer.name, invoice.total
            );
        }
        FinalizeOutcome::Checkout(checkout) => {
            println!("Unexpected online checkout: {}", checkout.order_id);
        }
    }

    // 4. Both units are sold now
    for barcode in [&barcode_a, &barcode_b] {
        let unit = products.find_unit(barcode).await?.expect("seeded unit");
        println!("Unit {} sold = {}", unit.barcode, unit.sold);
    }

    Ok(())
}
