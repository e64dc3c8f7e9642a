//! 定稿编排
//!
//! # 状态机
//!
//! ```text
//! Draft ─▶ Validating ─┬─▶ CashPersisting ──────▶ InventoryUpdating ─▶ InvoiceReady
//!             │        └─▶ OnlineOrderCreated  (库存与发票延迟到对账)
//!             ▼
//!           Failed
//! ```
//!
//! 校验失败不产生任何写入。现金路径先落账单再逐件更新库存：每件是
//! 独立、顺序无关、幂等的写入，部分失败只记录、不回滚，留给外部
//! 对账处理 —— 完整的财务记录优先于完美的库存一致性。

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::draft::TxMode;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Bill, BillItem, BillStatus, Customer, Invoice, PaymentMode, PendingCheckout};
use shared::pricing;

use crate::billing::{inventory, invoice};
use crate::db::repository::{BillRepository, PendingOrderRepository, ProductRepository};
use crate::payment::gateway::PaymentGateway;

/// 定稿状态机的各阶段（日志与调试用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizePhase {
    Draft,
    Validating,
    CashPersisting,
    OnlineOrderCreated,
    InventoryUpdating,
    InvoiceReady,
    Failed,
}

impl fmt::Display for FinalizePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinalizePhase::Draft => "draft",
            FinalizePhase::Validating => "validating",
            FinalizePhase::CashPersisting => "cash_persisting",
            FinalizePhase::OnlineOrderCreated => "online_order_created",
            FinalizePhase::InventoryUpdating => "inventory_updating",
            FinalizePhase::InvoiceReady => "invoice_ready",
            FinalizePhase::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// 客户信息载荷
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// 提交定稿的一行商品
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeItem {
    #[validate(length(min = 1, message = "Item barcode is required"))]
    pub barcode: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub image_url: String,
    pub original_price: Decimal,
    #[serde(default)]
    pub discount: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub qty: u32,
    /// 省略时继承整单模式
    #[serde(default)]
    pub action: Option<TxMode>,
}

/// 定稿请求
///
/// 单价与总额一律由服务器按定价引擎重算，不信任客户端送来的金额。
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    #[validate(nested)]
    pub customer: CustomerPayload,
    #[validate(length(min = 1, message = "Staff identity is required"))]
    pub staff: String,
    pub payment_mode: PaymentMode,
    pub mode: TxMode,
    #[validate(length(min = 1, message = "Bill has no items"), nested)]
    pub items: Vec<FinalizeItem>,
}

/// 定稿结果：现金路径返回发票，在线路径返回网关订单句柄
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FinalizeOutcome {
    Invoice(Box<Invoice>),
    Checkout(PendingCheckout),
}

/// 定稿编排服务
#[derive(Clone)]
pub struct FinalizeService {
    bills: BillRepository,
    products: ProductRepository,
    pending: PendingOrderRepository,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl FinalizeService {
    pub fn new(
        bills: BillRepository,
        products: ProductRepository,
        pending: PendingOrderRepository,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            bills,
            products,
            pending,
            gateway,
            currency: "INR".to_string(),
        }
    }

    /// 定稿一张草稿账单
    pub async fn finalize(&self, req: FinalizeRequest) -> AppResult<FinalizeOutcome> {
        let mut phase = FinalizePhase::Validating;
        tracing::debug!(phase = %phase, staff = %req.staff, "Finalize started");

        if let Err(e) = self.validate(&req) {
            phase = FinalizePhase::Failed;
            tracing::info!(phase = %phase, staff = %req.staff, error = %e, "Finalize rejected");
            return Err(e);
        }

        let bill = self.build_bill(&req);

        match req.payment_mode {
            PaymentMode::Cash => {
                phase = FinalizePhase::CashPersisting;
                tracing::debug!(phase = %phase, staff = %req.staff, "Persisting cash bill");
                let persisted = self.bills.create(&bill).await.map_err(AppError::from)?;
                let bill_id = persisted.id.clone().unwrap_or_default();

                phase = FinalizePhase::InventoryUpdating;
                tracing::debug!(phase = %phase, bill_id = %bill_id, "Applying inventory updates");
                inventory::apply(&self.products, &persisted).await;

                phase = FinalizePhase::InvoiceReady;
                tracing::info!(
                    phase = %phase,
                    bill_id = %bill_id,
                    total = %persisted.total,
                    "Cash bill finalized"
                );
                Ok(FinalizeOutcome::Invoice(Box::new(invoice::render(
                    &persisted,
                ))))
            }

            PaymentMode::Online => {
                phase = FinalizePhase::OnlineOrderCreated;
                tracing::debug!(phase = %phase, staff = %req.staff, "Persisting pending bill");
                let mut pending_bill = bill;
                pending_bill.status = BillStatus::Pending;
                let persisted = self
                    .bills
                    .create(&pending_bill)
                    .await
                    .map_err(AppError::from)?;
                let bill_id = persisted.id.clone().unwrap_or_default();

                let amount_minor = to_minor_units(persisted.total)?;
                let order = self
                    .gateway
                    .create_order(amount_minor, &self.currency, &bill_id)
                    .await?;

                self.pending
                    .create(&order.id, &bill_id)
                    .await
                    .map_err(AppError::from)?;

                tracing::info!(
                    phase = %phase,
                    bill_id = %bill_id,
                    order_id = %order.id,
                    amount_minor = %amount_minor,
                    "Online bill pending payment confirmation"
                );
                Ok(FinalizeOutcome::Checkout(PendingCheckout {
                    order_id: order.id,
                    bill_id,
                    amount_minor,
                    currency: order.currency,
                }))
            }
        }
    }

    /// 离开 Draft 的前置条件：客户姓名、至少一行商品、员工身份、模式
    fn validate(&self, req: &FinalizeRequest) -> AppResult<()> {
        req.validate().map_err(|e| {
            let msg = e
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .filter_map(|err| err.message.as_ref().map(|m| m.to_string()))
                .next()
                .unwrap_or_else(|| "Validation failed".to_string());
            AppError::validation(msg)
        })?;

        if req.customer.name.trim().is_empty() {
            return Err(AppError::with_message(
                ErrorCode::CustomerMissing,
                "Customer name is required",
            ));
        }
        Ok(())
    }

    /// 由请求构造账单：逐行重算折后价，再汇总总额
    fn build_bill(&self, req: &FinalizeRequest) -> Bill {
        let items: Vec<BillItem> = req
            .items
            .iter()
            .map(|item| BillItem {
                barcode: item.barcode.clone(),
                name: item.name.clone(),
                brand: item.brand.clone(),
                category: item.category.clone(),
                unit: item.unit.clone(),
                image_url: item.image_url.clone(),
                original_price: item.original_price,
                discount: item.discount.clone(),
                final_price: pricing::final_price(item.original_price, &item.discount),
                qty: item.qty,
                action: item.action.unwrap_or(req.mode),
            })
            .collect();

        let total = pricing::total(items.iter().map(|i| (i.final_price, i.qty)));

        Bill {
            id: None,
            date: chrono::Utc::now(),
            staff: req.staff.clone(),
            customer: Customer {
                name: req.customer.name.clone(),
                phone: req.customer.phone.clone(),
            },
            mode: req.mode,
            payment_mode: req.payment_mode,
            status: BillStatus::Completed,
            total,
            items,
        }
    }
}

/// 主币单位 → 最小币单位（网关要求整数金额）
fn to_minor_units(total: Decimal) -> AppResult<i64> {
    use rust_decimal::prelude::ToPrimitive;
    (total * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| AppError::internal(format!("Bill total out of range: {total}")))
}
