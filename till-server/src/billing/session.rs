//! 收银会话的草稿聚合
//!
//! [`BillingSession`] 包装一份纯数据的 [`DraftTransaction`]，补上两件
//! 有副作用的事：通过商品查询协作方取主数据，以及传输层重复投递的
//! 去抖。每个收银连接各有一个会话，会话之间无共享状态。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use shared::draft::{DraftError, DraftLineItem, DraftTransaction, TxMode};
use shared::error::{AppError, AppResult};
use shared::models::ProductInfo;
use shared::pricing;

use crate::db::repository::ProductRepository;

/// 商品查询协作方
///
/// sell 动作要求一件未售出的实物，return 动作要求一件已售出的实物；
/// 状态不符视同未找到。实现方必须自行限定耗时。
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn lookup(&self, barcode: &str, action: TxMode) -> AppResult<ProductInfo>;
}

/// 数据库实现：仓储查询 + 超时界定
#[derive(Clone)]
pub struct DbProductLookup {
    repo: ProductRepository,
    timeout: Duration,
}

impl DbProductLookup {
    pub fn new(repo: ProductRepository, timeout: Duration) -> Self {
        Self { repo, timeout }
    }
}

#[async_trait]
impl ProductLookup for DbProductLookup {
    async fn lookup(&self, barcode: &str, action: TxMode) -> AppResult<ProductInfo> {
        let wants_sold = matches!(action, TxMode::Return);

        let result = tokio::time::timeout(self.timeout, self.repo.lookup(barcode, wants_sold))
            .await
            .map_err(|_| {
                tracing::warn!(barcode = %barcode, "Product lookup timed out");
                AppError::internal("Product lookup timed out, scan again to retry")
            })?;

        result
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::product_not_found(barcode, wants_sold))
    }
}

/// 一次扫码处理的结果
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// 草稿已更新（新行或数量 +1），附最新快照
    Accepted(DraftTransaction),
    /// 去抖窗口内的重复投递，被静默吸收
    DuplicateSuppressed,
}

/// 收银会话 - 单条收银连接的草稿状态
///
/// 去抖集合只吸收传输层的重复投递（同一物理扫码被重发）；窗口之外
/// 的每个事件都当作一次真实扫码，自然形成「再扫一次 = +1」的语义，
/// 绝不当作业务重复静默丢弃。
pub struct BillingSession {
    draft: DraftTransaction,
    lookup: Arc<dyn ProductLookup>,
    debounce: Duration,
    /// barcode → 最近一次被接受的扫码时刻
    seen: HashMap<String, Instant>,
}

impl BillingSession {
    pub fn new(lookup: Arc<dyn ProductLookup>, debounce: Duration) -> Self {
        Self {
            draft: DraftTransaction::new(),
            lookup,
            debounce,
            seen: HashMap::new(),
        }
    }

    /// 当前草稿快照
    pub fn draft(&self) -> &DraftTransaction {
        &self.draft
    }

    /// 处理一条送达的扫码事件
    ///
    /// 失败时（查询失败、模式冲突）草稿保持不变，错误带面向用户的
    /// 消息向上抛出；查询失败是可重试的，再扫一次即可。
    pub async fn handle_scan(&mut self, barcode: &str, action: TxMode) -> AppResult<ScanOutcome> {
        if let Some(last) = self.seen.get(barcode)
            && last.elapsed() < self.debounce
        {
            tracing::debug!(barcode = %barcode, "Suppressed duplicate scan delivery");
            return Ok(ScanOutcome::DuplicateSuppressed);
        }

        let info = self.lookup.lookup(barcode, action).await?;

        let implied = TxMode::implied_by(info.sold);
        let final_price = pricing::final_price(info.price, &info.discount);
        let item = DraftLineItem {
            barcode: barcode.to_string(),
            name: info.name,
            brand: info.brand,
            category: info.category,
            unit: info.unit,
            image_url: info.image_url,
            original_price: info.price,
            discount: info.discount,
            final_price,
            qty: 1,
        };

        let next = self.draft.add_or_increment(implied, item).map_err(
            |DraftError::ModeConflict { locked, attempted }| {
                tracing::warn!(
                    barcode = %barcode,
                    locked = %locked,
                    attempted = %attempted,
                    "Rejected scan conflicting with locked bill mode"
                );
                AppError::mode_conflict(format!(
                    "Cannot mix {} items in a {} bill",
                    attempted, locked
                ))
            },
        )?;

        self.draft = next;
        self.seen.insert(barcode.to_string(), Instant::now());
        Ok(ScanOutcome::Accepted(self.draft.clone()))
    }

    /// 删除一行并允许该条码重新扫入
    pub fn remove_item(&mut self, barcode: &str) {
        self.draft = self.draft.remove(barcode);
        self.seen.remove(barcode);
    }

    /// 录入客户信息
    pub fn set_customer(&mut self, customer: shared::models::Customer) {
        self.draft = self.draft.with_customer(customer);
    }

    /// 清空草稿，开始下一单
    pub fn reset(&mut self) {
        self.draft = self.draft.reset();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::collections::HashMap as StdHashMap;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    /// 固定库存状态的内存查询实现
    #[derive(Default)]
    struct FakeLookup {
        products: StdHashMap<String, ProductInfo>,
    }

    impl FakeLookup {
        fn with(mut self, barcode: &str, price: &str, discount: &str, sold: bool) -> Self {
            self.products.insert(
                barcode.to_string(),
                ProductInfo {
                    name: format!("Product {barcode}"),
                    brand: "BrandX".to_string(),
                    category: "General".to_string(),
                    unit: "pcs".to_string(),
                    image_url: String::new(),
                    price: price.parse().unwrap(),
                    discount: discount.to_string(),
                    sold,
                },
            );
            self
        }
    }

    #[async_trait]
    impl ProductLookup for FakeLookup {
        async fn lookup(&self, barcode: &str, action: TxMode) -> AppResult<ProductInfo> {
            let wants_sold = matches!(action, TxMode::Return);
            self.products
                .get(barcode)
                .filter(|p| p.sold == wants_sold)
                .cloned()
                .ok_or_else(|| AppError::product_not_found(barcode, wants_sold))
        }
    }

    fn session(lookup: FakeLookup, debounce_ms: u64) -> BillingSession {
        BillingSession::new(Arc::new(lookup), Duration::from_millis(debounce_ms))
    }

    #[tokio::test]
    async fn test_scan_adds_priced_line() {
        let mut s = session(FakeLookup::default().with("12345", "200", "5%", false), 0);

        let outcome = s.handle_scan("12345", TxMode::Sell).await.unwrap();
        match outcome {
            ScanOutcome::Accepted(draft) => {
                assert_eq!(draft.items.len(), 1);
                assert_eq!(draft.items[0].final_price, d("190.00"));
                assert_eq!(draft.total(), d("190.00"));
                assert_eq!(draft.mode, Some(TxMode::Sell));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_debounce_window_suppresses_redelivery() {
        let mut s = session(FakeLookup::default().with("12345", "100", "", false), 60_000);

        assert!(matches!(
            s.handle_scan("12345", TxMode::Sell).await.unwrap(),
            ScanOutcome::Accepted(_)
        ));
        assert_eq!(
            s.handle_scan("12345", TxMode::Sell).await.unwrap(),
            ScanOutcome::DuplicateSuppressed
        );
        assert_eq!(s.draft().items[0].qty, 1);
    }

    #[tokio::test]
    async fn test_rescan_past_window_increments() {
        let mut s = session(FakeLookup::default().with("12345", "100", "", false), 0);

        s.handle_scan("12345", TxMode::Sell).await.unwrap();
        s.handle_scan("12345", TxMode::Sell).await.unwrap();
        assert_eq!(s.draft().items[0].qty, 2);
    }

    #[tokio::test]
    async fn test_mode_conflict_leaves_draft_untouched() {
        let lookup = FakeLookup::default()
            .with("11111", "100", "", false)
            .with("22222", "50", "", true);
        let mut s = session(lookup, 0);

        s.handle_scan("11111", TxMode::Sell).await.unwrap();

        // a previously sold unit implies return mode, conflicting with sell
        let err = s.handle_scan("22222", TxMode::Return).await.unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::ModeConflict);
        assert_eq!(s.draft().items.len(), 1);
        assert_eq!(s.draft().mode, Some(TxMode::Sell));
    }

    /// Fails the first call, answers from the second call on
    struct FlakyLookup {
        inner: FakeLookup,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl ProductLookup for FlakyLookup {
        async fn lookup(&self, barcode: &str, action: TxMode) -> AppResult<ProductInfo> {
            let n = self
                .calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n == 0 {
                return Err(AppError::internal(
                    "Product lookup timed out, scan again to retry",
                ));
            }
            self.inner.lookup(barcode, action).await
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_is_retryable_not_silent() {
        let flaky = FlakyLookup {
            inner: FakeLookup::default().with("99999", "10", "", false),
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let mut s = BillingSession::new(Arc::new(flaky), Duration::from_secs(60));

        // first scan surfaces a retryable error, draft untouched
        let err = s.handle_scan("99999", TxMode::Sell).await.unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::InternalError);
        assert!(s.draft().is_empty());

        // the failed scan must not poison the debounce set: an immediate
        // retry of the same barcode goes through
        s.handle_scan("99999", TxMode::Sell).await.unwrap();
        assert_eq!(s.draft().items.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_clears_debounce_entry() {
        let mut s = session(FakeLookup::default().with("12345", "100", "", false), 60_000);

        s.handle_scan("12345", TxMode::Sell).await.unwrap();
        s.remove_item("12345");
        assert!(s.draft().is_empty());

        // rescanning the removed barcode works immediately
        assert!(matches!(
            s.handle_scan("12345", TxMode::Sell).await.unwrap(),
            ScanOutcome::Accepted(_)
        ));
        assert_eq!(s.draft().items[0].qty, 1);
    }

    #[tokio::test]
    async fn test_quantity_equals_post_debounce_scan_count() {
        let mut s = session(FakeLookup::default().with("12345", "100", "", false), 0);
        for _ in 0..5 {
            s.handle_scan("12345", TxMode::Sell).await.unwrap();
        }
        assert_eq!(s.draft().items[0].qty, 5);
    }

    #[tokio::test]
    async fn test_reset_starts_a_fresh_draft() {
        let mut s = session(FakeLookup::default().with("12345", "100", "", false), 60_000);
        s.set_customer(shared::models::Customer {
            name: "Asha".to_string(),
            phone: String::new(),
        });
        s.handle_scan("12345", TxMode::Sell).await.unwrap();
        assert_eq!(s.draft().customer.name, "Asha");

        s.reset();
        assert!(s.draft().is_empty());
        assert_eq!(s.draft().mode, None);
        assert!(s.draft().customer.name.is_empty());

        // the debounce set is cleared too: the next scan counts again
        assert!(matches!(
            s.handle_scan("12345", TxMode::Sell).await.unwrap(),
            ScanOutcome::Accepted(_)
        ));
    }
}
