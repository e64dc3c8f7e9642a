use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::billing::{DbProductLookup, FinalizeService};
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::{BillRepository, PendingOrderRepository, ProductRepository};
use crate::payment::{HttpPaymentGateway, PaymentGateway, ReconcileService};
use crate::relay::SessionRegistry;

/// 服务器状态 - 持有所有服务的共享引用
///
/// ServerState 是服务端的核心数据结构。使用 Arc 实现浅拷贝，
/// 所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | registry | Arc<SessionRegistry> | 扫码/收银会话注册表 |
/// | gateway | Arc<dyn PaymentGateway> | 支付网关协作方 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 会话注册表（注入式服务，便于独立测试与替换）
    pub registry: Arc<SessionRegistry>,
    /// 支付网关
    pub gateway: Arc<dyn PaymentGateway>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/till.db)
    /// 3. 会话注册表与网关客户端
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        let gateway = Arc::new(HttpPaymentGateway::new(
            &config.gateway_url,
            &config.gateway_key_id,
            &config.gateway_key_secret,
            Duration::from_millis(config.gateway_timeout_ms),
        ));
        Self::initialize_with_gateway(config, gateway).await
    }

    /// 以自定义网关初始化（测试注入 mock 网关用）
    pub async fn initialize_with_gateway(
        config: &Config,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        // 0. Ensure work_dir structure exists
        let db_dir = PathBuf::from(&config.work_dir).join("database");
        std::fs::create_dir_all(&db_dir).expect("Failed to create work directory structure");

        // 1. Initialize DB
        let db_path = db_dir.join("till.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        Self {
            config: config.clone(),
            db: db_service.db,
            registry: Arc::new(SessionRegistry::new()),
            gateway,
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 中调用
    ///
    /// 启动的任务：
    /// - 待支付订单过期清理 (Periodic)
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let reconcile = self.reconcile_service();
        let ttl = Duration::from_secs(self.config.pending_order_ttl_min * 60);
        // Sweep at 1/10th of the TTL, at least every minute
        let interval = Duration::from_secs((ttl.as_secs() / 10).max(60));
        let token = tasks.shutdown_token();

        tasks.spawn("pending_order_expiry", TaskKind::Periodic, async move {
            reconcile.run_expiry_loop(ttl, interval, token).await;
        });
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 账单仓储
    pub fn bill_repo(&self) -> BillRepository {
        BillRepository::new(self.db.clone())
    }

    /// 商品仓储
    pub fn product_repo(&self) -> ProductRepository {
        ProductRepository::new(self.db.clone())
    }

    /// 待支付订单仓储
    pub fn pending_repo(&self) -> PendingOrderRepository {
        PendingOrderRepository::new(self.db.clone())
    }

    /// 商品查询协作方（带超时界定）
    pub fn product_lookup(&self) -> DbProductLookup {
        DbProductLookup::new(
            self.product_repo(),
            Duration::from_millis(self.config.lookup_timeout_ms),
        )
    }

    /// 定稿编排服务
    pub fn finalize_service(&self) -> FinalizeService {
        FinalizeService::new(
            self.bill_repo(),
            self.product_repo(),
            self.pending_repo(),
            self.gateway.clone(),
        )
    }

    /// 支付对账服务
    pub fn reconcile_service(&self) -> ReconcileService {
        ReconcileService::new(
            self.pending_repo(),
            self.bill_repo(),
            self.product_repo(),
            self.config.gateway_key_secret.clone(),
        )
    }
}
