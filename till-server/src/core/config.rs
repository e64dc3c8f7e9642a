/// 服务器配置 - 所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/till | 工作目录（数据库、日志） |
/// | HTTP_PORT | 4000 | HTTP / WebSocket 服务端口 |
/// | GATEWAY_URL | https://api.gateway.test | 支付网关地址 |
/// | GATEWAY_KEY_ID | (空) | 网关 key id |
/// | GATEWAY_KEY_SECRET | (空) | 网关共享密钥（HMAC 验签用） |
/// | GATEWAY_TIMEOUT_MS | 10000 | 网关调用超时(毫秒) |
/// | LOOKUP_TIMEOUT_MS | 5000 | 商品查询超时(毫秒) |
/// | SCAN_DEBOUNCE_MS | 1500 | 扫码去重窗口(毫秒) |
/// | PENDING_ORDER_TTL_MIN | 30 | 待支付订单过期时间(分钟) |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/till HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API / WebSocket 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,

    // === 支付网关 ===
    /// 网关 API 地址
    pub gateway_url: String,
    /// 网关 key id（HTTP Basic 用户名）
    pub gateway_key_id: String,
    /// 网关共享密钥（下单认证 + 回调 HMAC 验签）
    pub gateway_key_secret: String,
    /// 网关调用超时 (毫秒)
    pub gateway_timeout_ms: u64,

    // === 扫码开单 ===
    /// 商品查询超时 (毫秒)
    pub lookup_timeout_ms: u64,
    /// 传输层重复扫码的去重窗口 (毫秒)
    pub scan_debounce_ms: u64,
    /// 待支付订单的存活时间 (分钟)，过期由后台任务清理
    pub pending_order_ttl_min: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/till".into()),
            http_port: env_parse("HTTP_PORT", 4000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            gateway_url: std::env::var("GATEWAY_URL")
                .unwrap_or_else(|_| "https://api.gateway.test".into()),
            gateway_key_id: std::env::var("GATEWAY_KEY_ID").unwrap_or_default(),
            gateway_key_secret: std::env::var("GATEWAY_KEY_SECRET").unwrap_or_default(),
            gateway_timeout_ms: env_parse("GATEWAY_TIMEOUT_MS", 10_000),

            lookup_timeout_ms: env_parse("LOOKUP_TIMEOUT_MS", 5_000),
            scan_debounce_ms: env_parse("SCAN_DEBOUNCE_MS", 1_500),
            pending_order_ttl_min: env_parse("PENDING_ORDER_TTL_MIN", 30),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
