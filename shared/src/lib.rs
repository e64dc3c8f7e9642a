//! Till 共享类型库
//!
//! 服务器 (`till-server`) 与扫码/收银客户端之间共享的类型：
//!
//! - **中继协议** (`message`): 扫码会话与收银会话之间的 WebSocket 消息
//! - **领域模型** (`models`): 商品、账单、支付映射
//! - **草稿聚合** (`draft`): 收银会话本地的草稿账单，纯转移函数
//! - **定价** (`pricing`): 折扣价与账单总额的纯计算
//! - **错误** (`error`): 统一错误码 / `AppError` / `ApiResponse`

pub mod draft;
pub mod error;
pub mod message;
pub mod models;
pub mod pricing;
pub mod util;

// Re-export 公共类型
pub use draft::{DraftError, DraftLineItem, DraftTransaction, TxMode};
pub use error::{ApiResponse, AppError, ErrorCode};
pub use message::{BillingPush, ClientRole, RelayMessage};
pub use models::{Bill, BillItem, BillStatus, Customer, PaymentMode, ProductInfo};
