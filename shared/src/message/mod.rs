//! 中继协议消息定义
//!
//! 扫码会话与收银会话通过服务器中继通信；两端共用这里的消息类型。
//! 线格式带 `type` 判别字段，字段名使用 camelCase，方便浏览器端
//! 收银页直接消费。
//!
//! # 消息流
//!
//! ```text
//! Scan session ──▶ {type:"barcode-scanned"} ──▶ Event Router
//!                                                   │
//! Bill session ◀── {type:"barcode-broadcast"} ◀─────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::draft::TxMode;

/// 连接角色：一个员工同时最多持有一个扫码连接和一个收银连接
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    /// 手持扫码会话
    Scan,
    /// 收银台会话
    Bill,
}

impl std::fmt::Display for ClientRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientRole::Scan => write!(f, "scan"),
            ClientRole::Bill => write!(f, "bill"),
        }
    }
}

/// 客户端 → 服务器的中继消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RelayMessage {
    /// 将当前连接注册为某员工的扫码或收银会话
    #[serde(rename_all = "camelCase")]
    Register {
        staff_id: String,
        client_type: ClientRole,
    },
    /// 扫码会话上报一次物理扫码
    #[serde(rename_all = "camelCase")]
    BarcodeScanned {
        staff_id: String,
        barcode: String,
        /// 省略时默认 sell
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<TxMode>,
    },
}

/// 服务器 → 收银会话的推送消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BillingPush {
    /// 转发给收银会话的扫码事件
    BarcodeBroadcast { barcode: String, action: TxMode },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_wire_format() {
        let msg: RelayMessage = serde_json::from_str(
            r#"{"type":"register","staffId":"S1","clientType":"bill"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            RelayMessage::Register {
                staff_id: "S1".to_string(),
                client_type: ClientRole::Bill,
            }
        );
    }

    #[test]
    fn test_scan_without_action_defaults_to_none() {
        let msg: RelayMessage = serde_json::from_str(
            r#"{"type":"barcode-scanned","staffId":"S1","barcode":"12345"}"#,
        )
        .unwrap();
        match msg {
            RelayMessage::BarcodeScanned {
                staff_id,
                barcode,
                action,
            } => {
                assert_eq!(staff_id, "S1");
                assert_eq!(barcode, "12345");
                assert_eq!(action, None);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_scan_with_return_action() {
        let msg: RelayMessage = serde_json::from_str(
            r#"{"type":"barcode-scanned","staffId":"S1","barcode":"12345","action":"return"}"#,
        )
        .unwrap();
        match msg {
            RelayMessage::BarcodeScanned { action, .. } => {
                assert_eq!(action, Some(TxMode::Return));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_broadcast_wire_format() {
        let push = BillingPush::BarcodeBroadcast {
            barcode: "12345".to_string(),
            action: TxMode::Sell,
        };
        let json = serde_json::to_value(&push).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "barcode-broadcast",
                "barcode": "12345",
                "action": "sell",
            })
        );
    }
}
