//! 事件路由
//!
//! 把扫码会话上报的扫码事件转发到同一员工的收银会话。本层在注册表
//! 查找之外不持有任何状态，O(1)；收银连接不在线时事件被丢弃并记录
//! （扫码枪不等待投递确认，尽力而为、至多一次，不排队）。

use shared::draft::TxMode;
use shared::message::BillingPush;

use super::registry::SessionRegistry;

/// 转发一次扫码事件到对应员工的收银连接
///
/// `action` 省略时默认为 sell（与扫码端的线格式约定一致）。
/// 返回事件是否实际送入了收银连接的通道。
pub async fn forward_scan(
    registry: &SessionRegistry,
    staff_id: &str,
    barcode: &str,
    action: Option<TxMode>,
) -> bool {
    let action = action.unwrap_or(TxMode::Sell);

    let Some(bill) = registry.lookup_bill(staff_id) else {
        tracing::warn!(
            staff_id = %staff_id,
            barcode = %barcode,
            "No active bill session, dropping scan event"
        );
        return false;
    };

    let push = BillingPush::BarcodeBroadcast {
        barcode: barcode.to_string(),
        action,
    };

    match bill.tx.send(push).await {
        Ok(()) => {
            tracing::debug!(
                staff_id = %staff_id,
                barcode = %barcode,
                action = %action,
                "Forwarded scan to bill session"
            );
            true
        }
        Err(e) => {
            // Receiver already dropped: the connection is going away and
            // its close event will clear the slot shortly.
            tracing::warn!(
                staff_id = %staff_id,
                barcode = %barcode,
                error = %e,
                "Bill session channel closed, dropping scan event"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::registry::ClientHandle;
    use shared::message::ClientRole;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn register_bill(registry: &SessionRegistry, staff_id: &str) -> mpsc::Receiver<BillingPush> {
        let (tx, rx) = mpsc::channel(8);
        registry.register(
            staff_id,
            ClientRole::Bill,
            ClientHandle {
                conn_id: Uuid::new_v4(),
                tx,
            },
        );
        rx
    }

    #[tokio::test]
    async fn test_forward_reaches_bill_session() {
        let registry = SessionRegistry::new();
        let mut rx = register_bill(&registry, "S1");

        assert!(forward_scan(&registry, "S1", "12345", None).await);
        assert_eq!(
            rx.recv().await.unwrap(),
            BillingPush::BarcodeBroadcast {
                barcode: "12345".to_string(),
                action: TxMode::Sell,
            }
        );
    }

    #[tokio::test]
    async fn test_forward_preserves_return_action() {
        let registry = SessionRegistry::new();
        let mut rx = register_bill(&registry, "S1");

        assert!(forward_scan(&registry, "S1", "99999", Some(TxMode::Return)).await);
        match rx.recv().await.unwrap() {
            BillingPush::BarcodeBroadcast { action, .. } => assert_eq!(action, TxMode::Return),
        }
    }

    #[tokio::test]
    async fn test_no_bill_session_drops_event() {
        let registry = SessionRegistry::new();
        assert!(!forward_scan(&registry, "S1", "12345", None).await);
    }

    #[tokio::test]
    async fn test_superseded_connection_no_longer_receives() {
        let registry = SessionRegistry::new();
        let mut old_rx = register_bill(&registry, "S1");
        let mut new_rx = register_bill(&registry, "S1");

        assert!(forward_scan(&registry, "S1", "12345", None).await);
        assert!(new_rx.recv().await.is_some());
        assert!(old_rx.try_recv().is_err());
    }
}
