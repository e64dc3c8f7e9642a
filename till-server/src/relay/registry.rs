//! 会话注册表
//!
//! 员工 ID → {扫码连接, 收银连接} 的并发映射。注册表是注入到
//! [`ServerState`](crate::core::ServerState) 的普通服务，便于独立测试，
//! 也便于将来替换成分布式实现。
//!
//! # 并发
//!
//! 每条消息都带自己的 staff_id，注册/清理都是单个条目上的原子操作，
//! 员工之间互不竞争，DashMap 足够。

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use shared::message::{BillingPush, ClientRole};

/// 一条活跃连接的句柄
///
/// `conn_id` 唯一标识一次 WebSocket 连接；`tx` 是向该连接推送消息的
/// 通道发送端。
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub conn_id: Uuid,
    pub tx: mpsc::Sender<BillingPush>,
}

/// 一个员工的两个会话槽位
#[derive(Debug, Clone, Default)]
pub struct StaffSession {
    pub scan: Option<ClientHandle>,
    pub bill: Option<ClientHandle>,
}

impl StaffSession {
    fn slot_mut(&mut self, role: ClientRole) -> &mut Option<ClientHandle> {
        match role {
            ClientRole::Scan => &mut self.scan,
            ClientRole::Bill => &mut self.bill,
        }
    }

    fn is_empty(&self) -> bool {
        self.scan.is_none() && self.bill.is_none()
    }
}

/// 会话注册表 - 员工 ID 到活跃连接的映射
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, StaffSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// 注册一条连接为某员工的指定角色
    ///
    /// 同角色的旧连接被直接替换：旧连接保持打开但成为孤儿，其后续
    /// 关闭事件在 [`clear_connection`](Self::clear_connection) 中找不到
    /// 匹配槽位，自然成为 no-op。任一时刻每个员工每个角色只有一条
    /// 权威连接。
    pub fn register(&self, staff_id: &str, role: ClientRole, handle: ClientHandle) {
        let mut entry = self.sessions.entry(staff_id.to_string()).or_default();
        let slot = entry.slot_mut(role);
        if let Some(old) = slot.replace(handle) {
            tracing::info!(
                staff_id = %staff_id,
                role = %role,
                superseded = %old.conn_id,
                "Superseded existing connection"
            );
        } else {
            tracing::info!(staff_id = %staff_id, role = %role, "Registered connection");
        }
    }

    /// 查找员工的收银连接
    pub fn lookup_bill(&self, staff_id: &str) -> Option<ClientHandle> {
        self.sessions
            .get(staff_id)
            .and_then(|entry| entry.bill.clone())
    }

    /// 查找员工的扫码连接
    pub fn lookup_scan(&self, staff_id: &str) -> Option<ClientHandle> {
        self.sessions
            .get(staff_id)
            .and_then(|entry| entry.scan.clone())
    }

    /// 连接关闭时的清理
    ///
    /// 扫描所有条目，清掉与 `conn_id` 匹配的槽位；两个槽位都空的条目
    /// 整个删除。孤儿连接的关闭不匹配任何槽位，无副作用。
    pub fn clear_connection(&self, conn_id: Uuid) {
        let mut emptied: Vec<String> = Vec::new();

        for mut entry in self.sessions.iter_mut() {
            let session = entry.value_mut();
            let mut cleared = false;
            if session.scan.as_ref().is_some_and(|h| h.conn_id == conn_id) {
                session.scan = None;
                cleared = true;
            }
            if session.bill.as_ref().is_some_and(|h| h.conn_id == conn_id) {
                session.bill = None;
                cleared = true;
            }
            if cleared {
                tracing::info!(staff_id = %entry.key(), conn_id = %conn_id, "Cleared connection slot");
                if session.is_empty() {
                    emptied.push(entry.key().clone());
                }
            }
        }

        for staff_id in emptied {
            // Re-check emptiness: a concurrent register may have refilled a slot
            self.sessions
                .remove_if(&staff_id, |_, session| session.is_empty());
        }
    }

    /// 当前注册的员工数（测试与健康检查用）
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (ClientHandle, mpsc::Receiver<BillingPush>) {
        let (tx, rx) = mpsc::channel(8);
        (
            ClientHandle {
                conn_id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = SessionRegistry::new();
        let (bill, _rx) = handle();
        registry.register("S1", ClientRole::Bill, bill.clone());

        let found = registry.lookup_bill("S1").unwrap();
        assert_eq!(found.conn_id, bill.conn_id);
        assert!(registry.lookup_scan("S1").is_none());
        assert!(registry.lookup_bill("S2").is_none());
    }

    #[tokio::test]
    async fn test_reregister_supersedes_and_orphan_close_is_noop() {
        let registry = SessionRegistry::new();
        let (old, _old_rx) = handle();
        let (new, _new_rx) = handle();

        registry.register("S1", ClientRole::Bill, old.clone());
        registry.register("S1", ClientRole::Bill, new.clone());

        // only the new connection is authoritative
        assert_eq!(registry.lookup_bill("S1").unwrap().conn_id, new.conn_id);

        // the orphaned connection closing must not clear the new slot
        registry.clear_connection(old.conn_id);
        assert_eq!(registry.lookup_bill("S1").unwrap().conn_id, new.conn_id);
    }

    #[tokio::test]
    async fn test_entry_removed_once_both_slots_empty() {
        let registry = SessionRegistry::new();
        let (scan, _srx) = handle();
        let (bill, _brx) = handle();

        registry.register("S1", ClientRole::Scan, scan.clone());
        registry.register("S1", ClientRole::Bill, bill.clone());
        assert_eq!(registry.len(), 1);

        registry.clear_connection(scan.conn_id);
        // bill slot still live, entry stays
        assert_eq!(registry.len(), 1);

        registry.clear_connection(bill.conn_id);
        assert!(registry.is_empty());
    }
}
