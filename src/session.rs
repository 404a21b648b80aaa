use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use tracing::debug;

use crate::models::priced_order::PricedOrder;

/// An open conversation: a priced order waiting for an address and then a payment.
#[derive(Debug, Clone)]
pub struct OrderSession {
    pub sender: String,
    pub band: String,
    pub order: PricedOrder,
    pub address: Option<String>,
    pub reference_id: Option<String>,
    created_at: Instant,
}

impl OrderSession {
    pub fn new(sender: &str, band: &str, order: PricedOrder) -> Self {
        Self {
            sender: sender.to_string(),
            band: band.to_string(),
            order,
            address: None,
            reference_id: None,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// Open sessions keyed by sender. Cheap to clone; clones share the same store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, OrderSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Store `session`, replacing any earlier order from the same sender.
    pub async fn put(&self, session: OrderSession) {
        debug!("Storing session for {}", session.sender);
        self.sessions
            .write()
            .await
            .insert(session.sender.clone(), session);
    }

    pub async fn get(&self, sender: &str) -> Option<OrderSession> {
        self.sessions
            .read()
            .await
            .get(sender)
            .filter(|s| !s.is_expired(self.ttl))
            .cloned()
    }

    /// Apply `f` to the live session of `sender`, if there is one.
    pub async fn update<R>(&self, sender: &str, f: impl FnOnce(&mut OrderSession) -> R) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(sender) {
            Some(session) if !session.is_expired(self.ttl) => Some(f(session)),
            _ => None,
        }
    }

    pub async fn remove(&self, sender: &str) -> Option<OrderSession> {
        debug!("Closing session for {sender}");
        self.sessions.write().await.remove(sender)
    }

    pub async fn find_by_reference(&self, reference_id: &str) -> Option<OrderSession> {
        self.sessions
            .read()
            .await
            .values()
            .find(|s| s.reference_id.as_deref() == Some(reference_id) && !s.is_expired(self.ttl))
            .cloned()
    }

    /// Remove and return the live session carrying `reference_id`, under a single
    /// write lock.
    pub async fn close_by_reference(&self, reference_id: &str) -> Option<OrderSession> {
        let mut sessions = self.sessions.write().await;
        let sender = sessions
            .iter()
            .find(|(_, s)| s.reference_id.as_deref() == Some(reference_id) && !s.is_expired(self.ttl))
            .map(|(sender, _)| sender.clone())?;

        debug!("Closing session for {sender}");
        sessions.remove(&sender)
    }

    /// Drop expired sessions, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.ttl));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::priced_order::DiscountTier;

    fn order(payable: i64) -> PricedOrder {
        PricedOrder {
            tier: DiscountTier::Bulk,
            line_items: Vec::new(),
            gross_total_minor: payable,
            net_subtotal_minor: payable,
            tax_minor: 0,
            delivery_minor: 0,
            payable_total_minor: payable,
            currency: "INR".to_string(),
        }
    }

    #[tokio::test]
    async fn test_put_get_replace() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.put(OrderSession::new("alice", "bulk", order(100))).await;
        store.put(OrderSession::new("alice", "bulk", order(200))).await;

        let session = store.get("alice").await.unwrap();
        assert_eq!(session.order.payable_total_minor, 200);
        assert_eq!(store.len().await, 1);
        assert!(store.get("bob").await.is_none());
    }

    #[tokio::test]
    async fn test_update_and_find_by_reference() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.put(OrderSession::new("alice", "bulk", order(100))).await;

        let updated = store
            .update("alice", |s| {
                s.address = Some("Kalam".to_string());
                s.reference_id = Some("ref_1".to_string());
            })
            .await;
        assert!(updated.is_some());
        assert!(store.update("bob", |_| ()).await.is_none());

        let found = store.find_by_reference("ref_1").await.unwrap();
        assert_eq!(found.sender, "alice");
        assert_eq!(found.address.as_deref(), Some("Kalam"));
        assert!(store.find_by_reference("ref_2").await.is_none());

        assert!(store.remove("alice").await.is_some());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_close_by_reference_spares_replaced_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let mut paid = OrderSession::new("alice", "bulk", order(100));
        paid.reference_id = Some("ref_1".to_string());
        store.put(paid).await;

        // alice starts a new order before the old payment lands
        store.put(OrderSession::new("alice", "bulk", order(200))).await;

        assert!(store.close_by_reference("ref_1").await.is_none());
        assert_eq!(store.get("alice").await.unwrap().order.payable_total_minor, 200);

        store.update("alice", |s| s.reference_id = Some("ref_2".to_string())).await;
        let closed = store.close_by_reference("ref_2").await.unwrap();
        assert_eq!(closed.order.payable_total_minor, 200);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_invisible_and_purged() {
        let store = SessionStore::new(Duration::ZERO);
        store.put(OrderSession::new("alice", "bulk", order(100))).await;

        assert!(store.get("alice").await.is_none());
        assert!(store.update("alice", |_| ()).await.is_none());
        assert_eq!(store.purge_expired().await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = SessionStore::new(Duration::from_secs(60));
        let handle = store.clone();
        handle.put(OrderSession::new("alice", "bulk", order(100))).await;

        assert!(store.get("alice").await.is_some());
    }
}
