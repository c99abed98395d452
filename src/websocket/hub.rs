use crate::models::NotificationModel;
use dashmap::DashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;

pub type HubSender = mpsc::UnboundedSender<NotificationModel>;

/// Fan-out of freshly created notifications to the owner's open sessions.
///
/// Delivery is best effort: users without a live session pick the row up on
/// their next poll.
#[derive(Clone)]
pub struct NotificationHub {
    connections: Arc<DashMap<i32, Vec<(u64, HubSender)>>>,
    next_conn_id: Arc<AtomicU64>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
            next_conn_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn subscribe(&self, user_id: i32) -> (u64, mpsc::UnboundedReceiver<NotificationModel>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections
            .entry(user_id)
            .or_default()
            .push((conn_id, tx));
        (conn_id, rx)
    }

    pub fn unsubscribe(&self, user_id: i32, conn_id: u64) {
        if let Some(mut senders) = self.connections.get_mut(&user_id) {
            senders.retain(|(id, _)| *id != conn_id);
            if senders.is_empty() {
                drop(senders);
                self.prune(user_id);
            }
        }
    }

    /// Returns how many live sessions received the notification.
    pub fn publish(&self, notification: &NotificationModel) -> usize {
        let user_id = notification.user_id;
        let Some(mut senders) = self.connections.get_mut(&user_id) else {
            return 0;
        };

        // Closed channels are dropped while sending
        senders.retain(|(_, sender)| sender.send(notification.clone()).is_ok());
        let delivered = senders.len();
        if senders.is_empty() {
            drop(senders);
            self.prune(user_id);
        }
        delivered
    }

    /// Drop the user's entry only if it is still empty under the shard lock;
    /// a `subscribe` may have slipped in after the guard was released.
    fn prune(&self, user_id: i32) {
        self.connections
            .remove_if(&user_id, |_, senders| senders.is_empty());
    }

    pub fn session_count(&self, user_id: i32) -> usize {
        self.connections
            .get(&user_id)
            .map(|senders| senders.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationKind, NotificationPayload, Priority};

    fn row(user_id: i32) -> NotificationModel {
        NotificationModel {
            id: 1,
            user_id,
            kind: NotificationKind::InternshipAlert,
            title: "Prácticas profesionales".into(),
            body: "Pendiente".into(),
            is_read: false,
            created_at: chrono::Utc::now().naive_utc(),
            read_at: None,
            priority: Priority::High,
            payload: NotificationPayload::InternshipAlert { semester: 9 },
        }
    }

    #[tokio::test]
    async fn publish_reaches_every_session_of_the_owner() {
        let hub = NotificationHub::new();
        let (_, mut a) = hub.subscribe(5);
        let (_, mut b) = hub.subscribe(5);
        let (_, mut other) = hub.subscribe(6);

        assert_eq!(hub.publish(&row(5)), 2);
        assert_eq!(a.recv().await.unwrap().user_id, 5);
        assert_eq!(b.recv().await.unwrap().user_id, 5);
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn closed_sessions_are_pruned() {
        let hub = NotificationHub::new();
        let (_, rx) = hub.subscribe(5);
        drop(rx);
        assert_eq!(hub.publish(&row(5)), 0);
        assert_eq!(hub.session_count(5), 0);
    }

    #[test]
    fn prune_keeps_an_entry_that_was_refilled() {
        let hub = NotificationHub::new();
        let (first, _rx1) = hub.subscribe(9);
        hub.connections
            .get_mut(&9)
            .unwrap()
            .retain(|(id, _)| *id != first);
        // a new session lands between the emptying and the prune
        let (_second, mut rx2) = hub.subscribe(9);
        hub.prune(9);

        assert_eq!(hub.session_count(9), 1);
        assert_eq!(hub.publish(&row(9)), 1);
        assert_eq!(rx2.try_recv().unwrap().user_id, 9);
    }

    #[test]
    fn churn_never_drops_a_live_session() {
        let hub = NotificationHub::new();
        let (_keeper, mut rx) = hub.subscribe(3);

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let hub = hub.clone();
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let (conn, _rx) = hub.subscribe(3);
                        hub.unsubscribe(3, conn);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(hub.session_count(3), 1);
        assert_eq!(hub.publish(&row(3)), 1);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn unsubscribe_removes_only_that_session() {
        let hub = NotificationHub::new();
        let (first, _rx1) = hub.subscribe(9);
        let (_second, _rx2) = hub.subscribe(9);
        hub.unsubscribe(9, first);
        assert_eq!(hub.session_count(9), 1);
    }
}
