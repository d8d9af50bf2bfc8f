use common::api::{ChangeKind, Notification, NotificationChange};
use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use uuid::Uuid;

/// Fan-out of row changes on `notifications` to connected subscribers.
#[derive(Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<NotificationChange>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a change. Dropped silently when nobody is listening.
    pub fn publish(&self, event: ChangeKind, record: Notification) {
        let _ = self.tx.send(NotificationChange { event, record });
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Changes on rows owned by `user_id`, in publish order.
    ///
    /// A subscriber that falls behind skips the missed events instead of
    /// holding back publishers.
    pub fn subscribe_user(
        &self,
        user_id: Uuid,
    ) -> impl Stream<Item = NotificationChange> + Send + 'static + use<> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(move |item| match item {
            Ok(change) if change.record.user_id == user_id => Some(change),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(%user_id, skipped, "Realtime subscriber lagged");
                None
            }
        })
    }
}
