//! Bounded queue from every reader to the single broadcaster.

use chatroom_core::{ChatMessage, DispatchError};
use tokio::sync::mpsc;

/// Sending half of the fan-out queue. Cheap to clone; one per reader.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    tx: mpsc::Sender<ChatMessage>,
}

/// Create the queue. A capacity of `0` is raised to `1`.
pub fn channel(capacity: usize) -> (Dispatcher, mpsc::Receiver<ChatMessage>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Dispatcher { tx }, rx)
}

impl Dispatcher {
    /// Enqueue a stamped message, waiting while the queue is full.
    ///
    /// Messages from one reader keep their order.
    pub async fn dispatch(&self, message: ChatMessage) -> Result<(), DispatchError> {
        self.tx.send(message).await.map_err(|_| DispatchError::Closed)
    }

    /// Configured queue capacity.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Messages waiting for the broadcaster.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn msg(user: &str, text: &str) -> ChatMessage {
        ChatMessage {
            username: user.into(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn preserves_order() {
        let (dispatcher, mut rx) = channel(8);
        for i in 0..5 {
            dispatcher.dispatch(msg("alice", &i.to_string())).await.unwrap();
        }
        for i in 0..5 {
            assert_eq!(rx.recv().await.unwrap().text, i.to_string());
        }
    }

    #[tokio::test]
    async fn zero_capacity_is_raised() {
        let (dispatcher, _rx) = channel(0);
        assert_eq!(dispatcher.capacity(), 1);
    }

    #[tokio::test]
    async fn pending_counts_queued() {
        let (dispatcher, mut rx) = channel(4);
        assert_eq!(dispatcher.pending(), 0);
        dispatcher.dispatch(msg("a", "1")).await.unwrap();
        dispatcher.dispatch(msg("a", "2")).await.unwrap();
        assert_eq!(dispatcher.pending(), 2);
        let _ = rx.recv().await;
        assert_eq!(dispatcher.pending(), 1);
    }

    #[tokio::test]
    async fn full_queue_blocks_until_drained() {
        let (dispatcher, mut rx) = channel(1);
        dispatcher.dispatch(msg("a", "1")).await.unwrap();

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            dispatcher.dispatch(msg("a", "2")),
        )
        .await;
        assert!(blocked.is_err());

        let _ = rx.recv().await;
        dispatcher.dispatch(msg("a", "3")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().text, "3");
    }

    #[tokio::test]
    async fn dropped_receiver_reports_closed() {
        let (dispatcher, rx) = channel(4);
        drop(rx);
        assert_eq!(
            dispatcher.dispatch(msg("a", "x")).await,
            Err(DispatchError::Closed)
        );
    }
}
