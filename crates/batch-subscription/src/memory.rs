use crate::message::{Acker, Message};
use crate::subscription::{Received, Subscription, SubscriptionError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A single named in-process queue. `publish` is test-facing; production
/// code reaches a `MemorySubscription` only through `MemoryBroker::subscribe`.
struct Queue {
    tx: mpsc::UnboundedSender<Delivery>,
    rx: Mutex<mpsc::UnboundedReceiver<Delivery>>,
}

struct Delivery {
    body: Vec<u8>,
    metadata: HashMap<String, String>,
}

/// Registry of named in-memory queues, mirroring the role the Go original
/// gives `gocloud.dev/pubsub/mempubsub` in its test suite. One broker is
/// shared by every `Memory`-backed trigger in a process.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    queues: Arc<Mutex<HashMap<String, Arc<Queue>>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, name: &str) -> Arc<Queue> {
        let mut queues = self.queues.lock().expect("memory broker lock poisoned");
        queues
            .entry(name.to_string())
            .or_insert_with(|| {
                let (tx, rx) = mpsc::unbounded_channel();
                Arc::new(Queue {
                    tx,
                    rx: Mutex::new(rx),
                })
            })
            .clone()
    }

    /// Enqueues a raw body with metadata onto `queue_name`, creating the
    /// queue if this is its first use.
    pub fn publish(&self, queue_name: &str, body: Vec<u8>, metadata: HashMap<String, String>) {
        let queue = self.queue(queue_name);
        let _ = queue.tx.send(Delivery { body, metadata });
    }

    pub fn subscribe(&self, queue_name: &str) -> MemorySubscription {
        MemorySubscription {
            queue: self.queue(queue_name),
            next_id: AtomicU64::new(0),
        }
    }
}

pub struct MemorySubscription {
    queue: Arc<Queue>,
    next_id: AtomicU64,
}

struct MemoryAcker {
    broker_queue: Arc<Queue>,
    redelivery: Mutex<Option<Delivery>>,
}

#[async_trait]
impl Acker for MemoryAcker {
    async fn ack(&self) {}

    async fn nack(&self) {
        if let Some(delivery) = self.redelivery.lock().expect("acker lock poisoned").take() {
            let _ = self.broker_queue.tx.send(delivery);
        }
    }

    fn nackable(&self) -> bool {
        true
    }
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn receive(&self, cancel: &CancellationToken) -> Result<Received, SubscriptionError> {
        let mut rx = self.queue.rx.lock().expect("memory queue lock poisoned");
        tokio::select! {
            biased;
            () = cancel.cancelled() => Ok(Received::Cancelled),
            delivery = rx.recv() => {
                match delivery {
                    Some(delivery) => {
                        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                        let acker = Arc::new(MemoryAcker {
                            broker_queue: self.queue.clone(),
                            redelivery: Mutex::new(Some(Delivery {
                                body: delivery.body.clone(),
                                metadata: delivery.metadata.clone(),
                            })),
                        });
                        Ok(Received::Message(Message::new(
                            format!("memory-{id}"),
                            delivery.body,
                            delivery.metadata,
                            acker,
                        )))
                    }
                    None => Ok(Received::Empty),
                }
            }
        }
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receives_published_message() {
        let broker = MemoryBroker::new();
        broker.publish("orders", b"hello".to_vec(), HashMap::new());
        let sub = broker.subscribe("orders");
        let cancel = CancellationToken::new();

        let received = sub.receive(&cancel).await.unwrap();
        match received {
            Received::Message(message) => assert_eq!(message.body, b"hello"),
            other => panic!("expected a message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn nack_redelivers_to_the_same_queue() {
        let broker = MemoryBroker::new();
        broker.publish("orders", b"retry-me".to_vec(), HashMap::new());
        let sub = broker.subscribe("orders");
        let cancel = CancellationToken::new();

        let first = sub.receive(&cancel).await.unwrap();
        let Received::Message(message) = first else {
            panic!("expected a message");
        };
        message.nack().await;

        let second = sub.receive(&cancel).await.unwrap();
        match second {
            Received::Message(message) => assert_eq!(message.body, b"retry-me"),
            other => panic!("expected redelivery, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_wins_over_an_empty_queue() {
        let broker = MemoryBroker::new();
        let sub = broker.subscribe("empty");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let received = sub.receive(&cancel).await.unwrap();
        assert!(matches!(received, Received::Cancelled));
    }
}
