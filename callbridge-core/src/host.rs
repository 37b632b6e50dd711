//! Host callback surface
//!
//! Every event the bridge produces is delivered to the host as a
//! `(element_id, name, payload)` triple, where `payload` is a JSON string.
//! [`MemoryHost`] records deliveries and fans them out to live subscribers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use tokio_stream::wrappers::BroadcastStream;

/// One event delivered to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEvent {
    pub element_id: String,
    pub name: String,
    /// JSON text, `"null"` when the event carries nothing
    pub payload: String,
}

impl HostEvent {
    pub fn new(
        element_id: impl Into<String>,
        name: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            element_id: element_id.into(),
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Parse the payload text back into JSON
    pub fn payload_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }
}

/// Receiver of bridge events
#[async_trait]
pub trait HostCallback: Send + Sync {
    async fn on_event(&self, event: HostEvent);
}

/// Shared host callback handle
pub type SharedHost = Arc<dyn HostCallback>;

/// In-memory host that records the events it receives
///
/// History is unbounded unless a limit is set, in which case only the most
/// recent events are kept. [`delivered`](Self::delivered) counts every
/// event regardless.
pub struct MemoryHost {
    events: RwLock<VecDeque<HostEvent>>,
    history_limit: Option<usize>,
    delivered: AtomicUsize,
    tx: broadcast::Sender<HostEvent>,
}

impl MemoryHost {
    /// Create a host with the given broadcast channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            events: RwLock::new(VecDeque::new()),
            history_limit: None,
            delivered: AtomicUsize::new(0),
            tx,
        }
    }

    /// Keep at most `limit` recorded events, dropping the oldest first
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Number of events received since creation
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.tx.subscribe()
    }

    /// Live events as a stream; lagged items surface as errors
    pub fn stream(&self) -> BroadcastStream<HostEvent> {
        BroadcastStream::new(self.tx.subscribe())
    }

    pub async fn events(&self) -> Vec<HostEvent> {
        self.events.read().await.iter().cloned().collect()
    }

    pub async fn events_for(&self, element_id: &str) -> Vec<HostEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.element_id == element_id)
            .cloned()
            .collect()
    }

    /// Event names delivered for one element, in order
    pub async fn names_for(&self, element_id: &str) -> Vec<String> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.element_id == element_id)
            .map(|e| e.name.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl HostCallback for MemoryHost {
    async fn on_event(&self, event: HostEvent) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        {
            let mut events = self.events.write().await;
            match self.history_limit {
                Some(0) => {}
                Some(limit) => {
                    if events.len() >= limit {
                        events.pop_front();
                    }
                    events.push_back(event.clone());
                }
                None => events.push_back(event.clone()),
            }
        }

        // No live subscribers is fine
        let _ = self.tx.send(event);
    }
}
