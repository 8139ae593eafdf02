//! Named-event bus
//!
//! Listeners subscribe to an event name and are called in registration order
//! when that event is dispatched.

use crate::container::{Container, ServiceKey};
use crate::errors::BoxError;
use crate::providers::{ProviderError, ServiceProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Container key of the event bus
pub const EVENT: ServiceKey<EventBus> = ServiceKey::new("event");

/// Event error type
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Listener {index} for event '{event}' failed: {source}")]
    ListenerFailed {
        event: String,
        index: usize,
        #[source]
        source: BoxError,
    },
}

/// A dispatched event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    pub name: String,
    pub data: serde_json::Value,
    pub fired_at: DateTime<Utc>,
}

/// Event listener
#[async_trait]
pub trait Listener: Send + Sync {
    async fn handle(&self, event: &EventPayload) -> Result<(), BoxError>;
}

/// Event bus service
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<String, Vec<Arc<dyn Listener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a listener to an event name
    pub fn listen<L: Listener + 'static>(&self, event: impl Into<String>, listener: L) {
        self.listen_arc(event, Arc::new(listener));
    }

    /// Subscribe a shared listener to an event name
    pub fn listen_arc(&self, event: impl Into<String>, listener: Arc<dyn Listener>) {
        let event = event.into();
        tracing::debug!("Adding listener for event '{}'", event);
        self.listeners.write().entry(event).or_default().push(listener);
    }

    /// Number of listeners subscribed to an event name
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map(Vec::len).unwrap_or(0)
    }

    /// Check if an event has any listener
    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }

    /// Call every listener of `event` in order; stops at the first failure
    ///
    /// Returns the number of listeners that handled the event.
    pub async fn dispatch(
        &self,
        event: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<usize, EventError> {
        let payload = EventPayload {
            name: event.into(),
            data,
            fired_at: Utc::now(),
        };

        let listeners = self
            .listeners
            .read()
            .get(&payload.name)
            .cloned()
            .unwrap_or_default();

        tracing::debug!(
            "Dispatching event '{}' to {} listeners",
            payload.name,
            listeners.len()
        );

        for (index, listener) in listeners.iter().enumerate() {
            listener
                .handle(&payload)
                .await
                .map_err(|source| EventError::ListenerFailed {
                    event: payload.name.clone(),
                    index,
                    source,
                })?;
        }

        Ok(listeners.len())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners: BTreeMap<String, usize> = self
            .listeners
            .read()
            .iter()
            .map(|(event, listeners)| (event.clone(), listeners.len()))
            .collect();

        f.debug_struct("EventBus")
            .field("listeners", &listeners)
            .finish()
    }
}

/// Provider binding the event bus
pub struct EventServiceProvider;

#[async_trait]
impl ServiceProvider for EventServiceProvider {
    fn name(&self) -> &'static str {
        "event"
    }

    fn register(&self, container: &Container) -> Result<(), ProviderError> {
        container.bind(&EVENT, |_| Ok(Arc::new(EventBus::new())));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    struct Recorder {
        tag: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Listener for Recorder {
        async fn handle(&self, event: &EventPayload) -> Result<(), BoxError> {
            self.seen.lock().push(format!("{}:{}:{}", self.tag, event.name, event.data["id"]));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Listener for Failing {
        async fn handle(&self, _event: &EventPayload) -> Result<(), BoxError> {
            Err("listener exploded".into())
        }
    }

    #[tokio::test]
    async fn test_listeners_run_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.listen("user.created", Recorder { tag: "first", seen: seen.clone() });
        bus.listen("user.created", Recorder { tag: "second", seen: seen.clone() });
        bus.listen("user.deleted", Recorder { tag: "other", seen: seen.clone() });

        let handled = bus.dispatch("user.created", json!({ "id": 7 })).await.unwrap();

        assert_eq!(handled, 2);
        assert_eq!(
            *seen.lock(),
            vec!["first:user.created:7", "second:user.created:7"]
        );
    }

    #[tokio::test]
    async fn test_dispatch_without_listeners() {
        let bus = EventBus::new();
        assert_eq!(bus.dispatch("nothing", json!(null)).await.unwrap(), 0);
        assert!(!bus.has_listeners("nothing"));
    }

    #[tokio::test]
    async fn test_failure_stops_dispatch() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.listen("order.paid", Failing);
        bus.listen("order.paid", Recorder { tag: "late", seen: seen.clone() });

        let err = bus.dispatch("order.paid", json!({ "id": 1 })).await.unwrap_err();

        assert!(matches!(err, EventError::ListenerFailed { index: 0, .. }));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_debug_lists_listener_counts() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.listen("user.created", Recorder { tag: "a", seen: seen.clone() });
        bus.listen("user.created", Recorder { tag: "b", seen });
        bus.listen("order.paid", Failing);

        let rendered = format!("{:?}", bus);

        assert_eq!(
            rendered,
            r#"EventBus { listeners: {"order.paid": 1, "user.created": 2} }"#
        );
    }
}
