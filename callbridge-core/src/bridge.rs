//! Event bridge between an SDK client and the host
//!
//! Every SDK event is forwarded to the host verbatim, serialized with
//! [`Payload::to_json_string`](crate::payload::Payload::to_json_string).
//! `notification` events are then decoded and run through the call state
//! reducer, whose effects are applied to the session here.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::reducer::{ReducerPolicy, reduce};
use crate::sdk::{CallHandle, SdkEvent, SessionEvent};
use crate::session::{CurrentCall, SessionWrapper};
use crate::types::{CallSnapshot, CallState, Notification};

/// Forward one SDK event and apply its lifecycle effects
///
/// Returns the delay after which the session should be rebuilt, when the
/// event was an abnormal call end and the reconnection policy allows it.
pub async fn handle_event(wrapper: &mut SessionWrapper, event: SdkEvent) -> Option<Duration> {
    let value = event.payload.to_json_value();
    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| String::from("null"));
    wrapper.emit(event.kind.as_str(), text).await;

    if event.kind != SessionEvent::Notification {
        return None;
    }

    let notification: Notification = match serde_json::from_value(value) {
        Ok(notification) => notification,
        Err(e) => {
            warn!(element_id = %wrapper.id, error = %e, "Ignoring unrecognized notification");
            return None;
        }
    };

    match notification {
        Notification::CallUpdate { call } => handle_call_update(wrapper, call, event.call).await,
        Notification::UserMediaError { error } => {
            warn!(
                element_id = %wrapper.id,
                name = error.name.as_deref().unwrap_or("unknown"),
                message = error.message.as_deref().unwrap_or(""),
                "User media error"
            );
            None
        }
    }
}

async fn handle_call_update(
    wrapper: &mut SessionWrapper,
    snapshot: CallSnapshot,
    live: Option<Arc<dyn CallHandle>>,
) -> Option<Duration> {
    let state = snapshot
        .state
        .clone()
        .unwrap_or_else(|| CallState::Other(String::from("unknown")));

    refresh_current_call(wrapper, &snapshot, live);

    let policy = ReducerPolicy {
        auto_answer: wrapper.config.auto_answer,
        reconnect_on_explicit_end: wrapper.config.reconnect_on_explicit_end,
    };
    let reduction = reduce(&state, policy);
    debug!(element_id = %wrapper.id, state = %state, signal = ?reduction.signal, "Call update");

    let payload =
        serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| String::from("null"));
    wrapper.emit(&reduction.signal.event_name(), payload).await;

    if reduction.answer {
        match wrapper.current_call.as_ref().map(|c| c.handle.clone()) {
            Some(handle) => {
                if let Err(e) = handle.answer(None).await {
                    error!(element_id = %wrapper.id, error = %e, "Auto-answer failed");
                }
            }
            None => warn!(element_id = %wrapper.id, "Auto-answer requested without a call"),
        }
    }

    if reduction.reset_attempts {
        wrapper.reconnector.reset();
    }

    if reduction.clear_current_call {
        wrapper.current_call = None;
    }

    if !reduction.evaluate_reconnect {
        return None;
    }

    match wrapper.reconnector.should_reconnect() {
        Some(delay) => {
            info!(
                element_id = %wrapper.id,
                attempt = wrapper.reconnector.attempts(),
                delay_ms = delay.as_millis() as u64,
                "Scheduling reconnect"
            );
            Some(delay)
        }
        None => {
            debug!(element_id = %wrapper.id, "Reconnect not allowed");
            None
        }
    }
}

/// A live handle replaces the current call; otherwise the snapshot of the
/// existing one is updated.
fn refresh_current_call(
    wrapper: &mut SessionWrapper,
    snapshot: &CallSnapshot,
    live: Option<Arc<dyn CallHandle>>,
) {
    if let Some(handle) = live {
        let mut current = CurrentCall::new(handle);
        current.snapshot = Some(snapshot.clone());
        wrapper.current_call = Some(current);
    } else if let Some(current) = wrapper.current_call.as_mut() {
        current.snapshot = Some(snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientInitOptions, ClientOptions};
    use crate::host::MemoryHost;
    use crate::payload::{CIRCULAR_MARKER, ObjectRef};
    use crate::sdk::mock::MockRtcClient;
    use crate::sdk::{MockBehavior, MockClientHandle, RtcClient};
    use serde_json::Value;
    use tokio::sync::broadcast;

    struct Harness {
        host: Arc<MemoryHost>,
        wrapper: SessionWrapper,
        client: MockClientHandle,
        rx: broadcast::Receiver<SdkEvent>,
    }

    impl Harness {
        fn new(options: ClientOptions) -> Self {
            let host = Arc::new(MemoryHost::default());
            let mut wrapper = SessionWrapper::new("phone", options, host.clone());
            let client = MockRtcClient::new(ClientInitOptions::default(), MockBehavior::default());
            let handle = client.handle();
            let rx = client.subscribe();
            wrapper.client = Some(Box::new(client));
            Self {
                host,
                wrapper,
                client: handle,
                rx,
            }
        }

        async fn pump_one(&mut self) -> Option<Duration> {
            let event = self.rx.recv().await.unwrap();
            handle_event(&mut self.wrapper, event).await
        }

        async fn names(&self) -> Vec<String> {
            self.host.names_for("phone").await
        }
    }

    fn reconnecting(attempts: u32) -> ClientOptions {
        ClientOptions {
            auto_reconnect: Some(true),
            reconnect_attempts: attempts,
            reconnect_delay: 10,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn session_events_are_forwarded_verbatim() {
        let mut h = Harness::new(ClientOptions::default());

        h.client.emit_session(SessionEvent::SocketOpen);
        assert!(h.pump_one().await.is_none());

        let events = h.host.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "socket.open");
        assert_eq!(events[0].payload_json().unwrap()["type"], "socket.open");
    }

    #[tokio::test]
    async fn cyclic_payload_is_forwarded_with_marker() {
        let mut h = Harness::new(ClientOptions::default());
        let node = ObjectRef::new().with("code", -32000i64);
        node.insert("source", node.clone());
        h.client.emit(SdkEvent::new(SessionEvent::Error, node.into()));

        h.pump_one().await;

        let events = h.host.events().await;
        let json: Value = events[0].payload_json().unwrap();
        assert_eq!(json["source"], CIRCULAR_MARKER);
    }

    #[tokio::test]
    async fn notification_forwarded_before_signal() {
        let mut h = Harness::new(ClientOptions::default());
        h.client.ring("+15550100");

        h.pump_one().await;

        assert_eq!(h.names().await, vec!["notification", "incoming"]);
        let events = h.host.events().await;
        let snapshot: CallSnapshot = serde_json::from_str(&events[1].payload).unwrap();
        assert_eq!(snapshot.state, Some(CallState::Ringing));
        assert_eq!(snapshot.extra["client"]["currentCall"], CIRCULAR_MARKER);
    }

    #[tokio::test]
    async fn ringing_with_handle_sets_current_call() {
        let mut h = Harness::new(ClientOptions::default());
        let call = h.client.ring("100");

        h.pump_one().await;

        let current = h.wrapper.current_call().unwrap();
        assert_eq!(current.handle.id(), call.id());
        assert_eq!(current.state(), Some(&CallState::Ringing));
        assert_eq!(call.answer_count(), 0);
    }

    #[tokio::test]
    async fn auto_answer_answers_ringing_call() {
        let mut h = Harness::new(ClientOptions {
            auto_answer: true,
            ..Default::default()
        });
        let call = h.client.ring("100");

        h.pump_one().await;

        assert_eq!(call.answer_count(), 1);
    }

    #[tokio::test]
    async fn auto_answer_failure_is_swallowed() {
        let mut h = Harness::new(ClientOptions {
            auto_answer: true,
            ..Default::default()
        });
        let call = h.client.ring("100");
        call.fail_answer(true);

        h.pump_one().await;

        assert_eq!(call.answer_count(), 1);
        assert!(h.wrapper.current_call().is_some());
    }

    #[tokio::test]
    async fn update_without_handle_refreshes_snapshot() {
        let mut h = Harness::new(ClientOptions::default());
        h.client.ring("100");
        h.pump_one().await;

        h.client.emit_call_update(CallState::Held, None);
        h.pump_one().await;

        assert_eq!(h.wrapper.info().call_state, Some(CallState::Held));
        assert_eq!(h.names().await.last().map(String::as_str), Some("state:held"));
    }

    #[tokio::test]
    async fn active_resets_reconnect_attempts() {
        let mut h = Harness::new(reconnecting(5));
        h.wrapper.reconnector.should_reconnect();
        h.wrapper.reconnector.should_reconnect();

        h.client.emit_call_update(CallState::Active, None);
        h.pump_one().await;

        assert_eq!(h.wrapper.info().reconnect_attempts, 0);
        assert_eq!(h.names().await.last().map(String::as_str), Some("incomingAnswered"));
    }

    #[tokio::test]
    async fn disconnected_clears_call_and_requests_reconnect() {
        let mut h = Harness::new(reconnecting(2));
        h.client.ring("100");
        h.pump_one().await;

        h.client.emit_call_update(CallState::Disconnected, None);
        let delay = h.pump_one().await;

        assert_eq!(delay, Some(Duration::from_millis(10)));
        assert!(h.wrapper.current_call().is_none());
        assert_eq!(h.wrapper.info().reconnect_attempts, 1);
    }

    #[tokio::test]
    async fn disconnected_respects_attempt_bound() {
        let mut h = Harness::new(reconnecting(1));

        h.client.emit_call_update(CallState::Disconnected, None);
        assert!(h.pump_one().await.is_some());
        h.client.emit_call_update(CallState::Disconnected, None);
        assert!(h.pump_one().await.is_none());
        assert_eq!(h.wrapper.info().reconnect_attempts, 1);
    }

    #[tokio::test]
    async fn hangup_state_never_requests_reconnect() {
        let mut h = Harness::new(reconnecting(5));
        h.client.ring("100");
        h.pump_one().await;

        h.client.emit_call_update(CallState::Hangup, None);
        assert!(h.pump_one().await.is_none());
        assert!(h.wrapper.current_call().is_none());
        assert_eq!(h.names().await.last().map(String::as_str), Some("incomingRejected"));
    }

    #[tokio::test]
    async fn reconnect_disabled_by_default() {
        let mut h = Harness::new(ClientOptions::default());
        h.client.emit_call_update(CallState::Done, None);
        assert!(h.pump_one().await.is_none());
    }

    #[tokio::test]
    async fn media_error_is_forwarded_only() {
        let mut h = Harness::new(ClientOptions::default());
        h.client.emit_media_error("NotAllowedError", "Permission denied");

        assert!(h.pump_one().await.is_none());
        assert_eq!(h.names().await, vec!["notification"]);
    }

    #[tokio::test]
    async fn unknown_notification_is_forwarded_and_ignored() {
        let mut h = Harness::new(ClientOptions::default());
        let payload = ObjectRef::new().with("type", "vertoClientReady");
        h.client
            .emit(SdkEvent::new(SessionEvent::Notification, payload.into()));

        assert!(h.pump_one().await.is_none());
        assert_eq!(h.names().await, vec!["notification"]);
    }
}
