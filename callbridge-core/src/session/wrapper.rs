//! Per-element session state
//!
//! A SessionWrapper owns the SDK client built for one host element, the
//! call currently being tracked, the reconnection counter and the host
//! callback. The registry is the only owner of wrappers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::ClientOptions;
use crate::error::SdkError;
use crate::host::{HostEvent, SharedHost};
use crate::reconnect::Reconnector;
use crate::sdk::{CallHandle, RtcClient, SessionEvent};
use crate::types::{CallSnapshot, CallState};

/// The call a session is currently tracking
#[derive(Clone)]
pub struct CurrentCall {
    pub handle: Arc<dyn CallHandle>,
    /// Latest snapshot from a `callUpdate`; `None` until the first one arrives
    pub snapshot: Option<CallSnapshot>,
}

impl CurrentCall {
    pub fn new(handle: Arc<dyn CallHandle>) -> Self {
        Self {
            handle,
            snapshot: None,
        }
    }

    pub fn state(&self) -> Option<&CallState> {
        self.snapshot.as_ref().and_then(|s| s.state.as_ref())
    }
}

/// Read-only view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub reconnect_attempts: u32,
    pub has_current_call: bool,
    pub call_state: Option<CallState>,
    pub epoch: u64,
    pub connected: bool,
}

pub struct SessionWrapper {
    pub(crate) id: String,
    pub(crate) config: Arc<ClientOptions>,
    pub(crate) host: SharedHost,
    pub(crate) client: Option<Box<dyn RtcClient>>,
    pub(crate) current_call: Option<CurrentCall>,
    pub(crate) reconnector: Reconnector,
    /// Bumped on every construction and teardown. Events and deferred
    /// reconnects carrying an older epoch are stale.
    pub(crate) epoch: u64,
    /// Changed by the registry on every requested create, disconnect or
    /// reconnect. Deferred reconnects only run while it is unchanged.
    pub(crate) generation: u64,
    pub(crate) pump: Option<JoinHandle<()>>,
    pub(crate) connected: bool,
}

impl SessionWrapper {
    pub fn new(id: impl Into<String>, config: ClientOptions, host: SharedHost) -> Self {
        let reconnector = Reconnector::new(config.reconnect_policy());
        Self {
            id: id.into(),
            config: Arc::new(config),
            host,
            client: None,
            current_call: None,
            reconnector,
            epoch: 0,
            generation: 0,
            pump: None,
            connected: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ClientOptions {
        &self.config
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current_call(&self) -> Option<&CurrentCall> {
        self.current_call.as_ref()
    }

    /// Deliver one event to the host
    pub async fn emit(&self, name: &str, payload: impl Into<String>) {
        self.host
            .on_event(HostEvent::new(self.id.as_str(), name, payload))
            .await;
    }

    /// Forward an SDK failure to the host as an `error` event
    pub async fn report_error(&self, error: &SdkError) {
        let payload = json!({ "message": error.to_string() });
        self.emit(SessionEvent::Error.as_str(), payload.to_string()).await;
    }

    /// Detach the bridge, forget the current call and disconnect the client
    ///
    /// The client object is kept so a later construction can replace it.
    /// Disconnect is skipped when nothing is live.
    pub async fn teardown(&mut self) -> Result<(), SdkError> {
        let live = self.pump.is_some() || self.connected;

        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.epoch += 1;
        self.current_call = None;
        self.connected = false;

        if !live {
            return Ok(());
        }

        debug!(element_id = %self.id, epoch = self.epoch, "Tearing down session");
        match self.client.as_mut() {
            Some(client) => client.disconnect().await,
            None => Ok(()),
        }
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            reconnect_attempts: self.reconnector.attempts(),
            has_current_call: self.current_call.is_some(),
            call_state: self.current_call.as_ref().and_then(|c| c.state().cloned()),
            epoch: self.epoch,
            connected: self.connected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientInitOptions;
    use crate::host::MemoryHost;
    use crate::sdk::mock::{MockCall, MockRtcClient};
    use crate::sdk::MockBehavior;
    use tokio_test::{assert_err, assert_ok};

    fn wrapper(host: Arc<MemoryHost>) -> SessionWrapper {
        SessionWrapper::new("phone", ClientOptions::default(), host)
    }

    #[tokio::test]
    async fn new_wrapper_starts_empty() {
        let wrapper = wrapper(Arc::new(MemoryHost::default()));
        let info = wrapper.info();
        assert_eq!(info.id, "phone");
        assert_eq!(info.epoch, 0);
        assert!(!info.has_current_call);
        assert!(!info.connected);
    }

    #[tokio::test]
    async fn emit_tags_events_with_element_id() {
        let host = Arc::new(MemoryHost::default());
        let wrapper = wrapper(host.clone());

        wrapper.emit("initialized", "null").await;

        let events = host.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].element_id, "phone");
        assert_eq!(events[0].payload, "null");
    }

    #[tokio::test]
    async fn report_error_emits_error_event() {
        let host = Arc::new(MemoryHost::default());
        let wrapper = wrapper(host.clone());

        wrapper
            .report_error(&SdkError::ConnectFailed("refused".to_string()))
            .await;

        let events = host.events().await;
        assert_eq!(events[0].name, "error");
        assert!(events[0].payload.contains("refused"));
    }

    #[tokio::test]
    async fn teardown_disconnects_live_client_once() {
        let mut wrapper = wrapper(Arc::new(MemoryHost::default()));
        let client = MockRtcClient::new(ClientInitOptions::default(), MockBehavior::default());
        let handle = client.handle();
        wrapper.client = Some(Box::new(client));
        wrapper.connected = true;
        wrapper.current_call = Some(CurrentCall::new(Arc::new(MockCall::new("c", "inbound"))));

        assert_ok!(wrapper.teardown().await);
        assert_ok!(wrapper.teardown().await);

        assert_eq!(handle.log().disconnects, 1);
        assert!(wrapper.current_call().is_none());
        assert_eq!(wrapper.epoch(), 2);
    }

    #[tokio::test]
    async fn teardown_reports_disconnect_failure_but_clears_state() {
        let mut wrapper = wrapper(Arc::new(MemoryHost::default()));
        let behavior = MockBehavior {
            fail_disconnect: true,
            ..Default::default()
        };
        wrapper.client = Some(Box::new(MockRtcClient::new(
            ClientInitOptions::default(),
            behavior,
        )));
        wrapper.connected = true;

        assert_err!(wrapper.teardown().await);
        assert!(!wrapper.info().connected);
    }
}
