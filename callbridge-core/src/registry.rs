//! ClientRegistry: one SDK client per host element
//!
//! The registry owns every session wrapper and every lifecycle observer.
//! All state sits behind a single async mutex, which serializes creation,
//! removal, control commands and event dispatch. Each client gets one pump
//! task that reads its event stream in order and dispatches through that
//! mutex.
//!
//! Nothing here returns an error to the host. Policy rejections are logged
//! with `warn!`, SDK failures with `error!`/`warn!`, and the operation turns
//! into a no-op or a sentinel value.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bridge;
use crate::config::ClientOptions;
use crate::host::SharedHost;
use crate::observer::{Document, ObserverHandle, spawn_observer};
use crate::options::{AnswerOptions, AudioSettings, CallOptions, HangupOptions, VideoSettings};
use crate::sdk::{CallCommand, CallHandle, RtcClientFactory, SdkEvent};
use crate::session::{CurrentCall, SessionFactory, SessionInfo, SessionWrapper};
use crate::types::{DeviceDescriptor, DeviceFilter, MediaKind};

/// Set once the first unload hook is attached, for the whole process
static UNLOAD_HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

#[derive(Default)]
struct RegistryState {
    sessions: HashMap<String, SessionWrapper>,
    observers: HashMap<String, ObserverHandle>,
}

struct RegistryShared {
    state: Mutex<RegistryState>,
    factory: SessionFactory,
    generations: AtomicU64,
}

/// Registry of SDK clients keyed by host element id
///
/// Cheap to clone; clones share the same sessions. Host callbacks run while
/// the registry is locked and must not call back into it.
#[derive(Clone)]
pub struct ClientRegistry {
    shared: Arc<RegistryShared>,
}

impl ClientRegistry {
    pub fn new(client_factory: Arc<dyn RtcClientFactory>) -> Self {
        Self {
            shared: Arc::new(RegistryShared {
                state: Mutex::new(RegistryState::default()),
                factory: SessionFactory::new(client_factory),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Create and connect a client for `id`
    ///
    /// Returns false if `id` is already registered; the existing client is
    /// left untouched. `initialized` is emitted once the client is built.
    pub async fn create(&self, id: &str, options: ClientOptions, host: SharedHost) -> bool {
        let mut state = self.shared.state.lock().await;
        if state.sessions.contains_key(id) {
            warn!(element_id = %id, "Client already exists");
            return false;
        }

        if let Err(e) = options.validate() {
            warn!(element_id = %id, error = %e, "Client options look incomplete");
        }

        let mut wrapper = SessionWrapper::new(id, options, host);
        wrapper.generation = self.shared.next_generation();
        let connected = self
            .shared
            .factory
            .construct(&mut wrapper, pump_attacher(Arc::downgrade(&self.shared), id.to_string()))
            .await;

        wrapper.emit("initialized", "null").await;
        if let Err(e) = connected {
            wrapper.report_error(&e).await;
        }

        state.sessions.insert(id.to_string(), wrapper);
        info!(element_id = %id, "Client created");
        true
    }

    /// [`create`](Self::create) with options in their JSON wire form
    ///
    /// Unparseable options are logged and nothing is created.
    pub async fn create_from_json(&self, id: &str, options_json: &str, host: SharedHost) -> bool {
        match ClientOptions::from_json(options_json) {
            Ok(options) => self.create(id, options, host).await,
            Err(e) => {
                error!(element_id = %id, error = %e, "Invalid client options");
                false
            }
        }
    }

    /// Disconnect and forget `id`, and stop its observer
    ///
    /// Returns false if nothing was registered. Disconnect failures are
    /// logged and do not stop the removal.
    pub async fn unmount(&self, id: &str) -> bool {
        let (wrapper, observer) = {
            let mut state = self.shared.state.lock().await;
            (state.sessions.remove(id), state.observers.remove(id))
        };

        let removed = wrapper.is_some() || observer.is_some();
        if let Some(mut wrapper) = wrapper {
            if let Err(e) = wrapper.teardown().await {
                warn!(element_id = %id, error = %e, "Error during disconnect of client");
            }
            info!(element_id = %id, "Client unmounted");
        }
        drop(observer);
        removed
    }

    pub async fn unmount_all(&self) {
        for id in self.ids().await {
            self.unmount(&id).await;
        }
    }

    /// Unmount every client once `token` is cancelled
    ///
    /// Only the first call in the process attaches the hook; later calls,
    /// on this or any other registry, return false. Must be called from
    /// within a tokio runtime.
    pub fn install_unload_hook(&self, token: CancellationToken) -> bool {
        if UNLOAD_HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
            debug!("Unload hook already installed");
            return false;
        }

        let weak = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            token.cancelled().await;
            if let Some(shared) = weak.upgrade() {
                info!("Unloading, unmounting all clients");
                ClientRegistry { shared }.unmount_all().await;
            }
        });
        true
    }

    pub async fn get(&self, id: &str) -> Option<SessionInfo> {
        self.shared
            .state
            .lock()
            .await
            .sessions
            .get(id)
            .map(SessionWrapper::info)
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.shared.state.lock().await.sessions.contains_key(id)
    }

    pub async fn ids(&self) -> Vec<String> {
        self.shared.state.lock().await.sessions.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.shared.state.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn has_observer(&self, id: &str) -> bool {
        self.shared.state.lock().await.observers.contains_key(id)
    }

    // ==================== Calls ====================

    /// Place an outbound call
    ///
    /// Rejected while the session already tracks a call. Returns whether a
    /// call was created.
    pub async fn call(&self, id: &str, options: CallOptions) -> bool {
        let mut state = self.shared.state.lock().await;
        let Some(wrapper) = state.sessions.get_mut(id) else {
            return false;
        };

        if wrapper.current_call.is_some() {
            warn!(element_id = %id, "Tried to start a new call while one is already active");
            return false;
        }

        let Some(client) = wrapper.client.as_mut() else {
            return false;
        };

        match client.new_call(options).await {
            Ok(handle) => {
                debug!(element_id = %id, call_id = %handle.id(), "Call created");
                wrapper.current_call = Some(CurrentCall::new(handle));
                true
            }
            Err(e) => {
                error!(element_id = %id, error = %e, "Failed to create a new call");
                false
            }
        }
    }

    pub async fn answer(&self, id: &str, options: Option<AnswerOptions>) {
        let state = self.shared.state.lock().await;
        let Some(call) = current_handle(&state, id) else {
            warn!(element_id = %id, "No incoming call to answer");
            return;
        };

        if let Err(e) = call.answer(options).await {
            error!(element_id = %id, error = %e, "Answer failed");
        }
    }

    /// Hang up the current call. The call is forgotten even if the SDK fails.
    pub async fn hangup(&self, id: &str, options: Option<HangupOptions>) {
        let mut state = self.shared.state.lock().await;
        let Some(current) = state
            .sessions
            .get_mut(id)
            .and_then(|w| w.current_call.take())
        else {
            warn!(element_id = %id, "No active call to hang up");
            return;
        };

        if let Err(e) = current.handle.hangup(options).await {
            error!(element_id = %id, error = %e, "Hangup failed");
        }
    }

    /// Apply a control command to the current call
    pub async fn command(&self, id: &str, command: CallCommand) {
        let state = self.shared.state.lock().await;
        let Some(call) = current_handle(&state, id) else {
            debug!(element_id = %id, command = command.name(), "No current call for command");
            return;
        };

        let name = command.name();
        if let Err(e) = call.execute(command).await {
            error!(element_id = %id, command = name, error = %e, "Call command failed");
        }
    }

    /// Statistics of the current call as a JSON array
    pub async fn call_stats(&self, id: &str) -> Option<String> {
        let state = self.shared.state.lock().await;
        let call = current_handle(&state, id)?;

        match call.stats().await {
            Ok(reports) => serde_json::to_string(&reports).ok(),
            Err(e) => {
                warn!(element_id = %id, error = %e, "Failed to collect call stats");
                None
            }
        }
    }

    // ==================== Devices and media ====================

    /// Media devices of one kind; empty when the SDK cannot enumerate them
    pub async fn devices(&self, id: &str, filter: DeviceFilter) -> Vec<DeviceDescriptor> {
        let state = self.shared.state.lock().await;
        let Some(client) = state.sessions.get(id).and_then(|w| w.client.as_ref()) else {
            return Vec::new();
        };

        match client.devices(filter).await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(element_id = %id, error = %e, "Failed to enumerate devices");
                Vec::new()
            }
        }
    }

    pub async fn check_permissions(&self, id: &str, audio: bool, video: bool) -> bool {
        let state = self.shared.state.lock().await;
        let Some(client) = state.sessions.get(id).and_then(|w| w.client.as_ref()) else {
            return false;
        };

        match client.check_permissions(audio, video).await {
            Ok(granted) => granted,
            Err(e) => {
                warn!(element_id = %id, error = %e, "Permission check failed");
                false
            }
        }
    }

    pub async fn set_audio_settings(&self, id: &str, settings: AudioSettings) -> bool {
        let mut state = self.shared.state.lock().await;
        let Some(client) = state.sessions.get_mut(id).and_then(|w| w.client.as_mut()) else {
            return false;
        };

        match client.apply_audio_settings(settings).await {
            Ok(()) => true,
            Err(e) => {
                warn!(element_id = %id, error = %e, "Failed to apply audio settings");
                false
            }
        }
    }

    pub async fn set_video_settings(&self, id: &str, settings: VideoSettings) -> bool {
        let mut state = self.shared.state.lock().await;
        let Some(client) = state.sessions.get_mut(id).and_then(|w| w.client.as_mut()) else {
            return false;
        };

        match client.apply_video_settings(settings).await {
            Ok(()) => true,
            Err(e) => {
                warn!(element_id = %id, error = %e, "Failed to apply video settings");
                false
            }
        }
    }

    pub async fn set_microphone(&self, id: &str, enabled: bool) {
        let mut state = self.shared.state.lock().await;
        if let Some(client) = state.sessions.get_mut(id).and_then(|w| w.client.as_mut()) {
            client.set_microphone(enabled);
        }
    }

    pub async fn set_webcam(&self, id: &str, enabled: bool) {
        let mut state = self.shared.state.lock().await;
        if let Some(client) = state.sessions.get_mut(id).and_then(|w| w.client.as_mut()) {
            client.set_webcam(enabled);
        }
    }

    /// Enable or disable the local stream's tracks of one kind
    pub async fn set_local_tracks(&self, id: &str, kind: MediaKind, enabled: bool) {
        let mut state = self.shared.state.lock().await;
        if let Some(client) = state.sessions.get_mut(id).and_then(|w| w.client.as_mut()) {
            client.set_local_tracks(kind, enabled);
        }
    }

    // ==================== Connection ====================

    /// Detach the bridge, forget the current call and disconnect
    ///
    /// The session stays registered; a pending reconnect is cancelled.
    pub async fn disconnect(&self, id: &str) {
        let mut state = self.shared.state.lock().await;
        let Some(wrapper) = state.sessions.get_mut(id) else {
            return;
        };
        if wrapper.client.is_none() {
            return;
        }

        wrapper.generation = self.shared.next_generation();
        if let Err(e) = wrapper.teardown().await {
            warn!(element_id = %id, error = %e, "Disconnect failed");
        }
        info!(element_id = %id, "Client disconnected");
    }

    /// Rebuild the client from the original options and reset the
    /// reconnection counter. Pending automatic reconnects are cancelled.
    pub async fn reconnect(&self, id: &str) {
        let mut state = self.shared.state.lock().await;
        let Some(wrapper) = state.sessions.get_mut(id) else {
            return;
        };

        info!(element_id = %id, "Manual reconnect");
        wrapper.generation = self.shared.next_generation();
        wrapper.reconnector.reset();
        let result = self
            .shared
            .factory
            .construct(wrapper, pump_attacher(Arc::downgrade(&self.shared), id.to_string()))
            .await;
        if let Err(e) = result {
            wrapper.report_error(&e).await;
        }
    }

    // ==================== Observer ====================

    /// Unmount `id` when its element is removed from its parent
    ///
    /// Replaces any observer already attached for `id`. Returns false if the
    /// element or its parent cannot be found.
    pub async fn create_observer(&self, id: &str, document: &dyn Document) -> bool {
        let Some(element) = document.element_by_id(id) else {
            warn!(element_id = %id, "Element not found for lifecycle observer");
            return false;
        };
        let Some(parent) = document.parent_of(&element) else {
            warn!(element_id = %id, "Element has no parent to observe");
            return false;
        };

        let weak = Arc::downgrade(&self.shared);
        let element_id = id.to_string();
        let observer = spawn_observer(element, document.watch_children(&parent), move || async move {
            if let Some(shared) = weak.upgrade() {
                ClientRegistry { shared }.unmount(&element_id).await;
            }
        });

        let previous = self
            .shared
            .state
            .lock()
            .await
            .observers
            .insert(id.to_string(), observer);
        if previous.is_some() {
            debug!(element_id = %id, "Replaced existing lifecycle observer");
        }
        true
    }
}

fn current_handle(state: &RegistryState, id: &str) -> Option<Arc<dyn CallHandle>> {
    state
        .sessions
        .get(id)
        .and_then(|w| w.current_call.as_ref())
        .map(|c| c.handle.clone())
}

impl RegistryShared {
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Run one SDK event through the bridge of `id`
    ///
    /// Events from a client that has since been replaced or disconnected
    /// carry an old epoch and are dropped. Every reconnect the bridge counts
    /// is scheduled, even while an earlier one is still pending.
    async fn dispatch(self: &Arc<Self>, id: &str, epoch: u64, event: SdkEvent) {
        let scheduled = {
            let mut state = self.state.lock().await;
            let Some(wrapper) = state.sessions.get_mut(id) else {
                debug!(element_id = %id, "Dropping event for unmounted client");
                return;
            };
            if wrapper.epoch != epoch {
                debug!(element_id = %id, epoch, current = wrapper.epoch, "Dropping stale event");
                return;
            }
            bridge::handle_event(wrapper, event)
                .await
                .map(|delay| (delay, wrapper.generation))
        };

        if let Some((delay, generation)) = scheduled {
            schedule_reconnect(self, id, generation, delay);
        }
    }

    /// Rebuild the client of `id` unless it was disconnected, reconnected
    /// or recreated since the reconnect was scheduled
    async fn reconstruct(self: &Arc<Self>, id: &str, generation: u64) {
        let mut state = self.state.lock().await;
        let Some(wrapper) = state.sessions.get_mut(id) else {
            debug!(element_id = %id, "Client unmounted before reconnect");
            return;
        };
        if wrapper.generation != generation {
            debug!(element_id = %id, "Pending reconnect cancelled");
            return;
        }

        info!(
            element_id = %id,
            attempt = wrapper.reconnector.attempts(),
            "Reconnecting client"
        );
        let attach = pump_attacher(Arc::downgrade(self), id.to_string());
        let result = self.factory.construct(wrapper, attach).await;
        if let Err(e) = result {
            wrapper.report_error(&e).await;
        }
    }
}

fn schedule_reconnect(
    shared: &Arc<RegistryShared>,
    id: &str,
    generation: u64,
    delay: Duration,
) {
    let weak = Arc::downgrade(shared);
    let id = id.to_string();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Some(shared) = weak.upgrade() {
            shared.reconstruct(&id, generation).await;
        }
    });
}

fn pump_attacher(
    shared: Weak<RegistryShared>,
    id: String,
) -> impl FnOnce(u64, broadcast::Receiver<SdkEvent>) -> JoinHandle<()> + Send + 'static {
    move |epoch, rx| tokio::spawn(pump(shared, id, epoch, rx))
}

/// Read one client's events in order and dispatch them
async fn pump(
    shared: Weak<RegistryShared>,
    id: String,
    epoch: u64,
    mut rx: broadcast::Receiver<SdkEvent>,
) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(element_id = %id, skipped, "Event pump lagged behind SDK events");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let Some(registry) = shared.upgrade() else {
            break;
        };
        registry.dispatch(&id, epoch, event).await;
    }
    debug!(element_id = %id, epoch, "Event pump stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientInitOptions;
    use crate::host::MemoryHost;
    use crate::sdk::{MockBehavior, MockRtcClientFactory};
    use crate::types::DeviceKind;

    fn options() -> ClientOptions {
        ClientOptions {
            init_options: ClientInitOptions::with_token("tok"),
            ..Default::default()
        }
    }

    fn registry() -> (ClientRegistry, Arc<MockRtcClientFactory>, Arc<MemoryHost>) {
        let clients = Arc::new(MockRtcClientFactory::new());
        (
            ClientRegistry::new(clients.clone()),
            clients,
            Arc::new(MemoryHost::default()),
        )
    }

    #[tokio::test]
    async fn create_registers_and_emits_initialized() {
        let (registry, clients, host) = registry();

        assert!(registry.create("phone", options(), host.clone()).await);

        assert!(registry.contains("phone").await);
        assert_eq!(clients.created_count(), 1);
        assert_eq!(host.names_for("phone").await, vec!["initialized"]);
        assert_eq!(host.events().await[0].payload, "null");
        assert!(registry.get("phone").await.unwrap().connected);
    }

    #[tokio::test]
    async fn duplicate_create_is_ignored() {
        let (registry, clients, host) = registry();

        assert!(registry.create("phone", options(), host.clone()).await);
        assert!(!registry.create("phone", options(), host.clone()).await);

        assert_eq!(clients.created_count(), 1);
        assert_eq!(registry.len().await, 1);
        assert_eq!(host.names_for("phone").await, vec!["initialized"]);
    }

    #[tokio::test]
    async fn create_from_json_rejects_bad_options() {
        let (registry, clients, host) = registry();

        assert!(!registry.create_from_json("phone", "{not json", host.clone()).await);
        assert!(registry.is_empty().await);
        assert_eq!(clients.created_count(), 0);

        let json = r#"{ "initOptions": { "login_token": "t" }, "autoAnswer": true }"#;
        assert!(registry.create_from_json("phone", json, host).await);
    }

    #[tokio::test]
    async fn connect_failure_reports_error_after_initialized() {
        let clients = Arc::new(MockRtcClientFactory::with_behavior(MockBehavior {
            fail_connect: true,
            ..Default::default()
        }));
        let registry = ClientRegistry::new(clients);
        let host = Arc::new(MemoryHost::default());

        assert!(registry.create("phone", options(), host.clone()).await);

        assert_eq!(host.names_for("phone").await, vec!["initialized", "error"]);
        assert!(registry.contains("phone").await);
    }

    #[tokio::test]
    async fn unmount_is_idempotent() {
        let (registry, clients, host) = registry();
        registry.create("phone", options(), host).await;

        assert!(registry.unmount("phone").await);
        assert!(!registry.unmount("phone").await);
        assert!(!registry.unmount("never-created").await);

        assert!(!registry.contains("phone").await);
        assert_eq!(clients.client(0).unwrap().log().disconnects, 1);
    }

    #[tokio::test]
    async fn unmount_swallows_disconnect_failure() {
        let clients = Arc::new(MockRtcClientFactory::with_behavior(MockBehavior {
            fail_disconnect: true,
            ..Default::default()
        }));
        let registry = ClientRegistry::new(clients);
        registry
            .create("phone", options(), Arc::new(MemoryHost::default()))
            .await;

        assert!(registry.unmount("phone").await);
        assert!(!registry.contains("phone").await);
    }

    #[tokio::test]
    async fn call_is_rejected_while_one_is_active() {
        let (registry, clients, host) = registry();
        registry.create("phone", options(), host).await;

        assert!(registry.call("phone", CallOptions::to("1000")).await);
        assert!(!registry.call("phone", CallOptions::to("2000")).await);

        let log = clients.client(0).unwrap().log();
        assert_eq!(log.calls.len(), 1);
        assert!(registry.get("phone").await.unwrap().has_current_call);
    }

    #[tokio::test]
    async fn failed_call_leaves_no_current_call() {
        let clients = Arc::new(MockRtcClientFactory::with_behavior(MockBehavior {
            fail_new_call: true,
            ..Default::default()
        }));
        let registry = ClientRegistry::new(clients);
        registry
            .create("phone", options(), Arc::new(MemoryHost::default()))
            .await;

        assert!(!registry.call("phone", CallOptions::to("1000")).await);
        assert!(!registry.get("phone").await.unwrap().has_current_call);
    }

    #[tokio::test]
    async fn hangup_clears_current_call_even_on_failure() {
        let (registry, clients, host) = registry();
        registry.create("phone", options(), host).await;
        registry.call("phone", CallOptions::to("1000")).await;

        let call = clients.client(0).unwrap().last_call().unwrap();
        call.fail_hangup(true);
        registry.hangup("phone", None).await;

        assert_eq!(call.hangup_count(), 1);
        assert!(!registry.get("phone").await.unwrap().has_current_call);
        assert!(registry.call("phone", CallOptions::to("2000")).await);
    }

    #[tokio::test]
    async fn commands_reach_the_current_call() {
        let (registry, clients, host) = registry();
        registry.create("phone", options(), host).await;

        // No call yet: silently ignored
        registry.command("phone", CallCommand::Hold).await;

        registry.call("phone", CallOptions::to("1000")).await;
        registry.command("phone", CallCommand::MuteAudio).await;
        registry.command("phone", CallCommand::Dtmf("9".into())).await;
        registry.command("missing", CallCommand::Hold).await;

        let call = clients.client(0).unwrap().last_call().unwrap();
        assert_eq!(
            call.commands(),
            vec![CallCommand::MuteAudio, CallCommand::Dtmf("9".into())]
        );
    }

    #[tokio::test]
    async fn answer_without_call_is_a_no_op() {
        let (registry, _clients, host) = registry();
        registry.create("phone", options(), host).await;
        registry.answer("phone", None).await;
        registry.answer("missing", None).await;
    }

    #[tokio::test]
    async fn call_stats_are_a_json_array() {
        let (registry, _clients, host) = registry();
        registry.create("phone", options(), host).await;
        assert!(registry.call_stats("phone").await.is_none());

        registry.call("phone", CallOptions::to("1000")).await;
        let stats = registry.call_stats("phone").await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&stats).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn device_queries_fall_back_to_empty() {
        let (registry, clients, host) = registry();
        registry.create("phone", options(), host).await;

        let cams = registry.devices("phone", DeviceFilter::VideoInput).await;
        assert_eq!(cams.len(), 1);
        assert_eq!(cams[0].kind, DeviceKind::VideoInput);
        assert!(registry.devices("missing", DeviceFilter::All).await.is_empty());

        clients.client(0).unwrap().set_behavior(MockBehavior {
            fail_devices: true,
            fail_permissions: true,
            fail_settings: true,
            ..Default::default()
        });
        assert!(registry.devices("phone", DeviceFilter::All).await.is_empty());
        assert!(!registry.check_permissions("phone", true, false).await);
        assert!(!registry.set_audio_settings("phone", AudioSettings::default()).await);
        assert!(!registry.set_video_settings("phone", VideoSettings::default()).await);
    }

    #[tokio::test]
    async fn media_controls_reach_the_client() {
        let (registry, clients, host) = registry();
        registry.create("phone", options(), host).await;

        assert!(registry.check_permissions("phone", true, true).await);
        assert!(registry.set_audio_settings("phone", AudioSettings::default()).await);
        registry.set_microphone("phone", false).await;
        registry.set_webcam("phone", true).await;
        registry.set_local_tracks("phone", MediaKind::Video, false).await;

        let log = clients.client(0).unwrap().log();
        assert_eq!(log.microphone, Some(false));
        assert_eq!(log.webcam, Some(true));
        assert_eq!(log.tracks, vec![(MediaKind::Video, false)]);
        assert_eq!(log.audio_settings.len(), 1);
    }

    #[tokio::test]
    async fn disconnect_keeps_session_and_clears_call() {
        let (registry, clients, host) = registry();
        registry.create("phone", options(), host).await;
        registry.call("phone", CallOptions::to("1000")).await;

        registry.disconnect("phone").await;

        let info = registry.get("phone").await.unwrap();
        assert!(!info.connected);
        assert!(!info.has_current_call);
        assert_eq!(clients.client(0).unwrap().log().disconnects, 1);
    }

    #[tokio::test]
    async fn reconnect_rebuilds_client() {
        let (registry, clients, host) = registry();
        registry.create("phone", options(), host).await;

        registry.reconnect("phone").await;
        registry.reconnect("missing").await;

        assert_eq!(clients.created_count(), 2);
        assert_eq!(clients.client(0).unwrap().log().disconnects, 1);
        let info = registry.get("phone").await.unwrap();
        assert!(info.connected);
        assert_eq!(info.reconnect_attempts, 0);
    }
}
