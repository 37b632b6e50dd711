//! Loopback SDK for tests and the demo host
//!
//! MockRtcClient records every invocation and lets the caller script the
//! SDK's event stream through a [`MockClientHandle`]. Call payloads are built
//! the way the real SDK shapes them, including the call/client back-reference
//! cycle, so the bridge's serializer is exercised end to end.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::traits::{CallCommand, CallHandle, RtcClient, RtcClientFactory, SdkEvent, SessionEvent};
use crate::config::ClientInitOptions;
use crate::error::SdkError;
use crate::options::{AnswerOptions, AudioSettings, CallOptions, HangupOptions, VideoSettings};
use crate::payload::{ObjectRef, Payload};
use crate::types::{CallState, DeviceDescriptor, DeviceFilter, DeviceKind, MediaKind};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything a mock client was asked to do
#[derive(Debug, Clone, Default)]
pub struct MockClientLog {
    pub init_options: ClientInitOptions,
    pub connects: u32,
    pub disconnects: u32,
    pub microphone: Option<bool>,
    pub webcam: Option<bool>,
    pub local_sink: Option<String>,
    pub remote_sink: Option<String>,
    pub tracks: Vec<(MediaKind, bool)>,
    pub calls: Vec<CallOptions>,
    pub audio_settings: Vec<AudioSettings>,
    pub video_settings: Vec<VideoSettings>,
}

/// Scripted behavior of a mock client
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub fail_connect: bool,
    pub fail_disconnect: bool,
    pub fail_new_call: bool,
    pub fail_devices: bool,
    pub fail_permissions: bool,
    pub fail_settings: bool,
    pub permissions_granted: bool,
    pub devices: Vec<DeviceDescriptor>,
    /// Emit `ready` as soon as `connect` succeeds
    pub emit_ready_on_connect: bool,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            fail_connect: false,
            fail_disconnect: false,
            fail_new_call: false,
            fail_devices: false,
            fail_permissions: false,
            fail_settings: false,
            permissions_granted: true,
            devices: default_devices(),
            emit_ready_on_connect: false,
        }
    }
}

fn default_devices() -> Vec<DeviceDescriptor> {
    let device = |id: &str, kind: DeviceKind, label: &str| DeviceDescriptor {
        device_id: id.to_string(),
        group_id: "loopback".to_string(),
        kind,
        label: label.to_string(),
    };
    vec![
        device("mic-default", DeviceKind::AudioInput, "Loopback Microphone"),
        device("speaker-default", DeviceKind::AudioOutput, "Loopback Speaker"),
        device("cam-default", DeviceKind::VideoInput, "Loopback Camera"),
    ]
}

#[derive(Default)]
struct MockCallLog {
    answers: Vec<Option<AnswerOptions>>,
    hangups: Vec<Option<HangupOptions>>,
    commands: Vec<CallCommand>,
}

/// Mock implementation of CallHandle
pub struct MockCall {
    id: String,
    direction: String,
    log: Mutex<MockCallLog>,
    fail_answer: AtomicBool,
    fail_hangup: AtomicBool,
    fail_commands: AtomicBool,
}

impl MockCall {
    pub fn new(id: impl Into<String>, direction: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            direction: direction.into(),
            log: Mutex::new(MockCallLog::default()),
            fail_answer: AtomicBool::new(false),
            fail_hangup: AtomicBool::new(false),
            fail_commands: AtomicBool::new(false),
        }
    }

    pub fn direction(&self) -> &str {
        &self.direction
    }

    pub fn answer_count(&self) -> usize {
        lock(&self.log).answers.len()
    }

    pub fn answers(&self) -> Vec<Option<AnswerOptions>> {
        lock(&self.log).answers.clone()
    }

    pub fn hangup_count(&self) -> usize {
        lock(&self.log).hangups.len()
    }

    pub fn commands(&self) -> Vec<CallCommand> {
        lock(&self.log).commands.clone()
    }

    pub fn fail_answer(&self, fail: bool) {
        self.fail_answer.store(fail, Ordering::SeqCst);
    }

    pub fn fail_hangup(&self, fail: bool) {
        self.fail_hangup.store(fail, Ordering::SeqCst);
    }

    pub fn fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CallHandle for MockCall {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn answer(&self, options: Option<AnswerOptions>) -> Result<(), SdkError> {
        lock(&self.log).answers.push(options);
        if self.fail_answer.load(Ordering::SeqCst) {
            return Err(SdkError::operation("answer", "mock answer failure"));
        }
        Ok(())
    }

    async fn hangup(&self, options: Option<HangupOptions>) -> Result<(), SdkError> {
        lock(&self.log).hangups.push(options);
        if self.fail_hangup.load(Ordering::SeqCst) {
            return Err(SdkError::operation("hangup", "mock hangup failure"));
        }
        Ok(())
    }

    async fn execute(&self, command: CallCommand) -> Result<(), SdkError> {
        let name = command.name();
        lock(&self.log).commands.push(command);
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(SdkError::operation(name, "mock command failure"));
        }
        Ok(())
    }

    async fn stats(&self) -> Result<Vec<serde_json::Value>, SdkError> {
        Ok(vec![
            json!({ "type": "inbound-rtp", "kind": "audio", "callId": self.id, "packetsLost": 0 }),
            json!({ "type": "outbound-rtp", "kind": "audio", "callId": self.id, "packetsSent": 0 }),
        ])
    }
}

struct MockShared {
    log: MockClientLog,
    behavior: MockBehavior,
    calls: Vec<Arc<MockCall>>,
    connected: bool,
}

/// Scripting handle for one mock client
///
/// Stays valid after the client itself has been dropped by the registry.
#[derive(Clone)]
pub struct MockClientHandle {
    session_id: String,
    shared: Arc<Mutex<MockShared>>,
    tx: broadcast::Sender<SdkEvent>,
}

impl MockClientHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn log(&self) -> MockClientLog {
        lock(&self.shared).log.clone()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.shared).connected
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        lock(&self.shared).behavior = behavior;
    }

    /// Every call this client created or received, oldest first
    pub fn calls(&self) -> Vec<Arc<MockCall>> {
        lock(&self.shared).calls.clone()
    }

    pub fn last_call(&self) -> Option<Arc<MockCall>> {
        lock(&self.shared).calls.last().cloned()
    }

    /// Live bridge subscriptions on this client
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Emit a raw event. Returns false when nobody is listening.
    pub fn emit(&self, event: SdkEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Emit a session-level event with a small payload
    pub fn emit_session(&self, kind: SessionEvent) -> bool {
        let payload = ObjectRef::new()
            .with("type", kind.as_str())
            .with("sessionid", self.session_id.as_str());
        self.emit(SdkEvent::new(kind, payload.into()))
    }

    /// Emit a `callUpdate` notification
    ///
    /// When `call` is given it is attached as a live handle; otherwise the
    /// notification refers to the client's most recent call by id only.
    pub fn emit_call_update(&self, state: CallState, call: Option<Arc<MockCall>>) -> bool {
        let (call_id, direction) = match call.clone().or_else(|| self.last_call()) {
            Some(known) => (known.id(), known.direction().to_string()),
            None => (String::from("unknown"), String::from("outbound")),
        };

        let notification = self.call_update_payload(&call_id, &direction, &state);
        let mut event = SdkEvent::new(SessionEvent::Notification, notification);
        if let Some(call) = call {
            event = event.with_call(call);
        }
        self.emit(event)
    }

    /// Emit a `userMediaError` notification
    pub fn emit_media_error(&self, name: &str, message: &str) -> bool {
        let error = ObjectRef::new().with("name", name).with("message", message);
        let notification = ObjectRef::new()
            .with("type", "userMediaError")
            .with("error", error);
        self.emit(SdkEvent::new(SessionEvent::Notification, notification.into()))
    }

    /// Simulate an incoming call: create it and emit Ringing with a live handle
    pub fn ring(&self, caller_number: &str) -> Arc<MockCall> {
        let call = Arc::new(MockCall::new(Uuid::new_v4().to_string(), "inbound"));
        lock(&self.shared).calls.push(call.clone());

        let notification = self.call_update_payload(&call.id(), "inbound", &CallState::Ringing);
        if let Some(Payload::Object(node)) = notification.as_object().and_then(|root| root.get("call")) {
            node.insert("callerNumber", caller_number);
        }

        self.emit(SdkEvent::new(SessionEvent::Notification, notification).with_call(call.clone()));
        call
    }

    fn call_update_payload(&self, call_id: &str, direction: &str, state: &CallState) -> Payload {
        let client = ObjectRef::new().with("sessionid", self.session_id.as_str());
        let call = ObjectRef::new()
            .with("callId", call_id)
            .with("state", state.as_str())
            .with("direction", direction)
            .with("client", client.clone());
        client.insert("currentCall", call.clone());

        ObjectRef::new()
            .with("type", "callUpdate")
            .with("call", call)
            .into()
    }
}

/// Mock implementation of RtcClient
pub struct MockRtcClient {
    handle: MockClientHandle,
}

impl MockRtcClient {
    pub fn new(init_options: ClientInitOptions, behavior: MockBehavior) -> Self {
        let (tx, _) = broadcast::channel(100);
        let shared = MockShared {
            log: MockClientLog {
                init_options,
                ..Default::default()
            },
            behavior,
            calls: Vec::new(),
            connected: false,
        };
        Self {
            handle: MockClientHandle {
                session_id: Uuid::new_v4().to_string(),
                shared: Arc::new(Mutex::new(shared)),
                tx,
            },
        }
    }

    pub fn handle(&self) -> MockClientHandle {
        self.handle.clone()
    }

    fn shared(&self) -> MutexGuard<'_, MockShared> {
        lock(&self.handle.shared)
    }
}

#[async_trait]
impl RtcClient for MockRtcClient {
    fn subscribe(&self) -> broadcast::Receiver<SdkEvent> {
        self.handle.tx.subscribe()
    }

    async fn connect(&mut self) -> Result<(), SdkError> {
        let emit_ready = {
            let mut shared = self.shared();
            shared.log.connects += 1;
            if shared.behavior.fail_connect {
                return Err(SdkError::ConnectFailed("mock connect failure".to_string()));
            }
            shared.connected = true;
            shared.behavior.emit_ready_on_connect
        };

        if emit_ready {
            self.handle.emit_session(SessionEvent::Ready);
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SdkError> {
        let mut shared = self.shared();
        shared.log.disconnects += 1;
        shared.connected = false;
        if shared.behavior.fail_disconnect {
            return Err(SdkError::operation("disconnect", "mock disconnect failure"));
        }
        Ok(())
    }

    async fn new_call(&mut self, options: CallOptions) -> Result<Arc<dyn CallHandle>, SdkError> {
        let mut shared = self.shared();
        shared.log.calls.push(options);
        if shared.behavior.fail_new_call {
            return Err(SdkError::CallFailed("mock newCall failure".to_string()));
        }
        if !shared.connected {
            return Err(SdkError::NotConnected);
        }

        let call = Arc::new(MockCall::new(Uuid::new_v4().to_string(), "outbound"));
        shared.calls.push(call.clone());
        Ok(call)
    }

    fn set_media_sinks(&mut self, local: Option<String>, remote: Option<String>) {
        let mut shared = self.shared();
        shared.log.local_sink = local;
        shared.log.remote_sink = remote;
    }

    fn set_microphone(&mut self, enabled: bool) {
        self.shared().log.microphone = Some(enabled);
    }

    fn set_webcam(&mut self, enabled: bool) {
        self.shared().log.webcam = Some(enabled);
    }

    fn set_local_tracks(&mut self, kind: MediaKind, enabled: bool) {
        self.shared().log.tracks.push((kind, enabled));
    }

    async fn devices(&self, filter: DeviceFilter) -> Result<Vec<DeviceDescriptor>, SdkError> {
        let shared = self.shared();
        if shared.behavior.fail_devices {
            return Err(SdkError::operation("getDevices", "mock enumeration failure"));
        }
        Ok(shared
            .behavior
            .devices
            .iter()
            .filter(|d| filter.matches(d.kind))
            .cloned()
            .collect())
    }

    async fn check_permissions(&self, _audio: bool, _video: bool) -> Result<bool, SdkError> {
        let shared = self.shared();
        if shared.behavior.fail_permissions {
            return Err(SdkError::PermissionDenied("mock permission failure".to_string()));
        }
        Ok(shared.behavior.permissions_granted)
    }

    async fn apply_audio_settings(&mut self, settings: AudioSettings) -> Result<(), SdkError> {
        let mut shared = self.shared();
        shared.log.audio_settings.push(settings);
        if shared.behavior.fail_settings {
            return Err(SdkError::operation("setAudioSettings", "mock settings failure"));
        }
        Ok(())
    }

    async fn apply_video_settings(&mut self, settings: VideoSettings) -> Result<(), SdkError> {
        let mut shared = self.shared();
        shared.log.video_settings.push(settings);
        if shared.behavior.fail_settings {
            return Err(SdkError::operation("setVideoSettings", "mock settings failure"));
        }
        Ok(())
    }
}

/// Factory for creating MockRtcClient instances
///
/// Keeps a handle to every client it creates so tests and the demo host can
/// drive them after the registry has taken ownership.
#[derive(Default)]
pub struct MockRtcClientFactory {
    behavior: Mutex<MockBehavior>,
    created: Mutex<Vec<MockClientHandle>>,
}

impl MockRtcClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            created: Mutex::new(Vec::new()),
        }
    }

    /// Behavior applied to clients created from now on
    pub fn set_behavior(&self, behavior: MockBehavior) {
        *lock(&self.behavior) = behavior;
    }

    pub fn created_count(&self) -> usize {
        lock(&self.created).len()
    }

    pub fn client(&self, index: usize) -> Option<MockClientHandle> {
        lock(&self.created).get(index).cloned()
    }

    pub fn last(&self) -> Option<MockClientHandle> {
        lock(&self.created).last().cloned()
    }
}

impl RtcClientFactory for MockRtcClientFactory {
    fn create(&self, options: &ClientInitOptions) -> Box<dyn RtcClient> {
        let client = MockRtcClient::new(options.clone(), lock(&self.behavior).clone());
        lock(&self.created).push(client.handle());
        Box::new(client)
    }
}
