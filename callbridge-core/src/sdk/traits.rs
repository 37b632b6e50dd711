//! RtcClient trait and related types
//!
//! The communication SDK is vendored and not under our control. These traits
//! are the seam the registry talks through; the loopback implementation in
//! [`super::mock`] stands in for it in tests and the demo host.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::ClientInitOptions;
use crate::error::SdkError;
use crate::options::{
    AnswerOptions, AudioSettings, CallOptions, HangupOptions, ScreenShareOptions, VideoSettings,
};
use crate::payload::Payload;
use crate::types::{DeviceDescriptor, DeviceFilter, MediaKind};

/// Session-level events emitted by an SDK client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Ready,
    Error,
    Notification,
    SocketOpen,
    SocketClose,
    SocketError,
    Reconnecting,
    Reconnected,
    Disconnected,
    Ping,
    Pong,
}

impl SessionEvent {
    /// Every event kind the bridge forwards
    pub const ALL: [SessionEvent; 11] = [
        Self::Ready,
        Self::Error,
        Self::Notification,
        Self::SocketOpen,
        Self::SocketClose,
        Self::SocketError,
        Self::Reconnecting,
        Self::Reconnected,
        Self::Disconnected,
        Self::Ping,
        Self::Pong,
    ];

    /// Name forwarded to the host
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Notification => "notification",
            Self::SocketOpen => "socket.open",
            Self::SocketClose => "socket.close",
            Self::SocketError => "socket.error",
            Self::Reconnecting => "reconnecting",
            Self::Reconnected => "reconnected",
            Self::Disconnected => "disconnected",
            Self::Ping => "ping",
            Self::Pong => "pong",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event read from an SDK client's stream
///
/// `call` is set when the SDK hands over a live call object, which is how
/// incoming calls become controllable.
#[derive(Clone)]
pub struct SdkEvent {
    pub kind: SessionEvent,
    pub payload: Payload,
    pub call: Option<Arc<dyn CallHandle>>,
}

impl SdkEvent {
    pub fn new(kind: SessionEvent, payload: Payload) -> Self {
        Self {
            kind,
            payload,
            call: None,
        }
    }

    pub fn with_call(mut self, call: Arc<dyn CallHandle>) -> Self {
        self.call = Some(call);
        self
    }
}

impl fmt::Debug for SdkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkEvent")
            .field("kind", &self.kind)
            .field("payload", &self.payload)
            .field("call", &self.call.as_ref().map(|c| c.id()))
            .finish()
    }
}

/// Control command applied to the current call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "camelCase")]
pub enum CallCommand {
    MuteAudio,
    UnmuteAudio,
    ToggleAudioMute,
    MuteVideo,
    UnmuteVideo,
    ToggleVideoMute,
    Deaf,
    Undeaf,
    ToggleDeaf,
    Hold,
    Unhold,
    ToggleHold,
    Dtmf(String),
    Message { to: String, body: String },
    SetAudioInDevice(String),
    SetAudioOutDevice(String),
    SetVideoDevice(String),
    StartScreenShare(Option<ScreenShareOptions>),
    StopScreenShare,
    /// Audio bandwidth cap in bits per second
    SetAudioBandwidth(u32),
    /// Video bandwidth cap in bits per second
    SetVideoBandwidth(u32),
    ListVideoLayouts,
    SetVideoLayout { layout: String, canvas: Option<u32> },
    PlayMedia(String),
    StopMedia,
    StartRecord(String),
    StopRecord,
    SendChatMessage { message: String, kind: Option<String> },
    Snapshot(String),
    MuteParticipantMic(String),
    MuteParticipantVideo(String),
    Kick(String),
    VolumeUp(String),
    VolumeDown(String),
}

impl CallCommand {
    /// SDK method name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Self::MuteAudio => "muteAudio",
            Self::UnmuteAudio => "unmuteAudio",
            Self::ToggleAudioMute => "toggleAudioMute",
            Self::MuteVideo => "muteVideo",
            Self::UnmuteVideo => "unmuteVideo",
            Self::ToggleVideoMute => "toggleVideoMute",
            Self::Deaf => "deaf",
            Self::Undeaf => "undeaf",
            Self::ToggleDeaf => "toggleDeaf",
            Self::Hold => "hold",
            Self::Unhold => "unhold",
            Self::ToggleHold => "toggleHold",
            Self::Dtmf(_) => "dtmf",
            Self::Message { .. } => "message",
            Self::SetAudioInDevice(_) => "setAudioInDevice",
            Self::SetAudioOutDevice(_) => "setAudioOutDevice",
            Self::SetVideoDevice(_) => "setVideoDevice",
            Self::StartScreenShare(_) => "startScreenShare",
            Self::StopScreenShare => "stopScreenShare",
            Self::SetAudioBandwidth(_) => "setAudioBandwidthEncodingsMaxBps",
            Self::SetVideoBandwidth(_) => "setVideoBandwidthEncodingsMaxBps",
            Self::ListVideoLayouts => "listVideoLayouts",
            Self::SetVideoLayout { .. } => "setVideoLayout",
            Self::PlayMedia(_) => "playMedia",
            Self::StopMedia => "stopMedia",
            Self::StartRecord(_) => "startRecord",
            Self::StopRecord => "stopRecord",
            Self::SendChatMessage { .. } => "sendChatMessage",
            Self::Snapshot(_) => "snapshot",
            Self::MuteParticipantMic(_) => "muteMic",
            Self::MuteParticipantVideo(_) => "muteVideo",
            Self::Kick(_) => "kick",
            Self::VolumeUp(_) => "volumeUp",
            Self::VolumeDown(_) => "volumeDown",
        }
    }
}

/// A live call owned by the SDK
#[async_trait]
pub trait CallHandle: Send + Sync {
    /// SDK call id
    fn id(&self) -> String;

    async fn answer(&self, options: Option<AnswerOptions>) -> Result<(), SdkError>;

    async fn hangup(&self, options: Option<HangupOptions>) -> Result<(), SdkError>;

    async fn execute(&self, command: CallCommand) -> Result<(), SdkError>;

    /// WebRTC statistics reports collected so far
    async fn stats(&self) -> Result<Vec<serde_json::Value>, SdkError>;
}

/// Trait for SDK client instances
///
/// One instance per registry entry. Implementations emit [`SdkEvent`]s on a
/// broadcast channel; subscribe before `connect` so nothing is missed.
#[async_trait]
pub trait RtcClient: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<SdkEvent>;

    async fn connect(&mut self) -> Result<(), SdkError>;

    async fn disconnect(&mut self) -> Result<(), SdkError>;

    /// Place an outbound call
    async fn new_call(&mut self, options: CallOptions) -> Result<Arc<dyn CallHandle>, SdkError>;

    /// Bind local and remote media to host elements
    fn set_media_sinks(&mut self, local: Option<String>, remote: Option<String>);

    fn set_microphone(&mut self, enabled: bool);

    fn set_webcam(&mut self, enabled: bool);

    /// Enable or disable every local track of one kind
    fn set_local_tracks(&mut self, kind: MediaKind, enabled: bool);

    async fn devices(&self, filter: DeviceFilter) -> Result<Vec<DeviceDescriptor>, SdkError>;

    async fn check_permissions(&self, audio: bool, video: bool) -> Result<bool, SdkError>;

    async fn apply_audio_settings(&mut self, settings: AudioSettings) -> Result<(), SdkError>;

    async fn apply_video_settings(&mut self, settings: VideoSettings) -> Result<(), SdkError>;
}

/// Factory for creating SDK clients
///
/// Enables dependency injection of the SDK implementation.
pub trait RtcClientFactory: Send + Sync {
    fn create(&self, options: &ClientInitOptions) -> Box<dyn RtcClient>;
}
