//! Typed views of the SDK's notification payloads

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle state of a call as reported by the SDK
///
/// `Done` and `Disconnected` are terminal signals synthesized for abnormal
/// ends. Anything the SDK adds later lands in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallState {
    New,
    Trying,
    Requesting,
    Recovering,
    Ringing,
    Answering,
    Early,
    Active,
    Held,
    Hangup,
    Destroy,
    Purge,
    Done,
    Disconnected,
    Other(String),
}

impl CallState {
    /// Wire name of the state
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::Trying => "trying",
            Self::Requesting => "requesting",
            Self::Recovering => "recovering",
            Self::Ringing => "ringing",
            Self::Answering => "answering",
            Self::Early => "early",
            Self::Active => "active",
            Self::Held => "held",
            Self::Hangup => "hangup",
            Self::Destroy => "destroy",
            Self::Purge => "purge",
            Self::Done => "done",
            Self::Disconnected => "disconnected",
            Self::Other(name) => name,
        }
    }

    /// Parse a wire name, case-insensitively
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "new" => Self::New,
            "trying" => Self::Trying,
            "requesting" => Self::Requesting,
            "recovering" => Self::Recovering,
            "ringing" => Self::Ringing,
            "answering" => Self::Answering,
            "early" => Self::Early,
            "active" => Self::Active,
            "held" => Self::Held,
            "hangup" => Self::Hangup,
            "destroy" => Self::Destroy,
            "purge" => Self::Purge,
            "done" => Self::Done,
            "disconnected" => Self::Disconnected,
            _ => Self::Other(s.to_string()),
        }
    }

    /// The call ended without anyone asking for it
    pub fn is_abnormal_end(&self) -> bool {
        matches!(self, Self::Done | Self::Disconnected)
    }

    /// The call was ended on purpose
    pub fn is_explicit_end(&self) -> bool {
        matches!(self, Self::Hangup | Self::Destroy | Self::Purge)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CallState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CallState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}

/// Snapshot of a call carried by a `callUpdate` notification
///
/// Known fields are typed; everything else the SDK sends is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<CallState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callee_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_on_hold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_control_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Fields this crate does not model
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CallSnapshot {
    /// Snapshot with only an id and a state
    pub fn new(call_id: impl Into<String>, state: CallState) -> Self {
        Self {
            call_id: Some(call_id.into()),
            state: Some(state),
            ..Default::default()
        }
    }
}

/// Media error reported by the SDK (permission denied, device missing, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Normalized SDK notification envelope
///
/// The two variants carry mutually exclusive payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    #[serde(rename = "callUpdate")]
    CallUpdate { call: CallSnapshot },
    #[serde(rename = "userMediaError")]
    UserMediaError { error: MediaError },
}

impl Notification {
    /// Wire name of the notification type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CallUpdate { .. } => "callUpdate",
            Self::UserMediaError { .. } => "userMediaError",
        }
    }

    pub fn call(&self) -> Option<&CallSnapshot> {
        match self {
            Self::CallUpdate { call } => Some(call),
            Self::UserMediaError { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&MediaError> {
        match self {
            Self::UserMediaError { error } => Some(error),
            Self::CallUpdate { .. } => None,
        }
    }
}

/// Kind of a media device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    AudioInput,
    AudioOutput,
    VideoInput,
}

/// A media device as enumerated by the SDK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub device_id: String,
    #[serde(default)]
    pub group_id: String,
    pub kind: DeviceKind,
    /// Empty until the user grants media permission
    #[serde(default)]
    pub label: String,
}

/// Which devices a device query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceFilter {
    #[default]
    All,
    AudioInput,
    AudioOutput,
    VideoInput,
}

impl DeviceFilter {
    pub fn matches(&self, kind: DeviceKind) -> bool {
        match self {
            Self::All => true,
            Self::AudioInput => kind == DeviceKind::AudioInput,
            Self::AudioOutput => kind == DeviceKind::AudioOutput,
            Self::VideoInput => kind == DeviceKind::VideoInput,
        }
    }
}

/// Media track family of the local stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}
