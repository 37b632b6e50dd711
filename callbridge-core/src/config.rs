//! Client configuration accepted by `create`
//!
//! The host sends these as JSON. Profiles on disk use TOML. Field names
//! follow the SDK's own option names.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::reconnect::ReconnectPolicy;

/// Default delay before a reconnection attempt, in milliseconds
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;
/// Default number of reconnection attempts
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;

/// SDK backend environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

/// Target of an anonymous login
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousLoginOptions {
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
}

/// STUN/TURN server entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Options handed to the SDK client constructor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInitOptions {
    // Authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passwd: Option<String>,
    #[serde(rename = "login_token", default, skip_serializing_if = "Option::is_none")]
    pub login_token: Option<String>,
    #[serde(
        rename = "anonymous_login",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub anonymous_login: Option<AnonymousLoginOptions>,

    // Connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default)]
    pub env: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_reconnect: Option<bool>,

    // WebRTC and media
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ice_servers: Vec<IceServer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefetch_ice_candidates: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_relay_candidate: Option<bool>,

    // Devices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mic_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cam_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cam_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    // Sound files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ringtone_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ringback_file: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user_variables: BTreeMap<String, serde_json::Value>,
}

impl ClientInitOptions {
    /// Credentials login
    pub fn with_credentials(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: Some(login.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    /// Token login
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            login_token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Check that one complete authentication method is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_password = self.password.is_some() || self.passwd.is_some();

        if let Some(login) = &self.login {
            if login.is_empty() {
                return Err(invalid("initOptions.login", "must not be empty"));
            }
            if !has_password {
                return Err(invalid("initOptions.password", "login requires a password"));
            }
            return Ok(());
        }

        if let Some(token) = &self.login_token {
            if token.is_empty() {
                return Err(invalid("initOptions.login_token", "must not be empty"));
            }
            return Ok(());
        }

        if let Some(anonymous) = &self.anonymous_login {
            if anonymous.target_id.is_empty() {
                return Err(invalid(
                    "initOptions.anonymous_login.target_id",
                    "must not be empty",
                ));
            }
            return Ok(());
        }

        Err(invalid(
            "initOptions",
            "one of login/password, login_token or anonymous_login is required",
        ))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn default_true() -> bool {
    true
}

fn default_reconnect_delay() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}

fn default_reconnect_attempts() -> u32 {
    DEFAULT_RECONNECT_ATTEMPTS
}

/// Everything `create` needs to build and supervise one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    #[serde(default)]
    pub init_options: ClientInitOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_reconnect: Option<bool>,
    /// Delay before a reconnection attempt, in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: u64,
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
    #[serde(default)]
    pub auto_answer: bool,
    /// Start with the microphone enabled
    #[serde(default = "default_true")]
    pub audio: bool,
    /// Start with the webcam enabled
    #[serde(default)]
    pub video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_element: Option<String>,
    /// Also reconnect after hangup/destroy/purge
    #[serde(default)]
    pub reconnect_on_explicit_end: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            init_options: ClientInitOptions::default(),
            auto_reconnect: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY_MS,
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            auto_answer: false,
            audio: true,
            video: false,
            local_element: None,
            remote_element: None,
            reconnect_on_explicit_end: false,
        }
    }
}

impl ClientOptions {
    /// Parse options sent by the host
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a TOML profile
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml)?)
    }

    /// Read options from a `.toml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&contents),
            _ => Self::from_json(&contents),
        }
    }

    /// Reconnection policy derived from the flat option fields
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            enabled: self.auto_reconnect.unwrap_or(false),
            max_attempts: self.reconnect_attempts,
            delay: Duration::from_millis(self.reconnect_delay),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.init_options.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn client_options_defaults_match_sdk_defaults() {
        let options = ClientOptions::from_json("{}").unwrap();
        assert_eq!(options.reconnect_delay, 2000);
        assert_eq!(options.reconnect_attempts, 5);
        assert!(options.audio);
        assert!(!options.video);
        assert!(!options.auto_answer);
        assert_eq!(options.init_options.env, Environment::Production);
    }

    #[test]
    fn client_options_parse_host_json() {
        let json = r#"{
            "initOptions": {
                "login_token": "tok-123",
                "env": "development",
                "iceServers": [{ "urls": ["stun:stun.example.com:3478"] }]
            },
            "autoReconnect": true,
            "reconnectDelay": 500,
            "reconnectAttempts": 3,
            "autoAnswer": true,
            "video": true,
            "remoteElement": "remote-media"
        }"#;

        let options = ClientOptions::from_json(json).unwrap();
        assert_eq!(options.init_options.login_token.as_deref(), Some("tok-123"));
        assert_eq!(options.init_options.env, Environment::Development);
        assert_eq!(options.init_options.ice_servers.len(), 1);
        assert!(options.auto_answer);
        assert!(options.video);
        assert_eq!(options.remote_element.as_deref(), Some("remote-media"));

        let policy = options.reconnect_policy();
        assert!(policy.enabled);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(500));
    }

    #[test]
    fn client_options_parse_toml_profile() {
        let toml = r#"
            autoReconnect = true
            reconnectAttempts = 2

            [initOptions]
            login = "alice"
            password = "secret"
            region = "eu"
        "#;

        let options = ClientOptions::from_toml(toml).unwrap();
        assert_eq!(options.init_options.login.as_deref(), Some("alice"));
        assert_eq!(options.reconnect_attempts, 2);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn client_options_from_file_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "autoAnswer = true").unwrap();

        let options = ClientOptions::from_file(file.path()).unwrap();
        assert!(options.auto_answer);
    }

    #[test]
    fn reconnect_disabled_unless_requested() {
        let policy = ClientOptions::default().reconnect_policy();
        assert!(!policy.enabled);
    }

    #[test]
    fn validate_requires_an_auth_method() {
        let options = ClientOptions::default();
        assert!(matches!(
            options.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn validate_rejects_login_without_password() {
        let init = ClientInitOptions {
            login: Some("alice".to_string()),
            ..Default::default()
        };
        assert!(init.validate().is_err());
    }

    #[test]
    fn validate_accepts_each_auth_method() {
        assert!(ClientInitOptions::with_credentials("a", "b").validate().is_ok());
        assert!(ClientInitOptions::with_token("t").validate().is_ok());

        let anonymous = ClientInitOptions {
            anonymous_login: Some(AnonymousLoginOptions {
                target_id: "assistant-1".to_string(),
                target_type: Some("ai_assistant".to_string()),
            }),
            ..Default::default()
        };
        assert!(anonymous.validate().is_ok());
    }

    #[test]
    fn init_options_keep_sdk_field_names() {
        let init = ClientInitOptions {
            login_token: Some("tok".to_string()),
            mic_id: Some("mic-1".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&init).unwrap();
        assert_eq!(json["login_token"], "tok");
        assert_eq!(json["micId"], "mic-1");
        assert_eq!(json["env"], "production");
    }
}
