use callbridge_core::config::{DEFAULT_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY_MS};
use callbridge_core::{ClientInitOptions, ClientOptions, Environment};
use serde::{Deserialize, Serialize};

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCallbridgeConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub client: RawClientConfig,

    #[serde(default)]
    pub demo: RawDemoConfig,
}

/// Client defaults as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawClientConfig {
    pub auto_reconnect: Option<bool>,
    pub reconnect_delay_ms: Option<u64>,
    pub reconnect_attempts: Option<u32>,
    pub auto_answer: Option<bool>,
    pub audio: Option<bool>,
    pub video: Option<bool>,
    pub reconnect_on_explicit_end: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawDemoConfig {
    pub element_id: Option<String>,
    pub destination: Option<String>,
    pub caller_number: Option<String>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CallbridgeConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub demo: DemoConfig,
}

impl CallbridgeConfig {
    /// Client options for one element built from these defaults
    pub fn client_options(&self) -> ClientOptions {
        let init_options = ClientInitOptions {
            login_token: self.connection.login_token.clone(),
            host: self.connection.host.clone(),
            region: self.connection.region.clone(),
            env: self.connection.environment.unwrap_or_default(),
            ..Default::default()
        };

        ClientOptions {
            init_options,
            auto_reconnect: Some(self.client.auto_reconnect),
            reconnect_delay: self.client.reconnect_delay_ms,
            reconnect_attempts: self.client.reconnect_attempts,
            auto_answer: self.client.auto_answer,
            audio: self.client.audio,
            video: self.client.video,
            reconnect_on_explicit_end: self.client.reconnect_on_explicit_end,
            ..Default::default()
        }
    }
}

/// Where and as whom clients connect
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionConfig {
    /// Signaling host override
    pub host: Option<String>,

    pub region: Option<String>,

    pub environment: Option<Environment>,

    /// JWT used for token login
    pub login_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub auto_reconnect: bool,
    pub reconnect_delay_ms: u64,
    pub reconnect_attempts: u32,
    pub auto_answer: bool,
    pub audio: bool,
    pub video: bool,
    pub reconnect_on_explicit_end: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: false,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            auto_answer: false,
            audio: true,
            video: false,
            reconnect_on_explicit_end: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Element id the demo mounts its client on
    pub element_id: String,

    /// Number dialed by the outbound part of the demo
    pub destination: String,

    /// Caller shown for the simulated inbound call
    pub caller_number: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            element_id: DEFAULT_ELEMENT_ID.to_string(),
            destination: DEFAULT_DESTINATION.to_string(),
            caller_number: DEFAULT_CALLER_NUMBER.to_string(),
        }
    }
}

pub const DEFAULT_ELEMENT_ID: &str = "phone";
pub const DEFAULT_DESTINATION: &str = "1000";
pub const DEFAULT_CALLER_NUMBER: &str = "+15550100";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = CallbridgeConfig::default();
        assert!(!config.client.auto_reconnect);
        assert_eq!(config.client.reconnect_delay_ms, 2000);
        assert_eq!(config.client.reconnect_attempts, 5);
        assert!(config.client.audio);
        assert!(!config.client.video);
        assert_eq!(config.demo.element_id, "phone");
        assert!(config.connection.login_token.is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CallbridgeConfig {
            connection: ConnectionConfig {
                host: Some("rtc.example.com".to_string()),
                login_token: Some("jwt".to_string()),
                ..Default::default()
            },
            client: ClientConfig {
                auto_reconnect: true,
                reconnect_attempts: 2,
                ..Default::default()
            },
            demo: DemoConfig::default(),
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: CallbridgeConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.connection.host.as_deref(), Some("rtc.example.com"));
        assert!(parsed.client.auto_reconnect);
        assert_eq!(parsed.client.reconnect_attempts, 2);
    }

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[client]
auto_answer = true
"#;
        let raw: RawCallbridgeConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(raw.client.auto_answer, Some(true));
        assert!(raw.client.auto_reconnect.is_none());
        assert!(raw.demo.element_id.is_none());
    }

    #[test]
    fn test_client_options_carry_defaults() {
        let config = CallbridgeConfig {
            connection: ConnectionConfig {
                login_token: Some("jwt".to_string()),
                ..Default::default()
            },
            client: ClientConfig {
                auto_reconnect: true,
                auto_answer: true,
                reconnect_delay_ms: 50,
                ..Default::default()
            },
            ..Default::default()
        };

        let options = config.client_options();

        assert_eq!(options.init_options.login_token.as_deref(), Some("jwt"));
        assert!(options.auto_answer);
        assert!(options.reconnect_policy().enabled);
        assert_eq!(options.reconnect_delay, 50);
        assert!(options.validate().is_ok());
    }
}
