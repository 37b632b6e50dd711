use super::types::{
    CallbridgeConfig, ClientConfig, ConnectionConfig, DEFAULT_CALLER_NUMBER, DEFAULT_DESTINATION,
    DEFAULT_ELEMENT_ID, DemoConfig, RawCallbridgeConfig, RawClientConfig, RawDemoConfig,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Overrides the project config directory (useful for isolated tests)
pub const PROJECT_CONFIG_DIR_ENV: &str = "CALLBRIDGE_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<CallbridgeConfig> {
        let user_path = Self::user_config_path();
        Self::load_from_paths(user_path.as_deref(), &Self::project_config_path())
    }

    /// Load and merge the given layers; missing files are skipped
    pub fn load_from_paths(user: Option<&Path>, project: &Path) -> Result<CallbridgeConfig> {
        let mut raw = RawCallbridgeConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user
            && let Some(user_config) = Self::read_raw(user_path)?
        {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_raw(project)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<Option<RawCallbridgeConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "callbridge").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    pub fn project_config_path() -> PathBuf {
        match std::env::var(PROJECT_CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir).join("config.toml"),
            Err(_) => PathBuf::from(".callbridge/config.toml"),
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawCallbridgeConfig, overlay: RawCallbridgeConfig) -> RawCallbridgeConfig {
        RawCallbridgeConfig {
            connection: ConnectionConfig {
                host: overlay.connection.host.or(base.connection.host),
                region: overlay.connection.region.or(base.connection.region),
                environment: overlay.connection.environment.or(base.connection.environment),
                login_token: overlay.connection.login_token.or(base.connection.login_token),
            },
            client: RawClientConfig {
                auto_reconnect: overlay.client.auto_reconnect.or(base.client.auto_reconnect),
                reconnect_delay_ms: overlay
                    .client
                    .reconnect_delay_ms
                    .or(base.client.reconnect_delay_ms),
                reconnect_attempts: overlay
                    .client
                    .reconnect_attempts
                    .or(base.client.reconnect_attempts),
                auto_answer: overlay.client.auto_answer.or(base.client.auto_answer),
                audio: overlay.client.audio.or(base.client.audio),
                video: overlay.client.video.or(base.client.video),
                reconnect_on_explicit_end: overlay
                    .client
                    .reconnect_on_explicit_end
                    .or(base.client.reconnect_on_explicit_end),
            },
            demo: RawDemoConfig {
                element_id: overlay.demo.element_id.or(base.demo.element_id),
                destination: overlay.demo.destination.or(base.demo.destination),
                caller_number: overlay.demo.caller_number.or(base.demo.caller_number),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawCallbridgeConfig) -> CallbridgeConfig {
        let defaults = ClientConfig::default();
        CallbridgeConfig {
            connection: raw.connection,
            client: ClientConfig {
                auto_reconnect: raw.client.auto_reconnect.unwrap_or(defaults.auto_reconnect),
                reconnect_delay_ms: raw
                    .client
                    .reconnect_delay_ms
                    .unwrap_or(defaults.reconnect_delay_ms),
                reconnect_attempts: raw
                    .client
                    .reconnect_attempts
                    .unwrap_or(defaults.reconnect_attempts),
                auto_answer: raw.client.auto_answer.unwrap_or(defaults.auto_answer),
                audio: raw.client.audio.unwrap_or(defaults.audio),
                video: raw.client.video.unwrap_or(defaults.video),
                reconnect_on_explicit_end: raw
                    .client
                    .reconnect_on_explicit_end
                    .unwrap_or(defaults.reconnect_on_explicit_end),
            },
            demo: DemoConfig {
                element_id: raw
                    .demo
                    .element_id
                    .unwrap_or_else(|| DEFAULT_ELEMENT_ID.to_string()),
                destination: raw
                    .demo
                    .destination
                    .unwrap_or_else(|| DEFAULT_DESTINATION.to_string()),
                caller_number: raw
                    .demo
                    .caller_number
                    .unwrap_or_else(|| DEFAULT_CALLER_NUMBER.to_string()),
            },
        }
    }
}
