use crate::errors::ConfigError;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Smallest read chunk the poller will use
pub const MIN_READ_CHUNK: usize = 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MudConfig {
    pub server: ServerConfig,
    pub mssp: MsspConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub max_connections: usize,
    /// Connections accepted per tick; bursts larger than this wait for later ticks
    pub accept_per_tick: usize,
    pub read_chunk_size: usize,
    pub liveness_interval_secs: u64,
    pub tick_interval_ms: u64,
    /// Queued outbound bytes allowed before a slow client is dropped
    pub max_output_buffer: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsspConfig {
    pub name: String,
    /// Additional variables sent after PLAYERS, UPTIME and NAME
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub color_enabled: bool,
    pub wrap_width: usize,
    pub default_width: u16,
    pub default_height: u16,
    pub max_line_length: usize,
    pub max_subnegotiation_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 4000,
            max_connections: 64,
            accept_per_tick: 1,
            read_chunk_size: MIN_READ_CHUNK,
            liveness_interval_secs: 5,
            tick_interval_ms: 200,
            max_output_buffer: 1024 * 1024,
        }
    }
}

impl Default for MsspConfig {
    fn default() -> Self {
        Self {
            name: "WeeMud".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            color_enabled: true,
            wrap_width: 80,
            default_width: 100,
            default_height: 30,
            max_line_length: telnet_framing::parser::DEFAULT_MAX_LINE_LENGTH,
            max_subnegotiation_length: telnet_framing::parser::DEFAULT_MAX_SUBNEGOTIATION_LENGTH,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.liveness_interval_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn read_chunk(&self) -> usize {
        self.read_chunk_size.max(MIN_READ_CHUNK)
    }
}

impl MudConfig {
    /// Load configuration, writing a default file when none exists
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::parse_config(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let default_config = Self::default();
                if let Err(e) = default_config.save_to_file(path) {
                    warn!("Could not create default config file: {}", e);
                }
                Ok(default_config)
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn parse_config(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = format!(
            "# WeeMUD configuration file\n# Lines starting with # are comments\n\n{}",
            toml::to_string_pretty(self)?
        );
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MudConfig::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.accept_per_tick, 1);
        assert_eq!(config.server.liveness_interval(), Duration::from_secs(5));
        assert_eq!(config.mssp.name, "WeeMud");
        assert!(config.client.color_enabled);
        assert_eq!(config.client.wrap_width, 80);
        assert_eq!((config.client.default_height, config.client.default_width), (30, 100));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = MudConfig::parse_config(
            r#"
[server]
port = 23

[mssp]
name = "Tiny"

[mssp.extra]
CODEBASE = "weemud"
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 23);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.mssp.name, "Tiny");
        assert_eq!(config.mssp.extra.get("CODEBASE").map(String::as_str), Some("weemud"));
        assert_eq!(config.client, ClientConfig::default());
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let result = MudConfig::parse_config("[server]\nport = \"four thousand\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_read_chunk_has_a_floor() {
        let server = ServerConfig {
            read_chunk_size: 16,
            ..ServerConfig::default()
        };
        assert_eq!(server.read_chunk(), MIN_READ_CHUNK);
    }

    #[test]
    fn test_missing_file_writes_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weemud.toml");

        let config = MudConfig::load_from_file(&path).unwrap();
        assert_eq!(config, MudConfig::default());
        assert!(path.exists());

        let reloaded = MudConfig::load_from_file(&path).unwrap();
        assert_eq!(reloaded, config);
    }
}
