use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "hub-server", about = "Sensor hub: ingest, retain, serve")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Запустить hub
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Путь к TOML конфиг файлу
    #[arg(long, default_value = "config.toml", env = "CONFIG_PATH")]
    pub config: String,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Порт feed ingress'а (publisher'ы подключаются сюда).
    #[serde(default = "default_feed_port")]
    pub feed_port: u16,
    /// Порт HTTP read API.
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Путь к snapshot файлу.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Период автосохранения snapshot'а, секунды.
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,
    /// Ёмкость history log'а.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_feed_port() -> u16 {
    1883
}
fn default_api_port() -> u16 {
    5000
}
fn default_snapshot_path() -> String {
    "hub_data.json".into()
}
fn default_snapshot_interval_secs() -> u64 {
    30
}
fn default_history_capacity() -> usize {
    100
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self, crate::error::ServerError> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::error::ServerError::Config {
            context: "read",
            detail: format!("'{path}': {e}"),
        })?;
        toml::from_str(&content).map_err(|e| crate::error::ServerError::Config {
            context: "parse",
            detail: format!("'{path}': {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.feed_port, 1883);
        assert_eq!(config.api_port, 5000);
        assert_eq!(config.snapshot_path, "hub_data.json");
        assert_eq!(config.snapshot_interval_secs, 30);
        assert_eq!(config.history_capacity, 100);
    }

    #[test]
    fn fields_override_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            feed_port = 9883
            api_port = 8080
            snapshot_path = "/var/lib/hub/data.json"
            snapshot_interval_secs = 5
            history_capacity = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.feed_port, 9883);
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.snapshot_path, "/var/lib/hub/data.json");
        assert_eq!(config.snapshot_interval_secs, 5);
        assert_eq!(config.history_capacity, 500);
    }
}
