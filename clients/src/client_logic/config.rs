use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lib_abacus::feeds::{ResourcesConfig, StandingsFeedConfig};
use lib_abacus::transport::SessionConfig;
use lib_abacus::{ClientSettings, ColumnLayout};

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Abacus contest client", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "ABACUS_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "ABACUS_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "ABACUS_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "ABACUS_SERVER_URL", help = "WebSocket URL of the Abacus server's message bus.")]
    pub server_url: Option<String>,

    #[clap(long, env = "ABACUS_USER", help = "User for automatic authentication; 'nologin' disables it.")]
    pub user: Option<String>,

    #[clap(long, env = "ABACUS_PASSWORD", help = "Password for automatic authentication.")]
    pub password: Option<String>,

    #[clap(long, env = "ABACUS_RECONNECT_DELAY_MS", help = "Delay in milliseconds before reconnecting a lost session.")]
    pub reconnect_delay_ms: Option<u64>,

    #[clap(long, env = "ABACUS_TICK_MS", help = "Countdown tick period in milliseconds.")]
    pub tick_ms: Option<u64>,

    #[clap(long, env = "ABACUS_NETWORK_LAG_MS", help = "Known delay in milliseconds between server and client.")]
    pub network_lag_ms: Option<i64>,

    #[clap(long, env = "ABACUS_STANDINGS_URL", help = "URL of the tab-separated standings resource.")]
    pub standings_url: Option<String>,

    #[clap(long, env = "ABACUS_STANDINGS_LAYOUT", help = "Column layout of the standings resource (positional, tagged).")]
    pub standings_layout: Option<String>,

    #[clap(long, env = "ABACUS_CONTESTANTS_ONLY", help = "Leave non-contestants out of the standings board.")]
    pub contestants_only: Option<bool>,

    #[clap(long, env = "ABACUS_STANDINGS_INTERVAL_SECONDS", help = "Seconds between standings polls.")]
    pub standings_interval_seconds: Option<u64>,

    #[clap(long, env = "ABACUS_STANDINGS_OUTPUT", help = "File the rendered standings table is written to.")]
    pub standings_output: Option<PathBuf>,

    #[clap(long, env = "ABACUS_RESOURCES_URL", help = "URL of the resources page; unset disables polling.")]
    pub resources_url: Option<String>,

    #[clap(long, env = "ABACUS_RESOURCES_INTERVAL_SECONDS", help = "Seconds between resources polls.")]
    pub resources_interval_seconds: Option<u64>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            server_url: other.server_url.or(self.server_url),
            user: other.user.or(self.user),
            password: other.password.or(self.password),
            reconnect_delay_ms: other.reconnect_delay_ms.or(self.reconnect_delay_ms),
            tick_ms: other.tick_ms.or(self.tick_ms),
            network_lag_ms: other.network_lag_ms.or(self.network_lag_ms),
            standings_url: other.standings_url.or(self.standings_url),
            standings_layout: other.standings_layout.or(self.standings_layout),
            contestants_only: other.contestants_only.or(self.contestants_only),
            standings_interval_seconds: other.standings_interval_seconds.or(self.standings_interval_seconds),
            standings_output: other.standings_output.or(self.standings_output),
            resources_url: other.resources_url.or(self.resources_url),
            resources_interval_seconds: other.resources_interval_seconds.or(self.resources_interval_seconds),
        }
    }

    /// Built-in values every later layer may override.
    pub fn defaults() -> Config {
        Config {
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            server_url: Some("ws://localhost:7368/cometd".to_string()),
            reconnect_delay_ms: Some(5000),
            tick_ms: Some(1000),
            network_lag_ms: Some(0),
            standings_url: Some("http://localhost:8080/standings.txt".to_string()),
            standings_layout: Some("tagged".to_string()),
            contestants_only: Some(true),
            standings_interval_seconds: Some(5),
            standings_output: Some(PathBuf::from("standings.html")),
            resources_interval_seconds: Some(15),
            ..Default::default()
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_level(&self) -> String {
        self.log_level.clone().unwrap_or_else(|| "info".to_string())
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            auto_user: self.user.clone(),
            auto_pass: self.password.clone(),
            network_lag_ms: self.network_lag_ms.unwrap_or(0),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            url: self.server_url.clone().unwrap_or(defaults.url),
            reconnect_delay: self
                .reconnect_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.reconnect_delay),
            tick_interval: self.tick_ms.map(Duration::from_millis).unwrap_or(defaults.tick_interval),
        }
    }

    /// Standings board settings. An unknown layout name falls back to the
    /// default layout with a warning.
    pub fn standings_feed_config(&self) -> StandingsFeedConfig {
        let defaults = StandingsFeedConfig::default();
        let layout = match self.standings_layout.as_deref().map(str::parse::<ColumnLayout>) {
            Some(Ok(layout)) => layout,
            Some(Err(e)) => {
                log::warn!("{}; using the default layout", e);
                defaults.layout
            }
            None => defaults.layout,
        };
        StandingsFeedConfig {
            url: self.standings_url.clone().unwrap_or(defaults.url),
            layout,
            contestants_only: self.contestants_only.unwrap_or(defaults.contestants_only),
            interval: self
                .standings_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            output: self.standings_output.clone().unwrap_or(defaults.output),
        }
    }

    /// Resources poller settings, `None` when no URL is configured.
    pub fn resources_config(&self) -> Option<ResourcesConfig> {
        let url = self.resources_url.clone()?;
        let defaults = ResourcesConfig::default();
        Some(ResourcesConfig {
            url,
            interval: self
                .resources_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
        })
    }
}

/// Reads a JSON config file, logging and skipping it when unusable.
fn read_config_file(path: &Path) -> Option<Config> {
    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Failed to read config file {}: {}. Falling back to other sources.", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str::<Config>(&config_str) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Failed to parse config file {}: {}. Falling back to other sources.", path.display(), e);
            None
        }
    }
}

/// Locates the config file: the explicit path, else the working directory,
/// else the user's config directory.
fn find_config_file(explicit: Option<PathBuf>, file_name: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path);
    }
    let local = PathBuf::from(file_name);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("abacus").join(file_name))
        .filter(|p| p.exists())
}

/// Layers defaults, the config file and environment/CLI values.
pub fn load_config(file_name: &str) -> Config {
    // .env values become environment variables before clap reads them.
    let _ = dotenvy::dotenv();

    let cli_args = Config::parse();
    layer(Config::defaults(), cli_args, file_name)
}

fn layer(defaults: Config, cli_args: Config, file_name: &str) -> Config {
    let mut current_config = defaults;

    match find_config_file(cli_args.config_path.clone(), file_name) {
        Some(path) if path.exists() => {
            if let Some(file_config) = read_config_file(&path) {
                current_config = current_config.merge(file_config);
            }
        }
        Some(path) => log::info!("Config file not found at {}. Using defaults and environment/CLI variables.", path.display()),
        None => log::info!("No {} found. Using defaults and environment/CLI variables.", file_name),
    }

    current_config.merge(cli_args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_layers_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abacus_client.conf");
        fs::write(&path, r#"{"serverUrl":"ws://file/cometd","user":"alice","tickMs":500}"#).unwrap();

        let cli = Config {
            config_path: Some(path),
            user: Some("bob".to_string()),
            ..Default::default()
        };
        let config = layer(Config::defaults(), cli, "abacus_client.conf");

        assert_eq!(config.server_url.as_deref(), Some("ws://file/cometd"));
        assert_eq!(config.user.as_deref(), Some("bob"));
        assert_eq!(config.session_config().tick_interval, Duration::from_millis(500));
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn broken_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.conf");
        fs::write(&path, "{ not json").unwrap();
        let cli = Config {
            config_path: Some(path),
            ..Default::default()
        };
        let config = layer(Config::defaults(), cli.clone(), "broken.conf");
        assert_eq!(config, Config::defaults().merge(cli));
    }

    #[test]
    fn derived_settings() {
        let config = Config {
            standings_layout: Some("sideways".to_string()),
            resources_url: Some("http://r/".to_string()),
            ..Config::defaults()
        };
        assert_eq!(config.standings_feed_config().layout, ColumnLayout::Tagged);
        assert_eq!(config.resources_config().unwrap().interval, Duration::from_secs(15));
        assert!(Config::defaults().resources_config().is_none());
        assert_eq!(config.client_settings().network_lag_ms, 0);
    }
}
