use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gridstash_core::GridSize;
use gridstash_inventory::OverflowPolicy;
use gridstash_server::{ServerSettings, StarterContainer};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/server.toml";
const DEFAULT_CATALOG_PATH: &str = "config/items.json";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Host ticks per second.
    pub tick_rate_hz: u32,
    /// Ticks between full resyncs; 0 turns them off.
    pub resync_interval_ticks: u64,
    /// JSON item pack.
    pub catalog_path: PathBuf,
    pub overflow_policy: OverflowPolicy,
    /// Directory for `requests.jsonl`; logging is off when unset.
    pub request_log_dir: Option<PathBuf>,
    pub starter_container: Option<StarterContainerConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StarterContainerConfig {
    pub container_type: String,
    pub width: u32,
    pub height: u32,
}

impl Default for StarterContainerConfig {
    fn default() -> Self {
        let starter = StarterContainer::default();
        Self {
            container_type: starter.container_type,
            width: starter.size.width,
            height: starter.size.height,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 25570)),
            tick_rate_hz: 20,
            resync_interval_ticks: ServerSettings::default().resync_interval_ticks,
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            overflow_policy: OverflowPolicy::default(),
            request_log_dir: None,
            starter_container: Some(StarterContainerConfig::default()),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `path`, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ServerConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    ServerConfig::default()
                }
            },
            Err(err) => {
                if err.kind() == std::io::ErrorKind::NotFound {
                    warn!("Server config not found at {}. Using defaults", path.display());
                } else {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                ServerConfig::default()
            }
        }
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self).context("Failed to serialize server config")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Host settings derived from this config. Degenerate starter sizes are
    /// dropped with a warning.
    pub fn server_settings(&self) -> ServerSettings {
        let starter_container = self.starter_container.as_ref().and_then(|starter| {
            if starter.width == 0 || starter.height == 0 {
                warn!(
                    "Ignoring starter container '{}' with size {}x{}",
                    starter.container_type, starter.width, starter.height
                );
                return None;
            }
            Some(StarterContainer {
                size: GridSize::new(starter.width, starter.height),
                container_type: starter.container_type.clone(),
            })
        });

        ServerSettings {
            resync_interval_ticks: self.resync_interval_ticks,
            overflow_policy: self.overflow_policy,
            starter_container,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ServerConfig::load_from_path(&dir.path().join("absent.toml"));
        assert_eq!(cfg, ServerConfig::default());
        assert_eq!(cfg.tick_rate_hz, 20);
        assert_eq!(cfg.resync_interval_ticks, 300);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        fs::write(
            &path,
            "bind_addr = \"127.0.0.1:4000\"\noverflow_policy = \"spread_across_empty_slots\"\n",
        )
        .unwrap();

        let cfg = ServerConfig::load_from_path(&path);
        assert_eq!(cfg.bind_addr, "127.0.0.1:4000".parse().unwrap());
        assert_eq!(cfg.overflow_policy, OverflowPolicy::SpreadAcrossEmptySlots);
        assert_eq!(cfg.tick_rate_hz, 20);
        assert_eq!(cfg.catalog_path, PathBuf::from(DEFAULT_CATALOG_PATH));
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        fs::write(&path, "tick_rate_hz = \"fast\"").unwrap();
        assert_eq!(ServerConfig::load_from_path(&path), ServerConfig::default());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/server.toml");
        let cfg = ServerConfig {
            resync_interval_ticks: 0,
            request_log_dir: Some(PathBuf::from("logs")),
            starter_container: None,
            ..ServerConfig::default()
        };
        cfg.save_to_path(&path).unwrap();
        assert_eq!(ServerConfig::load_from_path(&path), cfg);
    }

    #[test]
    fn settings_follow_config() {
        let cfg = ServerConfig {
            resync_interval_ticks: 40,
            starter_container: Some(StarterContainerConfig {
                container_type: "Satchel".into(),
                width: 3,
                height: 3,
            }),
            ..ServerConfig::default()
        };
        let settings = cfg.server_settings();
        assert_eq!(settings.resync_interval_ticks, 40);
        let starter = settings.starter_container.unwrap();
        assert_eq!(starter.container_type, "Satchel");
        assert_eq!(starter.size, GridSize::new(3, 3));

        let degenerate = ServerConfig {
            starter_container: Some(StarterContainerConfig {
                container_type: "Flat".into(),
                width: 0,
                height: 2,
            }),
            ..ServerConfig::default()
        };
        assert!(degenerate.server_settings().starter_container.is_none());
    }
}
