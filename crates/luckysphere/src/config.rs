use crate::events::AppEvent;
use crate::sphere::{DeviceProfile, DisplayMode, PrizeSpec, ProfileError, ProfileOverrides};
use crate::sys::draw::DrawSettings;
use async_channel::Sender;
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub mode: DisplayMode,
    #[serde(default)]
    pub prizes: Vec<PrizeSpec>,
    #[serde(default)]
    pub full: ProfileOverrides,
    #[serde(default)]
    pub compact: ProfileOverrides,
    #[serde(default)]
    pub draw: DrawSettings,
}

impl Config {
    /// The profile for the configured mode with that mode's overrides applied.
    pub fn profile(&self) -> Result<DeviceProfile, ProfileError> {
        let overrides = match self.mode {
            DisplayMode::Full => &self.full,
            DisplayMode::Compact => &self.compact,
        };
        DeviceProfile::select(self.mode)
            .with_overrides(overrides)
            .validated()
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let s = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(s.try_deserialize()?)
    }

    pub fn builtin() -> Self {
        Self::from_toml(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::error!("Built-in config is invalid: {}", e);
            Self::default()
        })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs = ProjectDirs::from("org", "luckysphere", "luckysphere")
        .ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(
            config::Environment::with_prefix("LUCKYSPHERE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(s.try_deserialize()?)
}

/// Loads the user's config, seeding it with the built-in one on first run.
pub fn load_or_setup() -> Config {
    if let Ok(path) = get_config_path()
        && !path.exists()
    {
        match write_default_config() {
            Ok(path) => log::info!("Wrote default config to {}", path.display()),
            Err(e) => log::warn!("Could not write default config: {}", e),
        }
    }

    match load_config() {
        Ok(c) if !c.prizes.is_empty() => c,
        Ok(_) => {
            log::warn!("Config has no prizes, using the built-in catalog");
            Config::builtin()
        }
        Err(e) => {
            log::error!("Failed to load config, using built-in: {}", e);
            Config::builtin()
        }
    }
}

pub fn write_default_config() -> std::io::Result<PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Sends `ConfigReload` whenever the config file is written, created or removed.
pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    if let Err(e) = watch_config(tx).await {
        log::error!("Config watcher stopped: {}", e);
    }
}

async fn watch_config(tx: Sender<AppEvent>) -> Result<(), ConfigError> {
    let config_path = get_config_path()?;
    let Some(config_dir) = config_path.parent().map(PathBuf::from) else {
        return Ok(());
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return Ok(());
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    )?;
    watcher.watch(&config_dir, RecursiveMode::NonRecursive)?;

    while let Ok(res) = bridge_rx.recv().await {
        let event: notify::Event = match res {
            Ok(event) => event,
            Err(e) => {
                log::error!("Watch error: {}", e);
                continue;
            }
        };

        let touches_config = matches!(
            event.kind,
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
        ) && event.paths.iter().any(|p| p == &config_path);

        if touches_config {
            log::debug!("Config file changed");
            if tx.send(AppEvent::ConfigReload).await.is_err() {
                break;
            }
        }
    }

    Ok(())
}
