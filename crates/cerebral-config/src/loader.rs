use std::path::{Path, PathBuf};
use tracing::{info, warn};

use cerebral_core::{CerebralError, Result};

use crate::schema::CerebralConfig;

/// Loads the Cerebral configuration once at startup.
///
/// Service base paths are fixed for the life of the process, so there is no
/// reload; construct a new loader to pick up changes.
#[derive(Debug)]
pub struct ConfigLoader {
    config: CerebralConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > CEREBRAL_CONFIG env > ~/.cerebral/cerebral.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("CEREBRAL_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cerebral")
            .join("cerebral.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            Self::parse(&raw, &config_path)?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            CerebralConfig::default()
        };

        let config = Self::apply_env_overrides(config);
        Self::check(&config)?;

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Build a loader from an in-memory TOML document.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config_path = PathBuf::from("<inline>");
        let config = Self::parse(raw, &config_path)?;
        Self::check(&config)?;
        Ok(Self {
            config,
            config_path,
        })
    }

    /// Get a snapshot of the config.
    pub fn get(&self) -> CerebralConfig {
        self.config.clone()
    }

    /// Path the config was (or would have been) read from.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    fn parse(raw: &str, path: &Path) -> Result<CerebralConfig> {
        toml::from_str::<CerebralConfig>(raw).map_err(|e| {
            CerebralError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    // Log warnings, fail on errors
    fn check(config: &CerebralConfig) -> Result<()> {
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
                Ok(())
            }
            Err(e) => Err(CerebralError::Config(e)),
        }
    }

    /// Apply env var overrides (CEREBRAL_MEMORY_URL, CEREBRAL_USER_ID, etc.)
    fn apply_env_overrides(mut config: CerebralConfig) -> CerebralConfig {
        if let Ok(v) = std::env::var("CEREBRAL_MEMORY_URL") {
            config.memory.base_url = v;
        }
        if let Ok(v) = std::env::var("CEREBRAL_CONVERSATION_URL") {
            config.conversation.base_url = v;
        }
        if let Ok(v) = std::env::var("CEREBRAL_USER_ID") {
            config.user.user_id = v;
        }
        if let Ok(v) = std::env::var("CEREBRAL_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Ok(v) = std::env::var("CEREBRAL_REFRESH_SECS") {
            match v.parse::<u64>() {
                Ok(secs) => config.conversation.refresh_interval_secs = secs,
                Err(_) => warn!(value = %v, "ignoring non-numeric CEREBRAL_REFRESH_SECS"),
            }
        }
        config
    }
}
