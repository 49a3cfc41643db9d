use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, mapped from `cerebral.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CerebralConfig {
    pub user: UserConfig,
    pub memory: MemoryConfig,
    pub conversation: ConversationConfig,
    pub logging: LoggingConfig,
}

// ── User ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Placeholder identity sent with every request. There is no authentication.
    pub user_id: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            user_id: "default_user".into(),
        }
    }
}

// ── Memory service ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Base URL of the memory API; `search`, `add`, `delete`, and `stats` hang off it.
    pub base_url: String,
    /// Result limit sent with every search.
    pub search_limit: u32,
    /// SQLite file holding memories authored while the backend was unreachable.
    /// `None` resolves to `~/.cerebral/local_memories.db`.
    pub local_store_path: Option<PathBuf>,
    /// Number of demo memories synthesized per branch in degraded mode.
    pub fallback_sample_size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001/api/memory".into(),
            search_limit: 50,
            local_store_path: None,
            fallback_sample_size: 3,
        }
    }
}

impl MemoryConfig {
    pub fn resolved_local_store_path(&self) -> PathBuf {
        self.local_store_path.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".cerebral")
                .join("local_memories.db")
        })
    }
}

// ── Conversation service ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Base URL under which the `conversation/...` routes live.
    pub base_url: String,
    /// Seconds between session reconciliation sweeps.
    pub refresh_interval_secs: u64,
    /// `message_type` sent with every turn.
    pub message_type: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001/api".into(),
            refresh_interval_secs: 30,
            message_type: "user".into(),
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A single config validation issue.
#[derive(Debug)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let icon = match self.severity {
            WarningSeverity::Error => "❌",
            WarningSeverity::Warning => "⚠️ ",
            WarningSeverity::Info => "💡",
        };
        write!(f, "{} {}: {}", icon, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

fn check_base_url(field: &str, value: &str, warnings: &mut Vec<ConfigWarning>) {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        Ok(parsed) => warnings.push(ConfigWarning {
            field: field.into(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
            severity: WarningSeverity::Error,
            hint: Some("Use an http:// or https:// URL".into()),
        }),
        Err(e) => warnings.push(ConfigWarning {
            field: field.into(),
            message: format!("'{}' is not a valid URL: {}", value, e),
            severity: WarningSeverity::Error,
            hint: Some("e.g. http://localhost:8001/api/memory".into()),
        }),
    }
}

impl CerebralConfig {
    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Service URLs ───
        check_base_url("memory.base_url", &self.memory.base_url, &mut warnings);
        check_base_url("conversation.base_url", &self.conversation.base_url, &mut warnings);

        // ── User ───
        if self.user.user_id.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "user.user_id".into(),
                message: "user_id is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to any placeholder, e.g. 'default_user'".into()),
            });
        }

        // ── Memory ───
        if self.memory.search_limit == 0 {
            warnings.push(ConfigWarning {
                field: "memory.search_limit".into(),
                message: "search_limit is 0, so searches would return nothing".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 50".into()),
            });
        }
        if self.memory.fallback_sample_size == 0 {
            warnings.push(ConfigWarning {
                field: "memory.fallback_sample_size".into(),
                message: "degraded mode will show empty branches".into(),
                severity: WarningSeverity::Warning,
                hint: Some("The default is 3".into()),
            });
        }

        // ── Conversation ───
        if self.conversation.refresh_interval_secs == 0 {
            warnings.push(ConfigWarning {
                field: "conversation.refresh_interval_secs".into(),
                message: "refresh interval must be at least 1 second".into(),
                severity: WarningSeverity::Error,
                hint: None,
            });
        } else if self.conversation.refresh_interval_secs < 5 {
            warnings.push(ConfigWarning {
                field: "conversation.refresh_interval_secs".into(),
                message: format!(
                    "refreshing every {}s is aggressive",
                    self.conversation.refresh_interval_secs
                ),
                severity: WarningSeverity::Info,
                hint: Some("The default is 30".into()),
            });
        }

        // ── Logging format ───
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        // ── Logging level ───
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_levels.join(", "))),
            });
        }

        // Check for hard errors
        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
