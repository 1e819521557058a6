//! Bot configuration from the environment or a TOML file.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

use crate::classifier::DEFAULT_FRESHNESS_LIMIT_SECONDS;
use crate::tournament::UserId;

/// Default upper bound on tournament length (24 hours).
pub const DEFAULT_MAX_TOURNAMENT_DURATION_MINUTES: u32 = 1440;

/// Default backup file.
pub const DEFAULT_BACKUP_PATH: &str = "tournaments_backup.json";

/// Runtime settings for the jackpot bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct BotConfig {
    /// User allowed to run admin commands; `None` disables them.
    admin_identity: Option<UserId>,
    /// Longest tournament an admin may request, in minutes.
    max_tournament_duration_minutes: u32,
    /// Oldest message age still counted, in seconds.
    freshness_limit_seconds: u64,
    /// Whether inbound events are processed at startup.
    bot_active: bool,
    /// Where backups are written and restored from.
    backup_path: PathBuf,
    /// Default log filter when `RUST_LOG` is unset.
    log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            admin_identity: None,
            max_tournament_duration_minutes: DEFAULT_MAX_TOURNAMENT_DURATION_MINUTES,
            freshness_limit_seconds: DEFAULT_FRESHNESS_LIMIT_SECONDS,
            bot_active: true,
            backup_path: PathBuf::from(DEFAULT_BACKUP_PATH),
            log_level: "info".to_string(),
        }
    }
}

impl BotConfig {
    /// Sets the admin, treating `0` as unset.
    pub fn with_admin(mut self, admin: Option<UserId>) -> Self {
        self.admin_identity = admin.filter(|id| *id != 0);
        self
    }

    /// Sets the maximum tournament duration.
    pub fn with_max_tournament_duration(mut self, minutes: u32) -> Self {
        self.max_tournament_duration_minutes = minutes;
        self
    }

    /// Sets the freshness limit.
    pub fn with_freshness_limit(mut self, seconds: u64) -> Self {
        self.freshness_limit_seconds = seconds;
        self
    }

    /// Sets whether events are processed at startup.
    pub fn with_bot_active(mut self, active: bool) -> Self {
        self.bot_active = active;
        self
    }

    /// Sets the backup file.
    pub fn with_backup_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup_path = path.into();
        self
    }

    /// Reads `ADMIN_IDENTITY`, `MAX_TOURNAMENT_DURATION_MINUTES`,
    /// `FRESHNESS_LIMIT_SECONDS`, `BOT_ACTIVE`, `BACKUP_PATH` and `LOG_LEVEL`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set but unparsable, or the
    /// resulting config is invalid.
    #[instrument]
    pub fn from_env() -> Result<Self, ConfigError> {
        debug!("Loading config from environment");
        let mut config = Self::default();

        if let Some(admin) = env_var::<UserId>("ADMIN_IDENTITY")? {
            config = config.with_admin(Some(admin));
        }
        if let Some(minutes) = env_var("MAX_TOURNAMENT_DURATION_MINUTES")? {
            config.max_tournament_duration_minutes = minutes;
        }
        if let Some(seconds) = env_var("FRESHNESS_LIMIT_SECONDS")? {
            config.freshness_limit_seconds = seconds;
        }
        if let Some(raw) = env_var::<String>("BOT_ACTIVE")? {
            config.bot_active = parse_flag(&raw).ok_or_else(|| {
                ConfigError::new(format!("BOT_ACTIVE must be a boolean, got '{}'", raw))
            })?;
        }
        if let Some(path) = env_var::<PathBuf>("BACKUP_PATH")? {
            config.backup_path = path;
        }
        if let Some(level) = env_var("LOG_LEVEL")? {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file; missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        let admin = config.admin_identity;
        let config = config.with_admin(admin);

        config.validate()?;
        info!("Config loaded successfully");
        Ok(config)
    }

    /// Checks ranges and warns when admin commands are disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the maximum duration is zero.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tournament_duration_minutes == 0 {
            return Err(ConfigError::new(
                "MAX_TOURNAMENT_DURATION_MINUTES must be at least 1".to_string(),
            ));
        }
        if self.admin_identity.is_none() {
            warn!("ADMIN_IDENTITY not set, admin commands are disabled");
        }
        Ok(())
    }
}

fn env_var<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::new(format!("Invalid {}: {}", name, e))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::new(format!("Invalid {}: {}", name, e))),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_zero_admin_disables() {
        let config = BotConfig::default().with_admin(Some(0));
        assert_eq!(*config.admin_identity(), None);
    }
}
