//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Ledger and booking policy configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Domain event channel configuration.
    #[serde(default)]
    pub events: EventsConfig,
}

/// Ledger and booking policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Days until a newly created receivable falls due.
    #[serde(default = "default_due_days")]
    pub default_due_days: u32,
    /// Minimum lead time (in days) for a booking modification request.
    #[serde(default = "default_modification_cutoff_days")]
    pub modification_cutoff_days: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_due_days: default_due_days(),
            modification_cutoff_days: default_modification_cutoff_days(),
        }
    }
}

fn default_due_days() -> u32 {
    30
}

fn default_modification_cutoff_days() -> i64 {
    2
}

/// Domain event channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Capacity of the broadcast channel carrying domain events.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    256
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TRAVESIA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            events: EventsConfig::default(),
        }
    }
}
