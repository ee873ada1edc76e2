//! Process configuration (spec.md §6's Environment list), layered with the
//! `config` crate the way the teacher layers its own `system::config`:
//! defaults, an optional file, then environment variables, highest
//! priority last.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulcrumConfig {
    pub database_url: String,
    pub redis_url: String,
    pub vault_key_hex: String,
    pub exchange_timezone: String,
    pub adapter_place_timeout: Duration,
    pub adapter_metadata_timeout: Duration,
    pub run_deadline_parallel: Duration,
    pub run_deadline_staggered: Duration,
    pub webhook_idempotency_window: Duration,
    pub scheduler_tick: Duration,
}

impl Default for FulcrumConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/fulcrum".to_string(),
            redis_url: "redis://localhost:6379".to_string(),
            vault_key_hex: String::new(),
            exchange_timezone: "Asia/Kolkata".to_string(),
            adapter_place_timeout: Duration::from_secs(5),
            adapter_metadata_timeout: Duration::from_secs(2),
            run_deadline_parallel: Duration::from_secs(30),
            run_deadline_staggered: Duration::from_secs(60),
            webhook_idempotency_window: Duration::from_secs(60),
            scheduler_tick: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config load failed: {0}")]
    Load(#[from] config::ConfigError),
}

impl FulcrumConfig {
    /// Loads layered config: built-in defaults, an optional
    /// `fulcrum.toml` file, then `FULCRUM_*` environment variables
    /// (e.g. `FULCRUM_DATABASE_URL`), in ascending priority.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("redis_url", defaults.redis_url)?
            .set_default("vault_key_hex", defaults.vault_key_hex)?
            .set_default("exchange_timezone", defaults.exchange_timezone)?
            .set_default("adapter_place_timeout", 5u64)?
            .set_default("adapter_metadata_timeout", 2u64)?
            .set_default("run_deadline_parallel", 30u64)?
            .set_default("run_deadline_staggered", 60u64)?
            .set_default("webhook_idempotency_window", 60u64)?
            .set_default("scheduler_tick", 1u64)?
            .add_source(config::File::with_name("fulcrum").required(false))
            .add_source(config::Environment::with_prefix("FULCRUM"))
            .build()?;

        Ok(Self {
            database_url: settings.get_string("database_url")?,
            redis_url: settings.get_string("redis_url")?,
            vault_key_hex: settings.get_string("vault_key_hex")?,
            exchange_timezone: settings.get_string("exchange_timezone")?,
            adapter_place_timeout: Duration::from_secs(settings.get_int("adapter_place_timeout")? as u64),
            adapter_metadata_timeout: Duration::from_secs(
                settings.get_int("adapter_metadata_timeout")? as u64,
            ),
            run_deadline_parallel: Duration::from_secs(settings.get_int("run_deadline_parallel")? as u64),
            run_deadline_staggered: Duration::from_secs(
                settings.get_int("run_deadline_staggered")? as u64,
            ),
            webhook_idempotency_window: Duration::from_secs(
                settings.get_int("webhook_idempotency_window")? as u64,
            ),
            scheduler_tick: Duration::from_secs(settings.get_int("scheduler_tick")? as u64),
        })
    }

    pub fn exchange_tz(&self) -> chrono_tz::Tz {
        self.exchange_timezone.parse().unwrap_or(chrono_tz::Asia::Kolkata)
    }
}
