//! Application configuration.

use crate::error::{AppError, AppResult};
use ::config::{Config, Environment, File, FileFormat};
use mmhedge_core::{InstrumentSpec, OpeningState, Price, Size};
use mmhedge_engine::EngineConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix for environment overrides, e.g. `MMHEDGE_ENGINE__MAKER_FEE=0.0001`.
pub const ENV_PREFIX: &str = "MMHEDGE";

/// What the runner does when the engine rejects a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log, leave the book flat, and continue with the next event.
    #[default]
    Skip,
    /// Stop the session and return the error.
    Halt,
}

/// Event source and order sink of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// JSON-lines file of snapshots and fill reports.
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
    /// Where submitted orders are written. Stdout when unset.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// Sleep one tick interval after every snapshot.
    #[serde(default)]
    pub realtime: bool,
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("demos/sample_session.jsonl")
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
            output_path: None,
            realtime: false,
            on_error: ErrorPolicy::default(),
        }
    }
}

/// Top-level configuration of one quoting session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Market label used in logs and metrics.
    #[serde(default = "default_market")]
    pub market: String,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Account state when quoting starts.
    pub opening: OpeningState,
    #[serde(default = "default_instrument")]
    pub instrument: InstrumentSpec,
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_market() -> String {
    "PERP".to_string()
}

fn default_instrument() -> InstrumentSpec {
    InstrumentSpec {
        tick_size: Price::new(Decimal::new(1, 2)),
        lot_size: Size::new(Decimal::new(1, 3)),
    }
}

impl AppConfig {
    /// Load from a TOML file, then apply `MMHEDGE_*` environment overrides.
    pub fn load(path: &str) -> AppResult<Self> {
        let settings = Config::builder()
            .add_source(File::new(path, FileFormat::Toml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Config(format!("Failed to load config: {e}")))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without environment overrides.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.market.trim().is_empty() {
            return Err(AppError::Config("market must not be empty".to_string()));
        }
        if self.instrument.tick_size.inner() <= Decimal::ZERO {
            return Err(AppError::Config(format!(
                "instrument.tick_size must be positive, got {}",
                self.instrument.tick_size
            )));
        }
        if self.instrument.lot_size.inner() <= Decimal::ZERO {
            return Err(AppError::Config(format!(
                "instrument.lot_size must be positive, got {}",
                self.instrument.lot_size
            )));
        }
        self.engine.validate()?;
        Ok(())
    }
}
