//! Engine configuration for the cadence audio path.
//!
//! Everything the driver must know before the first callback (sample rate,
//! block size, pool shape, MIDI batch size) lives in one TOML file that is
//! loaded, validated and turned into the core's [`PoolConfig`].
//!
//! # Features
//!
//! - **Config files**: Load and save [`EngineConfig`] as TOML, every key optional
//! - **Validation**: [`validate_config`] reports every out-of-range field at once
//! - **Core mapping**: [`EngineConfig::pool_config`] and [`EngineConfig::midi_buffer`]
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_config::{EngineConfig, ExhaustionMode};
//!
//! let config = EngineConfig::load("cadence.toml").unwrap();
//! config.validate().unwrap();
//!
//! let pool = cadence_core::BufferPool::from_config(config.pool_config());
//! assert_eq!(pool.buffer_size(), config.block_size);
//!
//! // Write a test-harness variant next to it
//! let harness = config.with_exhaustion(ExhaustionMode::Panic);
//! harness.save("target/cadence-test.toml").unwrap();
//! ```
//!
//! [`PoolConfig`]: cadence_core::PoolConfig

mod engine_config;
mod error;

/// Engine configuration validation.
pub mod validation;

pub use engine_config::{
    DEFAULT_SAMPLE_RATE, EngineConfig, ExhaustionMode, MidiSettings, PoolSettings,
};
pub use error::ConfigError;
pub use validation::{
    BLOCK_SIZE_RANGE, MAX_SLOTS, MIN_SLOTS, SAMPLE_RATE_RANGE, ValidationError, ValidationResult,
    validate_config,
};
