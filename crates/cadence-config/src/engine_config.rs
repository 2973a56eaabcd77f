//! Engine configuration file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use cadence_core::{
    DEFAULT_BUFFER_SIZE, DEFAULT_SLOT_COUNT, ExhaustionPolicy, MidiBuffer, PoolConfig,
};

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_config};

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// What the pool does when a callback asks for more slots than it has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionMode {
    /// Log and abort the process.
    #[default]
    Abort,
    /// Log and panic, unwinding where the build allows it.
    Panic,
}

impl From<ExhaustionMode> for ExhaustionPolicy {
    fn from(mode: ExhaustionMode) -> Self {
        match mode {
            ExhaustionMode::Abort => ExhaustionPolicy::Abort,
            ExhaustionMode::Panic => ExhaustionPolicy::Panic,
        }
    }
}

impl From<ExhaustionPolicy> for ExhaustionMode {
    fn from(policy: ExhaustionPolicy) -> Self {
        match policy {
            ExhaustionPolicy::Abort => ExhaustionMode::Abort,
            ExhaustionPolicy::Panic => ExhaustionMode::Panic,
        }
    }
}

/// `[pool]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Number of buffers reserved up front.
    pub slots: usize,
    /// Behavior when every slot is taken.
    pub on_exhausted: ExhaustionMode,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOT_COUNT,
            on_exhausted: ExhaustionMode::default(),
        }
    }
}

/// `[midi]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiSettings {
    /// Events kept per callback; later arrivals are dropped.
    pub capacity: usize,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            capacity: MidiBuffer::DEFAULT_CAPACITY,
        }
    }
}

/// Settings the driver needs before the first callback.
///
/// Stored as TOML; every key is optional and falls back to its default.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// block_size = 256
///
/// [pool]
/// slots = 8
/// on_exhausted = "abort"
///
/// [midi]
/// capacity = 256
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Largest number of frames a callback may deliver.
    pub block_size: usize,
    /// Buffer pool settings.
    pub pool: PoolSettings,
    /// MIDI batch settings.
    pub midi: MidiSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BUFFER_SIZE,
            pool: PoolSettings::default(),
            midi: MidiSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Set the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the pool slot count.
    pub fn with_slots(mut self, slots: usize) -> Self {
        self.pool.slots = slots;
        self
    }

    /// Set the exhaustion behavior.
    pub fn with_exhaustion(mut self, mode: ExhaustionMode) -> Self {
        self.pool.on_exhausted = mode;
        self
    }

    /// Set the MIDI batch capacity.
    pub fn with_midi_capacity(mut self, capacity: usize) -> Self {
        self.midi.capacity = capacity;
        self
    }

    /// Load a configuration from a TOML file.
    ///
    /// The result is not validated; see [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field; see [`validate_config`].
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    /// Pool shape for this configuration.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.block_size)
            .with_slots(self.pool.slots)
            .with_policy(self.pool.on_exhausted.into())
    }

    /// An empty MIDI batch with the configured capacity.
    pub fn midi_buffer(&self) -> MidiBuffer {
        MidiBuffer::with_capacity(self.midi.capacity)
    }
}
