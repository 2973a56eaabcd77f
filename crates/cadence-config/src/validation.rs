//! Engine configuration validation.
//!
//! A configuration can parse cleanly and still describe an engine that cannot
//! run: a pool too small for one callback, a zero-length block, a sample rate no driver
//! offers. [`validate_config`] reports every such problem at once so a user
//! fixing a config file sees the whole list.
//!
//! # Example
//!
//! ```rust
//! use cadence_config::{EngineConfig, ValidationError, validate_config};
//!
//! let mut config = EngineConfig::default();
//! assert!(validate_config(&config).is_ok());
//!
//! config.block_size = 0;
//! config.midi.capacity = 0;
//! assert!(matches!(validate_config(&config), Err(ValidationError::Multiple(_))));
//! ```

use std::ops::RangeInclusive;
use thiserror::Error;

use crate::engine_config::EngineConfig;

/// Smallest pool that can run a callback.
///
/// The engine holds the input buffer and the fanned-out right channel at once.
pub const MIN_SLOTS: usize = 2;

/// Largest pool a configuration may ask for.
pub const MAX_SLOTS: usize = 64;

/// Accepted frames per callback.
pub const BLOCK_SIZE_RANGE: RangeInclusive<usize> = 1..=8192;

/// Accepted sample rates in Hz.
pub const SAMPLE_RATE_RANGE: RangeInclusive<u32> = 8_000..=384_000;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The pool cannot hold the buffers of a single callback.
    #[error("buffer pool of {slots} slots is below the minimum of {min}")]
    TooFewSlots {
        /// Requested slot count.
        slots: usize,
        /// Smallest accepted slot count.
        min: usize,
    },

    /// The pool is larger than any callback needs.
    #[error("buffer pool of {slots} slots exceeds the maximum of {max}")]
    TooManySlots {
        /// Requested slot count.
        slots: usize,
        /// Largest accepted slot count.
        max: usize,
    },

    /// Block size outside [`BLOCK_SIZE_RANGE`].
    #[error("block size {block_size} out of range [{min}, {max}]")]
    BlockSize {
        /// Requested frames per callback.
        block_size: usize,
        /// Smallest accepted block size.
        min: usize,
        /// Largest accepted block size.
        max: usize,
    },

    /// Sample rate outside [`SAMPLE_RATE_RANGE`].
    #[error("sample rate {sample_rate} Hz out of range [{min}, {max}]")]
    SampleRate {
        /// Requested sample rate.
        sample_rate: u32,
        /// Lowest accepted rate.
        min: u32,
        /// Highest accepted rate.
        max: u32,
    },

    /// The MIDI batch could never hold an event.
    #[error("MIDI buffer capacity must be at least 1")]
    ZeroMidiCapacity,

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks every field of `config`, collecting all violations.
///
/// Returns the single error directly, or [`ValidationError::Multiple`] when
/// more than one field is wrong.
pub fn validate_config(config: &EngineConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if config.pool.slots < MIN_SLOTS {
        errors.push(ValidationError::TooFewSlots {
            slots: config.pool.slots,
            min: MIN_SLOTS,
        });
    } else if config.pool.slots > MAX_SLOTS {
        errors.push(ValidationError::TooManySlots {
            slots: config.pool.slots,
            max: MAX_SLOTS,
        });
    }

    if !BLOCK_SIZE_RANGE.contains(&config.block_size) {
        errors.push(ValidationError::BlockSize {
            block_size: config.block_size,
            min: *BLOCK_SIZE_RANGE.start(),
            max: *BLOCK_SIZE_RANGE.end(),
        });
    }

    if !SAMPLE_RATE_RANGE.contains(&config.sample_rate) {
        errors.push(ValidationError::SampleRate {
            sample_rate: config.sample_rate,
            min: *SAMPLE_RATE_RANGE.start(),
            max: *SAMPLE_RATE_RANGE.end(),
        });
    }

    if config.midi.capacity == 0 {
        errors.push(ValidationError::ZeroMidiCapacity);
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.swap_remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&EngineConfig::default()), Ok(()));
    }

    #[test]
    fn single_error_is_returned_directly() {
        let mut config = EngineConfig::default();
        config.pool.slots = 0;
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::TooFewSlots { slots: 0, min: 2 })
        );
    }

    #[test]
    fn one_slot_cannot_run_a_callback() {
        let config = EngineConfig::default().with_slots(1);
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::TooFewSlots {
                slots: 1,
                min: MIN_SLOTS
            })
        );
        assert!(validate_config(&config.with_slots(MIN_SLOTS)).is_ok());
    }

    #[test]
    fn slot_limit() {
        let mut config = EngineConfig::default();
        config.pool.slots = MAX_SLOTS;
        assert!(validate_config(&config).is_ok());

        config.pool.slots = MAX_SLOTS + 1;
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::TooManySlots {
                slots: 65,
                max: MAX_SLOTS
            })
        );
    }

    #[test]
    fn block_size_bounds() {
        let mut config = EngineConfig::default();
        for ok in [1, 64, 8192] {
            config.block_size = ok;
            assert!(validate_config(&config).is_ok(), "block size {ok}");
        }
        config.block_size = 8193;
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::BlockSize { block_size: 8193, .. })
        ));
    }

    #[test]
    fn sample_rate_bounds() {
        let mut config = EngineConfig::default();
        config.sample_rate = 7_999;
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::SampleRate { sample_rate: 7_999, .. })
        ));
        config.sample_rate = 44_100;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn every_violation_is_collected() {
        let mut config = EngineConfig::default();
        config.pool.slots = 0;
        config.block_size = 0;
        config.sample_rate = 0;
        config.midi.capacity = 0;

        let Err(ValidationError::Multiple(errors)) = validate_config(&config) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], ValidationError::TooFewSlots { slots: 0, .. }));
        assert_eq!(errors[3], ValidationError::ZeroMidiCapacity);
    }

    #[test]
    fn multiple_display_joins_messages() {
        let err = ValidationError::Multiple(vec![
            ValidationError::TooFewSlots { slots: 1, min: 2 },
            ValidationError::ZeroMidiCapacity,
        ]);
        assert_eq!(
            err.to_string(),
            "multiple validation errors: buffer pool of 1 slots is below the minimum of 2; \
             MIDI buffer capacity must be at least 1"
        );
    }
}
