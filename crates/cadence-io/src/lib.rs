//! Driver side of the cadence audio path.
//!
//! This crate provides:
//!
//! - **Callback engine**: [`CallbackEngine`] turns one hardware callback (mono
//!   input, MIDI, stereo output) into a pool-backed packet threaded through a
//!   mono and a stereo processor chain
//! - **Wire MIDI**: [`decode_midi`] for drivers that deliver raw MIDI bytes
//! - **Offline rendering**: [`render_offline`] for running a whole signal
//!   through the engine in block-sized callbacks
//!
//! ## Quick Start
//!
//! ```rust
//! use cadence_config::EngineConfig;
//! use cadence_core::ProcessPacket;
//! use cadence_io::{CallbackEngine, render_offline};
//!
//! let config = EngineConfig::default().with_block_size(64);
//! let mut engine = CallbackEngine::from_config(&config)?;
//! engine.add_mono_stage(Box::new(|p: &mut ProcessPacket<'_, 1>| {
//!     for sample in p.channel(0) {
//!         sample.set(sample.get() * 0.5);
//!     }
//! }));
//!
//! let output = render_offline(&mut engine, &[1.0; 200], &[])?;
//! assert_eq!(output.len(), 200);
//! assert!(output.left.iter().all(|&s| s == 0.5));
//! # Ok::<(), cadence_io::Error>(())
//! ```

mod engine;
mod midi_in;
mod offline;

pub use engine::{CallbackEngine, MonoStage, StereoStage};
pub use midi_in::decode_midi;
pub use offline::{StereoSamples, render_offline};

use cadence_config::ConfigError;

/// Error types for driver-side processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The driver delivered more frames than the pool buffers hold.
    #[error("callback of {nframes} frames exceeds the block size of {block_size}")]
    BlockTooLarge {
        /// Frames the driver delivered.
        nframes: usize,
        /// Configured block size.
        block_size: usize,
    },

    /// The driver reported a block size outside the accepted range.
    #[error("block size {block_size} is outside the accepted range")]
    InvalidBlockSize {
        /// Requested frames per callback.
        block_size: usize,
    },

    /// An output buffer cannot hold the callback's frames.
    #[error("output buffers ({left}, {right} frames) shorter than the {needed}-frame callback")]
    OutputTooShort {
        /// Frames the callback produces.
        needed: usize,
        /// Length of the left output.
        left: usize,
        /// Length of the right output.
        right: usize,
    },

    /// The engine configuration could not be used.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience result type for driver-side processing.
pub type Result<T> = std::result::Result<T, Error>;
