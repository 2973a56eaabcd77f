//! Cadence Core - the real-time audio/MIDI data plane
//!
//! This crate holds everything the audio thread touches once per hardware
//! callback: a fixed pool of sample buffers, reference-counted views into it,
//! and the process packet handed from stage to stage. Nothing here allocates,
//! locks or blocks once the pool exists.
//!
//! # Core Abstractions
//!
//! ## Buffers
//!
//! - [`BufferPool`] - Fixed number of fixed-length sample buffers, allocated up front
//! - [`BufferHandle`] - Reference-counted view into one pool slot; slicing shares the slot
//! - [`ExternalBuffer`] - Presents a driver-owned buffer through the same handle protocol
//!
//! ## Packets
//!
//! - [`ProcessPacket`] - `N` audio channels + shared MIDI batch + frame count
//! - [`MidiEvents`] / [`MidiBuffer`] - Ordered per-callback MIDI batch (one writer, many readers)
//!
//! ## Processing
//!
//! - [`Processor`] - The contract every engine and effect implements
//! - [`ProcessorExt`] / [`Chain`] - Static-dispatch chaining
//! - [`Passthrough`], [`Silence`], [`MidiOnly`] - Stock stages
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{BufferPool, MidiEvent, MidiEvents, ProcessPacket};
//!
//! let pool = BufferPool::new(64);
//! let events = [MidiEvent::note_on(0, 0, 60, 100)];
//!
//! // One callback: hand out two channels, wrap them with the MIDI batch.
//! let packet = ProcessPacket::new(pool.allocate_multi_clear::<2>(), MidiEvents::new(&events), 64);
//!
//! // Reshape without copying samples.
//! let tail = packet.slice(32);
//! assert_eq!(tail.nframes(), 32);
//! assert_eq!(tail.midi().len(), 1);
//!
//! drop(tail);
//! assert_eq!(pool.in_use(), 0);
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: Memory is reserved when the pool is built or resized, never per callback
//! - **Borrow-checked sharing**: Handles borrow the pool, so it cannot be resized under them
//! - **Single audio thread**: Live-counts are plain cells; pool and handles are not `Sync`
//! - **Fail fast**: Pool exhaustion stops the process instead of aliasing a live buffer

pub mod error;
pub mod handle;
pub mod midi;
pub mod packet;
pub mod pool;
pub mod processor;

// Re-export main types at crate root
pub use error::{Error, Result};
pub use handle::{BufferHandle, ExternalBuffer};
pub use midi::{MidiBuffer, MidiEvent, MidiEvents, MidiMessage};
pub use packet::ProcessPacket;
pub use pool::{
    BufferPool, DEFAULT_BUFFER_SIZE, DEFAULT_SLOT_COUNT, ExhaustionPolicy, PoolConfig,
};
pub use processor::{Chain, MidiOnly, Passthrough, Processor, ProcessorExt, Silence};
