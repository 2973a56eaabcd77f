//! Fixed-capacity sample buffer pool.
//!
//! The [`BufferPool`] owns every sample buffer the audio path touches. All
//! memory is reserved up front, in one contiguous block of
//! `capacity * buffer_size` samples plus one live-count per slot. Handing out a
//! buffer is a linear scan for the first slot whose count is zero; nothing is
//! allocated and nothing blocks.
//!
//! Handles borrow the pool, so [`set_buffer_size`](BufferPool::set_buffer_size)
//! (which needs `&mut self`) cannot run while any handle is outstanding:
//!
//! ```compile_fail
//! let mut pool = cadence_core::BufferPool::new(16);
//! let handle = pool.allocate();
//! pool.set_buffer_size(8);
//! drop(handle);
//! ```
//!
//! ## Exhaustion
//!
//! Running out of slots means a handle leaked or the pool is undersized.
//! Handing out a live buffer would corrupt another packet, so
//! [`allocate`](BufferPool::allocate) stops hard according to the pool's
//! [`ExhaustionPolicy`]. [`try_allocate`](BufferPool::try_allocate) reports the
//! condition as [`Error::PoolExhausted`] instead.
//!
//! ## Thread affinity
//!
//! The pool may be moved onto the audio thread during setup, but it is never
//! shared between threads:
//!
//! ```
//! fn assert_send<T: Send>() {}
//! assert_send::<cadence_core::BufferPool>();
//! ```
//!
//! ```compile_fail
//! fn assert_sync<T: Sync>() {}
//! assert_sync::<cadence_core::BufferPool>();
//! ```

use core::cell::Cell;
use core::fmt;

use crate::error::{Error, Result};
use crate::handle::BufferHandle;

/// Number of slots a pool holds unless configured otherwise.
pub const DEFAULT_SLOT_COUNT: usize = 8;

/// Block size used by [`PoolConfig::default`].
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// What [`BufferPool::allocate`] does when every slot is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionPolicy {
    /// Log and abort the process. Production default.
    #[default]
    Abort,
    /// Log and panic with the [`Error::PoolExhausted`] message.
    ///
    /// Used by test harnesses to observe the fatal path.
    Panic,
}

/// Sizing of a [`BufferPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of slots.
    pub slots: usize,
    /// Samples per slot (the driver's block size).
    pub buffer_size: usize,
    /// Behavior of [`BufferPool::allocate`] on exhaustion.
    pub on_exhausted: ExhaustionPolicy,
}

impl PoolConfig {
    /// Default slot count and policy with the given block size.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            slots: DEFAULT_SLOT_COUNT,
            buffer_size,
            on_exhausted: ExhaustionPolicy::default(),
        }
    }

    /// Sets the slot count.
    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    /// Sets the exhaustion policy.
    pub fn with_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.on_exhausted = policy;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

/// Pool of fixed-length sample buffers with per-slot live-counts.
///
/// A slot is free iff its live-count is zero.
pub struct BufferPool {
    samples: Box<[Cell<f32>]>,
    counts: Box<[Cell<u32>]>,
    buffer_size: usize,
    high_water: Cell<usize>,
    policy: ExhaustionPolicy,
}

fn zeroed(len: usize) -> Box<[Cell<f32>]> {
    (0..len).map(|_| Cell::new(0.0)).collect()
}

impl BufferPool {
    /// Creates a pool of [`DEFAULT_SLOT_COUNT`] slots of `buffer_size` samples.
    pub fn new(buffer_size: usize) -> Self {
        Self::from_config(PoolConfig::new(buffer_size))
    }

    /// Creates a pool with the given number of slots.
    pub fn with_slots(slots: usize, buffer_size: usize) -> Self {
        Self::from_config(PoolConfig::new(buffer_size).with_slots(slots))
    }

    /// Creates a pool from a full configuration.
    pub fn from_config(config: PoolConfig) -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            slots = config.slots,
            buffer_size = config.buffer_size,
            "buffer pool reserved"
        );
        Self {
            samples: zeroed(config.slots * config.buffer_size),
            counts: (0..config.slots).map(|_| Cell::new(0)).collect(),
            buffer_size: config.buffer_size,
            high_water: Cell::new(0),
            policy: config.on_exhausted,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> PoolConfig {
        PoolConfig {
            slots: self.capacity(),
            buffer_size: self.buffer_size,
            on_exhausted: self.policy,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.counts.len()
    }

    /// Samples per slot.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of slots currently held by at least one handle.
    pub fn in_use(&self) -> usize {
        self.counts.iter().filter(|count| count.get() > 0).count()
    }

    /// Number of slots that [`allocate`](Self::allocate) can still hand out.
    pub fn available(&self) -> usize {
        self.capacity() - self.in_use()
    }

    /// Live-count of `slot` (0 for an out-of-range index).
    pub fn reference_count(&self, slot: usize) -> u32 {
        self.counts.get(slot).map_or(0, Cell::get)
    }

    /// Largest number of slots ever in use at the same time.
    pub fn high_water_mark(&self) -> usize {
        self.high_water.get()
    }

    /// Behavior on exhaustion.
    pub fn policy(&self) -> ExhaustionPolicy {
        self.policy
    }

    /// Changes the behavior on exhaustion.
    pub fn set_policy(&mut self, policy: ExhaustionPolicy) {
        self.policy = policy;
    }

    /// Hands out the first free slot, or reports exhaustion.
    ///
    /// Bounded by the slot count; never allocates.
    pub fn try_allocate(&self) -> Result<BufferHandle<'_>> {
        let slot = self
            .counts
            .iter()
            .position(|count| count.get() == 0)
            .ok_or(Error::PoolExhausted {
                capacity: self.capacity(),
            })?;
        let start = slot * self.buffer_size;
        let handle = BufferHandle::mint(
            &self.samples[start..start + self.buffer_size],
            &self.counts[slot],
            Some(slot),
        );
        self.record_usage();
        Ok(handle)
    }

    /// Hands out the first free slot.
    ///
    /// The returned buffer holds whatever the previous user left in it.
    /// Exhaustion is fatal; see [`ExhaustionPolicy`].
    pub fn allocate(&self) -> BufferHandle<'_> {
        match self.try_allocate() {
            Ok(handle) => handle,
            Err(err) => self.exhausted(err),
        }
    }

    /// Like [`allocate`](Self::allocate), with the buffer zero-filled.
    pub fn allocate_clear(&self) -> BufferHandle<'_> {
        let handle = self.allocate();
        handle.clear();
        handle
    }

    /// `M` independent allocations.
    pub fn allocate_multi<const M: usize>(&self) -> [BufferHandle<'_>; M] {
        core::array::from_fn(|_| self.allocate())
    }

    /// `M` independent zero-filled allocations.
    pub fn allocate_multi_clear<const M: usize>(&self) -> [BufferHandle<'_>; M] {
        core::array::from_fn(|_| self.allocate_clear())
    }

    /// Reallocates every slot with a new length and resets all live-counts.
    ///
    /// Only called on a block-size change, never from a running callback.
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            old = self.buffer_size,
            new = buffer_size,
            "buffer pool resized"
        );
        self.buffer_size = buffer_size;
        self.samples = zeroed(self.capacity() * buffer_size);
        for count in self.counts.iter() {
            count.set(0);
        }
    }

    fn record_usage(&self) {
        let in_use = self.in_use();
        if in_use > self.high_water.get() {
            self.high_water.set(in_use);
            #[cfg(feature = "tracing")]
            tracing::info!(
                slots_in_use = in_use,
                capacity = self.capacity(),
                "buffer pool high-water mark"
            );
        }
    }

    #[cold]
    fn exhausted(&self, err: Error) -> ! {
        #[cfg(feature = "tracing")]
        tracing::error!(capacity = self.capacity(), "{err}");
        match self.policy {
            ExhaustionPolicy::Abort => std::process::abort(),
            ExhaustionPolicy::Panic => panic!("{err}"),
        }
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.capacity())
            .field("buffer_size", &self.buffer_size)
            .field("in_use", &self.in_use())
            .field("high_water", &self.high_water.get())
            .field("policy", &self.policy)
            .finish()
    }
}
