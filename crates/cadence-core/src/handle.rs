//! Reference-counted views into pool slots.
//!
//! A [`BufferHandle`] is a non-owning view of samples that live in a
//! [`BufferPool`](crate::BufferPool) slot (or in a driver buffer wrapped by
//! [`ExternalBuffer`]). Every live handle holds one share of its slot's
//! live-count:
//!
//! - minting (allocation, [`slice`](BufferHandle::slice), [`clone`](Clone::clone))
//!   adds one share
//! - dropping or [`release`](BufferHandle::release) removes one share, at most once
//! - moving a handle is a plain Rust move and leaves the count untouched
//!
//! A slot becomes reusable when its count reaches zero. The memory itself stays
//! with the pool.
//!
//! ## Aliasing
//!
//! Samples are stored as [`Cell<f32>`], so two handles may view the same slot
//! and both write to it. This is the fan-out case of a processing chain; keeping
//! those writes meaningful is the caller's job.
//!
//! ## Thread affinity
//!
//! Live-counts are plain cells touched only by the audio thread. Handles are
//! therefore neither `Send` nor `Sync`:
//!
//! ```compile_fail
//! fn assert_send<T: Send>() {}
//! assert_send::<cadence_core::BufferHandle<'static>>();
//! ```

use core::cell::Cell;
use core::fmt;
use core::ops::Index;
use core::ptr;

/// Shared, reference-counted view into one fixed-size sample buffer.
pub struct BufferHandle<'a> {
    samples: &'a [Cell<f32>],
    share: Option<&'a Cell<u32>>,
    slot: Option<usize>,
}

impl<'a> BufferHandle<'a> {
    /// Mints a handle over `samples`, taking one share of `share`.
    pub(crate) fn mint(samples: &'a [Cell<f32>], share: &'a Cell<u32>, slot: Option<usize>) -> Self {
        share.set(share.get() + 1);
        Self {
            samples,
            share: Some(share),
            slot,
        }
    }

    fn inert() -> Self {
        Self {
            samples: <&[Cell<f32>]>::default(),
            share: None,
            slot: None,
        }
    }

    /// Number of samples in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the view has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns true once the handle has given back its share.
    pub fn is_released(&self) -> bool {
        self.share.is_none()
    }

    /// Current live-count of the referenced slot (0 for a released handle).
    ///
    /// Observability only; the core never branches on it.
    pub fn reference_count(&self) -> u32 {
        self.share.map_or(0, Cell::get)
    }

    /// Pool slot index, or `None` for released handles and wrapped driver buffers.
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    /// Returns true if both handles hold shares of the same live-count.
    pub fn shares_slot(&self, other: &BufferHandle<'_>) -> bool {
        match (self.share, other.share) {
            (Some(a), Some(b)) => ptr::eq(a, b),
            _ => false,
        }
    }

    /// Gives back this handle's share early.
    ///
    /// The handle becomes inert: its view is empty and dropping it later does
    /// nothing. Releasing twice is a no-op.
    pub fn release(&mut self) {
        if let Some(share) = self.share.take() {
            give_back(share);
        }
        self.samples = <&[Cell<f32>]>::default();
        self.slot = None;
    }

    /// Sub-view `[start, len)` of the same slot. See [`slice_len`](Self::slice_len).
    pub fn slice(&self, start: usize) -> Self {
        self.slice_len(start, self.len().saturating_sub(start))
    }

    /// Sub-view `[start, start + len)` sharing this handle's slot.
    ///
    /// The new handle takes its own share; no new slot is used.
    ///
    /// Requires `start <= self.len()` and `len <= self.len() - start`. Debug
    /// builds assert this; release builds clamp the range to the view.
    pub fn slice_len(&self, start: usize, len: usize) -> Self {
        debug_assert!(
            start <= self.len(),
            "slice start {start} outside a view of {} samples",
            self.len()
        );
        debug_assert!(
            len <= self.len() - start,
            "slice of {len} samples from {start} overruns a view of {}",
            self.len()
        );
        let Some(share) = self.share else {
            return Self::inert();
        };
        let samples = self.samples;
        let start = start.min(samples.len());
        let end = start.saturating_add(len).min(samples.len());
        Self::mint(&samples[start..end], share, self.slot)
    }

    /// Reads the sample at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.samples[index].get()
    }

    /// Writes the sample at `index`.
    #[inline]
    pub fn set(&self, index: usize, value: f32) {
        self.samples[index].set(value);
    }

    /// The viewed samples as cells, for in-place loops.
    #[inline]
    pub fn cells(&self) -> &'a [Cell<f32>] {
        self.samples
    }

    /// Iterates over sample values.
    pub fn iter(&self) -> impl Iterator<Item = f32> {
        self.samples.iter().map(Cell::get)
    }

    /// Zero-fills the view.
    pub fn clear(&self) {
        self.fill(0.0);
    }

    /// Sets every sample in the view to `value`.
    pub fn fill(&self, value: f32) {
        for sample in self.samples {
            sample.set(value);
        }
    }

    /// Copies `src` into the view. Copies `min(len, src.len())` samples.
    pub fn copy_from_slice(&self, src: &[f32]) {
        for (dst, &value) in self.samples.iter().zip(src) {
            dst.set(value);
        }
    }

    /// Copies the view into `dst`. Copies `min(len, dst.len())` samples.
    pub fn copy_to_slice(&self, dst: &mut [f32]) {
        for (out, sample) in dst.iter_mut().zip(self.samples) {
            *out = sample.get();
        }
    }

    /// Copies another handle's samples into this view, front to back.
    pub fn copy_from(&self, other: &BufferHandle<'_>) {
        for (dst, src) in self.samples.iter().zip(other.samples) {
            dst.set(src.get());
        }
    }

    /// Raw pointer to the first sample, for buffer-oriented interop.
    ///
    /// Valid for [`len`](Self::len) samples while this handle is alive.
    pub fn as_mut_ptr(&self) -> *mut f32 {
        self.samples.as_ptr().cast::<f32>().cast_mut()
    }
}

fn give_back(share: &Cell<u32>) {
    debug_assert!(share.get() > 0, "live-count underflow");
    share.set(share.get().saturating_sub(1));
}

impl Clone for BufferHandle<'_> {
    fn clone(&self) -> Self {
        match self.share {
            Some(share) => Self::mint(self.samples, share, self.slot),
            None => Self::inert(),
        }
    }
}

impl Drop for BufferHandle<'_> {
    fn drop(&mut self) {
        if let Some(share) = self.share.take() {
            give_back(share);
        }
    }
}

impl Default for BufferHandle<'_> {
    /// An inert, empty handle holding no share.
    fn default() -> Self {
        Self::inert()
    }
}

impl Index<usize> for BufferHandle<'_> {
    type Output = Cell<f32>;

    #[inline]
    fn index(&self, index: usize) -> &Cell<f32> {
        &self.samples[index]
    }
}

impl<'a> IntoIterator for &BufferHandle<'a> {
    type Item = &'a Cell<f32>;
    type IntoIter = core::slice::Iter<'a, Cell<f32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

impl fmt::Debug for BufferHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferHandle")
            .field("slot", &self.slot)
            .field("len", &self.len())
            .field("reference_count", &self.reference_count())
            .finish()
    }
}

/// A driver-owned sample buffer presented through the handle protocol.
///
/// Lets a callback wrap the raw buffers it receives instead of copying them
/// into the pool. The wrapper carries its own live-count and cannot be dropped
/// while any of its handles are alive.
pub struct ExternalBuffer<'a> {
    samples: &'a [Cell<f32>],
    share: Cell<u32>,
}

impl<'a> ExternalBuffer<'a> {
    /// Wraps `buffer` for the duration of the borrow.
    pub fn new(buffer: &'a mut [f32]) -> Self {
        Self {
            samples: Cell::from_mut(buffer).as_slice_of_cells(),
            share: Cell::new(0),
        }
    }

    /// Mints a handle over the whole buffer.
    pub fn handle(&self) -> BufferHandle<'_> {
        BufferHandle::mint(self.samples, &self.share, None)
    }

    /// Number of live handles into this buffer.
    pub fn reference_count(&self) -> u32 {
        self.share.get()
    }

    /// Buffer length in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
