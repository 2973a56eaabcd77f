//! Offline rendering through a [`CallbackEngine`].
//!
//! Feeds a whole signal through the engine the way a driver would: one
//! block-sized callback at a time, each with the MIDI events that fall inside
//! it. Useful for tests and file processing where no hardware clock exists.

use cadence_core::MidiEvent;

use crate::Result;
use crate::engine::CallbackEngine;

/// A pair of stereo audio buffers (left and right channels).
///
/// Each channel is a `Vec<f32>` of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoSamples {
    /// Left channel samples.
    pub left: Vec<f32>,
    /// Right channel samples.
    pub right: Vec<f32>,
}

impl StereoSamples {
    /// Create new stereo samples from left and right channels.
    pub fn new(left: Vec<f32>, right: Vec<f32>) -> Self {
        debug_assert_eq!(left.len(), right.len(), "Channels must have same length");
        Self { left, right }
    }

    /// Get the number of samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Check if the buffers are empty.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Convert to interleaved format (L, R, L, R, ...).
    pub fn to_interleaved(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(&self.right)
            .flat_map(|(&l, &r)| [l, r])
            .collect()
    }
}

/// Renders `input` through `engine` in block-sized callbacks.
///
/// `midi` holds events with times relative to the start of `input`, in any
/// order. Each callback receives the events inside its window, re-timed to
/// the start of that callback. The last callback may be shorter than the
/// block size.
pub fn render_offline(
    engine: &mut CallbackEngine,
    input: &[f32],
    midi: &[MidiEvent],
) -> Result<StereoSamples> {
    let block_size = engine.block_size();
    let mut left = vec![0.0; input.len()];
    let mut right = vec![0.0; input.len()];
    if block_size == 0 {
        return Err(crate::Error::InvalidBlockSize { block_size });
    }

    for (index, chunk) in input.chunks(block_size).enumerate() {
        let start = index * block_size;
        let end = start + chunk.len();
        let events = midi.iter().filter_map(|event| {
            let time = usize::try_from(event.time).ok()?;
            (start..end)
                .contains(&time)
                .then(|| event.with_time(u32::try_from(time - start).unwrap_or(u32::MAX)))
        });
        engine.process(chunk, events, &mut left[start..end], &mut right[start..end])?;
    }

    tracing::debug!(
        frames = input.len(),
        callbacks = input.len().div_ceil(block_size),
        high_water = engine.pool().high_water_mark(),
        "offline render finished"
    );
    Ok(StereoSamples::new(left, right))
}
