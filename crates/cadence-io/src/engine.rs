//! Per-callback processing engine.

use cadence_config::{BLOCK_SIZE_RANGE, EngineConfig};
use cadence_core::{
    BufferHandle, BufferPool, MidiBuffer, MidiEvent, PoolConfig, ProcessPacket, Processor,
};

use crate::{Error, Result};

/// A stage on the mono (input) side of the engine.
pub type MonoStage = Box<dyn Processor<1> + Send>;

/// A stage on the stereo (output) side of the engine.
pub type StereoStage = Box<dyn Processor<2> + Send>;

/// Runs one hardware callback through a mono and a stereo processor chain.
///
/// Each callback, the mono input is copied into a pool buffer, threaded
/// through the mono stages, fanned out to two channels and threaded through
/// the stereo stages before landing in the driver's output buffers. All
/// buffers come from a pool reserved up front, so [`process`](Self::process)
/// never allocates.
///
/// The engine uses `Send` bounds so it can be moved onto the audio thread.
pub struct CallbackEngine {
    pool: BufferPool,
    midi: MidiBuffer,
    mono: Vec<MonoStage>,
    stereo: Vec<StereoStage>,
    sample_rate: u32,
    running: bool,
}

impl CallbackEngine {
    /// Create an engine with a pool shaped by `pool`.
    pub fn new(pool: PoolConfig, sample_rate: u32) -> Self {
        Self {
            pool: BufferPool::from_config(pool),
            midi: MidiBuffer::default(),
            mono: Vec::new(),
            stereo: Vec::new(),
            sample_rate,
            running: true,
        }
    }

    /// Create an engine from a validated configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate().map_err(cadence_config::ConfigError::from)?;
        tracing::info!(
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            slots = config.pool.slots,
            midi_capacity = config.midi.capacity,
            "callback engine configured"
        );
        Ok(Self {
            midi: config.midi_buffer(),
            ..Self::new(config.pool_config(), config.sample_rate)
        })
    }

    /// Get the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Record a sample-rate change reported by the driver.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        tracing::info!(sample_rate, "sample rate changed");
        self.sample_rate = sample_rate;
    }

    /// Largest number of frames a callback may deliver.
    pub fn block_size(&self) -> usize {
        self.pool.buffer_size()
    }

    /// Reshape the pool for a new driver block size.
    ///
    /// Takes `&mut self`, so no callback can be in flight. Sizes outside
    /// [`BLOCK_SIZE_RANGE`] are rejected and leave the pool untouched.
    pub fn set_block_size(&mut self, block_size: usize) -> Result<()> {
        if !BLOCK_SIZE_RANGE.contains(&block_size) {
            tracing::error!(block_size, "driver reported an unusable block size");
            return Err(Error::InvalidBlockSize { block_size });
        }
        tracing::info!(block_size, "block size changed");
        self.pool.set_buffer_size(block_size);
        Ok(())
    }

    /// Whether callbacks are processed or answered with silence.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start or stop processing.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// The engine's buffer pool, for inspection.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Append a stage to the mono chain.
    pub fn add_mono_stage(&mut self, stage: MonoStage) {
        self.mono.push(stage);
    }

    /// Append a stage to the stereo chain.
    pub fn add_stereo_stage(&mut self, stage: StereoStage) {
        self.stereo.push(stage);
    }

    /// Remove every stage from both chains.
    pub fn clear(&mut self) {
        self.mono.clear();
        self.stereo.clear();
    }

    /// Total number of stages.
    pub fn len(&self) -> usize {
        self.mono.len() + self.stereo.len()
    }

    /// Check if both chains are empty.
    pub fn is_empty(&self) -> bool {
        self.mono.is_empty() && self.stereo.is_empty()
    }

    /// Process one callback.
    ///
    /// `input.len()` is the callback's frame count. `midi` carries the
    /// callback's decoded events in any order; events past the MIDI capacity
    /// are dropped. Returns the number of frames written to each output; any
    /// remaining output samples are silenced.
    pub fn process<I>(
        &mut self,
        input: &[f32],
        midi: I,
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<usize>
    where
        I: IntoIterator<Item = MidiEvent>,
    {
        let nframes = input.len();

        if !self.running {
            left_out.fill(0.0);
            right_out.fill(0.0);
            return Ok(0);
        }

        let block_size = self.pool.buffer_size();
        if nframes > block_size {
            tracing::error!(nframes, block_size, "driver requested more frames than expected");
            left_out.fill(0.0);
            right_out.fill(0.0);
            return Err(Error::BlockTooLarge {
                nframes,
                block_size,
            });
        }
        if left_out.len() < nframes || right_out.len() < nframes {
            return Err(Error::OutputTooShort {
                needed: nframes,
                left: left_out.len(),
                right: right_out.len(),
            });
        }

        let Self {
            pool,
            midi: batch,
            mono,
            stereo,
            ..
        } = self;

        batch.clear();
        let mut dropped = 0usize;
        for event in midi {
            if batch.push(event).is_err() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::warn!(dropped, capacity = batch.capacity(), "MIDI events dropped");
        }

        let input_buffer = pool.allocate();
        input_buffer.copy_from_slice(input);
        let mut packet = ProcessPacket::new([input_buffer], batch.events(), nframes);
        for stage in mono.iter_mut() {
            stage.process(&mut packet);
        }

        let right = pool.allocate();
        right.copy_from(packet.channel(0));
        let left = packet.channel(0).clone();
        let mut packet = packet.redirect([left, right]);
        for stage in stereo.iter_mut() {
            stage.process(&mut packet);
        }

        let produced = packet.nframes();
        if produced != nframes {
            tracing::warn!(expected = nframes, produced, "frames went missing");
        }
        let written = produced.min(nframes);
        write_out(packet.channel(0), left_out, written);
        write_out(packet.channel(1), right_out, written);
        Ok(written)
    }
}

/// Copies the first `frames` samples of `channel` into `out` and silences the rest.
fn write_out(channel: &BufferHandle<'_>, out: &mut [f32], frames: usize) {
    let (valid, rest) = out.split_at_mut(frames.min(out.len()));
    valid.fill(0.0);
    channel.copy_to_slice(valid);
    rest.fill(0.0);
}

impl Default for CallbackEngine {
    fn default() -> Self {
        Self::new(PoolConfig::default(), cadence_config::DEFAULT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{ExhaustionPolicy, MidiEvents, Silence};

    const BLOCK: usize = 32;
    const NO_MIDI: [MidiEvent; 0] = [];

    fn test_engine() -> CallbackEngine {
        CallbackEngine::new(
            PoolConfig::new(BLOCK).with_policy(ExhaustionPolicy::Panic),
            48_000,
        )
    }

    #[test]
    fn empty_chain_fans_input_out() {
        let mut engine = test_engine();
        let input: Vec<f32> = (0..BLOCK).map(|i| i as f32).collect();
        let mut left = vec![9.0; BLOCK];
        let mut right = vec![9.0; BLOCK];

        let written = engine.process(&input, NO_MIDI, &mut left, &mut right).unwrap();
        assert_eq!(written, BLOCK);
        assert_eq!(left, input);
        assert_eq!(right, input);
        assert_eq!(engine.pool().in_use(), 0);
        assert_eq!(engine.pool().high_water_mark(), 2);
    }

    #[test]
    fn stereo_stage_sees_independent_channels() {
        let mut engine = test_engine();
        engine.add_stereo_stage(Box::new(|p: &mut ProcessPacket<'_, 2>| {
            p.channel(1).fill(0.0);
        }));
        let input = [1.0; BLOCK];
        let mut left = [0.0; BLOCK];
        let mut right = [1.0; BLOCK];

        engine.process(&input, NO_MIDI, &mut left, &mut right).unwrap();
        assert!(left.iter().all(|&s| s == 1.0));
        assert!(right.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn short_callback_silences_tail() {
        let mut engine = test_engine();
        let mut left = [5.0; BLOCK];
        let mut right = [5.0; BLOCK];

        let written = engine.process(&[1.0; 8], NO_MIDI, &mut left, &mut right).unwrap();
        assert_eq!(written, 8);
        assert!(left[..8].iter().all(|&s| s == 1.0));
        assert!(left[8..].iter().all(|&s| s == 0.0));
        assert!(right[8..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn stopped_engine_outputs_silence() {
        let mut engine = test_engine();
        engine.set_running(false);
        let mut left = [1.0; BLOCK];
        let mut right = [1.0; BLOCK];

        assert_eq!(engine.process(&[1.0; BLOCK], NO_MIDI, &mut left, &mut right).unwrap(), 0);
        assert!(left.iter().chain(&right).all(|&s| s == 0.0));
        assert_eq!(engine.pool().high_water_mark(), 0);
    }

    #[test]
    fn oversized_callback_is_rejected() {
        let mut engine = test_engine();
        let mut left = [1.0; BLOCK * 2];
        let mut right = [1.0; BLOCK * 2];

        let err = engine
            .process(&[0.5; BLOCK * 2], NO_MIDI, &mut left, &mut right)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::BlockTooLarge {
                nframes: 64,
                block_size: BLOCK
            }
        ));
        assert!(left.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn short_outputs_are_rejected() {
        let mut engine = test_engine();
        let mut left = [0.0; BLOCK];
        let mut right = [0.0; 4];

        let err = engine
            .process(&[0.5; BLOCK], NO_MIDI, &mut left, &mut right)
            .unwrap_err();
        assert!(matches!(err, Error::OutputTooShort { needed: 32, right: 4, .. }));
    }

    #[test]
    fn midi_reaches_both_chains_sorted() {
        let mut engine = test_engine();
        engine.add_mono_stage(Box::new(|p: &mut ProcessPacket<'_, 1>| {
            let times: Vec<u32> = p.midi().iter().map(|e| e.time).collect();
            assert_eq!(times, vec![2, 7]);
        }));
        engine.add_stereo_stage(Box::new(|p: &mut ProcessPacket<'_, 2>| {
            assert_eq!(p.midi().len(), 2);
        }));

        let events = [
            MidiEvent::note_off(7, 0, 60, 0),
            MidiEvent::note_on(2, 0, 60, 100),
        ];
        let mut left = [0.0; BLOCK];
        let mut right = [0.0; BLOCK];
        engine
            .process(&[0.0; BLOCK], events, &mut left, &mut right)
            .unwrap();
    }

    #[test]
    fn stage_shrinking_the_packet_is_reported() {
        let mut engine = test_engine();
        engine.add_stereo_stage(Box::new(|p: &mut ProcessPacket<'_, 2>| {
            *p = p.clone().slice_len(0, 16);
        }));
        let mut left = [3.0; BLOCK];
        let mut right = [3.0; BLOCK];

        let written = engine
            .process(&[1.0; BLOCK], NO_MIDI, &mut left, &mut right)
            .unwrap();
        assert_eq!(written, 16);
        assert!(left[16..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn chain_management() {
        let mut engine = CallbackEngine::default();
        assert!(engine.is_empty());
        engine.add_mono_stage(Box::new(Silence));
        engine.add_stereo_stage(Box::new(|p: &mut ProcessPacket<'_, 2>| {
            p.set_midi(MidiEvents::EMPTY);
        }));
        assert_eq!(engine.len(), 2);
        engine.clear();
        assert!(engine.is_empty());
        assert_eq!(engine.block_size(), 256);
        assert_eq!(engine.sample_rate(), 48_000);
    }

    #[test]
    fn block_size_change_between_callbacks() {
        let mut engine = test_engine();
        engine.set_block_size(64).unwrap();
        engine.set_sample_rate(96_000);
        let mut left = [0.0; 64];
        let mut right = [0.0; 64];

        let written = engine
            .process(&[0.25; 64], NO_MIDI, &mut left, &mut right)
            .unwrap();
        assert_eq!(written, 64);
        assert_eq!(engine.sample_rate(), 96_000);
    }

    #[test]
    fn unusable_block_size_is_rejected() {
        let mut engine = test_engine();
        for block_size in [0, 8193, usize::MAX] {
            let err = engine.set_block_size(block_size).unwrap_err();
            assert!(matches!(err, Error::InvalidBlockSize { block_size: b } if b == block_size));
        }
        assert_eq!(engine.block_size(), BLOCK);
        assert_eq!(engine.pool().capacity(), 8);
    }
}
