//! The per-callback process packet.
//!
//! A [`ProcessPacket`] bundles `N` audio channels ([`BufferHandle`]s), the
//! callback's shared MIDI batch and the number of valid frames. It lives on the
//! stack for one callback and is threaded through the processing chain.
//!
//! `N` is a const generic; `N = 0` is a MIDI-only packet and `N = 1` a single
//! channel. Reshaping ([`midi_only`](ProcessPacket::midi_only),
//! [`audio_only`](ProcessPacket::audio_only), [`redirect`](ProcessPacket::redirect),
//! [`slice`](ProcessPacket::slice)) consumes the packet and produces a new one;
//! handle shares the new shape does not need are released, samples are never
//! copied.

use crate::handle::BufferHandle;
use crate::midi::MidiEvents;

/// Non-owning bundle of `N` audio channels, MIDI events and a frame count.
#[derive(Debug, Clone)]
pub struct ProcessPacket<'a, const N: usize> {
    audio: [BufferHandle<'a>; N],
    midi: MidiEvents<'a>,
    nframes: usize,
}

impl<'a, const N: usize> ProcessPacket<'a, N> {
    /// Creates a packet over `audio` with `nframes` valid frames per channel.
    pub fn new(audio: [BufferHandle<'a>; N], midi: MidiEvents<'a>, nframes: usize) -> Self {
        debug_assert!(
            audio.iter().all(|channel| channel.len() >= nframes),
            "channel shorter than nframes ({nframes})"
        );
        Self {
            audio,
            midi,
            nframes,
        }
    }

    /// Creates a packet whose frame count is the length of the shortest channel.
    pub fn with_midi(audio: [BufferHandle<'a>; N], midi: MidiEvents<'a>) -> Self {
        let nframes = audio.iter().map(BufferHandle::len).min().unwrap_or(0);
        Self::new(audio, midi, nframes)
    }

    /// Creates a packet with no MIDI events.
    pub fn from_audio(audio: [BufferHandle<'a>; N]) -> Self {
        Self::with_midi(audio, MidiEvents::EMPTY)
    }

    /// Number of audio channels.
    pub fn channels(&self) -> usize {
        N
    }

    /// Number of valid frames in every channel.
    pub fn nframes(&self) -> usize {
        self.nframes
    }

    /// The audio channels.
    pub fn audio(&self) -> &[BufferHandle<'a>; N] {
        &self.audio
    }

    /// Channel `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= N`.
    pub fn channel(&self, index: usize) -> &BufferHandle<'a> {
        &self.audio[index]
    }

    /// The shared MIDI batch.
    pub fn midi(&self) -> MidiEvents<'a> {
        self.midi
    }

    /// Replaces the MIDI batch.
    pub fn set_midi(&mut self, midi: MidiEvents<'a>) {
        self.midi = midi;
    }

    /// Splits the packet into its parts.
    pub fn into_parts(self) -> ([BufferHandle<'a>; N], MidiEvents<'a>, usize) {
        (self.audio, self.midi, self.nframes)
    }

    /// Zero-fills the valid frames of every channel.
    pub fn clear_audio(&self) {
        for channel in &self.audio {
            let valid = self.nframes.min(channel.len());
            for sample in &channel.cells()[..valid] {
                sample.set(0.0);
            }
        }
    }

    /// Drops the audio channels, keeping MIDI and frame count.
    ///
    /// Every channel's share is released.
    pub fn midi_only(self) -> ProcessPacket<'a, 0> {
        ProcessPacket {
            audio: [],
            midi: self.midi,
            nframes: self.nframes,
        }
    }

    /// Same channels and frame count, no MIDI events.
    pub fn audio_only(self) -> Self {
        Self {
            midi: MidiEvents::EMPTY,
            ..self
        }
    }

    /// Swaps in a different set of `M` channels, keeping MIDI and frame count.
    ///
    /// Used to present a send/return or side-chain buffer to a nested stage.
    /// This packet's own channels are released.
    pub fn redirect<const M: usize>(self, audio: [BufferHandle<'a>; M]) -> ProcessPacket<'a, M> {
        ProcessPacket::new(audio, self.midi, self.nframes)
    }

    /// Frames `[idx, nframes)` of every channel. See [`slice_len`](Self::slice_len).
    pub fn slice(self, idx: usize) -> Self {
        let len = self.nframes.saturating_sub(idx);
        self.slice_len(idx, len)
    }

    /// Frames `[idx, idx + len)` of every channel; the frame count becomes `len`.
    ///
    /// MIDI events keep their absolute offsets. A stage that needs offsets
    /// relative to the slice uses [`MidiEvents::window`].
    ///
    /// Requires `idx <= nframes` and `len <= nframes - idx`. Debug builds
    /// assert this; release builds clamp.
    pub fn slice_len(self, idx: usize, len: usize) -> Self {
        debug_assert!(
            idx <= self.nframes,
            "slice start {idx} outside {} frames",
            self.nframes
        );
        debug_assert!(
            len <= self.nframes - idx,
            "slice of {len} frames from {idx} overruns {} frames",
            self.nframes
        );
        let idx = idx.min(self.nframes);
        let len = len.min(self.nframes - idx);
        Self {
            audio: core::array::from_fn(|channel| self.audio[channel].slice_len(idx, len)),
            midi: self.midi,
            nframes: len,
        }
    }

    /// Swaps in a MIDI batch that may live shorter than the audio.
    ///
    /// Lets a stage hand its own event buffer to nested stages.
    pub fn replace_midi<'b>(self, midi: MidiEvents<'b>) -> ProcessPacket<'b, N>
    where
        'a: 'b,
    {
        ProcessPacket {
            audio: self.audio,
            midi,
            nframes: self.nframes,
        }
    }

    /// Raw per-channel pointers for buffer-oriented APIs.
    ///
    /// No ownership is transferred; the pointers are valid for
    /// [`nframes`](Self::nframes) samples while this packet is alive.
    pub fn raw_audio_buffers(&self) -> [*mut f32; N] {
        core::array::from_fn(|channel| self.audio[channel].as_mut_ptr())
    }
}

impl<'a> ProcessPacket<'a, 0> {
    /// A MIDI-only packet.
    pub fn from_midi(midi: MidiEvents<'a>, nframes: usize) -> Self {
        Self {
            audio: [],
            midi,
            nframes,
        }
    }
}

impl<'a> From<BufferHandle<'a>> for ProcessPacket<'a, 1> {
    fn from(handle: BufferHandle<'a>) -> Self {
        Self::from_audio([handle])
    }
}
