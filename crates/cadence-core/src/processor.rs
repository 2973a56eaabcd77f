//! The processor contract and stock processors.
//!
//! Every engine and effect on the audio path implements [`Processor`]. The
//! driver calls it once per callback per chain stage with the callback's
//! [`ProcessPacket`].
//!
//! ## Real-time obligations
//!
//! A processor must:
//!
//! - touch audio and MIDI only for the duration of the call, and never keep a
//!   handle or the packet afterwards
//! - not allocate, lock, make syscalls or loop without bound
//! - treat [`nframes`](ProcessPacket::nframes) as the number of valid samples
//!   in every channel
//!
//! The core does not detect violations.

use crate::packet::ProcessPacket;

/// A stage that mutates an `N`-channel packet in place.
///
/// Closures taking `&mut ProcessPacket<'_, N>` are processors too.
///
/// # Example
///
/// ```rust
/// use cadence_core::{BufferPool, ProcessPacket, Processor};
///
/// struct Gain(f32);
///
/// impl Processor<1> for Gain {
///     fn process(&mut self, packet: &mut ProcessPacket<'_, 1>) {
///         let n = packet.nframes();
///         for sample in &packet.channel(0).cells()[..n] {
///             sample.set(sample.get() * self.0);
///         }
///     }
/// }
///
/// let pool = BufferPool::new(64);
/// let handle = pool.allocate();
/// handle.fill(1.0);
/// let mut packet = ProcessPacket::from(handle);
/// Gain(0.5).process(&mut packet);
/// assert_eq!(packet.channel(0).get(0), 0.5);
/// ```
pub trait Processor<const N: usize> {
    /// Processes one callback's worth of audio and MIDI.
    fn process(&mut self, packet: &mut ProcessPacket<'_, N>);
}

impl<F, const N: usize> Processor<N> for F
where
    F: FnMut(&mut ProcessPacket<'_, N>),
{
    fn process(&mut self, packet: &mut ProcessPacket<'_, N>) {
        self(packet);
    }
}

/// Extension trait for chaining processors with static dispatch.
///
/// For chains assembled at runtime use `Vec<Box<dyn Processor<N>>>`.
pub trait ProcessorExt<const N: usize>: Processor<N> + Sized {
    /// Runs `self`, then `next`, on the same packet.
    fn chain<P: Processor<N>>(self, next: P) -> Chain<Self, P> {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<T: Processor<N>, const N: usize> ProcessorExt<N> for T {}

/// Two processors run in series. Created by [`ProcessorExt::chain`].
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A, B, const N: usize> Processor<N> for Chain<A, B>
where
    A: Processor<N>,
    B: Processor<N>,
{
    #[inline]
    fn process(&mut self, packet: &mut ProcessPacket<'_, N>) {
        self.first.process(packet);
        self.second.process(packet);
    }
}

impl<A, B> Chain<A, B> {
    /// The first processor.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The first processor, mutably.
    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    /// The second processor.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// The second processor, mutably.
    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }
}

/// Leaves the packet untouched. Stands in for a switched-off effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl<const N: usize> Processor<N> for Passthrough {
    #[inline]
    fn process(&mut self, _packet: &mut ProcessPacket<'_, N>) {}
}

/// Zeroes the valid frames of every channel. Stands in for a switched-off synth.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl<const N: usize> Processor<N> for Silence {
    fn process(&mut self, packet: &mut ProcessPacket<'_, N>) {
        packet.clear_audio();
    }
}

/// Runs a MIDI-only processor on the event stream of any packet.
///
/// The inner stage sees a `ProcessPacket<0>` with this packet's MIDI and frame
/// count; whatever batch it leaves behind becomes this packet's MIDI.
#[derive(Debug, Clone, Default)]
pub struct MidiOnly<P>(pub P);

impl<P, const N: usize> Processor<N> for MidiOnly<P>
where
    P: Processor<0>,
{
    fn process(&mut self, packet: &mut ProcessPacket<'_, N>) {
        let mut midi = ProcessPacket::from_midi(packet.midi(), packet.nframes());
        self.0.process(&mut midi);
        packet.set_midi(midi.midi());
    }
}
