//! Property-based tests for cadence-core buffer bookkeeping.
//!
//! Drives the pool through random allocate/clone/slice/release/drop sequences
//! and checks that live-counts always equal the number of live handles, that
//! slices point where they should, and that MIDI batches stay ordered.

use cadence_core::{
    BufferHandle, BufferPool, ExhaustionPolicy, MidiBuffer, MidiEvent, MidiEvents, PoolConfig,
    ProcessPacket,
};
use proptest::prelude::*;

const BLOCK: usize = 64;
const SLOTS: usize = 8;

#[derive(Debug, Clone)]
enum Op {
    Allocate,
    Duplicate(usize),
    Slice(usize, usize),
    Release(usize),
    Discard(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Allocate),
        2 => any::<usize>().prop_map(Op::Duplicate),
        2 => (any::<usize>(), 0usize..=BLOCK).prop_map(|(i, s)| Op::Slice(i, s)),
        1 => any::<usize>().prop_map(Op::Release),
        2 => any::<usize>().prop_map(Op::Discard),
    ]
}

fn live_handles_on(handles: &[BufferHandle<'_>], slot: usize) -> u32 {
    let n = handles.iter().filter(|h| h.slot() == Some(slot)).count();
    u32::try_from(n).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// After any sequence of handle operations, every slot's live-count equals
    /// the number of unreleased handles viewing it, and `in_use` counts the
    /// slots with at least one.
    #[test]
    fn live_count_matches_live_handles(ops in prop::collection::vec(op(), 1..200)) {
        let pool = BufferPool::from_config(
            PoolConfig::new(BLOCK).with_slots(SLOTS).with_policy(ExhaustionPolicy::Panic),
        );
        let mut handles: Vec<BufferHandle<'_>> = Vec::new();

        for op in ops {
            match op {
                Op::Allocate => {
                    if let Ok(handle) = pool.try_allocate() {
                        handles.push(handle);
                    }
                }
                Op::Duplicate(i) if !handles.is_empty() => {
                    let copy = handles[i % handles.len()].clone();
                    handles.push(copy);
                }
                Op::Slice(i, start) if !handles.is_empty() => {
                    let source = &handles[i % handles.len()];
                    let start = start.min(source.len());
                    let view = source.slice(start);
                    handles.push(view);
                }
                Op::Release(i) if !handles.is_empty() => {
                    let len = handles.len();
                    handles[i % len].release();
                }
                Op::Discard(i) if !handles.is_empty() => {
                    let len = handles.len();
                    drop(handles.swap_remove(i % len));
                }
                _ => {}
            }

            for slot in 0..SLOTS {
                prop_assert_eq!(pool.reference_count(slot), live_handles_on(&handles, slot));
            }
            let busy = (0..SLOTS).filter(|&s| pool.reference_count(s) > 0).count();
            prop_assert_eq!(pool.in_use(), busy);
            prop_assert!(pool.high_water_mark() >= busy);
        }

        drop(handles);
        prop_assert_eq!(pool.in_use(), 0);
    }

    /// A slice starts `start` samples into its source, covers the requested
    /// length and adds exactly one share.
    #[test]
    fn slice_geometry(start in 0usize..=BLOCK, len_seed in any::<usize>()) {
        let pool = BufferPool::new(BLOCK);
        let handle = pool.allocate();
        let len = len_seed % (BLOCK - start + 1);

        let view = handle.slice_len(start, len);
        prop_assert_eq!(view.len(), len);
        prop_assert_eq!(handle.reference_count(), 2);
        prop_assert!(view.shares_slot(&handle));
        prop_assert_eq!(view.as_mut_ptr(), handle.as_mut_ptr().wrapping_add(start));
    }

    /// Whatever was written into a slot before, `allocate_clear` hands it out zeroed.
    #[test]
    fn allocate_clear_is_silent(value in -1.0f32..=1.0f32, rounds in 1usize..4) {
        let pool = BufferPool::with_slots(2, BLOCK);
        for _ in 0..rounds {
            let dirty = pool.allocate();
            dirty.fill(value);
        }
        let clean = pool.allocate_clear();
        prop_assert!(clean.iter().all(|s| s == 0.0));
    }

    /// Packet slicing shifts every channel by the same offset and shrinks
    /// `nframes` to match, without taking slots.
    #[test]
    fn packet_slice_shifts_all_channels(idx in 0usize..=BLOCK, len_seed in any::<usize>()) {
        let pool = BufferPool::new(BLOCK);
        let packet = ProcessPacket::from_audio(pool.allocate_multi::<3>());
        let base = packet.raw_audio_buffers();
        let len = len_seed % (BLOCK - idx + 1);

        let window = packet.slice_len(idx, len);
        prop_assert_eq!(window.nframes(), len);
        for (moved, original) in window.raw_audio_buffers().iter().zip(base) {
            prop_assert_eq!(*moved, original.wrapping_add(idx));
        }
        prop_assert_eq!(pool.in_use(), 3);
        for channel in window.audio() {
            prop_assert_eq!(channel.reference_count(), 1);
        }
    }

    /// Pushing events in any order yields a time-ordered batch, and stays
    /// ordered through a redirect.
    #[test]
    fn midi_batch_stays_ordered(times in prop::collection::vec(0u32..256, 0..64)) {
        let mut buffer = MidiBuffer::with_capacity(64);
        for (i, &time) in times.iter().enumerate() {
            let note = u8::try_from(i % 128).unwrap();
            buffer.push(MidiEvent::note_on(time, 0, note, 100)).unwrap();
        }
        prop_assert_eq!(buffer.len(), times.len());

        let pool = BufferPool::new(256);
        let packet = ProcessPacket::new([pool.allocate()], buffer.events(), 256);
        let stereo = packet.redirect(pool.allocate_multi::<2>());
        let events: MidiEvents<'_> = stereo.midi();
        prop_assert!(events.as_slice().windows(2).all(|w| w[0].time <= w[1].time));
        prop_assert!(events.same_batch(&buffer.events()));
    }
}
