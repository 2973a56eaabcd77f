//! Decoded MIDI events and the per-callback event batch.
//!
//! Each callback carries one batch of already-decoded events, ordered by their
//! sample offset inside the callback window. The driver fills a [`MidiBuffer`]
//! (single writer), then every packet in the chain reads the same batch through
//! a [`MidiEvents`] view (broadcast). Reshaping a packet copies the view, never
//! the events.

use core::fmt;
use core::ops::Index;
use core::ptr;

use crate::error::{Error, Result};

/// Channel voice message carried by a [`MidiEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Key pressed.
    NoteOn {
        /// Note number (0-127).
        note: u8,
        /// Strike velocity (0-127).
        velocity: u8,
    },
    /// Key released.
    NoteOff {
        /// Note number (0-127).
        note: u8,
        /// Release velocity (0-127).
        velocity: u8,
    },
    /// Controller change.
    ControlChange {
        /// Controller number (0-127).
        controller: u8,
        /// Controller value (0-127).
        value: u8,
    },
    /// Program change.
    ProgramChange {
        /// Program number (0-127).
        program: u8,
    },
    /// Channel-wide aftertouch.
    ChannelPressure {
        /// Pressure (0-127).
        pressure: u8,
    },
    /// Per-key aftertouch.
    PolyPressure {
        /// Note number (0-127).
        note: u8,
        /// Pressure (0-127).
        pressure: u8,
    },
    /// Pitch wheel, centered at 0 (-8192..=8191).
    PitchBend {
        /// Signed bend amount.
        value: i16,
    },
}

/// A decoded MIDI message tagged with its sample offset in the callback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    /// Sample offset from the start of the callback window.
    pub time: u32,
    /// MIDI channel (0-15).
    pub channel: u8,
    /// The message.
    pub message: MidiMessage,
}

impl MidiEvent {
    /// Creates an event.
    pub fn new(time: u32, channel: u8, message: MidiMessage) -> Self {
        Self {
            time,
            channel,
            message,
        }
    }

    /// Note-on event.
    pub fn note_on(time: u32, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(time, channel, MidiMessage::NoteOn { note, velocity })
    }

    /// Note-off event.
    pub fn note_off(time: u32, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(time, channel, MidiMessage::NoteOff { note, velocity })
    }

    /// Control-change event.
    pub fn control_change(time: u32, channel: u8, controller: u8, value: u8) -> Self {
        Self::new(time, channel, MidiMessage::ControlChange { controller, value })
    }

    /// Pitch-bend event.
    pub fn pitch_bend(time: u32, channel: u8, value: i16) -> Self {
        Self::new(time, channel, MidiMessage::PitchBend { value })
    }

    /// Same event at a different offset.
    pub fn with_time(self, time: u32) -> Self {
        Self { time, ..self }
    }
}

/// Shared read-only view of one callback's ordered event batch.
///
/// `Copy`: every packet derived from another refers to the same events.
#[derive(Clone, Copy, Default)]
pub struct MidiEvents<'a> {
    events: &'a [MidiEvent],
}

impl<'a> MidiEvents<'a> {
    /// A batch with no events.
    pub const EMPTY: MidiEvents<'static> = MidiEvents { events: &[] };

    /// Views `events`, which must be ordered by time.
    pub fn new(events: &'a [MidiEvent]) -> Self {
        debug_assert!(
            events.windows(2).all(|pair| pair[0].time <= pair[1].time),
            "MIDI batch is not ordered by time"
        );
        Self { events }
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the batch has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at `index`.
    pub fn get(&self, index: usize) -> Option<&'a MidiEvent> {
        self.events.get(index)
    }

    /// The events as a slice.
    pub fn as_slice(&self) -> &'a [MidiEvent] {
        self.events
    }

    /// Iterates over the events in time order.
    pub fn iter(&self) -> core::slice::Iter<'a, MidiEvent> {
        self.events.iter()
    }

    /// Returns true if both views refer to the same underlying batch.
    pub fn same_batch(&self, other: &MidiEvents<'_>) -> bool {
        ptr::eq(self.events, other.events)
    }

    /// Events inside `[start, start + len)`, re-timed relative to `start`.
    ///
    /// [`ProcessPacket::slice`](crate::ProcessPacket::slice) keeps absolute
    /// offsets; stages working on a sliced packet use this to get offsets
    /// local to their window.
    pub fn window(self, start: u32, len: u32) -> impl Iterator<Item = MidiEvent> + 'a {
        let end = start.saturating_add(len);
        let first = self.events.partition_point(|event| event.time < start);
        self.events[first..]
            .iter()
            .take_while(move |event| event.time < end)
            .map(move |event| event.with_time(event.time - start))
    }
}

impl Index<usize> for MidiEvents<'_> {
    type Output = MidiEvent;

    fn index(&self, index: usize) -> &MidiEvent {
        &self.events[index]
    }
}

impl<'a> IntoIterator for MidiEvents<'a> {
    type Item = &'a MidiEvent;
    type IntoIter = core::slice::Iter<'a, MidiEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl fmt::Debug for MidiEvents<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.events).finish()
    }
}

/// Fixed-capacity, reusable storage for one callback's events.
///
/// Storage is reserved once; [`push`](Self::push) never reallocates and keeps
/// the batch sorted by time (events with equal times stay in arrival order).
#[derive(Debug, Clone)]
pub struct MidiBuffer {
    events: Vec<MidiEvent>,
    capacity: usize,
}

impl MidiBuffer {
    /// Default number of events per callback.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Reserves room for `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events are stored.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns true if another push would fail.
    pub fn is_full(&self) -> bool {
        self.events.len() >= self.capacity
    }

    /// Drops all events, keeping the storage.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Inserts `event` in time order.
    pub fn push(&mut self, event: MidiEvent) -> Result<()> {
        if self.is_full() {
            return Err(Error::MidiBufferFull {
                capacity: self.capacity,
            });
        }
        let at = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(at, event);
        Ok(())
    }

    /// Shared view for broadcasting to the processing chain.
    pub fn events(&self) -> MidiEvents<'_> {
        MidiEvents {
            events: &self.events,
        }
    }
}

impl Default for MidiBuffer {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}
