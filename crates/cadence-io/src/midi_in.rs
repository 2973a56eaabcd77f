//! Decoding of raw channel-voice MIDI from the driver.

use cadence_core::{MidiEvent, MidiMessage};

/// Decodes one raw MIDI message received `time` samples into the callback.
///
/// Only channel-voice messages are understood; system messages, running
/// status and truncated messages yield `None`. A note-on with velocity 0 is
/// reported as a note-off.
///
/// ```rust
/// use cadence_core::MidiMessage;
/// use cadence_io::decode_midi;
///
/// let event = decode_midi(12, &[0x93, 60, 100]).unwrap();
/// assert_eq!(event.time, 12);
/// assert_eq!(event.channel, 3);
/// assert_eq!(event.message, MidiMessage::NoteOn { note: 60, velocity: 100 });
/// ```
pub fn decode_midi(time: u32, bytes: &[u8]) -> Option<MidiEvent> {
    let (&status, data) = bytes.split_first()?;
    if status & 0x80 == 0 {
        return None;
    }
    let channel = status & 0x0F;
    let data1 = || data.first().map(|b| b & 0x7F);
    let data2 = || data.get(1).map(|b| b & 0x7F);

    let message = match status >> 4 {
        0x8 => MidiMessage::NoteOff {
            note: data1()?,
            velocity: data2()?,
        },
        0x9 => match (data1()?, data2()?) {
            (note, 0) => MidiMessage::NoteOff { note, velocity: 0 },
            (note, velocity) => MidiMessage::NoteOn { note, velocity },
        },
        0xA => MidiMessage::PolyPressure {
            note: data1()?,
            pressure: data2()?,
        },
        0xB => MidiMessage::ControlChange {
            controller: data1()?,
            value: data2()?,
        },
        0xC => MidiMessage::ProgramChange { program: data1()? },
        0xD => MidiMessage::ChannelPressure { pressure: data1()? },
        0xE => {
            let raw = i16::from(data1()?) | (i16::from(data2()?) << 7);
            MidiMessage::PitchBend { value: raw - 8192 }
        }
        _ => return None,
    };
    Some(MidiEvent::new(time, channel, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_and_control_messages() {
        assert_eq!(
            decode_midi(0, &[0x80, 64, 10]),
            Some(MidiEvent::note_off(0, 0, 64, 10))
        );
        assert_eq!(
            decode_midi(5, &[0xB1, 74, 127]),
            Some(MidiEvent::control_change(5, 1, 74, 127))
        );
        assert_eq!(
            decode_midi(0, &[0xC2, 9]).map(|e| e.message),
            Some(MidiMessage::ProgramChange { program: 9 })
        );
    }

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        assert_eq!(
            decode_midi(3, &[0x90, 60, 0]),
            Some(MidiEvent::note_off(3, 0, 60, 0))
        );
    }

    #[test]
    fn pitch_bend_is_centered() {
        let bend = |lsb, msb| decode_midi(0, &[0xE0, lsb, msb]).map(|e| e.message);
        assert_eq!(bend(0x00, 0x40), Some(MidiMessage::PitchBend { value: 0 }));
        assert_eq!(bend(0x00, 0x00), Some(MidiMessage::PitchBend { value: -8192 }));
        assert_eq!(bend(0x7F, 0x7F), Some(MidiMessage::PitchBend { value: 8191 }));
    }

    #[test]
    fn rejects_what_it_cannot_decode() {
        assert_eq!(decode_midi(0, &[]), None);
        assert_eq!(decode_midi(0, &[60, 100]), None, "running status");
        assert_eq!(decode_midi(0, &[0x90, 60]), None, "truncated");
        assert_eq!(decode_midi(0, &[0xF8]), None, "clock");
    }
}
