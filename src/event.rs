// src/event.rs

/// ===============================
/// MIDI events
/// ===============================

/// A single MIDI channel message.
///
/// Channels are raw (0..=15). Anything that is not a note message is
/// carried through untouched as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, note: u8, velocity: u8 },

    NoteOff { channel: u8, note: u8, velocity: u8 },

    Other { status: u8, data1: u8, data2: u8 },
}

impl MidiEvent {
    /// Decode a raw three-byte channel message.
    ///
    /// A note-on with velocity 0 is decoded as a note-off.
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        let [status, data1, data2] = bytes;
        let channel = status & 0x0F;
        let note = data1 & 0x7F;
        let velocity = data2 & 0x7F;

        match status & 0xF0 {
            0x90 if velocity > 0 => MidiEvent::NoteOn {
                channel,
                note,
                velocity,
            },
            0x90 | 0x80 => MidiEvent::NoteOff {
                channel,
                note,
                velocity,
            },
            _ => MidiEvent::Other {
                status,
                data1,
                data2,
            },
        }
    }

    /// Encode back into a raw three-byte message.
    pub fn to_bytes(&self) -> [u8; 3] {
        match *self {
            MidiEvent::NoteOn {
                channel,
                note,
                velocity,
            } => [0x90 | (channel & 0x0F), note, velocity],
            MidiEvent::NoteOff {
                channel,
                note,
                velocity,
            } => [0x80 | (channel & 0x0F), note, velocity],
            MidiEvent::Other {
                status,
                data1,
                data2,
            } => [status, data1, data2],
        }
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self, MidiEvent::NoteOn { .. })
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(self, MidiEvent::NoteOff { .. })
    }

    /// Note number for note messages.
    pub fn note(&self) -> Option<u8> {
        match self {
            MidiEvent::NoteOn { note, .. } | MidiEvent::NoteOff { note, .. } => Some(*note),
            MidiEvent::Other { .. } => None,
        }
    }
}

/// ===============================
/// Block-relative event buffer
/// ===============================

/// An event positioned inside the current processing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    /// Sample offset from the start of the block.
    pub offset: usize,

    pub event: MidiEvent,
}

/// Events for one processing block, kept in insertion order.
///
/// Offsets are not sorted on insert; renderers that need ordering call
/// [`EventBuffer::sort_by_offset`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBuffer {
    events: Vec<TimedEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn add(&mut self, event: MidiEvent, offset: usize) {
        self.events.push(TimedEvent { offset, event });
    }

    #[inline]
    pub fn push(&mut self, timed: TimedEvent) {
        self.events.push(timed);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimedEvent> {
        self.events.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn swap_with(&mut self, other: &mut EventBuffer) {
        std::mem::swap(&mut self.events, &mut other.events);
    }

    /// Stable sort by block offset; same-offset events keep insertion order.
    pub fn sort_by_offset(&mut self) {
        self.events.sort_by_key(|e| e.offset);
    }

    pub fn as_slice(&self) -> &[TimedEvent] {
        &self.events
    }
}

impl<'a> IntoIterator for &'a EventBuffer {
    type Item = &'a TimedEvent;
    type IntoIter = std::slice::Iter<'a, TimedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl FromIterator<TimedEvent> for EventBuffer {
    fn from_iter<I: IntoIterator<Item = TimedEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_velocity_note_on_is_note_off() {
        let event = MidiEvent::from_bytes([0x93, 60, 0]);
        assert_eq!(
            event,
            MidiEvent::NoteOff {
                channel: 3,
                note: 60,
                velocity: 0
            }
        );
        assert!(event.is_note_off());
        assert!(!event.is_note_on());
    }

    #[test]
    fn test_controller_passes_as_other() {
        let event = MidiEvent::from_bytes([0xB0, 64, 127]);
        assert!(matches!(event, MidiEvent::Other { status: 0xB0, .. }));
        assert_eq!(event.note(), None);
        assert_eq!(event.to_bytes(), [0xB0, 64, 127]);
    }

    #[test]
    fn test_sort_keeps_insertion_order_for_equal_offsets() {
        let mut buffer = EventBuffer::new();
        let a = MidiEvent::from_bytes([0x90, 60, 100]);
        let b = MidiEvent::from_bytes([0x90, 64, 100]);
        let c = MidiEvent::from_bytes([0x90, 67, 100]);
        buffer.add(a, 20);
        buffer.add(b, 5);
        buffer.add(c, 20);

        buffer.sort_by_offset();

        let notes: Vec<_> = buffer.iter().filter_map(|e| e.event.note()).collect();
        assert_eq!(notes, vec![64, 60, 67]);
    }
}
