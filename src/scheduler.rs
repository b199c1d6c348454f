// src/scheduler.rs

use crate::event::{EventBuffer, MidiEvent};

/// Upper bound on in-flight events.
pub const MAX_PENDING: usize = 4096;

/// A generated event waiting for its deadline.
#[derive(Debug, Clone, Copy)]
struct Pending {
    event: MidiEvent,

    /// Samples from the start of the current block until emission.
    /// Decremented by each block length until it falls inside a block.
    samples_remaining: usize,
}

/// Sample-accurate delay queue that survives across blocks.
///
/// Lifecycle per event: queued -> due -> emitted. An event is inserted once
/// by [`Scheduler::add`] and removed exactly once, in the block whose window
/// contains its deadline.
///
/// This struct is owned by the engine and only touched from the audio
/// thread. Storage is allocated up front.
pub struct Scheduler {
    queue: Vec<Pending>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            queue: Vec::with_capacity(MAX_PENDING),
        }
    }

    /// Queue `event` at `base_pos + delay_samples`, measured from the start
    /// of the current block.
    ///
    /// Returns `false` (and drops the event) if the queue is full.
    pub fn add(&mut self, event: MidiEvent, delay_samples: usize, base_pos: usize) -> bool {
        if self.queue.len() >= MAX_PENDING {
            return false;
        }

        self.queue.push(Pending {
            event,
            samples_remaining: base_pos.saturating_add(delay_samples),
        });
        true
    }

    /// Emit every event due within the next `num_samples` into `out`, at its
    /// intra-block offset, and age the rest by one block.
    ///
    /// Due events are appended in queue order; `out` is not re-sorted.
    pub fn process_block(&mut self, out: &mut EventBuffer, num_samples: usize) {
        self.queue.retain_mut(|pending| {
            if pending.samples_remaining < num_samples {
                out.add(pending.event, pending.samples_remaining);
                return false;
            }

            pending.samples_remaining -= num_samples;
            true
        });
    }

    /// Drop everything in flight.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_on(note: u8) -> MidiEvent {
        MidiEvent::NoteOn {
            channel: 0,
            note,
            velocity: 100,
        }
    }

    #[test]
    fn test_event_crosses_one_block_boundary() {
        let mut scheduler = Scheduler::new();
        let mut out = EventBuffer::new();

        scheduler.add(note_on(64), 100, 10);

        scheduler.process_block(&mut out, 64);
        assert!(out.is_empty(), "deadline 110 is past a 64-sample block");
        assert_eq!(scheduler.len(), 1);

        scheduler.process_block(&mut out, 64);
        assert_eq!(out.len(), 1);
        assert_eq!(out.as_slice()[0].offset, 46);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_zero_delay_emits_at_base_position() {
        let mut scheduler = Scheduler::new();
        let mut out = EventBuffer::new();

        scheduler.add(note_on(60), 0, 17);
        scheduler.process_block(&mut out, 64);

        assert_eq!(out.as_slice()[0].offset, 17);
    }

    #[test]
    fn test_deadline_on_block_edge_waits_one_block() {
        let mut scheduler = Scheduler::new();
        let mut out = EventBuffer::new();

        scheduler.add(note_on(60), 64, 0);
        scheduler.process_block(&mut out, 64);
        assert!(out.is_empty());

        scheduler.process_block(&mut out, 64);
        assert_eq!(out.as_slice()[0].offset, 0);
    }

    #[test]
    fn test_long_delay_spans_many_blocks() {
        let mut scheduler = Scheduler::new();
        let mut out = EventBuffer::new();

        scheduler.add(note_on(72), 1000, 5);

        let mut blocks = 0;
        while out.is_empty() {
            scheduler.process_block(&mut out, 128);
            blocks += 1;
        }

        // 1005 = 7 * 128 + 109
        assert_eq!(blocks, 8);
        assert_eq!(out.as_slice()[0].offset, 109);
    }

    #[test]
    fn test_same_block_events_keep_insertion_order() {
        let mut scheduler = Scheduler::new();
        let mut out = EventBuffer::new();

        scheduler.add(note_on(60), 30, 0);
        scheduler.add(note_on(64), 10, 0);
        scheduler.add(note_on(67), 300, 0);
        scheduler.add(note_on(72), 30, 0);

        scheduler.process_block(&mut out, 64);

        let emitted: Vec<_> = out.iter().map(|e| (e.event.note(), e.offset)).collect();
        assert_eq!(
            emitted,
            vec![(Some(60), 30), (Some(64), 10), (Some(72), 30)]
        );
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut scheduler = Scheduler::new();
        let mut out = EventBuffer::new();

        scheduler.add(note_on(60), 500, 0);
        scheduler.clear();
        scheduler.process_block(&mut out, 1024);

        assert!(out.is_empty());
    }

    #[test]
    fn test_full_queue_rejects() {
        let mut scheduler = Scheduler::new();
        for _ in 0..MAX_PENDING {
            assert!(scheduler.add(note_on(60), 10, 0));
        }
        assert!(!scheduler.add(note_on(60), 10, 0));
        assert_eq!(scheduler.len(), MAX_PENDING);
    }
}
