// src/engine.rs

use log::{debug, warn};

use crate::chord::Chord;
use crate::event::{EventBuffer, MidiEvent, TimedEvent};
use crate::mapper::{Direction, VoiceLeader, t_voice_note};
use crate::quantizer::quantize;
use crate::scheduler::Scheduler;
use crate::state::{MAX_T_VOICES, Settings};
use crate::transport::Transport;

/// Preallocated output events per block.
const OUTPUT_CAPACITY: usize = 512;

/// Block processor: M-voice in, M-voice (optional) plus delayed T-voice out.
///
/// This struct runs exclusively on the audio thread. It owns all state that
/// persists between blocks (orbit parity, held-note directions and the
/// delay queue); everything else is rebuilt from the settings snapshot at
/// the start of each block.
pub struct Engine {
    /// Clamped settings snapshot
    settings: Settings,

    /// Active triad, rebuilt per block
    chord: Chord,

    /// Orbit parity and held-note directions
    leader: VoiceLeader,

    /// Delayed T-voice events
    scheduler: Scheduler,

    /// Tempo, sample rate and block clock
    transport: Transport,

    /// Output assembled for the current block
    output: EventBuffer,

    /// Events the scheduler refused in the current block
    dropped: usize,
}

impl Engine {
    pub fn new(settings: Settings, sample_rate: f64) -> Self {
        let settings = settings.clamped();
        let transport = Transport {
            bpm: settings.bpm,
            ..Transport::new(sample_rate)
        };

        Self {
            chord: Chord::from_triad(settings.root_note, settings.triad),
            settings,
            leader: VoiceLeader::new(),
            scheduler: Scheduler::new(),
            transport,
            output: EventBuffer::with_capacity(OUTPUT_CAPACITY),
            dropped: 0,
        }
    }

    // -------------------------------
    // MARK: Configuration
    // -------------------------------

    /// Install a new settings snapshot; takes effect at the next block.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings.clamped();
        debug!("settings updated: {:?}", self.settings);
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        self.settings.bpm = bpm;
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.transport.sample_rate = sample_rate;
    }

    #[inline]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    #[inline]
    pub fn chord(&self) -> &Chord {
        &self.chord
    }

    // -------------------------------
    // MARK: Processing
    // -------------------------------

    /// Transform one block of events in place.
    ///
    /// `midi` holds the block's input events with offsets in
    /// `[0, num_samples)`; on return it holds the output events (pass-through
    /// M-voice first, then T-voice events due in this block), unsorted.
    pub fn process_block(&mut self, midi: &mut EventBuffer, num_samples: usize) {
        self.chord
            .set_from_triad(self.settings.root_note, self.settings.triad);
        self.transport.bpm = self.settings.bpm;
        self.output.clear();

        if self.settings.m_voice_on {
            for timed in midi.iter() {
                self.output.push(*timed);
            }
        }

        let delay = self.settings.displacement().delay_samples(&self.transport);

        for &TimedEvent { offset, event } in midi.iter() {
            match event {
                MidiEvent::NoteOn {
                    channel,
                    note,
                    velocity,
                } => self.note_on(channel, note, velocity, offset, delay),

                MidiEvent::NoteOff { channel, note, .. } => {
                    self.note_off(channel, note, offset, delay)
                }

                MidiEvent::Other { .. } => {}
            }
        }

        self.scheduler.process_block(&mut self.output, num_samples);

        if self.dropped > 0 {
            warn!(
                "scheduler full, dropped {} T-voice events at sample {}",
                self.dropped, self.transport.sample_pos
            );
            self.dropped = 0;
        }

        midi.swap_with(&mut self.output);
        self.transport.advance_samples(num_samples);
    }

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8, pos: usize, delay: usize) {
        let Some(direction) = self.leader.note_on(self.settings.mode) else {
            return;
        };
        let velocity = self.settings.velocity_policy().apply(velocity);

        let mut pitches = [0u8; MAX_T_VOICES as usize];
        let voices = (self.settings.t_voices as usize).min(pitches.len());
        for (voice, pitch) in pitches[..voices].iter_mut().enumerate() {
            *pitch = self.t_note(note, direction, voice as u32);
            let event = MidiEvent::NoteOn {
                channel,
                note: *pitch,
                velocity,
            };
            self.schedule(event, delay, pos, voice == 0);
        }
        self.leader.hold(channel, note, &pitches[..voices]);
    }

    /// Release what the matching note-on started, whatever the settings are
    /// now. Orphans are mapped with the current settings.
    fn note_off(&mut self, channel: u8, note: u8, pos: usize, delay: usize) {
        if let Some(held) = self.leader.release(channel, note) {
            for (voice, &pitch) in held.notes().iter().enumerate() {
                self.schedule(note_off(channel, pitch), delay, pos, voice == 0);
            }
            return;
        }

        let Some(direction) = self.leader.orphan_direction(self.settings.mode) else {
            return;
        };
        for voice in 0..self.settings.t_voices {
            let pitch = self.t_note(note, direction, voice);
            self.schedule(note_off(channel, pitch), delay, pos, voice == 0);
        }
    }

    /// T-voice pitch for the `voice`-th stacked voice, clamped to MIDI range.
    fn t_note(&self, note: u8, direction: Direction, voice: u32) -> u8 {
        let quantized = quantize(
            i32::from(note),
            self.settings.scale,
            self.settings.root_note,
        );
        let mapped = t_voice_note(
            quantized,
            direction,
            self.settings.mode.steps() + voice,
            &self.chord,
            self.settings.octave_offset,
        );
        mapped.clamp(0, 127) as u8
    }

    /// Queue an event, plus its feedback echoes for the primary voice.
    fn schedule(&mut self, event: MidiEvent, delay: usize, pos: usize, with_repeats: bool) {
        if !self.scheduler.add(event, delay, pos) {
            self.dropped += 1;
        }

        if !with_repeats {
            return;
        }

        for repeat in 0..self.settings.feedback_repeats as usize {
            let echo_delay = delay.saturating_mul(repeat + 2);
            if !self.scheduler.add(event, echo_delay, pos) {
                self.dropped += 1;
            }
        }
    }

    // -------------------------------
    // MARK: Transport control
    // -------------------------------

    /// Drop in-flight T-voice events and zero orbit parity.
    ///
    /// Called on playback start, stop and seek.
    pub fn reset(&mut self) {
        debug!(
            "reset: dropping {} pending events, orbit counter was {}",
            self.scheduler.len(),
            self.leader.orbit_counter()
        );
        self.scheduler.clear();
        self.leader.reset();
        self.transport.rewind();
    }

    /// Number of T-voice events waiting in the delay queue.
    #[inline]
    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    #[inline]
    pub fn orbit_counter(&self) -> u64 {
        self.leader.orbit_counter()
    }
}

fn note_off(channel: u8, note: u8) -> MidiEvent {
    MidiEvent::NoteOff {
        channel,
        note,
        velocity: 0,
    }
}
