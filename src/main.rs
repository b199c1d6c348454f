// src/main.rs
//
// Offline sanity run: plays a short phrase through the engine block by
// block and prints every output event with its absolute sample time.
//
//     tintin-engine [preset.toml]
//
// Set RUST_LOG=debug to see engine logging.

use log::{error, info};

use tintin::{Engine, EventBuffer, MidiEvent, SYNC_LABELS, Settings};

const SAMPLE_RATE: f64 = 48_000.0;
const BLOCK_FRAMES: usize = 256;
const TAIL_BLOCKS: u64 = 400;

/// C major scale up and back down, one note per eighth at 120 bpm.
fn phrase() -> Vec<(u64, MidiEvent)> {
    const NOTES: [u8; 15] = [60, 62, 64, 65, 67, 69, 71, 72, 71, 69, 67, 65, 64, 62, 60];
    const STEP: u64 = 12_000;
    const LENGTH: u64 = 10_000;

    let mut script = Vec::with_capacity(NOTES.len() * 2);
    for (i, &note) in NOTES.iter().enumerate() {
        let start = i as u64 * STEP;
        script.push((
            start,
            MidiEvent::NoteOn {
                channel: 0,
                note,
                velocity: 96,
            },
        ));
        script.push((
            start + LENGTH,
            MidiEvent::NoteOff {
                channel: 0,
                note,
                velocity: 0,
            },
        ));
    }
    script
}

fn load_settings() -> Option<Settings> {
    match std::env::args().nth(1) {
        None => Some(Settings::default()),
        Some(path) => match Settings::load(&path) {
            Ok(settings) => {
                info!("loaded preset {}", path);
                Some(settings)
            }
            Err(e) => {
                error!("{}: {}", path, e);
                None
            }
        },
    }
}

fn describe(event: &MidiEvent) -> String {
    match event {
        MidiEvent::NoteOn {
            channel,
            note,
            velocity,
        } => format!("ch{} note-on  {:3} vel {:3}", channel, note, velocity),
        MidiEvent::NoteOff { channel, note, .. } => {
            format!("ch{} note-off {:3}", channel, note)
        }
        MidiEvent::Other {
            status,
            data1,
            data2,
        } => format!("{:02X} {:02X} {:02X}", status, data1, data2),
    }
}

fn main() {
    env_logger::init();

    let Some(settings) = load_settings() else {
        std::process::exit(1);
    };

    println!(
        "root {} {:?}, mode {:?}, scale {:?}, displacement {:?} ({} / {} ms), {} bpm",
        settings.root_note,
        settings.triad,
        settings.mode,
        settings.scale,
        settings.displacement_mode,
        SYNC_LABELS[settings.sync_index.clamp(0, 15) as usize],
        settings.displacement_ms,
        settings.bpm,
    );

    let mut engine = Engine::new(settings, SAMPLE_RATE);
    let script = phrase();
    let last_event = script.iter().map(|(at, _)| *at).max().unwrap_or(0);
    let total_blocks = last_event / BLOCK_FRAMES as u64 + TAIL_BLOCKS;

    let mut midi = EventBuffer::with_capacity(64);
    let mut note_ons = 0usize;
    let mut note_offs = 0usize;

    for block in 0..total_blocks {
        let block_start = block * BLOCK_FRAMES as u64;
        let block_end = block_start + BLOCK_FRAMES as u64;

        midi.clear();
        for &(at, event) in &script {
            if at >= block_start && at < block_end {
                midi.add(event, (at - block_start) as usize);
            }
        }

        engine.process_block(&mut midi, BLOCK_FRAMES);
        midi.sort_by_offset();

        for timed in midi.iter() {
            let at = block_start + timed.offset as u64;
            println!(
                "{:>8} ({:>7.3}s)  {}",
                at,
                at as f64 / SAMPLE_RATE,
                describe(&timed.event)
            );
            if timed.event.is_note_on() {
                note_ons += 1;
            } else if timed.event.is_note_off() {
                note_offs += 1;
            }
        }
    }

    println!(
        "{:.3}s rendered: {} note-ons, {} note-offs, {} still pending, orbit counter {}",
        engine.transport().seconds(),
        note_ons,
        note_offs,
        engine.pending_events(),
        engine.orbit_counter()
    );
}
