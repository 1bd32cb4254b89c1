/// Sound engine: small procedural chimes via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::games::Cue;
use crate::journey::Feedback;
use crate::sim::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Item,
    Heart,
    Love,
    Trap,
    ExitBlocked,
    Complete,
    Correct,
    Wrong,
    Solved,
}

impl Sfx {
    pub const ALL: [Sfx; 9] = [
        Sfx::Item,
        Sfx::Heart,
        Sfx::Love,
        Sfx::Trap,
        Sfx::ExitBlocked,
        Sfx::Complete,
        Sfx::Correct,
        Sfx::Wrong,
        Sfx::Solved,
    ];
}

/// Which effect, if any, a piece of feedback makes.
pub fn sfx_for(feedback: &Feedback) -> Option<Sfx> {
    match feedback {
        Feedback::Scene(event) => match event {
            GameEvent::ItemCollected { .. } => Some(Sfx::Item),
            GameEvent::HeartCollected { .. } => Some(Sfx::Heart),
            GameEvent::AllHeartsCollected => Some(Sfx::Love),
            GameEvent::TrapTriggered { .. } => Some(Sfx::Trap),
            GameEvent::ExitBlocked => Some(Sfx::ExitBlocked),
            GameEvent::LevelComplete => Some(Sfx::Complete),
            _ => None,
        },
        Feedback::Cue(Cue::Correct) => Some(Sfx::Correct),
        Feedback::Cue(Cue::Wrong) => Some(Sfx::Wrong),
        Feedback::Cue(Cue::Solved) => Some(Sfx::Solved),
        Feedback::Restarted | Feedback::StageEntered(_) => None,
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    /// Pre-generated WAV buffers, indexed like `Sfx::ALL`.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let buffers = Sfx::ALL.iter().map(|&s| Arc::new(make_wav(&generate(s)))).collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(sfx as usize) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    fn generate(sfx: Sfx) -> Vec<f32> {
        match sfx {
            // C6 → E6 → G6 sparkle
            Sfx::Item => gen_notes(&[(1047.0, 0.045), (1319.0, 0.045), (1568.0, 0.06)], 0.25, 0.3),
            // Soft G5 → C6
            Sfx::Heart => gen_notes(&[(784.0, 0.08), (1047.0, 0.16)], 0.28, 0.1),
            // Rising major arpeggio, held top note
            Sfx::Love => gen_notes(
                &[(523.0, 0.09), (659.0, 0.09), (784.0, 0.09), (1047.0, 0.09), (1319.0, 0.3)],
                0.28,
                0.15,
            ),
            Sfx::Trap => gen_noise_drop(0.18),
            // Low double buzz
            Sfx::ExitBlocked => gen_notes(&[(196.0, 0.07), (0.0, 0.04), (196.0, 0.09)], 0.22, 0.5),
            Sfx::Complete => {
                let mut s = gen_notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1)], 0.3, 0.3);
                s.extend(gen_notes(&[(1047.0, 0.35)], 0.3, 0.3));
                s
            }
            Sfx::Correct => gen_notes(&[(880.0, 0.06), (1175.0, 0.12)], 0.25, 0.2),
            Sfx::Wrong => gen_notes(&[(330.0, 0.08), (262.0, 0.16)], 0.25, 0.4),
            Sfx::Solved => gen_notes(
                &[(659.0, 0.07), (784.0, 0.07), (988.0, 0.07), (1319.0, 0.2)],
                0.28,
                0.2,
            ),
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// A run of notes `(freq, seconds)`, each with a short decay.
    /// `overtone` mixes in the 3rd harmonic for a rounder tone.
    /// A frequency of 0 is a rest.
    fn gen_notes(notes: &[(f32, f32)], volume: f32, overtone: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                if freq <= 0.0 {
                    samples.push(0.0);
                    continue;
                }
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.6);
                let wave = (t * freq * TAU).sin() * (1.0 - overtone)
                    + (t * freq * 3.0 * TAU).sin() * overtone;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Falling tone under noise: something went wrong underfoot.
    fn gen_noise_drop(duration: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 2024;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 500.0 - t * 350.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * TAU).sin();
                // LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                (tone * 0.6 + noise * 0.4) * (1.0 - t).powf(0.7) * 0.3
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a 16-bit PCM buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}
