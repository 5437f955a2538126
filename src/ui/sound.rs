/// Sound effects: procedural tones played through rodio.
///
/// Every effect is rendered once into an in-memory WAV at startup. One-shots
/// are fire-and-forget; the drill hum is a looping sink held until the cut
/// stops. Build without the "sound" feature for a silent no-op engine.

use crate::sim::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Toggle,
    Clank,
    Break,
    Upgrade,
    Refuel,
    FuelOut,
}

/// What to do with the audio for one simulation event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Play(Sfx),
    HumStart,
    HumStop,
}

/// Cues for an event, in playing order.
pub fn cues_for(event: &GameEvent) -> &'static [Cue] {
    match event {
        GameEvent::DrillToggled { .. } => &[Cue::Play(Sfx::Toggle)],
        GameEvent::StoneHit { .. } => &[Cue::Play(Sfx::Clank)],
        GameEvent::DrillStarted { .. } => &[Cue::HumStart],
        GameEvent::DrillStopped => &[Cue::HumStop],
        GameEvent::TileMined { .. } => &[Cue::HumStop, Cue::Play(Sfx::Break)],
        GameEvent::UpgradeApplied { .. } => &[Cue::Play(Sfx::Upgrade)],
        GameEvent::Refueled { .. } => &[Cue::Play(Sfx::Refuel)],
        GameEvent::FuelExhausted => &[Cue::HumStop, Cue::Play(Sfx::FuelOut)],
        GameEvent::PlayerFell => &[],
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::cell::RefCell;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

    use super::{cues_for, Cue, Sfx};
    use crate::sim::event::GameEvent;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        effects: Vec<(Sfx, Arc<Vec<u8>>)>,
        hum: Arc<Vec<u8>>,
        hum_sink: RefCell<Option<Sink>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let effects = [Sfx::Toggle, Sfx::Clank, Sfx::Break, Sfx::Upgrade, Sfx::Refuel, Sfx::FuelOut]
                .into_iter()
                .map(|sfx| (sfx, Arc::new(make_wav(&render(sfx)))))
                .collect();
            Some(SoundEngine {
                _stream: stream,
                handle,
                effects,
                hum: Arc::new(make_wav(&gen_hum())),
                hum_sink: RefCell::new(None),
            })
        }

        pub fn play_events(&self, events: &[GameEvent]) {
            for cue in events.iter().flat_map(cues_for) {
                match *cue {
                    Cue::Play(sfx) => self.play(sfx),
                    Cue::HumStart => self.start_hum(),
                    Cue::HumStop => self.stop_hum(),
                }
            }
        }

        pub fn stop_all(&self) {
            self.stop_hum();
        }

        fn play(&self, sfx: Sfx) {
            let Some((_, buf)) = self.effects.iter().find(|(s, _)| *s == sfx) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = Decoder::new(Cursor::new(buf.as_ref().clone())) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        fn start_hum(&self) {
            self.stop_hum();
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            if let Ok(src) = Decoder::new(Cursor::new(self.hum.as_ref().clone())) {
                sink.append(src.repeat_infinite());
                *self.hum_sink.borrow_mut() = Some(sink);
            }
        }

        fn stop_hum(&self) {
            if let Some(sink) = self.hum_sink.borrow_mut().take() {
                sink.stop();
            }
        }
    }

    // ── Waveforms (mono f32) ──

    fn render(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Toggle => tone(880.0, 880.0, 0.04, 0.2),
            Sfx::Clank => gen_clank(),
            Sfx::Break => gen_break(),
            Sfx::Upgrade => arpeggio(&[523.0, 659.0, 784.0, 1047.0], 0.07),
            Sfx::Refuel => tone(220.0, 660.0, 0.35, 0.25),
            Sfx::FuelOut => arpeggio(&[392.0, 330.0, 262.0, 196.0], 0.14),
        }
    }

    /// Sine sweep from `from` to `to` Hz with a linear fade.
    fn tone(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (from + (to - from) * t) * TAU / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - t) * volume
            })
            .collect()
    }

    fn arpeggio(notes: &[f32], note_dur: f32) -> Vec<f32> {
        notes.iter().flat_map(|&f| tone(f, f, note_dur, 0.25)).collect()
    }

    /// Metallic hit: two inharmonic partials, fast decay.
    fn gen_clank() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.18) as usize;
        (0..n)
            .map(|i| {
                let ts = i as f32 / SAMPLE_RATE as f32;
                let env = (-(i as f32) / n as f32 * 6.0).exp();
                ((ts * 1250.0 * TAU).sin() * 0.6 + (ts * 1870.0 * TAU).sin() * 0.4) * env * 0.3
            })
            .collect()
    }

    /// Crumble: LCG noise over a falling tone.
    fn gen_break() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.14) as usize;
        let mut seed: u32 = 12345;
        let body = tone(300.0, 120.0, 0.14, 1.0);
        (0..n)
            .map(|i| {
                seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (seed as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - i as f32 / n as f32).powf(0.8);
                (body.get(i).copied().unwrap_or(0.0) * 0.4 + noise * 0.6 * env) * 0.3
            })
            .collect()
    }

    /// One loopable period block of the drill motor.
    fn gen_hum() -> Vec<f32> {
        let n = SAMPLE_RATE as usize / 10;
        (0..n)
            .map(|i| {
                let ts = i as f32 / SAMPLE_RATE as f32;
                let saw = (ts * 110.0).fract() * 2.0 - 1.0;
                (saw * 0.5 + (ts * 220.0 * TAU).sin() * 0.5) * 0.12
            })
            .collect()
    }

    // ── WAV encoding: 16-bit PCM mono ──

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let data_size = samples.len() as u32 * 2;
        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&16u16.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_sizes() {
            let wav = make_wav(&render(Sfx::Clank));
            assert_eq!(&wav[0..4], b"RIFF");
            let data = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]) as usize;
            assert_eq!(wav.len(), 44 + data);
        }
    }
}

// ── Public API: no-ops without the sound feature ──

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_events(&self, _events: &[GameEvent]) {}
    pub fn stop_all(&self) {}
}
