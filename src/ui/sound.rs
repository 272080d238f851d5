/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// Every cue is generated as an in-memory WAV buffer at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink; the core
/// only ever sees the `AudioSink` trait.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use henhouse::sim::event::{AudioSink, SoundEvent};

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use henhouse::sim::event::SoundEvent;

    const SAMPLE_RATE: u32 = 22050;

    const ALL_CUES: [SoundEvent; 7] = [
        SoundEvent::Step,
        SoundEvent::Jump,
        SoundEvent::Fall,
        SoundEvent::Egg,
        SoundEvent::Grain,
        SoundEvent::Ladder,
        SoundEvent::Splat,
    ];

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        cues: HashMap<SoundEvent, Arc<Vec<u8>>>,
        tally: Arc<Vec<u8>>,
        clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let cues = ALL_CUES
                .iter()
                .map(|&e| (e, Arc::new(make_wav(&generate(e)))))
                .collect();

            Some(SoundEngine {
                _stream: stream,
                handle,
                cues,
                tally: Arc::new(make_wav(&tone(1568.0, 0.02, 0.2))),
                clear: Arc::new(make_wav(&gen_clear())),
            })
        }

        fn play_buf(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_event(&self, event: SoundEvent) {
            if let Some(buf) = self.cues.get(&event) {
                self.play_buf(buf);
            }
        }

        /// One bonus chunk moving into the score.
        pub fn play_tally(&self) {
            self.play_buf(&self.tally);
        }

        pub fn play_clear(&self) {
            self.play_buf(&self.clear);
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Sine note with a linear fade out.
    fn tone(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Frequency glide from `from` to `to` Hz.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                phase += (from + (to - from) * p) / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - p).powf(0.6) * volume
            })
            .collect()
    }

    /// Square-ish notes played back to back.
    fn arpeggio(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = samples_for(note_dur);
            samples.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
                wave * env * volume
            }));
        }
        samples
    }

    /// LCG noise burst for footfalls and the splat.
    fn noise(duration: f32, volume: f32, seed: u32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut rng = seed;
        (0..n)
            .map(|i| {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let white = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                white * (1.0 - i as f32 / n as f32) * volume
            })
            .collect()
    }

    fn generate(event: SoundEvent) -> Vec<f32> {
        match event {
            SoundEvent::Step => noise(0.025, 0.15, 7),
            SoundEvent::Ladder => tone(880.0, 0.02, 0.15),
            SoundEvent::Jump => sweep(300.0, 900.0, 0.12, 0.25),
            SoundEvent::Fall => sweep(700.0, 200.0, 0.2, 0.25),
            SoundEvent::Egg => arpeggio(&[1047.0, 1319.0, 1568.0], 0.04, 0.25),
            SoundEvent::Grain => arpeggio(&[784.0, 659.0], 0.05, 0.2),
            SoundEvent::Splat => {
                let mut s = arpeggio(&[440.0, 370.0, 311.0, 261.0], 0.1, 0.3);
                s.extend(noise(0.15, 0.35, 12345));
                s
            }
        }
    }

    /// Level clear: C5→E5→G5→C6 with a held last note.
    fn gen_clear() -> Vec<f32> {
        let mut samples = arpeggio(&[523.0, 659.0, 784.0], 0.1, 0.3);
        samples.extend(tone(1047.0, 0.3, 0.3));
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
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
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_event(&self, _event: SoundEvent) {}
    pub fn play_tally(&self) {}
    pub fn play_clear(&self) {}
}

/// Optional engine: no audio device means silence, never an error.
pub struct Speaker<'a>(pub Option<&'a SoundEngine>);

impl AudioSink for Speaker<'_> {
    fn play(&mut self, event: SoundEvent) {
        if let Some(engine) = self.0 {
            engine.play_event(event);
        }
    }
}
