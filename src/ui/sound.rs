/// Sound engine: procedural 8-bit style effects via rodio.
///
/// Every effect is synthesized into an in-memory WAV buffer at init time;
/// playback is fire-and-forget through a detached Sink. Build without the
/// "sound" feature and the stub engine does nothing.

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = 2.0 * std::f32::consts::PI;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_pickup: Arc<Vec<u8>>,
        sfx_flap: Arc<Vec<u8>>,
        sfx_death: Arc<Vec<u8>>,
        sfx_wave: Arc<Vec<u8>>,
        sfx_point: Arc<Vec<u8>>,
        sfx_powerup: Arc<Vec<u8>>,
        // Line clears escalate: index = lines cleared - 1.
        sfx_lines: [Arc<Vec<u8>>; 4],
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_pickup: Arc::new(make_wav(&gen_pickup())),
                sfx_flap: Arc::new(make_wav(&gen_flap())),
                sfx_death: Arc::new(make_wav(&gen_death())),
                sfx_wave: Arc::new(make_wav(&gen_wave_clear())),
                sfx_point: Arc::new(make_wav(&gen_point())),
                sfx_powerup: Arc::new(make_wav(&gen_powerup())),
                sfx_lines: [
                    Arc::new(make_wav(&gen_lines(1))),
                    Arc::new(make_wav(&gen_lines(2))),
                    Arc::new(make_wav(&gen_lines(3))),
                    Arc::new(make_wav(&gen_lines(4))),
                ],
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_pickup(&self) {
            self.play(&self.sfx_pickup);
        }
        pub fn play_flap(&self) {
            self.play(&self.sfx_flap);
        }
        pub fn play_death(&self) {
            self.play(&self.sfx_death);
        }
        pub fn play_wave_clear(&self) {
            self.play(&self.sfx_wave);
        }
        pub fn play_point(&self) {
            self.play(&self.sfx_point);
        }
        pub fn play_powerup(&self) {
            self.play(&self.sfx_powerup);
        }
        pub fn play_lines(&self, n: u32) {
            let idx = (n.clamp(1, 4) - 1) as usize;
            self.play(&self.sfx_lines[idx]);
        }
    }

    // ── Waveform generators, all mono f32 samples ──

    fn tone(samples: &mut Vec<f32>, freq: f32, dur: f32, vol: f32) {
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(0.5);
            // Sine plus a dash of 3rd harmonic for the retro square-ish edge
            let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
            samples.push(wave * env * vol);
        }
    }

    /// Pellet or food pickup: quick two-note blip.
    fn gen_pickup() -> Vec<f32> {
        let mut s = Vec::new();
        tone(&mut s, 988.0, 0.04, 0.25); // B5
        tone(&mut s, 1319.0, 0.05, 0.25); // E6
        s
    }

    /// Wing flap: short upward chirp.
    fn gen_flap() -> Vec<f32> {
        let dur = 0.07;
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 250.0 + t * 350.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.7);
                (ti * freq * TAU).sin() * env * 0.22
            })
            .collect()
    }

    /// Death: descending minor run.
    fn gen_death() -> Vec<f32> {
        let notes = [440.0_f32, 370.0, 311.0, 261.0];
        let mut s = Vec::new();
        for &freq in &notes {
            tone(&mut s, freq, 0.12, 0.3);
        }
        // Fade the tail
        let total = s.len();
        let fade = total / 4;
        for i in (total - fade)..total {
            s[i] *= (total - i) as f32 / fade as f32;
        }
        s
    }

    /// Wave cleared: short rising fanfare.
    fn gen_wave_clear() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0];
        let mut s = Vec::new();
        for &freq in &notes {
            tone(&mut s, freq, 0.09, 0.3);
        }
        s
    }

    /// Rally point scored: single mid blip.
    fn gen_point() -> Vec<f32> {
        let mut s = Vec::new();
        tone(&mut s, 660.0, 0.08, 0.28);
        s
    }

    /// Power pellet: wobble between two notes.
    fn gen_powerup() -> Vec<f32> {
        let dur = 0.28;
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let wobble = 520.0 + 180.0 * (t * 26.0 * TAU).sin();
                let env = 1.0 - (i as f32 / n as f32);
                (t * wobble * TAU).sin() * env * 0.25
            })
            .collect()
    }

    /// Line clear: arpeggio that gets one note longer and higher per line.
    fn gen_lines(count: u32) -> Vec<f32> {
        let ladder = [523.0_f32, 659.0, 784.0, 1047.0, 1319.0, 1568.0, 2093.0];
        let mut s = Vec::new();
        let notes = (count as usize + 1).min(ladder.len());
        for &freq in ladder.iter().take(notes) {
            tone(&mut s, freq, 0.06, 0.28);
        }
        s
    }

    // ── WAV encoder: wrap f32 samples into a 16-bit PCM buffer ──

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
            let clamped = s.clamp(-1.0, 1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play_pickup(&self) {}
    pub fn play_flap(&self) {}
    pub fn play_death(&self) {}
    pub fn play_wave_clear(&self) {}
    pub fn play_point(&self) {}
    pub fn play_powerup(&self) {}
    pub fn play_lines(&self, _n: u32) {}
}
