/// Sound cues: procedural chimes via rodio.
///
/// All cues are rendered to in-memory WAV buffers at startup and played
/// fire-and-forget through a detached `Sink`.
///
/// Build without the "sound" feature (or set `sound.enabled = false`) to
/// get a silent stub.

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::debug;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_turn: Arc<Vec<u8>>,
        sfx_message: Arc<Vec<u8>>,
        sfx_disconnect: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(err) => {
                    debug!(%err, "no audio output, sound disabled");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_turn: Arc::new(make_wav(&gen_turn_ready())),
                sfx_message: Arc::new(make_wav(&gen_blip(880.0, 0.04, 0.2))),
                sfx_disconnect: Arc::new(make_wav(&gen_disconnect())),
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

        pub fn play_turn_ready(&self) { self.play(&self.sfx_turn); }
        pub fn play_message(&self) { self.play(&self.sfx_message); }
        pub fn play_disconnect(&self) { self.play(&self.sfx_disconnect); }
    }

    // ── Waveforms (mono f32 samples) ──

    fn tone(freq: f32, duration: f32, volume: f32, out: &mut Vec<f32>) {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(0.5);
            let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.8
                + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.2;
            out.push(wave * env * volume);
        }
    }

    /// Short sine blip with a linear fade.
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32);
                (t * freq * 2.0 * std::f32::consts::PI).sin() * env * volume
            })
            .collect()
    }

    /// Your turn: rising two-note chime E5 → A5.
    fn gen_turn_ready() -> Vec<f32> {
        let mut samples = Vec::new();
        tone(659.0, 0.07, 0.25, &mut samples);
        tone(880.0, 0.14, 0.25, &mut samples);
        samples
    }

    /// Connection lost: falling three notes.
    fn gen_disconnect() -> Vec<f32> {
        let mut samples = Vec::new();
        for freq in [440.0_f32, 349.0, 262.0] {
            tone(freq, 0.12, 0.3, &mut samples);
        }
        samples
    }

    // ── WAV encoder: 16-bit PCM mono ──

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
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

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_sizes() {
            let wav = make_wav(&gen_blip(440.0, 0.01, 0.5));
            let samples = (SAMPLE_RATE as f32 * 0.01) as usize;
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples * 2);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]) as usize, samples * 2);
        }

        #[test]
        fn cues_stay_in_range() {
            for s in gen_turn_ready().into_iter().chain(gen_disconnect()) {
                assert!((-1.0..=1.0).contains(&s));
            }
        }
    }
}

// ── Public API: no-ops when the sound feature is off ──

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_turn_ready(&self) {}
    pub fn play_message(&self) {}
    pub fn play_disconnect(&self) {}
}
