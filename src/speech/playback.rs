//! Audio playback to speakers

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use super::AudioSink;
use crate::{Error, Result};

/// Extra time allowed past the nominal clip length before giving up
const PLAYBACK_GRACE: Duration = Duration::from_millis(500);

/// Input frames per resampler pass
const RESAMPLE_CHUNK: usize = 1024;

/// Mono PCM decoded from a WAV file
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Samples in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Clip length
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    /// Convert to `to_rate`, keeping the clip length
    ///
    /// # Errors
    ///
    /// Returns error if either rate is zero or the resampler rejects them
    #[allow(clippy::cast_possible_truncation)]
    pub fn resample(&self, to_rate: u32) -> Result<Self> {
        use rubato::{FftFixedIn, Resampler};

        if self.sample_rate == 0 || to_rate == 0 {
            return Err(Error::Audio("cannot resample at 0 Hz".to_string()));
        }
        if to_rate == self.sample_rate || self.samples.is_empty() {
            return Ok(Self {
                samples: self.samples.clone(),
                sample_rate: to_rate,
            });
        }

        let mut resampler = FftFixedIn::<f64>::new(
            self.sample_rate as usize,
            to_rate as usize,
            RESAMPLE_CHUNK,
            2,
            1,
        )
        .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;

        let expected = (self.samples.len() as u64 * u64::from(to_rate))
            .div_ceil(u64::from(self.sample_rate)) as usize;
        let delay = resampler.output_delay();
        let chunk_size = resampler.input_frames_next();

        // Zero-pad so the tail and the resampler delay are flushed out
        let mut input: Vec<f64> = self.samples.iter().map(|&s| f64::from(s)).collect();
        let padded = (input.len() / chunk_size + 3) * chunk_size;
        input.resize(padded, 0.0);

        let mut output = Vec::with_capacity(expected + delay);
        for chunk in input.chunks(chunk_size) {
            let frames = resampler
                .process(&[chunk], None)
                .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
            output.extend(frames[0].iter().map(|&s| s as f32));
        }

        let samples = output.into_iter().skip(delay).take(expected).collect();

        Ok(Self {
            samples,
            sample_rate: to_rate,
        })
    }
}

/// Plays audio to the default output device
pub struct AudioPlayback {
    device_name: String,
}

impl AudioPlayback {
    /// Create a new audio playback instance
    ///
    /// # Errors
    ///
    /// Returns error if there is no output device
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let device_name = device.name().unwrap_or_default();
        tracing::debug!(device = %device_name, "audio playback initialized");

        Ok(Self { device_name })
    }

    /// Name of the output device found at startup
    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

#[async_trait]
impl AudioSink for AudioPlayback {
    async fn play(&self, wav: &[u8]) -> Result<()> {
        let audio = decode_wav(wav)?;

        // cpal streams are not Send; build and drive the stream on a blocking thread
        tokio::task::spawn_blocking(move || play_blocking(&audio))
            .await
            .map_err(|e| Error::Audio(format!("playback task panicked: {e}")))?
    }
}

/// Decode WAV bytes to mono f32 samples
///
/// Multi-channel audio is averaged down to one channel.
///
/// # Errors
///
/// Returns error if the bytes are not a supported WAV file
#[allow(clippy::cast_precision_loss)]
pub fn decode_wav(wav: &[u8]) -> Result<DecodedAudio> {
    let mut reader = hound::WavReader::new(Cursor::new(wav))
        .map_err(|e| Error::Audio(format!("WAV decode error: {e}")))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(format!("WAV decode error: {e}")))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Audio(format!("WAV decode error: {e}")))?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Find an output config at `sample_rate`, preferring mono
///
/// Falls back to the device's default config when no range covers the rate;
/// the caller resamples to whatever rate the returned config carries.
fn output_config(device: &cpal::Device, sample_rate: u32) -> Result<StreamConfig> {
    let rate = SampleRate(sample_rate);
    let supports = |c: &cpal::SupportedStreamConfigRange, channels: u16| {
        c.channels() == channels && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
    };

    let native = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| supports(c, 1))
        .or_else(|| {
            // Fallback: try stereo
            device
                .supported_output_configs()
                .ok()?
                .find(|c| supports(c, 2))
        });

    if let Some(supported) = native {
        return Ok(supported.with_sample_rate(rate).config());
    }

    let config = device
        .default_output_config()
        .map_err(|e| Error::Audio(e.to_string()))?
        .config();
    tracing::debug!(
        file_rate = sample_rate,
        device_rate = config.sample_rate.0,
        "sample rate not supported by device, resampling"
    );
    Ok(config)
}

/// Play samples, returning once the clip has been rendered
fn play_blocking(audio: &DecodedAudio) -> Result<()> {
    if audio.samples.is_empty() {
        return Ok(());
    }

    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device".to_string()))?;

    let config = output_config(&device, audio.sample_rate)?;
    let channels = usize::from(config.channels);
    let audio = audio.resample(config.sample_rate.0)?;

    let samples = Arc::new(audio.samples.clone());
    let position = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let stream = {
        let samples = Arc::clone(&samples);
        let position = Arc::clone(&position);
        let finished = Arc::clone(&finished);

        device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut pos = position.load(Ordering::Relaxed);
                    for frame in data.chunks_mut(channels) {
                        let sample = samples.get(pos).copied().unwrap_or_else(|| {
                            finished.store(true, Ordering::Release);
                            0.0
                        });
                        frame.fill(sample);
                        if pos < samples.len() {
                            pos += 1;
                        }
                    }
                    position.store(pos, Ordering::Relaxed);
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?
    };

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    let start = Instant::now();
    let timeout = audio.duration() + PLAYBACK_GRACE;

    while !finished.load(Ordering::Acquire) {
        if start.elapsed() > timeout {
            tracing::warn!(?timeout, "playback did not report completion, stopping");
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    // Let the device drain its last buffer
    std::thread::sleep(Duration::from_millis(100));

    drop(stream);
    tracing::debug!(samples = samples.len(), "playback complete");

    Ok(())
}
