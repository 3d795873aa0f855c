use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::error::AudioError;
use crate::signal::{AudioOutput, Sample, ToneRequest};

/// A stretch of sound waiting for the output callback. Zero frequency is silence.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Segment {
    frequency_hz: f32,
    samples: usize,
}

/// Sequential sine voice shared between the game thread and the audio callback
#[derive(Debug)]
pub struct Voice {
    sample_rate: u32,
    volume: f32,
    queue: VecDeque<Segment>,
    position: usize,
    phase: f64,
    // Envelope for click-free keying (in samples)
    ramp_samples: usize,
}

impl Voice {
    pub fn new(sample_rate: u32, volume: f32) -> Self {
        // Ramp time ~5ms to avoid clicks
        let ramp_samples = (sample_rate as f32 * 0.005) as usize;

        Self {
            sample_rate,
            volume: volume.clamp(0.0, 1.0),
            queue: VecDeque::new(),
            position: 0,
            phase: 0.0,
            ramp_samples,
        }
    }

    pub fn push(&mut self, frequency_hz: f32, duration: Duration) {
        let samples = (self.sample_rate as f64 * duration.as_secs_f64()) as usize;
        if samples > 0 {
            self.queue.push_back(Segment {
                frequency_hz,
                samples,
            });
        }
    }

    /// Queue one of the feedback sounds
    pub fn push_sample(&mut self, sample: Sample) {
        match sample {
            Sample::Bingo => {
                self.push(880.0, Duration::from_millis(110));
                self.push(0.0, Duration::from_millis(30));
                self.push(1320.0, Duration::from_millis(220));
            }
            Sample::Wrong => {
                self.push(180.0, Duration::from_millis(180));
                self.push(140.0, Duration::from_millis(260));
            }
        }
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.position = 0;
        self.phase = 0.0;
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn fill(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    fn next_sample(&mut self) -> f32 {
        while let Some(segment) = self.queue.front().copied() {
            if self.position >= segment.samples {
                self.queue.pop_front();
                self.position = 0;
                self.phase = 0.0;
                continue;
            }

            let value = if segment.frequency_hz > 0.0 {
                let wave = (self.phase * std::f64::consts::TAU).sin() as f32;
                self.phase += segment.frequency_hz as f64 / self.sample_rate as f64;
                if self.phase >= 1.0 {
                    self.phase -= 1.0;
                }
                wave * self.envelope(self.position, segment.samples)
            } else {
                0.0
            };
            self.position += 1;
            return value * self.volume;
        }

        0.0
    }

    /// Raised cosine attack and release
    fn envelope(&self, position: usize, total: usize) -> f32 {
        let ramp = self.ramp_samples.min(total / 2).max(1);
        let release_start = total.saturating_sub(ramp);

        if position < ramp {
            0.5 * (1.0 - (std::f32::consts::PI * position as f32 / ramp as f32).cos())
        } else if position >= release_start {
            let release_pos = position - release_start;
            0.5 * (1.0 + (std::f32::consts::PI * release_pos as f32 / ramp as f32).cos())
        } else {
            1.0
        }
    }
}

/// Sound through the default output device
pub struct CpalOutput {
    voice: Arc<Mutex<Voice>>,
    failed: Arc<AtomicBool>,
    _stream: cpal::Stream,
}

impl CpalOutput {
    pub fn new(volume: f32) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::Unavailable)?;

        let supported_config = device
            .default_output_config()
            .map_err(|e| AudioError::Build(e.to_string()))?;
        let sample_rate = supported_config.sample_rate().0;
        let sample_format = supported_config.sample_format();
        let config: cpal::StreamConfig = supported_config.into();

        let voice = Arc::new(Mutex::new(Voice::new(sample_rate, volume)));
        let failed = Arc::new(AtomicBool::new(false));

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config, Arc::clone(&voice), Arc::clone(&failed))
            }
            cpal::SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config, Arc::clone(&voice), Arc::clone(&failed))
            }
            cpal::SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config, Arc::clone(&voice), Arc::clone(&failed))
            }
            other => {
                return Err(AudioError::Build(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        }
        .map_err(|e| AudioError::Build(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        tracing::info!(sample_rate, channels = config.channels, "audio output ready");

        Ok(Self {
            voice,
            failed,
            _stream: stream,
        })
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        voice: Arc<Mutex<Voice>>,
        failed: Arc<AtomicBool>,
    ) -> Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;

        device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut mono = vec![0.0f32; data.len() / channels];
                if let Ok(mut voice) = voice.lock() {
                    voice.fill(&mut mono);
                }

                // duplicate mono to all channels
                for (frame, sample) in data.chunks_mut(channels).zip(mono.iter()) {
                    let converted: T = T::from_sample(*sample);
                    for channel_sample in frame.iter_mut() {
                        *channel_sample = converted;
                    }
                }
            },
            move |err| {
                tracing::warn!(%err, "audio stream error");
                failed.store(true, Ordering::Relaxed);
            },
            None,
        )
    }

    fn with_voice(&self, f: impl FnOnce(&mut Voice)) -> Result<(), AudioError> {
        if self.failed.load(Ordering::Relaxed) {
            return Err(AudioError::Stream("output stream stopped".to_string()));
        }
        let mut voice = self
            .voice
            .lock()
            .map_err(|_| AudioError::Stream("voice lock poisoned".to_string()))?;
        f(&mut voice);
        Ok(())
    }
}

impl AudioOutput for CpalOutput {
    fn start_tone(&mut self, tone: &ToneRequest) -> Result<(), AudioError> {
        self.with_voice(|voice| voice.push(tone.frequency_hz, tone.duration))
    }

    fn start_sample(&mut self, sample: Sample) -> Result<(), AudioError> {
        self.with_voice(|voice| voice.push_sample(sample))
    }

    fn start_silence(&mut self, duration: Duration) -> Result<(), AudioError> {
        self.with_voice(|voice| voice.push(0.0, duration))
    }

    fn stop(&mut self) {
        let _ = self.with_voice(Voice::clear);
    }
}

/// Accepts everything and makes no sound; playback timing is unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn start_tone(&mut self, _tone: &ToneRequest) -> Result<(), AudioError> {
        Ok(())
    }

    fn start_sample(&mut self, _sample: Sample) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Stand-in when no device could be opened: every request is refused
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableOutput;

impl AudioOutput for UnavailableOutput {
    fn start_tone(&mut self, _tone: &ToneRequest) -> Result<(), AudioError> {
        Err(AudioError::Unavailable)
    }

    fn start_sample(&mut self, _sample: Sample) -> Result<(), AudioError> {
        Err(AudioError::Unavailable)
    }
}

/// Pick a backend: silent when muted, the real device otherwise, and a refusing
/// stand-in when the device cannot be opened.
pub fn open_output(mute: bool, volume: f32) -> Box<dyn AudioOutput> {
    if mute {
        return Box::new(SilentOutput);
    }
    match CpalOutput::new(volume) {
        Ok(output) => Box::new(output),
        Err(err) => {
            tracing::warn!(%err, "audio unavailable, continuing without sound");
            Box::new(UnavailableOutput)
        }
    }
}
