// Audio cues for segment changes and the final-seconds countdown
// Tones are synthesized directly into a cpal output stream

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig, SupportedStreamConfig};

use crate::error::CueError;

/// Fade in/out length, avoids clicks at tone edges
const FADE_SECONDS: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    SegmentStart,
    Countdown,
}

impl Cue {
    fn frequency(&self) -> f32 {
        match self {
            Cue::SegmentStart => 880.0,
            Cue::Countdown => 660.0,
        }
    }

    fn seconds(&self) -> f32 {
        match self {
            Cue::SegmentStart => 0.45,
            Cue::Countdown => 0.12,
        }
    }
}

/// Sine tone with a linear fade at both ends; silent once finished.
#[derive(Debug, Clone)]
pub struct Tone {
    frequency: f32,
    sample_rate: f32,
    total_frames: u32,
    fade_frames: u32,
    frame: u32,
    volume: f32,
}

impl Tone {
    pub fn new(cue: Cue, sample_rate: u32, volume: f32) -> Self {
        let sample_rate = sample_rate as f32;
        Tone {
            frequency: cue.frequency(),
            sample_rate,
            total_frames: (cue.seconds() * sample_rate) as u32,
            fade_frames: ((FADE_SECONDS * sample_rate) as u32).max(1),
            frame: 0,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.frame >= self.total_frames
    }

    fn envelope(&self) -> f32 {
        let from_start = self.frame;
        let to_end = self.total_frames - self.frame;
        let edge = from_start.min(to_end) as f32;
        (edge / self.fade_frames as f32).min(1.0)
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.is_finished() {
            return 0.0;
        }
        let t = self.frame as f32 / self.sample_rate;
        let value = (t * self.frequency * std::f32::consts::TAU).sin() * self.envelope() * self.volume;
        self.frame += 1;
        value
    }
}

pub struct CuePlayer {
    device: Device,
    config: SupportedStreamConfig,
    volume: f32,
    // Kept alive until the next cue replaces it
    stream: Option<Stream>,
}

impl CuePlayer {
    /// Opens the default output device.
    pub fn new(volume: f32) -> Result<Self, CueError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(CueError::NoDevice)?;
        let config = device.default_output_config()?;

        tracing::info!(
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            "Audio cues ready"
        );

        Ok(Self {
            device,
            config,
            volume,
            stream: None,
        })
    }

    pub fn play(&mut self, cue: Cue) -> Result<(), CueError> {
        let tone = Tone::new(cue, self.config.sample_rate().0, self.volume);
        let config: StreamConfig = self.config.clone().into();

        let stream = match self.config.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&self.device, &config, tone)?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&self.device, &config, tone)?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&self.device, &config, tone)?,
            format => return Err(CueError::SampleFormat(format)),
        };
        stream.play()?;

        self.stream = Some(stream);
        Ok(())
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &Device,
        config: &StreamConfig,
        mut tone: Tone,
    ) -> Result<Stream, CueError> {
        let channels = config.channels as usize;
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let value = T::from_sample(tone.next_sample());
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                }
            },
            move |err| {
                tracing::warn!(error = %err, "Audio output error");
            },
            None,
        )?;

        Ok(stream)
    }
}
