use std::cell::Cell;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::Consumer;

use crate::engine::{config::EngineConfig, Engine};
use crate::error::DeviceError;
use crate::synth::message::EngineHandle;
use crate::MAX_BLOCK_SIZE;

/// Samples of final mix buffered for the recorder tap (~2s mono at 48kHz).
const TAP_CAPACITY: usize = 96_000;

/// The default output device running an [`Engine`] in its callback.
///
/// The engine renders mono; the callback fans each sample out to every
/// hardware channel. Device failure is surfaced once, here, as a
/// [`DeviceError`] - after a successful open the engine itself never raises a
/// user-visible error for play/stop traffic.
pub struct OutputDevice {
    stream: cpal::Stream,
    sample_rate: f32,
    channels: usize,
    resume_error_logged: Cell<bool>,
}

impl OutputDevice {
    /// Open the default output device, build an engine matched to its sample
    /// rate, and start the stream. Returns the device plus the control handle
    /// and the recorder tap.
    pub fn open(config: EngineConfig) -> Result<(Self, EngineHandle, Consumer<f32>), DeviceError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(DeviceError::NoDevice)?;
        let supported = device.default_output_config()?;

        let sample_rate = supported.sample_rate().0 as f32;
        let channels = supported.channels() as usize;

        let engine_config = EngineConfig {
            sample_rate,
            ..config
        };
        let (handle, mut engine) = Engine::channel(engine_config);
        let tap = engine.install_tap(TAP_CAPACITY);

        let mut block = vec![0.0f32; MAX_BLOCK_SIZE];
        let stream = device.build_output_stream(
            &supported.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut written = 0;

                while written < total_frames {
                    let frames = (total_frames - written).min(MAX_BLOCK_SIZE);
                    let chunk = &mut block[..frames];
                    engine.render_block(chunk);

                    // Mono engine output to every hardware channel.
                    let offset = written * channels;
                    for (i, &sample) in chunk.iter().enumerate() {
                        for ch in 0..channels {
                            data[offset + i * channels + ch] = sample;
                        }
                    }
                    written += frames;
                }
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        Ok((
            Self {
                stream,
                sample_rate,
                channels,
                resume_error_logged: Cell::new(false),
            },
            handle,
            tap,
        ))
    }

    /// Idempotent resume, folded into every note-on by the input adapters.
    /// A failure is logged once, not repeated per keypress; a later success
    /// re-arms the report.
    pub fn resume(&self) {
        match self.stream.play() {
            Ok(()) => self.resume_error_logged.set(false),
            Err(err) => {
                if !self.resume_error_logged.get() {
                    log::error!("failed to resume output stream: {err}");
                    self.resume_error_logged.set(true);
                }
            }
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}
