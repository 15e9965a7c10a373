use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use log::error;

use crate::audio_api::AudioCommand;

mod effect;
mod engine;
mod frame;
mod sample_buffer;
mod sample_id;
mod voice;

pub use frame::StereoFrame;
pub use sample_buffer::SampleBuffer;
pub use sample_id::{SampleId, next_sample_id};

use engine::Engine;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    draw_rx: Receiver<usize>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn send(&self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }

    pub fn command_sender(&self) -> Sender<AudioCommand> {
        self.tx.clone()
    }

    /// Step cursor ticks emitted from the audio clock.
    pub fn poll_step(&self) -> Option<usize> {
        self.draw_rx.try_recv().ok()
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);
    let (draw_tx, draw_rx) = crossbeam_channel::bounded::<usize>(256);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;
    let config = device
        .default_output_config()
        .context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream =
                build_output_stream_f32(&device, &config.into(), rx, draw_tx, sample_rate, channels)?;
            output_stream.play().context("failed to play output stream")?;

            Ok(AudioHandle {
                tx,
                draw_rx,
                sample_rate,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    draw_tx: Sender<usize>,
    sample_rate: u32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate, draw_tx);
    let mut scratch: Vec<StereoFrame> = Vec::new();

    let err_fn = |err| error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels;
            scratch.resize(n_frames, StereoFrame::zero());
            engine.render_block(&mut scratch);

            for (i, frame) in scratch.iter().enumerate() {
                let base = i * channels;
                data[base] = frame.left;
                if channels > 1 {
                    data[base + 1] = frame.right;
                }
                for ch in 2..channels {
                    data[base + ch] = 0.0;
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
