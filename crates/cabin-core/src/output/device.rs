//! CPAL hardware output.

use super::OutputSink;
use crate::stream::StreamHandle;
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use fundsp::prelude::AudioUnit;
use fundsp::realnet::NetBackend;

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. This is safe because
/// `DeviceSink` is only driven from the single control context that owns the graph.
struct SendStream(#[allow(dead_code)] cpal::Stream);

unsafe impl Send for SendStream {}

/// Sink playing the graph on an output device.
pub struct DeviceSink {
    device_index: Option<usize>,
    stream: Option<SendStream>,
}

impl DeviceSink {
    /// `None` selects the host's default output device.
    pub fn new(device_index: Option<usize>) -> Self {
        Self {
            device_index,
            stream: None,
        }
    }
}

impl OutputSink for DeviceSink {
    fn start(&mut self, mut backend: NetBackend, source: StreamHandle) -> Result<()> {
        self.stop();

        let device = get_device(self.device_index)?;
        let config = device.default_output_config()?;
        backend.set_sample_rate(config.sample_rate().0 as f64);

        let cfg = config.config();
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &cfg, backend, source)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &cfg, backend, source)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &cfg, backend, source)?,
            format => {
                return Err(Error::RenderingBackend(format!(
                    "Unsupported sample format: {format:?}"
                )));
            }
        };

        stream.play()?;
        self.stream = Some(SendStream(stream));
        tracing::info!("device output started");
        Ok(())
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::info!("device output stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

fn get_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::RenderingBackend(format!(
                    "Device index {i} out of range ({count} available)"
                ))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::RenderingBackend("No output device available".into())),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut backend: NetBackend,
    mut source: StreamHandle,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut frame = [0.0f32; 2];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                for out in data.chunks_mut(channels) {
                    let (left, right) = source.next_frame();
                    backend.tick(&[left, right], &mut frame);
                    for (ch, sample) in out.iter_mut().enumerate() {
                        let value = if ch < 2 { frame[ch] } else { 0.0 };
                        *sample = T::from_sample(value);
                    }
                }
            }));

            if result.is_err() {
                output_silence(data);
            }
        },
        |err| tracing::error!("output stream error: {err}"),
        None,
    )?;

    Ok(stream)
}

/// Output silence (panic recovery).
#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0);
    }
}
