//! Builder for configuring and constructing a `RadioEngine`.

use crate::config::RadioConfig;
use crate::events::Outbound;
use crate::{RadioEngine, Result};
use cabin_core::{NoStream, OutputSink, StreamProvider};
use cabin_spatial::AudioGraphManager;
use crossbeam_channel::Receiver;

/// Without an explicit sink the engine plays to the default output device when
/// the `cpal` feature is enabled, and renders offline otherwise. Without a
/// provider no stream ever becomes available.
///
/// # Example
///
/// ```ignore
/// use cabin_radio::prelude::*;
///
/// let (mut engine, outbound) = RadioEngine::builder()
///     .config(RadioConfig::default())
///     .provider(Box::new(player))
///     .build()?;
///
/// engine.start();
/// engine.handle(InboundEvent::PlayerReady { device_id: None }, Instant::now())?;
/// ```
#[derive(Default)]
pub struct RadioEngineBuilder {
    config: RadioConfig,
    sink: Option<Box<dyn OutputSink>>,
    provider: Option<Box<dyn StreamProvider>>,
    output_device: Option<usize>,
}

impl RadioEngineBuilder {
    pub fn config(mut self, config: RadioConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sink(mut self, sink: Box<dyn OutputSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Source of the external player's stream handles.
    pub fn provider(mut self, provider: Box<dyn StreamProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Output device index for the hardware sink. Ignored without the `cpal` feature.
    pub fn output_device(mut self, index: usize) -> Self {
        self.output_device = Some(index);
        self
    }

    pub fn build(self) -> Result<(RadioEngine, Receiver<Outbound>)> {
        self.config.validate()?;

        let sink = match self.sink {
            Some(sink) => sink,
            None => default_sink(self.output_device),
        };

        let graph = AudioGraphManager::builder()
            .sink(sink)
            .sample_rate(self.config.sample_rate)
            .panner(self.config.renderer)
            .spatial_enabled(self.config.spatial_enabled)
            .volume(self.config.volume)
            .build()?;

        let provider = self.provider.unwrap_or_else(|| Box::new(NoStream));
        let (tx, rx) = crossbeam_channel::unbounded();

        Ok((RadioEngine::new(self.config, graph, provider, tx), rx))
    }
}

#[cfg(feature = "cpal")]
fn default_sink(device: Option<usize>) -> Box<dyn OutputSink> {
    Box::new(cabin_core::DeviceSink::new(device))
}

#[cfg(not(feature = "cpal"))]
fn default_sink(_device: Option<usize>) -> Box<dyn OutputSink> {
    Box::new(cabin_core::OfflineSink::new())
}
