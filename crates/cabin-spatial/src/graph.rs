//! The cabin processing graph.
//!
//! ```text
//! stream ─► router ─L─► renderer(frontLeft)  ─┐
//!                  ├L─► renderer(rearLeft)   ─┤
//!                  └R─► renderer(frontRight) ─┴► combiner ─► amplitude ─► sink
//! ```
//!
//! With no renderers, or after the graph rejects renderer wiring, the combiner
//! is a plain stereo passthrough fed straight from the router. An output sink
//! that fails to start leaves the manager detached.

use crate::listener::ListenerParams;
use crate::nodes;
use crate::positioner::{EarGains, PannerConfig, SpatialPositioner};
use crate::speaker::{LayoutObserver, SpeakerMount};
use crate::{Error, Result};
use cabin_core::{CabinNet, Connection, NodeId, OfflineSink, OutputSink, StreamProvider};
use fundsp::prelude::{shared, Shared};
use std::collections::BTreeMap;

/// Volume factor applied while the camera is outside the cabin.
pub const OUTSIDE_CABIN_DAMPENING: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// No source attached.
    Detached,
    /// Per-speaker rendering.
    Spatial,
    /// Stereo passthrough: empty layout or degraded rendering.
    Passthrough,
}

struct BaseGraph {
    net: CabinNet,
    router: NodeId,
    combiner: NodeId,
    amplitude: NodeId,
    source_id: u64,
}

struct SpeakerRenderer {
    node: NodeId,
    mount: SpeakerMount,
    config: PannerConfig,
    left: Shared,
    right: Shared,
    gains: EarGains,
}

impl SpeakerRenderer {
    fn store_gains(&mut self, gains: EarGains) {
        self.gains = gains;
        self.left.set_value(gains.left);
        self.right.set_value(gains.right);
    }
}

/// Owns the processing graph and every renderer in it.
pub struct AudioGraphManager {
    sink: Box<dyn OutputSink>,
    sample_rate: f64,
    base: Option<BaseGraph>,
    renderers: BTreeMap<String, SpeakerRenderer>,
    layout: Vec<SpeakerMount>,
    listener: ListenerParams,
    positioner: SpatialPositioner,
    volume: f32,
    camera_inside: bool,
    gain: Shared,
    degraded: bool,
}

impl AudioGraphManager {
    pub fn builder() -> AudioGraphBuilder {
        AudioGraphBuilder::default()
    }

    /// Build the base graph around the provider's current stream and start the sink.
    ///
    /// Fails with `SourceUnavailable` while the provider has no stream; the
    /// caller retries. Re-attaching tears the previous graph down first. When
    /// the sink fails to start the graph is released again and `RenderingBackend`
    /// is returned.
    pub fn attach_source(&mut self, provider: &mut dyn StreamProvider) -> Result<()> {
        if self.base.is_some() {
            self.detach();
        }

        let handle = provider
            .stream_handle()
            .ok_or(cabin_core::Error::SourceUnavailable)?;
        let source_id = handle.id();

        let (mut net, backend) = CabinNet::with_io(2, 2);
        net.set_sample_rate(self.sample_rate);

        let router = net.add(nodes::router());
        let combiner = net.add(nodes::combiner(0));
        let amplitude = net.add(nodes::amplitude(&self.gain));

        net.connect_input(0, router, 0);
        net.connect_input(1, router, 1);
        net.connect_ports(router, 0, combiner, 0);
        net.connect_ports(router, 1, combiner, 1);
        net.connect_ports(combiner, 0, amplitude, 0);
        net.connect_ports(combiner, 1, amplitude, 1);
        net.connect_output(amplitude, 0, 0);
        net.connect_output(amplitude, 1, 1);

        self.base = Some(BaseGraph {
            net,
            router,
            combiner,
            amplitude,
            source_id,
        });
        self.degraded = false;

        let layout = self.layout.clone();
        self.sync_renderers(&layout);

        if let Err(e) = self.sink.start(backend, handle) {
            tracing::error!("output sink failed to start: {e}");
            self.detach();
            return Err(Error::Core(cabin_core::Error::RenderingBackend(e.to_string())));
        }

        tracing::info!(
            source = source_id,
            renderers = self.renderers.len(),
            "source attached"
        );
        Ok(())
    }

    /// Stop the sink and release every node. The layout is kept for the next attach.
    pub fn detach(&mut self) {
        self.sink.stop();
        self.renderers.clear();
        if let Some(base) = self.base.take() {
            tracing::info!(source = base.source_id, "source detached");
        }
        self.degraded = false;
    }

    /// Reconcile the renderer set with `mounts`. Idempotent.
    ///
    /// New mounts get a renderer wired to their side's router channel; removed
    /// mounts lose theirs. A mount that only moved keeps its node and has its
    /// gains recomputed. While detached the layout is stored for the next attach.
    pub fn apply_layout(&mut self, mounts: &[SpeakerMount]) {
        self.layout = mounts.to_vec();
        if self.base.is_some() && !self.degraded {
            self.sync_renderers(mounts);
        }
    }

    /// Set the user volume, clamped to `[0, 1]`.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.update_gain();
    }

    pub fn set_camera_inside(&mut self, inside: bool) {
        self.camera_inside = inside;
        self.update_gain();
    }

    /// Switch every renderer, current and future, between the spatial
    /// distance law and flat attenuation.
    pub fn set_spatial_enabled(&mut self, enabled: bool) {
        self.positioner.set_spatial_enabled(enabled);
        for renderer in self.renderers.values_mut() {
            renderer.config = self.positioner.with_distance_law(renderer.config);
            let gains = self.positioner.ear_gains(
                &renderer.config,
                renderer.mount.position,
                &self.listener,
            );
            renderer.store_gains(gains);
        }
        tracing::debug!(enabled, "spatial rendering toggled");
    }

    pub fn set_listener(&mut self, listener: ListenerParams) {
        self.listener = listener;
        for renderer in self.renderers.values_mut() {
            let gains = self.positioner.ear_gains(
                &renderer.config,
                renderer.mount.position,
                &self.listener,
            );
            renderer.store_gains(gains);
        }
    }

    pub fn listener(&self) -> ListenerParams {
        self.listener
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_camera_inside(&self) -> bool {
        self.camera_inside
    }

    /// Gain currently held by the amplitude controller.
    pub fn effective_gain(&self) -> f32 {
        self.gain.value()
    }

    pub fn is_spatial_enabled(&self) -> bool {
        self.positioner.is_spatial_enabled()
    }

    pub fn state(&self) -> GraphState {
        match &self.base {
            None => GraphState::Detached,
            Some(_) if self.degraded || self.renderers.is_empty() => GraphState::Passthrough,
            Some(_) => GraphState::Spatial,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Id of the attached stream, if any.
    pub fn attached_source(&self) -> Option<u64> {
        self.base.as_ref().map(|b| b.source_id)
    }

    pub fn layout(&self) -> &[SpeakerMount] {
        &self.layout
    }

    /// Names of the renderers in the graph, sorted.
    pub fn renderer_names(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }

    pub fn renderer_count(&self) -> usize {
        self.renderers.len()
    }

    pub fn renderer_gains(&self, name: &str) -> Option<EarGains> {
        self.renderers.get(name).map(|r| r.gains)
    }

    pub fn renderer_config(&self, name: &str) -> Option<&PannerConfig> {
        self.renderers.get(name).map(|r| &r.config)
    }

    pub fn renderer_position(&self, name: &str) -> Option<crate::vector::Vec3> {
        self.renderers.get(name).map(|r| r.mount.position)
    }

    /// Connections of the attached graph.
    pub fn connections(&self) -> &[Connection] {
        match &self.base {
            Some(base) => base.net.connections(),
            None => &[],
        }
    }

    /// Node id of the renderer for `name`.
    pub fn renderer_node(&self, name: &str) -> Option<NodeId> {
        self.renderers.get(name).map(|r| r.node)
    }

    pub fn router_node(&self) -> Option<NodeId> {
        self.base.as_ref().map(|b| b.router)
    }

    pub fn combiner_node(&self) -> Option<NodeId> {
        self.base.as_ref().map(|b| b.combiner)
    }

    fn update_gain(&mut self) {
        let dampening = if self.camera_inside {
            1.0
        } else {
            OUTSIDE_CABIN_DAMPENING
        };
        self.gain.set_value(self.volume * dampening);
    }

    fn sync_renderers(&mut self, mounts: &[SpeakerMount]) {
        let Some(base) = self.base.as_mut() else {
            return;
        };
        let mut structural = false;

        let stale: Vec<String> = self
            .renderers
            .iter()
            .filter(|(name, renderer)| {
                !mounts
                    .iter()
                    .any(|m| &m.name == *name && m.side == renderer.mount.side)
            })
            .map(|(name, _)| name.clone())
            .collect();

        for name in stale {
            if let Some(renderer) = self.renderers.remove(&name) {
                base.net.remove(renderer.node);
                tracing::debug!(speaker = %name, "renderer removed");
                structural = true;
            }
        }

        for mount in mounts {
            if let Some(renderer) = self.renderers.get_mut(&mount.name) {
                if renderer.mount.position != mount.position {
                    renderer.mount.position = mount.position;
                    let gains = self.positioner.ear_gains(
                        &renderer.config,
                        mount.position,
                        &self.listener,
                    );
                    renderer.store_gains(gains);
                    tracing::debug!(speaker = %mount.name, "renderer moved");
                }
                continue;
            }

            let config = self.positioner.renderer_config();
            let gains = self
                .positioner
                .ear_gains(&config, mount.position, &self.listener);
            let left = shared(gains.left);
            let right = shared(gains.right);

            let node = base.net.add(nodes::renderer(&left, &right));
            base.net.connect_ports(base.router, mount.side.channel(), node, 0);
            tracing::debug!(speaker = %mount.name, side = ?mount.side, "renderer added");

            self.renderers.insert(
                mount.name.clone(),
                SpeakerRenderer {
                    node,
                    mount: mount.clone(),
                    config,
                    left,
                    right,
                    gains,
                },
            );
            structural = true;
        }

        if structural {
            Self::rewire_combiner(base, &self.renderers);
        }
        base.net.commit();

        if base.net.has_error() {
            tracing::warn!("graph rejected renderer wiring; falling back to stereo passthrough");
            self.degrade();
        }
    }

    fn rewire_combiner(base: &mut BaseGraph, renderers: &BTreeMap<String, SpeakerRenderer>) {
        base.net.remove(base.combiner);
        let combiner = base.net.add(nodes::combiner(renderers.len()));

        if renderers.is_empty() {
            base.net.connect_ports(base.router, 0, combiner, 0);
            base.net.connect_ports(base.router, 1, combiner, 1);
        } else {
            for (i, renderer) in renderers.values().enumerate() {
                base.net.connect_ports(renderer.node, 0, combiner, 2 * i);
                base.net.connect_ports(renderer.node, 1, combiner, 2 * i + 1);
            }
        }
        base.net.connect_ports(combiner, 0, base.amplitude, 0);
        base.net.connect_ports(combiner, 1, base.amplitude, 1);
        base.combiner = combiner;
    }

    /// Drop every renderer and route the stream straight through.
    fn degrade(&mut self) {
        self.degraded = true;
        let Some(base) = self.base.as_mut() else {
            return;
        };
        for (_, renderer) in std::mem::take(&mut self.renderers) {
            base.net.remove(renderer.node);
        }
        Self::rewire_combiner(base, &self.renderers);
        base.net.commit();
        tracing::warn!("spatial rendering disabled, playing plain stereo");
    }
}

impl LayoutObserver for AudioGraphManager {
    fn layout_changed(&mut self, mounts: &[SpeakerMount]) {
        self.apply_layout(mounts);
    }
}

/// Builder for [`AudioGraphManager`].
///
/// Defaults: offline sink, 48 kHz, volume 0.8, camera inside, spatial on.
pub struct AudioGraphBuilder {
    sink: Option<Box<dyn OutputSink>>,
    sample_rate: f64,
    panner: PannerConfig,
    spatial_enabled: bool,
    volume: f32,
}

impl Default for AudioGraphBuilder {
    fn default() -> Self {
        Self {
            sink: None,
            sample_rate: 48_000.0,
            panner: PannerConfig::default(),
            spatial_enabled: true,
            volume: 0.8,
        }
    }
}

impl AudioGraphBuilder {
    pub fn sink(mut self, sink: Box<dyn OutputSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Renderer construction defaults.
    pub fn panner(mut self, config: PannerConfig) -> Self {
        self.panner = config;
        self
    }

    pub fn spatial_enabled(mut self, enabled: bool) -> Self {
        self.spatial_enabled = enabled;
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn build(self) -> Result<AudioGraphManager> {
        self.panner.validate()?;
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::Core(cabin_core::Error::InvalidConfig(format!(
                "sample_rate {} must be positive",
                self.sample_rate
            ))));
        }

        let mut graph = AudioGraphManager {
            sink: self
                .sink
                .unwrap_or_else(|| Box::new(OfflineSink::new())),
            sample_rate: self.sample_rate,
            base: None,
            renderers: BTreeMap::new(),
            layout: Vec::new(),
            listener: ListenerParams::default(),
            positioner: SpatialPositioner::new(self.panner, self.spatial_enabled),
            volume: 0.0,
            camera_inside: true,
            gain: shared(0.0),
            degraded: false,
        };
        graph.set_volume(self.volume);
        Ok(graph)
    }
}
