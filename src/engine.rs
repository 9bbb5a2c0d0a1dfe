//! The cooperative event-handling context.

use crate::config::RadioConfig;
use crate::events::{
    ConnectionStatus, HostMessage, InboundEvent, NoticeKind, Outbound, PlayerCommand,
    PlayerErrorKind, UiUpdate,
};
use crate::policy::{PlaybackPolicy, VehicleState};
use crate::Result;
use cabin_core::{AuthoritativeUpdate, ProgressSimulator, StreamProvider, TransitionResult};
use cabin_spatial::{AudioGraphManager, ListenerTracker, SpeakerRegistry};
use crossbeam_channel::Sender;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AttachRetry {
    retries_done: u32,
    due: Instant,
}

/// Owns every piece of radio state and processes one event at a time.
///
/// Nothing here blocks: timers are exposed through [`RadioEngine::next_deadline`]
/// and fired by [`RadioEngine::poll`]. Outbound messages go to the channel
/// returned by the builder.
pub struct RadioEngine {
    config: RadioConfig,
    graph: AudioGraphManager,
    speakers: SpeakerRegistry,
    listener: ListenerTracker,
    progress: ProgressSimulator,
    vehicle: VehicleState,
    policy: PlaybackPolicy,
    provider: Box<dyn StreamProvider>,
    status: ConnectionStatus,
    connected: bool,
    is_playing: bool,
    attach_retry: Option<AttachRetry>,
    spatial_notice_sent: bool,
    outbox: Sender<Outbound>,
}

impl RadioEngine {
    pub fn builder() -> crate::RadioEngineBuilder {
        crate::RadioEngineBuilder::default()
    }

    pub(crate) fn new(
        config: RadioConfig,
        graph: AudioGraphManager,
        provider: Box<dyn StreamProvider>,
        outbox: Sender<Outbound>,
    ) -> Self {
        let progress = ProgressSimulator::with_interval(config.progress_tick());
        Self {
            config,
            graph,
            speakers: SpeakerRegistry::new(),
            listener: ListenerTracker::new(),
            progress,
            vehicle: VehicleState::default(),
            policy: PlaybackPolicy::new(),
            provider,
            status: ConnectionStatus::Disconnected,
            connected: false,
            is_playing: false,
            attach_retry: None,
            spatial_notice_sent: false,
            outbox,
        }
    }

    /// Ask the host for the current vehicle state.
    pub fn start(&mut self) {
        self.send(Outbound::Ui(UiUpdate::ConnectionStatus {
            status: self.status,
        }));
        self.send(Outbound::Host(HostMessage::RequestVehicleInfo));
    }

    /// Process one inbound event to completion.
    ///
    /// Errors are already handled locally (logged, notice sent); they are
    /// returned so the caller can report them.
    pub fn handle(&mut self, event: InboundEvent, now: Instant) -> Result<()> {
        match event {
            InboundEvent::SpeakerLayout { positions } => {
                self.speakers.set_layout(&positions, &mut self.graph)?;
                if self.connected
                    && self.graph.attached_source().is_none()
                    && self.attach_retry.is_none()
                {
                    self.attach(now, 0);
                }
                self.check_degraded();
            }
            InboundEvent::CameraPose { position, rotation } => {
                self.listener.update_pose(position, rotation.y, &mut self.graph);
            }
            InboundEvent::VehicleState {
                engine_running,
                ignition_on,
            } => {
                self.vehicle.engine_running = engine_running;
                self.vehicle.ignition_on = ignition_on;
                self.send(Outbound::Ui(UiUpdate::VehicleStatus {
                    engine_running,
                    ignition_on,
                }));
                if self
                    .policy
                    .on_vehicle_state_changed(&self.vehicle, self.is_playing)
                {
                    tracing::info!("engine and ignition off, pausing playback");
                    self.send_player(PlayerCommand::Pause);
                }
            }
            InboundEvent::CameraLocation { is_inside } => {
                self.vehicle.camera_inside = is_inside;
                self.graph.set_camera_inside(is_inside);
                self.send(Outbound::Ui(UiUpdate::CameraStatus { inside: is_inside }));
            }
            InboundEvent::VehicleChanged => {
                self.send(Outbound::Host(HostMessage::RequestVehicleInfo));
            }
            InboundEvent::PlayerReady { device_id } => {
                tracing::info!(device = device_id.as_deref().unwrap_or("-"), "player ready");
                self.connected = true;
                self.set_status(ConnectionStatus::Connected);
                self.attach(now, 0);
            }
            InboundEvent::PlayerNotReady => {
                tracing::info!("player went offline");
                self.connected = false;
                self.set_status(ConnectionStatus::Disconnected);
            }
            InboundEvent::SourceReady => {
                if self.graph.attached_source().is_none() || self.attach_retry.is_some() {
                    self.attach(now, 0);
                }
            }
            InboundEvent::PlayerError { kind, message } => {
                tracing::error!(?kind, "player error: {message}");
                match kind {
                    PlayerErrorKind::Initialization => {
                        self.set_status(ConnectionStatus::ConnectionError)
                    }
                    PlayerErrorKind::Authentication => {
                        self.set_status(ConnectionStatus::AuthenticationError);
                        self.disconnect();
                    }
                    PlayerErrorKind::Account => self.set_status(ConnectionStatus::AccountError),
                    PlayerErrorKind::Playback => {}
                }
            }
            InboundEvent::PlayerStateChanged {
                track,
                position_ms,
                paused,
            } => self.on_player_state(track, position_ms, paused, now),
            InboundEvent::TogglePlayback => {
                if !self.connected {
                    tracing::debug!("toggle dropped: no player connected");
                    return Ok(());
                }
                if let Err(e) = self.policy.check_toggle(&self.vehicle, self.is_playing) {
                    self.send(Outbound::Ui(UiUpdate::Notice {
                        kind: NoticeKind::PlaybackNotPermitted,
                    }));
                    return Err(e);
                }
                self.send_player(PlayerCommand::TogglePlay);
            }
            InboundEvent::PreviousTrack => self.send_player(PlayerCommand::PreviousTrack),
            InboundEvent::NextTrack => self.send_player(PlayerCommand::NextTrack),
            InboundEvent::SetVolume { volume } => {
                self.graph.set_volume(volume);
                let volume = self.graph.volume();
                self.send_player(PlayerCommand::SetVolume { volume });
                self.send(Outbound::Host(HostMessage::VolumeChanged { volume }));
            }
            InboundEvent::SetSpatialAudio { enabled } => self.graph.set_spatial_enabled(enabled),
            InboundEvent::Disconnect => {
                self.disconnect();
                self.set_status(ConnectionStatus::Disconnected);
            }
        }
        Ok(())
    }

    /// Fire every timer due at `now`: progress ticks and attach retries.
    pub fn poll(&mut self, now: Instant) {
        if let Some(retry) = self.attach_retry.filter(|r| r.due <= now) {
            self.attach(now, retry.retries_done);
        }

        for result in self.progress.poll(now) {
            if matches!(
                result,
                TransitionResult::Advanced(_) | TransitionResult::Finished(_)
            ) {
                self.send_progress();
            }
        }
    }

    /// Earliest instant at which [`RadioEngine::poll`] has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        let retry = self.attach_retry.map(|r| r.due);
        match (self.progress.next_deadline(), retry) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Tear down the session: ticker cancelled, graph released, player dropped.
    pub fn disconnect(&mut self) {
        self.progress.stop();
        self.attach_retry = None;
        self.graph.detach();
        self.connected = false;
        if self.is_playing {
            self.is_playing = false;
            self.send(Outbound::Host(HostMessage::PlaybackStateChanged { is_playing: false }));
        }
        tracing::info!("session disconnected");
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    pub fn graph(&self) -> &AudioGraphManager {
        &self.graph
    }

    pub fn speakers(&self) -> &SpeakerRegistry {
        &self.speakers
    }

    pub fn listener(&self) -> &ListenerTracker {
        &self.listener
    }

    pub fn progress(&self) -> &ProgressSimulator {
        &self.progress
    }

    pub fn vehicle(&self) -> VehicleState {
        self.vehicle
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// When the next attach retry fires, if one is scheduled.
    pub fn attach_retry_due(&self) -> Option<Instant> {
        self.attach_retry.map(|r| r.due)
    }

    fn on_player_state(
        &mut self,
        track: Option<cabin_core::TrackInfo>,
        position_ms: u64,
        paused: bool,
        now: Instant,
    ) {
        self.policy.on_player_update();

        if let Some(track) = &track {
            self.send(Outbound::Ui(UiUpdate::Track {
                name: track.name.clone(),
                artists: track.artist_line(),
            }));
        }

        self.progress.apply(
            AuthoritativeUpdate {
                track,
                position_ms,
                paused,
            },
            now,
        );
        self.send_progress();

        let playing = !paused;
        if playing != self.is_playing {
            self.is_playing = playing;
            self.send(Outbound::Host(HostMessage::PlaybackStateChanged {
                is_playing: playing,
            }));
        }

        if self.connected {
            if let Some(current) = self.provider.current_source() {
                if self.graph.attached_source() != Some(current) {
                    tracing::info!(source = current, "player switched stream, re-attaching");
                    self.attach(now, 0);
                }
            }
        }
    }

    fn attach(&mut self, now: Instant, retries_done: u32) {
        self.attach_retry = None;

        match self.graph.attach_source(self.provider.as_mut()) {
            Ok(()) => {
                self.spatial_notice_sent = false;
                self.check_degraded();
            }
            Err(e) if e.is_retryable() => {
                let retry = self.config.attach_retry;
                if retries_done >= retry.max_attempts {
                    tracing::warn!(
                        attempts = retries_done,
                        "stream source still unavailable, waiting for sourceReady"
                    );
                    return;
                }
                let delay = retry.delay(retries_done);
                tracing::debug!(
                    ?delay,
                    attempt = retries_done + 1,
                    "stream source not ready, retrying"
                );
                self.attach_retry = Some(AttachRetry {
                    retries_done: retries_done + 1,
                    due: now + delay,
                });
            }
            Err(e) => {
                tracing::error!("attaching stream source failed: {e}");
                self.notify_spatial_unavailable();
            }
        }
    }

    fn check_degraded(&mut self) {
        if self.graph.is_degraded() {
            self.notify_spatial_unavailable();
        }
    }

    fn notify_spatial_unavailable(&mut self) {
        if self.spatial_notice_sent {
            return;
        }
        self.spatial_notice_sent = true;
        self.send(Outbound::Ui(UiUpdate::Notice {
            kind: NoticeKind::SpatialUnavailable,
        }));
    }

    fn send_progress(&self) {
        if let Some(clock) = self.progress.clock() {
            self.send(Outbound::Ui(UiUpdate::Progress {
                position_ms: clock.position_ms(),
                duration_ms: clock.duration_ms(),
                elapsed: clock.elapsed(),
                total: clock.total(),
            }));
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            tracing::info!(?status, "connection status changed");
        }
        self.status = status;
        self.send(Outbound::Ui(UiUpdate::ConnectionStatus { status }));
    }

    fn send_player(&self, command: PlayerCommand) {
        if !self.connected {
            tracing::debug!(?command, "player command dropped: no player connected");
            return;
        }
        self.send(Outbound::Player(command));
    }

    fn send(&self, message: Outbound) {
        if self.outbox.send(message).is_err() {
            tracing::debug!("outbound receiver dropped");
        }
    }
}
