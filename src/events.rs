//! Inbound and outbound messages.
//!
//! Inbound events come from the host (telemetry) and the external player;
//! they are JSON objects tagged by `type`. Outbound messages are tagged by
//! their destination (`target`): the player, the host, or the UI.

use cabin_core::TrackInfo;
use cabin_spatial::{MountSpec, Vec3};
use serde::{Deserialize, Serialize};

/// Camera rotation; only yaw is used.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    #[serde(default)]
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerErrorKind {
    Initialization,
    Authentication,
    Account,
    Playback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InboundEvent {
    // Host telemetry.
    #[serde(alias = "audioPositions")]
    SpeakerLayout {
        #[serde(alias = "mounts")]
        positions: Vec<MountSpec>,
    },
    #[serde(alias = "cameraPosition")]
    CameraPose { position: Vec3, rotation: Rotation },
    #[serde(alias = "vehicleInfo", alias = "setPlaybackState")]
    VehicleState {
        engine_running: bool,
        ignition_on: bool,
    },
    #[serde(alias = "updateAudioSettings")]
    CameraLocation { is_inside: bool },
    VehicleChanged,

    // External player.
    PlayerReady {
        #[serde(default)]
        device_id: Option<String>,
    },
    PlayerNotReady,
    SourceReady,
    PlayerError {
        kind: PlayerErrorKind,
        #[serde(default)]
        message: String,
    },
    PlayerStateChanged {
        track: Option<TrackInfo>,
        #[serde(default)]
        position_ms: u64,
        paused: bool,
    },

    // UI.
    TogglePlayback,
    PreviousTrack,
    NextTrack,
    SetVolume { volume: f32 },
    SetSpatialAudio { enabled: bool },
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PlayerCommand {
    TogglePlay,
    PreviousTrack,
    NextTrack,
    SetVolume { volume: f32 },
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    PlaybackStateChanged { is_playing: bool },
    VolumeChanged { volume: f32 },
    RequestVehicleInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
    ConnectionError,
    AuthenticationError,
    AccountError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeKind {
    PlaybackNotPermitted,
    SpatialUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UiUpdate {
    ConnectionStatus {
        status: ConnectionStatus,
    },
    Track {
        name: String,
        artists: String,
    },
    Progress {
        position_ms: u64,
        duration_ms: u64,
        elapsed: String,
        total: String,
    },
    VehicleStatus {
        engine_running: bool,
        ignition_on: bool,
    },
    CameraStatus {
        inside: bool,
    },
    Notice {
        kind: NoticeKind,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", content = "message", rename_all = "camelCase")]
pub enum Outbound {
    Player(PlayerCommand),
    Host(HostMessage),
    Ui(UiUpdate),
}
