//! Vehicle-state playback policy.

use crate::{Error, Result};

/// Vehicle telemetry relevant to playback and volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleState {
    pub engine_running: bool,
    pub ignition_on: bool,
    pub camera_inside: bool,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            engine_running: false,
            ignition_on: false,
            camera_inside: true,
        }
    }
}

/// Whether the vehicle allows playback: engine running or ignition on.
pub fn may_play(vehicle: &VehicleState) -> bool {
    vehicle.engine_running || vehicle.ignition_on
}

/// Decides pauses and vetoes from vehicle state. Never resumes playback.
///
/// A pause is issued once per loss of permission; the latch clears on the
/// next authoritative player update, so a later loss pauses again.
#[derive(Debug, Default)]
pub struct PlaybackPolicy {
    pause_pending: bool,
}

impl PlaybackPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when a pause must be sent to the player now.
    pub fn on_vehicle_state_changed(&mut self, vehicle: &VehicleState, is_playing: bool) -> bool {
        if !is_playing || may_play(vehicle) || self.pause_pending {
            return false;
        }
        self.pause_pending = true;
        true
    }

    /// Player reported fresh state; a later loss of permission pauses again.
    pub fn on_player_update(&mut self) {
        self.pause_pending = false;
    }

    /// Gate a toggle. Pausing is always allowed; starting needs permission.
    pub fn check_toggle(&self, vehicle: &VehicleState, is_playing: bool) -> Result<()> {
        if is_playing {
            return Ok(());
        }
        self.check_start(vehicle)
    }

    pub fn check_start(&self, vehicle: &VehicleState) -> Result<()> {
        if may_play(vehicle) {
            Ok(())
        } else {
            Err(Error::PlaybackNotPermitted)
        }
    }

    pub fn is_pause_pending(&self) -> bool {
        self.pause_pending
    }
}
