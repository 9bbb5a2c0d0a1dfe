//! Listener pose tracking.

use crate::graph::AudioGraphManager;
use crate::vector::Vec3;

/// Reference frame for every renderer's gain computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerParams {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for ListenerParams {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::FORWARD,
            up: Vec3::UP,
        }
    }
}

impl ListenerParams {
    /// Listener at `position` turned `yaw_radians` about the vertical axis.
    pub fn from_yaw(position: Vec3, yaw_radians: f32) -> Self {
        Self {
            position,
            forward: Vec3::new(yaw_radians.sin(), 0.0, yaw_radians.cos()),
            up: Vec3::UP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerPose {
    pub position: Vec3,
    pub yaw_radians: f32,
}

/// Follows the camera and writes its pose into the graph.
///
/// Poses snap instantly; there is no interpolation between telemetry ticks.
#[derive(Debug, Default)]
pub struct ListenerTracker {
    pose: Option<ListenerPose>,
}

impl ListenerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parameters written, or `None` if the pose was not finite.
    pub fn update_pose(
        &mut self,
        position: Vec3,
        yaw_radians: f32,
        graph: &mut AudioGraphManager,
    ) -> Option<ListenerParams> {
        if !position.is_finite() || !yaw_radians.is_finite() {
            tracing::debug!("ignoring non-finite listener pose");
            return None;
        }

        let params = ListenerParams::from_yaw(position, yaw_radians);
        self.pose = Some(ListenerPose {
            position,
            yaw_radians,
        });
        graph.set_listener(params);
        Some(params)
    }

    pub fn pose(&self) -> Option<ListenerPose> {
        self.pose
    }
}
