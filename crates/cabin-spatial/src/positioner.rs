//! Renderer configuration and the per-ear gain law.
//!
//! A renderer turns one channel of the stream into a stereo pair whose ear
//! gains make it appear to come from the speaker's mount point, relative to
//! the listener. Gain is the product of three terms:
//!
//! - distance attenuation (`Linear`, `Inverse` or `Exponential` law)
//! - source cone (omnidirectional for cabin speakers)
//! - head model: interaural level difference and elevation loss (`Hrtf`),
//!   or a plain equal-power pan (`EqualPower`)

use crate::listener::ListenerParams;
use crate::vector::Vec3;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Far-ear attenuation at full lateral offset.
const MAX_ILD_DB: f32 = 10.0;
/// Floor of the elevation attenuation.
const MIN_ELEVATION_FACTOR: f32 = 0.7;

/// Rolloff of the default inverse law used while spatial rendering is on.
pub const SPATIAL_ROLLOFF: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanningModel {
    #[default]
    Hrtf,
    EqualPower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistanceModel {
    Linear,
    #[default]
    Inverse,
    Exponential,
}

/// Per-renderer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PannerConfig {
    pub panning_model: PanningModel,
    pub distance_model: DistanceModel,
    pub ref_distance: f32,
    pub max_distance: f32,
    pub rolloff_factor: f32,
    /// Degrees, full angle.
    pub cone_inner_angle: f32,
    /// Degrees, full angle.
    pub cone_outer_angle: f32,
    pub cone_outer_gain: f32,
    /// Direction the source faces; only matters for directional cones.
    pub orientation: Vec3,
}

impl Default for PannerConfig {
    fn default() -> Self {
        Self {
            panning_model: PanningModel::Hrtf,
            distance_model: DistanceModel::Inverse,
            ref_distance: 1.0,
            max_distance: 10.0,
            rolloff_factor: SPATIAL_ROLLOFF,
            cone_inner_angle: 360.0,
            cone_outer_angle: 360.0,
            cone_outer_gain: 0.8,
            orientation: Vec3::new(1.0, 0.0, 0.0),
        }
    }
}

impl PannerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.ref_distance.is_finite() && self.ref_distance > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "ref_distance {} must be positive",
                self.ref_distance
            )));
        }
        if !(self.max_distance.is_finite() && self.max_distance > self.ref_distance) {
            return Err(Error::InvalidParameter(format!(
                "max_distance {} must exceed ref_distance {}",
                self.max_distance, self.ref_distance
            )));
        }
        if !(self.rolloff_factor.is_finite() && self.rolloff_factor >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "rolloff_factor {} must be non-negative",
                self.rolloff_factor
            )));
        }
        let cone_ok = (0.0..=360.0).contains(&self.cone_inner_angle)
            && (0.0..=360.0).contains(&self.cone_outer_angle)
            && self.cone_inner_angle <= self.cone_outer_angle;
        if !cone_ok {
            return Err(Error::InvalidParameter(format!(
                "cone angles {}/{} out of range",
                self.cone_inner_angle, self.cone_outer_angle
            )));
        }
        if !(0.0..=1.0).contains(&self.cone_outer_gain) {
            return Err(Error::InvalidParameter(format!(
                "cone_outer_gain {} out of range (0-1)",
                self.cone_outer_gain
            )));
        }
        if !self.orientation.is_finite() {
            return Err(Error::InvalidParameter("orientation is not finite".into()));
        }
        Ok(())
    }

    /// Attenuation for a source `distance` units from the listener.
    pub fn distance_gain(&self, distance: f32) -> f32 {
        let d = distance.clamp(self.ref_distance, self.max_distance);
        let gain = match self.distance_model {
            DistanceModel::Linear => {
                let rolloff = self.rolloff_factor.min(1.0);
                1.0 - rolloff * (d - self.ref_distance) / (self.max_distance - self.ref_distance)
            }
            DistanceModel::Inverse => {
                self.ref_distance
                    / (self.ref_distance + self.rolloff_factor * (d - self.ref_distance))
            }
            DistanceModel::Exponential => (d / self.ref_distance).powf(-self.rolloff_factor),
        };
        gain.clamp(0.0, 1.0)
    }

    /// Cone attenuation for a listener at `to_listener` relative to the source.
    pub fn cone_gain(&self, to_listener: Vec3) -> f32 {
        if self.cone_inner_angle >= 360.0 && self.cone_outer_angle >= 360.0 {
            return 1.0;
        }
        let (Some(facing), Some(direction)) =
            (self.orientation.normalized(), to_listener.normalized())
        else {
            return 1.0;
        };

        let angle = facing.dot(direction).clamp(-1.0, 1.0).acos().to_degrees();
        let inner = self.cone_inner_angle * 0.5;
        let outer = self.cone_outer_angle * 0.5;

        if angle <= inner {
            1.0
        } else if angle >= outer {
            self.cone_outer_gain
        } else {
            let x = (angle - inner) / (outer - inner);
            1.0 + (self.cone_outer_gain - 1.0) * x
        }
    }
}

/// Linear gains for the two ears.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarGains {
    pub left: f32,
    pub right: f32,
}

impl EarGains {
    fn scaled(self, gain: f32) -> Self {
        Self {
            left: self.left * gain,
            right: self.right * gain,
        }
    }
}

/// Direction of a source in the listener's frame, in degrees.
///
/// Azimuth is positive to the listener's left, elevation positive upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    pub azimuth: f32,
    pub elevation: f32,
    pub distance: f32,
}

impl Direction {
    pub fn of(source: Vec3, listener: &ListenerParams) -> Self {
        let offset = source - listener.position;
        let right = listener.forward.cross(listener.up);

        let x = offset.dot(right);
        let y = offset.dot(listener.up);
        let z = offset.dot(listener.forward);
        let horizontal = (x * x + z * z).sqrt();

        Self {
            azimuth: (-x).atan2(z).to_degrees(),
            elevation: y.atan2(horizontal).to_degrees(),
            distance: offset.length(),
        }
    }
}

fn head_gains(model: PanningModel, direction: Direction) -> EarGains {
    let lateral = direction.azimuth.to_radians().sin();

    match model {
        PanningModel::Hrtf => {
            let far = 10.0_f32.powf(-MAX_ILD_DB * lateral.abs() / 20.0);
            let elevation_factor =
                (1.0 - (direction.elevation.abs() / 90.0) * 0.3).max(MIN_ELEVATION_FACTOR);

            let ears = if lateral > 0.0 {
                EarGains { left: 1.0, right: far }
            } else {
                EarGains { left: far, right: 1.0 }
            };
            ears.scaled(elevation_factor)
        }
        PanningModel::EqualPower => {
            let pan = (1.0 - lateral) * 0.5;
            let angle = pan * core::f32::consts::FRAC_PI_2;
            EarGains {
                left: angle.cos(),
                right: angle.sin(),
            }
        }
    }
}

/// Renderer construction defaults and the gain law applied to every renderer.
#[derive(Debug, Clone)]
pub struct SpatialPositioner {
    defaults: PannerConfig,
    spatial_law: (DistanceModel, f32),
    spatial_enabled: bool,
}

impl SpatialPositioner {
    pub fn new(defaults: PannerConfig, spatial_enabled: bool) -> Self {
        let mut positioner = Self {
            defaults,
            spatial_law: (defaults.distance_model, defaults.rolloff_factor),
            spatial_enabled,
        };
        positioner.defaults = positioner.with_distance_law(defaults);
        positioner
    }

    /// Configuration for a newly created renderer.
    pub fn renderer_config(&self) -> PannerConfig {
        self.defaults
    }

    pub fn is_spatial_enabled(&self) -> bool {
        self.spatial_enabled
    }

    /// Switch the distance law used for new renderers. Existing renderers are
    /// updated by the caller through [`SpatialPositioner::with_distance_law`].
    pub fn set_spatial_enabled(&mut self, enabled: bool) {
        self.spatial_enabled = enabled;
        self.defaults = self.with_distance_law(self.defaults);
    }

    /// `config` with the distance law matching the current spatial setting:
    /// the configured law (inverse, rolloff 2 by default) when enabled, flat
    /// (linear, rolloff 0) when disabled.
    pub fn with_distance_law(&self, mut config: PannerConfig) -> PannerConfig {
        if self.spatial_enabled {
            (config.distance_model, config.rolloff_factor) = self.spatial_law;
        } else {
            config.distance_model = DistanceModel::Linear;
            config.rolloff_factor = 0.0;
        }
        config
    }

    /// Ear gains of a renderer at `position` heard from `listener`.
    pub fn ear_gains(
        &self,
        config: &PannerConfig,
        position: Vec3,
        listener: &ListenerParams,
    ) -> EarGains {
        let direction = Direction::of(position, listener);
        let gain = config.distance_gain(direction.distance)
            * config.cone_gain(listener.position - position);
        head_gains(config.panning_model, direction).scaled(gain)
    }
}

impl Default for SpatialPositioner {
    fn default() -> Self {
        Self::new(PannerConfig::default(), true)
    }
}
