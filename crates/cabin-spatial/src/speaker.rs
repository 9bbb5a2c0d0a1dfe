//! Speaker mounts and the registry holding the current cabin layout.

use crate::vector::Vec3;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stereo channel a speaker is fed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Infer the side from a mount name (`frontLeft`, `rear_right`, ...).
    ///
    /// `left` is matched before `right`, case-insensitively.
    pub fn infer(name: &str) -> Option<Side> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("left") {
            Some(Side::Left)
        } else if lower.contains("right") {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Router output port carrying this channel.
    pub fn channel(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Mount as reported by the host, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountSpec {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
}

impl MountSpec {
    pub fn new(name: impl Into<String>, x: f32, y: f32, z: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z,
            side: None,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }
}

/// Validated speaker position inside the cabin.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerMount {
    pub name: String,
    pub position: Vec3,
    pub side: Side,
}

impl TryFrom<&MountSpec> for SpeakerMount {
    type Error = Error;

    fn try_from(spec: &MountSpec) -> Result<Self> {
        if spec.name.trim().is_empty() {
            return Err(Error::InvalidLayout("mount with empty name".into()));
        }
        let position = Vec3::new(spec.x, spec.y, spec.z);
        if !position.is_finite() {
            return Err(Error::InvalidLayout(format!(
                "mount '{}' has non-finite coordinates",
                spec.name
            )));
        }
        let side = spec.side.or_else(|| Side::infer(&spec.name)).ok_or_else(|| {
            Error::InvalidLayout(format!(
                "cannot infer side of mount '{}'; name it left/right or set `side`",
                spec.name
            ))
        })?;

        Ok(Self {
            name: spec.name.clone(),
            position,
            side,
        })
    }
}

/// Receives the validated layout whenever it is replaced.
pub trait LayoutObserver {
    fn layout_changed(&mut self, mounts: &[SpeakerMount]);
}

/// Current set of speaker mounts, replaced atomically.
#[derive(Debug, Default)]
pub struct SpeakerRegistry {
    mounts: Vec<SpeakerMount>,
}

impl SpeakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and replace the whole layout, then notify `observer`.
    ///
    /// On error nothing changes and the observer is not called.
    pub fn set_layout(
        &mut self,
        specs: &[MountSpec],
        observer: &mut dyn LayoutObserver,
    ) -> Result<()> {
        let mut seen = HashSet::with_capacity(specs.len());
        let mut mounts = Vec::with_capacity(specs.len());

        for spec in specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(Error::InvalidLayout(format!(
                    "duplicate mount name '{}'",
                    spec.name
                )));
            }
            mounts.push(SpeakerMount::try_from(spec)?);
        }

        tracing::debug!(count = mounts.len(), "speaker layout replaced");
        self.mounts = mounts;
        observer.layout_changed(&self.mounts);
        Ok(())
    }

    pub fn get(&self) -> &[SpeakerMount] {
        &self.mounts
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}
