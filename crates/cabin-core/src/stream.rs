//! Decoded stereo stream handed over by the external player.

use crate::{Error, Result};
use fundsp::prelude::AudioUnit;

/// A decoded stereo stream, pulled one frame at a time from the audio thread.
pub trait StereoStream: Send {
    fn next_frame(&mut self) -> (f32, f32);
}

/// Renderable stream handle published by the external player.
///
/// Handles appear asynchronously after the player connects; `id` changes
/// whenever the player swaps the underlying stream.
pub struct StreamHandle {
    id: u64,
    label: String,
    stream: Box<dyn StereoStream>,
}

impl StreamHandle {
    pub fn new(id: u64, label: impl Into<String>, stream: Box<dyn StereoStream>) -> Self {
        Self {
            id,
            label: label.into(),
            stream,
        }
    }

    /// Wrap a generator unit with no inputs and one or two outputs.
    pub fn from_unit(id: u64, label: impl Into<String>, unit: Box<dyn AudioUnit>) -> Result<Self> {
        if unit.inputs() != 0 || !(1..=2).contains(&unit.outputs()) {
            return Err(Error::RenderingBackend(format!(
                "stream unit must be 0-in / 1- or 2-out, got {}-in / {}-out",
                unit.inputs(),
                unit.outputs()
            )));
        }
        Ok(Self::new(id, label, Box::new(UnitStream { unit })))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn next_frame(&mut self) -> (f32, f32) {
        self.stream.next_frame()
    }
}

impl core::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Source of stream handles; implemented by the external player integration.
pub trait StreamProvider {
    /// Current renderable stream, or `None` while the player has not published one.
    fn stream_handle(&mut self) -> Option<StreamHandle>;

    /// Identifier of the stream the player is rendering right now, if known.
    fn current_source(&self) -> Option<u64> {
        None
    }
}

/// Provider for hosts that never publish a stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStream;

impl StreamProvider for NoStream {
    fn stream_handle(&mut self) -> Option<StreamHandle> {
        None
    }
}

struct UnitStream {
    unit: Box<dyn AudioUnit>,
}

impl StereoStream for UnitStream {
    #[inline]
    fn next_frame(&mut self) -> (f32, f32) {
        if self.unit.outputs() == 1 {
            let value = self.unit.get_mono();
            (value, value)
        } else {
            self.unit.get_stereo()
        }
    }
}
