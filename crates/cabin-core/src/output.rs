//! Output sinks: where the committed graph backend gets pulled from.

use crate::stream::StreamHandle;
use crate::Result;
use fundsp::prelude::AudioUnit;
use fundsp::realnet::NetBackend;
use parking_lot::Mutex;
use std::sync::Arc;

#[cfg(feature = "cpal")]
mod device;
#[cfg(feature = "cpal")]
pub use device::DeviceSink;

/// Destination of the rendered graph.
///
/// `start` takes ownership of the real-time half of the graph and the source
/// stream; the sink pulls one stream frame per output frame through the backend.
pub trait OutputSink: Send {
    fn start(&mut self, backend: NetBackend, stream: StreamHandle) -> Result<()>;

    /// Stop pulling audio and drop the backend. Must not block on the audio thread.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

struct RenderState {
    backend: NetBackend,
    stream: StreamHandle,
}

/// Sink that renders on demand instead of on a device clock.
///
/// Used for headless hosts and tests; [`OfflineSink::monitor`] hands out a
/// cloneable handle that renders frames from outside the graph owner.
#[derive(Default)]
pub struct OfflineSink {
    state: Arc<Mutex<Option<RenderState>>>,
}

/// Handle rendering frames out of an [`OfflineSink`].
#[derive(Clone)]
pub struct OfflineMonitor {
    state: Arc<Mutex<Option<RenderState>>>,
}

impl OfflineSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn monitor(&self) -> OfflineMonitor {
        OfflineMonitor {
            state: Arc::clone(&self.state),
        }
    }
}

impl OutputSink for OfflineSink {
    fn start(&mut self, backend: NetBackend, stream: StreamHandle) -> Result<()> {
        *self.state.lock() = Some(RenderState { backend, stream });
        Ok(())
    }

    fn stop(&mut self) {
        self.state.lock().take();
    }

    fn is_running(&self) -> bool {
        self.state.lock().is_some()
    }
}

impl OfflineMonitor {
    /// Render `frames` stereo frames. Returns an empty buffer while stopped.
    pub fn render(&self, frames: usize) -> Vec<(f32, f32)> {
        let mut guard = self.state.lock();
        let Some(state) = guard.as_mut() else {
            return Vec::new();
        };

        let mut output = [0.0f32; 2];
        (0..frames)
            .map(|_| {
                let (left, right) = state.stream.next_frame();
                state.backend.tick(&[left, right], &mut output);
                (output[0], output[1])
            })
            .collect()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().is_some()
    }
}
