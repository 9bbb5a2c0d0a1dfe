//! In-cabin spatial rendering.
//!
//! Each speaker mount gets a renderer node fed from one channel of the
//! stereo stream; renderers are mixed back to stereo, scaled by the
//! amplitude controller and played through an [`cabin_core::OutputSink`].
//!
//! - [`SpeakerRegistry`]: validated speaker layout
//! - [`AudioGraphManager`]: graph construction, rewiring and parameter writes
//! - [`SpatialPositioner`]: renderer configuration and gain law
//! - [`ListenerTracker`]: camera pose to listener frame

pub mod error;
pub use error::{Error, Result};

mod vector;
pub use vector::Vec3;

pub mod speaker;
pub use speaker::{LayoutObserver, MountSpec, Side, SpeakerMount, SpeakerRegistry};

pub mod positioner;
pub use positioner::{
    DistanceModel, EarGains, PannerConfig, PanningModel, SpatialPositioner, SPATIAL_ROLLOFF,
};

pub mod listener;
pub use listener::{ListenerParams, ListenerPose, ListenerTracker};

mod nodes;

pub mod graph;
pub use graph::{AudioGraphBuilder, AudioGraphManager, GraphState, OUTSIDE_CABIN_DAMPENING};
