//! # Cabin Radio - In-cabin spatial car radio
//!
//! Renders an external music player's stereo stream through virtual speakers
//! mounted in a vehicle cabin, relative to a moving listener (the camera).
//!
//! ## Architecture
//!
//! Cabin Radio is an umbrella crate that coordinates:
//! - **cabin-core** - Graph frontend over fundsp, output sinks, playback progress clock
//! - **cabin-spatial** - Speaker layout, listener tracking, per-speaker renderer graph
//!
//! and adds the [`RadioEngine`] event context, the vehicle [`PlaybackPolicy`]
//! and the serde event model.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cabin_radio::prelude::*;
//!
//! let (mut engine, outbound) = RadioEngine::builder().build()?;
//! engine.start();
//!
//! let event: InboundEvent = serde_json::from_str(line)?;
//! engine.handle(event, Instant::now())?;
//! engine.poll(Instant::now());
//!
//! for message in outbound.try_iter() {
//!     println!("{}", serde_json::to_string(&message)?);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `cpal` - Play through the default output device

/// Re-export of cabin-core for direct access
pub use cabin_core as core;

/// Re-export of cabin-spatial for direct access
pub use cabin_spatial as spatial;

pub use cabin_core::{
    OfflineSink, OutputSink, ProgressSimulator, StreamHandle, StreamProvider, TrackInfo,
};
pub use cabin_spatial::{AudioGraphManager, MountSpec, PannerConfig, Side, SpeakerMount, Vec3};

mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{RadioConfig, RetryConfig};

pub mod events;
pub use events::{InboundEvent, Outbound};

pub mod policy;
pub use policy::{may_play, PlaybackPolicy, VehicleState};

mod engine;
pub use engine::RadioEngine;

mod builder;
pub use builder::RadioEngineBuilder;

pub mod prelude {
    //! Common imports.
    pub use crate::events::{
        ConnectionStatus, HostMessage, InboundEvent, NoticeKind, Outbound, PlayerCommand,
        UiUpdate,
    };
    pub use crate::{Error, RadioConfig, RadioEngine, Result};
    pub use cabin_core::{StreamHandle, StreamProvider, TrackInfo};
    pub use cabin_spatial::{MountSpec, Vec3};
    pub use std::time::Instant;
}
