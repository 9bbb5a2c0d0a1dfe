//! Audio graph frontend, output sinks and playback progress for the in-cabin radio.
//!
//! # Primary API
//!
//! - [`CabinNet`]: DSP graph manipulation with a connection ledger
//! - [`OutputSink`]: where the committed graph is played ([`OfflineSink`], `DeviceSink`)
//! - [`StreamProvider`] / [`StreamHandle`]: decoded stream published by the external player
//! - [`ProgressSimulator`]: playback position extrapolated between player reports
//!
//! # Feature-gated APIs
//!
//! - `"cpal"`: `DeviceSink` for hardware output

pub mod error;
pub use error::{Error, Result};

mod net_frontend;
pub use net_frontend::{CabinNet, Connection, Endpoint};

pub mod output;
pub use output::{OfflineMonitor, OfflineSink, OutputSink};

#[cfg(feature = "cpal")]
pub use output::DeviceSink;

pub mod stream;
pub use stream::{NoStream, StereoStream, StreamHandle, StreamProvider};

pub mod transport;
pub use transport::{
    format_time, AuthoritativeUpdate, PlaybackClock, ProgressEvent, ProgressSimulator,
    ProgressState, TrackInfo, TransitionResult,
};

pub mod dsp {
    //! Re-export of fundsp::prelude for DSP building blocks.
    pub use fundsp::prelude::*;
}

pub use fundsp::net::NodeId;
pub use fundsp::prelude::{shared, AudioUnit, Shared};
pub use fundsp::realnet::NetBackend;
