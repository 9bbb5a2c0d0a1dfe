mod clock;
mod fsm;

pub use clock::{format_time, PlaybackClock, TrackInfo};
pub use fsm::{
    AuthoritativeUpdate, ProgressEvent, ProgressSimulator, ProgressState, TransitionResult,
    DEFAULT_TICK_INTERVAL,
};
