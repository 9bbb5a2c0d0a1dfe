//! Progress state machine.
//!
//! The external player reports position only on discrete events (track change,
//! seek, pause toggle). Between those, the position is extrapolated by a ticker
//! that fires once per interval while playing.

use super::clock::{PlaybackClock, TrackInfo};
use std::time::{Duration, Instant};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Authoritative playback report from the external player.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoritativeUpdate {
    pub track: Option<TrackInfo>,
    pub position_ms: u64,
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProgressState {
    #[default]
    Idle,
    Tracking(PlaybackClock),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Update(AuthoritativeUpdate),
    Tick { generation: u64 },
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    None,
    /// Clock reset from an authoritative update.
    Synced { position_ms: u64, ticking: bool },
    /// Ticker advanced the clock.
    Advanced(u64),
    /// Ticker reached the track end and stopped itself.
    Finished(u64),
    /// Tick from a ticker that was superseded or cancelled.
    Stale,
    /// Clock discarded.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticker {
    generation: u64,
    next_due: Instant,
}

pub struct ProgressSimulator {
    state: ProgressState,
    ticker: Option<Ticker>,
    generation: u64,
    interval: Duration,
}

impl ProgressSimulator {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_TICK_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            state: ProgressState::Idle,
            ticker: None,
            generation: 0,
            interval,
        }
    }

    pub fn transition(&mut self, event: ProgressEvent, now: Instant) -> TransitionResult {
        match event {
            ProgressEvent::Update(update) => self.apply(update, now),
            ProgressEvent::Tick { generation } => self.fire(generation),
            ProgressEvent::Stop => {
                let was_tracking = matches!(self.state, ProgressState::Tracking(_));
                self.stop();
                if was_tracking {
                    TransitionResult::Stopped
                } else {
                    TransitionResult::None
                }
            }
        }
    }

    /// Apply an authoritative update. Always wins over pending ticks: the
    /// running ticker is cancelled and its generation retired.
    pub fn apply(&mut self, update: AuthoritativeUpdate, now: Instant) -> TransitionResult {
        self.cancel_ticker();

        let Some(track) = update.track else {
            self.state = ProgressState::Idle;
            return TransitionResult::Stopped;
        };

        let clock = PlaybackClock::new(track, update.position_ms, update.paused, now);
        let position_ms = clock.position_ms();
        let ticking = !clock.is_paused() && !clock.at_end();
        self.state = ProgressState::Tracking(clock);

        if ticking {
            self.ticker = Some(Ticker {
                generation: self.generation,
                next_due: now + self.interval,
            });
        }

        TransitionResult::Synced {
            position_ms,
            ticking,
        }
    }

    /// Fire the ticker of `generation` once.
    pub fn fire(&mut self, generation: u64) -> TransitionResult {
        let Some(ticker) = self.ticker.filter(|t| t.generation == generation) else {
            return TransitionResult::Stale;
        };
        let ProgressState::Tracking(clock) = &mut self.state else {
            self.ticker = None;
            return TransitionResult::Stale;
        };

        let step_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX);
        let position_ms = clock.advance(step_ms);

        if clock.at_end() {
            self.ticker = None;
            TransitionResult::Finished(position_ms)
        } else {
            self.ticker = Some(Ticker {
                generation,
                next_due: ticker.next_due + self.interval,
            });
            TransitionResult::Advanced(position_ms)
        }
    }

    /// Fire every tick due at `now`, in order.
    pub fn poll(&mut self, now: Instant) -> Vec<TransitionResult> {
        let mut results = Vec::new();
        while let Some(ticker) = self.ticker {
            if ticker.next_due > now {
                break;
            }
            results.push(self.fire(ticker.generation));
        }
        results
    }

    /// Discard the clock and cancel the ticker.
    pub fn stop(&mut self) {
        self.cancel_ticker();
        self.state = ProgressState::Idle;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.ticker.map(|t| t.next_due)
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn clock(&self) -> Option<&PlaybackClock> {
        match &self.state {
            ProgressState::Tracking(clock) => Some(clock),
            ProgressState::Idle => None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, ProgressState::Tracking(_))
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Generation of the running ticker, if any.
    pub fn ticker_generation(&self) -> Option<u64> {
        self.ticker.map(|t| t.generation)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn cancel_ticker(&mut self) {
        self.ticker = None;
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Default for ProgressSimulator {
    fn default() -> Self {
        Self::new()
    }
}
