//! Tolerance constants for radio tests.

/// Floating point rounding errors (passthrough, exact gain).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Gain law evaluation (powf, trig) through the rendered graph.
pub const DSP_EPSILON: f32 = 1e-4;

/// Silence threshold (~-80dB).
pub const SILENCE_THRESHOLD: f32 = 0.0001;
