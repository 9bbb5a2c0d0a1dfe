//! Processing nodes of the cabin graph.
//!
//! All parameters live in [`Shared`] atomics; the control context only ever
//! stores into them, the rendering thread reads them per sample.

use fundsp::net::Net;
use fundsp::prelude::*;

/// Splits the stereo stream: port 0 carries Left, port 1 Right.
pub(crate) fn router() -> Box<dyn AudioUnit> {
    Box::new(multipass::<U2>())
}

/// Mono in, stereo out, with independent ear gains.
pub(crate) fn renderer(left: &Shared, right: &Shared) -> Box<dyn AudioUnit> {
    Box::new((pass() * var(left)) ^ (pass() * var(right)))
}

/// Sums `pairs` stereo pairs into one. With no pairs this is a stereo passthrough.
pub(crate) fn combiner(pairs: usize) -> Box<dyn AudioUnit> {
    let mut net = Net::wrap(Box::new(multipass::<U2>()));
    for _ in 1..pairs {
        net = net + Net::wrap(Box::new(multipass::<U2>()));
    }
    Box::new(net)
}

/// Stereo gain stage.
pub(crate) fn amplitude(gain: &Shared) -> Box<dyn AudioUnit> {
    Box::new((pass() * var(gain)) | (pass() * var(gain)))
}
