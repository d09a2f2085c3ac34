// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use rand::Rng;

/// Per-event sampling decision for a configured sample rate.
///
/// Each call to `sample` draws a fresh uniform value in `[0, 1)` and emits
/// iff the draw is strictly below the rate. The decision is re-made for
/// every name in a fan-out, never once per batch, so different names of
/// the same logical send may be dropped independently.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sampler {
    rate: f64,
}

impl Sampler {
    pub fn new(rate: f32) -> Self {
        Sampler { rate: f64::from(rate) }
    }

    /// Should this particular event be emitted?
    pub fn sample(&self) -> bool {
        self.sample_with(&mut rand::thread_rng())
    }

    /// Sampling decision with a caller supplied RNG, for deterministic tests.
    pub fn sample_with<R: Rng>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.rate
    }
}
