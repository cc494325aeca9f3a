// Statsline - A small Statsd client for Rust
//
// Copyright 2026 Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use rand::{Rng, RngCore};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Source of the per-call sampling decision.
///
/// Each call is an independent Bernoulli trial: a value is drawn uniformly
/// from `[0, 1)` and the metric is sent only when the draw is below the
/// sample rate. This only guarantees the expected frequency, not an exact
/// one over any particular window of calls.
///
/// Implementations only need to provide `draw`. The randomness does not
/// need to be cryptographically strong, just uniform.
pub trait Sampler {
    /// Draw a value uniformly distributed in `[0, 1)`.
    fn draw(&self) -> f32;

    /// Decide whether a metric with the given sample rate should be sent.
    ///
    /// Rates of 1.0 or more always send without consulting `draw`.
    fn should_send(&self, sample_rate: f32) -> bool {
        if sample_rate >= 1.0 {
            return true;
        }

        self.draw() < sample_rate
    }
}

/// `Sampler` backed by the thread-local RNG from `rand`.
///
/// This is the sampler used by clients unless another is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSampler;

impl Sampler for ThreadRngSampler {
    fn draw(&self) -> f32 {
        rand::thread_rng().gen::<f32>()
    }
}

/// `Sampler` backed by a caller supplied RNG.
///
/// Useful for reproducible sampling in tests by passing a seeded generator.
pub struct RngSampler<R> {
    rng: Mutex<R>,
}

impl<R> RngSampler<R>
where
    R: RngCore,
{
    pub fn new(rng: R) -> Self {
        RngSampler { rng: Mutex::new(rng) }
    }
}

impl<R> Sampler for RngSampler<R>
where
    R: RngCore,
{
    fn draw(&self) -> f32 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen::<f32>()
    }
}

impl<R> fmt::Debug for RngSampler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RngSampler { rng: ... }")
    }
}

/// Decide whether a metric with the given sample rate should be sent using
/// the thread-local RNG.
///
/// # Example
///
/// ```
/// use statsline::should_send;
///
/// assert!(should_send(1.0));
/// assert!(should_send(4.0));
/// ```
pub fn should_send(sample_rate: f32) -> bool {
    ThreadRngSampler.should_send(sample_rate)
}
