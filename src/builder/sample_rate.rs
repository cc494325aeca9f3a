// Statsline - A small Statsd client for Rust
//
// Copyright 2026 Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt::Write;

/// Sample rate of a metric, a value between 0.0 and 1.0 used by the server
/// to scale sampled counts back up.
///
/// The rate is only written to the wire when it's below 1.0, the server
/// treats a missing rate as 1.0.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SampleRate(f32);

impl SampleRate {
    const PREFIX: &'static str = "|@";
    const PRECISION: usize = 6;
    // "0.x", always keep at least one digit after the decimal point
    const MIN_DIGITS: usize = 3;

    pub(crate) fn new(rate: f32) -> Self {
        SampleRate(rate)
    }

    pub(crate) fn is_applicable(&self) -> bool {
        self.0 < 1.0
    }

    /// Upper bound on the number of bytes `write_to` appends.
    pub(crate) fn size_hint(&self) -> usize {
        if self.is_applicable() {
            Self::PREFIX.len() + 2 + Self::PRECISION + 1
        } else {
            0
        }
    }

    /// Append the `|@rate` clause with fixed precision and trailing zeros
    /// removed, or nothing when the rate is 1.0 or above.
    pub(crate) fn write_to(&self, out: &mut String) {
        if !self.is_applicable() {
            return;
        }

        out.push_str(Self::PREFIX);
        let start = out.len();
        let _ = write!(out, "{:.*}", Self::PRECISION, self.0);

        let min_len = start + Self::MIN_DIGITS + usize::from(self.0.is_sign_negative());
        while out.len() > min_len && out.ends_with('0') {
            out.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SampleRate;

    fn render(rate: f32) -> String {
        let mut out = String::new();
        SampleRate::new(rate).write_to(&mut out);
        out
    }

    #[test]
    fn test_sample_rate_half() {
        assert_eq!("|@0.5", render(0.5));
    }

    #[test]
    fn test_sample_rate_rounding() {
        assert_eq!("|@0.018519", render(1.0 / 54.0));
    }

    #[test]
    fn test_sample_rate_tenth() {
        assert_eq!("|@0.1", render(0.1));
    }

    #[test]
    fn test_sample_rate_zero_keeps_one_digit() {
        assert_eq!("|@0.0", render(0.0));
    }

    #[test]
    fn test_sample_rate_one_not_written() {
        assert_eq!("", render(1.0));
        assert_eq!("", render(2.5));
    }

    #[test]
    fn test_sample_rate_size_hint_is_upper_bound() {
        for i in 0..1000 {
            let rate = i as f32 / 1000.0;
            let sr = SampleRate::new(rate);
            assert!(render(rate).len() <= sr.size_hint(), "rate was: {}", rate);
        }
    }
}
