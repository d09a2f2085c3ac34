// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use super::byte_str::ByteStr;
use crate::types::{ErrorKind, MetricError};
use std::fmt::Write;

/// Validated sample rate for a metric, `0 < rate <= 1`.
///
/// The rate is the probability that any given event is actually emitted.
/// Receivers compensate statistically, which is why the rate is annotated
/// on the wire (`|@0.5`) whenever it is below one. A rate of exactly one
/// means "always send" and gets no annotation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SampleRate {
    value: f32,
    outbuf: ByteStr<8>, // enough for "@{value}" without allocating
}

impl SampleRate {
    const MIN_SIZE: usize = 3;

    fn new(value: f32) -> Self {
        let mut outbuf = ByteStr::<8>::new();
        write!(&mut outbuf, "@{:.6}", value).expect("failed to write sample rate");
        Self::trim(&mut outbuf);

        Self { value, outbuf }
    }

    /// Does this rate get the `|@` annotation on the wire?
    pub fn is_annotated(&self) -> bool {
        self.value < 1.0
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        self.outbuf.as_str()
    }

    pub fn kv_size(&self) -> usize {
        self.outbuf.len()
    }

    fn trim<const N: usize>(bytestr: &mut ByteStr<N>) {
        loop {
            if bytestr.len() <= Self::MIN_SIZE {
                break;
            }

            if !bytestr.chomp_trailing_byte(b'0') {
                break;
            }
        }
    }
}

impl TryFrom<f32> for SampleRate {
    type Error = MetricError;

    fn try_from(rate: f32) -> Result<Self, Self::Error> {
        if rate > 0.0 && rate <= 1.0 {
            Ok(Self::new(rate))
        } else {
            let err = MetricError::from((ErrorKind::InvalidInput, "Sample rate must be between 0.0 and 1.0"));
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SampleRate;

    #[test]
    fn test_sample_rate_rejects_zero() {
        assert!(SampleRate::try_from(0.0).is_err());
    }

    #[test]
    fn test_sample_rate_rejects_negative() {
        assert!(SampleRate::try_from(-0.5).is_err());
    }

    #[test]
    fn test_sample_rate_rejects_above_one() {
        assert!(SampleRate::try_from(1.5).is_err());
    }

    #[test]
    fn test_sample_rate_one_not_annotated() {
        let rate = SampleRate::try_from(1.0).unwrap();
        assert!(!rate.is_annotated());
    }

    #[test]
    fn test_sample_rate_half_rendering() {
        let rate = SampleRate::try_from(0.5).unwrap();
        assert!(rate.is_annotated());
        assert_eq!("@0.5", rate.as_str());
    }

    #[test]
    fn test_sample_rate_rendering_truncates() {
        let rate = SampleRate::try_from(1.0 / 54.0).unwrap();
        assert_eq!("@0.01851", rate.as_str());
    }

    #[test]
    fn test_sample_rate_kv_size() {
        for _ in 0..1000 {
            let random_float = rand::random::<f32>();
            if random_float == 0.0 {
                continue;
            }
            let sr = SampleRate::try_from(random_float).unwrap();
            let result = sr.as_str();
            assert_eq!(sr.kv_size(), result.len(), "sample rate was: {}, dbg: {:?}", result, sr);
        }
    }
}
