// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Advanced extension points for the library.
//!
//! Most users don't need anything from this module. The conversion traits
//! here allow callers to emit their own types as metric values, and the
//! `MetricBackend` trait is the seam builders use to hand errors back to
//! their client.

pub use crate::client::{
    MetricBackend, ToCounterValue, ToGaugeValue, ToHistogramValue, ToSetValue, ToTimerValue,
};
pub use crate::builder::MetricValue;
