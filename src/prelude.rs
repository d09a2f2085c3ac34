// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Prelude to pull all the metric recording traits into scope.
//!
//! # Example
//!
//! ```
//! use fanfare::prelude::*;
//! use fanfare::{NopMetricSink, StatsdClient};
//!
//! let client = StatsdClient::from_sink("my.prefix", NopMetricSink);
//! client.incr("requests").send();
//! ```

pub use crate::client::{Counted, CountedExt, Gauged, Histogrammed, MetricClient, Setted, Timed};
