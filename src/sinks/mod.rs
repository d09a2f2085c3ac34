// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

pub use crate::sinks::core::{MetricSink, NopMetricSink, SinkStats};
pub use crate::sinks::spy::SpyMetricSink;
pub use crate::sinks::udp::UdpMetricSink;

pub mod core;
pub mod spy;
pub mod udp;
