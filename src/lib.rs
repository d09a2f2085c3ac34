// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An extensible Statsd client for Rust with multi-metric fan-out!
//!
//! Fanfare is a client for the [Statsd](https://github.com/etsy/statsd)
//! metrics server. Besides the usual counters, timers, gauges, histograms,
//! and sets, every metric method accepts either one name or a slice of
//! names; with a slice, the same value fans out as one datagram per name
//! and callers can observe the aggregated result of the whole batch.
//!
//! ## Features
//!
//! * [Simple client API](#simple-use)
//! * Fan a value out to [multiple metric names](#fan-out) at once
//! * [Tags](#tags) and [sampling](#sampling) per metric
//! * UDP transport, a no-op sink for disabling emission, and test-friendly
//!   sinks that capture metrics for inspection
//! * An [opt-in global client](#global-client), never consulted implicitly
//!
//! ## Usage
//!
//! Typical usage of Fanfare is shown below:
//!
//! ### Simple Use
//!
//! Simple usage of Fanfare is shown below. In this example, we just import
//! the client, create an instance that will write to some imaginary metrics
//! server, and send a few metrics.
//!
//! ```rust,no_run
//! use fanfare::prelude::*;
//! use fanfare::{StatsdClient, DEFAULT_PORT};
//!
//! // Create client that will write to the given host over UDP.
//! //
//! // Note that we use a `MetricResult` here since resolving the host
//! // or binding the local socket can fail.
//! let host = ("metrics.example.com", DEFAULT_PORT);
//! let client = StatsdClient::from_udp_host("my.metrics", host).unwrap();
//!
//! // Show some examples of how to use the client to send metrics. The
//! // `.send()` finisher routes any eventual error to the client's error
//! // handler (a no-op by default).
//! client.incr("some.counter").send();
//! client.time("some.methodCall", 42).send();
//! client.gauge("some.thing", 7u64).send();
//! client.histogram("some.histogram", 27u64).send();
//! client.set("some.set", 5).send();
//! ```
//!
//! ### Fan-out
//!
//! Passing a slice of names sends the same value to each name. The
//! `.send_with()` finisher registers a callback that fires at most once:
//! with the first error among the sends, or with the total bytes written
//! once every name has completed.
//!
//! ```rust
//! use fanfare::prelude::*;
//! use fanfare::{SpyMetricSink, StatsdClient};
//!
//! let (rx, sink) = SpyMetricSink::new();
//! let client = StatsdClient::from_sink("", sink);
//!
//! client.time(&["render.page", "render.total"], 42).send_with(|res| {
//!     println!("fan-out wrote {} bytes", res.unwrap());
//! });
//!
//! assert_eq!("render.page:42|ms".as_bytes(), rx.recv().unwrap().as_slice());
//! assert_eq!("render.total:42|ms".as_bytes(), rx.recv().unwrap().as_slice());
//! ```
//!
//! ### Tags
//!
//! Tags are a future extension to the Statsd protocol, supported by the
//! Datadog Statsd server. Adding tags to metrics is done via a builder
//! returned by each metric method. Default tags can also be attached to
//! every metric a client sends.
//!
//! ```rust
//! use fanfare::prelude::*;
//! use fanfare::{SpyMetricSink, StatsdClient};
//!
//! let (rx, sink) = SpyMetricSink::new();
//! let client = StatsdClient::builder("my.prefix", sink)
//!     .with_tag("environment", "production")
//!     .build();
//!
//! client.count("my.counter", 29)
//!     .with_tag("host", "web03.example.com")
//!     .with_tag_value("beta-test")
//!     .send();
//!
//! assert_eq!(
//!     "my.prefix.my.counter:29|c|#environment:production,host:web03.example.com,beta-test".as_bytes(),
//!     rx.recv().unwrap().as_slice(),
//! );
//! ```
//!
//! ### Sampling
//!
//! A sample rate in `(0, 1]` causes each name of a metric to be emitted
//! with that probability, annotated on the wire so the server can scale
//! counts back up. Note that for a sampled fan-out with a registered
//! callback, names dropped by sampling never complete, so the callback may
//! never be invoked.
//!
//! ```rust
//! use fanfare::prelude::*;
//! use fanfare::{NopMetricSink, StatsdClient};
//!
//! let client = StatsdClient::from_sink("my.prefix", NopMetricSink);
//!
//! // Emitted around a tenth of the time, as "my.prefix.requests:1|c|@0.1"
//! client.incr("requests").with_sample_rate(0.1).send();
//! ```
//!
//! ### Global client
//!
//! Clients are ordinarily plain values passed to the code that needs them.
//! The [`registry`] module offers an explicitly opt-in alternative: a
//! single process-wide client, set once and looked up where needed. See
//! the module documentation for details.
//!
//! ### Disabling metrics
//!
//! Passing a [`NopMetricSink`] to a client discards every metric while
//! keeping the full client API available, which is useful for tests or
//! for turning metrics off via configuration.
//!
//! ## Threading
//!
//! `StatsdClient` is `Send + Sync`: share one instance between threads,
//! typically behind an `Arc`, rather than creating one per thread (each
//! client owns its own sink and socket).

#![forbid(unsafe_code)]

pub use crate::builder::{MetricBuilder, MetricKeys, MetricValue};
pub use crate::client::{
    Counted, CountedExt, Gauged, Histogrammed, MetricClient, Setted, StatsdClient, StatsdClientBuilder, Timed,
};
pub use crate::dispatch::{SendCallback, SendToken};
pub use crate::sinks::{MetricSink, NopMetricSink, SinkStats, SpyMetricSink, UdpMetricSink};
pub use crate::types::{ErrorKind, MetricError, MetricResult};

mod builder;
mod client;
mod dispatch;
pub mod ext;
pub mod prelude;
pub mod registry;
mod sinks;
#[doc(hidden)]
pub mod test;
mod types;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Default port that a Statsd server listens on
pub const DEFAULT_PORT: u16 = 8125;
