// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::builder::sampler::Sampler;
use crate::builder::{MetricBuilder, MetricFormatter, MetricKeys, MetricValue};
use crate::dispatch::{BatchJoin, SendCallback, SendToken};
use crate::sinks::{MetricSink, UdpMetricSink};
use crate::types::{ErrorKind, MetricError, MetricResult};
use std::fmt;
use std::net::{ToSocketAddrs, UdpSocket};
use std::panic::RefUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// Conversion trait for valid values for counters
///
/// This trait must be implemented for any types that are used as counter
/// values (currently only `i64`). This trait is exposed to users so that
/// they can implement it for their own types.
pub trait ToCounterValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToCounterValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Signed(self))
    }
}

/// Conversion trait for valid values for timers
///
/// This trait must be implemented for any types that are used as timer
/// values (currently `u64` and `Duration`). This trait is exposed to users
/// so that they can implement it for their own types.
pub trait ToTimerValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToTimerValue for u64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Unsigned(self))
    }
}

impl ToTimerValue for Duration {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        let as_millis = self.as_millis();
        if as_millis > u64::MAX as u128 {
            Err(MetricError::from((ErrorKind::InvalidInput, "u64 overflow")))
        } else {
            Ok(MetricValue::Unsigned(as_millis as u64))
        }
    }
}

/// Conversion trait for valid values for gauges
///
/// This trait must be implemented for any types that are used as gauge
/// values (currently `u64` and `f64`). This trait is exposed to users
/// so that they can implement it for their own types.
pub trait ToGaugeValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToGaugeValue for u64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Unsigned(self))
    }
}

impl ToGaugeValue for f64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Float(self))
    }
}

/// Conversion trait for valid values for histograms
///
/// This trait must be implemented for any types that are used as histogram
/// values (currently `u64`, `f64`, and `Duration`). This trait is exposed
/// to users so that they can implement it for their own types.
pub trait ToHistogramValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToHistogramValue for u64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Unsigned(self))
    }
}

impl ToHistogramValue for f64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Float(self))
    }
}

impl ToHistogramValue for Duration {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        let as_nanos = self.as_nanos();
        if as_nanos > u64::MAX as u128 {
            Err(MetricError::from((ErrorKind::InvalidInput, "u64 overflow")))
        } else {
            Ok(MetricValue::Unsigned(as_nanos as u64))
        }
    }
}

/// Conversion trait for valid values for sets
///
/// This trait must be implemented for any types that are used as set
/// values (currently only `i64`). This trait is exposed to users so
/// that they can implement it for their own types.
pub trait ToSetValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToSetValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Signed(self))
    }
}

/// Trait for incrementing and decrementing counters.
///
/// Counters are simple values incremented or decremented by a client. The
/// rates at which these events occur or average values will be determined
/// by the server receiving them. Examples of counter uses include number
/// of logins to a system or requests received.
///
/// The `keys` argument accepts either a single name or a slice of names to
/// fan the same value out to. See [`MetricKeys`].
///
/// See the [Statsd spec](https://github.com/b/statsd_spec) for more
/// information.
pub trait Counted<T>
where
    T: ToCounterValue,
{
    /// Adjust the counter(s) with the given key(s) by the given amount
    fn count<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, count: T) -> MetricBuilder<'a, 'a>;
}

/// Convenience methods for counters that move by a fixed step.
///
/// This trait is tied to counting `i64` amounts. It is automatically
/// implemented for any type implementing `Counted<i64>`.
pub trait CountedExt: Counted<i64> {
    /// Increment the counter(s) with the given key(s) by one
    fn incr<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K) -> MetricBuilder<'a, 'a> {
        self.count(keys, 1)
    }

    /// Decrement the counter(s) with the given key(s) by one
    fn decr<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K) -> MetricBuilder<'a, 'a> {
        self.count(keys, -1)
    }

    /// Increment the counter(s) with the given key(s) by the given amount
    fn incr_by<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, count: i64) -> MetricBuilder<'a, 'a> {
        self.count(keys, count)
    }

    /// Decrement the counter(s) with the given key(s) by the given amount
    fn decr_by<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, count: i64) -> MetricBuilder<'a, 'a> {
        self.count(keys, -count)
    }
}

/// Trait for recording timings in milliseconds.
///
/// Timings are a positive number of milliseconds between a start and end
/// time. Examples include time taken to render a web page or time taken
/// for a database call to return. `Duration` values are converted to
/// milliseconds, turning into an error at send time if they overflow `u64`.
///
/// See the [Statsd spec](https://github.com/b/statsd_spec) for more
/// information.
pub trait Timed<T>
where
    T: ToTimerValue,
{
    /// Record a timing in milliseconds with the given key(s)
    fn time<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, time: T) -> MetricBuilder<'a, 'a>;
}

/// Trait for recording gauge values.
///
/// Gauge values are an instantaneous measurement of a value determined by
/// the client. They do not change unless changed by the client. Examples
/// include things like load average or how many connections are active.
///
/// See the [Statsd spec](https://github.com/b/statsd_spec) for more
/// information.
pub trait Gauged<T>
where
    T: ToGaugeValue,
{
    /// Record a gauge value with the given key(s)
    fn gauge<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, value: T) -> MetricBuilder<'a, 'a>;
}

/// Trait for recording histogram values.
///
/// Histogram values are positive values that can represent anything, whose
/// statistical distribution is calculated by the server. The values can be
/// timings, amount of some resource consumed, size of HTTP responses in
/// some application, etc. `Duration` values are converted to nanoseconds,
/// turning into an error at send time if they overflow `u64`.
///
/// Histograms are a [Datadog](https://docs.datadoghq.com/developers/metrics/types/?tab=histogram)
/// extension to Statsd and may not be supported by all servers.
pub trait Histogrammed<T>
where
    T: ToHistogramValue,
{
    /// Record a histogram value with the given key(s)
    fn histogram<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, value: T) -> MetricBuilder<'a, 'a>;
}

/// Trait for recording set values.
///
/// Sets count the number of unique elements in a group. You can use them to,
/// for example, count the unique visitors to your site.
///
/// See the [Statsd spec](https://github.com/b/statsd_spec) for more
/// information.
pub trait Setted<T>
where
    T: ToSetValue,
{
    /// Record a single set value with the given key(s)
    fn set<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, value: T) -> MetricBuilder<'a, 'a>;

    /// Record a single set value with the given key(s)
    ///
    /// Alias for `.set()`, mirroring the common "count uniques" reading of
    /// set metrics.
    fn unique<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, value: T) -> MetricBuilder<'a, 'a> {
        self.set(keys, value)
    }
}

/// Trait that encompasses all other traits for sending metrics.
///
/// If you wish to use `StatsdClient` with a generic bound, this is the
/// bound to reach for:
///
/// ```
/// use fanfare::prelude::*;
/// use fanfare::{NopMetricSink, StatsdClient};
///
/// fn record_deploy(metrics: &impl MetricClient) {
///     metrics.incr("deploys").send();
/// }
///
/// record_deploy(&StatsdClient::from_sink("ci", NopMetricSink));
/// ```
pub trait MetricClient:
    Counted<i64>
    + CountedExt
    + Timed<u64>
    + Timed<Duration>
    + Gauged<u64>
    + Gauged<f64>
    + Histogrammed<u64>
    + Histogrammed<f64>
    + Histogrammed<Duration>
    + Setted<i64>
{
}

/// Backend used by metric builders to dispatch their results.
///
/// Typically this trait will only be used from metric builders and not
/// called directly by users. It is sealed and cannot be implemented
/// outside of this crate.
pub trait MetricBackend: crate::sealed::Sealed {
    /// Run an error through the error handler this client was built with
    fn consume_error(&self, err: MetricError);
}

fn nop_error_handler(_err: MetricError) {}

fn formatted_prefix(prefix: &str) -> String {
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{}.", prefix.trim_end_matches('.'))
    }
}

fn formatted_suffix(suffix: &str) -> String {
    if suffix.is_empty() {
        String::new()
    } else {
        format!(".{}", suffix.trim_start_matches('.'))
    }
}

/// Builder for creating and customizing `StatsdClient` instances.
///
/// Instances of the builder should be created by calling the `::builder()`
/// method on the `StatsdClient` struct.
///
/// # Example
///
/// ```
/// use fanfare::prelude::*;
/// use fanfare::{MetricError, NopMetricSink, StatsdClient};
///
/// fn my_error_handler(err: MetricError) {
///     eprintln!("Metric error! {}", err);
/// }
///
/// let client = StatsdClient::builder("prefix", NopMetricSink)
///     .with_suffix("host01")
///     .with_error_handler(my_error_handler)
///     .with_tag("environment", "production")
///     .with_tag_value("rust")
///     .build();
///
/// client.gauge("some.key", 7).send();
/// ```
pub struct StatsdClientBuilder {
    prefix: String,
    suffix: String,
    sink: Box<dyn MetricSink + Sync + Send + RefUnwindSafe>,
    errors: Arc<dyn Fn(MetricError) + Sync + Send + RefUnwindSafe>,
    tags: Vec<(Option<String>, String)>,
}

impl StatsdClientBuilder {
    fn new<S>(prefix: &str, sink: S) -> Self
    where
        S: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        StatsdClientBuilder {
            prefix: formatted_prefix(prefix),
            suffix: String::new(),
            sink: Box::new(sink),
            errors: Arc::new(nop_error_handler),
            tags: Vec::new(),
        }
    }

    /// Set a suffix appended to every metric name, after a joining `.`
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = formatted_suffix(suffix);
        self
    }

    /// Invoke the provided function when an error occurs during a fire-and-
    /// forget `.send()` call.
    ///
    /// Errors from `.send_with()` calls are given to the registered
    /// callback instead and never reach this handler.
    pub fn with_error_handler<F>(mut self, errors: F) -> Self
    where
        F: Fn(MetricError) + Sync + Send + RefUnwindSafe + 'static,
    {
        self.errors = Arc::new(errors);
        self
    }

    /// Add a default key-value tag attached to every metric
    pub fn with_tag<K, V>(mut self, key: K, value: V) -> Self
    where
        K: ToString,
        V: ToString,
    {
        self.tags.push((Some(key.to_string()), value.to_string()));
        self
    }

    /// Add a default value tag attached to every metric
    pub fn with_tag_value<V>(mut self, value: V) -> Self
    where
        V: ToString,
    {
        self.tags.push((None, value.to_string()));
        self
    }

    /// Construct a new `StatsdClient` instance based on current settings
    pub fn build(self) -> StatsdClient {
        StatsdClient {
            prefix: self.prefix,
            suffix: self.suffix,
            sink: self.sink,
            errors: self.errors,
            tags: self.tags,
        }
    }
}

/// Client for Statsd that implements various traits to record metrics.
///
/// # Traits
///
/// The client is the main entry point for users of this library. It supports
/// several traits for recording metrics of different types.
///
/// * `Counted` for emitting counters.
/// * `Timed` for emitting timings.
/// * `Gauged` for emitting gauge values.
/// * `Histogrammed` for emitting histogram values.
/// * `Setted` for emitting set values.
/// * `MetricClient` for a combination of all of the above.
///
/// Each of the trait methods returns a [`MetricBuilder`] that can annotate
/// the metric with tags or a sample rate before it is sent. Every method
/// accepts either a single metric name or a slice of names: with a slice
/// the same value fans out to each named metric, and the builder's
/// `.send_with()` callback observes the aggregated outcome.
///
/// # Sinks
///
/// The client uses some implementation of a [`MetricSink`] to emit the
/// metrics. In simple cases the `UdpMetricSink` is an appropriate choice,
/// while [`NopMetricSink`](crate::NopMetricSink) disables emission entirely
/// and [`SpyMetricSink`](crate::SpyMetricSink) captures emitted metrics for
/// inspection in tests.
///
/// # Threading
///
/// The client is designed to work in a multithreaded application. All parts
/// of the client can be shared between threads (i.e. it is `Send` and
/// `Sync`), typically wrapped in an `Arc`.
pub struct StatsdClient {
    prefix: String,
    suffix: String,
    sink: Box<dyn MetricSink + Sync + Send + RefUnwindSafe>,
    errors: Arc<dyn Fn(MetricError) + Sync + Send + RefUnwindSafe>,
    tags: Vec<(Option<String>, String)>,
}

impl StatsdClient {
    /// Create a new client instance that will use the given prefix for
    /// all metrics emitted to the given `MetricSink` implementation.
    ///
    /// Note that this client will discard errors encountered when
    /// sending metrics via the `.send()` method of `MetricBuilder`.
    ///
    /// # No-op example
    ///
    /// ```
    /// use fanfare::{NopMetricSink, StatsdClient};
    ///
    /// let client = StatsdClient::from_sink("my.prefix", NopMetricSink);
    /// ```
    pub fn from_sink<S>(prefix: &str, sink: S) -> Self
    where
        S: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        Self::builder(prefix, sink).build()
    }

    /// Create a new client that will emit metrics over UDP to the given
    /// host, using the given prefix for all metrics.
    ///
    /// The client will bind a UDP socket to `0.0.0.0:0` and put it into
    /// non-blocking mode. The host address is resolved once, when the
    /// client is created.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fanfare::{StatsdClient, DEFAULT_PORT};
    ///
    /// let client = StatsdClient::from_udp_host("my.prefix", ("metrics.example.com", DEFAULT_PORT)).unwrap();
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to create or bind the local UDP socket.
    /// * It is unable to resolve the hostname of the metric server.
    pub fn from_udp_host<A>(prefix: &str, host: A) -> MetricResult<Self>
    where
        A: ToSocketAddrs,
    {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        let sink = UdpMetricSink::from(host, socket)?;
        Ok(Self::from_sink(prefix, sink))
    }

    /// Create a builder for constructing a new client instance with
    /// extra customization (suffix, error handling, default tags).
    ///
    /// # Example
    ///
    /// ```
    /// use fanfare::prelude::*;
    /// use fanfare::{MetricError, NopMetricSink, StatsdClient};
    ///
    /// fn my_error_handler(err: MetricError) {
    ///     println!("Metric error: {}", err);
    /// }
    ///
    /// let client = StatsdClient::builder("some.prefix", NopMetricSink)
    ///     .with_error_handler(my_error_handler)
    ///     .build();
    ///
    /// client.count("some.counter", 123).send();
    /// client.time("some.timer", 42).with_tag("type", "web").send();
    /// ```
    pub fn builder<S>(prefix: &str, sink: S) -> StatsdClientBuilder
    where
        S: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        StatsdClientBuilder::new(prefix, sink)
    }

    /// Return I/O telemetry from the sink backing this client
    pub fn sink_stats(&self) -> crate::SinkStats {
        self.sink.stats()
    }

    pub(crate) fn error_handler(&self) -> Arc<dyn Fn(MetricError) + Sync + Send + RefUnwindSafe> {
        self.errors.clone()
    }

    fn tags(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_deref(), v.as_str()))
    }

    /// Dispatch a fully annotated metric to the sink, one datagram per name.
    ///
    /// A single name completes the callback directly. Multiple names share a
    /// join sized to the original name count: the callback fires with the
    /// first error, or with the total bytes written once every name has
    /// completed. Sampling is applied per name; names that are sampled out
    /// drop their completion slot on the floor, so a sampled fan-out may
    /// never invoke its callback.
    pub(crate) fn send_formatted(&self, formatter: &MetricFormatter<'_>, callback: SendCallback) {
        let sampler = formatter.sample_rate().map(|rate| Sampler::new(rate.value()));

        if let Some(key) = formatter.keys().single() {
            self.emit_one(formatter, key, sampler.as_ref(), SendToken::direct(callback));
        } else {
            let join = BatchJoin::new(formatter.keys().count(), callback);
            for key in formatter.keys().iter() {
                self.emit_one(formatter, key, sampler.as_ref(), join.token());
            }
        }
    }

    fn emit_one(&self, formatter: &MetricFormatter<'_>, key: &str, sampler: Option<&Sampler>, token: SendToken) {
        if sampler.map_or(true, |s| s.sample()) {
            let metric = formatter.format_for_key(key);
            self.sink.emit(&metric, token);
        }
        // a sampled-out name drops its token without completing it
    }
}

impl crate::sealed::Sealed for StatsdClient {}

impl MetricBackend for StatsdClient {
    fn consume_error(&self, err: MetricError) {
        (self.errors)(err);
    }
}

impl fmt::Debug for StatsdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StatsdClient {{ prefix: {:?}, suffix: {:?}, sink: ..., errors: ..., tags: {:?} }}",
            self.prefix, self.suffix, self.tags
        )
    }
}

impl<T> Counted<T> for StatsdClient
where
    T: ToCounterValue,
{
    fn count<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, count: T) -> MetricBuilder<'a, 'a> {
        match count.try_to_value() {
            Ok(v) => MetricBuilder::from_fmt(
                MetricFormatter::counter(&self.prefix, &self.suffix, keys.into(), v),
                self,
            )
            .with_tags(self.tags()),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }
}

impl CountedExt for StatsdClient {}

impl<T> Timed<T> for StatsdClient
where
    T: ToTimerValue,
{
    fn time<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, time: T) -> MetricBuilder<'a, 'a> {
        match time.try_to_value() {
            Ok(v) => MetricBuilder::from_fmt(
                MetricFormatter::timer(&self.prefix, &self.suffix, keys.into(), v),
                self,
            )
            .with_tags(self.tags()),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }
}

impl<T> Gauged<T> for StatsdClient
where
    T: ToGaugeValue,
{
    fn gauge<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, value: T) -> MetricBuilder<'a, 'a> {
        match value.try_to_value() {
            Ok(v) => MetricBuilder::from_fmt(
                MetricFormatter::gauge(&self.prefix, &self.suffix, keys.into(), v),
                self,
            )
            .with_tags(self.tags()),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }
}

impl<T> Histogrammed<T> for StatsdClient
where
    T: ToHistogramValue,
{
    fn histogram<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, value: T) -> MetricBuilder<'a, 'a> {
        match value.try_to_value() {
            Ok(v) => MetricBuilder::from_fmt(
                MetricFormatter::histogram(&self.prefix, &self.suffix, keys.into(), v),
                self,
            )
            .with_tags(self.tags()),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }
}

impl<T> Setted<T> for StatsdClient
where
    T: ToSetValue,
{
    fn set<'a, K: Into<MetricKeys<'a>>>(&'a self, keys: K, value: T) -> MetricBuilder<'a, 'a> {
        match value.try_to_value() {
            Ok(v) => MetricBuilder::from_fmt(
                MetricFormatter::set(&self.prefix, &self.suffix, keys.into(), v),
                self,
            )
            .with_tags(self.tags()),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }
}

impl MetricClient for StatsdClient {}
