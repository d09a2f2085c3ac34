// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::client::StatsdClient;
use crate::dispatch::SendCallback;
use crate::ext::MetricBackend;
use crate::types::{MetricError, MetricResult};
use std::fmt::{self, Write};

mod byte_str;
mod sample_rate;
pub(crate) mod sampler;

pub(crate) use self::sample_rate::SampleRate;

/// Type of metric that knows how to display its wire token
#[derive(Debug, Clone, Copy)]
pub(crate) enum MetricType {
    Counter,
    Timer,
    Gauge,
    Histogram,
    Set,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricType::Counter => "c".fmt(f),
            MetricType::Timer => "ms".fmt(f),
            MetricType::Gauge => "g".fmt(f),
            MetricType::Histogram => "h".fmt(f),
            MetricType::Set => "s".fmt(f),
        }
    }
}

/// Holder for primitive metric values that knows how to display itself
///
/// This struct is internal to how the various types that are valid for each
/// kind of metric (types for which `ToCounterValue`, `ToTimerValue`, etc. are
/// implemented) are rendered, but is exposed for advanced use cases.
#[derive(Debug, Clone, Copy)]
pub enum MetricValue {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricValue::Signed(v) => v.fmt(f),
            MetricValue::Unsigned(v) => v.fmt(f),
            MetricValue::Float(v) => v.fmt(f),
        }
    }
}

/// One metric name, or an ordered sequence of names to fan out to.
///
/// Most metrics go to a single name. The fan-out form emits one datagram
/// per name, all carrying the same value, type, sample rate, and tags:
///
/// ```
/// use fanfare::prelude::*;
/// use fanfare::{NopMetricSink, StatsdClient};
///
/// let client = StatsdClient::from_sink("", NopMetricSink);
/// client.time("render.page", 42).send();
/// client.time(&["render.page", "render.total"], 42).send();
/// ```
#[derive(Debug, Clone, Copy)]
pub enum MetricKeys<'a> {
    One(&'a str),
    Many(&'a [&'a str]),
}

impl<'a> MetricKeys<'a> {
    /// Number of names in the original sequence
    pub fn count(&self) -> usize {
        match self {
            MetricKeys::One(_) => 1,
            MetricKeys::Many(keys) => keys.len(),
        }
    }

    /// The single name, if this is not a fan-out
    pub(crate) fn single(&self) -> Option<&'a str> {
        match self {
            MetricKeys::One(key) => Some(key),
            MetricKeys::Many(_) => None,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        match self {
            MetricKeys::One(key) => std::slice::from_ref(key).iter().copied(),
            MetricKeys::Many(keys) => keys.iter().copied(),
        }
    }
}

impl<'a> From<&'a str> for MetricKeys<'a> {
    fn from(key: &'a str) -> Self {
        MetricKeys::One(key)
    }
}

impl<'a> From<&'a [&'a str]> for MetricKeys<'a> {
    fn from(keys: &'a [&'a str]) -> Self {
        MetricKeys::Many(keys)
    }
}

impl<'a, const N: usize> From<&'a [&'a str; N]> for MetricKeys<'a> {
    fn from(keys: &'a [&'a str; N]) -> Self {
        MetricKeys::Many(&keys[..])
    }
}

impl<'a> From<&'a Vec<&'a str>> for MetricKeys<'a> {
    fn from(keys: &'a Vec<&'a str>) -> Self {
        MetricKeys::Many(keys.as_slice())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MetricFormatter<'a> {
    prefix: &'a str,
    suffix: &'a str,
    keys: MetricKeys<'a>,
    val: MetricValue,
    type_: MetricType,
    sample_rate: Option<SampleRate>,
    tags: Vec<(Option<&'a str>, &'a str)>,
    kv_size: usize,
}

impl<'a> MetricFormatter<'a> {
    const TAG_PREFIX: &'static str = "|#";

    pub(crate) fn counter(prefix: &'a str, suffix: &'a str, keys: MetricKeys<'a>, val: MetricValue) -> Self {
        Self::from_val(prefix, suffix, keys, val, MetricType::Counter)
    }

    pub(crate) fn timer(prefix: &'a str, suffix: &'a str, keys: MetricKeys<'a>, val: MetricValue) -> Self {
        Self::from_val(prefix, suffix, keys, val, MetricType::Timer)
    }

    pub(crate) fn gauge(prefix: &'a str, suffix: &'a str, keys: MetricKeys<'a>, val: MetricValue) -> Self {
        Self::from_val(prefix, suffix, keys, val, MetricType::Gauge)
    }

    pub(crate) fn histogram(prefix: &'a str, suffix: &'a str, keys: MetricKeys<'a>, val: MetricValue) -> Self {
        Self::from_val(prefix, suffix, keys, val, MetricType::Histogram)
    }

    pub(crate) fn set(prefix: &'a str, suffix: &'a str, keys: MetricKeys<'a>, val: MetricValue) -> Self {
        Self::from_val(prefix, suffix, keys, val, MetricType::Set)
    }

    fn from_val(prefix: &'a str, suffix: &'a str, keys: MetricKeys<'a>, val: MetricValue, type_: MetricType) -> Self {
        MetricFormatter {
            prefix,
            suffix,
            keys,
            val,
            type_,
            sample_rate: None,
            tags: Vec::new(),
            // running total of the bytes the tag key-value parts will need,
            // maintained as tags are added so formatting can size its
            // output buffer without a second pass over the tags
            kv_size: 0,
        }
    }

    pub(crate) fn keys(&self) -> &MetricKeys<'a> {
        &self.keys
    }

    pub(crate) fn sample_rate(&self) -> Option<&SampleRate> {
        self.sample_rate.as_ref()
    }

    pub(crate) fn set_sample_rate(&mut self, rate: SampleRate) {
        self.sample_rate = Some(rate);
    }

    fn with_tag(&mut self, key: &'a str, value: &'a str) {
        self.tags.push((Some(key), value));
        self.kv_size += key.len() + 1 /* : */ + value.len();
    }

    fn with_tag_value(&mut self, value: &'a str) {
        self.tags.push((None, value));
        self.kv_size += value.len();
    }

    fn write_base_metric(&self, key: &str, out: &mut String) {
        let _ = write!(out, "{}{}{}:{}|{}", self.prefix, key, self.suffix, self.val, self.type_);
    }

    fn write_sample_rate(&self, out: &mut String) {
        if let Some(rate) = &self.sample_rate {
            if rate.is_annotated() {
                out.push('|');
                out.push_str(rate.as_str());
            }
        }
    }

    fn write_tags(&self, out: &mut String) {
        if !self.tags.is_empty() {
            out.push_str(Self::TAG_PREFIX);
            for (i, &(key, value)) in self.tags.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if let Some(key) = key {
                    out.push_str(key);
                    out.push(':');
                }
                out.push_str(value);
            }
        }
    }

    fn tag_size_hint(&self) -> usize {
        if self.tags.is_empty() {
            return 0;
        }

        // prefix, keys and values, commas
        Self::TAG_PREFIX.len() + self.kv_size + self.tags.len() - 1
    }

    fn rate_size_hint(&self) -> usize {
        match &self.sample_rate {
            Some(rate) if rate.is_annotated() => 1 /* | */ + rate.kv_size(),
            _ => 0,
        }
    }

    /// Render the full wire form of this metric for one of its names.
    pub(crate) fn format_for_key(&self, key: &str) -> String {
        let base_size = self.prefix.len() + key.len() + self.suffix.len()
            + 1 /* : */ + 10 /* value */ + 1 /* | */ + 2 /* type */;
        let size_hint = base_size + self.rate_size_hint() + self.tag_size_hint();

        let mut metric_string = String::with_capacity(size_hint);
        self.write_base_metric(key, &mut metric_string);
        self.write_sample_rate(&mut metric_string);
        self.write_tags(&mut metric_string);
        metric_string
    }
}

/// Internal state of a `MetricBuilder`
///
/// The builder is either accumulating a metric to dispatch via a client or
/// holding on to an error that will be surfaced when `.send()` or
/// `.send_with()` is finally invoked.
enum BuilderRepr<'m, 'c> {
    Ready(MetricFormatter<'m>, &'c StatsdClient),
    Error(MetricError, &'c StatsdClient),
}

/// Builder for annotating and sending an in-progress metric.
///
/// The builder adds optional annotations, tags and a sample rate, to a
/// metric previously constructed by a method on `StatsdClient`, then
/// dispatches it: `.send()` fires and forgets, routing any eventual error
/// to the client's error handler, while `.send_with()` registers a callback
/// that observes the outcome, including the aggregated total of a fan-out.
///
/// Tags are a [Datadog](https://docs.datadoghq.com/developers/dogstatsd/)
/// extension to Statsd and may not be supported by all servers.
///
/// The only way to obtain a builder is via the metric methods of a
/// `StatsdClient`; the builder is consumed by sending.
///
/// # Examples
///
/// ```
/// use fanfare::prelude::*;
/// use fanfare::{SpyMetricSink, StatsdClient};
///
/// let (rx, sink) = SpyMetricSink::new();
/// let client = StatsdClient::from_sink("app", sink);
///
/// client.incr("requests")
///     .with_tag("method", "GET")
///     .with_tag_value("beta")
///     .send();
///
/// let sent = rx.recv().unwrap();
/// assert_eq!("app.requests:1|c|#method:GET,beta".as_bytes(), sent.as_slice());
/// ```
///
/// Observing the result of a send:
///
/// ```
/// use fanfare::prelude::*;
/// use fanfare::{NopMetricSink, StatsdClient};
///
/// let client = StatsdClient::from_sink("app", NopMetricSink);
///
/// client.count("events", 7).send_with(|res| {
///     // NopMetricSink reports zero bytes written
///     assert_eq!(0, res.unwrap());
/// });
/// ```
#[must_use = "Did you forget to call .send() after building the metric?"]
pub struct MetricBuilder<'m, 'c> {
    repr: BuilderRepr<'m, 'c>,
}

impl<'m, 'c> MetricBuilder<'m, 'c> {
    pub(crate) fn from_fmt(formatter: MetricFormatter<'m>, client: &'c StatsdClient) -> Self {
        MetricBuilder {
            repr: BuilderRepr::Ready(formatter, client),
        }
    }

    pub(crate) fn from_error(err: MetricError, client: &'c StatsdClient) -> Self {
        MetricBuilder {
            repr: BuilderRepr::Error(err, client),
        }
    }

    /// Add a key-value tag to this metric.
    ///
    /// # Example
    ///
    /// ```
    /// use fanfare::prelude::*;
    /// use fanfare::{SpyMetricSink, StatsdClient};
    ///
    /// let (rx, sink) = SpyMetricSink::new();
    /// let client = StatsdClient::from_sink("", sink);
    ///
    /// client.count("some.key", 1).with_tag("user", "authenticated").send();
    /// assert_eq!("some.key:1|c|#user:authenticated".as_bytes(), rx.recv().unwrap().as_slice());
    /// ```
    pub fn with_tag(mut self, key: &'m str, value: &'m str) -> Self {
        if let BuilderRepr::Ready(ref mut formatter, _) = self.repr {
            formatter.with_tag(key, value);
        }
        self
    }

    /// Add a value tag to this metric.
    ///
    /// # Example
    ///
    /// ```
    /// use fanfare::prelude::*;
    /// use fanfare::{SpyMetricSink, StatsdClient};
    ///
    /// let (rx, sink) = SpyMetricSink::new();
    /// let client = StatsdClient::from_sink("", sink);
    ///
    /// client.count("some.key", 4).with_tag_value("beta-testing").send();
    /// assert_eq!("some.key:4|c|#beta-testing".as_bytes(), rx.recv().unwrap().as_slice());
    /// ```
    pub fn with_tag_value(mut self, value: &'m str) -> Self {
        if let BuilderRepr::Ready(ref mut formatter, _) = self.repr {
            formatter.with_tag_value(value);
        }
        self
    }

    /// Set a sample rate in `(0, 1]` for this metric.
    ///
    /// Each name of the metric is independently emitted with probability
    /// `rate` at send time; rates below one are annotated on the wire so
    /// the server can compensate. An out-of-range rate turns the eventual
    /// send into an `InvalidInput` error.
    ///
    /// # Example
    ///
    /// ```
    /// use fanfare::prelude::*;
    /// use fanfare::{NopMetricSink, StatsdClient};
    ///
    /// let client = StatsdClient::from_sink("", NopMetricSink);
    ///
    /// // Emitted roughly half the time, as "requests:1|c|@0.5"
    /// client.incr("requests").with_sample_rate(0.5).send();
    /// ```
    pub fn with_sample_rate(mut self, rate: f32) -> Self {
        if let BuilderRepr::Ready(ref mut formatter, client) = self.repr {
            match SampleRate::try_from(rate) {
                Ok(rate) => formatter.set_sample_rate(rate),
                Err(err) => return MetricBuilder::from_error(err, client),
            }
        }
        self
    }

    pub(crate) fn with_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'m str>, &'m str)>,
    {
        if let BuilderRepr::Ready(ref mut formatter, _) = self.repr {
            for (key, value) in tags {
                match key {
                    Some(key) => formatter.with_tag(key, value),
                    None => formatter.with_tag_value(value),
                }
            }
        }
        self
    }

    /// Send this metric, discarding the outcome on success and invoking
    /// the client's error handler on failure.
    ///
    /// By default the error handler is a no-op that discards all errors.
    /// If that isn't desired, a custom handler should be supplied when
    /// creating the `StatsdClient` instance.
    ///
    /// Note that the builder is consumed and so `.send()` can only be
    /// called a single time per builder.
    ///
    /// # Example
    ///
    /// ```
    /// use fanfare::prelude::*;
    /// use fanfare::{NopMetricSink, StatsdClient};
    ///
    /// let client = StatsdClient::builder("some.prefix", NopMetricSink)
    ///     .with_error_handler(|e| eprintln!("metric error: {}", e))
    ///     .build();
    ///
    /// client.gauge("some.key", 7).with_tag("region", "us-west-1").send();
    /// ```
    pub fn send(self) {
        match self.repr {
            BuilderRepr::Error(err, client) => client.consume_error(err),
            BuilderRepr::Ready(formatter, client) => {
                let errors = client.error_handler();
                client.send_formatted(
                    &formatter,
                    Box::new(move |res| {
                        if let Err(err) = res {
                            errors(err);
                        }
                    }),
                );
            }
        }
    }

    /// Send this metric, invoking `callback` at most once with the outcome.
    ///
    /// For a single name the callback observes the bytes written by that
    /// send. For a fan-out it observes the first error across all names, or
    /// the total bytes once every name has completed. If names are dropped
    /// by sampling their completions never arrive and the callback may
    /// never be invoked; see [`crate::SendToken`].
    ///
    /// # Example
    ///
    /// ```
    /// use fanfare::prelude::*;
    /// use fanfare::{SpyMetricSink, StatsdClient};
    ///
    /// let (rx, sink) = SpyMetricSink::new();
    /// let client = StatsdClient::from_sink("", sink);
    ///
    /// client.time(&["a", "b"], 42).send_with(|res| {
    ///     // "a:42|ms" and "b:42|ms", 7 bytes each
    ///     assert_eq!(14, res.unwrap());
    /// });
    /// assert_eq!(2, rx.len());
    /// ```
    pub fn send_with<F>(self, callback: F)
    where
        F: FnOnce(MetricResult<usize>) + Send + 'static,
    {
        match self.repr {
            BuilderRepr::Error(err, _) => callback(Err(err)),
            BuilderRepr::Ready(formatter, client) => {
                client.send_formatted(&formatter, Box::new(callback) as SendCallback);
            }
        }
    }
}
