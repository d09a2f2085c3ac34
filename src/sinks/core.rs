// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::dispatch::SendToken;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for various backends that send Statsd metrics somewhere.
///
/// The metric string will be in the canonical format to be sent to a
/// Statsd server. The metric string will not include a trailing newline.
/// Examples of each supported metric type are given below.
///
/// ## Counter
///
/// ``` text
/// some.counter:123|c
/// ```
///
/// ## Timer
///
/// ``` text
/// some.timer:456|ms
/// ```
///
/// ## Gauge
///
/// ``` text
/// some.gauge:5|g
/// ```
///
/// ## Histogram
///
/// ``` text
/// some.histogram:4|h
/// ```
///
/// ## Set
///
/// ``` text
/// some.set:2|s
/// ```
///
/// Implementations receive a [`SendToken`] alongside the metric and must
/// complete it exactly once with the outcome of the write, typically right
/// away but possibly later from another thread. Completing the token is how
/// callbacks registered via `.send_with()` (and fan-out aggregation) learn
/// whether the metric made it out.
pub trait MetricSink {
    /// Send the Statsd metric using this sink, completing `token` with the
    /// number of bytes written or an I/O error.
    fn emit(&self, metric: &str, token: SendToken);

    /// Return I/O telemetry like bytes sent or bytes dropped.
    ///
    /// Sinks with no visibility into their own I/O may return `SinkStats`
    /// at its default (zero) values.
    fn stats(&self) -> SinkStats {
        SinkStats::default()
    }
}

/// Telemetry about the I/O performed by a `MetricSink`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SinkStats {
    /// Number of bytes successfully sent to the wire
    pub bytes_sent: u64,
    /// Number of bytes that couldn't be sent due to errors
    pub bytes_dropped: u64,
    /// Number of datagrams successfully sent to the wire
    pub packets_sent: u64,
    /// Number of datagrams that couldn't be sent due to errors
    pub packets_dropped: u64,
}

/// Counters shared between a socket-backed sink and its stats snapshots
#[derive(Debug, Default, Clone)]
pub(crate) struct SocketStats {
    bytes_sent: Arc<AtomicU64>,
    bytes_dropped: Arc<AtomicU64>,
    packets_sent: Arc<AtomicU64>,
    packets_dropped: Arc<AtomicU64>,
}

impl SocketStats {
    pub(crate) fn incr_bytes_sent(&self, n: u64) {
        self.bytes_sent.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn incr_bytes_dropped(&self, n: u64) {
        self.bytes_dropped.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn incr_packets_sent(&self) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_packets_dropped(&self) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the result of a single datagram write and pass it through.
    pub(crate) fn update(&self, res: io::Result<usize>, len: usize) -> io::Result<usize> {
        match res {
            Ok(written) => {
                self.incr_bytes_sent(written as u64);
                self.incr_packets_sent();
            }
            Err(_) => {
                self.incr_bytes_dropped(len as u64);
                self.incr_packets_dropped();
            }
        }

        res
    }
}

impl From<&SocketStats> for SinkStats {
    fn from(stats: &SocketStats) -> Self {
        SinkStats {
            bytes_sent: stats.bytes_sent.load(Ordering::Relaxed),
            bytes_dropped: stats.bytes_dropped.load(Ordering::Relaxed),
            packets_sent: stats.packets_sent.load(Ordering::Relaxed),
            packets_dropped: stats.packets_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Implementation of a `MetricSink` that discards all metrics.
///
/// Useful for disabling metric collection (a "mock mode") or unit tests:
/// every metric is accepted, dropped, and its token completed with zero
/// bytes written.
#[derive(Debug, Clone)]
pub struct NopMetricSink;

impl MetricSink for NopMetricSink {
    fn emit(&self, _metric: &str, token: SendToken) {
        token.complete(Ok(0));
    }
}

#[cfg(test)]
mod tests {
    use super::{MetricSink, NopMetricSink, SinkStats, SocketStats};
    use crate::dispatch::SendToken;
    use std::io;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_nop_metric_sink_completes_with_zero() {
        let completed = Arc::new(AtomicU64::new(u64::MAX));
        let completed_ref = completed.clone();

        let token = SendToken::direct(Box::new(move |res| {
            completed_ref.store(res.unwrap() as u64, Ordering::Release);
        }));

        NopMetricSink.emit("baz:4|c", token);
        assert_eq!(0, completed.load(Ordering::Acquire));
    }

    #[test]
    fn test_nop_metric_sink_default_stats() {
        assert_eq!(SinkStats::default(), NopMetricSink.stats());
    }

    #[test]
    fn test_socket_stats_update_success() {
        let stats = SocketStats::default();
        let res = stats.update(Ok(7), 7);

        assert_eq!(7, res.unwrap());

        let snapshot = SinkStats::from(&stats);
        assert_eq!(7, snapshot.bytes_sent);
        assert_eq!(1, snapshot.packets_sent);
        assert_eq!(0, snapshot.bytes_dropped);
        assert_eq!(0, snapshot.packets_dropped);
    }

    #[test]
    fn test_socket_stats_update_error() {
        let stats = SocketStats::default();
        let res = stats.update(Err(io::Error::from(io::ErrorKind::WouldBlock)), 9);

        assert!(res.is_err());

        let snapshot = SinkStats::from(&stats);
        assert_eq!(0, snapshot.bytes_sent);
        assert_eq!(0, snapshot.packets_sent);
        assert_eq!(9, snapshot.bytes_dropped);
        assert_eq!(1, snapshot.packets_dropped);
    }
}
