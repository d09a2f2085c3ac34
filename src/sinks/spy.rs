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
use crate::sinks::core::MetricSink;
use crossbeam_channel::{self, Receiver, Sender, TrySendError};
use std::io;

fn send_metric(tx: &Sender<Vec<u8>>, metric: &str) -> io::Result<usize> {
    let bytes = metric.as_bytes().to_vec();
    let len = bytes.len();

    match tx.try_send(bytes) {
        Ok(()) => Ok(len),
        Err(TrySendError::Full(_)) => Err(io::Error::new(io::ErrorKind::WouldBlock, "channel full")),
        Err(TrySendError::Disconnected(_)) => {
            Err(io::Error::new(io::ErrorKind::NotConnected, "channel disconnected"))
        }
    }
}

/// Implementation of a `MetricSink` that captures each metric as written.
///
/// Metrics are available to callers as `Vec<u8>` payloads via the receiving
/// end of a channel, one payload per metric. This is mostly useful for unit
/// and integration testing: assertions can be made on the exact datagrams a
/// client would have put on the wire.
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
/// client.incr("some.counter").send();
/// assert_eq!("some.counter:1|c".as_bytes(), rx.recv().unwrap().as_slice());
/// ```
#[derive(Debug, Clone)]
pub struct SpyMetricSink {
    sender: Sender<Vec<u8>>,
}

impl SpyMetricSink {
    /// Create an unbounded spy sink along with the receiver for its metrics.
    pub fn new() -> (Receiver<Vec<u8>>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (rx, SpyMetricSink { sender: tx })
    }

    /// Create a spy sink that holds at most `queue_size` unread metrics.
    ///
    /// Once the channel is full, further writes fail with a `WouldBlock`
    /// error until the receiver drains some metrics.
    pub fn with_capacity(queue_size: usize) -> (Receiver<Vec<u8>>, Self) {
        let (tx, rx) = crossbeam_channel::bounded(queue_size);
        (rx, SpyMetricSink { sender: tx })
    }
}

impl MetricSink for SpyMetricSink {
    fn emit(&self, metric: &str, token: SendToken) {
        token.complete(send_metric(&self.sender, metric));
    }
}

#[cfg(test)]
mod tests {
    use super::{MetricSink, SpyMetricSink};
    use crate::dispatch::SendToken;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn token_expecting(expected: io::Result<usize>) -> (Arc<AtomicBool>, SendToken) {
        let called = Arc::new(AtomicBool::new(false));
        let called_ref = called.clone();

        let token = SendToken::direct(Box::new(move |res| {
            match expected {
                Ok(n) => assert_eq!(n, res.unwrap()),
                Err(_) => assert!(res.is_err()),
            }
            called_ref.store(true, Ordering::Release);
        }));

        (called, token)
    }

    #[test]
    fn test_spy_metric_sink_captures_payload() {
        let (rx, sink) = SpyMetricSink::new();
        let (called, token) = token_expecting(Ok("test.metric:4|c".len()));

        sink.emit("test.metric:4|c", token);

        assert!(called.load(Ordering::Acquire));
        assert_eq!("test.metric:4|c".as_bytes(), rx.recv().unwrap().as_slice());
    }

    #[test]
    fn test_spy_metric_sink_bounded_full() {
        let (rx, sink) = SpyMetricSink::with_capacity(1);

        let (called1, token1) = token_expecting(Ok("first:1|c".len()));
        sink.emit("first:1|c", token1);
        assert!(called1.load(Ordering::Acquire));

        let (called2, token2) = token_expecting(Err(io::Error::from(io::ErrorKind::WouldBlock)));
        sink.emit("second:1|c", token2);
        assert!(called2.load(Ordering::Acquire));

        // only the first metric made it into the channel
        assert_eq!("first:1|c".as_bytes(), rx.recv().unwrap().as_slice());
        assert!(rx.try_recv().is_err());
    }
}
