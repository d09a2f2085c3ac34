// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Sinks for exercising clients in unit and integration tests.
//!
//! Hidden from documentation, not part of the supported API.

use crate::dispatch::SendToken;
use crate::sinks::MetricSink;
use std::io;
use std::sync::{Arc, Mutex};

/// Sink that parks each metric and its completion slot until the test
/// decides how and in what order the sends finish.
///
/// This allows tests to observe fan-out aggregation under arbitrary
/// completion interleavings (errors first, errors in the middle, success
/// out of order) that real sinks complete too promptly to reproduce.
#[derive(Debug, Clone)]
pub struct ManualMetricSink {
    pending: Arc<Mutex<Vec<(String, SendToken)>>>,
}

impl ManualMetricSink {
    pub fn new() -> Self {
        ManualMetricSink {
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of sends waiting to be completed
    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Metric strings received so far, in emission order
    pub fn metrics(&self) -> Vec<String> {
        self.pending.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Complete the pending send at `index` with the given result.
    ///
    /// Panics if `index` is out of range.
    pub fn complete_at(&self, index: usize, result: io::Result<usize>) {
        let (_, token) = self.pending.lock().unwrap().remove(index);
        token.complete(result);
    }

    /// Complete every pending send, passing each metric string through `f`
    /// to decide its result.
    pub fn complete_all<F>(&self, f: F)
    where
        F: Fn(&str) -> io::Result<usize>,
    {
        let drained: Vec<_> = self.pending.lock().unwrap().drain(..).collect();
        for (metric, token) in drained {
            token.complete(f(&metric));
        }
    }
}

impl Default for ManualMetricSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSink for ManualMetricSink {
    fn emit(&self, metric: &str, token: SendToken) {
        self.pending.lock().unwrap().push((metric.to_owned(), token));
    }
}

/// Sink that fails every send with an I/O error
#[derive(Debug, Clone)]
pub struct ErrorMetricSink;

impl ErrorMetricSink {
    pub fn always() -> Self {
        ErrorMetricSink
    }
}

impl MetricSink for ErrorMetricSink {
    fn emit(&self, _metric: &str, token: SendToken) {
        token.complete(Err(io::Error::new(io::ErrorKind::Other, "write refused")));
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorMetricSink, ManualMetricSink, MetricSink};
    use crate::dispatch::SendToken;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_manual_sink_holds_until_completed() {
        let sink = ManualMetricSink::new();
        let fired = Arc::new(AtomicBool::new(false));
        let fired_ref = fired.clone();

        let token = SendToken::direct(Box::new(move |res| {
            assert_eq!(11, res.unwrap());
            fired_ref.store(true, Ordering::Release);
        }));

        sink.emit("some.key:1|c", token);
        assert_eq!(1, sink.pending());
        assert_eq!(vec!["some.key:1|c".to_owned()], sink.metrics());
        assert!(!fired.load(Ordering::Acquire));

        sink.complete_at(0, Ok(11));
        assert_eq!(0, sink.pending());
        assert!(fired.load(Ordering::Acquire));
    }

    #[test]
    fn test_error_sink_fails_sends() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_ref = fired.clone();

        let token = SendToken::direct(Box::new(move |res| {
            assert!(res.is_err());
            fired_ref.store(true, Ordering::Release);
        }));

        ErrorMetricSink::always().emit("some.key:1|c", token);
        assert!(fired.load(Ordering::Acquire));
    }
}
