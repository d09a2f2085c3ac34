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
use crate::sinks::core::{MetricSink, SinkStats, SocketStats};
use crate::types::{ErrorKind, MetricError, MetricResult};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Resolve a hostname and port to a single socket address.
///
/// Resolution happens once, here: sinks cache the resulting address for
/// their entire lifetime rather than re-resolving per metric.
pub(crate) fn get_addr<A: ToSocketAddrs>(addr: A) -> MetricResult<SocketAddr> {
    match addr.to_socket_addrs()?.next() {
        Some(addr) => Ok(addr),
        None => Err(MetricError::from((ErrorKind::InvalidInput, "No socket addresses yielded"))),
    }
}

/// Implementation of a `MetricSink` that emits metrics over UDP.
///
/// Each metric is sent to the Statsd server as a single datagram, with no
/// buffering or batching. The server address is resolved once when the sink
/// is created and reused for every send.
///
/// Note that unless the socket used is set to non-blocking mode, sends may
/// block when the OS socket buffer is full. See `UdpSocket::set_nonblocking`.
#[derive(Debug)]
pub struct UdpMetricSink {
    addr: SocketAddr,
    socket: UdpSocket,
    stats: SocketStats,
}

impl UdpMetricSink {
    /// Construct a new `UdpMetricSink` instance.
    ///
    /// The address should be the address of the remote metric server to
    /// emit metrics to, and the socket should already be bound to a local
    /// address (typically `0.0.0.0:0` to let the OS pick a free port).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::net::UdpSocket;
    /// use fanfare::{UdpMetricSink, DEFAULT_PORT};
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    /// let host = ("metrics.example.com", DEFAULT_PORT);
    /// let sink = UdpMetricSink::from(host, socket).unwrap();
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server.
    /// * The host address is otherwise unable to be parsed.
    pub fn from<A>(to_addr: A, socket: UdpSocket) -> MetricResult<UdpMetricSink>
    where
        A: ToSocketAddrs,
    {
        let addr = get_addr(to_addr)?;
        Ok(UdpMetricSink {
            addr,
            socket,
            stats: SocketStats::default(),
        })
    }

    fn send(&self, metric: &str) -> io::Result<usize> {
        self.stats.update(self.socket.send_to(metric.as_bytes(), self.addr), metric.len())
    }
}

impl MetricSink for UdpMetricSink {
    fn emit(&self, metric: &str, token: SendToken) {
        token.complete(self.send(metric));
    }

    fn stats(&self) -> SinkStats {
        (&self.stats).into()
    }
}

#[cfg(test)]
mod tests {
    use super::{get_addr, MetricSink, UdpMetricSink};
    use crate::dispatch::SendToken;
    use std::net::UdpSocket;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_get_addr_bad_address() {
        let res = get_addr("asdf");
        assert!(res.is_err());
    }

    #[test]
    fn test_get_addr_valid_address() {
        let res = get_addr("127.0.0.1:8125");
        assert_eq!("127.0.0.1:8125", res.unwrap().to_string());
    }

    #[test]
    fn test_udp_metric_sink_emit() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let server_addr = server.local_addr().unwrap();

        let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
        let sink = UdpMetricSink::from(server_addr, socket).unwrap();

        let written = Arc::new(AtomicI64::new(-1));
        let written_ref = written.clone();
        let token = SendToken::direct(Box::new(move |res| {
            written_ref.store(res.unwrap() as i64, Ordering::Release);
        }));

        sink.emit("test.metric:4|c", token);

        assert_eq!("test.metric:4|c".len() as i64, written.load(Ordering::Acquire));

        let stats = sink.stats();
        assert_eq!(1, stats.packets_sent);
        assert_eq!("test.metric:4|c".len() as u64, stats.bytes_sent);
    }
}
