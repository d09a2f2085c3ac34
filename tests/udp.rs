// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use fanfare::prelude::*;
use fanfare::{StatsdClient, UdpMetricSink};
use std::net::UdpSocket;
use std::time::Duration;

fn udp_server() -> (UdpSocket, String) {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    server.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let addr = server.local_addr().unwrap().to_string();
    (server, addr)
}

fn recv_datagram(server: &UdpSocket) -> String {
    let mut buf = [0u8; 1024];
    let (len, _from) = server.recv_from(&mut buf).unwrap();
    String::from_utf8(buf[..len].to_vec()).unwrap()
}

#[test]
fn test_udp_client_delivers_datagram() {
    let (server, addr) = udp_server();

    let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    let sink = UdpMetricSink::from(addr.as_str(), socket).unwrap();
    let client = StatsdClient::from_sink("app", sink);

    client.count("requests", 7).with_tag("env", "test").send();

    assert_eq!("app.requests:7|c|#env:test", recv_datagram(&server));
}

#[test]
fn test_udp_client_fan_out_delivers_each_name() {
    let (server, addr) = udp_server();
    let client = StatsdClient::from_udp_host("", addr.as_str()).unwrap();

    client.time(&["render.page", "render.total"], 42).send();

    let first = recv_datagram(&server);
    let second = recv_datagram(&server);
    assert_eq!("render.page:42|ms", first);
    assert_eq!("render.total:42|ms", second);
}

#[test]
fn test_udp_client_stats_reflect_sends() {
    let (server, addr) = udp_server();

    let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    let sink = UdpMetricSink::from(addr.as_str(), socket).unwrap();
    let client = StatsdClient::from_sink("", sink);

    client.incr("some.counter").send();
    let _ = recv_datagram(&server);

    let stats = client.sink_stats();
    assert_eq!(1, stats.packets_sent);
    assert_eq!("some.counter:1|c".len() as u64, stats.bytes_sent);
}
