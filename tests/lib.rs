// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crossbeam_channel::Receiver;
use fanfare::prelude::*;
use fanfare::test::{ErrorMetricSink, ManualMetricSink};
use fanfare::{MetricResult, NopMetricSink, SpyMetricSink, StatsdClient};
use std::io;
use std::time::Duration;

fn spy_client(prefix: &str) -> (Receiver<Vec<u8>>, StatsdClient) {
    let (rx, sink) = SpyMetricSink::new();
    (rx, StatsdClient::from_sink(prefix, sink))
}

fn recv_str(rx: &Receiver<Vec<u8>>) -> String {
    String::from_utf8(rx.recv().unwrap()).unwrap()
}

// channel for observing a send_with callback's single result
fn result_channel() -> (
    impl FnOnce(MetricResult<usize>) + Send + 'static,
    crossbeam_channel::Receiver<MetricResult<usize>>,
) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (move |res| tx.send(res).unwrap(), rx)
}

#[test]
fn test_all_metric_types_on_the_wire() {
    let (rx, client) = spy_client("app");

    client.count("requests.total", 12).send();
    client.time("requests.duration", 157).send();
    client.time("requests.duration", Duration::from_millis(158)).send();
    client.gauge("connections.open", 4u64).send();
    client.gauge("load.average", 1.25).send();
    client.histogram("response.size", 512u64).send();
    client.set("users.active", 42).send();
    client.unique("users.active", 42).send();

    assert_eq!("app.requests.total:12|c", recv_str(&rx));
    assert_eq!("app.requests.duration:157|ms", recv_str(&rx));
    assert_eq!("app.requests.duration:158|ms", recv_str(&rx));
    assert_eq!("app.connections.open:4|g", recv_str(&rx));
    assert_eq!("app.load.average:1.25|g", recv_str(&rx));
    assert_eq!("app.response.size:512|h", recv_str(&rx));
    assert_eq!("app.users.active:42|s", recv_str(&rx));
    assert_eq!("app.users.active:42|s", recv_str(&rx));
}

#[test]
fn test_prefix_and_tags_on_the_wire() {
    let (rx, sink) = SpyMetricSink::new();
    let client = StatsdClient::builder("app", sink).with_tag("env", "prod").build();

    client.incr("x").send();

    assert_eq!("app.x:1|c|#env:prod", recv_str(&rx));
}

#[test]
fn test_fan_out_sends_each_name_and_totals_bytes() {
    let (rx, client) = spy_client("");
    let (callback, results) = result_channel();

    client.time(&["a", "b"], 42).send_with(callback);

    assert_eq!("a:42|ms", recv_str(&rx));
    assert_eq!("b:42|ms", recv_str(&rx));

    // "a:42|ms" and "b:42|ms", 7 bytes each
    assert_eq!(14, results.recv().unwrap().unwrap());
}

#[test]
fn test_fan_out_error_in_the_middle_latches() {
    let sink = ManualMetricSink::new();
    let client = StatsdClient::from_sink("", sink.clone());
    let (callback, results) = result_channel();

    client.incr(&["a", "b", "c"]).send_with(callback);
    assert_eq!(3, sink.pending());

    // first name succeeds, second fails, third succeeds afterwards
    sink.complete_at(0, Ok(5));
    assert!(results.is_empty());

    sink.complete_at(0, Err(io::Error::new(io::ErrorKind::ConnectionRefused, "nope")));
    let res = results.recv().unwrap();
    assert!(res.is_err());

    // the straggler's success is swallowed, the callback already fired
    sink.complete_at(0, Ok(5));
    assert!(results.is_empty());
}

#[test]
fn test_fan_out_error_first_latches_immediately() {
    let sink = ManualMetricSink::new();
    let client = StatsdClient::from_sink("", sink.clone());
    let (callback, results) = result_channel();

    client.incr(&["a", "b"]).send_with(callback);

    sink.complete_at(0, Err(io::Error::new(io::ErrorKind::ConnectionRefused, "nope")));
    assert!(results.recv().unwrap().is_err());

    sink.complete_at(0, Ok(5));
    assert!(results.is_empty());
}

#[test]
fn test_fan_out_success_totals_regardless_of_order() {
    let sink = ManualMetricSink::new();
    let client = StatsdClient::from_sink("", sink.clone());
    let (callback, results) = result_channel();

    client.incr(&["aa", "b", "ccc"]).send_with(callback);
    assert_eq!(vec!["aa:1|c".to_owned(), "b:1|c".to_owned(), "ccc:1|c".to_owned()], sink.metrics());

    // complete in reverse emission order
    sink.complete_at(2, Ok(7));
    sink.complete_at(1, Ok(5));
    assert!(results.is_empty());

    sink.complete_at(0, Ok(6));
    assert_eq!(18, results.recv().unwrap().unwrap());
}

#[test]
fn test_single_name_error_reaches_callback() {
    let client = StatsdClient::from_sink("", ErrorMetricSink::always());
    let (callback, results) = result_channel();

    client.incr("some.counter").send_with(callback);

    assert!(results.recv().unwrap().is_err());
}

#[test]
fn test_mock_mode_accepts_everything_with_zero_bytes() {
    let client = StatsdClient::from_sink("app", NopMetricSink);
    let (callback, results) = result_channel();

    client.incr(&["a", "b", "c"]).send_with(callback);

    assert_eq!(0, results.recv().unwrap().unwrap());
}

#[test]
fn test_sampled_fan_out_may_never_fire_callback() {
    // rate valid but sink never completes anything, so whether names were
    // sampled out or parked, the callback must not have fired yet
    let sink = ManualMetricSink::new();
    let client = StatsdClient::from_sink("", sink.clone());
    let (callback, results) = result_channel();

    client.incr(&["a", "b"]).with_sample_rate(0.000001).send_with(callback);

    // with a rate this small both names are all but certainly dropped,
    // leaving nothing pending and the callback forever unfired
    sink.complete_all(|m| Ok(m.len()));
    assert!(results.is_empty());
}

#[test]
fn test_sample_rate_annotated_on_wire() {
    let (rx, client) = spy_client("");

    client.incr("some.counter").with_sample_rate(1.0).send();
    assert_eq!("some.counter:1|c", recv_str(&rx));
}
