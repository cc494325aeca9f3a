// Statsline - A small Statsd client for Rust
//
// Copyright 2026 Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A small Statsd client for Rust.
//!
//! Statsline formats counters, timers, gauges, and sets in the Statsd line
//! protocol and writes them to a server over UDP or TCP. Sending a metric
//! never blocks on a response and never fails at the call site.
//!
//! ## Features
//!
//! * Counters, timers, gauges (absolute and relative), and sets.
//! * A key prefix and [Datadog](https://docs.datadoghq.com/developers/dogstatsd/)
//!   style tags, both global and per metric.
//! * Client side sampling with the sample rate written on the wire.
//! * UDP or TCP transports, plus alternate backends via the `MetricSink` trait.
//!
//! ## Install
//!
//! ```toml
//! [dependencies]
//! statsline = "x.y.z"
//! ```
//!
//! ## Usage
//!
//! ### Simple Use
//!
//! Create a client, open a connection to the Statsd server, and send some
//! metrics. Until `open` succeeds (or after `close`) metrics are silently
//! discarded.
//!
//! ```rust,no_run
//! use statsline::{MetricsClient, Transport, DEFAULT_PORT};
//!
//! let mut client = MetricsClient::new();
//! client.set_prefix("my.app");
//! client.open("localhost", DEFAULT_PORT, Transport::Udp).unwrap();
//!
//! client.increment("requests");
//! client.timing("request.time", 127);
//! client.gauge("connections", 12);
//! client.gauge_dec_by("connections", 1);
//! client.set("users.unique", 42);
//! ```
//!
//! ### Tags and Sampling
//!
//! Each metric method has a `_with_tags` variant returning a `MetricBuilder`
//! that allows adding tags and a sample rate before sending. Tags given to
//! the builder are written before the client's global tags.
//!
//! ```rust
//! use statsline::{MetricsClient, SpyMetricSink};
//!
//! let (rx, sink) = SpyMetricSink::new();
//! let client = MetricsClient::builder()
//!     .with_prefix("my.app")
//!     .with_global_tags(["env:prod"])
//!     .with_sink(sink)
//!     .build();
//!
//! client.count_with_tags("errors", 2)
//!     .with_tag("region:us")
//!     .send();
//!
//! assert_eq!("my.app.errors:2|c|#region:us,env:prod", rx.recv().unwrap());
//! ```
//!
//! ### Error Handling
//!
//! The quiet methods like `increment` hand any I/O error to the error
//! handler of the client, which discards it by default. Use `try_send` on a
//! builder to receive the error directly along with whether the metric was
//! written, sampled out, or discarded because no connection is open.
//!
//! ```rust
//! use statsline::{Emission, MetricsClient};
//!
//! let client = MetricsClient::new();
//! let res = client.increment_with_tags("requests").try_send();
//!
//! assert_eq!(Emission::Closed, res.unwrap());
//! ```
//!
//! ### Sharing Between Threads
//!
//! Emitting metrics only needs a shared reference, so a configured client
//! can be wrapped in an `Arc` and used from many threads.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::thread;
//! use statsline::{MetricsClient, Transport, DEFAULT_PORT};
//!
//! let mut client = MetricsClient::new();
//! client.open("localhost", DEFAULT_PORT, Transport::Tcp).unwrap();
//! let client = Arc::new(client);
//!
//! let handles: Vec<_> = (0..4).map(|_| {
//!     let client = Arc::clone(&client);
//!     thread::spawn(move || client.increment("worker.done"))
//! }).collect();
//!
//! for h in handles {
//!     h.join().unwrap();
//! }
//! ```

#![forbid(unsafe_code)]

/// Well-known port of Statsd servers.
pub const DEFAULT_PORT: u16 = 8125;

/// Version of this library.
///
/// ```
/// assert!(!statsline::version().is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use self::builder::sampler::{should_send, RngSampler, Sampler, ThreadRngSampler};
pub use self::builder::{normalize, MetricBuilder, MetricType, Sign};

pub use self::client::{MetricsClient, MetricsClientBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_WRITE_TIMEOUT};

pub use self::sinks::{MetricSink, NopMetricSink, SinkStats, SpyMetricSink, TcpMetricSink, UdpMetricSink};

pub use self::types::{Emission, ErrorKind, MetricError, MetricResult, Transport};

mod builder;
mod client;
mod sinks;
mod types;
