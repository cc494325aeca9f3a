// Statsline - A small Statsd client for Rust
//
// Copyright 2026 Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::types::{ErrorKind, MetricError, MetricResult};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts of metrics written or dropped by a client.
///
/// A metric is dropped when the write to the connection fails or when no
/// connection is open. Metrics rejected by sampling are not counted at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub bytes_dropped: u64,
    pub packets_dropped: u64,
}

#[derive(Debug, Default)]
pub(crate) struct SocketStats {
    bytes_sent: AtomicU64,
    packets_sent: AtomicU64,
    bytes_dropped: AtomicU64,
    packets_dropped: AtomicU64,
}

impl SocketStats {
    pub(crate) fn incr_sent(&self, n: u64) {
        self.bytes_sent.fetch_add(n, Ordering::Relaxed);
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_dropped(&self, n: u64) {
        self.bytes_dropped.fetch_add(n, Ordering::Relaxed);
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn update(&self, res: io::Result<usize>, len: usize) -> io::Result<usize> {
        match res {
            Ok(written) => {
                self.incr_sent(written as u64);
                Ok(written)
            }
            Err(e) => {
                self.incr_dropped(len as u64);
                Err(e)
            }
        }
    }
}

impl From<&SocketStats> for SinkStats {
    fn from(stats: &SocketStats) -> Self {
        SinkStats {
            bytes_sent: stats.bytes_sent.load(Ordering::Relaxed),
            packets_sent: stats.packets_sent.load(Ordering::Relaxed),
            bytes_dropped: stats.bytes_dropped.load(Ordering::Relaxed),
            packets_dropped: stats.packets_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Resolve anything implementing `ToSocketAddrs` into the list of concrete
/// addresses, returning an `InvalidInput` error if none were yielded.
// Public portion of the API (the sink constructors) is pass by value
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn resolve<A: ToSocketAddrs>(addr: A) -> MetricResult<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = addr.to_socket_addrs()?.collect();
    if addrs.is_empty() {
        Err(MetricError::from((ErrorKind::InvalidInput, "No socket addresses yielded")))
    } else {
        Ok(addrs)
    }
}

/// Trait for the connections a client writes metric lines to.
///
/// The metric string will be a single line in the canonical format to be
/// sent to a Statsd server, without a trailing newline. Examples of each
/// supported metric type are given below.
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
/// some.gauge:+3|g
/// ```
///
/// ## Set
///
/// ``` text
/// some.set:2|s
/// ```
///
/// Lines may carry a sample rate (`|@0.5`) and tags (`|#env:prod`) after the
/// type. Each call to `emit` should result in a single write to the
/// underlying transport.
pub trait MetricSink {
    /// Send the metric line using this sink and return the number of bytes
    /// of the line written or an I/O error.
    fn emit(&self, metric: &str) -> io::Result<usize>;

    /// Flush anything the underlying transport is holding on to.
    ///
    /// The UDP and TCP sinks write each metric immediately so this does
    /// nothing for them. It's called when a client closes its connection so
    /// that custom sinks which buffer metrics get a chance to write them.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    /// Returns false once the sink has given up on its connection and will
    /// never write another metric.
    ///
    /// The default implementation is always connected.
    fn is_connected(&self) -> bool {
        true
    }
}

/// Implementation of a `MetricSink` that discards all metrics.
///
/// Useful for disabling metric collection or unit tests.
#[derive(Debug, Clone)]
pub struct NopMetricSink;

impl MetricSink for NopMetricSink {
    fn emit(&self, metric: &str) -> io::Result<usize> {
        Ok(metric.len())
    }
}
