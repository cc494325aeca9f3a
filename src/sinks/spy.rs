// Statsline - A small Statsd client for Rust
//
// Copyright 2026 Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::sinks::core::MetricSink;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::io::{self, ErrorKind};

/// `MetricSink` implementation that writes every metric line to the `Sender`
/// half of a channel while callers are given ownership of the `Receiver` half.
///
/// This is not a general purpose sink, rather it's a sink meant for verifying
/// the exact lines written during the course of tests. By default the channel
/// is unbounded. The channel size can be limited using `with_capacity`, in
/// which case emitting to a full channel fails the same way a full socket
/// buffer would.
///
/// # Example
///
/// ```
/// use statsline::{MetricsClient, SpyMetricSink};
///
/// let (rx, sink) = SpyMetricSink::new();
/// let client = MetricsClient::from_sink("example", sink);
///
/// client.gauge_inc_by("queue.depth", 3);
///
/// assert_eq!("example.queue.depth:+3|g", rx.recv().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct SpyMetricSink {
    sender: Sender<String>,
}

impl SpyMetricSink {
    pub fn new() -> (Receiver<String>, Self) {
        Self::with_queue_capacity(None)
    }

    pub fn with_capacity(queue: usize) -> (Receiver<String>, Self) {
        Self::with_queue_capacity(Some(queue))
    }

    fn with_queue_capacity(queue: Option<usize>) -> (Receiver<String>, Self) {
        let (tx, rx) = match queue {
            Some(sz) => bounded(sz),
            None => unbounded(),
        };
        (rx, SpyMetricSink { sender: tx })
    }
}

impl MetricSink for SpyMetricSink {
    fn emit(&self, metric: &str) -> io::Result<usize> {
        match self.sender.try_send(metric.to_owned()) {
            Err(TrySendError::Disconnected(_)) => Err(io::Error::new(ErrorKind::Other, "channel disconnected")),
            Err(TrySendError::Full(_)) => Err(io::Error::new(ErrorKind::WouldBlock, "channel full")),
            Ok(_) => Ok(metric.len()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{MetricSink, SpyMetricSink};
    use std::io::ErrorKind;

    #[test]
    fn test_spy_metric_sink() {
        let (rx, sink) = SpyMetricSink::new();
        assert_eq!(7, sink.emit("buz:1|c").unwrap());

        assert_eq!("buz:1|c", rx.recv().unwrap());
    }

    #[test]
    fn test_spy_metric_sink_full() {
        let (rx, sink) = SpyMetricSink::with_capacity(1);
        sink.emit("foo:1|c").unwrap();
        let err = sink.emit("foo:2|c").unwrap_err();

        assert_eq!(ErrorKind::WouldBlock, err.kind());
        assert_eq!(vec!["foo:1|c".to_string()], rx.try_iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_spy_metric_sink_disconnected() {
        let (rx, sink) = SpyMetricSink::new();
        drop(rx);

        assert!(sink.emit("foo:1|c").is_err());
    }
}
