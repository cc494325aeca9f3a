// Statsline - A small Statsd client for Rust
//
// Copyright 2026 Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::sinks::core::{resolve, MetricSink};
use crate::types::{MetricError, MetricResult};

/// Implementation of a `MetricSink` that emits metrics over a TCP stream.
///
/// Since a stream has no packet boundaries, each metric is written with a
/// trailing newline so the server can split lines apart. The line and the
/// newline are written together while holding a lock on the stream so that
/// metrics emitted from several threads are never interleaved.
///
/// Writes block until the kernel accepts the bytes or the write timeout
/// passes, whichever comes first. A failed write may leave part of a line on
/// the stream, so after any write error the stream is shut down and every
/// later call to `.emit()` fails with `NotConnected`. Nothing is reconnected
/// automatically.
#[derive(Debug)]
pub struct TcpMetricSink {
    addr: SocketAddr,
    stream: Mutex<Option<TcpStream>>,
}

impl TcpMetricSink {
    /// Connect to the Statsd server, trying each resolved address in turn
    /// until one accepts the connection.
    ///
    /// Each connection attempt is bounded by `connect_timeout`. Writes on the
    /// established stream are bounded by `write_timeout`, or may block
    /// indefinitely if it's `None`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use statsline::{TcpMetricSink, DEFAULT_PORT};
    ///
    /// let host = ("metrics.example.com", DEFAULT_PORT);
    /// let sink = TcpMetricSink::connect(host, Duration::from_secs(1), Some(Duration::from_secs(1)));
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if the hostname cannot be resolved or if none of
    /// the resolved addresses accept a connection. The error from the last
    /// attempted address is returned.
    pub fn connect<A>(to_addr: A, connect_timeout: Duration, write_timeout: Option<Duration>) -> MetricResult<TcpMetricSink>
    where
        A: ToSocketAddrs,
    {
        let mut last_err = None;

        for addr in resolve(to_addr)? {
            match TcpStream::connect_timeout(&addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_write_timeout(write_timeout)?;
                    return Self::from_stream(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.map(MetricError::from).unwrap_or_else(|| {
            MetricError::from(io::Error::from(io::ErrorKind::NotConnected))
        }))
    }

    /// Construct a new `TcpMetricSink` from an already connected stream.
    ///
    /// Any timeouts should already be applied to the stream.
    pub fn from_stream(stream: TcpStream) -> MetricResult<TcpMetricSink> {
        let addr = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        Ok(TcpMetricSink {
            addr,
            stream: Mutex::new(Some(stream)),
        })
    }

    /// Address of the Statsd server this sink writes to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl MetricSink for TcpMetricSink {
    fn emit(&self, metric: &str) -> io::Result<usize> {
        let mut line = Vec::with_capacity(metric.len() + 1);
        line.extend_from_slice(metric.as_bytes());
        line.push(b'\n');

        let mut guard = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        let stream = guard.as_mut().ok_or_else(disconnected)?;

        if let Err(e) = stream.write_all(&line) {
            // the peer may have a partial line, never write after it
            let _ = stream.shutdown(Shutdown::Both);
            *guard = None;
            return Err(e);
        }

        // Only report the bytes of the metric itself, not the line ending
        Ok(metric.len())
    }

    fn flush(&self) -> io::Result<()> {
        let mut guard = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

fn disconnected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection closed after a failed write")
}
