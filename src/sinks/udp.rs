// Statsline - A small Statsd client for Rust
//
// Copyright 2026 Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use crate::sinks::core::{resolve, MetricSink};
use crate::types::MetricResult;

/// Implementation of a `MetricSink` that emits metrics over UDP.
///
/// The socket is connected to the address of the Statsd server once, when
/// the sink is created, so that each metric is written with a plain `send`
/// instead of a `send_to`. Each metric is sent as its own datagram when
/// `.emit()` is called, in the thread of the caller.
#[derive(Debug)]
pub struct UdpMetricSink {
    addr: SocketAddr,
    socket: UdpSocket,
}

impl UdpMetricSink {
    /// Create a non-blocking UDP socket bound to an ephemeral local port and
    /// connect it to the first address the host resolves to.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use statsline::{UdpMetricSink, DEFAULT_PORT};
    ///
    /// let sink = UdpMetricSink::connect(("metrics.example.com", DEFAULT_PORT));
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server.
    /// * The host address is otherwise unable to be parsed.
    /// * The local socket cannot be created or connected.
    pub fn connect<A>(to_addr: A) -> MetricResult<UdpMetricSink>
    where
        A: ToSocketAddrs,
    {
        let addr = first_addr(to_addr)?;
        let socket = match addr {
            SocketAddr::V4(_) => UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?,
            SocketAddr::V6(_) => UdpSocket::bind((Ipv6Addr::UNSPECIFIED, 0))?,
        };
        socket.set_nonblocking(true)?;
        Self::from(addr, socket)
    }

    /// Construct a new `UdpMetricSink` from an already bound socket.
    ///
    /// The socket should already be bound to a local address with any
    /// desired configuration applied (blocking vs non-blocking, timeouts,
    /// etc.). It will be connected to the given address.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::net::UdpSocket;
    /// use statsline::{UdpMetricSink, DEFAULT_PORT};
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    /// let host = ("metrics.example.com", DEFAULT_PORT);
    /// let sink = UdpMetricSink::from(host, socket);
    /// ```
    pub fn from<A>(to_addr: A, socket: UdpSocket) -> MetricResult<UdpMetricSink>
    where
        A: ToSocketAddrs,
    {
        let addr = first_addr(to_addr)?;
        socket.connect(addr)?;
        Ok(UdpMetricSink { addr, socket })
    }

    /// Address of the Statsd server this sink writes to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }
}

fn first_addr<A: ToSocketAddrs>(to_addr: A) -> MetricResult<SocketAddr> {
    // resolve() never returns an empty list
    Ok(resolve(to_addr)?[0])
}

impl MetricSink for UdpMetricSink {
    fn emit(&self, metric: &str) -> io::Result<usize> {
        self.socket.send(metric.as_bytes())
    }
}
