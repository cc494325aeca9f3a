// Statsline - A small Statsd client for Rust
//
// Copyright 2026 Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error;
use std::fmt;
use std::io;

/// Transport used to reach the Statsd server.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Transport {
    /// Connectionless UDP datagrams, one metric per packet.
    #[default]
    Udp,
    /// A TCP stream, one newline terminated metric per write.
    Tcp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Transport::Udp => "udp".fmt(f),
            Transport::Tcp => "tcp".fmt(f),
        }
    }
}

/// Result of handing a metric to the client.
///
/// Failing to write is never an error at the call site of the quiet
/// metric methods, but `MetricBuilder::try_send()` reports what actually
/// happened so that callers (and tests) can tell the cases apart.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Emission {
    /// The line was written to the open connection.
    Written(String),
    /// The sampling decision rejected the metric, nothing was formatted.
    Sampled,
    /// No connection is open, the metric was discarded.
    Closed,
}

impl Emission {
    /// The line that was written, if any.
    pub fn as_metric_str(&self) -> Option<&str> {
        match self {
            Emission::Written(line) => Some(line),
            _ => None,
        }
    }

    /// Returns true if the metric was written to an open connection.
    pub fn is_written(&self) -> bool {
        matches!(self, Emission::Written(_))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    InvalidInput,
    IoError,
}

/// Error generated when opening a connection or sending metrics.
///
/// Errors are either I/O errors from the underlying socket, or input
/// errors such as a host name that resolves to no addresses.
#[derive(Debug)]
pub struct MetricError {
    repr: ErrorRepr,
}

#[derive(Debug)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    IoError(io::Error),
}

impl MetricError {
    /// Return the kind of the error
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::IoError(_) => ErrorKind::IoError,
            ErrorRepr::WithDescription(kind, _) => kind,
        }
    }
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            ErrorRepr::IoError(ref err) => err.fmt(f),
            ErrorRepr::WithDescription(_, desc) => desc.fmt(f),
        }
    }
}

impl error::Error for MetricError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.repr {
            ErrorRepr::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MetricError {
    fn from(err: io::Error) -> MetricError {
        MetricError {
            repr: ErrorRepr::IoError(err),
        }
    }
}

impl From<(ErrorKind, &'static str)> for MetricError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> MetricError {
        MetricError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

pub type MetricResult<T> = Result<T, MetricError>;

#[cfg(test)]
mod tests {
    use super::{Emission, ErrorKind, MetricError, Transport};
    use std::error::Error;
    use std::io;

    #[test]
    fn test_metric_error_kind_io_error() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "Broken pipe");
        let our_err = MetricError::from(io_err);
        assert_eq!(ErrorKind::IoError, our_err.kind());
    }

    #[test]
    fn test_metric_error_kind_invalid_input() {
        let our_err = MetricError::from((ErrorKind::InvalidInput, "Nope"));
        assert_eq!(ErrorKind::InvalidInput, our_err.kind());
    }

    #[test]
    fn test_metric_error_display_with_description() {
        let our_err = MetricError::from((ErrorKind::InvalidInput, "No socket addresses yielded"));
        assert_eq!("No socket addresses yielded", our_err.to_string());
    }

    #[test]
    fn test_metric_error_source_io_error() {
        let io_err = io::Error::new(io::ErrorKind::TimedOut, "Timeout");
        let our_err = MetricError::from(io_err);
        assert!(our_err.source().is_some());
    }

    #[test]
    fn test_metric_error_source_with_description() {
        let our_err = MetricError::from((ErrorKind::InvalidInput, "Nope"));
        assert!(our_err.source().is_none());
    }

    #[test]
    fn test_transport_display() {
        assert_eq!("udp", Transport::Udp.to_string());
        assert_eq!("tcp", Transport::Tcp.to_string());
        assert_eq!(Transport::Udp, Transport::default());
    }

    #[test]
    fn test_emission_as_metric_str() {
        let written = Emission::Written("some.key:1|c".to_string());
        assert_eq!(Some("some.key:1|c"), written.as_metric_str());
        assert!(written.is_written());

        assert_eq!(None, Emission::Sampled.as_metric_str());
        assert!(!Emission::Closed.is_written());
    }
}
