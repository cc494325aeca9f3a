// Statsline - A small Statsd client for Rust
//
// Copyright 2026 Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::builder::sampler::{Sampler, ThreadRngSampler};
use crate::builder::{GlobalTags, MetricBuilder, MetricFormatter, MetricType, Sign};
use crate::sinks::core::SocketStats;
use crate::sinks::{MetricSink, SinkStats, TcpMetricSink, UdpMetricSink};
use crate::types::{Emission, MetricError, MetricResult, Transport};
use std::fmt;
use std::panic::RefUnwindSafe;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default bound on a single TCP write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default bound on establishing a TCP connection, per resolved address.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

type BoxedSink = Box<dyn MetricSink + Sync + Send + RefUnwindSafe>;
type BoxedSampler = Box<dyn Sampler + Sync + Send + RefUnwindSafe>;
type ErrorHandler = Box<dyn Fn(MetricError) + Sync + Send + RefUnwindSafe>;

/// Builder for creating and customizing `MetricsClient` instances.
///
/// Instances of the builder should be created by calling the `::builder()`
/// method on the `MetricsClient` struct.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use statsline::{MetricError, MetricsClient};
///
/// fn my_error_handler(err: MetricError) {
///     eprintln!("Metric error! {}", err);
/// }
///
/// let client = MetricsClient::builder()
///     .with_prefix("my.app")
///     .with_global_tags(["env:production", "rust"])
///     .with_error_handler(my_error_handler)
///     .with_write_timeout(Some(Duration::from_millis(250)))
///     .build();
///
/// assert_eq!("my.app.", client.prefix());
/// ```
pub struct MetricsClientBuilder {
    prefix: String,
    global_tags: GlobalTags,
    sink: Option<BoxedSink>,
    sampler: BoxedSampler,
    errors: ErrorHandler,
    write_timeout: Option<Duration>,
    connect_timeout: Duration,
}

impl MetricsClientBuilder {
    // Set the defaults for all fields
    fn new() -> Self {
        MetricsClientBuilder {
            prefix: String::new(),
            global_tags: GlobalTags::default(),
            sink: None,
            sampler: Box::new(ThreadRngSampler),
            errors: Box::new(nop_error_handler),
            write_timeout: Some(DEFAULT_WRITE_TIMEOUT),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the prefix prepended to every metric key. A trailing `.` is added
    /// if the prefix doesn't already end with exactly one.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = formatted_prefix(prefix);
        self
    }

    /// Set the tags added to every metric, after any per-call tags.
    pub fn with_global_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.global_tags = GlobalTags::new(tags);
        self
    }

    /// Start the client with an open connection using the given sink,
    /// instead of calling `open` later.
    pub fn with_sink<T>(mut self, sink: T) -> Self
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Set the source of sampling decisions. By default the thread-local
    /// RNG is used.
    pub fn with_sampler<S>(mut self, sampler: S) -> Self
    where
        S: Sampler + Sync + Send + RefUnwindSafe + 'static,
    {
        self.sampler = Box::new(sampler);
        self
    }

    /// Set an error handler invoked when a metric sent via one of the quiet
    /// methods fails to be written.
    ///
    /// The error handler should consume the error without panicking. The error
    /// may be logged, counted, discarded, etc. - this is up to the implementation.
    pub fn with_error_handler<F>(mut self, errors: F) -> Self
    where
        F: Fn(MetricError) + Sync + Send + RefUnwindSafe + 'static,
    {
        self.errors = Box::new(errors);
        self
    }

    /// Set the timeout for writes on TCP connections opened by the client.
    /// `None` lets writes block until the kernel accepts them.
    ///
    /// Sockets don't accept a zero timeout, so `Some(Duration::ZERO)` is
    /// ignored and the current setting is kept.
    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        if timeout != Some(Duration::ZERO) {
            self.write_timeout = timeout;
        }
        self
    }

    /// Set the timeout for establishing TCP connections.
    ///
    /// A zero timeout is ignored and the current setting is kept.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.connect_timeout = timeout;
        }
        self
    }

    /// Construct a new `MetricsClient` instance based on current settings.
    pub fn build(self) -> MetricsClient {
        MetricsClient {
            prefix: self.prefix,
            global_tags: self.global_tags,
            sink: self.sink,
            sampler: self.sampler,
            errors: self.errors,
            stats: SocketStats::default(),
            write_timeout: self.write_timeout,
            connect_timeout: self.connect_timeout,
        }
    }
}

impl fmt::Debug for MetricsClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MetricsClientBuilder {{ prefix: {:?}, global_tags: {:?}, sink: ..., sampler: ..., errors: ... }}",
            self.prefix,
            self.global_tags.as_str(),
        )
    }
}

fn formatted_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}.", trimmed)
    }
}

/// Client for a Statsd server.
///
/// The client owns its connection, key prefix, and global tags. A client
/// starts out without a connection: metrics sent before `open` (or after
/// `close`) are discarded without any error, by design of the "fire and
/// forget" nature of metrics. Writing metrics never fails at the call site
/// of the quiet methods like `increment` or `gauge`.
///
/// # Threading
///
/// Changing the connection, prefix, or global tags requires a mutable
/// reference while emitting metrics only needs a shared reference. The
/// client is `Send` and `Sync`, so once configured it can be wrapped in an
/// `Arc` and shared between threads.
///
/// # Example
///
/// ```no_run
/// use statsline::{MetricsClient, Transport, DEFAULT_PORT};
///
/// let mut client = MetricsClient::builder()
///     .with_prefix("my.app")
///     .with_global_tags(["env:production"])
///     .build();
///
/// client.open("metrics.example.com", DEFAULT_PORT, Transport::Udp).unwrap();
///
/// client.increment("requests");
/// client.timing("request.duration", 42);
/// client.gauge("queue.depth", 7);
/// client.set("users.unique", 1234);
///
/// client.close();
/// ```
pub struct MetricsClient {
    prefix: String,
    global_tags: GlobalTags,
    sink: Option<BoxedSink>,
    sampler: BoxedSampler,
    errors: ErrorHandler,
    stats: SocketStats,
    write_timeout: Option<Duration>,
    connect_timeout: Duration,
}

impl MetricsClient {
    /// Create a client with no prefix, no global tags, and no connection.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new builder for customizing a client.
    ///
    /// General defaults:
    ///
    /// * No prefix and no global tags.
    /// * Sampling uses the thread-local RNG.
    /// * Errors from the quiet methods are discarded.
    /// * TCP connections use a one second connect and write timeout.
    pub fn builder() -> MetricsClientBuilder {
        MetricsClientBuilder::new()
    }

    /// Create a client that will use the given prefix for all metrics and
    /// is already connected through the given `MetricSink` implementation.
    ///
    /// # Example
    ///
    /// ```
    /// use statsline::{MetricsClient, NopMetricSink};
    ///
    /// let client = MetricsClient::from_sink("my.stats", NopMetricSink);
    /// assert!(client.is_open());
    /// ```
    pub fn from_sink<T>(prefix: &str, sink: T) -> Self
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        Self::builder().with_prefix(prefix).with_sink(sink).build()
    }

    /// Resolve the host and open a connection to the Statsd server using the
    /// given transport.
    ///
    /// Any connection that is already open is closed first, so calling this
    /// repeatedly never leaks sockets. For UDP the socket is connected to the
    /// server address once so later writes don't have to pass the address.
    /// For TCP a connection is established with the configured timeouts.
    ///
    /// No retries are attempted. If resolving or connecting fails, the error
    /// is returned and the client is left without a connection.
    pub fn open(&mut self, host: &str, port: u16, transport: Transport) -> MetricResult<()> {
        if self.sink.take().is_some() {
            debug!("closed existing statsd connection before reopening");
        }

        let sink: MetricResult<BoxedSink> = match transport {
            Transport::Udp => UdpMetricSink::connect((host, port)).map(|s| Box::new(s) as BoxedSink),
            Transport::Tcp => TcpMetricSink::connect((host, port), self.connect_timeout, self.write_timeout)
                .map(|s| Box::new(s) as BoxedSink),
        };

        match sink {
            Ok(sink) => {
                debug!(host, port, %transport, "opened statsd connection");
                self.sink = Some(sink);
                Ok(())
            }
            Err(e) => {
                debug!(host, port, %transport, error = %e, "failed to open statsd connection");
                Err(e)
            }
        }
    }

    /// Close the connection, if one is open. Calling this when already closed
    /// does nothing.
    pub fn close(&mut self) {
        if let Some(sink) = self.sink.take() {
            if let Err(e) = sink.flush() {
                debug!(error = %e, "failed to flush statsd connection on close");
            }
            debug!("closed statsd connection");
        }
    }

    /// Returns true if a connection is open and metrics will be written.
    ///
    /// A TCP connection stops being open after a failed write, since the
    /// server may have received part of a line. Call `open` again to
    /// reconnect.
    pub fn is_open(&self) -> bool {
        self.sink.as_ref().map_or(false, |sink| sink.is_connected())
    }

    /// Replace the prefix prepended to every metric key. A trailing `.` is
    /// added if the prefix doesn't already end with exactly one. An empty
    /// prefix removes it.
    ///
    /// ```
    /// use statsline::MetricsClient;
    ///
    /// let mut client = MetricsClient::new();
    /// client.set_prefix("app..");
    /// assert_eq!("app.", client.prefix());
    /// ```
    pub fn set_prefix(&mut self, prefix: &str) {
        self.prefix = formatted_prefix(prefix);
    }

    /// Current prefix, including its trailing separator.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Replace the tags added to every metric.
    ///
    /// The previous global tags are discarded entirely, not merged. Tags are
    /// joined once here rather than on every metric. Global tags are written
    /// after any per-call tags.
    ///
    /// ```
    /// use statsline::MetricsClient;
    ///
    /// let mut client = MetricsClient::new();
    /// client.set_global_tags(["env:prod", "az:b"]);
    /// client.set_global_tags(["env:dev"]);
    /// assert_eq!("|#env:dev", client.global_tags());
    /// ```
    pub fn set_global_tags<I, T>(&mut self, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.global_tags = GlobalTags::new(tags);
    }

    /// Global tags as written on the wire, starting with `|#`, or an empty
    /// string if there are none.
    pub fn global_tags(&self) -> &str {
        self.global_tags.as_str()
    }

    /// Counts of metrics written and dropped by this client.
    pub fn stats(&self) -> SinkStats {
        (&self.stats).into()
    }

    /// Flush the connection, if one is open.
    ///
    /// The UDP and TCP connections write every metric immediately, so this
    /// only matters for custom sinks given to `with_sink` that buffer.
    pub fn flush(&self) -> MetricResult<()> {
        match self.sink {
            Some(ref sink) => Ok(sink.flush()?),
            None => Ok(()),
        }
    }

    /// Build the exact line that would be written for a metric, without
    /// sampling or sending it.
    ///
    /// The line has the form
    /// `<prefix><key>:<sign><value>|<unit>[|@<rate>][|#<tags>]`. The key is
    /// normalized, the sample rate is only included below 1.0, and per-call
    /// tags are written before the client's global tags.
    ///
    /// # Example
    ///
    /// ```
    /// use statsline::{MetricType, MetricsClient};
    ///
    /// let mut client = MetricsClient::new();
    /// client.set_prefix("app");
    /// client.set_global_tags(["env:prod"]);
    ///
    /// let line = client.prepare("errors", 1, &["region:us"], 1.0, MetricType::Counter, None);
    /// assert_eq!("app.errors:1|c|#region:us,env:prod", line);
    /// ```
    pub fn prepare(
        &self,
        key: &str,
        value: i64,
        tags: &[&str],
        sample_rate: f32,
        unit: MetricType,
        sign: Option<Sign>,
    ) -> String {
        self.formatter(key, value, sign, unit, sample_rate, tags).format()
    }

    /// Send a timing in milliseconds.
    pub fn timing(&self, key: &str, ms: i64) {
        self.timing_with_tags(key, ms).send()
    }

    /// Build a timing in milliseconds with tags or a sample rate.
    pub fn timing_with_tags<'a>(&'a self, key: &'a str, ms: i64) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(self, key, ms, None, MetricType::Timer)
    }

    /// Run the closure and send how long it took as a timing, returning
    /// whatever the closure returns.
    ///
    /// ```
    /// use statsline::{MetricsClient, SpyMetricSink};
    ///
    /// let (rx, sink) = SpyMetricSink::new();
    /// let client = MetricsClient::from_sink("", sink);
    ///
    /// let answer = client.time("compute", || 6 * 7);
    ///
    /// assert_eq!(42, answer);
    /// assert!(rx.recv().unwrap().starts_with("compute:"));
    /// ```
    pub fn time<F, R>(&self, key: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let out = f();
        let ms = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.timing(key, ms);
        out
    }

    /// Increment a counter by one.
    pub fn increment(&self, key: &str) {
        self.increment_with_tags(key).send()
    }

    /// Build an increment by one with tags or a sample rate.
    pub fn increment_with_tags<'a>(&'a self, key: &'a str) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(self, key, 1, None, MetricType::Counter)
    }

    /// Decrement a counter by one.
    pub fn decrement(&self, key: &str) {
        self.decrement_with_tags(key).send()
    }

    /// Build a decrement by one with tags or a sample rate.
    pub fn decrement_with_tags<'a>(&'a self, key: &'a str) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(self, key, 1, Some(Sign::Minus), MetricType::Counter)
    }

    /// Change a counter by an arbitrary, possibly negative, amount.
    pub fn count(&self, key: &str, value: i64) {
        self.count_with_tags(key, value).send()
    }

    /// Build a counter change with tags or a sample rate.
    pub fn count_with_tags<'a>(&'a self, key: &'a str, value: i64) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(self, key, value, None, MetricType::Counter)
    }

    /// Set a gauge to an absolute value.
    pub fn gauge(&self, key: &str, value: i64) {
        self.gauge_with_tags(key, value).send()
    }

    /// Build an absolute gauge value with tags or a sample rate.
    pub fn gauge_with_tags<'a>(&'a self, key: &'a str, value: i64) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(self, key, value, None, MetricType::Gauge)
    }

    /// Raise a gauge by `value`, written as `+value`.
    pub fn gauge_inc_by(&self, key: &str, value: i64) {
        self.gauge_inc_by_with_tags(key, value).send()
    }

    /// Build a gauge increase with tags or a sample rate.
    pub fn gauge_inc_by_with_tags<'a>(&'a self, key: &'a str, value: i64) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(self, key, value, Some(Sign::Plus), MetricType::Gauge)
    }

    /// Lower a gauge by `value`, written as `-value`.
    pub fn gauge_dec_by(&self, key: &str, value: i64) {
        self.gauge_dec_by_with_tags(key, value).send()
    }

    /// Build a gauge decrease with tags or a sample rate.
    pub fn gauge_dec_by_with_tags<'a>(&'a self, key: &'a str, value: i64) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(self, key, value, Some(Sign::Minus), MetricType::Gauge)
    }

    /// Record an occurrence of a unique value in a set.
    pub fn set(&self, key: &str, value: i64) {
        self.set_with_tags(key, value).send()
    }

    /// Build a set value with tags or a sample rate.
    pub fn set_with_tags<'a>(&'a self, key: &'a str, value: i64) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(self, key, value, None, MetricType::Set)
    }

    pub(crate) fn formatter<'a>(
        &'a self,
        key: &'a str,
        value: i64,
        sign: Option<Sign>,
        type_: MetricType,
        sample_rate: f32,
        tags: &'a [&'a str],
    ) -> MetricFormatter<'a> {
        MetricFormatter::new(&self.prefix, key, value, sign, type_, sample_rate, tags, &self.global_tags)
    }

    // Shared send path: sample, then format and write with a single call to the sink
    pub(crate) fn emit(&self, sample_rate: f32, formatter: &MetricFormatter<'_>) -> MetricResult<Emission> {
        if !self.sampler.should_send(sample_rate) {
            return Ok(Emission::Sampled);
        }

        let sink = match self.sink {
            Some(ref sink) if sink.is_connected() => sink,
            _ => {
                let line = formatter.format();
                trace!(metric = %line, "no open statsd connection, discarding metric");
                self.stats.incr_dropped(line.len() as u64);
                return Ok(Emission::Closed);
            }
        };

        let line = formatter.format();
        self.stats.update(sink.emit(&line), line.len())?;
        Ok(Emission::Written(line))
    }

    pub(crate) fn consume_error(&self, err: MetricError) {
        debug!(error = %err, "failed to send metric");
        (self.errors)(err);
    }
}

impl Default for MetricsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MetricsClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for MetricsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MetricsClient {{ prefix: {:?}, global_tags: {:?}, open: {}, sink: ..., sampler: ..., errors: ... }}",
            self.prefix,
            self.global_tags.as_str(),
            self.is_open(),
        )
    }
}

#[allow(clippy::needless_pass_by_value)]
fn nop_error_handler(_err: MetricError) {
    // nothing
}
