// Statsline - A small Statsd client for Rust
//
// Copyright 2026 Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::client::MetricsClient;
use crate::types::{Emission, MetricResult};
use std::fmt::{self, Write};

pub(crate) mod sample_rate;
pub(crate) mod sampler;

use self::sample_rate::SampleRate;

/// Type of metric that knows how to display its wire unit
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MetricType {
    Counter,
    Timer,
    Gauge,
    Set,
}

impl MetricType {
    pub fn unit(&self) -> &'static str {
        match *self {
            MetricType::Counter => "c",
            MetricType::Timer => "ms",
            MetricType::Gauge => "g",
            MetricType::Set => "s",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.unit().fmt(f)
    }
}

/// Explicit sign written directly in front of a metric value.
///
/// Gauges use the sign to tell the server to adjust the current value
/// instead of replacing it.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    fn flip(self) -> Sign {
        match self {
            Sign::Plus => Sign::Minus,
            Sign::Minus => Sign::Plus,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Sign::Plus => "+".fmt(f),
            Sign::Minus => "-".fmt(f),
        }
    }
}

const TAG_PREFIX: &str = "|#";
const KEY_SUBSTITUTE: char = '_';

fn normalize_char(c: char) -> char {
    match c {
        ':' | '|' | '@' | ',' | '/' => KEY_SUBSTITUTE,
        c if c.is_whitespace() => KEY_SUBSTITUTE,
        c => c,
    }
}

/// Replace characters in a metric key that would otherwise be parsed as
/// part of the wire format.
///
/// The protocol delimiters `:`, `|`, `@` and `,` as well as `/` and any
/// whitespace are replaced with `_`. Only keys are normalized, tag values
/// and numeric payloads are written verbatim.
///
/// # Example
///
/// ```
/// use statsline::normalize;
///
/// assert_eq!("api_users_get_200", normalize("api/users get:200"));
/// ```
pub fn normalize(key: &str) -> String {
    key.chars().map(normalize_char).collect()
}

/// Tags added to every metric sent by a client, joined once when they
/// are set.
///
/// When non-empty the joined string always starts with the `|#` delimiter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct GlobalTags {
    joined: String,
}

impl GlobalTags {
    pub(crate) fn new<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut joined = String::new();
        for tag in tags {
            let tag = tag.as_ref();
            if tag.is_empty() {
                continue;
            }

            joined.push_str(if joined.is_empty() { TAG_PREFIX } else { "," });
            joined.push_str(tag);
        }

        GlobalTags { joined }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.joined
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.joined.is_empty()
    }

    // Joined tags without the leading delimiter, for appending after per-call tags
    fn body(&self) -> &str {
        self.joined.get(TAG_PREFIX.len()..).unwrap_or("")
    }
}

/// Single metric event before it's been turned into a line.
#[derive(Debug, Clone)]
pub(crate) struct MetricFormatter<'a> {
    prefix: &'a str,
    key: &'a str,
    value: i64,
    sign: Option<Sign>,
    type_: MetricType,
    sample_rate: SampleRate,
    tags: &'a [&'a str],
    global_tags: &'a GlobalTags,
}

impl<'a> MetricFormatter<'a> {
    // leave room for the longest i64 plus an explicit sign
    const VALUE_SIZE: usize = 21;

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        prefix: &'a str,
        key: &'a str,
        value: i64,
        sign: Option<Sign>,
        type_: MetricType,
        sample_rate: f32,
        tags: &'a [&'a str],
        global_tags: &'a GlobalTags,
    ) -> Self {
        MetricFormatter {
            prefix,
            key,
            value,
            sign,
            type_,
            sample_rate: SampleRate::new(sample_rate),
            tags,
            global_tags,
        }
    }

    fn write_key(&self, out: &mut String) {
        out.push_str(self.prefix);
        out.extend(self.key.chars().map(normalize_char));
    }

    fn write_value(&self, out: &mut String) {
        let _ = match self.sign {
            None => write!(out, "{}", self.value),
            Some(sign) => {
                // a negative adjustment in the opposite direction keeps a single sign on the wire
                let sign = if self.value < 0 { sign.flip() } else { sign };
                write!(out, "{}{}", sign, self.value.unsigned_abs())
            }
        };
    }

    fn write_tags(&self, out: &mut String) {
        if self.tags.is_empty() {
            out.push_str(self.global_tags.as_str());
            return;
        }

        out.push_str(TAG_PREFIX);
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(tag);
        }

        if !self.global_tags.is_empty() {
            out.push(',');
            out.push_str(self.global_tags.body());
        }
    }

    fn tag_size_hint(&self) -> usize {
        let per_call: usize = self.tags.iter().map(|t| t.len() + 1).sum();
        TAG_PREFIX.len() + per_call + self.global_tags.as_str().len()
    }

    #[rustfmt::skip]
    pub(crate) fn format(&self) -> String {
        let size_hint = self.prefix.len() + self.key.len() + 1 /* : */ + Self::VALUE_SIZE
            + 1 /* | */ + 2 /* type */ + self.sample_rate.size_hint() + self.tag_size_hint();

        let mut out = String::with_capacity(size_hint);
        self.write_key(&mut out);
        out.push(':');
        self.write_value(&mut out);
        out.push('|');
        out.push_str(self.type_.unit());
        self.sample_rate.write_to(&mut out);
        self.write_tags(&mut out);
        out
    }
}

/// Builder for adding tags or a sample rate to an in-progress metric.
///
/// Instances are created by the `*_with_tags` methods of `MetricsClient`.
/// Nothing is sampled, formatted, or written until `.send()` or
/// `.try_send()` is called.
///
/// Tags are written after the metric in Datadog style (`|#tag1,tag2`),
/// followed by any global tags configured on the client.
///
/// # Example
///
/// ```
/// use statsline::{MetricsClient, SpyMetricSink};
///
/// let (rx, sink) = SpyMetricSink::new();
/// let client = MetricsClient::from_sink("some.prefix", sink);
///
/// client.count_with_tags("some.key", 4)
///     .with_tag("host:app11.example.com")
///     .with_tag("beta")
///     .send();
///
/// assert_eq!("some.prefix.some.key:4|c|#host:app11.example.com,beta", rx.recv().unwrap());
/// ```
#[must_use = "Did you forget to call .send() after adding tags?"]
#[derive(Debug)]
pub struct MetricBuilder<'m, 'c> {
    client: &'c MetricsClient,
    key: &'m str,
    value: i64,
    sign: Option<Sign>,
    type_: MetricType,
    sample_rate: f32,
    tags: Vec<&'m str>,
}

impl<'m, 'c> MetricBuilder<'m, 'c> {
    pub(crate) fn new(
        client: &'c MetricsClient,
        key: &'m str,
        value: i64,
        sign: Option<Sign>,
        type_: MetricType,
    ) -> Self {
        MetricBuilder {
            client,
            key,
            value,
            sign,
            type_,
            sample_rate: 1.0,
            tags: Vec::new(),
        }
    }

    /// Add a tag to this metric. Tags are usually `key:value` pairs but
    /// value-only tags are allowed as well.
    pub fn with_tag(mut self, tag: &'m str) -> Self {
        self.tags.push(tag);
        self
    }

    /// Add several tags to this metric, in order.
    pub fn with_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = &'m str>,
    {
        self.tags.extend(tags);
        self
    }

    /// Only send this metric `rate` of the time, between 0.0 and 1.0.
    ///
    /// The rate is included in the line when it's below 1.0 so that the
    /// server can scale counts accordingly.
    ///
    /// # Example
    ///
    /// ```
    /// use statsline::{Emission, MetricsClient, NopMetricSink};
    ///
    /// let client = MetricsClient::from_sink("", NopMetricSink);
    /// let res = client.increment_with_tags("hits").with_sample_rate(1.0).try_send();
    ///
    /// assert_eq!(Emission::Written("hits:1|c".to_string()), res.unwrap());
    /// ```
    pub fn with_sample_rate(mut self, rate: f32) -> Self {
        self.sample_rate = rate;
        self
    }

    /// Sample, format, and write this metric, returning what happened.
    ///
    /// Only I/O errors from the open connection are returned as errors. A
    /// metric rejected by sampling or sent without an open connection is an
    /// `Ok` result describing that outcome.
    pub fn try_send(self) -> MetricResult<Emission> {
        let formatter = self.client.formatter(
            self.key,
            self.value,
            self.sign,
            self.type_,
            self.sample_rate,
            &self.tags,
        );
        self.client.emit(self.sample_rate, &formatter)
    }

    /// Sample, format, and write this metric, discarding any error.
    ///
    /// Errors are passed to the error handler of the client, if one was
    /// configured, and counted in the client's stats.
    pub fn send(self) {
        let client = self.client;
        if let Err(e) = self.try_send() {
            client.consume_error(e);
        }
    }
}
