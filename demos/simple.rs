// Statsline - A small Statsd client for Rust
//
// To the extent possible under law, the author(s) have dedicated all copyright and
// related and neighboring rights to this file to the public domain worldwide.
// This software is distributed without any warranty.
//
// You should have received a copy of the CC0 Public Domain Dedication along with this
// software. If not, see <http://creativecommons.org/publicdomain/zero/1.0/>.

// This example opens a UDP connection to a local Statsd server and sends
// one of each kind of metric. Nothing needs to be listening: UDP writes to
// a closed port are simply lost.

use statsline::{MetricError, MetricsClient, Transport, DEFAULT_PORT};

fn main() {
    let mut metrics = MetricsClient::builder()
        .with_prefix("example.prefix")
        .with_global_tags(["env:demo"])
        .with_error_handler(|e: MetricError| eprintln!("metric error: {}", e))
        .build();

    if let Err(e) = metrics.open("localhost", DEFAULT_PORT, Transport::Udp) {
        eprintln!("unable to open connection: {}", e);
        return;
    }

    metrics.increment("example.counter");
    metrics.count("example.counter", 5);
    metrics.gauge("example.gauge", 5);
    metrics.gauge_inc_by("example.gauge", 2);
    metrics.timing("example.timer", 32);
    metrics.set("example.set", 42);

    let sum: u64 = metrics.time("example.sum", || (0..1_000u64).sum());
    metrics
        .count_with_tags("example.sum.result", sum as i64)
        .with_tag("kind:demo")
        .with_sample_rate(0.5)
        .send();

    metrics.close();
}
