use statsline::MetricsClient;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[allow(dead_code)]
pub const NUM_THREADS: u64 = 10;
#[allow(dead_code)]
pub const NUM_ITERATIONS: u64 = 1_000;

// Number of metrics each iteration of the threaded test emits
#[allow(dead_code)]
pub const METRICS_PER_ITERATION: u64 = 8;

#[allow(dead_code)]
pub fn run_arc_threaded_test(client: MetricsClient, num_threads: u64, iterations: u64) -> Arc<MetricsClient> {
    let shared_client = Arc::new(client);

    let threads: Vec<_> = (0..num_threads)
        .map(|_| {
            let local_client = Arc::clone(&shared_client);

            thread::spawn(move || {
                for i in 0..iterations {
                    let v = i as i64;
                    local_client.count("some.counter", v);
                    local_client.increment("some.counter");
                    local_client.decrement("some.counter");
                    local_client.timing("some.timer", v);
                    local_client.gauge("some.gauge", v);
                    local_client.gauge_inc_by("some.gauge", v);
                    local_client.gauge_dec_by("some.gauge", v);
                    local_client.set("some.set", v);
                    thread::sleep(Duration::from_micros(100));
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }

    shared_client
}
