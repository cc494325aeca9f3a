use statsline::{Emission, ErrorKind, MetricsClient, Transport};
use std::io::{BufRead, BufReader, Read};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

mod utils;
use utils::{run_arc_threaded_test, METRICS_PER_ITERATION};

const TIMEOUT: Duration = Duration::from_secs(5);

// Accept one connection and collect every line written to it until the
// client hangs up.
fn spawn_server() -> (u16, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (conn, _) = listener.accept().unwrap();
        conn.set_read_timeout(Some(TIMEOUT)).unwrap();
        BufReader::new(conn).lines().map(|l| l.unwrap()).collect()
    });

    (port, handle)
}

#[test]
fn test_metrics_client_tcp_newline_delimited() {
    let (port, server) = spawn_server();
    let mut client = MetricsClient::builder().with_prefix("statsline").build();
    client.open("127.0.0.1", port, Transport::Tcp).unwrap();

    client.increment("requests");
    client.timing_with_tags("latency", 40).with_tag("route:home").send();
    client.gauge_dec_by("pool", 2);
    client.close();

    let lines = server.join().unwrap();
    assert_eq!(
        vec!["statsline.requests:1|c", "statsline.latency:40|ms|#route:home", "statsline.pool:-2|g"],
        lines
    );
}

#[test]
fn test_metrics_client_tcp_threaded() {
    let (port, server) = spawn_server();
    let mut client = MetricsClient::new();
    client.open("127.0.0.1", port, Transport::Tcp).unwrap();

    let client = run_arc_threaded_test(client, 4, 10);
    let expected = 4 * 10 * METRICS_PER_ITERATION;
    assert_eq!(expected, client.stats().packets_sent);

    // Dropping the last reference closes the connection
    drop(client);

    let lines = server.join().unwrap();
    assert_eq!(expected as usize, lines.len());
    assert!(lines.iter().all(|l| l.starts_with("some.") && !l.contains('\n')));
}

#[test]
fn test_metrics_client_tcp_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut client = MetricsClient::builder().with_connect_timeout(TIMEOUT).build();
    let err = client.open("127.0.0.1", port, Transport::Tcp).unwrap_err();

    assert_eq!(ErrorKind::IoError, err.kind());
    assert!(!client.is_open());
}

#[test]
fn test_metrics_client_tcp_write_error_reaches_handler() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let errors = Arc::new(AtomicUsize::new(0));
    let errors_ref = Arc::clone(&errors);

    let mut client = MetricsClient::builder()
        .with_error_handler(move |_| {
            errors_ref.fetch_add(1, Ordering::Relaxed);
        })
        .build();
    client.open("127.0.0.1", port, Transport::Tcp).unwrap();

    let (conn, _) = listener.accept().unwrap();
    drop(conn);
    drop(listener);

    // The first writes after the peer hangs up may still succeed, keep
    // writing until the reset is noticed.
    for _ in 0..1_000 {
        client.increment("some.counter");
        if errors.load(Ordering::Relaxed) > 0 {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }

    assert!(errors.load(Ordering::Relaxed) > 0);
    assert!(client.stats().packets_dropped > 0);
}

#[test]
fn test_metrics_client_tcp_stalled_peer_times_out_and_disconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let errors = Arc::new(AtomicUsize::new(0));
    let errors_ref = Arc::clone(&errors);

    let mut client = MetricsClient::builder()
        .with_write_timeout(Some(Duration::from_millis(200)))
        .with_error_handler(move |_| {
            errors_ref.fetch_add(1, Ordering::Relaxed);
        })
        .build();
    client.open("127.0.0.1", port, Transport::Tcp).unwrap();

    // Accept without reading until the client gives up
    let (conn, _) = listener.accept().unwrap();

    let key = "a".repeat(32 * 1024 * 1024);
    let start = Instant::now();
    let err = client.count_with_tags(&key, 1).try_send().unwrap_err();

    assert_eq!(ErrorKind::IoError, err.kind());
    assert!(start.elapsed() < TIMEOUT, "write took {:?}", start.elapsed());
    assert!(!client.is_open());

    // Nothing may follow the partial line left on the stream
    assert_eq!(Emission::Closed, client.count_with_tags("next", 1).try_send().unwrap());
    client.count("next", 1);
    assert_eq!(0, errors.load(Ordering::Relaxed));

    conn.set_read_timeout(Some(TIMEOUT)).unwrap();
    let mut received = Vec::new();
    BufReader::new(conn).read_to_end(&mut received).unwrap();

    assert!(!received.ends_with(b"\n"));
    assert!(!received.windows(4).any(|w| w == b"next"));

    let stats = client.stats();
    assert_eq!(0, stats.packets_sent);
    assert_eq!(3, stats.packets_dropped);

    // Reopening gives a fresh, usable connection
    let (port, server) = spawn_server();
    client.open("127.0.0.1", port, Transport::Tcp).unwrap();
    client.count("next", 1);
    client.close();

    assert_eq!(vec!["next:1|c"], server.join().unwrap());
}
