use statsline::{Emission, MetricsClient, Transport};
use std::net::UdpSocket;
use std::str;
use std::time::Duration;

mod utils;
use utils::{run_arc_threaded_test, METRICS_PER_ITERATION};

fn new_server() -> (UdpSocket, u16) {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    server.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let port = server.local_addr().unwrap().port();
    (server, port)
}

fn recv_line(server: &UdpSocket) -> String {
    let mut buf = [0u8; 1024];
    let n = server.recv(&mut buf).unwrap();
    str::from_utf8(&buf[..n]).unwrap().to_string()
}

#[test]
fn test_metrics_client_udp_one_datagram_per_metric() {
    let (server, port) = new_server();
    let mut client = MetricsClient::new();
    client.set_prefix("statsline");
    client.open("127.0.0.1", port, Transport::Udp).unwrap();

    client.increment("requests");
    client.gauge_inc_by("queue.depth", 3);
    client.set_with_tags("users", 7).with_tag("env:test").send();

    assert_eq!("statsline.requests:1|c", recv_line(&server));
    assert_eq!("statsline.queue.depth:+3|g", recv_line(&server));
    assert_eq!("statsline.users:7|s|#env:test", recv_line(&server));
}

#[test]
fn test_metrics_client_udp_try_send_written() {
    let (server, port) = new_server();
    let mut client = MetricsClient::new();
    client.open("127.0.0.1", port, Transport::Udp).unwrap();

    let res = client.timing_with_tags("latency", 12).try_send().unwrap();
    assert_eq!(Emission::Written("latency:12|ms".to_string()), res);
    assert_eq!("latency:12|ms", recv_line(&server));
}

#[test]
fn test_metrics_client_udp_threaded() {
    let (server, port) = new_server();
    let mut client = MetricsClient::new();
    client.open("127.0.0.1", port, Transport::Udp).unwrap();

    let client = run_arc_threaded_test(client, 2, 5);
    let expected = 2 * 5 * METRICS_PER_ITERATION;

    for _ in 0..expected {
        let line = recv_line(&server);
        assert!(line.starts_with("some."), "unexpected line: {}", line);
    }
    assert_eq!(expected, client.stats().packets_sent);
}

#[test]
fn test_metrics_client_udp_close_and_reopen() {
    let (server, port) = new_server();
    let mut client = MetricsClient::new();
    client.open("127.0.0.1", port, Transport::Udp).unwrap();

    client.count("first", 1);
    client.close();
    client.count("dropped", 1);
    client.open("127.0.0.1", port, Transport::Udp).unwrap();
    client.count("second", 1);

    assert_eq!("first:1|c", recv_line(&server));
    assert_eq!("second:1|c", recv_line(&server));

    let stats = client.stats();
    assert_eq!(2, stats.packets_sent);
    assert_eq!(1, stats.packets_dropped);
}
