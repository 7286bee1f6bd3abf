//! Integration tests for the ROUTER/DEALER forwarder.
//!
//! Each test binds a real broker on loopback with OS-assigned ports, attaches
//! plain ZeroMQ REQ clients and REP workers to it, and checks what comes out
//! the other side.  The workers here are simple echo loops: the broker does
//! not care what the payload means, so neither do these tests.

use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Duration;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_test::assert_ok;
use zeromq::{DealerSocket, RepSocket, ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use vision_broker::infrastructure::{Broker, BrokerConfig, BrokerError};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Time for freshly connected peers to finish their handshake with the
/// broker before traffic starts.
const SETTLE: Duration = Duration::from_millis(200);

// ── Helpers ───────────────────────────────────────────────────────────────────

type BrokerTask = JoinHandle<Result<Infallible, BrokerError>>;

/// Starts a broker and returns `(frontend_port, backend_port, task)`.
async fn spawn_broker() -> (u16, u16, BrokerTask) {
    let config = BrokerConfig {
        bind_host: "127.0.0.1".to_string(),
        frontend_port: 0,
        backend_port: 0,
    };
    let broker = Broker::bind(&config).await.expect("broker must bind");
    let frontend = broker.frontend_port().expect("tcp frontend");
    let backend = broker.backend_port().expect("tcp backend");
    (frontend, backend, tokio::spawn(broker.run()))
}

async fn start_broker() -> (u16, u16) {
    let (frontend, backend, _task) = spawn_broker().await;
    (frontend, backend)
}

/// A REP worker that answers every request with its own frames followed by
/// a frame naming the worker.
async fn spawn_echo_worker(backend_port: u16, name: &'static str) -> JoinHandle<()> {
    let mut socket = RepSocket::new();
    socket
        .connect(&format!("tcp://127.0.0.1:{backend_port}"))
        .await
        .expect("worker must connect");

    tokio::spawn(async move {
        while let Ok(request) = socket.recv().await {
            let mut reply = request.clone();
            reply.push_back(Bytes::from_static(name.as_bytes()));
            if socket.send(reply).await.is_err() {
                break;
            }
        }
    })
}

async fn connect_client(frontend_port: u16) -> ReqSocket {
    let mut socket = ReqSocket::new();
    socket
        .connect(&format!("tcp://127.0.0.1:{frontend_port}"))
        .await
        .expect("client must connect");
    socket
}

fn frames(message: &ZmqMessage) -> Vec<Vec<u8>> {
    message.iter().map(|frame| frame.to_vec()).collect()
}

fn two_frame_message(first: &[u8], second: &[u8]) -> ZmqMessage {
    let mut message = ZmqMessage::from(first.to_vec());
    message.push_back(Bytes::copy_from_slice(second));
    message
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_broker_relays_multi_frame_request_and_reply_verbatim() {
    // Arrange
    let (frontend, backend) = start_broker().await;
    let _worker = spawn_echo_worker(backend, "w1").await;
    let mut client = connect_client(frontend).await;
    tokio::time::sleep(SETTLE).await;

    // Act
    let request = two_frame_message(&[0u8, 1, 2, 255], b"2_2_1");
    assert_ok!(client.send(request).await);
    let reply = timeout(TEST_TIMEOUT, client.recv())
        .await
        .expect("reply must arrive")
        .expect("recv must succeed");

    // Assert: both request frames survive untouched, plus the worker tag
    assert_eq!(
        frames(&reply),
        vec![vec![0u8, 1, 2, 255], b"2_2_1".to_vec(), b"w1".to_vec()]
    );
}

#[tokio::test]
async fn test_broker_routes_each_reply_to_its_own_client() {
    let (frontend, backend) = start_broker().await;
    let _worker = spawn_echo_worker(backend, "w1").await;
    let mut alice = connect_client(frontend).await;
    let mut bob = connect_client(frontend).await;
    tokio::time::sleep(SETTLE).await;

    assert_ok!(alice.send(two_frame_message(b"alice", b"1_1_1")).await);
    assert_ok!(bob.send(two_frame_message(b"bob", b"1_1_1")).await);

    let bob_reply = timeout(TEST_TIMEOUT, bob.recv()).await.unwrap().unwrap();
    let alice_reply = timeout(TEST_TIMEOUT, alice.recv()).await.unwrap().unwrap();

    assert_eq!(frames(&alice_reply)[0], b"alice".to_vec());
    assert_eq!(frames(&bob_reply)[0], b"bob".to_vec());
}

#[tokio::test]
async fn test_broker_spreads_requests_across_workers_without_loss() {
    // Arrange: two workers, one client issuing requests back to back
    let (frontend, backend) = start_broker().await;
    let _w1 = spawn_echo_worker(backend, "w1").await;
    let _w2 = spawn_echo_worker(backend, "w2").await;
    let mut client = connect_client(frontend).await;
    tokio::time::sleep(SETTLE).await;

    const REQUESTS: usize = 20;
    let mut served_by: HashMap<Vec<u8>, usize> = HashMap::new();

    // Act
    for i in 0..REQUESTS {
        let payload = format!("req-{i}");
        assert_ok!(client.send(two_frame_message(payload.as_bytes(), b"1_1_1")).await);
        let reply = timeout(TEST_TIMEOUT, client.recv()).await.unwrap().unwrap();
        let reply_frames = frames(&reply);

        // Each reply must belong to the request that was just sent.
        assert_eq!(reply_frames[0], payload.as_bytes());
        *served_by.entry(reply_frames[2].clone()).or_default() += 1;
    }

    // Assert: every request answered exactly once, alternating between workers
    assert_eq!(served_by.values().sum::<usize>(), REQUESTS);
    assert_eq!(served_by.len(), 2, "only w1 and w2 exist: {served_by:?}");
    assert_eq!(served_by.get(b"w1".as_slice()), Some(&(REQUESTS / 2)));
    assert_eq!(served_by.get(b"w2".as_slice()), Some(&(REQUESTS / 2)));
}

#[tokio::test]
async fn test_request_sent_before_any_worker_connects_is_delivered() {
    // Arrange: a broker and a client, no worker yet
    let (frontend, backend) = start_broker().await;
    let mut client = connect_client(frontend).await;
    tokio::time::sleep(SETTLE).await;

    // Act: the request goes out first, the worker shows up afterwards
    assert_ok!(client.send(two_frame_message(b"early", b"1_1_1")).await);
    tokio::time::sleep(SETTLE).await;
    let _worker = spawn_echo_worker(backend, "late").await;
    let reply = timeout(TEST_TIMEOUT, client.recv())
        .await
        .expect("held request must be answered once a worker connects")
        .expect("recv must succeed");

    // Assert
    assert_eq!(
        frames(&reply),
        vec![b"early".to_vec(), b"1_1_1".to_vec(), b"late".to_vec()]
    );
}

#[tokio::test]
async fn test_reply_without_routing_envelope_is_dropped_and_broker_keeps_routing() {
    // Arrange: a bare DEALER takes the worker's place on the backend
    let (frontend, backend, broker) = spawn_broker().await;
    let mut dealer = DealerSocket::new();
    dealer
        .connect(&format!("tcp://127.0.0.1:{backend}"))
        .await
        .expect("dealer must connect");
    let mut client = connect_client(frontend).await;
    tokio::time::sleep(SETTLE).await;

    // Act: a single frame, then a reply for an identity nobody holds
    assert_ok!(dealer.send(ZmqMessage::from(b"junk".to_vec())).await);
    assert_ok!(dealer.send(two_frame_message(b"nobody", b"orphan")).await);
    tokio::time::sleep(SETTLE).await;

    // A genuine request still makes the full round trip.
    assert_ok!(client.send(two_frame_message(b"still-here", b"1_1_1")).await);
    let request = timeout(TEST_TIMEOUT, dealer.recv())
        .await
        .expect("request must reach the dealer")
        .expect("recv must succeed");
    assert_ok!(dealer.send(request).await);
    let reply = timeout(TEST_TIMEOUT, client.recv())
        .await
        .expect("reply must arrive")
        .expect("recv must succeed");

    // Assert
    assert!(!broker.is_finished(), "broker task must still be running");
    assert_eq!(frames(&reply), vec![b"still-here".to_vec(), b"1_1_1".to_vec()]);
}

#[tokio::test]
async fn test_bind_fails_when_port_is_taken() {
    let (frontend, _backend) = start_broker().await;
    let config = BrokerConfig {
        bind_host: "127.0.0.1".to_string(),
        frontend_port: frontend,
        backend_port: 0,
    };

    let result = Broker::bind(&config).await;

    assert!(result.is_err(), "second bind on the same port must fail");
}
