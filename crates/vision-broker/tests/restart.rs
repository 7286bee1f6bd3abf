//! Restarting the broker process while a worker stays up.
//!
//! The broker runs as its real binary so that killing it closes every
//! connection the way a crash would.  The worker side is a [`RepChannel`]
//! answering each request with its first frame.

use std::net::TcpListener as StdListener;
use std::process::Stdio;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use vision_worker::application::RequestChannel;
use vision_worker::infrastructure::RepChannel;

const TEST_TIMEOUT: Duration = Duration::from_secs(15);

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Two ports that were free a moment ago.
fn free_ports() -> (u16, u16) {
    let a = StdListener::bind("127.0.0.1:0").expect("bind a");
    let b = StdListener::bind("127.0.0.1:0").expect("bind b");
    (
        a.local_addr().expect("addr a").port(),
        b.local_addr().expect("addr b").port(),
    )
}

async fn wait_until_listening(port: u16) {
    timeout(TEST_TIMEOUT, async {
        while TcpStream::connect(("127.0.0.1", port)).await.is_err() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("broker must start listening");
}

async fn launch_broker(port_in: u16, port_out: u16) -> Child {
    let child = Command::new(env!("CARGO_BIN_EXE_vision-broker"))
        .args(["--port-in", &port_in.to_string()])
        .args(["--port-out", &port_out.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("broker binary must start");
    wait_until_listening(port_in).await;
    wait_until_listening(port_out).await;
    child
}

/// A worker that echoes the first frame of every request.
fn spawn_echo_worker(mut channel: RepChannel) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match channel.recv_request().await {
                Ok(frames) => {
                    let first = frames.into_iter().next().unwrap_or_default();
                    let _ = channel.send_reply(first).await;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
}

/// Sends `payload` from a fresh client and returns the reply's first frame.
async fn round_trip(port_in: u16, payload: &'static [u8]) -> Bytes {
    let mut client = ReqSocket::new();
    client
        .connect(&format!("tcp://127.0.0.1:{port_in}"))
        .await
        .expect("client must connect");
    client
        .send(ZmqMessage::from(payload.to_vec()))
        .await
        .expect("send must succeed");
    let reply = timeout(TEST_TIMEOUT, client.recv())
        .await
        .expect("reply must arrive")
        .expect("recv must succeed");
    reply.get(0).cloned().unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_worker_serves_again_after_broker_restart() {
    // Arrange: a broker process and one worker that survives it
    let (port_in, port_out) = free_ports();
    let mut broker = launch_broker(port_in, port_out).await;
    let channel = RepChannel::connect(&format!("tcp://127.0.0.1:{port_out}"))
        .await
        .expect("worker must connect")
        .with_reconnect_interval(Duration::from_millis(100));
    let worker = spawn_echo_worker(channel);
    assert_eq!(round_trip(port_in, b"before").await, Bytes::from_static(b"before"));

    // Act: kill the broker and bring a new one up on the same ports
    broker.kill().await.expect("broker must stop");
    tokio::time::sleep(Duration::from_millis(300)).await;
    let _broker = launch_broker(port_in, port_out).await;

    // Assert: the same worker answers through the new broker
    assert_eq!(round_trip(port_in, b"after").await, Bytes::from_static(b"after"));
    assert!(!worker.is_finished());
    worker.abort();
}
