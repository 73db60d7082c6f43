//! tests/common/harness.rs
//!
//! A small test harness for spawning real `gossip_node::App` instances on
//! loopback and driving them through the control channel (spec.md §4.6),
//! the same way a cluster-of-processes run would, but in-process so tests
//! stay fast and deterministic.

use gossip_node::neighbors::GossipRandom;
use gossip_node::store::OriginId;
use gossip_node::{App, Cli, NodeConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

/// Deterministic randomness for integration tests: always picks the first
/// remaining candidate and, on the convergence coin flip (spec.md §4.4),
/// always relays instead of hushing. This lets multi-hop propagation tests
/// complete without waiting on the 5-second periodic anti-entropy tick
/// (spec.md §9: "tests should allow the source to be injected").
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRelay;

impl GossipRandom for AlwaysRelay {
    fn pick(&self, candidates: &[OriginId]) -> Option<OriginId> {
        candidates.first().copied()
    }

    fn flip_coin(&self) -> bool {
        false
    }
}

/// The opposite bias: always hushes on alignment. Used to pin down
/// scenario 5's "no further chatter once aligned" half of the behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysHush;

impl GossipRandom for AlwaysHush {
    fn pick(&self, candidates: &[OriginId]) -> Option<OriginId> {
        candidates.first().copied()
    }

    fn flip_coin(&self) -> bool {
        true
    }
}

/// A handle to a node spawned in-process for a test. Dropping it does not
/// stop the node — call [`TestNode::shutdown`] for an orderly `crash`-style
/// teardown, same contract as the real control command.
pub struct TestNode {
    pub control_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl TestNode {
    /// Spawns a node with exactly the three positional arguments spec.md
    /// §6 defines, using `random` for neighbor selection and the
    /// convergence coin flip.
    pub async fn spawn(index: u16, n: u16, tcp_port: u16, random: Box<dyn GossipRandom>) -> Self {
        let config = NodeConfig::from_cli(Cli { index, n, tcp_port });
        let app = App::with_random(config.clone(), random);
        let shutdown = app.shutdown_handle();
        tokio::spawn(app.run());

        let control_addr = config.control_addr;
        // Wait for the control listener to come up before handing the
        // node back to the test.
        drop(connect_with_retry(control_addr).await);
        Self { control_addr, shutdown }
    }

    /// Requests an orderly shutdown the same way the `crash` command does,
    /// without needing a control connection (spec.md §4.7).
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn open_connection(&self) -> TcpStream {
        connect_with_retry(self.control_addr).await
    }

    /// Sends `msg <id> <text>` (spec.md §4.6). The id token is consumed
    /// but otherwise ignored by the node.
    pub async fn submit_message(&self, id: &str, text: &str) {
        let mut stream = self.open_connection().await;
        stream
            .write_all(format!("msg {id} {text}\n").as_bytes())
            .await
            .expect("write msg command");
    }

    /// Sends `get chatLog` and parses the single-line reply into the list
    /// of stored message texts (empty for the `<Empty>` sentinel).
    pub async fn chat_log(&self) -> Vec<String> {
        let mut stream = self.open_connection().await;
        stream.write_all(b"get chatLog\n").await.expect("write get chatLog");

        let mut buf = vec![0u8; 8192];
        let n = stream.read(&mut buf).await.expect("read chatLog reply");
        let line = String::from_utf8_lossy(&buf[..n]);
        let body = line
            .trim_end_matches('\n')
            .strip_prefix("chatLog ")
            .unwrap_or_else(|| panic!("unexpected chatLog reply: {line:?}"));

        if body == "<Empty>" {
            Vec::new()
        } else {
            body.split(',').map(str::to_string).collect()
        }
    }

    /// Sends `crash`, closing the connection and stopping the node
    /// (spec.md §4.6/§4.7, scenario 6).
    pub async fn crash(&self) {
        let mut stream = self.open_connection().await;
        stream.write_all(b"crash\n").await.expect("write crash command");
    }
}

async fn connect_with_retry(addr: SocketAddr) -> TcpStream {
    for _ in 0..200 {
        if let Ok(stream) = TcpStream::connect(addr).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(15)).await;
    }
    panic!("timed out connecting to control channel at {addr}");
}

/// Polls `node.chat_log()` until `predicate` passes, or panics after
/// `timeout`. Used for the eventual-consistency assertions (P4, scenario
/// 1) where propagation completes asynchronously.
pub async fn wait_for_chat_log<F>(node: &TestNode, timeout: Duration, mut predicate: F) -> Vec<String>
where
    F: FnMut(&[String]) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let log = node.chat_log().await;
        if predicate(&log) {
            return log;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for chat log condition; last seen: {log:?}");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// A grace period to let the OS release a node's bound ports after
/// `shutdown()` before the next serialized test tries to reuse them.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}

/// Serializes integration tests in this binary. Every node in this crate
/// binds a gossip port derived deterministically from its index
/// (`ROOT_ID + index`, spec.md §2), so two tests using overlapping index
/// ranges would race for the same UDP port if run concurrently. Each test
/// acquires this lock for its duration instead of needing disjoint index
/// ranges everywhere.
pub static TEST_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());
