//! tests/integration/shutdown.rs
//!
//! Scenario 6 (spec.md §8): a `crash` command over the control stream
//! brings the node down within a bounded time, and shutdown is orderly —
//! the control listener stops accepting new connections.

use crate::common::harness::{AlwaysRelay, TestNode, TEST_LOCK};
use std::time::Duration;
use test_log::test;
use tokio::net::TcpStream;

#[test(tokio::test(flavor = "multi_thread"))]
async fn crash_command_stops_the_node() {
    let _guard = TEST_LOCK.lock().await;

    let node = TestNode::spawn(0, 1, 53150, Box::new(AlwaysRelay)).await;
    node.submit_message("1", "before crash").await;

    node.crash().await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if TcpStream::connect(node.control_addr).await.is_err() {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("control listener still accepting connections after crash");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
