//! tests/integration/topology.rs
//!
//! Boundary behaviors tied to the linear-chain topology (spec.md §8, B1/B2):
//! a single-node cluster emits no gossip traffic at all, and a chain-end
//! node only ever has one neighbor to talk to.

use crate::common::harness::{settle, AlwaysRelay, TestNode, TEST_LOCK};
use std::time::Duration;
use test_log::test;

#[test(tokio::test(flavor = "multi_thread"))]
async fn single_node_cluster_serves_local_messages_without_gossip() {
    let _guard = TEST_LOCK.lock().await;

    // B1: N = 1. neighbors() is empty, so no datagram is ever sent, but
    // local submission and chatLog still behave correctly.
    let node = TestNode::spawn(0, 1, 53100, Box::new(AlwaysRelay)).await;

    assert_eq!(node.chat_log().await, Vec::<String>::new());

    node.submit_message("1", "only message").await;

    let log = crate::common::harness::wait_for_chat_log(&node, Duration::from_secs(2), |log| !log.is_empty()).await;
    assert_eq!(log, vec!["only message".to_string()]);

    node.shutdown();
    settle().await;
}

#[test(tokio::test(flavor = "multi_thread"))]
async fn chain_end_node_reaches_its_single_neighbor() {
    let _guard = TEST_LOCK.lock().await;

    // B2: a 2-node chain. Node 0 has only node 1 as a neighbor, so a local
    // message submitted at node 0 can only ever reach node 1 directly.
    let node0 = TestNode::spawn(0, 2, 53101, Box::new(AlwaysRelay)).await;
    let node1 = TestNode::spawn(1, 2, 53102, Box::new(AlwaysRelay)).await;

    node0.submit_message("1", "edge of the chain").await;

    let log = crate::common::harness::wait_for_chat_log(&node1, Duration::from_secs(2), |log| !log.is_empty()).await;
    assert_eq!(log, vec!["edge of the chain".to_string()]);

    node0.shutdown();
    node1.shutdown();
    settle().await;
}
