//! src/engine.rs
//!
//! The gossip engine (C4): the rumor- and status-message handlers, and the
//! reconciliation state machine that drives convergence. This is the core
//! and hard part of the system (spec.md §1) — everything else in the
//! crate exists to feed events into, or carry datagrams out of,
//! `GossipCore`.
//!
//! `GossipCore` owns the [`Database`] behind a single mutex (spec.md §5:
//! "at most one mutator or consistent reader at a time") and is shared via
//! `Arc` across the control listener, the datagram receive loop, and the
//! periodic anti-entropy tick — the three activities spec.md §2 lists as
//! mutating or reading it.

use crate::config::NodeConfig;
use crate::neighbors::{neighbors, pick_one, GossipRandom};
use crate::protocol::{decode, encode_rumor, encode_status, WireMessage};
use crate::store::{Database, OriginId, SeqNum};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;

pub struct GossipCore {
    config: NodeConfig,
    store: Mutex<Database>,
    socket: Arc<UdpSocket>,
    random: Box<dyn GossipRandom>,
}

/// What the status reconciliation loop (spec.md §4.4) decided to do after
/// comparing against the first mismatching pair. `None` means every pair
/// was aligned.
enum Reconciliation {
    /// Case A/B: request the sender's knowledge of this origin.
    RequestStatus(OriginId),
    /// Case C: push the message the sender is missing.
    PushRumor { origin: OriginId, seq: SeqNum, text: String },
}

impl GossipCore {
    pub fn new(config: NodeConfig, socket: Arc<UdpSocket>, random: Box<dyn GossipRandom>) -> Self {
        let store = Mutex::new(Database::new(config.self_origin()));
        Self { config, store, socket, random }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// C1's `appendLocal`, followed by pushing the new rumor to a
    /// randomly-chosen neighbor (spec.md §4.6, the `msg` command).
    pub async fn append_local(&self, text: String) -> SeqNum {
        let (seq, origin, text) = {
            let mut db = self.store.lock().await;
            let seq = db.append_local(text.clone());
            (seq, db.self_origin(), text)
        };
        if let Some(target) = pick_one(self.config.index, self.config.cluster_size, None, self.random.as_ref()) {
            self.send_rumor(target, origin, seq, &text).await;
        } else {
            tracing::debug!("no neighbor to push local message to");
        }
        seq
    }

    /// Every stored message's text, across all origins, in the database's
    /// native enumeration order (spec.md §4.6, `get chatLog`).
    pub async fn chat_log(&self) -> Vec<String> {
        let db = self.store.lock().await;
        db.all_messages().into_iter().map(String::from).collect()
    }

    /// Decodes and dispatches a single inbound datagram. Malformed input
    /// is logged and dropped (spec.md §7, `MalformedMessage`).
    pub async fn handle_datagram(&self, raw: &str) {
        match decode(raw) {
            Ok(WireMessage::Rumor { sender, origin, seq, text }) => {
                self.handle_rumor(sender, origin, seq, text).await;
            }
            Ok(WireMessage::Status { sender, pairs }) => {
                self.handle_status(sender, pairs).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed gossip datagram");
            }
        }
    }

    /// spec.md §4.4, "Rumor handling". Idempotent: replaying the same
    /// rumor re-runs `insert` (a no-op past the first time, P5) and always
    /// replies with the receiver's progress on that origin.
    async fn handle_rumor(&self, sender: OriginId, origin: OriginId, seq: SeqNum, text: String) {
        let pairs = {
            let mut db = self.store.lock().await;
            let outcome = db.insert(origin, seq, text);
            tracing::debug!(origin, seq, ?outcome, "handled rumor");
            db.status_vector_for(origin)
        };
        self.send_status(sender, &pairs).await;
    }

    /// spec.md §4.4, "Status handling — the reconciliation state machine".
    /// The first mismatching pair decides the reply and the handler
    /// returns immediately (the tie-break rule); if every pair is aligned,
    /// falls through to the hushing coin flip.
    async fn handle_status(&self, sender: OriginId, pairs: Vec<(OriginId, SeqNum)>) {
        let decision = {
            let mut db = self.store.lock().await;
            let mut decision = None;
            for (origin, their_low) in pairs {
                if db.contains_origin(origin) {
                    let my_low = db.lowest_missing(origin).expect("origin known to exist");
                    if my_low < their_low {
                        // Case B: sender knows more about this origin than we do.
                        decision = Some(Reconciliation::RequestStatus(origin));
                        break;
                    } else if my_low > their_low {
                        // Case C: we know more; push the message they're missing.
                        let text = db
                            .get(origin, their_low)
                            .expect("messages below lowest_missing must exist (L1)")
                            .to_string();
                        decision = Some(Reconciliation::PushRumor { origin, seq: their_low, text });
                        break;
                    }
                    // Case D: aligned on this origin, keep scanning.
                } else {
                    // Case A / A': first mention of this origin.
                    db.ensure_origin(origin);
                    if their_low > 0 {
                        decision = Some(Reconciliation::RequestStatus(origin));
                        break;
                    }
                }
            }
            decision
        };

        match decision {
            Some(Reconciliation::RequestStatus(origin)) => {
                let pairs = {
                    let db = self.store.lock().await;
                    db.status_vector_for(origin)
                };
                self.send_status(sender, &pairs).await;
            }
            Some(Reconciliation::PushRumor { origin, seq, text }) => {
                self.send_rumor(sender, origin, seq, &text).await;
            }
            None => self.hush_or_relay(sender).await,
        }
    }

    /// Fully aligned with `sender`: flip a fair coin. With probability ½
    /// stop gossiping; otherwise relay the "we are synced" signal to a
    /// random neighbor other than `sender` (spec.md §4.4, rationale).
    async fn hush_or_relay(&self, sender: OriginId) {
        if self.random.flip_coin() {
            tracing::trace!(sender, "aligned, hushing");
            return;
        }
        let Some(target) = pick_one(self.config.index, self.config.cluster_size, Some(sender), self.random.as_ref()) else {
            return;
        };
        let pairs = {
            let db = self.store.lock().await;
            db.status_vector()
        };
        self.send_status(target, &pairs).await;
    }

    /// The periodic anti-entropy broadcast (C5): a single status message
    /// for the self origin, sent to every neighbor.
    pub async fn broadcast_status(&self) {
        let pairs = {
            let db = self.store.lock().await;
            db.status_vector()
        };
        for target in neighbors(self.config.index, self.config.cluster_size) {
            self.send_status(target, &pairs).await;
        }
    }

    async fn send_rumor(&self, target: OriginId, origin: OriginId, seq: SeqNum, text: &str) {
        let message = encode_rumor(self.config.self_origin(), origin, seq, text);
        self.send_datagram(target, &message).await;
    }

    async fn send_status(&self, target: OriginId, pairs: &[(OriginId, SeqNum)]) {
        let message = encode_status(self.config.self_origin(), pairs);
        self.send_datagram(target, &message).await;
    }

    async fn send_datagram(&self, target: OriginId, message: &str) {
        let addr = self.config.peer_addr(target);
        if let Err(e) = self.socket.send_to(message.as_bytes(), addr).await {
            tracing::warn!(peer = target, error = %e, "failed to send gossip datagram");
        }
    }
}
