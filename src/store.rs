//! src/store.rs
//!
//! The replicated log store (C1). Holds the per-origin message maps and
//! lowest-missing sequence numbers that the rest of the gossip engine
//! reconciles against. This is the single invariant-bearing data structure
//! in the node: every mutation either establishes a fresh, empty log or
//! preserves L1 (density), L2 (advance) and L3 (immutability).

use std::collections::BTreeMap;

/// A node's gossip identity: its UDP port (`ROOT_ID + index`).
pub type OriginId = u16;

/// A non-negative, per-origin, dense-from-zero sequence number.
pub type SeqNum = u32;

/// The result of attempting to insert a message at a given sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

/// A single origin's replicated log.
///
/// `lowest_missing` always points at the first hole in `messages`; entries
/// past it ("gaps filled ahead") may exist without disturbing it.
#[derive(Debug, Clone, Default)]
pub struct OriginLog {
    messages: BTreeMap<SeqNum, String>,
    lowest_missing: SeqNum,
}

impl OriginLog {
    pub fn lowest_missing(&self) -> SeqNum {
        self.lowest_missing
    }

    pub fn get(&self, seq: SeqNum) -> Option<&str> {
        self.messages.get(&seq).map(String::as_str)
    }

    /// Inserts `text` at `seq`. Never overwrites an existing entry (L3).
    /// When the new entry closes the gap at `lowest_missing`, advances it
    /// past the now-contiguous prefix (L2).
    fn insert(&mut self, seq: SeqNum, text: String) -> InsertOutcome {
        if self.messages.contains_key(&seq) {
            return InsertOutcome::Duplicate;
        }
        self.messages.insert(seq, text);
        if seq == self.lowest_missing {
            while self.messages.contains_key(&self.lowest_missing) {
                self.lowest_missing += 1;
            }
        }
        InsertOutcome::Inserted
    }
}

/// The node's full database: one [`OriginLog`] per known origin.
///
/// The self origin's entry always exists, from construction. Peer entries
/// are created lazily the first time the gossip engine observes any
/// reference (rumor or status) to that origin, and are never destroyed
/// except when the node shuts down.
#[derive(Debug)]
pub struct Database {
    self_origin: OriginId,
    logs: BTreeMap<OriginId, OriginLog>,
}

impl Database {
    pub fn new(self_origin: OriginId) -> Self {
        let mut logs = BTreeMap::new();
        logs.insert(self_origin, OriginLog::default());
        Self { self_origin, logs }
    }

    pub fn self_origin(&self) -> OriginId {
        self.self_origin
    }

    pub fn contains_origin(&self, origin: OriginId) -> bool {
        self.logs.contains_key(&origin)
    }

    /// Establishes `origin`'s log if absent, then inserts `(seq, text)`.
    pub fn insert(&mut self, origin: OriginId, seq: SeqNum, text: String) -> InsertOutcome {
        self.logs.entry(origin).or_default().insert(seq, text)
    }

    /// Allocates `seq := selfLog.lowestMissing`, inserts `(seq, text)` into
    /// the self log, and returns `seq`. Because the self log only ever
    /// grows through this path, `lowest_missing` advances by exactly one
    /// per call.
    pub fn append_local(&mut self, text: String) -> SeqNum {
        let log = self.logs.entry(self.self_origin).or_default();
        let seq = log.lowest_missing();
        let outcome = log.insert(seq, text);
        debug_assert_eq!(outcome, InsertOutcome::Inserted);
        seq
    }

    /// Creates an empty log for `origin` if it doesn't exist yet. Returns
    /// `true` if a new (empty) log was created.
    pub fn ensure_origin(&mut self, origin: OriginId) -> bool {
        if self.logs.contains_key(&origin) {
            false
        } else {
            self.logs.insert(origin, OriginLog::default());
            true
        }
    }

    pub fn lowest_missing(&self, origin: OriginId) -> Option<SeqNum> {
        self.logs.get(&origin).map(OriginLog::lowest_missing)
    }

    pub fn get(&self, origin: OriginId, seq: SeqNum) -> Option<&str> {
        self.logs.get(&origin).and_then(|log| log.get(seq))
    }

    /// A consistent snapshot of every origin's `lowest_missing`, self
    /// origin first, the canonical emission order the wire format relies
    /// on (spec.md §4.1).
    pub fn status_vector(&self) -> Vec<(OriginId, SeqNum)> {
        self.status_vector_for(self.self_origin)
    }

    /// A status vector whose first pair is `primary_origin`, followed by
    /// every other known origin in ascending order. Used both for the
    /// periodic self-status broadcast and for the "I am asking about
    /// origin X" replies the reconciliation state machine constructs
    /// (spec.md §4.4). `primary_origin` must already exist in the
    /// database; callers create it first via [`Database::insert`] or
    /// [`Database::ensure_origin`].
    pub fn status_vector_for(&self, primary_origin: OriginId) -> Vec<(OriginId, SeqNum)> {
        let primary_low = self
            .logs
            .get(&primary_origin)
            .map(OriginLog::lowest_missing)
            .unwrap_or(0);
        let mut pairs = Vec::with_capacity(self.logs.len().max(1));
        pairs.push((primary_origin, primary_low));
        for (&origin, log) in &self.logs {
            if origin != primary_origin {
                pairs.push((origin, log.lowest_missing()));
            }
        }
        pairs
    }

    /// Every stored message's text, iterated across all origins and
    /// sequence numbers in the database's native (ascending
    /// `(origin, seq)`) enumeration order.
    pub fn all_messages(&self) -> Vec<&str> {
        self.logs
            .values()
            .flat_map(|log| log.messages.values().map(String::as_str))
            .collect()
    }
}
