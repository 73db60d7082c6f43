//! src/neighbors.rs
//!
//! The neighbor selector (C3): pure functions over the node's index and
//! cluster size, plus the injectable randomness source the gossip engine
//! (C4) depends on for neighbor choice and the convergence coin flip.
//! Isolating both as a trait lets tests substitute a scripted source, so
//! scenarios 3 and 5 in spec.md §8 are deterministic (spec.md §9).

use crate::store::OriginId;
use rand::Rng;

/// `udpPort = ROOT_ID + index` (spec.md §2).
pub const ROOT_ID: OriginId = 40000;

pub fn gossip_port(index: u16) -> OriginId {
    ROOT_ID + index
}

/// The fixed linear-chain neighbor set for a node at `index` in a cluster
/// of size `n`: `{i-1, i+1} ∩ [0, n)`.
pub fn neighbors(index: u16, n: u16) -> Vec<OriginId> {
    if n <= 1 {
        return Vec::new();
    }
    let port = gossip_port(index);
    let mut out = Vec::with_capacity(2);
    if index > 0 {
        out.push(port - 1);
    }
    if index + 1 < n {
        out.push(port + 1);
    }
    out
}

/// The non-determinism the gossip engine draws on. Implementations must be
/// safe to share across the node's concurrent activities.
pub trait GossipRandom: Send + Sync {
    /// Picks one candidate uniformly at random, or `None` if `candidates`
    /// is empty.
    fn pick(&self, candidates: &[OriginId]) -> Option<OriginId>;

    /// A fair coin flip. `true` means "stop gossiping" (spec.md §4.4).
    fn flip_coin(&self) -> bool;
}

/// The production randomness source, backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRandom;

impl GossipRandom for SystemRandom {
    fn pick(&self, candidates: &[OriginId]) -> Option<OriginId> {
        if candidates.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..candidates.len());
        Some(candidates[idx])
    }

    fn flip_coin(&self) -> bool {
        rand::thread_rng().gen_bool(0.5)
    }
}

/// Removes `exclude` (if present) from `neighbors(index, n)`, then
/// delegates the final choice to `random`.
pub fn pick_one(index: u16, n: u16, exclude: Option<OriginId>, random: &dyn GossipRandom) -> Option<OriginId> {
    let candidates: Vec<OriginId> = neighbors(index, n)
        .into_iter()
        .filter(|&p| Some(p) != exclude)
        .collect();
    random.pick(&candidates)
}
