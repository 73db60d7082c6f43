//! src/anti_entropy.rs
//!
//! The periodic anti-entropy tick (C5): every `ANTI_ENTROPY_INTERVAL_SECS`
//! this node broadcasts its current status vector to every neighbor,
//! independent of whatever rumor- or status-driven exchanges are already
//! in flight. This is what keeps a quiet cluster converging even after
//! the initial burst of gossip dies down.

use crate::config::ANTI_ENTROPY_INTERVAL_SECS;
use crate::engine::GossipCore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs until `shutdown` fires. The first tick is skipped — a freshly
/// started node has nothing worth broadcasting yet, and the integration
/// tests would otherwise race the first tick against setup.
pub async fn run(core: Arc<GossipCore>, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_secs(ANTI_ENTROPY_INTERVAL_SECS));
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracing::trace!("anti-entropy tick");
                core.broadcast_status().await;
            }
            _ = shutdown.cancelled() => {
                tracing::debug!("anti-entropy loop shutting down");
                break;
            }
        }
    }
}
