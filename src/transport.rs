//! src/transport.rs
//!
//! The UDP gossip socket: binding and the inbound datagram loop. Kept
//! separate from [`crate::engine`] so the engine stays testable without a
//! live socket — this module only ever calls into it through
//! `GossipCore::handle_datagram`.

use crate::engine::GossipCore;
use crate::error::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

pub async fn bind(addr: SocketAddr) -> Result<Arc<UdpSocket>> {
    let socket = UdpSocket::bind(addr).await?;
    Ok(Arc::new(socket))
}

/// Reads datagrams off `socket` until `shutdown` fires. Non-UTF-8 payloads
/// are dropped with a warning rather than handed to the codec — the wire
/// format is text-only by construction.
pub async fn recv_loop(socket: Arc<UdpSocket>, core: Arc<GossipCore>, shutdown: CancellationToken) {
    let mut buf = vec![0u8; crate::protocol::MAX_DATAGRAM_SIZE * 4];
    loop {
        tokio::select! {
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, peer)) => match std::str::from_utf8(&buf[..len]) {
                        Ok(text) => core.handle_datagram(text).await,
                        Err(_) => tracing::warn!(%peer, "dropping non-utf8 gossip datagram"),
                    },
                    Err(e) => tracing::warn!(error = %e, "gossip socket recv failed"),
                }
            }
            _ = shutdown.cancelled() => {
                tracing::debug!("gossip receive loop shutting down");
                break;
            }
        }
    }
}
