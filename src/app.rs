//! src/app.rs
//!
//! Defines the main `App` struct, which encapsulates the node's
//! configuration and manages the lifecycle of its three concurrent
//! services: the control listener, the gossip receive loop, and the
//! anti-entropy ticker.

use crate::config::NodeConfig;
use crate::engine::GossipCore;
use crate::error::Result;
use crate::neighbors::{GossipRandom, SystemRandom};
use crate::{anti_entropy, control, transport};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Encapsulates the entire node: its configuration and the lifecycle
/// management of its concurrent services.
pub struct App {
    config: NodeConfig,
    random: Box<dyn GossipRandom>,
    shutdown_token: CancellationToken,
}

impl App {
    /// Creates a new `App` with the production randomness source.
    pub fn new(config: NodeConfig) -> Self {
        Self::with_random(config, Box::new(SystemRandom))
    }

    /// Creates a new `App` with an injected randomness source, for
    /// deterministic tests.
    pub fn with_random(config: NodeConfig, random: Box<dyn GossipRandom>) -> Self {
        Self {
            config,
            random,
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// The main run loop.
    ///
    /// Binds the gossip (UDP) and control (TCP) sockets, builds the
    /// shared [`GossipCore`], spawns each service in its own task, and
    /// waits for either Ctrl+C or an externally-cancelled shutdown token
    /// before joining everything.
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            index = self.config.index,
            cluster_size = self.config.cluster_size,
            gossip_addr = %self.config.gossip_addr,
            control_addr = %self.config.control_addr,
            "starting gossip node"
        );

        let gossip_socket = transport::bind(self.config.gossip_addr).await?;
        let control_listener = control::bind(self.config.control_addr).await?;

        let core = Arc::new(GossipCore::new(self.config.clone(), Arc::clone(&gossip_socket), self.random));

        let recv_task = tokio::spawn(transport::recv_loop(gossip_socket, Arc::clone(&core), self.shutdown_token.clone()));
        let anti_entropy_task = tokio::spawn(anti_entropy::run(Arc::clone(&core), self.shutdown_token.clone()));
        let control_task = tokio::spawn(control::accept_loop(control_listener, Arc::clone(&core), self.shutdown_token.clone()));

        let ctrl_c_token = self.shutdown_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("ctrl-c received, shutting down");
                ctrl_c_token.cancel();
            }
        });

        self.shutdown_token.cancelled().await;

        if let Err(e) = recv_task.await {
            tracing::error!(error = ?e, "gossip receive task failed");
        }
        if let Err(e) = anti_entropy_task.await {
            tracing::error!(error = ?e, "anti-entropy task failed");
        }
        if let Err(e) = control_task.await {
            tracing::error!(error = ?e, "control accept task failed");
        }
        tracing::info!("node has shut down");

        Ok(())
    }
}
