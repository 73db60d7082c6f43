//! src/control.rs
//!
//! The local control channel (C6): a line-delimited TCP protocol a client
//! on the same host uses to post a chat message, read back the chat log,
//! or shut the node down. Every accepted connection is handled on its own
//! task; commands are newline-terminated and may arrive split across
//! multiple reads, mirroring the original implementation's buffered
//! accumulate-then-split loop.

use crate::engine::GossipCore;
use crate::error::Result;
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

/// Read buffer size per connection, matching the original server's fixed
/// stack buffer.
const READ_BUFFER_SIZE: usize = 1024;

/// `listen()` backlog for the control socket, matching the original
/// implementation's `MAX_PEERS` constant (not user-visible; an internal
/// tuning value carried forward for fidelity).
const MAX_PEERS: i32 = 4;

/// Binds the control listener with an explicit `listen()` backlog —
/// `tokio::net::TcpListener::bind` doesn't expose this, so the socket is
/// built with `socket2` and handed to tokio once listening.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(MAX_PEERS)?;
    Ok(TcpListener::from_std(socket.into())?)
}

/// Accepts connections until `shutdown` fires. A `crash` command on any
/// connection cancels `shutdown` for the whole node, same as the rest of
/// the server's activities.
pub async fn accept_loop(listener: TcpListener, core: Arc<GossipCore>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "control connection accepted");
                        let core = Arc::clone(&core);
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, core, shutdown).await;
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "control accept failed"),
                }
            }
            _ = shutdown.cancelled() => {
                tracing::debug!("control accept loop shutting down");
                break;
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, core: Arc<GossipCore>, shutdown: CancellationToken) {
    let mut received = String::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        received.push_str(&String::from_utf8_lossy(&buf[..n]));

        while let Some(pos) = received.find('\n') {
            let command = received[..pos].to_string();
            received.drain(..=pos);
            if !process_command(&command, &mut stream, &core, &shutdown).await {
                return;
            }
        }
    }
}

/// Returns `false` when the connection (and, for `crash`, the whole node)
/// should stop.
async fn process_command(command: &str, stream: &mut TcpStream, core: &Arc<GossipCore>, shutdown: &CancellationToken) -> bool {
    if let Some(rest) = command.strip_prefix("msg ") {
        // The original protocol carries a message id ahead of the text but
        // never uses it for anything beyond locating where the text
        // begins; a command with no id/text separator is silently
        // ignored, matching that behavior.
        if let Some((_id, text)) = rest.split_once(' ') {
            core.append_local(text.to_string()).await;
        }
        true
    } else if command == "get chatLog" {
        let log = core.chat_log().await;
        let reply = if log.is_empty() {
            "chatLog <Empty>\n".to_string()
        } else {
            format!("chatLog {}\n", log.join(","))
        };
        if let Err(e) = stream.write_all(reply.as_bytes()).await {
            tracing::warn!(error = %e, "failed to send chat log reply");
        }
        true
    } else if command == "crash" {
        tracing::info!("crash command received, shutting node down");
        shutdown.cancel();
        false
    } else {
        tracing::warn!(command, "unknown control command");
        true
    }
}
