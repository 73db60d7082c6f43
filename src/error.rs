//! src/error.rs
//!
//! The library's `Error` enum, one variant per §7 error kind that actually
//! surfaces as a `Result::Err` at a call boundary. The non-fatal kinds
//! spec.md §7 lists (`SendFailed`, `RecvFailed`, `MalformedMessage`,
//! `UnknownCommand`, `DuplicateInsert`) never leave the component that
//! handles them — they're logged in place and the loop continues, so they
//! have no variant here.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to bind or listen on socket: {0}")]
    SocketSetupFailed(#[from] std::io::Error),

    #[error("tokio task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
