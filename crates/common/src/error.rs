// Copyright (C) 2026 the sharded-gateway contributors. This program is free
// software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation,
// version 3.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program. If not, see <https://www.gnu.org/licenses/>.

use thiserror::Error;

/// The error taxonomy of §7. Nothing propagates across a handler boundary:
/// every handler's outermost scope catches and logs its own `GatewayError`
/// rather than returning it to the dispatcher loop.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed JSON or unknown event type. Log, drop the frame, keep the
    /// connection open.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Missing `hash` or `clientId` on `joinGame`. The caller replies with
    /// `status: "error", message: "Authentication failed for user!"` and
    /// keeps the socket open.
    #[error("authentication failed for user!")]
    Auth,

    /// A cache or repository operation against Postgres failed. Log, abort
    /// the transaction, leave the cache entry dirty for retry on the next
    /// scheduler tick. Never surfaced to clients.
    #[error("database error: {0}")]
    Database(String),

    /// A socket-level failure. Client-side: close the socket and enqueue
    /// disconnect events. Chunk-side: schedule a reconnect under backoff.
    #[error("transport error: {0}")]
    Transport(String),

    /// Unrecoverable startup failure (e.g. acceptor bind). Log and exit 1.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl GatewayError {
    pub fn database(err: impl std::fmt::Display) -> Self {
        GatewayError::Database(err.to_string())
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        GatewayError::Transport(err.to_string())
    }
}
