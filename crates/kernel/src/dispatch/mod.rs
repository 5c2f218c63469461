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

//! The event dispatcher (§4.7/§4.9): three priority dispatch loops feeding
//! a fixed-size worker pool, the full handler matrix, and the small
//! service interfaces a handler uses to talk to the outside world without
//! `gateway-kernel` knowing what a socket is.

pub mod dispatcher;
pub mod handlers;
pub mod locks;
pub mod router;
pub mod sinks;
pub mod worker_pool;

pub use dispatcher::{Dispatcher, DispatcherHandles};
pub use locks::ClientLocks;
pub use router::route_frame;
pub use sinks::{CharacterFlusher, CharacterLoader, ChunkSink, ClientSink};
pub use worker_pool::WorkerPool;
