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

//! The in-process engine room: the three priority event queues, the
//! recurring task scheduler, the seven domain caches, and the spawn-zone
//! wander engine. Everything here is transport-agnostic — no socket, no
//! SQL — so it can be driven directly from tests.

pub mod cache;
pub mod dispatch;
pub mod queue;
pub mod spawn;
pub mod tasks;

pub use cache::{CharacterCache, ChunkCache, ClientCache, ItemCache, MobCache, NpcCache, SpawnZoneCache};
pub use queue::{EventQueue, EventQueues};
pub use tasks::Scheduler;

/// Everything a worker or handler needs to read and mutate gateway state,
/// bundled so handlers take one argument instead of seven.
#[derive(Default)]
pub struct Caches {
    pub clients: ClientCache,
    pub characters: CharacterCache,
    pub chunks: ChunkCache,
    pub mobs: MobCache,
    pub npcs: NpcCache,
    pub items: ItemCache,
    pub spawn_zones: SpawnZoneCache,
}
