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

//! The seven domain caches of §4.5, one module each. Every cache is a
//! `parking_lot::RwLock` around one or two `HashMap`s: readers overlap,
//! writers are exclusive, and no cache ever holds its lock across a
//! handler invocation or a network write.

mod character;
mod chunk;
mod client;
mod item;
mod mob;
mod npc;
mod spawn_zone;

pub use character::CharacterCache;
pub use chunk::ChunkCache;
pub use client::ClientCache;
pub use item::ItemCache;
pub use mob::MobCache;
pub use npc::NpcCache;
pub use spawn_zone::SpawnZoneCache;
