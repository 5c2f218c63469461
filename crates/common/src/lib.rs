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

//! Domain types, the internal event model, configuration, and the error
//! taxonomy shared by every gateway crate. No I/O lives here.

pub mod character;
pub mod chunk;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod item;
pub mod mob;
pub mod npc;
pub mod position;
pub mod spawn_zone;
pub mod task;

pub use character::Character;
pub use chunk::Chunk;
pub use client::Client;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use event::{Event, EventPayload, EventType};
pub use item::ItemRecord;
pub use mob::Mob;
pub use npc::NpcRecord;
pub use position::Position;
pub use spawn_zone::SpawnZone;
pub use task::Task;
