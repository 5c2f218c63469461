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

use crate::position::Position;
use serde::{Deserialize, Serialize};

/// A player character, owned exclusively by the character cache while
/// its client is connected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub owner_id: i64,
    pub level: i32,
    pub name: String,
    pub class: String,
    pub race: String,
    pub exp: i64,
    pub hp: i32,
    pub mp: i32,
    pub max_hp: i32,
    pub max_mp: i32,
    pub position: Position,
    /// (attribute name, value) pairs, e.g. strength/dexterity.
    pub attributes: Vec<(String, i64)>,
    pub skills: Vec<String>,
    /// Set by a handler mutation, cleared once the periodic flush commits.
    pub dirty: bool,
}

impl Character {
    /// Sentinel used by `CacheMiss` callers (§7): `id == 0` marks "not found".
    pub fn is_sentinel(&self) -> bool {
        self.id == 0
    }
}
