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

//! The NPC cache (§4.5). Loaded fully from the database at construction;
//! never mutated afterward.

use std::collections::HashMap;

use gateway_common::NpcRecord;
use parking_lot::RwLock;

#[derive(Default)]
pub struct NpcCache {
    by_id: RwLock<HashMap<i64, NpcRecord>>,
}

impl NpcCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, npc_id: i64) -> NpcRecord {
        self.by_id.read().get(&npc_id).cloned().unwrap_or_default()
    }

    pub fn get_all(&self) -> Vec<NpcRecord> {
        self.by_id.read().values().cloned().collect()
    }

    pub fn load_all(&self, npcs: impl IntoIterator<Item = NpcRecord>) {
        let mut guard = self.by_id.write();
        guard.clear();
        for npc in npcs {
            guard.insert(npc.id, npc);
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
