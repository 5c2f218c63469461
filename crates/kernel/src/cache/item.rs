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

//! The Item template cache (§4.5). Loaded fully from the database at
//! construction; never mutated afterward.

use std::collections::HashMap;

use gateway_common::ItemRecord;
use parking_lot::RwLock;

#[derive(Default)]
pub struct ItemCache {
    by_id: RwLock<HashMap<i64, ItemRecord>>,
}

impl ItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item_id: i64) -> ItemRecord {
        self.by_id.read().get(&item_id).cloned().unwrap_or_default()
    }

    pub fn get_all(&self) -> Vec<ItemRecord> {
        self.by_id.read().values().cloned().collect()
    }

    pub fn load_all(&self, items: impl IntoIterator<Item = ItemRecord>) {
        let mut guard = self.by_id.write();
        guard.clear();
        for item in items {
            guard.insert(item.id, item);
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
