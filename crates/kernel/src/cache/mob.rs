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

//! The Mob **template** cache (§4.5). Loaded fully from the database at
//! construction; never mutated afterward. The spawn-zone engine clones a
//! template out of this cache, keyed by `mob_template_id`, each time it
//! materializes a new mob into a zone (§4.6); the live, positioned
//! instances it produces are owned by `SpawnZoneCache`, not here.

use std::collections::HashMap;

use gateway_common::Mob;
use parking_lot::RwLock;

#[derive(Default)]
pub struct MobCache {
    templates: RwLock<HashMap<i64, Mob>>,
}

impl MobCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a zero-valued template (`has_speed() == false`, `hp == 0`)
    /// if `template_id` is unknown, per §7's `CacheMiss` convention.
    pub fn get_template(&self, template_id: i64) -> Mob {
        self.templates.read().get(&template_id).cloned().unwrap_or_default()
    }

    pub fn get_all(&self) -> Vec<Mob> {
        self.templates.read().values().cloned().collect()
    }

    pub fn load_all(&self, templates: impl IntoIterator<Item = Mob>) {
        let mut guard = self.templates.write();
        guard.clear();
        for template in templates {
            guard.insert(template.template_id, template);
        }
    }

    pub fn len(&self) -> usize {
        self.templates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
