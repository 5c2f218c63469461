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

//! The SpawnZone cache (§4.5). Loaded fully from the database at
//! construction. Each zone owns its own live mob instances
//! (`spawned_mobs`); `SpawnMobsInZone`/`MoveMobsInZone` (§4.6, see
//! `crate::spawn`) run under this cache's per-zone write lock so
//! concurrent callers never over-spawn a zone.

use std::collections::HashMap;

use gateway_common::SpawnZone;
use parking_lot::RwLock;

#[derive(Default)]
pub struct SpawnZoneCache {
    by_id: RwLock<HashMap<i64, SpawnZone>>,
}

impl SpawnZoneCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, zone_id: i64) -> SpawnZone {
        self.by_id.read().get(&zone_id).cloned().unwrap_or_default()
    }

    pub fn get_all(&self) -> Vec<SpawnZone> {
        self.by_id.read().values().cloned().collect()
    }

    pub fn upsert(&self, zone: SpawnZone) {
        self.by_id.write().insert(zone.zone_id, zone);
    }

    pub fn remove(&self, zone_id: i64) -> Option<SpawnZone> {
        self.by_id.write().remove(&zone_id)
    }

    pub fn load_all(&self, zones: impl IntoIterator<Item = SpawnZone>) {
        let mut guard = self.by_id.write();
        guard.clear();
        for zone in zones {
            guard.insert(zone.zone_id, zone);
        }
    }

    /// Runs `f` against the zone under the cache's single write lock,
    /// covering the whole operation (spawn, move, or removal) so
    /// concurrent callers on the same zone serialize and never observe a
    /// torn `spawned_mobs`/`spawn_count` pair. Returns `None` if the zone
    /// is unknown.
    pub fn with_zone_mut<R>(&self, zone_id: i64, f: impl FnOnce(&mut SpawnZone) -> R) -> Option<R> {
        let mut guard = self.by_id.write();
        let zone = guard.get_mut(&zone_id)?;
        Some(f(zone))
    }

    pub fn zone_ids(&self) -> Vec<i64> {
        self.by_id.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_zone_mut_is_none_for_unknown_zone() {
        let cache = SpawnZoneCache::new();
        assert!(cache.with_zone_mut(99, |_| ()).is_none());
    }

    #[test]
    fn with_zone_mut_mutates_in_place() {
        let cache = SpawnZoneCache::new();
        cache.upsert(SpawnZone { zone_id: 1, spawn_count: 3, ..Default::default() });
        cache.with_zone_mut(1, |z| z.spawn_count = 5);
        assert_eq!(cache.get(1).spawn_count, 5);
    }
}
