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

//! The Character cache (§4.5). Begins empty at startup; a character is
//! loaded and upserted on `joinGame`, mutated in place by handlers (which
//! set `dirty`), and periodically flushed by a scheduler task that reads a
//! snapshot under the read lock, releases it, then issues the database
//! write — so the flush never holds the cache lock across a DB call.

use std::collections::HashMap;

use gateway_common::Character;
use parking_lot::RwLock;

#[derive(Default)]
pub struct CharacterCache {
    by_id: RwLock<HashMap<i64, Character>>,
}

impl CharacterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, character_id: i64) -> Character {
        self.by_id.read().get(&character_id).cloned().unwrap_or_default()
    }

    pub fn contains(&self, character_id: i64) -> bool {
        self.by_id.read().contains_key(&character_id)
    }

    pub fn get_all(&self) -> Vec<Character> {
        self.by_id.read().values().cloned().collect()
    }

    pub fn upsert(&self, character: Character) {
        self.by_id.write().insert(character.id, character);
    }

    pub fn remove(&self, character_id: i64) -> Option<Character> {
        self.by_id.write().remove(&character_id)
    }

    /// Applies `mutate` to the cached character under the write lock and
    /// marks it dirty. A no-op if the character isn't cached.
    pub fn mutate(&self, character_id: i64, mutate: impl FnOnce(&mut Character)) {
        let mut guard = self.by_id.write();
        if let Some(character) = guard.get_mut(&character_id) {
            mutate(character);
            character.dirty = true;
        }
    }

    pub fn update_position(&self, character_id: i64, position: gateway_common::Position) {
        self.mutate(character_id, |c| c.position = position);
    }

    /// A snapshot of every dirty character, taken under the read lock. The
    /// caller flushes these to the database and then calls
    /// [`CharacterCache::clear_dirty_if_unchanged`] per row.
    pub fn dirty_snapshot(&self) -> Vec<Character> {
        self.by_id.read().values().filter(|c| c.dirty).cloned().collect()
    }

    /// Clears the dirty flag for `character_id` only if the cached row is
    /// still equal to `expected` (the snapshot that was just flushed) —
    /// this is the "no lost updates" rule of §4.5: a handler that mutated
    /// the character again while the flush was in flight keeps its dirty
    /// bit set for the next tick.
    pub fn clear_dirty_if_unchanged(&self, character_id: i64, expected: &Character) {
        let mut guard = self.by_id.write();
        if let Some(character) = guard.get_mut(&character_id) {
            if character == expected {
                character.dirty = false;
            }
        }
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
    use gateway_common::Position;
    use pretty_assertions::assert_eq;

    fn character(id: i64) -> Character {
        Character { id, ..Default::default() }
    }

    #[test]
    fn cache_miss_returns_sentinel_zero_id() {
        let cache = CharacterCache::new();
        let c = cache.get(42);
        assert!(c.is_sentinel());
    }

    #[test]
    fn mutate_sets_dirty_flag() {
        let cache = CharacterCache::new();
        cache.upsert(character(1));
        cache.update_position(1, Position::new(1.0, 2.0, 3.0, 0.0));
        let c = cache.get(1);
        assert!(c.dirty);
        assert_eq!(c.position, Position::new(1.0, 2.0, 3.0, 0.0));
    }

    #[test]
    fn flush_clears_dirty_only_if_row_unchanged_since_snapshot() {
        let cache = CharacterCache::new();
        cache.upsert(character(1));
        cache.mutate(1, |c| c.hp = 50);
        let snapshot = cache.get(1);

        // A concurrent handler mutates again before the flush completes.
        cache.mutate(1, |c| c.hp = 40);

        cache.clear_dirty_if_unchanged(1, &snapshot);
        assert!(cache.get(1).dirty, "later mutation must not be lost");
    }

    #[test]
    fn flush_clears_dirty_when_nothing_changed_since_snapshot() {
        let cache = CharacterCache::new();
        cache.upsert(character(1));
        cache.mutate(1, |c| c.hp = 50);
        let snapshot = cache.get(1);
        cache.clear_dirty_if_unchanged(1, &snapshot);
        assert!(!cache.get(1).dirty);
    }

    #[test]
    fn dirty_snapshot_only_includes_dirty_rows() {
        let cache = CharacterCache::new();
        cache.upsert(character(1));
        cache.upsert(character(2));
        cache.mutate(1, |c| c.hp = 10);
        let dirty = cache.dirty_snapshot();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].id, 1);
    }
}
