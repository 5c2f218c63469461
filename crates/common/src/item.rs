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

/// Read-only reference data for an item/loot template. Loaded once at
/// startup; never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemRecord {
    pub id: i64,
    pub name: String,
    pub stackable: bool,
    pub max_stack: i32,
}
