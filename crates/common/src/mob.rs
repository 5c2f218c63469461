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

/// An AI-controlled in-world entity instantiated from a template and owned
/// by exactly one `SpawnZone`. `uid` is globally unique
/// (`"{template_id}_{time_based_key}"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mob {
    pub uid: String,
    pub template_id: i64,
    pub zone_id: i64,
    pub level: i32,
    pub race: String,
    pub hp: i32,
    pub mp: i32,
    pub aggressive: bool,
    pub dead: bool,
    pub position: Position,
    /// Seconds since epoch, as `f64` to match the original's float clock;
    /// zero means "not yet seeded".
    pub next_move_time: f64,
    pub movement_direction_x: f32,
    pub movement_direction_y: f32,
    /// Sampled once per mob on first step; drives its stride length.
    pub step_multiplier: f32,
    /// Drives `next_move_time`'s cooldown; unrelated to `step_multiplier`.
    pub speed_multiplier: f32,
    pub attributes: Vec<(String, i64)>,
}

impl Mob {
    /// True once `speed_multiplier` has been given a non-default value
    /// (templates default it to 1.0, never 0.0).
    pub fn has_speed(&self) -> bool {
        self.speed_multiplier > 0.0
    }
}
