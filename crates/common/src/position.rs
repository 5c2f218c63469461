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

use serde::{Deserialize, Serialize};

/// World-space coordinates plus a yaw-style rotation, in degrees.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rot_z: f32,
}

impl Position {
    pub const ZERO: Position = Position { x: 0.0, y: 0.0, z: 0.0, rot_z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32, rot_z: f32) -> Self {
        Self { x, y, z, rot_z }
    }

    /// Planar (x/y) Euclidean distance, ignoring z.
    pub fn planar_distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_distance_ignores_z() {
        let a = Position::new(0.0, 0.0, 100.0, 0.0);
        let b = Position::new(3.0, 4.0, 900.0, 0.0);
        assert_eq!(a.planar_distance(&b), 5.0);
    }
}
