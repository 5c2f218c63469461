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

//! The PostgreSQL repository (§3, §4.5, §6). Every method here is a single
//! prepared statement or a transaction wrapping a handful of them; nothing
//! above this crate ever sees a `sqlx::Row` or writes SQL of its own.
//!
//! Queries are built with `sqlx::query`/`query_as` over runtime strings
//! rather than the `query!` compile-time macros, since this workspace has
//! no `DATABASE_URL`/offline cache checked in for the macro's compile-time
//! verification to run against.

use std::time::Duration;

use gateway_common::{Character, Chunk, GatewayError, ItemRecord, Mob, NpcRecord, Position, SpawnZone};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, warn};

/// Thin wrapper over a `sqlx::PgPool`. Every read+write pair (the
/// character flush path) runs inside one `BEGIN`/`COMMIT` transaction
/// (§6): if any statement fails the whole transaction aborts and the
/// cache's dirty flag is left set for the next scheduler tick (§4.5, §7).
#[derive(Clone)]
pub struct Repository {
    pool: PgPool,
}

impl Repository {
    pub async fn connect(connection_string: &str, max_connections: u32) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .map_err(GatewayError::database)?;
        Ok(Self { pool })
    }

    /// Exposed for tests that want to build a `Repository` directly from
    /// an already-open pool (e.g. one opened against a `tempfile`-backed
    /// throwaway database by an integration harness).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---- Startup loads (§4.5: Items, Mobs, NPCs, SpawnZones load fully
    // from the database during construction) ----------------------------

    pub async fn load_items(&self) -> Result<Vec<ItemRecord>, GatewayError> {
        let rows = sqlx::query("SELECT id, name, stackable, max_stack FROM items")
            .fetch_all(&self.pool)
            .await
            .map_err(GatewayError::database)?;
        Ok(rows
            .into_iter()
            .map(|row| ItemRecord {
                id: row.get("id"),
                name: row.get("name"),
                stackable: row.get("stackable"),
                max_stack: row.get("max_stack"),
            })
            .collect())
    }

    pub async fn load_npcs(&self) -> Result<Vec<NpcRecord>, GatewayError> {
        let rows = sqlx::query(
            "SELECT id, name, pos_x, pos_y, pos_z, rot_z, dialogue FROM npcs",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(GatewayError::database)?;
        Ok(rows
            .into_iter()
            .map(|row| NpcRecord {
                id: row.get("id"),
                name: row.get("name"),
                position: Position {
                    x: row.get("pos_x"),
                    y: row.get("pos_y"),
                    z: row.get("pos_z"),
                    rot_z: row.get("rot_z"),
                },
                dialogue: row.get::<Vec<String>, _>("dialogue"),
            })
            .collect())
    }

    /// Loads mob *templates* (§4.5, §4.6, `MobCache`) — the
    /// read-only records the spawn engine clones from, not live instances.
    pub async fn load_mob_templates(&self) -> Result<Vec<Mob>, GatewayError> {
        let rows = sqlx::query(
            "SELECT template_id, level, race, hp, mp, aggressive FROM mob_templates",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(GatewayError::database)?;

        let mut templates = Vec::with_capacity(rows.len());
        for row in rows {
            let template_id: i64 = row.get("template_id");
            let attributes = self.load_mob_attributes(template_id).await?;
            templates.push(Mob {
                template_id,
                level: row.get("level"),
                race: row.get("race"),
                hp: row.get("hp"),
                mp: row.get("mp"),
                aggressive: row.get("aggressive"),
                attributes,
                ..Default::default()
            });
        }
        Ok(templates)
    }

    async fn load_mob_attributes(&self, template_id: i64) -> Result<Vec<(String, i64)>, GatewayError> {
        let rows = sqlx::query("SELECT name, value FROM mob_template_attributes WHERE template_id = $1")
            .bind(template_id)
            .fetch_all(&self.pool)
            .await
            .map_err(GatewayError::database)?;
        Ok(rows.into_iter().map(|row| (row.get("name"), row.get("value"))).collect())
    }

    pub async fn load_chunks(&self) -> Result<Vec<Chunk>, GatewayError> {
        let rows = sqlx::query(
            "SELECT id, ip, port, pos_x, pos_y, pos_z, size_x, size_y, size_z FROM chunk_servers",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(GatewayError::database)?;
        Ok(rows
            .into_iter()
            .map(|row| Chunk {
                id: row.get("id"),
                ip: row.get("ip"),
                port: row.get::<i32, _>("port") as u16,
                pos_x: row.get("pos_x"),
                pos_y: row.get("pos_y"),
                pos_z: row.get("pos_z"),
                size_x: row.get("size_x"),
                size_y: row.get("size_y"),
                size_z: row.get("size_z"),
                socket_addr: None,
            })
            .collect())
    }

    pub async fn load_spawn_zones(&self) -> Result<Vec<SpawnZone>, GatewayError> {
        let rows = sqlx::query(
            "SELECT zone_id, name, center_x, center_y, center_z, size_x, size_y, size_z, \
             mob_template_id, spawn_count, respawn_time_secs FROM spawn_zones",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(GatewayError::database)?;
        Ok(rows
            .into_iter()
            .map(|row| SpawnZone {
                zone_id: row.get("zone_id"),
                name: row.get("name"),
                center: Position {
                    x: row.get("center_x"),
                    y: row.get("center_y"),
                    z: row.get("center_z"),
                    rot_z: 0.0,
                },
                size_x: row.get("size_x"),
                size_y: row.get("size_y"),
                size_z: row.get("size_z"),
                mob_template_id: row.get("mob_template_id"),
                spawn_count: row.get("spawn_count"),
                respawn_time: Duration::from_secs(row.get::<i64, _>("respawn_time_secs") as u64),
                spawned_mobs: Vec::new(),
            })
            .collect())
    }

    // ---- Per-connection character load (§4.5: joinGame -> get_character
    // + get_character_attributes + get_character_position) --------------

    pub async fn get_character(&self, character_id: i64) -> Result<Character, GatewayError> {
        let Some(row) = sqlx::query(
            "SELECT id, owner_id, level, name, class, race, exp, hp, mp, max_hp, max_mp, \
             pos_x, pos_y, pos_z, rot_z FROM characters WHERE id = $1",
        )
        .bind(character_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(GatewayError::database)?
        else {
            // CacheMiss sentinel (§7): caller tests `id == 0`.
            return Ok(Character::default());
        };

        let attributes = self.get_character_attributes(character_id).await?;
        let skills = self.get_character_skills(character_id).await?;

        Ok(Character {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            level: row.get("level"),
            name: row.get("name"),
            class: row.get("class"),
            race: row.get("race"),
            exp: row.get("exp"),
            hp: row.get("hp"),
            mp: row.get("mp"),
            max_hp: row.get("max_hp"),
            max_mp: row.get("max_mp"),
            position: Position {
                x: row.get("pos_x"),
                y: row.get("pos_y"),
                z: row.get("pos_z"),
                rot_z: row.get("rot_z"),
            },
            attributes,
            skills,
            dirty: false,
        })
    }

    pub async fn get_character_attributes(&self, character_id: i64) -> Result<Vec<(String, i64)>, GatewayError> {
        let rows = sqlx::query("SELECT name, value FROM character_attributes WHERE character_id = $1")
            .bind(character_id)
            .fetch_all(&self.pool)
            .await
            .map_err(GatewayError::database)?;
        Ok(rows.into_iter().map(|row| (row.get("name"), row.get("value"))).collect())
    }

    pub async fn get_character_skills(&self, character_id: i64) -> Result<Vec<String>, GatewayError> {
        let rows = sqlx::query("SELECT skill FROM character_skills WHERE character_id = $1")
            .bind(character_id)
            .fetch_all(&self.pool)
            .await
            .map_err(GatewayError::database)?;
        Ok(rows.into_iter().map(|row| row.get("skill")).collect())
    }

    pub async fn get_character_position(&self, character_id: i64) -> Result<Position, GatewayError> {
        let Some(row) = sqlx::query("SELECT pos_x, pos_y, pos_z, rot_z FROM characters WHERE id = $1")
            .bind(character_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(GatewayError::database)?
        else {
            return Ok(Position::ZERO);
        };
        Ok(Position {
            x: row.get("pos_x"),
            y: row.get("pos_y"),
            z: row.get("pos_z"),
            rot_z: row.get("rot_z"),
        })
    }

    /// Flushes one dirty character (§4.5's write-back rule): position,
    /// vitals and experience are written inside a single transaction. The
    /// cache-level "no lost updates" guarantee
    /// (`CharacterCache::clear_dirty_if_unchanged`) is the caller's job —
    /// this method only reports success or failure of the write itself.
    pub async fn flush_character(&self, character: &Character) -> Result<(), GatewayError> {
        let mut tx = self.pool.begin().await.map_err(GatewayError::database)?;
        let result = sqlx::query(
            "UPDATE characters SET level = $1, exp = $2, hp = $3, mp = $4, \
             pos_x = $5, pos_y = $6, pos_z = $7, rot_z = $8 WHERE id = $9",
        )
        .bind(character.level)
        .bind(character.exp)
        .bind(character.hp)
        .bind(character.mp)
        .bind(character.position.x)
        .bind(character.position.y)
        .bind(character.position.z)
        .bind(character.position.rot_z)
        .bind(character.id)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {
                tx.commit().await.map_err(GatewayError::database)?;
                debug!(character_id = character.id, "flushed character");
                Ok(())
            }
            Err(e) => {
                // Transaction aborts on drop; the caller keeps the row
                // dirty for a retry on the next tick (§4.5, §7).
                warn!(character_id = character.id, error = %e, "character flush failed, will retry");
                Err(GatewayError::database(e))
            }
        }
    }
}
