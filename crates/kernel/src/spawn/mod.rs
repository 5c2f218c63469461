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

//! The spawn-zone engine (§4.6): materializes mobs into a zone up to its
//! capacity and advances each mob's wander step on a fixed cadence. The
//! RNG is injected so tests can drive deterministic scenarios; production
//! callers pass `rand::rng()`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use gateway_common::{Mob, Position, SpawnZone};
use rand::Rng;

use crate::cache::{MobCache, SpawnZoneCache};

const MIN_STEP: f32 = 120.0;
const MIN_SEPARATION: f32 = 140.0;
const WORLD_LAYER_Z: f32 = 200.0;
const HEADING_CANDIDATES: usize = 4;

static UID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn now_seconds() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

/// `templateId_timeBasedKey(zoneId)`: unlike the original's wall-clock
/// suffix, this mixes a process-wide monotonic counter with the zone id,
/// which guarantees uniqueness (invariant 5) even under a clock that
/// hasn't advanced between two spawns in the same tick.
fn next_uid(template_id: i64, zone_id: i64) -> String {
    let seq = UID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{template_id}_{zone_id}_{seq}")
}

/// Fills `zone_id` up to its `spawn_count`, cloning new mobs from
/// `mob_template_id`'s template. Runs under the zone's single write lock
/// so concurrent callers cannot over-spawn it. Returns the number of mobs
/// actually spawned (zero if the zone or template is unknown, or the zone
/// was already full).
pub fn spawn_mobs_in_zone(
    zone_id: i64,
    zones: &SpawnZoneCache,
    templates: &MobCache,
    rng: &mut impl Rng,
) -> usize {
    zones
        .with_zone_mut(zone_id, |zone| {
            let template = templates.get_template(zone.mob_template_id);
            fill_zone(zone, &template, rng)
        })
        .unwrap_or(0)
}

/// Fills `zone` up to capacity from `template` and disarms its respawn
/// timer — shared by the direct `getSpawnZones` path and the periodic
/// respawn tick below.
fn fill_zone(zone: &mut SpawnZone, template: &Mob, rng: &mut impl Rng) -> usize {
    let mut spawned = 0usize;
    while zone.has_free_slot() {
        let mob = materialize_mob(zone, template, rng);
        if !zone.try_push_mob(mob) {
            break;
        }
        spawned += 1;
    }
    zone.respawn_due_at = None;
    spawned
}

/// §4.6: "Respawn is accomplished by letting a Scheduler task call
/// `SpawnMobsInZone(zoneId)` after each zone's `respawnTime`." Intended to
/// be driven from a scheduler task on a cadence much coarser than the
/// wander tick. For every zone with a free slot whose respawn timer has
/// elapsed — or was never armed, which is the case for a zone freshly
/// loaded from the database with no mobs in it yet — refills it to
/// capacity and disarms the timer.
pub fn process_respawns(zones: &SpawnZoneCache, templates: &MobCache, rng: &mut impl Rng) {
    let now = Instant::now();
    for zone_id in zones.zone_ids() {
        zones.with_zone_mut(zone_id, |zone| {
            if !zone.has_free_slot() {
                return;
            }
            if zone.respawn_due_at.is_some_and(|due| now < due) {
                return;
            }
            let template = templates.get_template(zone.mob_template_id);
            fill_zone(zone, &template, rng);
        });
    }
}

fn materialize_mob(zone: &SpawnZone, template: &Mob, rng: &mut impl Rng) -> Mob {
    let (min_x, min_y) = zone.min_bounds();
    let (max_x, max_y) = zone.max_bounds();
    let x = rng.random_range(min_x..=max_x);
    let y = rng.random_range(min_y..=max_y);
    let rot_z = rng.random_range(0.0..360.0);

    Mob {
        uid: next_uid(zone.mob_template_id, zone.zone_id),
        template_id: zone.mob_template_id,
        zone_id: zone.zone_id,
        level: template.level,
        race: template.race.clone(),
        hp: template.hp,
        mp: template.mp,
        aggressive: template.aggressive,
        dead: false,
        position: Position { x, y, z: WORLD_LAYER_Z, rot_z },
        next_move_time: 0.0,
        movement_direction_x: 0.0,
        movement_direction_y: 0.0,
        step_multiplier: 0.0,
        speed_multiplier: 0.0,
        attributes: template.attributes.clone(),
    }
}

/// Advances every mob in `zone_id` by one wander step, per the rules in
/// §4.6. Must be invoked on a fixed cadence (a few hundred ms) from a
/// scheduler task.
pub fn move_mobs_in_zone(zone_id: i64, zones: &SpawnZoneCache, rng: &mut impl Rng) {
    zones.with_zone_mut(zone_id, |zone| {
        step_zone(zone, rng);
    });
}

fn step_zone(zone: &mut SpawnZone, rng: &mut impl Rng) {
    let now = now_seconds();
    let (min_x, min_y) = zone.min_bounds();
    let (max_x, max_y) = zone.max_bounds();
    let border_threshold = 0.25 * zone.size_x.max(zone.size_y);
    let max_step = (0.08 * (zone.size_x + zone.size_y)).min(450.0);

    let mob_count = zone.spawned_mobs.len();
    for i in 0..mob_count {
        if zone.spawned_mobs[i].next_move_time == 0.0 {
            zone.spawned_mobs[i].next_move_time =
                now + rng.random_range(0.0..5.0) + rng.random_range(10.0..40.0);
        }
        if now < zone.spawned_mobs[i].next_move_time {
            continue;
        }
        if zone.spawned_mobs[i].step_multiplier == 0.0 {
            zone.spawned_mobs[i].step_multiplier = rng.random_range(1.2..3.0);
        }
        if zone.spawned_mobs[i].speed_multiplier == 0.0 {
            zone.spawned_mobs[i].speed_multiplier = 1.0;
        }

        let base_speed = rng.random_range(80.0..140.0);
        let jitter = rng.random_range(0.85..1.2);
        let step_multiplier = zone.spawned_mobs[i].step_multiplier;
        let step_size = (base_speed * step_multiplier * jitter).clamp(MIN_STEP, max_step);

        let current = zone.spawned_mobs[i].position;
        let near_border = (current.x - min_x).min(max_x - current.x) < border_threshold
            || (current.y - min_y).min(max_y - current.y) < border_threshold;

        let mut accepted: Option<(f32, f32, f32, f32)> = None;
        let mut last_candidate = (current.x, current.y);
        for _ in 0..HEADING_CANDIDATES {
            let heading_deg = if near_border {
                let to_center = (zone.center.y - current.y).atan2(zone.center.x - current.x).to_degrees();
                to_center + rng.random_range(30.0..100.0) * if rng.random_bool(0.5) { 1.0 } else { -1.0 }
            } else {
                rng.random_range(0.0..360.0)
            };
            let heading_rad = heading_deg.to_radians();
            let dx = heading_rad.cos() * step_size;
            let dy = heading_rad.sin() * step_size;
            let (nx, ny) = (current.x + dx, current.y + dy);
            last_candidate = (nx, ny);

            if !within_box(nx, ny, min_x, min_y, max_x, max_y) {
                continue;
            }
            if collides(&zone.spawned_mobs, i, nx, ny) {
                continue;
            }
            accepted = Some((nx, ny, dx, dy));
            break;
        }

        let accepted = accepted.or_else(|| {
            let mix = rng.random_range(0.2..0.6);
            let bx = current.x + (last_candidate.0 - current.x) * mix;
            let by = current.y + (last_candidate.1 - current.y) * mix;
            let (cx, cy) = clamp_to_box(bx, by, min_x, min_y, max_x, max_y);
            if collides(&zone.spawned_mobs, i, cx, cy) {
                None
            } else {
                Some((cx, cy, cx - current.x, cy - current.y))
            }
        });

        let Some((nx, ny, dx, dy)) = accepted else {
            continue;
        };

        let mob = &mut zone.spawned_mobs[i];
        mob.position.x = nx;
        mob.position.y = ny;
        mob.position.rot_z = dy.atan2(dx).to_degrees() + rng.random_range(-5.0..5.0);
        mob.movement_direction_x = dx;
        mob.movement_direction_y = dy;
        let cooldown = (rng.random_range(12.0..28.0) / mob.speed_multiplier.max(f32::EPSILON)).max(7.0);
        mob.next_move_time = now + cooldown as f64;
    }
}

fn within_box(x: f32, y: f32, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> bool {
    x >= min_x && x <= max_x && y >= min_y && y <= max_y
}

fn clamp_to_box(x: f32, y: f32, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> (f32, f32) {
    (x.clamp(min_x, max_x), y.clamp(min_y, max_y))
}

fn collides(mobs: &[Mob], skip_index: usize, x: f32, y: f32) -> bool {
    mobs.iter().enumerate().any(|(j, other)| {
        if j == skip_index {
            return false;
        }
        let dx = other.position.x - x;
        let dy = other.position.y - y;
        (dx * dx + dy * dy).sqrt() < MIN_SEPARATION
    })
}

/// Removes `uid` from `zone_id`, decrementing `spawned_count`, and arms
/// the zone's respawn timer if it wasn't armed already — `process_respawns`
/// refills the zone once `respawn_time` has elapsed.
pub fn mob_died(zone_id: i64, uid: &str, zones: &SpawnZoneCache) -> bool {
    zones
        .with_zone_mut(zone_id, |zone| {
            let removed = zone.remove_mob_by_uid(uid).is_some();
            if removed && zone.respawn_due_at.is_none() {
                zone.respawn_due_at = Some(Instant::now() + zone.respawn_time);
            }
            removed
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_common::Mob;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn test_zone() -> SpawnZone {
        SpawnZone {
            zone_id: 1,
            center: Position::new(0.0, 0.0, 0.0, 0.0),
            size_x: 1000.0,
            size_y: 1000.0,
            size_z: 0.0,
            mob_template_id: 5,
            spawn_count: 3,
            ..Default::default()
        }
    }

    #[test]
    fn spawn_fills_zone_exactly_to_capacity() {
        let zones = SpawnZoneCache::new();
        zones.upsert(test_zone());
        let templates = MobCache::new();
        templates.load_all(vec![Mob { template_id: 5, hp: 20, ..Default::default() }]);
        let mut rng = StdRng::seed_from_u64(1);

        let spawned = spawn_mobs_in_zone(1, &zones, &templates, &mut rng);
        assert_eq!(spawned, 3);

        let zone = zones.get(1);
        assert_eq!(zone.spawned_count(), 3);
        for mob in &zone.spawned_mobs {
            assert!(mob.position.x.abs() <= 500.0);
            assert!(mob.position.y.abs() <= 500.0);
            assert_eq!(mob.position.z, 200.0);
        }
    }

    #[test]
    fn spawn_respects_capacity_when_already_partially_full() {
        let zones = SpawnZoneCache::new();
        let mut zone = test_zone();
        zone.try_push_mob(Mob { uid: "existing".into(), zone_id: 1, ..Default::default() });
        zones.upsert(zone);
        let templates = MobCache::new();
        templates.load_all(vec![Mob { template_id: 5, ..Default::default() }]);
        let mut rng = StdRng::seed_from_u64(2);

        let spawned = spawn_mobs_in_zone(1, &zones, &templates, &mut rng);
        assert_eq!(spawned, 2);
        assert_eq!(zones.get(1).spawned_count(), 3);
    }

    #[test]
    fn uids_are_unique_across_two_zones() {
        let zones = SpawnZoneCache::new();
        let mut z1 = test_zone();
        z1.zone_id = 1;
        let mut z2 = test_zone();
        z2.zone_id = 2;
        zones.upsert(z1);
        zones.upsert(z2);
        let templates = MobCache::new();
        templates.load_all(vec![Mob { template_id: 5, ..Default::default() }]);
        let mut rng = StdRng::seed_from_u64(3);

        spawn_mobs_in_zone(1, &zones, &templates, &mut rng);
        spawn_mobs_in_zone(2, &zones, &templates, &mut rng);

        let mut uids: Vec<String> =
            zones.get(1).spawned_mobs.into_iter().chain(zones.get(2).spawned_mobs).map(|m| m.uid).collect();
        let before = uids.len();
        uids.sort();
        uids.dedup();
        assert_eq!(uids.len(), before);
    }

    #[test]
    fn move_keeps_mobs_within_zone_bounds() {
        let zones = SpawnZoneCache::new();
        zones.upsert(test_zone());
        let templates = MobCache::new();
        templates.load_all(vec![Mob { template_id: 5, ..Default::default() }]);
        let mut rng = StdRng::seed_from_u64(4);
        spawn_mobs_in_zone(1, &zones, &templates, &mut rng);

        for _ in 0..50 {
            move_mobs_in_zone(1, &zones, &mut rng);
        }

        let zone = zones.get(1);
        for mob in &zone.spawned_mobs {
            assert!((mob.position.x - zone.center.x).abs() <= zone.size_x / 2.0 + 0.01);
            assert!((mob.position.y - zone.center.y).abs() <= zone.size_y / 2.0 + 0.01);
        }
    }

    #[test]
    fn mob_died_removes_and_decrements_count() {
        let zones = SpawnZoneCache::new();
        let mut zone = test_zone();
        zone.try_push_mob(Mob { uid: "a".into(), zone_id: 1, ..Default::default() });
        zones.upsert(zone);

        assert!(mob_died(1, "a", &zones));
        assert_eq!(zones.get(1).spawned_count(), 0);
        assert!(!mob_died(1, "a", &zones));
    }

    #[test]
    fn mob_died_arms_the_respawn_timer_once() {
        let zones = SpawnZoneCache::new();
        let mut zone = test_zone();
        zone.try_push_mob(Mob { uid: "a".into(), zone_id: 1, ..Default::default() });
        zones.upsert(zone);

        mob_died(1, "a", &zones);
        let armed_at = zones.get(1).respawn_due_at;
        assert!(armed_at.is_some());

        // A zone that's already been armed must not have its deadline
        // pushed out further by a second death.
        let mut zone = test_zone();
        zone.try_push_mob(Mob { uid: "b".into(), zone_id: 1, ..Default::default() });
        zone.try_push_mob(Mob { uid: "c".into(), zone_id: 1, ..Default::default() });
        zone.respawn_due_at = armed_at;
        zones.upsert(zone);
        mob_died(1, "b", &zones);
        assert_eq!(zones.get(1).respawn_due_at, armed_at);
    }

    #[test]
    fn process_respawns_fills_a_freshly_loaded_zone_immediately() {
        let zones = SpawnZoneCache::new();
        zones.upsert(test_zone());
        let templates = MobCache::new();
        templates.load_all(vec![Mob { template_id: 5, ..Default::default() }]);
        let mut rng = StdRng::seed_from_u64(5);

        process_respawns(&zones, &templates, &mut rng);

        assert_eq!(zones.get(1).spawned_count(), 3);
    }

    #[test]
    fn process_respawns_waits_for_respawn_time_before_refilling() {
        let zones = SpawnZoneCache::new();
        let mut zone = test_zone();
        zone.respawn_time = Duration::from_secs(60);
        zone.try_push_mob(Mob { uid: "a".into(), zone_id: 1, ..Default::default() });
        zones.upsert(zone);
        mob_died(1, "a", &zones);

        let templates = MobCache::new();
        templates.load_all(vec![Mob { template_id: 5, ..Default::default() }]);
        let mut rng = StdRng::seed_from_u64(6);

        process_respawns(&zones, &templates, &mut rng);

        assert_eq!(zones.get(1).spawned_count(), 0, "respawn_time has not elapsed yet");
    }

    #[test]
    fn process_respawns_refills_once_respawn_time_has_elapsed() {
        let zones = SpawnZoneCache::new();
        let mut zone = test_zone();
        zone.respawn_time = Duration::from_millis(0);
        zone.try_push_mob(Mob { uid: "a".into(), zone_id: 1, ..Default::default() });
        zones.upsert(zone);
        mob_died(1, "a", &zones);
        std::thread::sleep(Duration::from_millis(5));

        let templates = MobCache::new();
        templates.load_all(vec![Mob { template_id: 5, ..Default::default() }]);
        let mut rng = StdRng::seed_from_u64(7);

        process_respawns(&zones, &templates, &mut rng);

        let zone = zones.get(1);
        assert_eq!(zone.spawned_count(), 3);
        assert!(zone.respawn_due_at.is_none(), "timer disarms once the zone is refilled");
    }
}
