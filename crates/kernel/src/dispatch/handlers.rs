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

//! The handler matrix of §4.9: one function per `EventType`, each reading
//! and mutating `Caches` and replying through the injected sinks. None of
//! these ever return a `Result` to their caller — per §7, a handler that
//! hits a `GatewayError` logs it and replies (or silently drops) right
//! here, rather than propagating it up through the dispatcher loop.

use gateway_codec::ResponseEnvelope;
use gateway_common::{Event, EventPayload, EventType};
use serde_json::json;
use tracing::warn;

use crate::cache::ClientCache;
use crate::dispatch::sinks::{CharacterFlusher, CharacterLoader, ChunkSink, ClientSink};
use crate::spawn;
use crate::Caches;

/// Dispatches one event to its handler. Called from inside a worker-pool
/// job with the event's per-client lock already held (§5).
pub fn handle_event(
    event: &Event,
    caches: &Caches,
    client_sink: &dyn ClientSink,
    chunk_sink: &dyn ChunkSink,
    loader: &dyn CharacterLoader,
    flusher: &dyn CharacterFlusher,
) {
    match event.event_type {
        EventType::PingClient => handle_ping_client(event, client_sink),
        EventType::JoinCharacterChunk => handle_join_character_chunk(event, caches, client_sink, chunk_sink, loader),
        EventType::JoinCharacterClient => handle_join_character_client(event, caches, client_sink),
        EventType::GetConnectedCharactersChunk => handle_get_connected_characters_chunk(event, chunk_sink),
        EventType::GetConnectedCharactersClient => handle_get_connected_characters_client(event, caches, client_sink),
        EventType::MoveCharacterChunk => handle_move_character_chunk(event, caches, chunk_sink),
        EventType::MoveCharacterClient => handle_move_character_client(event, caches, client_sink),
        EventType::SpawnMobsInZone => handle_spawn_mobs_in_zone(event, caches, client_sink),
        EventType::DisconnectClient => handle_disconnect_client(event, caches, flusher),
        EventType::DisconnectClientChunk => handle_disconnect_client_chunk(event, chunk_sink),
    }
}

fn client_socket(event: &Event) -> Option<std::net::SocketAddr> {
    event.socket
}

fn resolve_socket(clients: &ClientCache, client_id: i64) -> Option<std::net::SocketAddr> {
    clients.get(client_id).map(|c| c.socket_addr)
}

fn handle_ping_client(event: &Event, client_sink: &dyn ClientSink) {
    let Some(socket) = client_socket(event) else {
        warn!(client_id = event.client_id, "pingClient with no origin socket, dropping");
        return;
    };
    let reply = ResponseEnvelope::success("pingClient", event.client_id, "pong", json!({}));
    client_sink.send(socket, reply.to_string());
}

/// §4.7/§7: a `joinGame` straight from a client. Missing `hash` or
/// `clientId` is `AuthError` — reply directly with the verbatim
/// "Authentication failed for user!" message and never forward to the
/// chunk peer. Otherwise load the character, cache both it and the new
/// `Client`, and forward the join to the chunk server.
fn handle_join_character_chunk(
    event: &Event,
    caches: &Caches,
    client_sink: &dyn ClientSink,
    chunk_sink: &dyn ChunkSink,
    loader: &dyn CharacterLoader,
) {
    let EventPayload::ClientData { client_id, hash, character_id } = &event.payload else {
        warn!(event_type = ?event.event_type, "joinGame with unexpected payload shape, dropping");
        return;
    };
    let Some(socket) = client_socket(event) else {
        warn!(client_id = event.client_id, "joinGame with no origin socket, dropping");
        return;
    };

    if *client_id == 0 || hash.is_empty() {
        let reply = ResponseEnvelope::auth_failed("joinGame", *client_id);
        client_sink.send(socket, reply.to_string());
        return;
    }

    let character = loader.load_character(*character_id);
    if character.is_sentinel() {
        let reply = ResponseEnvelope::error("joinGame", *client_id, "character not found");
        client_sink.send(socket, reply.to_string());
        return;
    }

    let mut client = gateway_common::Client::new(*client_id, hash.clone(), socket);
    client.character_id = character.id;
    caches.clients.upsert(client);
    caches.characters.upsert(character.clone());

    let forward = ResponseEnvelope::success(
        "joinGame",
        *client_id,
        "ok",
        json!({
            "characterId": character.id,
            "posX": character.position.x,
            "posY": character.position.y,
            "posZ": character.position.z,
            "rotZ": character.position.rot_z,
        }),
    );
    chunk_sink.send(forward.to_string());
}

/// §4.7: the chunk peer's echo of a successful `joinGame`. The gateway
/// already rejected a malformed join in [`handle_join_character_chunk`],
/// so by the time this fires the only remaining job is resolving the
/// waiting client's socket and handing back the character's position.
fn handle_join_character_client(event: &Event, caches: &Caches, client_sink: &dyn ClientSink) {
    let EventPayload::ClientData { client_id, character_id, .. } = &event.payload else {
        warn!(event_type = ?event.event_type, "joinGame echo with unexpected payload shape, dropping");
        return;
    };
    let Some(socket) = resolve_socket(&caches.clients, *client_id) else {
        warn!(client_id, "joinGame echo for a client with no cached socket, dropping");
        return;
    };
    let character = caches.characters.get(*character_id);
    let reply = ResponseEnvelope::success(
        "joinGame",
        *client_id,
        "ok",
        json!({
            "characterId": character.id,
            "posX": character.position.x,
            "posY": character.position.y,
            "posZ": character.position.z,
            "rotZ": character.position.rot_z,
        }),
    );
    client_sink.send(socket, reply.to_string());
}

fn handle_get_connected_characters_chunk(event: &Event, chunk_sink: &dyn ChunkSink) {
    let forward = ResponseEnvelope::success("getConnectedCharacters", event.client_id, "ok", json!({}));
    chunk_sink.send(forward.to_string());
}

fn handle_get_connected_characters_client(event: &Event, caches: &Caches, client_sink: &dyn ClientSink) {
    let Some(socket) = resolve_socket(&caches.clients, event.client_id) else {
        warn!(client_id = event.client_id, "getConnectedCharacters echo for unknown client, dropping");
        return;
    };
    let characters: Vec<_> = caches
        .characters
        .get_all()
        .into_iter()
        .map(|c| json!({"characterId": c.id, "characterName": c.name, "characterLevel": c.level}))
        .collect();
    let reply = ResponseEnvelope::success(
        "getConnectedCharacters",
        event.client_id,
        "ok",
        json!({"charactersList": characters}),
    );
    client_sink.send(socket, reply.to_string());
}

/// §4.7: a client moved. Drop the event with a warning if the character
/// isn't cached (Open Question (c)) rather than materializing a phantom
/// row; otherwise update the cache (marks it dirty for the next flush
/// tick, §4.5) and forward the move to the chunk peer.
fn handle_move_character_chunk(event: &Event, caches: &Caches, chunk_sink: &dyn ChunkSink) {
    let EventPayload::Character(moved) = &event.payload else {
        warn!(event_type = ?event.event_type, "moveCharacter with unexpected payload shape, dropping");
        return;
    };
    if !caches.characters.contains(moved.id) {
        warn!(character_id = moved.id, "moveCharacter for an uncached character, dropping");
        return;
    }
    caches.characters.update_position(moved.id, moved.position);

    let forward = ResponseEnvelope::success(
        "moveCharacter",
        event.client_id,
        "ok",
        json!({
            "characterId": moved.id,
            "posX": moved.position.x,
            "posY": moved.position.y,
            "posZ": moved.position.z,
            "rotZ": moved.position.rot_z,
        }),
    );
    chunk_sink.send(forward.to_string());
}

/// §4.7: the chunk peer's echo of a move, relayed back to the origin
/// client. Interest management (deciding which *other* clients should
/// also see this move) is the chunk server's job, not this gateway's
/// (§8 Non-goals) — this handler only closes the loop with the mover.
fn handle_move_character_client(event: &Event, caches: &Caches, client_sink: &dyn ClientSink) {
    let EventPayload::Character(moved) = &event.payload else {
        warn!(event_type = ?event.event_type, "moveCharacter echo with unexpected payload shape, dropping");
        return;
    };
    if caches.characters.contains(moved.id) {
        caches.characters.update_position(moved.id, moved.position);
    }
    let Some(socket) = resolve_socket(&caches.clients, event.client_id) else {
        warn!(client_id = event.client_id, "moveCharacter echo for unknown client, dropping");
        return;
    };
    let reply = ResponseEnvelope::success(
        "moveCharacter",
        event.client_id,
        "ok",
        json!({
            "characterId": moved.id,
            "posX": moved.position.x,
            "posY": moved.position.y,
            "posZ": moved.position.z,
            "rotZ": moved.position.rot_z,
        }),
    );
    client_sink.send(socket, reply.to_string());
}

/// §4.6/§4.9: `getSpawnZones` fills every zone up to capacity (a no-op for
/// zones already full) and replies with the resulting mob list across all
/// zones. Uses the thread's own `rand::rng()` — the spawn engine's RNG
/// parameter exists so tests can inject a seeded one, production callers
/// don't need to thread one through.
fn handle_spawn_mobs_in_zone(event: &Event, caches: &Caches, client_sink: &dyn ClientSink) {
    let Some(socket) = client_socket(event) else {
        warn!(client_id = event.client_id, "getSpawnZones with no origin socket, dropping");
        return;
    };

    let mut rng = rand::rng();
    for zone_id in caches.spawn_zones.zone_ids() {
        spawn::spawn_mobs_in_zone(zone_id, &caches.spawn_zones, &caches.mobs, &mut rng);
    }

    let zones: Vec<_> = caches
        .spawn_zones
        .get_all()
        .into_iter()
        .map(|zone| json!({"zoneId": zone.zone_id, "mobs": zone.spawned_mobs}))
        .collect();
    let reply = ResponseEnvelope::success("getSpawnZones", event.client_id, "ok", json!({"spawnZones": zones}));
    client_sink.send(socket, reply.to_string());
}

/// §4.7's `HandleDisconnect`: the frontend already enqueued a matching
/// `DisconnectClientChunk` alongside this one. This handler's share of
/// the work is purely local — evict the `Client`, flush its character
/// immediately rather than waiting for the next scheduler tick (§5), and
/// evict the character too so a stale cache entry can't outlive the
/// connection that owned it.
fn handle_disconnect_client(event: &Event, caches: &Caches, flusher: &dyn CharacterFlusher) {
    let Some(client) = caches.clients.remove(event.client_id) else {
        return;
    };
    if let Some(character) = caches.characters.remove(client.character_id) {
        if character.dirty {
            flusher.flush(character);
        }
    }
}

fn handle_disconnect_client_chunk(event: &Event, chunk_sink: &dyn ChunkSink) {
    let forward = ResponseEnvelope::success("disconnectClient", event.client_id, "ok", json!({}));
    chunk_sink.send(forward.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_common::{Character, Client, Position};
    use parking_lot::Mutex;
    use std::net::SocketAddr;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingClientSink {
        sent: Mutex<Vec<(SocketAddr, String)>>,
    }
    impl ClientSink for RecordingClientSink {
        fn send(&self, socket: SocketAddr, frame: String) {
            self.sent.lock().push((socket, frame));
        }
    }

    #[derive(Default)]
    struct RecordingChunkSink {
        sent: Mutex<Vec<String>>,
    }
    impl ChunkSink for RecordingChunkSink {
        fn send(&self, frame: String) {
            self.sent.lock().push(frame);
        }
    }

    struct StubLoader(Character);
    impl CharacterLoader for StubLoader {
        fn load_character(&self, _character_id: i64) -> Character {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct RecordingFlusher {
        flushed: Mutex<Vec<Character>>,
    }
    impl CharacterFlusher for RecordingFlusher {
        fn flush(&self, character: Character) {
            self.flushed.lock().push(character);
        }
    }

    fn socket() -> SocketAddr {
        "127.0.0.1:9000".parse().unwrap()
    }

    #[test]
    fn join_with_missing_hash_replies_auth_failed_and_does_not_forward() {
        let caches = Caches::default();
        let client_sink = RecordingClientSink::default();
        let chunk_sink = RecordingChunkSink::default();
        let loader = StubLoader(Character::default());
        let event = Event::new(
            EventType::JoinCharacterChunk,
            0,
            EventPayload::ClientData { client_id: 0, hash: String::new(), character_id: 1 },
            Some(socket()),
        );

        handle_join_character_chunk(&event, &caches, &client_sink, &chunk_sink, &loader);

        assert!(chunk_sink.sent.lock().is_empty());
        let sent = client_sink.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Authentication failed for user!"));
    }

    #[test]
    fn successful_join_caches_client_and_character_and_forwards_to_chunk() {
        let caches = Caches::default();
        let client_sink = RecordingClientSink::default();
        let chunk_sink = RecordingChunkSink::default();
        let loader = StubLoader(Character { id: 7, name: "Test".into(), ..Default::default() });
        let event = Event::new(
            EventType::JoinCharacterChunk,
            42,
            EventPayload::ClientData { client_id: 42, hash: "abc".into(), character_id: 7 },
            Some(socket()),
        );

        handle_join_character_chunk(&event, &caches, &client_sink, &chunk_sink, &loader);

        assert!(client_sink.sent.lock().is_empty());
        assert_eq!(chunk_sink.sent.lock().len(), 1);
        assert_eq!(caches.clients.get(42).unwrap().character_id, 7);
        assert_eq!(caches.characters.get(7).id, 7);
    }

    #[test]
    fn move_for_uncached_character_is_dropped() {
        let caches = Caches::default();
        let chunk_sink = RecordingChunkSink::default();
        let event = Event::new(
            EventType::MoveCharacterChunk,
            1,
            EventPayload::Character(Character { id: 99, position: Position::new(1.0, 2.0, 3.0, 0.0), ..Default::default() }),
            Some(socket()),
        );

        handle_move_character_chunk(&event, &caches, &chunk_sink);

        assert!(chunk_sink.sent.lock().is_empty());
    }

    #[test]
    fn move_for_cached_character_updates_position_and_forwards() {
        let caches = Caches::default();
        caches.characters.upsert(Character { id: 5, ..Default::default() });
        let chunk_sink = RecordingChunkSink::default();
        let event = Event::new(
            EventType::MoveCharacterChunk,
            1,
            EventPayload::Character(Character { id: 5, position: Position::new(9.0, 8.0, 7.0, 0.0), ..Default::default() }),
            Some(socket()),
        );

        handle_move_character_chunk(&event, &caches, &chunk_sink);

        assert_eq!(chunk_sink.sent.lock().len(), 1);
        let updated = caches.characters.get(5);
        assert!(updated.dirty);
        assert_eq!(updated.position, Position::new(9.0, 8.0, 7.0, 0.0));
    }

    #[test]
    fn disconnect_flushes_dirty_character_and_evicts_both_caches() {
        let caches = Caches::default();
        let client = Client::new(3, "h".into(), socket());
        caches.clients.upsert(Client { character_id: 11, ..client });
        caches.characters.upsert(Character { id: 11, dirty: true, ..Default::default() });
        let flusher = RecordingFlusher::default();

        let event = Event::new(EventType::DisconnectClient, 3, EventPayload::Empty, Some(socket()));
        handle_disconnect_client(&event, &caches, &flusher);

        assert!(caches.clients.get(3).is_none());
        assert_eq!(caches.characters.get(11).id, 0);
        assert_eq!(flusher.flushed.lock().len(), 1);
    }

    #[test]
    fn disconnect_does_not_flush_a_clean_character() {
        let caches = Caches::default();
        let client = Client::new(3, "h".into(), socket());
        caches.clients.upsert(Client { character_id: 11, ..client });
        caches.characters.upsert(Character { id: 11, dirty: false, ..Default::default() });
        let flusher = RecordingFlusher::default();

        let event = Event::new(EventType::DisconnectClient, 3, EventPayload::Empty, Some(socket()));
        handle_disconnect_client(&event, &caches, &flusher);

        assert!(flusher.flushed.lock().is_empty());
    }

    #[test]
    fn ping_replies_pong_to_origin_socket() {
        let client_sink = RecordingClientSink::default();
        let event = Event::new(EventType::PingClient, 1, EventPayload::Empty, Some(socket()));
        handle_ping_client(&event, &client_sink);
        let sent = client_sink.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, socket());
        assert!(sent[0].1.contains("pong"));
    }
}
