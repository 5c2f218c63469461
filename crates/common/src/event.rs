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

use std::net::SocketAddr;

use crate::character::Character;
use crate::chunk::Chunk;
use crate::position::Position;
use crate::spawn_zone::SpawnZone;

/// Internal event kinds routed through the three `EventQueue`s. These are
/// the Rust-side names for the wire event-type strings in §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    PingClient,
    JoinCharacterChunk,
    JoinCharacterClient,
    GetConnectedCharactersChunk,
    GetConnectedCharactersClient,
    MoveCharacterChunk,
    MoveCharacterClient,
    SpawnMobsInZone,
    DisconnectClient,
    DisconnectClientChunk,
}

impl EventType {
    /// Parse a wire `eventType` string plus a `chunk: bool` flag (is this
    /// frame arriving from the chunk peer, or from a client?) into the
    /// internal event kind. Unknown strings are a `ProtocolError` (§7):
    /// log and drop, connection stays open.
    pub fn from_wire(event_type: &str, from_chunk: bool) -> Option<Self> {
        use EventType::*;
        Some(match (event_type, from_chunk) {
            ("pingClient", _) => PingClient,
            ("joinGame", false) => JoinCharacterChunk,
            ("joinGame", true) => JoinCharacterClient,
            ("getConnectedCharacters", false) => GetConnectedCharactersChunk,
            ("getConnectedCharacters", true) => GetConnectedCharactersClient,
            ("moveCharacter", false) => MoveCharacterChunk,
            ("moveCharacter", true) => MoveCharacterClient,
            ("getSpawnZones", _) => SpawnMobsInZone,
            ("disconnectClient", false) => DisconnectClient,
            ("disconnectClient", true) => DisconnectClientChunk,
            _ => return None,
        })
    }

    /// Which of the three priority queues this event kind is routed to.
    pub fn queue_kind(&self) -> QueueKind {
        match self {
            EventType::PingClient => QueueKind::Ping,
            EventType::JoinCharacterClient
            | EventType::GetConnectedCharactersClient
            | EventType::MoveCharacterClient
            | EventType::SpawnMobsInZone
            | EventType::DisconnectClient => QueueKind::ClientBound,
            EventType::JoinCharacterChunk
            | EventType::GetConnectedCharactersChunk
            | EventType::MoveCharacterChunk
            | EventType::DisconnectClientChunk => QueueKind::ChunkBound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    ClientBound,
    ChunkBound,
    Ping,
}

/// A tagged union over every shape an event's body can carry. Events
/// carry copies across queue boundaries so a handler running after a
/// disconnect never dereferences a freed entry (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    ClientData { client_id: i64, hash: String, character_id: i64 },
    Position(Position),
    Character(Character),
    Chunk(Chunk),
    SpawnZone(SpawnZone),
    CharacterList(Vec<Character>),
    Empty,
}

impl Default for EventPayload {
    fn default() -> Self {
        EventPayload::Empty
    }
}

/// An internal routed event. `socket` is the originating connection's
/// peer address, used to resolve where a response should be written back
/// to without re-looking up the client cache in the hot path.
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    pub client_id: i64,
    pub payload: EventPayload,
    pub socket: Option<SocketAddr>,
}

impl Event {
    pub fn new(event_type: EventType, client_id: i64, payload: EventPayload, socket: Option<SocketAddr>) -> Self {
        Self { event_type, client_id, payload, socket }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_type_is_none() {
        assert!(EventType::from_wire("doSomethingWeird", false).is_none());
    }

    #[test]
    fn join_game_direction_depends_on_origin() {
        assert_eq!(EventType::from_wire("joinGame", false), Some(EventType::JoinCharacterChunk));
        assert_eq!(EventType::from_wire("joinGame", true), Some(EventType::JoinCharacterClient));
    }

    #[test]
    fn ping_routes_to_ping_queue() {
        assert_eq!(EventType::PingClient.queue_kind(), QueueKind::Ping);
    }
}
