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

//! Turns one raw frame (already stripped of its delimiter by
//! `GatewayCodec`) into a typed `Event` and pushes it onto the right queue
//! (§4.4, §4.7). Shared by the client frontend and the chunk peer read
//! loop in `gateway-daemon` — both just hand it a frame, a `from_chunk`
//! flag, and the originating socket (`None` for frames arriving over the
//! single chunk link, which isn't addressed per-client).

use std::net::SocketAddr;

use gateway_codec::{parse_character_data, parse_client_data, parse_event_type, parse_position_data};
use gateway_common::{Character, Event, EventPayload, EventType};
use tracing::warn;

use crate::queue::EventQueues;

/// Parses `raw`, builds the matching `Event`, and pushes it onto the
/// queue its `EventType::queue_kind()` selects. Returns `false` for an
/// unrecognised event type (`ProtocolError`, §7): the caller logs nothing
/// further, the frame is dropped, the connection stays open.
pub fn route_frame(raw: &str, from_chunk: bool, socket: Option<SocketAddr>, queues: &EventQueues) -> bool {
    let wire_type = parse_event_type(raw);
    let Some(event_type) = EventType::from_wire(&wire_type, from_chunk) else {
        warn!(event_type = %wire_type, from_chunk, "unrecognised event type, dropping frame");
        return false;
    };

    let (client_id, payload) = build_payload(event_type, raw);
    let event = Event::new(event_type, client_id, payload, socket);
    dispatch_to_queue(event, queues);
    true
}

fn dispatch_to_queue(event: Event, queues: &EventQueues) {
    use gateway_common::event::QueueKind;
    match event.event_type.queue_kind() {
        QueueKind::ClientBound => queues.client_bound.push(event),
        QueueKind::ChunkBound => queues.chunk_bound.push(event),
        QueueKind::Ping => queues.ping.push(event),
    }
}

fn build_payload(event_type: EventType, raw: &str) -> (i64, EventPayload) {
    match event_type {
        EventType::PingClient => {
            let client_data = parse_client_data(raw);
            (client_data.client_id, EventPayload::Empty)
        }
        EventType::JoinCharacterChunk | EventType::JoinCharacterClient => {
            let client_data = parse_client_data(raw);
            let character_data = parse_character_data(raw);
            (
                client_data.client_id,
                EventPayload::ClientData {
                    client_id: client_data.client_id,
                    hash: client_data.hash,
                    character_id: character_data.character_id,
                },
            )
        }
        EventType::GetConnectedCharactersChunk | EventType::GetConnectedCharactersClient => {
            let client_data = parse_client_data(raw);
            (client_data.client_id, EventPayload::Empty)
        }
        EventType::MoveCharacterChunk | EventType::MoveCharacterClient => {
            let client_data = parse_client_data(raw);
            let character_data = parse_character_data(raw);
            let position = parse_position_data(raw);
            let character = Character { id: character_data.character_id, position, ..Default::default() };
            (client_data.client_id, EventPayload::Character(character))
        }
        EventType::SpawnMobsInZone => {
            let client_data = parse_client_data(raw);
            (client_data.client_id, EventPayload::Empty)
        }
        EventType::DisconnectClient | EventType::DisconnectClientChunk => {
            let client_data = parse_client_data(raw);
            (client_data.client_id, EventPayload::Empty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join_frame(client_id: i64, character_id: i64) -> String {
        format!(
            r#"{{"header":{{"eventType":"joinGame","clientId":{client_id},"hash":"h"}},
                "body":{{"characterId":{character_id}}}}}"#
        )
    }

    #[test]
    fn unknown_event_type_is_dropped() {
        let queues = EventQueues::new();
        let routed = route_frame(r#"{"header":{"eventType":"doWizardry"}}"#, false, None, &queues);
        assert!(!routed);
        assert!(queues.client_bound.is_empty());
        assert!(queues.chunk_bound.is_empty());
    }

    #[test]
    fn join_from_client_lands_on_chunk_bound_queue() {
        let queues = EventQueues::new();
        let routed = route_frame(&join_frame(9, 3), false, None, &queues);
        assert!(routed);
        assert_eq!(queues.chunk_bound.len(), 1);
        assert!(queues.client_bound.is_empty());
    }

    #[test]
    fn join_echoed_from_chunk_lands_on_client_bound_queue() {
        let queues = EventQueues::new();
        let routed = route_frame(&join_frame(9, 3), true, None, &queues);
        assert!(routed);
        assert_eq!(queues.client_bound.len(), 1);
        assert!(queues.chunk_bound.is_empty());
    }

    #[test]
    fn ping_lands_on_ping_queue() {
        let queues = EventQueues::new();
        let routed = route_frame(r#"{"header":{"eventType":"pingClient","clientId":1}}"#, false, None, &queues);
        assert!(routed);
        assert_eq!(queues.ping.len(), 1);
    }
}
