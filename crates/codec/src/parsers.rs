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

//! Tolerant, independent field parsers over a raw frame (§4.4).
//!
//! Each function re-parses `raw` into a fresh `serde_json::Value` and pulls
//! out only the fields it cares about. A missing or mistyped field yields
//! that field's zero value rather than an error — callers never need to
//! handle a parse failure, mirroring the original `JSONParser`'s behavior
//! of never throwing on a malformed or partial body. Only a completely
//! unparsable byte string (not valid JSON at all) yields an empty `Value`.

use gateway_common::Position;
use serde_json::Value;

const NULL: Value = Value::Null;

fn parse_or_null(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or(Value::Null)
}

fn body(v: &Value) -> &Value {
    v.get("body").unwrap_or(&NULL)
}

fn header(v: &Value) -> &Value {
    v.get("header").unwrap_or(&NULL)
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn i64_field(v: &Value, key: &str) -> i64 {
    v.get(key).and_then(Value::as_i64).unwrap_or_default()
}

fn f32_field(v: &Value, key: &str) -> f32 {
    v.get(key).and_then(Value::as_f64).unwrap_or_default() as f32
}

pub fn parse_event_type(raw: &str) -> String {
    str_field(header(&parse_or_null(raw)), "eventType")
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientData {
    pub client_id: i64,
    pub hash: String,
}

pub fn parse_client_data(raw: &str) -> ClientData {
    let v = parse_or_null(raw);
    let h = header(&v);
    ClientData { client_id: i64_field(h, "clientId"), hash: str_field(h, "hash") }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterData {
    pub character_id: i64,
    pub level: i32,
    pub exp: i64,
    pub hp: i32,
    pub mp: i32,
    pub name: String,
    pub class: String,
    pub race: String,
}

pub fn parse_character_data(raw: &str) -> CharacterData {
    let v = parse_or_null(raw);
    let b = body(&v);
    CharacterData {
        character_id: i64_field(b, "characterId"),
        level: i64_field(b, "characterLevel") as i32,
        exp: i64_field(b, "characterExp"),
        hp: i64_field(b, "characterCurrentHealth") as i32,
        mp: i64_field(b, "characterCurrentMana") as i32,
        name: str_field(b, "characterName"),
        class: str_field(b, "characterClass"),
        race: str_field(b, "characterRace"),
    }
}

pub fn parse_position_data(raw: &str) -> Position {
    let v = parse_or_null(raw);
    let b = body(&v);
    Position {
        x: f32_field(b, "posX"),
        y: f32_field(b, "posY"),
        z: f32_field(b, "posZ"),
        rot_z: f32_field(b, "rotZ"),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageMeta {
    pub status: String,
    pub message: String,
}

pub fn parse_message_meta(raw: &str) -> MessageMeta {
    let v = parse_or_null(raw);
    let h = header(&v);
    MessageMeta { status: str_field(h, "status"), message: str_field(h, "message") }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkHandshake {
    pub chunk_id: i64,
    pub ip: String,
    pub port: u16,
}

pub fn parse_chunk_handshake(raw: &str) -> ChunkHandshake {
    let v = parse_or_null(raw);
    let b = body(&v);
    ChunkHandshake {
        chunk_id: i64_field(b, "chunkId"),
        ip: str_field(b, "ip"),
        port: i64_field(b, "port") as u16,
    }
}

/// Returns the raw `charactersList` array untouched, as the original does,
/// so callers decide how to interpret individual entries.
pub fn parse_character_list(raw: &str) -> Vec<Value> {
    let v = parse_or_null(raw);
    body(&v)
        .get("charactersList")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_rather_than_fail() {
        let cd = parse_client_data("{}");
        assert_eq!(cd, ClientData::default());
    }

    #[test]
    fn garbage_input_defaults_rather_than_panics() {
        assert_eq!(parse_event_type("not json at all"), "");
        assert_eq!(parse_position_data("{{{"), Position::default());
    }

    #[test]
    fn mistyped_field_is_treated_as_absent() {
        let cd = parse_character_data(r#"{"body":{"characterId":"not-a-number"}}"#);
        assert_eq!(cd.character_id, 0);
    }

    #[test]
    fn happy_path_extracts_all_fields() {
        let raw = r#"{"header":{"eventType":"joinGame","clientId":42,"hash":"abc"},
                       "body":{"characterId":7,"posX":1.0,"posY":2.0,"posZ":3.0}}"#;
        assert_eq!(parse_event_type(raw), "joinGame");
        assert_eq!(parse_client_data(raw), ClientData { client_id: 42, hash: "abc".into() });
        let pos = parse_position_data(raw);
        assert_eq!((pos.x, pos.y, pos.z), (1.0, 2.0, 3.0));
    }

    #[test]
    fn character_list_returns_raw_array() {
        let raw = r#"{"body":{"charactersList":[{"characterId":1},{"characterId":2}]}}"#;
        let list = parse_character_list(raw);
        assert_eq!(list.len(), 2);
    }
}
