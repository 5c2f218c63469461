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

//! The wire envelope, the `\r\n\r\n`-framed `tokio_util` codec, and the
//! tolerant per-field JSON parsers (§4.4, §6).

mod codec;
mod envelope;
mod parsers;

pub use codec::{ChunkFrame, ClientFrame, GatewayCodec, GatewayCodecError};
pub use envelope::{ResponseEnvelope, Status, PROTOCOL_VERSION};
pub use parsers::{
    parse_character_data, parse_character_list, parse_chunk_handshake, parse_client_data,
    parse_event_type, parse_message_meta, parse_position_data, CharacterData, ChunkHandshake,
    ClientData, MessageMeta,
};
