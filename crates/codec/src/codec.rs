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

//! Frames both the client and chunk links on the four-byte delimiter
//! `\r\n\r\n` (§4.4/§6). A per-connection accumulator holds bytes between
//! reads so one `read()` can yield zero, one, or several complete frames.

use bytes::{Buf, BytesMut};
use std::fmt;
use std::io;
use tokio_util::codec::{Decoder, Encoder};

const DELIMITER: &[u8] = b"\r\n\r\n";

#[derive(Debug)]
pub enum GatewayCodecError {
    Utf8(std::str::Utf8Error),
    Io(io::Error),
}

impl fmt::Display for GatewayCodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayCodecError::Utf8(e) => write!(f, "UTF-8 error: {e}"),
            GatewayCodecError::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for GatewayCodecError {}

impl From<io::Error> for GatewayCodecError {
    fn from(e: io::Error) -> Self {
        GatewayCodecError::Io(e)
    }
}

impl From<std::str::Utf8Error> for GatewayCodecError {
    fn from(e: std::str::Utf8Error) -> Self {
        GatewayCodecError::Utf8(e)
    }
}

/// A frame bound for a client socket, written with a trailing `\r\n\r\n`.
#[derive(Debug, Clone)]
pub struct ClientFrame(pub String);

/// A frame bound for the chunk peer socket, written with a trailing `\n`
/// (the legacy chunk-link terminator).
#[derive(Debug, Clone)]
pub struct ChunkFrame(pub String);

/// Decodes `\r\n\r\n`-delimited frames; encodes either a `ClientFrame`
/// (trailing `\r\n\r\n`) or a `ChunkFrame` (trailing `\n`) depending on
/// which link the codec is wrapping.
#[derive(Debug, Default)]
pub struct GatewayCodec {
    next_index: usize,
}

impl GatewayCodec {
    pub fn new() -> Self {
        Self { next_index: 0 }
    }
}

impl Decoder for GatewayCodec {
    type Item = String;
    type Error = GatewayCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.len() < DELIMITER.len() {
            return Ok(None);
        }

        let search_from = self.next_index;
        let Some(offset) = buf[search_from..]
            .windows(DELIMITER.len())
            .position(|w| w == DELIMITER)
        else {
            self.next_index = buf.len().saturating_sub(DELIMITER.len() - 1).max(search_from);
            return Ok(None);
        };

        let frame_end = search_from + offset;
        let frame = buf.split_to(frame_end);
        buf.advance(DELIMITER.len());
        self.next_index = 0;

        let text = std::str::from_utf8(&frame)?.to_string();
        Ok(Some(text))
    }
}

impl Encoder<ClientFrame> for GatewayCodec {
    type Error = GatewayCodecError;

    fn encode(&mut self, frame: ClientFrame, buf: &mut BytesMut) -> Result<(), Self::Error> {
        buf.extend_from_slice(frame.0.as_bytes());
        buf.extend_from_slice(b"\r\n\r\n");
        Ok(())
    }
}

impl Encoder<ChunkFrame> for GatewayCodec {
    type Error = GatewayCodecError;

    fn encode(&mut self, frame: ChunkFrame, buf: &mut BytesMut) -> Result<(), Self::Error> {
        buf.extend_from_slice(frame.0.as_bytes());
        buf.extend_from_slice(b"\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_frame() {
        let mut codec = GatewayCodec::new();
        let mut buf = BytesMut::from("{\"a\":1}\r\n\r\n");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, "{\"a\":1}");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decodes_multiple_frames_in_one_read() {
        let mut codec = GatewayCodec::new();
        let mut buf = BytesMut::from("one\r\n\r\ntwo\r\n\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "one");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "two");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn partial_frame_waits_for_more_data() {
        let mut codec = GatewayCodec::new();
        let mut buf = BytesMut::from("partial");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"\r\n\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "partial");
    }

    #[test]
    fn delimiter_split_across_two_reads() {
        let mut codec = GatewayCodec::new();
        let mut buf = BytesMut::from("frame\r\n");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "frame");
    }

    #[test]
    fn encodes_client_frame_with_crlfcrlf() {
        let mut codec = GatewayCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(ClientFrame("hi".into()), &mut buf).unwrap();
        assert_eq!(buf, "hi\r\n\r\n");
    }

    #[test]
    fn encodes_chunk_frame_with_newline() {
        let mut codec = GatewayCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(ChunkFrame("hi".into()), &mut buf).unwrap();
        assert_eq!(buf, "hi\n");
    }
}
