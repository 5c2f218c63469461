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

use chrono::Local;
use serde_json::{json, Value};

pub const PROTOCOL_VERSION: &str = "1.0";

/// A response envelope per §6/§4.4: `header.status`, `header.timestamp`
/// (ISO-local with milliseconds), `header.version`, and `header.eventType`
/// echoed from the triggering request, plus an arbitrary `body`.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub event_type: String,
    pub client_id: i64,
    pub status: Status,
    pub message: String,
    pub body: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

impl Status {
    fn as_str(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
        }
    }
}

impl ResponseEnvelope {
    pub fn success(event_type: impl Into<String>, client_id: i64, message: impl Into<String>, body: Value) -> Self {
        Self {
            event_type: event_type.into(),
            client_id,
            status: Status::Success,
            message: message.into(),
            body,
        }
    }

    pub fn error(event_type: impl Into<String>, client_id: i64, message: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            client_id,
            status: Status::Error,
            message: message.into(),
            body: json!({}),
        }
    }

    /// The "Authentication failed for user!" error reused verbatim from
    /// the original `EventHandler`'s auth-failure response text.
    pub fn auth_failed(event_type: impl Into<String>, client_id: i64) -> Self {
        Self::error(event_type, client_id, "Authentication failed for user!")
    }

    pub fn to_json(&self) -> Value {
        json!({
            "header": {
                "eventType": self.event_type,
                "clientId": self.client_id,
                "status": self.status.as_str(),
                "message": self.message,
                "timestamp": Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
                "version": PROTOCOL_VERSION,
            },
            "body": self.body,
        })
    }

    pub fn to_string(&self) -> String {
        self.to_json().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_echoes_event_type_and_version() {
        let env = ResponseEnvelope::success("joinGame", 42, "ok", json!({"characterId": 7}));
        let v = env.to_json();
        assert_eq!(v["header"]["eventType"], "joinGame");
        assert_eq!(v["header"]["clientId"], 42);
        assert_eq!(v["header"]["status"], "success");
        assert_eq!(v["header"]["version"], "1.0");
        assert_eq!(v["body"]["characterId"], 7);
    }

    #[test]
    fn auth_failed_reuses_original_message_text() {
        let env = ResponseEnvelope::auth_failed("joinGame", 0);
        assert_eq!(env.message, "Authentication failed for user!");
        assert_eq!(env.to_json()["header"]["status"], "error");
    }
}
