//! Engine.IO and Socket.IO text packet codec.

use crate::error::ChannelError;
use serde::Deserialize;
use serde_json::Value;

/// Default Socket.IO namespace.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Engine.IO open handshake payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine session id.
    pub sid: String,
    /// Interval between server pings in milliseconds.
    pub ping_interval: u64,
    /// Time the server waits for a pong in milliseconds.
    pub ping_timeout: u64,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl Handshake {
    /// Longest silence tolerated before the session counts as lost.
    #[must_use]
    pub fn heartbeat_window_ms(&self) -> u64 {
        self.ping_interval + self.ping_timeout
    }
}

/// Engine.IO packet (transport layer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    /// Decodes one WebSocket text frame.
    ///
    /// # Errors
    /// Returns an error on an empty frame, an unknown packet type or a bad
    /// handshake.
    pub fn decode(frame: &str) -> Result<Self, ChannelError> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ChannelError::Malformed("empty engine.io frame".to_string()))?;
        let data = chars.as_str();

        match kind {
            '0' => serde_json::from_str(data)
                .map(Self::Open)
                .map_err(|e| ChannelError::Handshake(e.to_string())),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(data.to_string())),
            '3' => Ok(Self::Pong(data.to_string())),
            '4' => Ok(Self::Message(data.to_string())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(ChannelError::Malformed(format!(
                "unknown engine.io packet type {other:?}"
            ))),
        }
    }

    /// Encodes the packet as a WebSocket text frame.
    ///
    /// The handshake is server-to-client only and encodes as a bare `0`.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Open(_) => "0".to_string(),
            Self::Close => "1".to_string(),
            Self::Ping(data) => format!("2{data}"),
            Self::Pong(data) => format!("3{data}"),
            Self::Message(data) => format!("4{data}"),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        }
    }
}

/// Socket.IO packet carried inside an Engine.IO message.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack_id: Option<u64>,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
    /// Binary event or ack; attachments arrive as separate frames.
    Binary,
}

impl SocketPacket {
    /// Decodes the payload of an Engine.IO message.
    ///
    /// # Errors
    /// Returns an error if the packet type is unknown, the ack id overflows,
    /// the JSON is invalid or an event has no name.
    pub fn decode(raw: &str) -> Result<Self, ChannelError> {
        let mut chars = raw.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ChannelError::Malformed("empty socket.io packet".to_string()))?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Ok(Self::Binary);
        }

        let namespace = if rest.starts_with('/') {
            let end = rest.find(',').unwrap_or(rest.len());
            let namespace = rest[..end].to_string();
            rest = rest.get(end + 1..).unwrap_or("");
            namespace
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        let ack_id = if digits > 0 {
            Some(
                rest[..digits]
                    .parse::<u64>()
                    .map_err(|e| ChannelError::Malformed(format!("bad ack id: {e}")))?,
            )
        } else {
            None
        };
        rest = &rest[digits..];

        let data: Option<Value> = if rest.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(rest)
                    .map_err(|e| ChannelError::Malformed(format!("bad packet data: {e}")))?,
            )
        };

        match kind {
            '0' => Ok(Self::Connect { namespace, data }),
            '1' => Ok(Self::Disconnect { namespace }),
            '2' => {
                let mut args = match data {
                    Some(Value::Array(args)) => args,
                    other => {
                        return Err(ChannelError::Malformed(format!(
                            "event data must be an array, got {other:?}"
                        )));
                    }
                };
                if args.is_empty() {
                    return Err(ChannelError::Malformed("event without a name".to_string()));
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(ChannelError::Malformed(format!(
                            "event name must be a string, got {other}"
                        )));
                    }
                };
                Ok(Self::Event {
                    namespace,
                    ack_id,
                    name,
                    args,
                })
            }
            '3' => {
                let args = match data {
                    Some(Value::Array(args)) => args,
                    _ => Vec::new(),
                };
                Ok(Self::Ack {
                    namespace,
                    ack_id,
                    args,
                })
            }
            '4' => Ok(Self::ConnectError { namespace, data }),
            other => Err(ChannelError::Malformed(format!(
                "unknown socket.io packet type {other:?}"
            ))),
        }
    }

    /// Encodes a client-originated packet (connect or disconnect).
    ///
    /// Returns `None` for packet kinds this client never sends.
    #[must_use]
    pub fn encode(&self) -> Option<String> {
        let (kind, namespace) = match self {
            Self::Connect { namespace, .. } => ('0', namespace),
            Self::Disconnect { namespace } => ('1', namespace),
            _ => return None,
        };

        if namespace == DEFAULT_NAMESPACE {
            Some(kind.to_string())
        } else {
            Some(format!("{kind}{namespace},"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open_handshake() {
        let packet = EnginePacket::decode(
            r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#,
        )
        .unwrap();

        match packet {
            EnginePacket::Open(handshake) => {
                assert_eq!(handshake.sid, "lv_VI97HAXpY6yYWAAAC");
                assert_eq!(handshake.heartbeat_window_ms(), 45000);
                assert_eq!(handshake.max_payload, Some(1_000_000));
            }
            other => panic!("unexpected packet {other:?}"),
        }
    }

    #[test]
    fn test_ping_pong_round() {
        assert_eq!(
            EnginePacket::decode("2").unwrap(),
            EnginePacket::Ping(String::new())
        );
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
        assert_eq!(
            EnginePacket::decode("2probe").unwrap(),
            EnginePacket::Ping("probe".to_string())
        );
    }

    #[test]
    fn test_unknown_engine_packet() {
        assert!(EnginePacket::decode("9").is_err());
        assert!(EnginePacket::decode("").is_err());
        assert!(matches!(
            EnginePacket::decode("0{not json"),
            Err(ChannelError::Handshake(_))
        ));
    }

    #[test]
    fn test_decode_event() {
        let packet = SocketPacket::decode(r#"2["new_tx",{"from":"A","to":"B","message":"x1"}]"#)
            .unwrap();

        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/".to_string(),
                ack_id: None,
                name: "new_tx".to_string(),
                args: vec![json!({"from": "A", "to": "B", "message": "x1"})],
            }
        );
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack() {
        let packet = SocketPacket::decode(r#"2/chat,17["peers",[]]"#).unwrap();

        match packet {
            SocketPacket::Event {
                namespace,
                ack_id,
                name,
                args,
            } => {
                assert_eq!(namespace, "/chat");
                assert_eq!(ack_id, Some(17));
                assert_eq!(name, "peers");
                assert_eq!(args, vec![json!([])]);
            }
            other => panic!("unexpected packet {other:?}"),
        }
    }

    #[test]
    fn test_decode_connect_ack() {
        let packet = SocketPacket::decode(r#"0{"sid":"abc"}"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Connect {
                namespace: "/".to_string(),
                data: Some(json!({"sid": "abc"})),
            }
        );
    }

    #[test]
    fn test_decode_connect_error() {
        let packet = SocketPacket::decode(r#"4{"message":"Not authorized"}"#).unwrap();
        assert!(matches!(packet, SocketPacket::ConnectError { .. }));
    }

    #[test]
    fn test_event_must_have_string_name() {
        assert!(SocketPacket::decode("2[]").is_err());
        assert!(SocketPacket::decode("2[42]").is_err());
        assert!(SocketPacket::decode(r#"2{"a":1}"#).is_err());
    }

    #[test]
    fn test_binary_packets_are_skipped() {
        assert_eq!(
            SocketPacket::decode(r#"51-["file",{"_placeholder":true,"num":0}]"#).unwrap(),
            SocketPacket::Binary
        );
    }

    #[test]
    fn test_encode_connect() {
        let root = SocketPacket::Connect {
            namespace: "/".to_string(),
            data: None,
        };
        let chat = SocketPacket::Disconnect {
            namespace: "/chat".to_string(),
        };

        assert_eq!(root.encode().as_deref(), Some("0"));
        assert_eq!(chat.encode().as_deref(), Some("1/chat,"));
        assert_eq!(SocketPacket::Binary.encode(), None);
    }
}
