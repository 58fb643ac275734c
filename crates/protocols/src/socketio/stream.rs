//! WebSocket session speaking Socket.IO to the node.

use super::packet::{DEFAULT_NAMESPACE, EnginePacket, Handshake, SocketPacket};
use crate::error::ChannelError;
use crate::events::{EventStream, NodeEvent};
use crate::http::DEFAULT_NODE_URL;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Engine.IO protocol revision requested from the server.
pub const ENGINE_IO_VERSION: u8 = 4;

/// Configuration for the Socket.IO channel.
#[derive(Debug, Clone)]
pub struct SocketIoConfig {
    /// Base URL of the node (http, https, ws or wss).
    pub base_url: String,
    /// Socket.IO namespace.
    pub namespace: String,
    /// Time allowed for the open and connect handshakes in seconds.
    pub handshake_timeout_secs: u64,
}

impl Default for SocketIoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NODE_URL.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            handshake_timeout_secs: 10,
        }
    }
}

impl SocketIoConfig {
    /// Creates a configuration for the given node on the default namespace.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Builds the WebSocket endpoint for the node.
    ///
    /// # Errors
    /// Returns an error if the URL does not parse or uses an unknown scheme.
    pub fn endpoint(&self) -> Result<Url, ChannelError> {
        let mut url = Url::parse(&self.base_url)?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(ChannelError::UnsupportedScheme(other.to_string())),
        };
        url.set_scheme(scheme)
            .map_err(|()| ChannelError::UnsupportedScheme(scheme.to_string()))?;
        url.set_path("/socket.io/");
        url.set_query(Some(&format!(
            "EIO={ENGINE_IO_VERSION}&transport=websocket"
        )));

        Ok(url)
    }
}

/// What one WebSocket frame meant for the session.
enum Frame {
    Open(Handshake),
    NamespaceConnected,
    Event(NodeEvent),
    Closed,
    Skip,
}

/// Socket.IO event stream over a WebSocket connection.
pub struct SocketIoStream {
    /// Configuration.
    config: SocketIoConfig,
    /// Live socket, if connected.
    socket: Option<WsStream>,
    /// Engine handshake of the live session.
    handshake: Option<Handshake>,
    /// Events received before the namespace connect completed.
    backlog: VecDeque<NodeEvent>,
}

impl SocketIoStream {
    /// Creates an unconnected stream.
    #[must_use]
    pub fn new(config: SocketIoConfig) -> Self {
        Self {
            config,
            socket: None,
            handshake: None,
            backlog: VecDeque::new(),
        }
    }

    /// Checks if a session is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    /// Returns the handshake of the live session.
    #[must_use]
    pub fn handshake(&self) -> Option<&Handshake> {
        self.handshake.as_ref()
    }

    async fn send_packet(socket: &mut WsStream, packet: &SocketPacket) -> Result<(), ChannelError> {
        if let Some(payload) = packet.encode() {
            socket
                .send(Message::Text(EnginePacket::Message(payload).encode()))
                .await?;
        }
        Ok(())
    }

    /// Reads one frame, answering pings on the way.
    async fn next_frame(
        socket: &mut WsStream,
        namespace: &str,
        window: Option<Duration>,
    ) -> Result<Frame, ChannelError> {
        let next = match window {
            Some(window) => tokio::time::timeout(window, socket.next())
                .await
                .map_err(|_| ChannelError::HeartbeatTimeout(window.as_millis() as u64))?,
            None => socket.next().await,
        };

        let text = match next {
            None => return Ok(Frame::Closed),
            Some(message) => match message? {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    debug!(frame = ?frame, "Node closed the WebSocket");
                    return Ok(Frame::Closed);
                }
                _ => return Ok(Frame::Skip),
            },
        };

        let packet = match EnginePacket::decode(&text) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "Dropping engine.io frame");
                return Ok(Frame::Skip);
            }
        };

        match packet {
            EnginePacket::Open(handshake) => Ok(Frame::Open(handshake)),
            EnginePacket::Ping(data) => {
                socket
                    .send(Message::Text(EnginePacket::Pong(data).encode()))
                    .await?;
                Ok(Frame::Skip)
            }
            EnginePacket::Close => Ok(Frame::Closed),
            EnginePacket::Message(payload) => Self::socket_frame(&payload, namespace),
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => Ok(Frame::Skip),
        }
    }

    fn socket_frame(payload: &str, namespace: &str) -> Result<Frame, ChannelError> {
        let packet = match SocketPacket::decode(payload) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "Dropping socket.io packet");
                return Ok(Frame::Skip);
            }
        };

        match packet {
            SocketPacket::Connect { namespace: ns, .. } if ns == namespace => {
                Ok(Frame::NamespaceConnected)
            }
            SocketPacket::ConnectError { namespace: ns, data } if ns == namespace => {
                Err(ChannelError::ConnectRejected {
                    namespace: ns,
                    reason: data.map(|d| d.to_string()).unwrap_or_default(),
                })
            }
            SocketPacket::Disconnect { namespace: ns } if ns == namespace => Ok(Frame::Closed),
            SocketPacket::Event {
                namespace: ns,
                name,
                mut args,
                ..
            } if ns == namespace => {
                let payload = if args.is_empty() {
                    Value::Null
                } else {
                    args.swap_remove(0)
                };
                match NodeEvent::decode(&name, payload) {
                    Ok(Some(event)) => Ok(Frame::Event(event)),
                    Ok(None) => {
                        debug!(event = %name, "Ignoring unhandled event");
                        Ok(Frame::Skip)
                    }
                    Err(e) => {
                        warn!(event = %name, error = %e, "Dropping malformed event payload");
                        Ok(Frame::Skip)
                    }
                }
            }
            _ => Ok(Frame::Skip),
        }
    }
}

#[async_trait]
impl EventStream for SocketIoStream {
    async fn connect(&mut self) -> Result<(), ChannelError> {
        self.close().await?;

        let endpoint = self.config.endpoint()?;
        info!(endpoint = %endpoint, "Connecting push channel");

        let (mut socket, _response) = connect_async(endpoint.as_str()).await?;
        let timeout = Some(Duration::from_secs(self.config.handshake_timeout_secs));
        let namespace = self.config.namespace.clone();

        let handshake = loop {
            match Self::next_frame(&mut socket, &namespace, timeout).await? {
                Frame::Open(handshake) => break handshake,
                Frame::Closed => {
                    return Err(ChannelError::Handshake(
                        "closed before engine.io open".to_string(),
                    ));
                }
                _ => {}
            }
        };

        Self::send_packet(
            &mut socket,
            &SocketPacket::Connect {
                namespace: namespace.clone(),
                data: None,
            },
        )
        .await?;

        loop {
            match Self::next_frame(&mut socket, &namespace, timeout).await? {
                Frame::NamespaceConnected => break,
                Frame::Event(event) => self.backlog.push_back(event),
                Frame::Closed => {
                    return Err(ChannelError::Handshake(
                        "closed before namespace connect".to_string(),
                    ));
                }
                _ => {}
            }
        }

        info!(
            sid = %handshake.sid,
            ping_interval_ms = handshake.ping_interval,
            namespace = %namespace,
            "Push channel connected"
        );

        self.handshake = Some(handshake);
        self.socket = Some(socket);
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<NodeEvent>, ChannelError> {
        if let Some(event) = self.backlog.pop_front() {
            return Ok(Some(event));
        }

        let window = self
            .handshake
            .as_ref()
            .map(|h| Duration::from_millis(h.heartbeat_window_ms()));

        let result = loop {
            let Some(socket) = self.socket.as_mut() else {
                return Err(ChannelError::NotConnected);
            };

            match Self::next_frame(socket, &self.config.namespace, window).await {
                Ok(Frame::Event(event)) => break Ok(Some(event)),
                Ok(Frame::Closed) => break Ok(None),
                Ok(_) => continue,
                Err(e) => break Err(e),
            }
        };

        if !matches!(result, Ok(Some(_))) {
            self.socket = None;
            self.handshake = None;
        }
        result
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.handshake = None;
        self.backlog.clear();

        let Some(mut socket) = self.socket.take() else {
            return Ok(());
        };

        let disconnect = SocketPacket::Disconnect {
            namespace: self.config.namespace.clone(),
        };
        if let Err(e) = Self::send_packet(&mut socket, &disconnect).await {
            debug!(error = %e, "Disconnect packet not delivered");
        }

        match socket.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {}
            Err(e) => return Err(e.into()),
        }

        info!("Push channel closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeview_domain::entities::{Peer, Transaction};
    use tokio::net::TcpListener;

    #[test]
    fn test_endpoint_from_http_url() {
        let endpoint = SocketIoConfig::new("http://127.0.0.1:5000").endpoint().unwrap();
        assert_eq!(
            endpoint.as_str(),
            "ws://127.0.0.1:5000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_endpoint_from_https_url() {
        let endpoint = SocketIoConfig::new("https://node.example.org/").endpoint().unwrap();
        assert_eq!(endpoint.scheme(), "wss");
        assert_eq!(endpoint.path(), "/socket.io/");
    }

    #[test]
    fn test_endpoint_rejects_unknown_scheme() {
        let result = SocketIoConfig::new("ftp://127.0.0.1").endpoint();
        assert!(matches!(result, Err(ChannelError::UnsupportedScheme(_))));
    }

    #[tokio::test]
    async fn test_next_event_without_connect() {
        let mut stream = SocketIoStream::new(SocketIoConfig::default());
        assert!(matches!(
            stream.next_event().await,
            Err(ChannelError::NotConnected)
        ));
        assert!(stream.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_session_against_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

            ws.send(Message::Text(
                r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#
                    .to_string(),
            ))
            .await
            .unwrap();
            assert_eq!(
                ws.next().await.unwrap().unwrap(),
                Message::Text("40".to_string())
            );
            ws.send(Message::Text(r#"40{"sid":"n1"}"#.to_string()))
                .await
                .unwrap();

            ws.send(Message::Text("2".to_string())).await.unwrap();
            assert_eq!(
                ws.next().await.unwrap().unwrap(),
                Message::Text("3".to_string())
            );

            for frame in [
                r#"42["peers",["http://127.0.0.1:5001"]]"#,
                r#"42["new_tx",{"oops":true}]"#,
                r#"42["new_tx",{"from":"A","to":"B","message":"x1"}]"#,
                "41",
            ] {
                ws.send(Message::Text(frame.to_string())).await.unwrap();
            }

            while let Some(Ok(_)) = ws.next().await {}
        });

        let mut stream = SocketIoStream::new(SocketIoConfig::new(format!("http://{addr}")));
        stream.connect().await.unwrap();
        assert!(stream.is_connected());
        assert_eq!(stream.handshake().unwrap().sid, "s1");

        assert_eq!(
            stream.next_event().await.unwrap(),
            Some(NodeEvent::Peers(vec![Peer::from("http://127.0.0.1:5001")]))
        );
        // The malformed transaction is dropped, the next one comes through.
        assert_eq!(
            stream.next_event().await.unwrap(),
            Some(NodeEvent::NewTx(Transaction::new("A", "B", "x1")))
        );
        assert_eq!(stream.next_event().await.unwrap(), None);
        assert!(!stream.is_connected());

        stream.close().await.unwrap();
        server.await.unwrap();
    }
}
