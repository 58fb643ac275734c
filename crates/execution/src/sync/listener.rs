//! Push channel listener with reconnection.

use nodeview_protocols::{EventStream, NodeEvent};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Update forwarded from the listener to the state consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelUpdate {
    /// A connection attempt started.
    Connecting,
    /// The channel is open.
    Connected,
    /// The channel was lost or could not be opened.
    Disconnected {
        /// Human readable cause.
        reason: String,
    },
    /// The node pushed an event.
    Event(NodeEvent),
}

/// Configuration for the channel listener.
#[derive(Debug, Clone)]
pub struct ChannelListenerConfig {
    /// Delay between reconnect attempts in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Maximum consecutive reconnect attempts, `None` for no limit.
    pub max_reconnect_attempts: Option<u32>,
    /// Capacity of the update queue.
    pub buffer_size: usize,
}

impl Default for ChannelListenerConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 1000,
            max_reconnect_attempts: None,
            buffer_size: 1000,
        }
    }
}

/// How a connected session ended.
enum SessionEnd {
    Shutdown,
    Lost(String),
}

/// Drives an [`EventStream`] and forwards what it yields.
pub struct ChannelListener<S> {
    /// Configuration.
    config: ChannelListenerConfig,
    /// Underlying stream.
    stream: S,
    /// Update sender.
    update_tx: mpsc::Sender<ChannelUpdate>,
    /// Flips to `true` when the listener must stop.
    shutdown: watch::Receiver<bool>,
}

impl<S: EventStream> ChannelListener<S> {
    /// Creates a new listener.
    pub fn new(
        config: ChannelListenerConfig,
        stream: S,
        update_tx: mpsc::Sender<ChannelUpdate>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            stream,
            update_tx,
            shutdown,
        }
    }

    /// Runs until shutdown, until the consumer goes away, or until the
    /// reconnect attempts are used up. The stream is closed on the way out.
    pub async fn run(mut self) {
        info!("Starting channel listener");
        let mut attempts: u32 = 0;

        loop {
            let stopping = *self.shutdown.borrow();
            if stopping || !self.publish(ChannelUpdate::Connecting).await {
                break;
            }

            let connected = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                connected = self.stream.connect() => connected,
            };

            let reason = match connected {
                Ok(()) => {
                    attempts = 0;
                    if !self.publish(ChannelUpdate::Connected).await {
                        break;
                    }
                    match self.pump().await {
                        SessionEnd::Shutdown => break,
                        SessionEnd::Lost(reason) => reason,
                    }
                }
                Err(e) => {
                    error!(error = %e, "Push channel connection failed");
                    e.to_string()
                }
            };

            if !self.publish(ChannelUpdate::Disconnected { reason }).await {
                break;
            }

            attempts += 1;
            if self
                .config
                .max_reconnect_attempts
                .is_some_and(|max| attempts >= max)
            {
                error!("Max reconnect attempts reached, stopping listener");
                break;
            }

            warn!(
                attempts = attempts,
                delay_ms = self.config.reconnect_delay_ms,
                "Reconnecting..."
            );

            tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                _ = tokio::time::sleep(Duration::from_millis(self.config.reconnect_delay_ms)) => {}
            }
        }

        if let Err(e) = self.stream.close().await {
            warn!(error = %e, "Failed to close push channel cleanly");
        }
        info!("Channel listener stopped");
    }

    /// Forwards events of one connected session.
    async fn pump(&mut self) -> SessionEnd {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.changed() => return SessionEnd::Shutdown,
                next = self.stream.next_event() => next,
            };

            match next {
                Ok(Some(event)) => {
                    debug!(event = event.name(), "Received node event");
                    if !self.publish(ChannelUpdate::Event(event)).await {
                        return SessionEnd::Shutdown;
                    }
                }
                Ok(None) => return SessionEnd::Lost("node closed the channel".to_string()),
                Err(e) => {
                    warn!(error = %e, "Push channel lost");
                    return SessionEnd::Lost(e.to_string());
                }
            }
        }
    }

    /// Sends an update; `false` once the consumer is gone.
    async fn publish(&mut self, update: ChannelUpdate) -> bool {
        self.update_tx.send(update).await.is_ok()
    }
}
