//! Synchronizer owning the bootstrap read and the push channel.

use super::{ChannelListener, ChannelListenerConfig, ChannelUpdate, SyncState};
use crate::error::SyncError;
use nodeview_domain::enums::ConnectionStatus;
use nodeview_domain::error::BootstrapError;
use nodeview_protocols::{EventStream, NodeApi};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Tasks of one initialized session.
struct Session {
    /// Stops the listener.
    shutdown: watch::Sender<bool>,
    /// Identity read.
    bootstrap: JoinHandle<()>,
    /// Channel listener.
    listener: JoinHandle<()>,
    /// Applies listener updates to the state.
    consumer: JoinHandle<()>,
}

impl Session {
    fn abort(self) {
        let _ = self.shutdown.send(true);
        self.bootstrap.abort();
        self.listener.abort();
        self.consumer.abort();
    }
}

/// Mirrors a node's identity, peers, chain and pending pool.
///
/// Lifecycle: [`initialize`](Self::initialize) opens one push channel and
/// starts the identity read, [`teardown`](Self::teardown) closes the channel.
/// Every state change is published; see [`subscribe`](Self::subscribe).
pub struct ClientStateSynchronizer {
    /// REST seam for the identity read.
    api: Arc<dyn NodeApi>,
    /// Listener configuration.
    config: ChannelListenerConfig,
    /// Published state.
    state: Arc<watch::Sender<SyncState>>,
    /// Live session, if initialized.
    session: Option<Session>,
}

impl ClientStateSynchronizer {
    /// Creates an idle synchronizer.
    pub fn new(api: Arc<dyn NodeApi>, config: ChannelListenerConfig) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        Self {
            api,
            config,
            state: Arc::new(state),
            session: None,
        }
    }

    /// Checks if a session is open.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Starts the identity read and opens the push channel over `stream`.
    ///
    /// The state starts over from empty. The two run independently, so
    /// events may be applied before the identity is known.
    ///
    /// # Errors
    /// Returns [`SyncError::AlreadyInitialized`] if a session is open; the
    /// stream is then dropped unopened.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn initialize<S>(&mut self, stream: S) -> Result<(), SyncError>
    where
        S: EventStream + 'static,
    {
        if self.session.is_some() {
            warn!("Synchronizer already initialized");
            return Err(SyncError::AlreadyInitialized);
        }

        self.state.send_replace(SyncState::default());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (update_tx, update_rx) = mpsc::channel(self.config.buffer_size);

        let bootstrap = tokio::spawn(Self::bootstrap(self.api.clone(), self.state.clone()));
        let listener = tokio::spawn(
            ChannelListener::new(self.config.clone(), stream, update_tx, shutdown_rx).run(),
        );
        let consumer = tokio::spawn(Self::consume(update_rx, self.state.clone()));

        self.session = Some(Session {
            shutdown: shutdown_tx,
            bootstrap,
            listener,
            consumer,
        });

        info!("Synchronizer initialized");
        Ok(())
    }

    /// Closes the push channel and waits for the session's tasks to finish.
    ///
    /// The mirrored collections stay readable; the connection goes back to
    /// [`ConnectionStatus::Idle`].
    ///
    /// # Errors
    /// Returns [`SyncError::NotInitialized`] if there is no open session.
    pub async fn teardown(&mut self) -> Result<(), SyncError> {
        let session = self.session.take().ok_or(SyncError::NotInitialized)?;

        let _ = session.shutdown.send(true);
        session.bootstrap.abort();

        if let Err(e) = session.listener.await {
            warn!(error = %e, "Channel listener task failed");
        }
        // The listener dropped its sender, so the consumer drains and ends.
        if let Err(e) = session.consumer.await {
            warn!(error = %e, "State consumer task failed");
        }

        self.state
            .send_modify(|state| state.connection = ConnectionStatus::Idle);
        info!("Synchronizer torn down");
        Ok(())
    }

    async fn bootstrap(api: Arc<dyn NodeApi>, state: Arc<watch::Sender<SyncState>>) {
        match api.identity().await {
            Ok(identity) => {
                info!(port = ?identity.port, "Node identity loaded");
                state.send_modify(|s| s.identity = Some(identity));
            }
            Err(e) => {
                let err = BootstrapError::new(e.to_string());
                warn!(error = %err, "Identity unavailable");
            }
        }
    }

    async fn consume(
        mut updates: mpsc::Receiver<ChannelUpdate>,
        state: Arc<watch::Sender<SyncState>>,
    ) {
        while let Some(update) = updates.recv().await {
            state.send_modify(|s| s.apply(update));
        }
    }
}

impl Drop for ClientStateSynchronizer {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.abort();
        }
    }
}
