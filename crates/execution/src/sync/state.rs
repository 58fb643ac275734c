//! Mirrored node state and its reconciliation rules.

use super::ChannelUpdate;
use nodeview_domain::entities::{Block, Identity, Peer, Transaction};
use nodeview_domain::enums::{Confirmation, ConnectionStatus};
use nodeview_protocols::NodeEvent;
use tracing::{debug, info};

/// A transaction addressed to a given node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxEntry {
    /// The transaction.
    pub transaction: Transaction,
    /// Whether it sits in a block yet.
    pub confirmation: Confirmation,
}

/// What the client currently knows about the node.
///
/// The node is trusted: nothing here is validated, only relayed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    /// Node identity, `None` until the bootstrap read succeeds.
    pub identity: Option<Identity>,
    /// Peer list, as last sent.
    pub peers: Vec<Peer>,
    /// Known blocks. New blocks are prepended.
    pub chain: Vec<Block>,
    /// Unconfirmed transactions, newest first.
    pub pending: Vec<Transaction>,
    /// Push channel status.
    pub connection: ConnectionStatus,
}

impl SyncState {
    /// Applies one update from the channel listener.
    pub fn apply(&mut self, update: ChannelUpdate) {
        match update {
            ChannelUpdate::Connecting => self.connection = ConnectionStatus::Connecting,
            ChannelUpdate::Connected => self.on_connect(),
            ChannelUpdate::Disconnected { reason } => {
                debug!(reason = %reason, "Channel disconnected");
                self.connection = ConnectionStatus::Disconnected;
            }
            ChannelUpdate::Event(event) => self.apply_event(event),
        }
    }

    /// Applies one node event.
    pub fn apply_event(&mut self, event: NodeEvent) {
        match event {
            NodeEvent::Peers(peers) => self.on_peers(peers),
            NodeEvent::Chain(chain) => self.on_chain(chain),
            NodeEvent::NewTx(tx) => self.on_new_tx(tx),
            NodeEvent::NewBlock(block) => self.on_new_block(block),
        }
    }

    pub fn on_connect(&mut self) {
        info!("Connected to node");
        self.connection = ConnectionStatus::Connected;
    }

    pub fn on_peers(&mut self, peers: Vec<Peer>) {
        self.peers = peers;
    }

    /// Replaces the chain, whatever was there before.
    pub fn on_chain(&mut self, chain: Vec<Block>) {
        self.chain = chain;
    }

    /// Puts the transaction in front of the pending set. Duplicates are kept.
    pub fn on_new_tx(&mut self, tx: Transaction) {
        self.pending.insert(0, tx);
    }

    /// Prepends the block and empties the pending set.
    ///
    /// The pending set is cleared no matter which transactions the block holds.
    pub fn on_new_block(&mut self, block: Block) {
        debug!(
            index = block.index,
            txs = block.transactions.len(),
            dropped_pending = self.pending.len(),
            "New block"
        );
        self.chain.insert(0, block);
        self.pending.clear();
    }

    /// Highest block index known.
    #[must_use]
    pub fn chain_height(&self) -> Option<u64> {
        self.chain.iter().map(|b| b.index).max()
    }

    /// Whether the identity read is still outstanding (or failed).
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.identity.is_none()
    }

    /// Transactions addressed to `address`, pending ones first.
    #[must_use]
    pub fn inbox(&self, address: &str) -> Vec<InboxEntry> {
        let pending = self
            .pending
            .iter()
            .filter(|tx| tx.is_addressed_to(address))
            .map(|tx| InboxEntry {
                transaction: tx.clone(),
                confirmation: Confirmation::Pending,
            });

        let confirmed = self.chain.iter().flat_map(|block| {
            block
                .transactions
                .iter()
                .filter(|tx| tx.is_addressed_to(address))
                .map(|tx| InboxEntry {
                    transaction: tx.clone(),
                    confirmation: Confirmation::Confirmed {
                        block_index: block.index,
                    },
                })
        });

        pending.chain(confirmed).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(from: &str, to: &str, message: &str) -> Transaction {
        Transaction::new(from, to, message)
    }

    fn block(index: u64, transactions: Vec<Transaction>) -> Block {
        Block::new(index, format!("h{}", index.saturating_sub(1)), format!("h{index}"), transactions)
    }

    #[test]
    fn test_new_tx_is_newest_first() {
        let mut state = SyncState::default();
        state.on_new_tx(tx("A", "B", "x1"));
        state.on_new_tx(tx("C", "D", "x2"));

        assert_eq!(state.pending, vec![tx("C", "D", "x2"), tx("A", "B", "x1")]);
    }

    #[test]
    fn test_new_tx_keeps_duplicates() {
        let mut state = SyncState::default();
        let events: Vec<Transaction> = (0..5).map(|i| tx("A", "B", &format!("m{i}"))).collect();
        for event in &events {
            state.on_new_tx(event.clone());
        }
        state.on_new_tx(events[4].clone());

        let mut expected: Vec<Transaction> = events.iter().rev().cloned().collect();
        expected.insert(0, events[4].clone());
        assert_eq!(state.pending, expected);
    }

    #[test]
    fn test_new_block_clears_pending_and_prepends() {
        let mut state = SyncState::default();
        state.on_new_tx(tx("A", "B", "x1"));
        state.on_new_tx(tx("C", "D", "x2"));

        // The block carries none of the pending transactions.
        state.on_new_block(block(1, vec![tx("E", "F", "other")]));

        assert!(state.pending.is_empty());
        assert_eq!(state.chain.len(), 1);
        assert_eq!(state.chain[0].index, 1);
    }

    #[test]
    fn test_new_blocks_are_newest_first() {
        let mut state = SyncState::default();
        for index in 1..=4 {
            state.on_new_block(block(index, Vec::new()));
        }

        let indexes: Vec<u64> = state.chain.iter().map(|b| b.index).collect();
        assert_eq!(indexes, vec![4, 3, 2, 1]);
        assert_eq!(state.chain_height(), Some(4));
    }

    #[test]
    fn test_chain_snapshot_replaces_everything() {
        let mut state = SyncState::default();
        state.on_new_block(block(7, Vec::new()));
        state.on_new_block(block(8, Vec::new()));

        let snapshot = vec![block(0, Vec::new()), block(1, Vec::new())];
        state.on_chain(snapshot.clone());
        assert_eq!(state.chain, snapshot);

        state.on_chain(Vec::new());
        assert!(state.chain.is_empty());
        assert_eq!(state.chain_height(), None);
    }

    #[test]
    fn test_chain_snapshot_leaves_pending_alone() {
        let mut state = SyncState::default();
        state.on_new_tx(tx("A", "B", "x1"));
        state.on_chain(vec![block(0, Vec::new())]);

        assert_eq!(state.pending.len(), 1);
    }

    #[test]
    fn test_peers_replaced_wholesale() {
        let mut state = SyncState::default();
        state.on_peers(vec![Peer::from("http://a"), Peer::from("http://b")]);
        state.on_peers(vec![Peer::from("http://c")]);

        assert_eq!(state.peers, vec![Peer::from("http://c")]);
    }

    #[test]
    fn test_connection_status_follows_listener() {
        let mut state = SyncState::default();
        assert_eq!(state.connection, ConnectionStatus::Idle);

        state.apply(ChannelUpdate::Connecting);
        assert_eq!(state.connection, ConnectionStatus::Connecting);

        state.apply(ChannelUpdate::Connected);
        assert_eq!(state.connection, ConnectionStatus::Connected);

        state.apply(ChannelUpdate::Disconnected {
            reason: "node closed the channel".to_string(),
        });
        assert_eq!(state.connection, ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_disconnect_keeps_collections() {
        let mut state = SyncState::default();
        state.apply(ChannelUpdate::Event(NodeEvent::NewTx(tx("A", "B", "x1"))));
        state.apply(ChannelUpdate::Disconnected {
            reason: "gone".to_string(),
        });

        assert_eq!(state.pending.len(), 1);
    }

    #[test]
    fn test_inbox_lists_pending_then_confirmed() {
        let me = "http://127.0.0.1:5001";
        let mut state = SyncState::default();
        state.on_chain(vec![
            block(0, Vec::new()),
            block(1, vec![tx("http://x", me, "c1"), tx("http://x", "http://y", "c2")]),
        ]);
        state.on_new_tx(tx("http://x", me, "p1"));
        state.on_new_tx(tx(me, "http://x", "p2"));

        let inbox = state.inbox(me);
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].transaction.message, "p1");
        assert_eq!(inbox[0].confirmation, Confirmation::Pending);
        assert_eq!(inbox[1].transaction.message, "c1");
        assert_eq!(
            inbox[1].confirmation,
            Confirmation::Confirmed { block_index: 1 }
        );
    }
}
