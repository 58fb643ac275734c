//! Terminal rendering.

use chrono::DateTime;
use nodeview_domain::entities::{Block, Identity, Peer, Transaction};
use nodeview_domain::enums::{Confirmation, ConnectionStatus, FormField};
use nodeview_execution::prelude::{InboxEntry, SyncState};
use prettytable::{Table, format, row};

const HASH_CHARS: usize = 12;
const PREVIEW_CHARS: usize = 32;
const DASHBOARD_BLOCKS: usize = 10;

pub fn status_label(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Idle => "⚪ idle",
        ConnectionStatus::Connecting => "🟡 connecting",
        ConnectionStatus::Connected => "🟢 connected",
        ConnectionStatus::Disconnected => "🔴 disconnected",
    }
}

pub fn short_hash(hash: &str) -> String {
    hash.chars().take(HASH_CHARS).collect()
}

/// Block time as `YYYY-MM-DD HH:MM:SS` UTC, `-` if unknown.
pub fn format_timestamp(timestamp: Option<f64>) -> String {
    timestamp
        .and_then(|secs| DateTime::from_timestamp(secs.trunc() as i64, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Command line flag that fills a form field.
pub fn form_flag(field: FormField) -> &'static str {
    match field {
        FormField::RecipientAddress => "--to-node",
        FormField::RecipientKey => "--to-pub",
        FormField::Message => "--message",
    }
}

/// Blocks by descending index, cut to `limit`.
pub fn newest_blocks(blocks: &[Block], limit: Option<usize>) -> Vec<&Block> {
    let mut ordered: Vec<&Block> = blocks.iter().collect();
    ordered.sort_by(|a, b| b.index.cmp(&a.index));
    if let Some(limit) = limit {
        ordered.truncate(limit);
    }
    ordered
}

fn prev_label(block: &Block) -> String {
    if block.is_genesis() {
        "genesis".to_string()
    } else {
        short_hash(&block.prev_hash)
    }
}

/// The full key; it is what `send --to-pub` expects.
pub fn public_key_line(identity: Option<&Identity>) -> String {
    match identity {
        Some(identity) => format!("   Public key: {}", identity.public_key),
        None => "   Public key: loading...".to_string(),
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table
}

pub fn print_identity(base_url: &str, identity: Option<&Identity>) {
    println!("🔗 Node: {}", base_url);
    if let Some(port) = identity.and_then(|i| i.port) {
        println!("   Port: {}", port);
    }
    println!("{}", public_key_line(identity));
}

pub fn print_peers(peers: &[Peer]) {
    println!("\n🌐 Peers ({})", peers.len());
    if peers.is_empty() {
        println!("   (none)");
        return;
    }
    for peer in peers {
        println!("   {}", peer);
    }
}

pub fn print_transactions(title: &str, transactions: &[Transaction]) {
    println!("\n📨 {} ({})", title, transactions.len());
    if transactions.is_empty() {
        println!("   (none)");
        return;
    }

    let mut table = new_table();
    table.set_titles(row!["From", "To", "Message"]);
    for tx in transactions {
        table.add_row(row![tx.from, tx.to, tx.message_preview(PREVIEW_CHARS)]);
    }
    table.printstd();
}

pub fn print_chain(blocks: &[Block], limit: Option<usize>) {
    println!("\n⛓️  Chain ({} blocks)", blocks.len());
    if blocks.is_empty() {
        println!("   (empty)");
        return;
    }

    let mut table = new_table();
    table.set_titles(row!["#", "Hash", "Prev", "Txs", "Nonce", "Time"]);
    let shown = newest_blocks(blocks, limit);
    for block in &shown {
        table.add_row(row![
            block.index,
            short_hash(&block.hash),
            prev_label(block),
            block.transactions.len(),
            block.nonce.map_or_else(|| "-".to_string(), |n| n.to_string()),
            format_timestamp(block.timestamp)
        ]);
    }
    table.printstd();

    if blocks.len() > shown.len() {
        println!("   ... {} older", blocks.len() - shown.len());
    }
}

pub fn print_inbox(address: &str, entries: &[InboxEntry]) {
    println!("\n📬 Inbox for {} ({})", address, entries.len());
    if entries.is_empty() {
        println!("   (empty)");
        return;
    }

    let mut table = new_table();
    table.set_titles(row!["Status", "From", "Message"]);
    for entry in entries {
        let status = match entry.confirmation {
            Confirmation::Pending => "⏳ pending".to_string(),
            Confirmation::Confirmed { block_index } => format!("✅ block {block_index}"),
        };
        table.add_row(row![
            status,
            entry.transaction.from,
            entry.transaction.message_preview(PREVIEW_CHARS)
        ]);
    }
    table.printstd();
}

/// Redraws the whole live view.
pub fn print_dashboard(base_url: &str, state: &SyncState, inbox_address: &str) {
    // Clear screen, cursor home.
    print!("\x1B[2J\x1B[H");

    println!("📡 nodeview  {}", status_label(state.connection));
    println!("════════════════════════════════════");
    print_identity(base_url, state.identity.as_ref());
    if let Some(height) = state.chain_height() {
        println!("   Height: {}", height);
    }
    print_peers(&state.peers);
    print_transactions("Pending", &state.pending);
    print_chain(&state.chain, Some(DASHBOARD_BLOCKS));
    print_inbox(inbox_address, &state.inbox(inbox_address));
    println!("\nPress Ctrl-C to quit.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("00ab34cd56ef7890aa"), "00ab34cd56ef");
        assert_eq!(short_hash("00ab"), "00ab");
    }

    fn chain(indexes: &[u64]) -> Vec<Block> {
        indexes
            .iter()
            .map(|&i| {
                Block::new(i, format!("h{}", i.saturating_sub(1)), format!("h{i}"), Vec::new())
            })
            .collect()
    }

    fn indexes(blocks: &[&Block]) -> Vec<u64> {
        blocks.iter().map(|b| b.index).collect()
    }

    #[test]
    fn test_newest_blocks_from_oldest_first_snapshot() {
        let blocks = chain(&[0, 1, 2, 3, 4]);
        assert_eq!(indexes(&newest_blocks(&blocks, Some(2))), vec![4, 3]);
        assert_eq!(indexes(&newest_blocks(&blocks, None)), vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_newest_blocks_after_live_prepends() {
        // Snapshot oldest first, then two blocks prepended by the live channel.
        let blocks = chain(&[6, 5, 0, 1, 2, 3, 4]);
        assert_eq!(indexes(&newest_blocks(&blocks, Some(3))), vec![6, 5, 4]);
        assert_eq!(indexes(&newest_blocks(&blocks, Some(20))).len(), 7);
    }

    #[test]
    fn test_prev_label_marks_genesis() {
        let blocks = chain(&[0, 1]);
        assert_eq!(prev_label(&blocks[0]), "genesis");
        assert_eq!(prev_label(&blocks[1]), "h0");
    }

    #[test]
    fn test_public_key_line_shows_whole_key() {
        // Base64 PEM keys all start with the encoded "-----BEGIN".
        let key = "LS0tLS1CRUdJTiBQVUJMSUMgS0VZLS0tLS0KTUlJQklqQU5CZ2txaGtpRzl3MEJB";
        let line = public_key_line(Some(&Identity::new(key)));
        assert!(line.ends_with(key));
        assert_eq!(public_key_line(None), "   Public key: loading...");
    }

    #[test]
    fn test_form_flags_match_send_arguments() {
        assert_eq!(form_flag(FormField::RecipientAddress), "--to-node");
        assert_eq!(form_flag(FormField::RecipientKey), "--to-pub");
        assert_eq!(form_flag(FormField::Message), "--message");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(Some(0.0)), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(Some(1_700_000_000.75)), "2023-11-14 22:13:20");
        assert_eq!(format_timestamp(None), "-");
    }

    #[test]
    fn test_status_labels_are_distinct() {
        let labels = [
            status_label(ConnectionStatus::Idle),
            status_label(ConnectionStatus::Connecting),
            status_label(ConnectionStatus::Connected),
            status_label(ConnectionStatus::Disconnected),
        ];
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
