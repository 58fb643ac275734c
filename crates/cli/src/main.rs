//! Command Line Interface for a peer-to-peer chat ledger node.
mod config;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::NodeArgs;
use dotenv::dotenv;
use nodeview_domain::value_objects::MessageForm;
use nodeview_execution::prelude::*;
use nodeview_protocols::discovery::{DISCOVERY_PORTS, discover_local_node};
use nodeview_protocols::{MineOutcome, NodeApi, NodeClient, SocketIoConfig, SocketIoStream};
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "nodeview")]
#[command(about = "Viewer and message client for a P2P chat ledger node", long_about = None)]
struct Cli {
    #[command(flatten)]
    node: NodeArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the node's peers, chain and pending pool live
    Watch {
        /// Node URL whose inbox is shown (defaults to the watched node)
        #[arg(long)]
        inbox: Option<String>,

        /// Give up after this many failed reconnects
        #[arg(long)]
        max_reconnects: Option<u32>,
    },
    /// Send an encrypted message through the node
    Send {
        /// Recipient node URL (e.g., http://127.0.0.1:5001)
        #[arg(long)]
        to_node: String,

        /// Recipient public key, as served by its /id
        #[arg(long)]
        to_pub: String,

        /// Message text
        #[arg(short, long)]
        message: String,
    },
    /// Ask the node to mine its pending transactions
    Mine,
    /// Show the node's identity
    Id,
    /// List the node's peers
    Peers,
    /// Show the node's chain
    Chain {
        /// Only the newest N blocks
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// List unconfirmed transactions
    Pending,
    /// List transactions addressed to a node
    Inbox {
        /// Recipient node URL (defaults to the selected node)
        address: Option<String>,
    },
    /// Look for a node on local ports 5000-5009
    Detect,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    // stdout is reserved for rendered output.
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let Cli { node, command } = Cli::parse();

    match command {
        Commands::Detect => {
            println!("🔍 Probing 127.0.0.1 ports {:?}...", DISCOVERY_PORTS);
            let found = discover_local_node(DISCOVERY_PORTS).await?;
            println!("✅ Found node");
            render::print_identity(&found.base_url, Some(&found.identity));
        }
        Commands::Watch {
            inbox,
            max_reconnects,
        } => watch(node.client().await?, inbox, max_reconnects).await?,
        Commands::Send {
            to_node,
            to_pub,
            message,
        } => {
            let client = node.client().await?;
            let action = SubmitAction::new(client.clone());
            let mut form = MessageForm::new(to_node, to_pub, message);

            println!("📤 Sending via {}...", client.base_url());
            let receipt = match action.submit(&mut form).await {
                Ok(receipt) => receipt,
                Err(SubmitActionError::Validation(e)) => {
                    anyhow::bail!("{} (pass {})", e, render::form_flag(e.field()));
                }
                Err(e) => return Err(e.into()),
            };
            println!(
                "✅ Accepted for {} (id {}, {})",
                receipt.to_node,
                receipt.id,
                receipt.submitted_at.format("%H:%M:%S")
            );
        }
        Commands::Mine => {
            let client = node.client().await?;
            println!("⛏️  Mining on {}...", client.base_url());
            match client.mine().await? {
                MineOutcome::Mined(block) => {
                    println!(
                        "✅ Mined block #{} with {} transactions",
                        block.index,
                        block.transactions.len()
                    );
                    println!("   Hash: {}", block.hash);
                }
                MineOutcome::NothingToMine(message) => println!("ℹ️  {}", message),
            }
        }
        Commands::Id => {
            let client = node.client().await?;
            let identity = client.identity().await?;
            render::print_identity(client.base_url(), Some(&identity));
        }
        Commands::Peers => render::print_peers(&node.client().await?.peers().await?),
        Commands::Chain { limit } => {
            render::print_chain(&node.client().await?.chain().await?, limit)
        }
        Commands::Pending => {
            render::print_transactions("Pending", &node.client().await?.pending().await?)
        }
        Commands::Inbox { address } => {
            let client = node.client().await?;
            let address = address.unwrap_or_else(|| client.base_url().to_string());
            let (chain, pending) = tokio::try_join!(client.chain(), client.pending())?;

            let mut state = SyncState::default();
            state.on_chain(chain);
            for tx in pending {
                state.on_new_tx(tx);
            }
            render::print_inbox(&address, &state.inbox(&address));
        }
    }

    Ok(())
}

/// Runs the live view until Ctrl-C.
async fn watch(
    client: Arc<NodeClient>,
    inbox: Option<String>,
    max_reconnects: Option<u32>,
) -> Result<()> {
    let base_url = client.base_url().to_string();
    let inbox = inbox.unwrap_or_else(|| base_url.clone());
    let config = ChannelListenerConfig {
        max_reconnect_attempts: max_reconnects,
        ..Default::default()
    };

    let mut synchronizer = ClientStateSynchronizer::new(client, config);
    let mut updates = synchronizer.subscribe();
    synchronizer.initialize(SocketIoStream::new(SocketIoConfig::new(base_url.as_str())))?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                render::print_dashboard(&base_url, &state, &inbox);
            }
        }
    }

    synchronizer.teardown().await?;
    println!("\n👋 Disconnected from {}", base_url);
    Ok(())
}
