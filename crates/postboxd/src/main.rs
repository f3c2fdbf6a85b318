//! postboxd - private file inboxes on a shared chunk store

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use postbox_protocol::Overlay;
use postboxd::config::Config;
use postboxd::node::Node;
use postboxd::state::PollState;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "postboxd")]
#[command(about = "Send and receive encrypted files through mined inboxes")]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "POSTBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(long, env = "POSTBOX_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a configuration and account key
    Init {
        /// Name to publish the inbox under
        #[arg(short, long)]
        name: String,

        /// Shared storage root
        #[arg(long, env = "POSTBOX_STORAGE")]
        storage: Option<PathBuf>,
    },

    /// Mine an inbox and publish it
    Mine {
        /// Leading bits slot 0 must share with the overlay
        #[arg(short, long)]
        proximity: Option<u8>,

        /// Target overlay (hex); defaults to the account overlay
        #[arg(long)]
        overlay: Option<String>,

        /// Mining trial budget
        #[arg(long)]
        max_trials: Option<u64>,
    },

    /// Send a file to a named recipient
    Send {
        /// Recipient name
        #[arg(short, long)]
        to: String,

        /// File to send
        file: PathBuf,

        /// Omit sender identity
        #[arg(long)]
        anonymous: bool,

        /// Note attached to the sender identity
        #[arg(short, long, conflicts_with = "anonymous")]
        message: Option<String>,
    },

    /// Fetch new files from our inbox
    Poll {
        /// Keep polling until interrupted
        #[arg(short, long)]
        watch: bool,

        /// Seconds between polls in watch mode
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show account and inbox details
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Init { name, storage } => {
            init_logging("info", args.debug);
            let config = Config::create_default(args.config, args.data_dir, &name, storage)?;
            println!("Created {}", config.config_path().display());
            println!("Public key: {}", hex::encode(&config.account.public_key));
        }
        Command::Mine {
            proximity,
            overlay,
            max_trials,
        } => {
            let node = open_node(args.config, args.data_dir, args.debug).await?;
            let overlay = overlay
                .map(|o| Overlay::from_hex(&o))
                .transpose()
                .context("Invalid overlay")?;
            let params = node.mine_inbox(overlay, proximity, max_trials).await?;
            println!("Inbox published as {}", node.config().account.name);
            println!("{}", serde_json::to_string_pretty(&params)?);
        }
        Command::Send {
            to,
            file,
            anonymous,
            message,
        } => {
            let node = open_node(args.config, args.data_dir, args.debug).await?;
            let receipt = node.send_file(&to, &file, anonymous, message).await?;
            println!("Delivered to {} at slot {}", to, receipt.index);
        }
        Command::Poll { watch, interval } => {
            let node = open_node(args.config, args.data_dir, args.debug).await?;
            if watch {
                let secs = interval.unwrap_or(node.config().poll.interval_secs).max(1);
                node.watch(Duration::from_secs(secs)).await?;
            } else {
                let summary = node.poll_once().await?;
                for file in &summary.received {
                    let from = file
                        .sender
                        .as_ref()
                        .and_then(|s| s.name.as_deref())
                        .unwrap_or("anonymous");
                    println!(
                        "[{}] {} from {} ({} bytes)",
                        file.index,
                        file.path.display(),
                        from,
                        file.size
                    );
                }
                println!(
                    "{} new, {} failed, next slot {}{}",
                    summary.received.len(),
                    summary.failed,
                    summary.next_index,
                    if summary.truncated { " (scan cut short)" } else { "" }
                );
            }
        }
        Command::Show => {
            let node = open_node(args.config, args.data_dir, args.debug).await?;
            let config = node.config();
            println!("Name:       {}", config.account.name);
            println!("Public key: {}", node.account().export_public_hex());
            println!("Overlay:    {}", config.account.overlay);
            println!("Storage:    {}", config.storage.root.display());
            match node.load_inbox_params().await? {
                Some(params) => {
                    let state = PollState::load(&config.state_path()).await?;
                    println!("Inbox:      {}", params.base_identifier);
                    println!("Proximity:  {}", params.proximity);
                    println!(
                        "Next slot:  {}",
                        state.next_index(&params.base_identifier.to_hex())
                    );
                }
                None => println!("Inbox:      not mined (run `postboxd mine`)"),
            }
        }
    }

    Ok(())
}

async fn open_node(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    debug: bool,
) -> Result<Node> {
    let config = Config::load(config_path, data_dir)?;
    init_logging(&config.logging.level, debug);
    info!("Using configuration {}", config.config_path().display());
    Node::new(config).await
}

fn init_logging(level: &str, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
