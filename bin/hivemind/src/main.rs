use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use hivemind_chain::CondenserAdapter;
use hivemind_indexer::{PermissivePolicy, SyncConfig, SyncDriver};
use hivemind_rpc::{api::HiveApiServer, HiveApi};
use hivemind_store::Store;
use jsonrpsee::server::ServerBuilder;
use tracing::info;

#[derive(Parser)]
#[clap(about = "Social blockchain indexer")]
struct Cli {
    /// sqlite database holding the index
    #[clap(long, default_value = "sqlite://hive.db")]
    database_url: String,
    /// upstream node's JSON-RPC endpoint
    #[clap(long, default_value = "https://api.steemit.com")]
    node_url:     String,
    #[command(subcommand)]
    command:      Command
}

#[derive(Subcommand)]
enum Command {
    /// replay checkpoints, backfill to the irreversible head, then follow
    /// the chain
    Sync {
        /// directory with <end_block>.json.lst checkpoint files
        #[clap(long, default_value = "checkpoints")]
        checkpoints_dir: PathBuf,
        /// how many blocks to stay behind the upstream head
        #[clap(long, default_value_t = 2)]
        trail_blocks:    u32
    },
    /// serve the read-only JSON-RPC api
    Serve {
        #[clap(long, default_value = "127.0.0.1:8080")]
        bind: String
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    let cli = Cli::parse();

    let store = Store::open(&cli.database_url).await?;
    let adapter = Arc::new(CondenserAdapter::new(&cli.node_url)?);

    match cli.command {
        Command::Sync { checkpoints_dir, trail_blocks } => {
            let driver = SyncDriver::new(
                store,
                adapter,
                Arc::new(PermissivePolicy),
                SyncConfig { checkpoints_dir, trail_blocks }
            );

            let shutdown = driver.shutdown_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("shutdown requested");
                    shutdown.cancel();
                }
            });

            driver.run().await?;
        }
        Command::Serve { bind } => {
            store.ensure_schema().await?;

            let server = ServerBuilder::default().build(&bind).await?;
            let addr = server.local_addr()?;
            info!(%addr, "rpc server started");

            let handle = server.start(HiveApi::new(store, adapter).into_rpc());
            handle.stopped().await;
        }
    }

    Ok(())
}
