//! Demo CLI wiring every chain-mutation collaborator together: in-memory
//! account store and transaction pool, a `sled`-backed persistence layer,
//! the shipped round controller and transaction executor. Account and pool
//! state is process-lifetime only — only blocks and transactions survive a
//! restart, since persisting the account store is that collaborator's
//! concern, not the core's (see `chain-accounts`). A real deployment would
//! swap in a durable `AccountStore`/`TransactionPool` without touching
//! `chain-core` at all.

mod fixtures;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chain_accounts::{AccountStore, InMemoryAccountStore};
use chain_bus::TokioBus;
use chain_core::{BlockPersistence, ChainConfig, ChainMutator, DefaultExecutor, DefaultRoundController};
use chain_pool::InMemoryTransactionPool;
use chain_storage::Storage;

#[derive(Parser)]
#[command(name = "chain-node", about = "Chain mutation core demo CLI")]
struct Cli {
    /// Directory the embedded persistence layer opens its trees under.
    #[arg(long, global = true, default_value = "chain-data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Persist and apply the genesis block described by a fixture file.
    Bootstrap {
        #[arg(long)]
        genesis: PathBuf,
    },
    /// Apply one candidate block, extending the current tip by one height.
    Apply {
        #[arg(long)]
        block: PathBuf,
    },
    /// Roll the current tip back to its parent.
    Rollback,
    /// Print the current tip height/id and the Is-Active flag.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mutator = build_mutator(&cli.data_dir)?;

    match cli.command {
        Command::Bootstrap { genesis } => {
            let block = fixtures::load_block_fixture(&genesis)?;
            mutator.save_genesis_block(&block).await?;
            mutator.apply_genesis_block(block).await?;
            tracing::info!("genesis bootstrapped");
        }
        Command::Apply { block } => {
            let block = fixtures::load_block_fixture(&block)?;
            let height = block.height;
            mutator.apply_block(block, BlockPersistence::WriteAndPersist).await?;
            tracing::info!(height, "block applied");
        }
        Command::Rollback => {
            mutator.delete_last_block().await?;
            tracing::info!("tip rolled back to parent");
        }
        Command::Status => {
            match mutator.last_block() {
                Some(tip) => println!("tip height={} id={}", tip.height, tip.id),
                None => println!("no block applied yet"),
            }
            println!("is_active={}", mutator.is_active());
        }
    }

    Ok(())
}

fn build_mutator(data_dir: &std::path::Path) -> anyhow::Result<ChainMutator> {
    let storage = Storage::open(data_dir)?;
    let accounts: Arc<dyn AccountStore> = Arc::new(InMemoryAccountStore::new());
    let pool = Arc::new(InMemoryTransactionPool::new());
    let bus = Arc::new(TokioBus::new());
    let executor = Arc::new(DefaultExecutor);
    let rounds = Arc::new(DefaultRoundController::new(ChainConfig::default().round_length));

    let mutator = ChainMutator::new(storage, accounts, pool, bus, executor, rounds, ChainConfig::default());
    mutator.restore_tip_from_storage()?;
    Ok(mutator)
}
