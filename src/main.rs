use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use wallet_guard::application::guard::BalanceGuard;
use wallet_guard::application::retry::RetryPolicy;
use wallet_guard::domain::account::Balance;
use wallet_guard::domain::operation::OperationRequest;
use wallet_guard::domain::ports::LedgerStoreBox;
use wallet_guard::error::WalletError;
use wallet_guard::infrastructure::in_memory::InMemoryLedgerStore;
use wallet_guard::interfaces::csv::balance_writer::BalanceWriter;
use wallet_guard::interfaces::csv::record_reader::RecordReader;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Operations CSV file (wallet_id, operation_type, amount)
    input: PathBuf,

    /// Wallets to create before processing (wallet_id, balance)
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Number of operations in flight at once
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Attempts per operation before reporting contention
    #[arg(long, env = "WALLET_GUARD_MAX_ATTEMPTS", default_value_t = 32)]
    max_attempts: u32,

    /// Backoff after the first conflict, in milliseconds
    #[arg(long, env = "WALLET_GUARD_BACKOFF_MS", default_value_t = 2)]
    backoff_ms: u64,

    /// Upper bound for a single backoff, in milliseconds
    #[arg(long, env = "WALLET_GUARD_MAX_BACKOFF_MS", default_value_t = 100)]
    max_backoff_ms: u64,

    /// Time budget for retrying one operation, in milliseconds
    #[arg(long, env = "WALLET_GUARD_DEADLINE_MS")]
    deadline_ms: Option<u64>,
}

impl Cli {
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_backoff: Duration::from_millis(self.backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            deadline: self.deadline_ms.map(Duration::from_millis),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    wallet_guard::telemetry::init();
    let cli = Cli::parse();

    let store = open_store(cli.db_path.as_deref())?;
    let guard = Arc::new(BalanceGuard::new(store, cli.retry_policy()));

    if let Some(accounts) = &cli.accounts {
        seed_accounts(&guard, accounts).await?;
    }
    run_operations(Arc::clone(&guard), &cli.input, cli.jobs).await?;

    let guard = Arc::try_unwrap(guard).map_err(|_| miette!("operations still in flight"))?;
    let accounts = guard.into_accounts().await.into_diagnostic()?;
    info!(wallets = accounts.len(), "processing finished");

    let stdout = io::stdout();
    let mut writer = BalanceWriter::new(stdout.lock());
    writer.write_accounts(accounts).into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<&Path>) -> Result<LedgerStoreBox> {
    use wallet_guard::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => {
            info!(path = %path.display(), "using RocksDB ledger");
            Ok(Box::new(RocksDBStore::open(path).into_diagnostic()?))
        }
        None => Ok(Box::new(InMemoryLedgerStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<&Path>) -> Result<LedgerStoreBox> {
    if db_path.is_some() {
        warn!(
            "persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled; falling back to in-memory storage"
        );
    }
    Ok(Box::new(InMemoryLedgerStore::new()))
}

async fn seed_accounts(guard: &BalanceGuard, path: &Path) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    for seed in RecordReader::new(file).account_seeds() {
        let seed = match seed {
            Ok(seed) => seed,
            Err(e) => {
                warn!(error = %e, "skipping malformed wallet record");
                continue;
            }
        };
        match guard.open_account(seed.wallet_id, seed.balance).await {
            Ok(()) => debug!(wallet_id = %seed.wallet_id, balance = %seed.balance, "wallet opened"),
            Err(WalletError::AccountExists(id)) => {
                warn!(wallet_id = %id, "wallet already exists, keeping stored balance");
            }
            Err(e) => return Err(e).into_diagnostic(),
        }
    }
    Ok(())
}

/// Submits every operation in the file, at most `jobs` at a time.
///
/// Permits are taken in file order, so `jobs == 1` applies operations strictly
/// sequentially. Finished tasks are reaped while submitting, so only the
/// operations still in flight are held in memory.
async fn run_operations(guard: Arc<BalanceGuard>, path: &Path, jobs: usize) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    let permits = Arc::new(Semaphore::new(jobs.clamp(1, Semaphore::MAX_PERMITS)));
    let mut tasks = JoinSet::new();

    for record in RecordReader::new(file).operations() {
        let request = match record {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "skipping malformed operation record");
                continue;
            }
        };

        while let Some(joined) = tasks.try_join_next() {
            joined.into_diagnostic()?;
        }

        let permit = Arc::clone(&permits).acquire_owned().await.into_diagnostic()?;
        let guard = Arc::clone(&guard);
        tasks.spawn(async move {
            let outcome = guard.apply(request.clone()).await;
            drop(permit);
            report(&request, outcome);
        });
    }

    while let Some(joined) = tasks.join_next().await {
        joined.into_diagnostic()?;
    }
    Ok(())
}

fn report(request: &OperationRequest, outcome: wallet_guard::error::Result<Balance>) {
    match outcome {
        Ok(balance) => debug!(
            wallet_id = %request.wallet_id,
            operation = %request.operation_type,
            %balance,
            "operation applied"
        ),
        Err(e) => warn!(
            wallet_id = %request.wallet_id,
            operation = %request.operation_type,
            amount = %request.amount,
            code = e.code(),
            transient = e.is_transient(),
            "operation rejected: {e}"
        ),
    }
}
