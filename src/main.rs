use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use wallet_cli::commands::{self, HistoryOptions};
use wallet_cli::config::ConnectionArgs;
use wallet_cli::context::AppContext;
use wallet_cli::http::{ApiClient, ApiError};
use wallet_cli::notify::ConsoleNotifier;
use wallet_cli::runtime::RealRuntime;
use wallet_cli::storage::default_state_dir;
use wallet_cli::transactions::{DEFAULT_PAGE_LIMIT, SortBy, SortOrder, TransactionType};

/// wallet - personal wallet client
///
/// Create a wallet, record credits and debits, browse the history and export
/// it as CSV. The wallet id is remembered between runs in the state directory.
///
/// Examples:
///   wallet setup --name Savings --balance 100
///   wallet debit 12.5 -d "Lunch"
///   wallet history --page 2 --sort-by amount
#[derive(Parser, Debug)]
#[command(author, version = env!("WALLET_CLI_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the local state (also via WALLET_STATE_DIR)
    #[arg(long = "state-dir", value_name = "PATH", global = true)]
    state_dir: Option<PathBuf>,

    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create a wallet and make it the active one
    Setup(SetupArgs),

    /// Show the active wallet
    Show,

    /// Add money to the active wallet
    Credit(TransactArgs),

    /// Take money out of the active wallet
    Debit(TransactArgs),

    /// List transactions page by page
    History(HistoryArgs),

    /// Export every transaction to a CSV file
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
struct SetupArgs {
    /// Wallet name
    #[arg(long, short = 'n')]
    name: String,

    /// Opening balance
    #[arg(long, short = 'b', default_value_t = 0.0)]
    balance: f64,
}

#[derive(clap::Args, Debug)]
struct TransactArgs {
    /// Amount; the sign is taken from the subcommand
    #[arg(allow_negative_numbers = true)]
    amount: f64,

    /// What the transaction was for
    #[arg(long, short = 'd', default_value = "")]
    description: String,
}

#[derive(clap::Args, Debug)]
struct HistoryArgs {
    /// 1-based page number
    #[arg(long, short = 'p', default_value_t = 1)]
    page: u64,

    /// Rows per page
    #[arg(long, short = 'l', default_value_t = DEFAULT_PAGE_LIMIT)]
    limit: u64,

    #[arg(long = "sort-by", value_enum, default_value_t = SortBy::Date)]
    sort_by: SortBy,

    #[arg(long = "sort-order", value_enum, default_value_t = SortOrder::Desc)]
    sort_order: SortOrder,
}

#[derive(clap::Args, Debug)]
struct ExportArgs {
    /// Directory the CSV file is written to
    #[arg(long, short = 'o', value_name = "DIR", default_value = ".")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Backend failures were already shown through the notifier.
            if e.downcast_ref::<ApiError>().is_none() {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let runtime = RealRuntime;
    let state_dir = default_state_dir(&runtime, cli.state_dir)?;
    let client = ApiClient::new(&cli.connection.client_config())?;
    let ctx = AppContext::new(runtime, state_dir, client, Box::new(ConsoleNotifier));

    match cli.command {
        Commands::Setup(args) => {
            let wallet = commands::setup(&ctx, &args.name, args.balance).await?;
            println!("         id {}", wallet.id);
        }
        Commands::Show => {
            commands::show(&ctx).await?;
        }
        Commands::Credit(args) => {
            commands::transact(&ctx, TransactionType::Credit, args.amount, &args.description)
                .await?;
        }
        Commands::Debit(args) => {
            commands::transact(&ctx, TransactionType::Debit, args.amount, &args.description)
                .await?;
        }
        Commands::History(args) => {
            let options = HistoryOptions {
                page: args.page,
                limit: args.limit,
                sort_by: args.sort_by,
                sort_order: args.sort_order,
            };
            commands::history(&ctx, options).await?;
        }
        Commands::Export(args) => {
            commands::export(&ctx, &args.output).await?;
        }
    }
    Ok(())
}
