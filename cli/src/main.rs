//! CLI entry point.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use hargreaves::{DealRequest, Side};
use hargreaves_cli::audit::AuditLog;
use hargreaves_cli::commands::{self, DealOptions};
use hargreaves_cli::config::Config;
use hargreaves_cli::error::{Error, Result};

#[derive(Parser)]
#[command(name = "hl")]
#[command(about = "Deal in a Hargreaves Lansdown account from the command line")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Log debug detail
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Buy,
    Sell,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Buy => Side::Buy,
            SideArg::Sell => Side::Sell,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List accounts
    Accounts,

    /// Show balances and holdings of an account
    Holdings { account: u32 },

    /// Search securities by name or ticker
    Search { query: String },

    /// Buy or sell a percentage, at market or as a fill-or-kill order
    Deal {
        ticker: String,

        #[arg(long)]
        account: u32,

        #[arg(long, value_enum)]
        side: SideArg,

        /// Percent of account value (buy) or of units held (sell)
        #[arg(long)]
        pct: f64,

        /// Pick one of several securities sharing the ticker
        #[arg(long)]
        sedol: Option<String>,

        /// Fail rather than place a fill-or-kill order when the market is closed
        #[arg(long)]
        no_fill_or_kill: bool,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// List pending orders of an account
    Pending { account: u32 },

    /// Cancel a pending order
    Cancel { account: u32, order_id: u64 },

    /// Render a saved HAR capture as markdown
    Report { har: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .init();

    if let Err(e) = run(cli) {
        match &e {
            Error::Aborted(msg) => println!("{msg}"),
            _ => eprintln!("Error: {e}"),
        }
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Command::Report { har } = &cli.command {
        print!("{}", commands::render_report(har)?);
        return Ok(());
    }

    let config = Config::load(&cli.config)?;
    let client = commands::connect(&config)?;

    let result = match cli.command {
        Command::Accounts => commands::show_accounts(&client),
        Command::Holdings { account } => commands::show_holdings(&client, account),
        Command::Search { query } => commands::show_search(&client, &query),
        Command::Deal {
            ticker,
            account,
            side,
            pct,
            sedol,
            no_fill_or_kill,
            force,
        } => {
            let mut request =
                DealRequest::new(ticker, account, side.into(), pct)?.allow_fill_or_kill(!no_fill_or_kill);
            if let Some(sedol) = sedol {
                request = request.with_sedol(sedol);
            }
            let mut audit = AuditLog::open(&config.audit_path())?;
            commands::run_deal(&client, &request, &DealOptions { force }, &mut audit).map(|_| ())
        }
        Command::Pending { account } => commands::show_pending(&client, account),
        Command::Cancel { account, order_id } => {
            let mut audit = AuditLog::open(&config.audit_path())?;
            commands::cancel_pending(&client, account, order_id, &mut audit)
        }
        Command::Report { .. } => Ok(()),
    };

    // Cookies and traffic are kept even when the command failed.
    commands::finish(&client, &config)?;
    result
}
