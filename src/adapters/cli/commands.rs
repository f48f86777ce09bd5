//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the Lynx engine.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::jupiter::JupiterClient;
use crate::adapters::notify::{LogNotifier, TelegramConfig, TelegramNotifier};
use crate::adapters::solana::{parse_commitment, SolanaClient};
use crate::adapters::store::JsonFileStore;
use crate::application::{FundTransfer, Services, TradingSupervisor};
use crate::config::{load_config, Config};
use crate::domain::{lamports_to_sol, SharedState, UserId, WSOL_MINT};
use crate::ports::{LedgerPort, Notifier, WalletStore};

/// Lynx - Agent wallet buy/hold/sell cycles for Solana/Jupiter
#[derive(Parser, Debug)]
#[command(
    name = "lynx",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Agent wallet buy/hold/sell cycles for Solana/Jupiter",
    long_about = "Lynx runs one buy/hold/sell cycle per agent wallet against a single \
                  token, routing every swap through the Jupiter aggregator, and moves SOL \
                  between a user's root wallet and their agent wallets."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        default_value = "config/lynx.toml"
    )]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start agent cycles for one or more users until Ctrl+C
    Run(RunCmd),

    /// Send SOL from the root wallet to every agent wallet
    Distribute(DistributeCmd),

    /// Move SOL from every agent wallet back to the root wallet
    Sweep(SweepCmd),

    /// Send SOL from the root wallet to the configured withdraw address
    Withdraw(WithdrawCmd),

    /// Show SOL balances of a user's wallets
    Balances(BalancesCmd),

    /// Get a quote for a token swap
    Quote(QuoteCmd),
}

/// Start trading loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// User ids to trade for
    #[arg(short, long = "user", value_name = "ID", required = true)]
    pub users: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct DistributeCmd {
    #[arg(short, long, value_name = "ID")]
    pub user: String,

    /// SOL per agent wallet
    #[arg(short, long, value_name = "SOL")]
    pub amount: Decimal,
}

#[derive(Parser, Debug)]
pub struct SweepCmd {
    #[arg(short, long, value_name = "ID")]
    pub user: String,

    /// SOL left in each agent wallet (default from config)
    #[arg(long, value_name = "SOL")]
    pub reserve: Option<Decimal>,
}

#[derive(Parser, Debug)]
pub struct WithdrawCmd {
    #[arg(short, long, value_name = "ID")]
    pub user: String,

    #[arg(short, long, value_name = "SOL")]
    pub amount: Decimal,
}

#[derive(Parser, Debug)]
pub struct BalancesCmd {
    #[arg(short, long, value_name = "ID")]
    pub user: String,
}

/// Get swap quote
#[derive(Parser, Debug)]
pub struct QuoteCmd {
    /// Input mint address
    #[arg(value_name = "INPUT")]
    pub input_mint: String,

    /// Output mint address
    #[arg(value_name = "OUTPUT")]
    pub output_mint: String,

    /// Amount in the input token's base units
    #[arg(value_name = "AMOUNT")]
    pub amount: u64,

    /// Slippage tolerance in percent (default from config)
    #[arg(long, value_name = "PCT")]
    pub slippage: Option<Decimal>,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = load_config(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;

    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Run(cmd) => run_command(&config, cmd).await,
        Command::Distribute(cmd) => distribute_command(&config, cmd).await,
        Command::Sweep(cmd) => sweep_command(&config, cmd).await,
        Command::Withdraw(cmd) => withdraw_command(&config, cmd).await,
        Command::Balances(cmd) => balances_command(&config, cmd).await,
        Command::Quote(cmd) => quote_command(&config, cmd).await,
    }
}

/// Initialize logging system. RUST_LOG wins over the flags, the flags win
/// over `[logging] level`.
fn init_logging(verbose: bool, debug: bool, level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn build_ledger(config: &Config) -> Result<Arc<SolanaClient>> {
    let commitment = parse_commitment(&config.solana.commitment)
        .with_context(|| format!("Unknown commitment level {}", config.solana.commitment))?;
    Ok(Arc::new(SolanaClient::new(
        config.solana.get_rpc_url(),
        commitment,
        std::time::Duration::from_secs(config.solana.timeout_secs),
    )))
}

fn build_store(config: &Config) -> Arc<JsonFileStore> {
    Arc::new(JsonFileStore::new(config.store.resolved_path()))
}

fn build_jupiter(config: &Config, ledger: Arc<dyn LedgerPort>) -> Result<JupiterClient> {
    JupiterClient::new(config.jupiter_config(), config.retry_policy(), ledger)
        .context("Failed to create Jupiter client")
}

fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    if !config.alerts.telegram_enabled {
        return Ok(Arc::new(LogNotifier));
    }
    let Some(token) = config.alerts.get_bot_token() else {
        bail!("Telegram alerts enabled but no bot token set (alerts.telegram_bot_token or TELEGRAM_BOT_TOKEN)");
    };
    let notifier = TelegramNotifier::new(TelegramConfig::new(token))
        .context("Failed to create Telegram client")?;
    Ok(Arc::new(notifier))
}

fn build_funds(config: &Config) -> Result<FundTransfer> {
    let ledger = build_ledger(config)?;
    let store: Arc<dyn WalletStore> = build_store(config);
    Ok(FundTransfer::new(store, ledger, config.funds_config()).with_notifier(build_notifier(config)?))
}

/// Handle run command
async fn run_command(config: &Config, cmd: RunCmd) -> Result<()> {
    tracing::info!("Starting Lynx agent engine...");

    let ledger = build_ledger(config)?;
    tracing::info!("RPC: {}", ledger.url());
    let jupiter = build_jupiter(config, ledger.clone())?;
    let store = build_store(config);
    tracing::info!("Store: {}", store.path().display());

    let services = Services::new(store, ledger, Arc::new(jupiter), Arc::new(SharedState::new()))
        .with_notifier(build_notifier(config)?);
    let supervisor = TradingSupervisor::new(services, config.cycle_config(), config.spawn_stagger());

    let mut started = 0;
    for user in cmd.users.iter().map(UserId::new) {
        match supervisor.enable_trading(&user).await {
            Ok(0) => println!("User {}: nothing to trade (no token or no agent wallets)", user),
            Ok(count) => {
                println!("User {}: trading with {} agent(s)", user, count);
                started += 1;
            }
            Err(e) => println!("User {}: {}", user, e),
        }
    }

    if started == 0 {
        bail!("No user could be started");
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    tracing::info!("Shutdown signal received, waiting for agents to finish their step");

    for (user, summaries) in supervisor.shutdown().await {
        for (agent, summary) in summaries {
            println!(
                "User {} agent {}: {} buys ({} failed), {} sells ({} failed, {} abandoned)",
                user,
                agent,
                summary.buys,
                summary.failed_buys,
                summary.sells,
                summary.failed_sells,
                summary.abandoned
            );
        }
    }

    tracing::info!("Lynx stopped");
    Ok(())
}

async fn distribute_command(config: &Config, cmd: DistributeCmd) -> Result<()> {
    let funds = build_funds(config)?;
    let report = funds
        .distribute(&UserId::new(&cmd.user), cmd.amount)
        .await
        .context("Distribution failed")?;

    println!("{}", report);
    println!(
        "Sent {} SOL to {} agent wallet(s), {} failed",
        cmd.amount,
        report.succeeded(),
        report.failed()
    );
    Ok(())
}

async fn sweep_command(config: &Config, cmd: SweepCmd) -> Result<()> {
    let funds = build_funds(config)?;
    let report = funds
        .sweep(&UserId::new(&cmd.user), cmd.reserve)
        .await
        .context("Sweep failed")?;

    println!("{}", report);
    if !report.is_empty() {
        println!("Collected {:.6} SOL in total", report.total_sol());
    }
    Ok(())
}

async fn withdraw_command(config: &Config, cmd: WithdrawCmd) -> Result<()> {
    let funds = build_funds(config)?;
    let signature = funds
        .withdraw(&UserId::new(&cmd.user), cmd.amount)
        .await
        .context("Withdraw failed")?;

    println!("Withdrew {} SOL: {}", cmd.amount, signature);
    Ok(())
}

async fn balances_command(config: &Config, cmd: BalancesCmd) -> Result<()> {
    let funds = build_funds(config)?;
    let balances = funds
        .balances(&UserId::new(&cmd.user))
        .await
        .context("Failed to read balances")?;

    if balances.is_empty() {
        println!("No wallets for user {}", cmd.user);
        return Ok(());
    }

    for wallet in balances {
        let address = wallet
            .pubkey
            .map(|p| p.to_string())
            .unwrap_or_else(|| "<undecodable key>".to_string());
        match wallet.lamports {
            Some(lamports) => println!(
                "{:<12} {:<44} {:.6} SOL",
                wallet.label,
                address,
                lamports_to_sol(lamports)
            ),
            None => println!("{:<12} {:<44} unavailable", wallet.label, address),
        }
    }
    Ok(())
}

async fn quote_command(config: &Config, cmd: QuoteCmd) -> Result<()> {
    let ledger = build_ledger(config)?;
    let jupiter = build_jupiter(config, ledger)?;
    let slippage = cmd
        .slippage
        .unwrap_or(config.jupiter.default_slippage_pct);

    let quote = jupiter
        .get_quote(&cmd.input_mint, &cmd.output_mint, cmd.amount, slippage)
        .await
        .context("Failed to get quote")?;

    println!("Quote: {} {} -> {} {}", quote.input_amount(), cmd.input_mint, quote.output_amount(), cmd.output_mint);
    if let Some(bps) = quote.slippage_bps {
        println!("Slippage: {} bps", bps);
    }
    let labels = quote.route_labels();
    if !labels.is_empty() {
        println!("Route: {}", labels.join(" -> "));
    }
    if cmd.input_mint == WSOL_MINT {
        println!("Input: {} SOL", lamports_to_sol(cmd.amount));
    }
    Ok(())
}
