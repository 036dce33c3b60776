use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use presale_sdk::config::{parse_chain_id, EnvironmentConfig, PresaleConfig};
use presale_sdk::protocols::presale::DEFAULT_DEPOSIT_AMOUNT;
use presale_sdk::{
    ActionOutcome, Address, Error, EvmWallet, PresaleClient, PresaleClientBuilder, ReadOutcome,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

const ENV_MNEMONIC: &str = "PRESALE_MNEMONIC";
const ENV_PRIVATE_KEY: &str = "PRESALE_PRIVATE_KEY";

#[derive(Debug, Parser)]
#[command(
    name = "presale-cli",
    version,
    about = "Read and participate in a phased token presale"
)]
struct Cli {
    /// Chain id of the wallet's network (decimal or 0x-hex). Queried from
    /// the RPC endpoint when omitted.
    #[arg(long, global = true, value_parser = parse_chain_id_arg)]
    chain_id: Option<u64>,

    /// Endpoint used to detect the chain id
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// BIP-44 account index when signing with PRESALE_MNEMONIC
    #[arg(long, global = true, default_value_t = 0)]
    account_index: u32,

    /// Read for this address when no signing key is set
    #[arg(long, global = true)]
    account: Option<Address>,

    /// Print JSON instead of rows
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show token, sale, status and buyer information
    Info,
    /// Deposit native currency while the sale is active
    Buy {
        /// Amount in the network's native currency, e.g. 2.5
        #[arg(long, default_value = DEFAULT_DEPOSIT_AMOUNT)]
        amount: String,
    },
    /// Claim allocated tokens after a successful sale
    Claim,
    /// Withdraw the deposit after a failed sale
    Withdraw,
    /// Write a configuration file with the built-in defaults
    InitConfig {
        /// Target file; defaults to $PRESALE_CONFIG_DIR/presale.toml or config/presale.toml
        path: Option<PathBuf>,
    },
}

fn parse_chain_id_arg(value: &str) -> Result<u64, String> {
    parse_chain_id(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Command::InitConfig { path } = &cli.command {
        let path = path.clone().unwrap_or_else(PresaleConfig::default_path);
        EnvironmentConfig::generate_default_config()
            .save_to_file(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = PresaleConfig::load().context("Failed to load configuration")?;
    init_tracing(&config);

    let mut builder = PresaleClientBuilder::new().with_config(config);
    if let Some(wallet) = load_wallet(cli.account_index)? {
        debug!("Signing as {}", wallet.address());
        builder = builder.with_wallet(Arc::new(wallet));
    }
    if let Some(account) = cli.account {
        builder = builder.with_account(account);
    }
    let client = builder.build()?;

    let resolution = match cli.chain_id {
        Some(chain_id) => client.connect_chain(Some(chain_id)),
        None => {
            let rpc_url = cli
                .rpc_url
                .clone()
                .or_else(|| client.default_rpc_url().map(str::to_string))
                .context("No RPC endpoint to detect the chain id from; pass --chain-id")?;
            client.connect_rpc(&rpc_url).await?
        }
    };
    if let Some(warning) = resolution.warning() {
        bail!(warning);
    }
    if client.account().is_none() {
        bail!(
            "{}: set {} or {}, or pass --account",
            Error::WalletUnconnected,
            ENV_MNEMONIC,
            ENV_PRIVATE_KEY
        );
    }

    refresh(&client).await?;

    let outcome = match &cli.command {
        Command::Info | Command::InitConfig { .. } => None,
        Command::Buy { amount } => Some(client.buy(amount).await),
        Command::Claim => Some(client.claim().await),
        Command::Withdraw => Some(client.withdraw().await),
    };

    if let Some(outcome) = outcome {
        report(outcome)?;
        // Show the post-action state
        refresh(&client).await?;
    }

    print_view(&client, cli.json)
}

fn init_tracing(config: &PresaleConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.log_format.as_str() {
        "json" => subscriber.json().init(),
        "pretty" => subscriber.pretty().init(),
        _ => subscriber.compact().init(),
    }
}

fn load_wallet(account_index: u32) -> Result<Option<EvmWallet>> {
    if let Ok(mnemonic) = std::env::var(ENV_MNEMONIC) {
        let mnemonic = SecretString::new(mnemonic);
        let wallet = EvmWallet::from_mnemonic(mnemonic.expose_secret(), account_index)
            .with_context(|| format!("Invalid {}", ENV_MNEMONIC))?;
        return Ok(Some(wallet));
    }
    if let Ok(key) = std::env::var(ENV_PRIVATE_KEY) {
        let key = Zeroizing::new(key);
        let wallet = EvmWallet::from_private_key(&key)
            .with_context(|| format!("Invalid {}", ENV_PRIVATE_KEY))?;
        return Ok(Some(wallet));
    }
    Ok(None)
}

async fn refresh(client: &PresaleClient) -> Result<()> {
    match client.refresh().await? {
        ReadOutcome::Applied(snapshot) => {
            for failure in &snapshot.failures {
                warn!("{} ({})", failure.message(), failure.reason);
            }
        }
        ReadOutcome::Stale => warn!("Wallet changed during the read; result discarded"),
    }
    Ok(())
}

fn report(outcome: Result<ActionOutcome, Error>) -> Result<()> {
    match outcome {
        Ok(ActionOutcome::Submitted { action, tx_hash }) => {
            println!("{} ({})", action.success_message(), tx_hash);
            Ok(())
        }
        Ok(ActionOutcome::NoOp) => {
            println!("Nothing to do in the current phase");
            Ok(())
        }
        Err(e) => {
            if let Some(reason) = e.reason() {
                debug!("{}", reason);
            }
            bail!(e)
        }
    }
}

fn print_view(client: &PresaleClient, json: bool) -> Result<()> {
    let Some(view) = client.view() else {
        bail!("No presale data for {}", client.session().resolution());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", view);
    }
    Ok(())
}
