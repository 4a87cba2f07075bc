//! iExec Client — Entry Point
//!
//! Wiring sequence:
//! 1. Load `.env`, parse the command line
//! 2. Load config.toml + validate
//! 3. Init tracing (JSON structured logging on stderr)
//! 4. Read the signing key from IEXEC_PRIVATE_KEY
//! 5. Connect the selected chain (and the bridge peer when needed)
//! 6. Run the command; print a human summary or one raw JSON object
//!
//! Exits 0 on success and 1 on any surfaced error.

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

use iexec_client::adapters::api::{GatewayAuth, GatewayClient, GatewayOrderBook};
use iexec_client::adapters::chain::{connect_client, validate_contracts};
use iexec_client::config::loader::{load_config, load_signer};
use iexec_client::config::{AppConfig, ChainConfig};
use iexec_client::domain::bridge::BridgeProgress;
use iexec_client::domain::chain::TxOptions;
use iexec_client::domain::errors::SdkError;
use iexec_client::domain::order::{Order, OrderFields, OrderKind};
use iexec_client::domain::units::{
  NativeAmount, TokenAmount, format_native, format_token, parse_native, parse_token, split_amount,
};
use iexec_client::ports::contract_client::ContractClient;
use iexec_client::usecases::{AccountManager, BridgeOrchestrator, OrderManager, Settlement, WalletManager};

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser)]
#[command(name = "iexec", version)]
#[command(about = "iExec marketplace client: wallet, escrow account, orders, deals and the bridge")]
struct Cli {
  /// Path to the configuration file
  #[arg(long, global = true, default_value = "config.toml")]
  config: PathBuf,

  /// Chain to use (defaults to `default_chain`)
  #[arg(long, global = true)]
  chain: Option<String>,

  /// Recipient address
  #[arg(long, global = true)]
  to: Option<Address>,

  /// Skip confirmation prompts
  #[arg(long, global = true)]
  force: bool,

  /// Gas price override, e.g. "2 gwei" (a bare number is wei)
  #[arg(long, global = true)]
  gas_price: Option<String>,

  /// Confirmations to wait for, overriding the chain setting
  #[arg(long, global = true)]
  gas_confirms: Option<u64>,

  /// Print a single JSON object `{ok, ...}` instead of human output
  #[arg(long, global = true)]
  raw: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Escrow account operations
  Account {
    #[command(subcommand)]
    command: AccountCommands,
  },
  /// Wallet operations
  Wallet {
    #[command(subcommand)]
    command: WalletCommands,
  },
  /// Order signing, cancellation and publication
  Order {
    #[command(subcommand)]
    command: OrderCommands,
  },
  /// Deal operations
  Deal {
    #[command(subcommand)]
    command: DealCommands,
  },
  /// Chain configuration checks
  Chain {
    #[command(subcommand)]
    command: ChainCommands,
  },
}

/// Amount with an optional unit, as `1.5 RLC` or `"1.5 RLC"`.
#[derive(Args)]
struct AmountArgs {
  amount: String,
  unit: Option<String>,
}

impl AmountArgs {
  fn split(&self) -> Result<(&str, Option<&str>)> {
    match &self.unit {
      Some(unit) => Ok((self.amount.as_str(), Some(unit.as_str()))),
      None => Ok(split_amount(&self.amount)?),
    }
  }

  fn token(&self) -> Result<TokenAmount> {
    let (value, unit) = self.split()?;
    Ok(parse_token(value, unit)?)
  }

  fn native(&self) -> Result<NativeAmount> {
    let (value, unit) = self.split()?;
    Ok(parse_native(value, unit)?)
  }
}

#[derive(Subcommand)]
enum AccountCommands {
  /// Show the escrow stake and locked amounts
  Show { address: Option<Address> },
  /// Move tokens from the wallet into the escrow
  Deposit(AmountArgs),
  /// Move free stake back to the wallet
  Withdraw(AmountArgs),
}

#[derive(Subcommand)]
enum WalletCommands {
  /// Show wallet balances
  Show { address: Option<Address> },
  /// Send native coin (token chains only)
  #[command(name = "send-ether")]
  SendEther(AmountArgs),
  /// Send marketplace tokens
  #[command(name = "send-RLC")]
  SendRlc(AmountArgs),
  /// Send the whole wallet to --to
  Sweep,
  /// Bridge tokens from the mainchain to the sidechain
  BridgeToSidechain(AmountArgs),
  /// Bridge tokens from the sidechain to the mainchain
  BridgeToMainchain(AmountArgs),
  /// Resume waiting for the destination side of a bridge transfer sent from --chain
  BridgeWatch {
    /// Source-chain transaction of the transfer
    tx_hash: B256,
    /// Destination block to scan from (reported as `watchFrom` when a transfer is interrupted)
    #[arg(long)]
    from_block: u64,
  },
  /// Enterprise: convert RLC into eRLC
  Wrap(AmountArgs),
  /// Enterprise: convert eRLC back into RLC
  Unwrap(AmountArgs),
}

#[derive(Subcommand)]
enum OrderCommands {
  /// Create an order from a JSON file of fields and sign it
  Sign {
    #[arg(long)]
    kind: OrderKind,
    /// JSON object of order fields; missing fields take the defaults
    #[arg(long)]
    fields: PathBuf,
  },
  /// Show a published order
  Show {
    #[arg(long)]
    kind: OrderKind,
    hash: B256,
  },
  /// Cancel a signed order on-chain
  Cancel {
    #[arg(long)]
    kind: OrderKind,
    #[arg(long)]
    order: PathBuf,
  },
  /// Record an on-chain pre-signature
  Presign {
    #[arg(long)]
    kind: OrderKind,
    #[arg(long)]
    order: PathBuf,
  },
  /// Publish an order on the gateway (signing it first if needed)
  Publish {
    #[arg(long)]
    kind: OrderKind,
    #[arg(long)]
    order: PathBuf,
  },
  /// Withdraw a published order from the gateway
  Unpublish {
    #[arg(long)]
    kind: OrderKind,
    hash: B256,
  },
}

#[derive(Subcommand)]
enum DealCommands {
  /// Match signed orders into a deal
  Match {
    #[arg(long)]
    app: PathBuf,
    #[arg(long)]
    dataset: Option<PathBuf>,
    #[arg(long)]
    workerpool: PathBuf,
    #[arg(long)]
    request: PathBuf,
  },
}

#[derive(Subcommand)]
enum ChainCommands {
  /// Check that every configured contract has code
  Check,
}

// ============================================================================
// Output
// ============================================================================

/// Human summary plus the fields of the raw JSON object.
struct Report {
  message: String,
  fields: Value,
}

impl Report {
  fn new(message: impl Into<String>, fields: impl Serialize) -> Result<Self> {
    Ok(Self {
      message: message.into(),
      fields: serde_json::to_value(fields).context("Failed to serialize the result")?,
    })
  }
}

fn print_report(raw: bool, report: Report) {
  if raw {
    let mut object = Map::new();
    object.insert("ok".to_string(), Value::Bool(true));
    match report.fields {
      Value::Object(fields) => object.extend(fields),
      Value::Null => {}
      other => {
        object.insert("result".to_string(), other);
      }
    }
    println!("{}", Value::Object(object));
    return;
  }

  println!("{}", report.message);
  if let Value::Object(fields) = report.fields {
    for (key, value) in fields {
      match value {
        Value::String(s) => println!("  {key}: {s}"),
        other => println!("  {key}: {other}"),
      }
    }
  }
}

fn print_error(raw: bool, error: &anyhow::Error) {
  let sdk = error.downcast_ref::<SdkError>();
  let (name, message) = match sdk {
    Some(sdk) => (sdk.name(), sdk.to_string()),
    None => ("Error", format!("{error:#}")),
  };
  let resume = match sdk {
    Some(SdkError::Bridge {
      source_tx_hash,
      watch_from,
      ..
    }) => Some((*source_tx_hash, *watch_from)),
    _ => None,
  };

  if raw {
    let mut body = json!({"name": name, "message": message});
    if let Some((source_tx_hash, watch_from)) = resume {
      body["sourceTxHash"] = json!(source_tx_hash);
      body["watchFrom"] = json!(watch_from);
    }
    println!("{}", json!({"ok": false, "error": body}));
    return;
  }

  eprintln!("{name}: {message}");
  if let Some((source_tx_hash, Some(from_block))) = resume {
    eprintln!("Resume with: iexec wallet bridge-watch {source_tx_hash} --from-block {from_block}");
  }
}

fn init_tracing(level: &str) {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
    )
    .with_writer(std::io::stderr)
    .json()
    .init();
}

// ============================================================================
// Session
// ============================================================================

/// Everything a command needs besides its own arguments.
struct Session {
  config: AppConfig,
  chain: ChainConfig,
  signer: Option<PrivateKeySigner>,
  opts: TxOptions,
  gas_confirms: Option<u64>,
  to: Option<Address>,
  force: bool,
  raw: bool,
}

impl Session {
  async fn connect(&self, chain: &ChainConfig, with_signer: bool) -> Result<ContractClient> {
    let mut ctx = chain.to_context();
    if let Some(confirms) = self.gas_confirms {
      ctx.confirms = confirms;
    }
    let signer = if with_signer { self.signer.clone() } else { None };
    connect_client(ctx, &chain.rpc_url, signer)
      .await
      .with_context(|| format!("Failed to connect to chain {}", chain.name))
  }

  async fn client(&self) -> Result<ContractClient> {
    self.connect(&self.chain, true).await
  }

  async fn wallet(&self) -> Result<WalletManager> {
    Ok(WalletManager::new(self.client().await?))
  }

  fn owner(&self, address: Option<Address>) -> Result<Address> {
    match (address, &self.signer) {
      (Some(address), _) => Ok(address),
      (None, Some(signer)) => Ok(signer.address()),
      (None, None) => bail!("no address given and no signing key configured"),
    }
  }

  fn recipient(&self) -> Result<Address> {
    self.to.context("--to is required")
  }

  /// Ask before moving value unless `--force` or `--raw` is set.
  async fn confirm(&self, question: &str) -> Result<()> {
    if self.force || self.raw {
      return Ok(());
    }
    eprint!("{question} [y/N] ");
    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
      .read_line(&mut answer)
      .await
      .context("Failed to read the confirmation")?;
    if matches!(answer.trim(), "y" | "Y" | "yes") {
      Ok(())
    } else {
      Err(SdkError::Aborted.into())
    }
  }

  fn order_manager(&self, client: ContractClient) -> Result<OrderManager> {
    let mut manager = OrderManager::new(client.clone());
    if let Some(url) = &client.context().gateway_url {
      let http = GatewayClient::new(self.config.gateway.client_config(url))?;
      let auth = self.signer.clone().map(GatewayAuth::new);
      manager = manager.with_orderbook(Arc::new(GatewayOrderBook::new(http, client.context().chain_id, auth)));
    }
    Ok(manager)
  }
}

fn tx_options(gas_price: Option<&str>) -> Result<TxOptions> {
  let gas_price = match gas_price {
    Some(input) => {
      let (value, unit) = split_amount(input)?;
      let wei = parse_native(value, unit)?;
      Some(u128::try_from(wei.raw()).context("--gas-price is too large")?)
    }
    None => None,
  };
  Ok(TxOptions {
    gas_price,
    gas_limit: None,
  })
}

async fn read_order(path: &Path, kind: OrderKind) -> Result<Order> {
  let json = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("Failed to read {}", path.display()))?;
  Ok(Order::from_json(kind, &json)?)
}

// ============================================================================
// Commands
// ============================================================================

async fn run_account(session: &Session, command: AccountCommands) -> Result<Report> {
  let client = session.client().await?;
  let manager = AccountManager::new(client);
  match command {
    AccountCommands::Show { address } => {
      let owner = session.owner(address)?;
      let balance = manager.show(owner).await?;
      Report::new(
        format!(
          "Account {owner}: stake {} RLC, locked {} RLC",
          format_token(balance.stake),
          format_token(balance.locked)
        ),
        balance,
      )
    }
    AccountCommands::Deposit(amount) => {
      let amount = amount.token()?;
      session.confirm(&format!("Deposit {} RLC into the escrow?", format_token(amount))).await?;
      let tx_hash = manager.deposit(amount, session.opts).await?;
      Report::new(
        format!("Deposited {} RLC", format_token(amount)),
        json!({"amount": amount, "txHash": tx_hash}),
      )
    }
    AccountCommands::Withdraw(amount) => {
      let amount = amount.token()?;
      session.confirm(&format!("Withdraw {} RLC from the escrow?", format_token(amount))).await?;
      let tx_hash = manager.withdraw(amount, session.opts).await?;
      Report::new(
        format!("Withdrawn {} RLC", format_token(amount)),
        json!({"amount": amount, "txHash": tx_hash}),
      )
    }
  }
}

async fn run_wallet(session: &Session, command: WalletCommands) -> Result<Report> {
  match command {
    WalletCommands::Show { address } => {
      let owner = session.owner(address)?;
      let balance = session.wallet().await?.show(owner).await?;
      let native = balance
        .native
        .map(|wei| format!(", {} ETH", format_native(wei)))
        .unwrap_or_default();
      Report::new(
        format!("Wallet {owner}: {} RLC{native}", format_token(balance.token)),
        balance,
      )
    }
    WalletCommands::SendEther(amount) => {
      let (amount, to) = (amount.native()?, session.recipient()?);
      session.confirm(&format!("Send {} ETH to {to}?", format_native(amount))).await?;
      let tx_hash = session.wallet().await?.send_native(to, amount, session.opts).await?;
      Report::new(
        format!("Sent {} ETH to {to}", format_native(amount)),
        json!({"amount": amount, "to": to, "txHash": tx_hash}),
      )
    }
    WalletCommands::SendRlc(amount) => {
      let (amount, to) = (amount.token()?, session.recipient()?);
      session.confirm(&format!("Send {} RLC to {to}?", format_token(amount))).await?;
      let tx_hash = session.wallet().await?.send_token(to, amount, session.opts).await?;
      Report::new(
        format!("Sent {} RLC to {to}", format_token(amount)),
        json!({"amount": amount, "to": to, "txHash": tx_hash}),
      )
    }
    WalletCommands::Sweep => {
      let to = session.recipient()?;
      session.confirm(&format!("Send the whole wallet to {to}?")).await?;
      let result = session.wallet().await?.sweep(to, session.opts).await?;
      for error in &result.errors {
        warn!(%error, "Sweep incomplete");
      }
      let message = if result.errors.is_empty() {
        format!("Wallet swept to {to}")
      } else {
        format!("Wallet partially swept to {to}")
      };
      Report::new(message, result)
    }
    WalletCommands::BridgeToSidechain(amount) => run_bridge(session, amount.token()?, true).await,
    WalletCommands::BridgeToMainchain(amount) => run_bridge(session, amount.token()?, false).await,
    WalletCommands::BridgeWatch { tx_hash, from_block } => run_bridge_watch(session, tx_hash, from_block).await,
    WalletCommands::Wrap(amount) => {
      let amount = amount.token()?;
      session.confirm(&format!("Wrap {} RLC into eRLC?", format_token(amount))).await?;
      let tx_hash = session.wallet().await?.wrap(amount, session.opts).await?;
      Report::new(
        format!("Wrapped {} RLC", format_token(amount)),
        json!({"amount": amount, "txHash": tx_hash}),
      )
    }
    WalletCommands::Unwrap(amount) => {
      let amount = amount.token()?;
      session.confirm(&format!("Unwrap {} eRLC into RLC?", format_token(amount))).await?;
      let tx_hash = session.wallet().await?.unwrap(amount, session.opts).await?;
      Report::new(
        format!("Unwrapped {} eRLC", format_token(amount)),
        json!({"amount": amount, "txHash": tx_hash}),
      )
    }
  }
}

enum BridgeStep {
  Progress(Option<BridgeProgress>),
  Interrupt,
}

/// Chain on the other side of the selected chain's bridge.
fn bridge_peer(session: &Session) -> Result<&ChainConfig> {
  let source_chain = &session.chain;
  let peer = source_chain
    .bridge
    .as_ref()
    .map(|bridge| bridge.bridged_chain.as_str())
    .with_context(|| format!("chain {} has no bridge configured", source_chain.name))?;
  session
    .config
    .chain(Some(peer))
    .with_context(|| format!("bridged chain {peer} is not declared"))
}

async fn run_bridge(session: &Session, amount: TokenAmount, to_sidechain: bool) -> Result<Report> {
  let source_chain = &session.chain;
  if source_chain.is_native == to_sidechain {
    bail!(
      "chain {} cannot bridge {}",
      source_chain.name,
      if to_sidechain { "to the sidechain" } else { "to the mainchain" }
    );
  }
  let peer_chain = bridge_peer(session)?;
  let peer = &peer_chain.name;

  let (source, destination) = tokio::try_join!(session.client(), session.connect(peer_chain, false))?;
  session
    .confirm(&format!("Bridge {} RLC from {} to {peer}?", format_token(amount), source_chain.name))
    .await?;

  let mut handle = BridgeOrchestrator::new(source)
    .with_destination(destination)
    .spawn(amount, session.opts);
  info!(transfer_id = %handle.transfer_id, "Bridge transfer started");

  let mut interrupted = false;
  loop {
    let step = tokio::select! {
      event = handle.progress.recv() => BridgeStep::Progress(event),
      _ = tokio::signal::ctrl_c(), if !interrupted => BridgeStep::Interrupt,
    };
    match step {
      BridgeStep::Progress(Some(event)) => {
        if !session.raw {
          eprintln!("{}", event.state());
        }
      }
      BridgeStep::Progress(None) => break,
      BridgeStep::Interrupt => {
        warn!(transfer_id = %handle.transfer_id, "Interrupted, cancelling the bridge transfer");
        interrupted = true;
        handle.cancel();
      }
    }
  }

  let outcome = handle.outcome().await?;
  Report::new(
    format!("Bridged {} RLC from {} to {peer}", format_token(amount), source_chain.name),
    outcome,
  )
}

async fn run_bridge_watch(session: &Session, source_tx_hash: B256, from_block: u64) -> Result<Report> {
  let peer_chain = bridge_peer(session)?;
  let (source, destination) =
    tokio::try_join!(session.connect(&session.chain, false), session.connect(peer_chain, false))?;

  let (cancel_tx, cancel_rx) = watch::channel(false);
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!(%source_tx_hash, "Interrupted, stopping the receive watch");
      cancel_tx.send_replace(true);
    }
  });

  info!(%source_tx_hash, from_block, peer = %peer_chain.name, "Watching for the bridge receive");
  let receive_tx_hash = BridgeOrchestrator::new(source)
    .with_destination(destination)
    .watch_receive(source_tx_hash, from_block, cancel_rx)
    .await?;
  Report::new(
    format!("Bridge transfer {source_tx_hash} received on {}", peer_chain.name),
    json!({"sendTxHash": source_tx_hash, "receiveTxHash": receive_tx_hash}),
  )
}

async fn run_order(session: &Session, command: OrderCommands) -> Result<Report> {
  let manager = session.order_manager(session.client().await?)?;
  match command {
    OrderCommands::Sign { kind, fields } => {
      let json = tokio::fs::read_to_string(&fields)
        .await
        .with_context(|| format!("Failed to read {}", fields.display()))?;
      let fields: OrderFields = serde_json::from_str(&json).context("Invalid order fields")?;
      let order = manager.create(kind, fields)?;
      let signed = manager.sign(&order).await?;
      let order_hash = manager.hash(&signed).await?;
      Report::new(
        format!("Signed {kind} {order_hash}"),
        json!({"orderHash": order_hash, "order": signed}),
      )
    }
    OrderCommands::Show { kind, hash } => {
      let published = manager
        .show(kind, hash)
        .await?
        .ok_or_else(|| SdkError::validation(format!("{kind} {hash} is not published")))?;
      Report::new(format!("{kind} {hash}"), published)
    }
    OrderCommands::Cancel { kind, order } => {
      let order = read_order(&order, kind).await?;
      session.confirm(&format!("Cancel this {kind}?")).await?;
      let tx_hash = manager.cancel(&order, session.opts).await?;
      Report::new(format!("{kind} cancelled"), json!({"txHash": tx_hash}))
    }
    OrderCommands::Presign { kind, order } => {
      let order = read_order(&order, kind).await?;
      let tx_hash = manager.presign(&order, session.opts).await?;
      Report::new(format!("{kind} pre-signed"), json!({"txHash": tx_hash}))
    }
    OrderCommands::Publish { kind, order } => {
      let order = read_order(&order, kind).await?;
      let order_hash = manager.publish(&order).await?;
      Report::new(format!("{kind} published"), json!({"orderHash": order_hash}))
    }
    OrderCommands::Unpublish { kind, hash } => {
      let order_hash = manager.unpublish(kind, hash).await?;
      Report::new(format!("{kind} unpublished"), json!({"orderHash": order_hash}))
    }
  }
}

async fn run_deal(session: &Session, command: DealCommands) -> Result<Report> {
  let DealCommands::Match {
    app,
    dataset,
    workerpool,
    request,
  } = command;

  let Order::App(app) = read_order(&app, OrderKind::App).await? else {
    bail!("{} is not an app order", app.display());
  };
  let Order::Workerpool(workerpool) = read_order(&workerpool, OrderKind::Workerpool).await? else {
    bail!("{} is not a workerpool order", workerpool.display());
  };
  let Order::Request(request) = read_order(&request, OrderKind::Request).await? else {
    bail!("{} is not a request order", request.display());
  };
  let dataset = match dataset {
    Some(path) => match read_order(&path, OrderKind::Dataset).await? {
      Order::Dataset(order) => Some(order),
      _ => bail!("{} is not a dataset order", path.display()),
    },
    None => None,
  };

  let settlement = Settlement::new(session.client().await?);
  let deal = settlement
    .match_orders(&app, dataset.as_ref(), &workerpool, &request, session.opts)
    .await?;
  Report::new(
    format!("Deal {} created with {} task(s)", deal.deal_id, deal.bot_size),
    deal,
  )
}

async fn run_chain(session: &Session, command: ChainCommands) -> Result<Report> {
  let ChainCommands::Check = command;
  let client = session.connect(&session.chain, false).await?;
  let checks = validate_contracts(client.chain(), client.context()).await?;
  if let Some(missing) = checks.iter().find(|check| !check.has_code) {
    return Err(
      SdkError::configuration(format!(
        "no contract deployed at {} ({}) on {}",
        missing.address, missing.name, session.chain.name
      ))
      .into(),
    );
  }
  Report::new(
    format!("{} contract(s) verified on {}", checks.len(), session.chain.name),
    json!({"contracts": checks}),
  )
}

async fn run(cli: Cli) -> Result<Report> {
  let config = load_config(&cli.config.to_string_lossy()).context("Failed to load configuration")?;
  init_tracing(&config.log_level);

  let chain = config
    .chain(cli.chain.as_deref())
    .cloned()
    .ok_or_else(|| SdkError::configuration(format!("unknown chain {}", cli.chain.as_deref().unwrap_or_default())))?;
  let signer = load_signer()?;

  info!(
    version = env!("CARGO_PKG_VERSION"),
    chain = %chain.name,
    chain_id = chain.id,
    signer = ?signer.as_ref().map(PrivateKeySigner::address),
    "Starting iexec client"
  );

  let session = Session {
    opts: tx_options(cli.gas_price.as_deref())?,
    config,
    chain,
    signer,
    gas_confirms: cli.gas_confirms,
    to: cli.to,
    force: cli.force,
    raw: cli.raw,
  };

  match cli.command {
    Commands::Account { command } => run_account(&session, command).await,
    Commands::Wallet { command } => run_wallet(&session, command).await,
    Commands::Order { command } => run_order(&session, command).await,
    Commands::Deal { command } => run_deal(&session, command).await,
    Commands::Chain { command } => run_chain(&session, command).await,
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  let _ = dotenvy::dotenv();
  let cli = Cli::parse();
  let raw = cli.raw;

  match run(cli).await {
    Ok(report) => {
      print_report(raw, report);
      ExitCode::SUCCESS
    }
    Err(e) => {
      print_error(raw, &e);
      ExitCode::FAILURE
    }
  }
}
