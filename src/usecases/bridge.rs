//! Bridge Use Case - Cross-Chain Transfer Orchestration
//!
//! Drives one transfer through
//! `VALIDATING -> POLICY_CHECKED -> LIMIT_CHECKED -> SENT -> WAITING_RECEIVE -> RECEIVED`
//! and publishes every step on a progress channel. Anything before the
//! send can be aborted; once the source transaction is out, every failure
//! (cancellation included) carries its hash as a `BridgeError`.
//!
//! The daily quota is global to the bridge: every transfer into it since
//! the first block of the bridge's current day counts.

use std::future::Future;

use alloy::primitives::{B256, U256};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::bridge::{
  BridgeDirection, BridgeLimits, BridgeProgress, BridgeState, day_start_timestamp, spent_since, walk_step,
};
use crate::domain::chain::TxOptions;
use crate::domain::errors::{SdkError, SdkResult};
use crate::domain::units::{TokenAmount, to_native_unit};
use crate::ports::abi::{IexecBridge, IexecToken};
use crate::ports::contract_client::ContractClient;

use super::balance::{ensure_positive, ensure_token_funds, ensure_whitelisted};

fn as_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.collect_str(value)
}

/// Final report of a transfer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeOutcome {
  pub transfer_id: Uuid,
  pub source_chain: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub destination_chain: Option<String>,
  /// Requested amount in nRLC.
  pub amount: TokenAmount,
  /// Amount actually sent, in source-chain units.
  #[serde(serialize_with = "as_decimal")]
  pub chain_amount: U256,
  #[serde(rename = "sendTxHash")]
  pub source_tx_hash: B256,
  #[serde(rename = "receiveTxHash", skip_serializing_if = "Option::is_none")]
  pub receive_tx_hash: Option<B256>,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
}

/// Resolves once cancellation is requested. A dropped sender never cancels.
async fn cancelled(mut cancel: watch::Receiver<bool>) {
  loop {
    if *cancel.borrow_and_update() {
      return;
    }
    if cancel.changed().await.is_err() {
      std::future::pending::<()>().await;
    }
  }
}

/// Run `fut` unless cancellation wins first.
async fn or_abort<T>(cancel: &watch::Receiver<bool>, fut: impl Future<Output = SdkResult<T>>) -> SdkResult<T> {
  tokio::select! {
    biased;
    () = cancelled(cancel.clone()) => Err(SdkError::Aborted),
    result = fut => result,
  }
}

/// Current state plus the optional progress sink.
struct Tracker {
  transfer_id: Uuid,
  state: BridgeState,
  sink: Option<mpsc::UnboundedSender<BridgeProgress>>,
}

impl Tracker {
  fn new(transfer_id: Uuid, sink: Option<mpsc::UnboundedSender<BridgeProgress>>) -> Self {
    Self {
      transfer_id,
      state: BridgeState::Validating,
      sink,
    }
  }

  fn emit(&mut self, event: BridgeProgress) -> SdkResult<()> {
    self.state = self.state.advance(event.state())?;
    info!(transfer_id = %self.transfer_id, state = %self.state, "Bridge transfer progressed");
    if let Some(sink) = &self.sink {
      if sink.send(event).is_err() {
        debug!(transfer_id = %self.transfer_id, "Progress receiver dropped");
      }
    }
    Ok(())
  }

  fn fail(&mut self, error: &SdkError) {
    if self.state.is_terminal() {
      return;
    }
    self.state = BridgeState::Failed;
    warn!(transfer_id = %self.transfer_id, error = %error, "Bridge transfer failed");
    if let Some(sink) = &self.sink {
      let _ = sink.send(BridgeProgress::Failed {
        error: error.to_string(),
      });
    }
  }
}

/// What the checks established before anything is sent.
#[derive(Debug, Clone, Copy)]
struct Prepared {
  chain_amount: U256,
}

/// A transfer running in the background.
pub struct BridgeHandle {
  pub transfer_id: Uuid,
  /// Progress events, ending with `Received`/`Failed` (or `Sent` without a destination).
  pub progress: mpsc::UnboundedReceiver<BridgeProgress>,
  cancel: watch::Sender<bool>,
  task: JoinHandle<SdkResult<BridgeOutcome>>,
}

impl BridgeHandle {
  /// Abort before the send, or stop the receive watch after it.
  pub fn cancel(&self) {
    self.cancel.send_replace(true);
  }

  /// Wait for the transfer task; a panic inside it is resumed here.
  pub async fn outcome(self) -> SdkResult<BridgeOutcome> {
    match self.task.await {
      Ok(result) => result,
      Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
      Err(_) => Err(SdkError::Aborted),
    }
  }
}

/// Moves value from `source` to the paired chain across the bridge.
#[derive(Clone)]
pub struct BridgeOrchestrator {
  source: ContractClient,
  destination: Option<ContractClient>,
}

impl BridgeOrchestrator {
  /// Without a destination the transfer ends once the send is confirmed.
  pub fn new(source: ContractClient) -> Self {
    Self {
      source,
      destination: None,
    }
  }

  #[must_use]
  pub fn with_destination(mut self, destination: ContractClient) -> Self {
    self.destination = Some(destination);
    self
  }

  pub fn direction(&self) -> BridgeDirection {
    BridgeDirection::from_source(self.source.context().is_native)
  }

  fn destination(&self) -> SdkResult<&ContractClient> {
    self.destination.as_ref().ok_or_else(|| {
      SdkError::configuration(format!(
        "no destination chain connected for the bridge of {}",
        self.source.context().name
      ))
    })
  }

  /// Start a transfer on its own task.
  pub fn spawn(&self, amount: TokenAmount, opts: TxOptions) -> BridgeHandle {
    let transfer_id = Uuid::new_v4();
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let this = self.clone();
    let task =
      tokio::spawn(async move { this.transfer(transfer_id, amount, opts, Some(progress_tx), cancel_rx).await });
    BridgeHandle {
      transfer_id,
      progress: progress_rx,
      cancel: cancel_tx,
      task,
    }
  }

  /// Run one transfer to completion on the calling task.
  #[instrument(skip(self, progress, cancel), fields(source = %self.source.context().name))]
  pub async fn transfer(
    &self,
    transfer_id: Uuid,
    amount: TokenAmount,
    opts: TxOptions,
    progress: Option<mpsc::UnboundedSender<BridgeProgress>>,
    cancel: watch::Receiver<bool>,
  ) -> SdkResult<BridgeOutcome> {
    let mut tracker = Tracker::new(transfer_id, progress);
    let started_at = Utc::now();
    match self.run(amount, opts, &mut tracker, &cancel).await {
      Ok((prepared, source_tx_hash, receive_tx_hash)) => Ok(BridgeOutcome {
        transfer_id,
        source_chain: self.source.context().name.clone(),
        destination_chain: self.destination.as_ref().map(|d| d.context().name.clone()),
        amount,
        chain_amount: prepared.chain_amount,
        source_tx_hash,
        receive_tx_hash,
        started_at,
        finished_at: Utc::now(),
      }),
      Err(e) => {
        tracker.fail(&e);
        Err(e)
      }
    }
  }

  async fn run(
    &self,
    amount: TokenAmount,
    opts: TxOptions,
    tracker: &mut Tracker,
    cancel: &watch::Receiver<bool>,
  ) -> SdkResult<(Prepared, B256, Option<B256>)> {
    let prepared = or_abort(cancel, self.prepare(amount, tracker)).await?;

    let watch_from = match &self.destination {
      Some(destination) => Some(or_abort(cancel, destination.chain().block_number()).await?),
      None => None,
    };
    if *cancel.borrow() {
      return Err(SdkError::Aborted);
    }

    let source_tx_hash = self.send(prepared.chain_amount, opts).await?;

    let received = async {
      tracker.emit(BridgeProgress::Sent {
        tx_hash: source_tx_hash,
      })?;
      or_abort(cancel, self.confirm_send(source_tx_hash)).await?;

      let Some(from_block) = watch_from else {
        return Ok(None);
      };
      tracker.emit(BridgeProgress::WaitingReceive {
        source_tx_hash,
        from_block,
      })?;
      let receive_tx_hash = self.await_completion(source_tx_hash, from_block, cancel).await?;
      tracker.emit(BridgeProgress::Received { receive_tx_hash })?;
      Ok::<_, SdkError>(Some(receive_tx_hash))
    }
    .await
    .map_err(|e| e.after_bridge_send(source_tx_hash, watch_from))?;

    Ok((prepared, source_tx_hash, received))
  }

  /// Validation, per-transaction bounds and daily quota.
  async fn prepare(&self, amount: TokenAmount, tracker: &mut Tracker) -> SdkResult<Prepared> {
    let from = self.source.signer_address("bridge")?;
    ensure_positive(amount.raw(), "bridge amount")?;
    let chain_amount = if self.source.context().is_native {
      to_native_unit(amount)?.raw()
    } else {
      amount.raw()
    };
    ensure_whitelisted(&self.source, &[from]).await?;
    ensure_token_funds(&self.source, from, amount).await?;

    let bridge = self.source.bridge()?;
    let limits: BridgeLimits = bridge.limits().await?;
    limits.check_per_tx(chain_amount)?;
    tracker.emit(BridgeProgress::PolicyChecked { limits })?;

    let (day, head) = tokio::try_join!(bridge.current_day(), self.source.chain().block_number())?;
    let day_start = self.day_start_block(day, head).await?;
    let spent_today = self.spent_between(day_start, head).await?;
    limits.check_daily(spent_today, chain_amount)?;
    tracker.emit(BridgeProgress::LimitChecked { day, spent_today })?;

    Ok(Prepared { chain_amount })
  }

  /// First block whose timestamp falls in bridge day `day`.
  ///
  /// Walks back from `head` with steps scaled by the observed block time
  /// until a block before the day start is found, then bisects between
  /// that block and the last one inside the day. Returns `head + 1` when
  /// the head itself predates the day start.
  async fn day_start_block(&self, day: u64, head: u64) -> SdkResult<u64> {
    let chain = self.source.chain();
    let target = day_start_timestamp(day);

    let mut upper = head;
    let mut upper_ts = chain.block_timestamp(head).await?;
    if upper_ts < target {
      return Ok(head.saturating_add(1));
    }

    let (mut observed_blocks, mut observed_secs) = (0, 0);
    let mut lower = loop {
      if upper == 0 {
        return Ok(0);
      }
      let step = walk_step(upper_ts - target, observed_blocks, observed_secs);
      let candidate = upper.saturating_sub(step);
      let candidate_ts = chain.block_timestamp(candidate).await?;
      if candidate_ts < target {
        break candidate;
      }
      observed_blocks = upper - candidate;
      observed_secs = upper_ts - candidate_ts;
      upper = candidate;
      upper_ts = candidate_ts;
    };

    while upper - lower > 1 {
      let mid = lower + (upper - lower) / 2;
      if chain.block_timestamp(mid).await? >= target {
        upper = mid;
      } else {
        lower = mid;
      }
    }
    debug!(day, block = upper, "Bridge day start located");
    Ok(upper)
  }

  /// Transfers into the bridge over `[from_block, to_block]`.
  ///
  /// Windows of `log_block_range` blocks are read in ascending order.
  async fn spent_between(&self, from_block: u64, to_block: u64) -> SdkResult<U256> {
    let bridge = self.source.bridge()?;
    let range = self.source.context().log_block_range.max(1);
    let mut logs = Vec::new();
    let mut start = from_block;
    while start <= to_block {
      let end = start.saturating_add(range - 1).min(to_block);
      logs.extend(bridge.transfer_logs(start, end).await?);
      if end == u64::MAX {
        break;
      }
      start = end + 1;
    }
    Ok(spent_since(logs, from_block))
  }

  /// Submit the value transfer to the bridge. Not cancellable.
  async fn send(&self, chain_amount: U256, opts: TxOptions) -> SdkResult<B256> {
    let bridge = self.source.bridge()?.address();
    let tx_hash = if self.source.context().is_native {
      self.source.chain().send_native(bridge, chain_amount, opts).await?
    } else {
      self.source.token()?.transfer(bridge, chain_amount, opts).await?
    };
    info!(%tx_hash, amount = %chain_amount, "Bridge transfer sent");
    Ok(tx_hash)
  }

  async fn confirm_send(&self, tx_hash: B256) -> SdkResult<()> {
    let receipt = self.source.await_confirmation(tx_hash).await?;
    if self.source.context().is_native {
      receipt.expect_event::<IexecBridge::UserRequestForSignature>(self.source.bridge()?.address())?;
    } else {
      receipt.expect_event::<IexecToken::Transfer>(self.source.token()?.address())?;
    }
    Ok(())
  }

  /// Resume watching for the destination side of an already sent transfer.
  ///
  /// Scans from `from_block` on the destination chain and waits without
  /// timeout. Failures, cancellation included, are `BridgeError`s carrying
  /// `source_tx_hash` and `from_block`, so the watch can be resumed again.
  #[instrument(skip(self, cancel))]
  pub async fn watch_receive(
    &self,
    source_tx_hash: B256,
    from_block: u64,
    cancel: watch::Receiver<bool>,
  ) -> SdkResult<B256> {
    self
      .await_completion(source_tx_hash, from_block, &cancel)
      .await
      .map_err(|e| e.after_bridge_send(source_tx_hash, Some(from_block)))
  }

  async fn await_completion(
    &self,
    source_tx_hash: B256,
    from_block: u64,
    cancel: &watch::Receiver<bool>,
  ) -> SdkResult<B256> {
    let destination = self.destination()?;
    let bridge = destination.bridge()?;
    let direction = self.direction();
    let range = destination.context().log_block_range.max(1);
    let mut next = from_block;

    loop {
      let head = or_abort(cancel, destination.chain().block_number()).await?;
      while next <= head {
        let end = next.saturating_add(range - 1).min(head);
        let found = or_abort(cancel, bridge.find_completion(direction, source_tx_hash, next, end)).await?;
        if let Some(receive_tx_hash) = found {
          info!(%source_tx_hash, %receive_tx_hash, event = direction.completion_event(), "Bridge transfer received");
          return Ok(receive_tx_hash);
        }
        next = end.saturating_add(1);
        if end == head {
          break;
        }
      }

      tokio::select! {
        biased;
        () = cancelled(cancel.clone()) => return Err(SdkError::Aborted),
        () = tokio::time::sleep(destination.context().poll_interval) => {}
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_or_abort_prefers_cancellation() {
    let (_tx, rx) = watch::channel(true);
    let result = tokio_test::block_on(or_abort(&rx, async { Ok(1) }));
    assert_eq!(result.unwrap_err().name(), "AbortError");
  }

  #[test]
  fn test_dropped_sender_never_cancels() {
    let (tx, rx) = watch::channel(false);
    drop(tx);
    let result = tokio_test::block_on(or_abort(&rx, async { Ok(7) }));
    assert_eq!(result.unwrap(), 7);
  }

  #[test]
  fn test_tracker_rejects_skips_and_fails_once() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut tracker = Tracker::new(Uuid::nil(), Some(tx));
    let limits = BridgeLimits {
      min_per_tx: U256::from(1),
      max_per_tx: U256::from(10),
      daily_limit: U256::from(100),
    };

    tracker.emit(BridgeProgress::PolicyChecked { limits }).unwrap();
    assert!(tracker.emit(BridgeProgress::Sent { tx_hash: B256::ZERO }).is_err());
    tracker.fail(&SdkError::Aborted);
    tracker.fail(&SdkError::Aborted);

    assert_eq!(rx.try_recv().unwrap().state(), BridgeState::PolicyChecked);
    assert_eq!(rx.try_recv().unwrap().state(), BridgeState::Failed);
    assert!(rx.try_recv().is_err());
  }
}
