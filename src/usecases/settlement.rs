//! Settlement Use Case - Matching Orders into a Deal
//!
//! Settlement flow:
//! 1. Check the four orders against each other locally
//! 2. Read consumed volumes and size the bot
//! 3. Check the category and the requester's stake
//! 4. Submit `matchOrders` and read the deal back from `OrdersMatched`
//! 5. Report deal id, task ids, start time and final deadline

use alloy::primitives::{B256, U256};
use tracing::{info, instrument, warn};

use crate::domain::chain::TxOptions;
use crate::domain::deal::{Bot, Deal, compute_bot, deal_id, final_deadline, task_ids};
use crate::domain::errors::{SdkError, SdkResult};
use crate::domain::matching::{OrderTuple, check_compatibility, task_price};
use crate::domain::order::{AppOrder, DatasetOrder, RequestOrder, WorkerpoolOrder};
use crate::ports::abi::IexecPoco;
use crate::ports::contract_client::ContractClient;

use super::balance::ensure_sufficient;

/// Hashes of the orders taking part in one match.
#[derive(Debug, Clone, Copy)]
struct TupleHashes {
  app: B256,
  dataset: Option<B256>,
  workerpool: B256,
  request: B256,
}

/// Deal settlement for one chain connection.
pub struct Settlement {
  client: ContractClient,
}

impl Settlement {
  pub fn new(client: ContractClient) -> Self {
    Self { client }
  }

  /// Match the orders on-chain and report the resulting deal.
  ///
  /// `dataset` defaults to the empty dataset order. All local checks run
  /// before any transaction is sent; the hub remains authoritative and the
  /// deal id is taken from its event.
  #[instrument(skip_all, fields(chain = %self.client.context().name))]
  pub async fn match_orders(
    &self,
    app: &AppOrder,
    dataset: Option<&DatasetOrder>,
    workerpool: &WorkerpoolOrder,
    request: &RequestOrder,
    opts: TxOptions,
  ) -> SdkResult<Deal> {
    self.client.signer("matchOrders")?;
    let empty = DatasetOrder::empty();
    let dataset = dataset.unwrap_or(&empty);
    let orders = OrderTuple { app, dataset, workerpool, request };
    check_compatibility(orders)?;

    let hub = self.client.hub();
    let domain = hub.eip712_domain().await?;
    let hashes = TupleHashes {
      app: app.hash(&domain),
      dataset: (!dataset.is_empty()).then(|| dataset.hash(&domain)),
      workerpool: workerpool.hash(&domain),
      request: request.hash(&domain),
    };

    let category = hub
      .category(request.category)
      .await?
      .ok_or_else(|| SdkError::validation(format!("category {} does not exist", request.category)))?;

    let (bot, request_consumed) = self.allocate(orders, hashes).await?;

    let price = task_price(orders);
    let stake = hub.view_account(request.requester).await?.stake;
    let required = U256::from(price) * U256::from(bot.size);
    ensure_sufficient(required, stake.raw(), "nRLC")?;

    let tx_hash = hub.match_orders(app, dataset, workerpool, request, opts).await?;
    let receipt = self.client.await_confirmation(tx_hash).await?;
    let matched = receipt.expect_event::<IexecPoco::OrdersMatched>(hub.address())?;

    let expected_id = deal_id(hashes.request, request_consumed);
    if matched.dealid != expected_id {
      warn!(event = %matched.dealid, computed = %expected_id, "Deal id differs from local computation");
    }
    let bot = Bot {
      first: bot.first,
      size: u64::try_from(matched.volume).unwrap_or(bot.size),
    };

    let start_time = self.client.chain().block_timestamp(receipt.block_number).await?;
    let deal = Deal {
      deal_id: matched.dealid,
      tx_hash,
      bot_first: bot.first,
      bot_size: bot.size,
      app: app.app,
      dataset: dataset.dataset,
      workerpool: workerpool.workerpool,
      requester: request.requester,
      beneficiary: request.beneficiary,
      callback: request.callback,
      params: request.params.clone(),
      tag: app.tag | dataset.tag | request.tag,
      category: request.category,
      trust: request.trust,
      task_price: price,
      start_time,
      final_deadline: final_deadline(start_time, category.work_clock_time_ref),
      tasks: task_ids(matched.dealid, bot),
    };

    info!(deal_id = %deal.deal_id, %tx_hash, bot_first = bot.first, bot_size = bot.size, "Orders matched");
    Ok(deal)
  }

  /// Size the bot from the remaining volume of every order.
  ///
  /// Consumed volumes are read concurrently. Any fully consumed order is a
  /// `ValidationError` naming it.
  async fn allocate(&self, orders: OrderTuple<'_>, hashes: TupleHashes) -> SdkResult<(Bot, u64)> {
    let hub = self.client.hub();
    let dataset_consumed = async {
      match hashes.dataset {
        Some(hash) => hub.view_consumed(hash).await,
        None => Ok(0),
      }
    };
    let (app_consumed, dataset_consumed, workerpool_consumed, request_consumed) = tokio::try_join!(
      hub.view_consumed(hashes.app),
      dataset_consumed,
      hub.view_consumed(hashes.workerpool),
      hub.view_consumed(hashes.request),
    )?;

    let mut remaining = vec![
      ("apporder", orders.app.volume.saturating_sub(app_consumed)),
      ("workerpoolorder", orders.workerpool.volume.saturating_sub(workerpool_consumed)),
      ("requestorder", orders.request.volume.saturating_sub(request_consumed)),
    ];
    if hashes.dataset.is_some() {
      remaining.push(("datasetorder", orders.dataset.volume.saturating_sub(dataset_consumed)));
    }

    if let Some((label, _)) = remaining.iter().find(|(_, volume)| *volume == 0) {
      return Err(SdkError::validation(format!("{label} is fully consumed")));
    }

    let volumes: Vec<u64> = remaining.iter().map(|(_, volume)| *volume).collect();
    Ok((compute_bot(request_consumed, &volumes), request_consumed))
  }
}
