//! Order Manager - Order Lifecycle Management
//!
//! Manages the full lifecycle of marketplace orders:
//! - Creating orders over the kind defaults
//! - Hashing under the hub's EIP-712 domain
//! - Signing (owner or requester only), verifying, pre-signing
//! - Cancelling on-chain and querying the remaining volume
//! - Publishing to and withdrawing from the order-book gateway

use std::sync::Arc;

use alloy::primitives::{Address, B256};
use tracing::{debug, info, instrument, warn};

use crate::domain::chain::TxOptions;
use crate::domain::errors::{SdkError, SdkResult};
use crate::domain::order::{Order, OrderFields, OrderKind, create_order};
use crate::domain::receipt::TxReceipt;
use crate::domain::signing::sign_digest;
use crate::ports::abi::IexecPoco;
use crate::ports::contract_client::ContractClient;
use crate::ports::contracts::OrderOperation;
use crate::ports::gateway::{DealsQuery, OrderBook, OrderbookPage, OrderbookQuery, PublishedDeal, PublishedOrder};

/// Hash reported by the `Signed*Order` event of a pre-signature.
fn presigned_hash(kind: OrderKind, receipt: &TxReceipt, hub: Address) -> SdkResult<B256> {
  Ok(match kind {
    OrderKind::App => receipt.expect_event::<IexecPoco::SignedAppOrder>(hub)?.appHash,
    OrderKind::Dataset => receipt.expect_event::<IexecPoco::SignedDatasetOrder>(hub)?.datasetHash,
    OrderKind::Workerpool => receipt.expect_event::<IexecPoco::SignedWorkerpoolOrder>(hub)?.workerpoolHash,
    OrderKind::Request => receipt.expect_event::<IexecPoco::SignedRequestOrder>(hub)?.requestHash,
  })
}

/// Hash reported by the `Closed*Order` event of a cancellation.
fn closed_hash(kind: OrderKind, receipt: &TxReceipt, hub: Address) -> SdkResult<B256> {
  Ok(match kind {
    OrderKind::App => receipt.expect_event::<IexecPoco::ClosedAppOrder>(hub)?.appHash,
    OrderKind::Dataset => receipt.expect_event::<IexecPoco::ClosedDatasetOrder>(hub)?.datasetHash,
    OrderKind::Workerpool => receipt.expect_event::<IexecPoco::ClosedWorkerpoolOrder>(hub)?.workerpoolHash,
    OrderKind::Request => receipt.expect_event::<IexecPoco::ClosedRequestOrder>(hub)?.requestHash,
  })
}

/// Order operations for one chain connection, optionally backed by a gateway.
pub struct OrderManager {
  client: ContractClient,
  orderbook: Option<Arc<dyn OrderBook>>,
}

impl OrderManager {
  pub fn new(client: ContractClient) -> Self {
    Self { client, orderbook: None }
  }

  #[must_use]
  pub fn with_orderbook(mut self, orderbook: Arc<dyn OrderBook>) -> Self {
    self.orderbook = Some(orderbook);
    self
  }

  fn orderbook(&self) -> SdkResult<&dyn OrderBook> {
    self.orderbook.as_deref().ok_or_else(|| {
      SdkError::configuration(format!("no gateway configured for chain {}", self.client.context().name))
    })
  }

  /// Unsigned order over the kind defaults.
  ///
  /// A request order without a requester gets the attached signer's address.
  pub fn create(&self, kind: OrderKind, mut fields: OrderFields) -> SdkResult<Order> {
    if kind == OrderKind::Request && fields.requester.is_none() {
      fields.requester = Some(self.client.signer_address("createRequestOrder")?);
    }
    create_order(kind, fields)
  }

  /// Canonical hash, equal to the hub's own computation.
  pub async fn hash(&self, order: &Order) -> SdkResult<B256> {
    let domain = self.client.hub().eip712_domain().await?;
    Ok(order.hash(&domain))
  }

  /// Address whose signature the hub accepts for `order`.
  async fn expected_signer(&self, order: &Order) -> SdkResult<Address> {
    match (order, order.resource()) {
      (Order::Request(request), _) => Ok(request.requester),
      (_, Some((kind, address))) => {
        if !self.client.is_deployed(kind, address).await? {
          return Err(SdkError::validation(format!("{address} is not a registered {kind}")));
        }
        self.client.hub().resource_owner(address).await
      }
      (_, None) => Err(SdkError::validation(format!("{} has no owner", order.kind()))),
    }
  }

  /// Sign `order`, returning a signed copy. The input is left unchanged.
  ///
  /// Resource orders may only be signed by the resource owner and request
  /// orders only by their requester.
  #[instrument(skip(self, order), fields(kind = %order.kind(), chain = %self.client.context().name))]
  pub async fn sign(&self, order: &Order) -> SdkResult<Order> {
    let signer = self.client.signer("signOrder")?;
    let expected = self.expected_signer(order).await?;
    if expected != signer.address() {
      return Err(SdkError::validation(format!(
        "{} must be signed by {expected}, not {}",
        order.kind(),
        signer.address()
      )));
    }

    let order_hash = self.hash(order).await?;
    let sign = sign_digest(signer, order_hash)?;
    info!(%order_hash, signer = %signer.address(), "Order signed");
    Ok(order.with_sign(sign))
  }

  /// Ask the hub whether the order's signature is valid for its owner.
  #[instrument(skip(self, order), fields(kind = %order.kind()))]
  pub async fn verify(&self, order: &Order) -> SdkResult<bool> {
    let sign = order
      .sign()
      .filter(|sign| !sign.is_empty())
      .cloned()
      .ok_or_else(|| SdkError::validation(format!("{} is not signed", order.kind())))?;
    let identity = self.expected_signer(order).await?;
    let order_hash = self.hash(order).await?;
    let valid = self.client.hub().verify_signature(identity, order_hash, sign).await?;
    debug!(%order_hash, %identity, valid, "Signature verified");
    Ok(valid)
  }

  /// Ask the hub whether the order carries an on-chain pre-signature.
  pub async fn verify_presignature(&self, order: &Order) -> SdkResult<bool> {
    let identity = self.expected_signer(order).await?;
    let order_hash = self.hash(order).await?;
    self.client.hub().verify_presignature(identity, order_hash).await
  }

  /// Record an on-chain pre-signature for `order`; returns the transaction hash.
  #[instrument(skip(self, order, opts), fields(kind = %order.kind()))]
  pub async fn presign(&self, order: &Order, opts: TxOptions) -> SdkResult<B256> {
    self.manage(order, OrderOperation::Sign, opts).await
  }

  /// Mark the order consumed on-chain so it can never be matched again.
  #[instrument(skip(self, order, opts), fields(kind = %order.kind()))]
  pub async fn cancel(&self, order: &Order, opts: TxOptions) -> SdkResult<B256> {
    self.manage(order, OrderOperation::Close, opts).await
  }

  async fn manage(&self, order: &Order, operation: OrderOperation, opts: TxOptions) -> SdkResult<B256> {
    let sender = self.client.signer_address("manageOrder")?;
    let expected = self.expected_signer(order).await?;
    if expected != sender {
      return Err(SdkError::validation(format!(
        "only {expected} may manage this {}",
        order.kind()
      )));
    }

    let order_hash = self.hash(order).await?;
    let hub = self.client.hub();
    let tx_hash = hub.manage_order(order, operation, opts).await?;
    let receipt = self.client.await_confirmation(tx_hash).await?;
    let confirmed = match operation {
      OrderOperation::Sign => presigned_hash(order.kind(), &receipt, hub.address())?,
      OrderOperation::Close => closed_hash(order.kind(), &receipt, hub.address())?,
    };
    if confirmed != order_hash {
      warn!(%order_hash, %confirmed, "Hub reported a different order hash");
      return Err(SdkError::TransactionNotConfirmed {
        tx_hash,
        event: "order hash mismatch",
      });
    }

    info!(%tx_hash, %order_hash, ?operation, "Order updated on-chain");
    Ok(tx_hash)
  }

  /// `volume - consumed`, never negative.
  pub async fn remaining_volume(&self, order: &Order) -> SdkResult<u64> {
    let order_hash = self.hash(order).await?;
    let consumed = self.client.hub().view_consumed(order_hash).await?;
    Ok(order.volume().saturating_sub(consumed))
  }

  /// Publish to the gateway, signing first when the order is unsigned.
  ///
  /// An empty `sign` stands for an on-chain pre-signature; such an order is
  /// published as-is once the hub confirms the pre-signature.
  #[instrument(skip(self, order), fields(kind = %order.kind()))]
  pub async fn publish(&self, order: &Order) -> SdkResult<B256> {
    let orderbook = self.orderbook()?;
    let signed = if order.sign().is_some_and(|sign| !sign.is_empty()) {
      order.clone()
    } else if order.sign().is_some() && self.verify_presignature(order).await? {
      debug!(kind = %order.kind(), "Publishing pre-signed order");
      order.clone()
    } else {
      self.sign(order).await?
    };
    if self.remaining_volume(&signed).await? == 0 {
      return Err(SdkError::validation(format!("{} is fully consumed", order.kind())));
    }
    orderbook.publish(&signed).await
  }

  pub async fn unpublish(&self, kind: OrderKind, order_hash: B256) -> SdkResult<B256> {
    self.orderbook()?.unpublish(kind, order_hash).await
  }

  pub async fn show(&self, kind: OrderKind, order_hash: B256) -> SdkResult<Option<PublishedOrder>> {
    self.orderbook()?.fetch_order(kind, order_hash).await
  }

  pub async fn orderbook_page(&self, kind: OrderKind, query: &OrderbookQuery) -> SdkResult<OrderbookPage> {
    self.orderbook()?.fetch_orderbook(kind, query).await
  }

  pub async fn deals(&self, query: &DealsQuery) -> SdkResult<Vec<PublishedDeal>> {
    self.orderbook()?.fetch_deals(query).await
  }
}
