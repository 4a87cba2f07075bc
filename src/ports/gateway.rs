//! Order-Book Gateway Port
//!
//! The marketplace API stores published orders off-chain and indexes
//! deals. Every response is `{ok, ...}`; failures surface as
//! `GatewayError`.

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::SdkResult;
use crate::domain::order::{Order, OrderKind};

/// An order as stored by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedOrder {
  pub order_hash: B256,
  pub chain_id: u64,
  /// Volume not yet consumed on-chain.
  pub remaining: u64,
  pub status: String,
  #[serde(default)]
  pub signer: Option<Address>,
  #[serde(default)]
  pub publication_timestamp: Option<String>,
  pub order: Order,
}

/// Filters of an orderbook query. Unset filters are not sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderbookQuery {
  pub chain_id: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub app: Option<Address>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dataset: Option<Address>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub workerpool: Option<Address>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub requester: Option<Address>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min_tag: Option<B256>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_tag: Option<B256>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min_volume: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min_trust: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub page_index: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub page_size: Option<u32>,
}

/// One page of an orderbook.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderbookPage {
  pub orders: Vec<PublishedOrder>,
  pub count: u64,
}

/// Deal as indexed by the gateway.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedDeal {
  #[serde(rename = "dealid")]
  pub deal_id: B256,
  pub bot_first: u64,
  pub bot_size: u64,
  #[serde(flatten)]
  pub details: serde_json::Map<String, serde_json::Value>,
}

/// Filters of a deals query.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealsQuery {
  pub chain_id: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub requester: Option<Address>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub app: Option<Address>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dataset: Option<Address>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub workerpool: Option<Address>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub page_index: Option<u32>,
}

/// REST client of the order-book gateway.
#[async_trait]
pub trait OrderBook: Send + Sync + 'static {
  /// Publish a signed order; returns its hash.
  async fn publish(&self, order: &Order) -> SdkResult<B256>;

  /// Withdraw a published order from the book; returns its hash.
  async fn unpublish(&self, kind: OrderKind, order_hash: B256) -> SdkResult<B256>;

  async fn fetch_order(&self, kind: OrderKind, order_hash: B256) -> SdkResult<Option<PublishedOrder>>;

  async fn fetch_orderbook(&self, kind: OrderKind, query: &OrderbookQuery) -> SdkResult<OrderbookPage>;

  async fn fetch_deals(&self, query: &DealsQuery) -> SdkResult<Vec<PublishedDeal>>;
}
