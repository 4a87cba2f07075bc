//! Order-Book Gateway Adapter
//!
//! Implements the [`OrderBook`] port over the gateway REST API:
//! `/{kind}orders` for publication and queries, `/deals` for deals and
//! `/challenge` for write authorization.

use alloy::dyn_abi::TypedData;
use alloy::primitives::B256;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::domain::errors::{SdkError, SdkResult};
use crate::domain::order::{Order, OrderKind};
use crate::ports::gateway::{
    DealsQuery, OrderBook, OrderbookPage, OrderbookQuery, PublishedDeal, PublishedOrder,
};

use super::auth::GatewayAuth;
use super::client::GatewayClient;
use super::types::{PublishRequest, Published, payload};

fn collection(kind: OrderKind) -> String {
    format!("/{}s", kind.label())
}

/// Flatten a query struct into `(key, value)` pairs, dropping nulls.
pub fn query_pairs<T: Serialize>(query: &T) -> SdkResult<Vec<(String, String)>> {
    let value = serde_json::to_value(query)
        .map_err(|e| SdkError::validation(format!("invalid query: {e}")))?;
    let Value::Object(map) = value else {
        return Err(SdkError::validation("query must be an object"));
    };
    Ok(map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

/// Gateway client bound to one chain.
pub struct GatewayOrderBook {
    client: GatewayClient,
    chain_id: u64,
    auth: Option<GatewayAuth>,
    authorization: Mutex<Option<String>>,
}

impl GatewayOrderBook {
    /// Without `auth` only reads are possible.
    pub fn new(client: GatewayClient, chain_id: u64, auth: Option<GatewayAuth>) -> Self {
        Self {
            client,
            chain_id,
            auth,
            authorization: Mutex::new(None),
        }
    }

    fn chain_query(&self) -> Vec<(String, String)> {
        vec![("chainId".to_string(), self.chain_id.to_string())]
    }

    /// Authorization header, fetching and signing a challenge on first use.
    async fn authorization(&self, operation: &'static str) -> SdkResult<String> {
        let auth = self.auth.as_ref().ok_or(SdkError::MissingSigner { operation })?;

        let mut cached = self.authorization.lock().await;
        if let Some(header) = cached.as_ref() {
            return Ok(header.clone());
        }

        let mut query = self.chain_query();
        query.push(("address".to_string(), auth.address().to_string()));
        let response = self.client.get("/challenge", &query, None).await?;
        let challenge: TypedData = payload(response, Some("data"))?;
        let header = auth.authorize(&challenge)?;
        debug!(address = %auth.address(), "Gateway challenge signed");

        *cached = Some(header.clone());
        Ok(header)
    }
}

#[async_trait]
impl OrderBook for GatewayOrderBook {
    #[instrument(skip(self, order), fields(kind = %order.kind(), chain_id = self.chain_id))]
    async fn publish(&self, order: &Order) -> SdkResult<B256> {
        if order.sign().is_none() {
            return Err(SdkError::validation(format!("{} must be signed before publishing", order.kind())));
        }
        let authorization = self.authorization("publish").await?;
        let body = serde_json::to_value(PublishRequest {
            chain_id: self.chain_id,
            order,
        })
        .map_err(|e| SdkError::validation(format!("unserializable order: {e}")))?;

        let response = self
            .client
            .post(&collection(order.kind()), &body, Some(&authorization))
            .await?;
        let published: Published = payload(response, Some("published"))?;
        info!(order_hash = %published.order_hash, "Order published");
        Ok(published.order_hash)
    }

    #[instrument(skip(self), fields(chain_id = self.chain_id))]
    async fn unpublish(&self, kind: OrderKind, order_hash: B256) -> SdkResult<B256> {
        let authorization = self.authorization("unpublish").await?;
        let path = format!("{}/{order_hash}", collection(kind));
        let response = self
            .client
            .delete(&path, &self.chain_query(), Some(&authorization))
            .await?;
        let unpublished: Vec<B256> = payload(response, Some("unpublished"))?;
        info!(%order_hash, count = unpublished.len(), "Order unpublished");
        Ok(unpublished.first().copied().unwrap_or(order_hash))
    }

    async fn fetch_order(&self, kind: OrderKind, order_hash: B256) -> SdkResult<Option<PublishedOrder>> {
        let path = format!("{}/{order_hash}", collection(kind));
        match self.client.get_optional(&path, &self.chain_query(), None).await? {
            Some(response) => payload(response, None).map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_orderbook(&self, kind: OrderKind, query: &OrderbookQuery) -> SdkResult<OrderbookPage> {
        let response = self
            .client
            .get(&collection(kind), &query_pairs(query)?, None)
            .await?;
        payload(response, None)
    }

    async fn fetch_deals(&self, query: &DealsQuery) -> SdkResult<Vec<PublishedDeal>> {
        let response = self.client.get("/deals", &query_pairs(query)?, None).await?;
        payload(response, Some("deals"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    #[test]
    fn test_query_pairs_drop_unset() {
        let query = OrderbookQuery {
            chain_id: 134,
            app: Some(Address::repeat_byte(0x11)),
            min_volume: Some(5),
            ..OrderbookQuery::default()
        };
        let mut pairs = query_pairs(&query).unwrap();
        pairs.sort();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].0, "app");
        assert_eq!(pairs[1], ("chainId".to_string(), "134".to_string()));
        assert_eq!(pairs[2], ("minVolume".to_string(), "5".to_string()));
    }

    #[test]
    fn test_collection_paths() {
        assert_eq!(collection(OrderKind::Workerpool), "/workerpoolorders");
        assert_eq!(collection(OrderKind::Request), "/requestorders");
    }
}
