//! Gateway Request/Response Types
//!
//! Every gateway response is an object with an `ok` boolean and either
//! the payload fields or an `error` string.

use alloy::primitives::B256;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::{SdkError, SdkResult};
use crate::domain::order::Order;

/// Body of a publish request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest<'a> {
  pub chain_id: u64,
  pub order: &'a Order,
}

/// `published` field of a publish response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Published {
  pub order_hash: B256,
}

/// Check `ok` and return the envelope for further decoding.
pub fn check_envelope(value: Value) -> SdkResult<Value> {
  match value.get("ok").and_then(Value::as_bool) {
    Some(true) => Ok(value),
    Some(false) => {
      let message = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown gateway error");
      Err(SdkError::Gateway(message.to_string()))
    }
    None => Err(SdkError::Gateway(format!("malformed gateway response: {value}"))),
  }
}

/// Decode `field` of a successful envelope, or the whole envelope when `None`.
pub fn payload<T: DeserializeOwned>(value: Value, field: Option<&str>) -> SdkResult<T> {
  let mut envelope = check_envelope(value)?;
  let data = match field {
    Some(name) => envelope
      .get_mut(name)
      .map(Value::take)
      .ok_or_else(|| SdkError::Gateway(format!("gateway response has no {name}")))?,
    None => envelope,
  };
  serde_json::from_value(data).map_err(|e| SdkError::Gateway(format!("unexpected gateway payload: {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_error_envelope() {
    let err = check_envelope(json!({"ok": false, "error": "order not found"})).unwrap_err();
    assert_eq!(err.name(), "GatewayError");
    assert!(err.to_string().contains("order not found"));
  }

  #[test]
  fn test_payload_field() {
    let hash = B256::repeat_byte(3);
    let published: Published =
      payload(json!({"ok": true, "published": {"orderHash": hash}}), Some("published")).unwrap();
    assert_eq!(published.order_hash, hash);
    assert!(payload::<Published>(json!({"ok": true}), Some("published")).is_err());
    assert!(check_envelope(json!({"orders": []})).is_err());
  }
}
