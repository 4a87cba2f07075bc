//! Marketplace Orders - Construction and Canonical EIP-712 Hashing
//!
//! The four order kinds mirror the hub's typed-data schema field for field.
//! The `sign` field is not part of the typed data; the order hash is the
//! full EIP-712 signing digest the hub recomputes on-chain.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};

use super::chain::ResourceKind;
use super::errors::{SdkError, SdkResult};

/// Default volume of app and dataset orders.
pub const DEFAULT_RESOURCE_VOLUME: u64 = 1_000_000;
/// Default volume of workerpool and request orders.
pub const DEFAULT_EXECUTION_VOLUME: u64 = 1;

/// Bit 0 of the tag: the app must run in a trusted execution environment.
pub const TAG_TEE: u8 = 0x01;

/// Typed-data layouts. Names and field order are part of the hub's domain.
mod typed {
    alloy::sol! {
        struct AppOrder {
            address app;
            uint256 appprice;
            uint256 volume;
            bytes32 tag;
            address datasetrestrict;
            address workerpoolrestrict;
            address requesterrestrict;
            bytes32 salt;
        }

        struct DatasetOrder {
            address dataset;
            uint256 datasetprice;
            uint256 volume;
            bytes32 tag;
            address apprestrict;
            address workerpoolrestrict;
            address requesterrestrict;
            bytes32 salt;
        }

        struct WorkerpoolOrder {
            address workerpool;
            uint256 workerpoolprice;
            uint256 volume;
            bytes32 tag;
            uint256 category;
            uint256 trust;
            address apprestrict;
            address datasetrestrict;
            address requesterrestrict;
            bytes32 salt;
        }

        struct RequestOrder {
            address app;
            uint256 appmaxprice;
            address dataset;
            uint256 datasetmaxprice;
            address workerpool;
            uint256 workerpoolmaxprice;
            address requester;
            uint256 volume;
            bytes32 tag;
            uint256 category;
            uint256 trust;
            address beneficiary;
            address callback;
            string params;
            bytes32 salt;
        }
    }
}

/// uint256 fields arrive as JSON numbers or as decimal strings.
mod uint {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(value) => Ok(value),
            NumberOrString::String(value) => value
                .trim()
                .parse()
                .map_err(|e| D::Error::custom(format!("invalid uint {value:?}: {e}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppOrder {
    pub app: Address,
    #[serde(deserialize_with = "uint::deserialize")]
    pub appprice: u64,
    #[serde(deserialize_with = "uint::deserialize")]
    pub volume: u64,
    pub tag: B256,
    pub datasetrestrict: Address,
    pub workerpoolrestrict: Address,
    pub requesterrestrict: Address,
    pub salt: B256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<Bytes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetOrder {
    pub dataset: Address,
    #[serde(deserialize_with = "uint::deserialize")]
    pub datasetprice: u64,
    #[serde(deserialize_with = "uint::deserialize")]
    pub volume: u64,
    pub tag: B256,
    pub apprestrict: Address,
    pub workerpoolrestrict: Address,
    pub requesterrestrict: Address,
    pub salt: B256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<Bytes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerpoolOrder {
    pub workerpool: Address,
    #[serde(deserialize_with = "uint::deserialize")]
    pub workerpoolprice: u64,
    #[serde(deserialize_with = "uint::deserialize")]
    pub volume: u64,
    pub tag: B256,
    #[serde(deserialize_with = "uint::deserialize")]
    pub category: u64,
    #[serde(deserialize_with = "uint::deserialize")]
    pub trust: u64,
    pub apprestrict: Address,
    pub datasetrestrict: Address,
    pub requesterrestrict: Address,
    pub salt: B256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<Bytes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOrder {
    pub app: Address,
    #[serde(deserialize_with = "uint::deserialize")]
    pub appmaxprice: u64,
    pub dataset: Address,
    #[serde(deserialize_with = "uint::deserialize")]
    pub datasetmaxprice: u64,
    pub workerpool: Address,
    #[serde(deserialize_with = "uint::deserialize")]
    pub workerpoolmaxprice: u64,
    pub requester: Address,
    #[serde(deserialize_with = "uint::deserialize")]
    pub volume: u64,
    pub tag: B256,
    #[serde(deserialize_with = "uint::deserialize")]
    pub category: u64,
    #[serde(deserialize_with = "uint::deserialize")]
    pub trust: u64,
    pub beneficiary: Address,
    pub callback: Address,
    pub params: String,
    pub salt: B256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<Bytes>,
}

impl AppOrder {
    pub fn hash(&self, domain: &Eip712Domain) -> B256 {
        typed::AppOrder {
            app: self.app,
            appprice: U256::from(self.appprice),
            volume: U256::from(self.volume),
            tag: self.tag,
            datasetrestrict: self.datasetrestrict,
            workerpoolrestrict: self.workerpoolrestrict,
            requesterrestrict: self.requesterrestrict,
            salt: self.salt,
        }
        .eip712_signing_hash(domain)
    }
}

impl DatasetOrder {
    /// The "no dataset" placeholder accepted by `matchOrders`.
    pub fn empty() -> Self {
        Self {
            dataset: Address::ZERO,
            datasetprice: 0,
            volume: 0,
            tag: B256::ZERO,
            apprestrict: Address::ZERO,
            workerpoolrestrict: Address::ZERO,
            requesterrestrict: Address::ZERO,
            salt: B256::ZERO,
            sign: Some(Bytes::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_zero()
    }

    pub fn hash(&self, domain: &Eip712Domain) -> B256 {
        typed::DatasetOrder {
            dataset: self.dataset,
            datasetprice: U256::from(self.datasetprice),
            volume: U256::from(self.volume),
            tag: self.tag,
            apprestrict: self.apprestrict,
            workerpoolrestrict: self.workerpoolrestrict,
            requesterrestrict: self.requesterrestrict,
            salt: self.salt,
        }
        .eip712_signing_hash(domain)
    }
}

impl WorkerpoolOrder {
    pub fn hash(&self, domain: &Eip712Domain) -> B256 {
        typed::WorkerpoolOrder {
            workerpool: self.workerpool,
            workerpoolprice: U256::from(self.workerpoolprice),
            volume: U256::from(self.volume),
            tag: self.tag,
            category: U256::from(self.category),
            trust: U256::from(self.trust),
            apprestrict: self.apprestrict,
            datasetrestrict: self.datasetrestrict,
            requesterrestrict: self.requesterrestrict,
            salt: self.salt,
        }
        .eip712_signing_hash(domain)
    }
}

impl RequestOrder {
    pub fn hash(&self, domain: &Eip712Domain) -> B256 {
        typed::RequestOrder {
            app: self.app,
            appmaxprice: U256::from(self.appmaxprice),
            dataset: self.dataset,
            datasetmaxprice: U256::from(self.datasetmaxprice),
            workerpool: self.workerpool,
            workerpoolmaxprice: U256::from(self.workerpoolmaxprice),
            requester: self.requester,
            volume: U256::from(self.volume),
            tag: self.tag,
            category: U256::from(self.category),
            trust: U256::from(self.trust),
            beneficiary: self.beneficiary,
            callback: self.callback,
            params: self.params.clone(),
            salt: self.salt,
        }
        .eip712_signing_hash(domain)
    }
}

/// Discriminant of [`Order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    App,
    Dataset,
    Workerpool,
    Request,
}

impl OrderKind {
    /// `apporder`, `datasetorder`, ...
    pub const fn label(self) -> &'static str {
        match self {
            Self::App => "apporder",
            Self::Dataset => "datasetorder",
            Self::Workerpool => "workerpoolorder",
            Self::Request => "requestorder",
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderKind {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().trim_end_matches("order") {
            "app" => Ok(Self::App),
            "dataset" => Ok(Self::Dataset),
            "workerpool" => Ok(Self::Workerpool),
            "request" => Ok(Self::Request),
            _ => Err(SdkError::validation(format!("unknown order kind {s}"))),
        }
    }
}

/// Any of the four orders.
///
/// Untagged on the wire; the variants are told apart by their price fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Order {
    App(AppOrder),
    Dataset(DatasetOrder),
    Workerpool(WorkerpoolOrder),
    Request(RequestOrder),
}

impl Order {
    pub const fn kind(&self) -> OrderKind {
        match self {
            Self::App(_) => OrderKind::App,
            Self::Dataset(_) => OrderKind::Dataset,
            Self::Workerpool(_) => OrderKind::Workerpool,
            Self::Request(_) => OrderKind::Request,
        }
    }

    /// Canonical hash; equals the hub's on-chain computation for the same fields.
    pub fn hash(&self, domain: &Eip712Domain) -> B256 {
        match self {
            Self::App(o) => o.hash(domain),
            Self::Dataset(o) => o.hash(domain),
            Self::Workerpool(o) => o.hash(domain),
            Self::Request(o) => o.hash(domain),
        }
    }

    pub const fn volume(&self) -> u64 {
        match self {
            Self::App(o) => o.volume,
            Self::Dataset(o) => o.volume,
            Self::Workerpool(o) => o.volume,
            Self::Request(o) => o.volume,
        }
    }

    pub const fn sign(&self) -> Option<&Bytes> {
        match self {
            Self::App(o) => o.sign.as_ref(),
            Self::Dataset(o) => o.sign.as_ref(),
            Self::Workerpool(o) => o.sign.as_ref(),
            Self::Request(o) => o.sign.as_ref(),
        }
    }

    /// Resource whose owner must sign, or `None` for request orders.
    pub const fn resource(&self) -> Option<(ResourceKind, Address)> {
        match self {
            Self::App(o) => Some((ResourceKind::App, o.app)),
            Self::Dataset(o) => Some((ResourceKind::Dataset, o.dataset)),
            Self::Workerpool(o) => Some((ResourceKind::Workerpool, o.workerpool)),
            Self::Request(_) => None,
        }
    }

    /// A new order carrying `sign`; the receiver is left untouched.
    #[must_use]
    pub fn with_sign(&self, sign: Bytes) -> Self {
        let mut signed = self.clone();
        match &mut signed {
            Self::App(o) => o.sign = Some(sign),
            Self::Dataset(o) => o.sign = Some(sign),
            Self::Workerpool(o) => o.sign = Some(sign),
            Self::Request(o) => o.sign = Some(sign),
        }
        signed
    }

    /// Parse an order of a known kind from JSON.
    pub fn from_json(kind: OrderKind, json: &str) -> SdkResult<Self> {
        let parsed = match kind {
            OrderKind::App => serde_json::from_str(json).map(Self::App),
            OrderKind::Dataset => serde_json::from_str(json).map(Self::Dataset),
            OrderKind::Workerpool => serde_json::from_str(json).map(Self::Workerpool),
            OrderKind::Request => serde_json::from_str(json).map(Self::Request),
        };
        parsed.map_err(|e| SdkError::validation(format!("invalid {kind}: {e}")))
    }
}

/// Caller-supplied fields for [`create_order`].
///
/// Every field is optional; the ones that do not apply to the requested
/// kind are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderFields {
    pub app: Option<Address>,
    pub dataset: Option<Address>,
    pub workerpool: Option<Address>,
    /// `appprice`, `datasetprice` or `workerpoolprice` depending on the kind.
    pub price: Option<u64>,
    pub appmaxprice: Option<u64>,
    pub datasetmaxprice: Option<u64>,
    pub workerpoolmaxprice: Option<u64>,
    pub volume: Option<u64>,
    pub tag: Option<B256>,
    pub category: Option<u64>,
    pub trust: Option<u64>,
    pub apprestrict: Option<Address>,
    pub datasetrestrict: Option<Address>,
    pub workerpoolrestrict: Option<Address>,
    pub requesterrestrict: Option<Address>,
    pub requester: Option<Address>,
    pub beneficiary: Option<Address>,
    pub callback: Option<Address>,
    pub params: Option<String>,
    pub salt: Option<B256>,
}

/// 32 random bytes making each order hash unique.
pub fn random_salt() -> B256 {
    B256::from(rand::random::<[u8; 32]>())
}

fn required(value: Option<Address>, field: &str, kind: OrderKind) -> SdkResult<Address> {
    match value {
        Some(address) if !address.is_zero() => Ok(address),
        _ => Err(SdkError::validation(format!("{kind} requires a non-zero {field}"))),
    }
}

/// Build an unsigned order from `fields` over the kind defaults.
///
/// Defaults: zero prices, zero restrictions, zero tag, category 0, trust 0,
/// a fresh random salt, volume [`DEFAULT_RESOURCE_VOLUME`] for app/dataset
/// and [`DEFAULT_EXECUTION_VOLUME`] for workerpool/request. A request's
/// beneficiary defaults to its requester.
pub fn create_order(kind: OrderKind, fields: OrderFields) -> SdkResult<Order> {
    let salt = fields.salt.unwrap_or_else(random_salt);
    let tag = fields.tag.unwrap_or_default();
    let zero = Address::ZERO;

    let order = match kind {
        OrderKind::App => Order::App(AppOrder {
            app: required(fields.app, "app", kind)?,
            appprice: fields.price.unwrap_or(0),
            volume: fields.volume.unwrap_or(DEFAULT_RESOURCE_VOLUME),
            tag,
            datasetrestrict: fields.datasetrestrict.unwrap_or(zero),
            workerpoolrestrict: fields.workerpoolrestrict.unwrap_or(zero),
            requesterrestrict: fields.requesterrestrict.unwrap_or(zero),
            salt,
            sign: None,
        }),
        OrderKind::Dataset => Order::Dataset(DatasetOrder {
            dataset: required(fields.dataset, "dataset", kind)?,
            datasetprice: fields.price.unwrap_or(0),
            volume: fields.volume.unwrap_or(DEFAULT_RESOURCE_VOLUME),
            tag,
            apprestrict: fields.apprestrict.unwrap_or(zero),
            workerpoolrestrict: fields.workerpoolrestrict.unwrap_or(zero),
            requesterrestrict: fields.requesterrestrict.unwrap_or(zero),
            salt,
            sign: None,
        }),
        OrderKind::Workerpool => Order::Workerpool(WorkerpoolOrder {
            workerpool: required(fields.workerpool, "workerpool", kind)?,
            workerpoolprice: fields.price.unwrap_or(0),
            volume: fields.volume.unwrap_or(DEFAULT_EXECUTION_VOLUME),
            tag,
            category: fields.category.unwrap_or(0),
            trust: fields.trust.unwrap_or(0),
            apprestrict: fields.apprestrict.unwrap_or(zero),
            datasetrestrict: fields.datasetrestrict.unwrap_or(zero),
            requesterrestrict: fields.requesterrestrict.unwrap_or(zero),
            salt,
            sign: None,
        }),
        OrderKind::Request => {
            let requester = required(fields.requester, "requester", kind)?;
            Order::Request(RequestOrder {
                app: required(fields.app, "app", kind)?,
                appmaxprice: fields.appmaxprice.unwrap_or(0),
                dataset: fields.dataset.unwrap_or(zero),
                datasetmaxprice: fields.datasetmaxprice.unwrap_or(0),
                workerpool: fields.workerpool.unwrap_or(zero),
                workerpoolmaxprice: fields.workerpoolmaxprice.unwrap_or(0),
                requester,
                volume: fields.volume.unwrap_or(DEFAULT_EXECUTION_VOLUME),
                tag,
                category: fields.category.unwrap_or(0),
                trust: fields.trust.unwrap_or(0),
                beneficiary: fields.beneficiary.unwrap_or(requester),
                callback: fields.callback.unwrap_or(zero),
                params: fields.params.unwrap_or_default(),
                salt,
                sign: None,
            })
        }
    };

    if order.volume() == 0 {
        return Err(SdkError::validation(format!("{kind} volume must be positive")));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::eip712_domain;

    fn domain() -> Eip712Domain {
        eip712_domain! {
            name: "iExecODB",
            version: "5.0.0",
            chain_id: 134,
            verifying_contract: crate::domain::chain::STANDARD_HUB,
        }
    }

    fn app_fields() -> OrderFields {
        OrderFields {
            app: Some(Address::repeat_byte(0xaa)),
            salt: Some(B256::repeat_byte(0x01)),
            ..OrderFields::default()
        }
    }

    #[test]
    fn test_defaults_per_kind() {
        let Order::App(app) = create_order(OrderKind::App, app_fields()).unwrap() else {
            panic!("expected app order");
        };
        assert_eq!(app.appprice, 0);
        assert_eq!(app.volume, DEFAULT_RESOURCE_VOLUME);
        assert!(app.requesterrestrict.is_zero());
        assert!(app.sign.is_none());

        let request = create_order(
            OrderKind::Request,
            OrderFields {
                app: Some(Address::repeat_byte(0xaa)),
                requester: Some(Address::repeat_byte(0xcc)),
                ..OrderFields::default()
            },
        )
        .unwrap();
        let Order::Request(request) = request else {
            panic!("expected request order");
        };
        assert_eq!(request.volume, DEFAULT_EXECUTION_VOLUME);
        assert_eq!(request.beneficiary, request.requester);

        let workerpool = create_order(
            OrderKind::Workerpool,
            OrderFields {
                workerpool: Some(Address::repeat_byte(0xbb)),
                ..OrderFields::default()
            },
        )
        .unwrap();
        assert_eq!(workerpool.volume(), DEFAULT_EXECUTION_VOLUME);
    }

    #[test]
    fn test_missing_resource_is_validation_error() {
        let err = create_order(OrderKind::Workerpool, OrderFields::default()).unwrap_err();
        assert_eq!(err.name(), "ValidationError");
        let err = create_order(
            OrderKind::App,
            OrderFields { volume: Some(0), ..app_fields() },
        )
        .unwrap_err();
        assert!(err.to_string().contains("volume"));
    }

    #[test]
    fn test_random_salt_differs() {
        let a = create_order(OrderKind::App, OrderFields { salt: None, ..app_fields() }).unwrap();
        let b = create_order(OrderKind::App, OrderFields { salt: None, ..app_fields() }).unwrap();
        assert_ne!(a.hash(&domain()), b.hash(&domain()));
    }

    #[test]
    fn test_hash_ignores_signature() {
        let order = create_order(OrderKind::App, app_fields()).unwrap();
        let signed = order.with_sign(Bytes::from(vec![1u8; 65]));
        assert_eq!(order.hash(&domain()), signed.hash(&domain()));
        assert!(order.sign().is_none());
    }

    #[test]
    fn test_hash_depends_on_domain() {
        let order = create_order(OrderKind::App, app_fields()).unwrap();
        let other = eip712_domain! {
            name: "iExecODB",
            version: "5.0.0",
            chain_id: 1,
            verifying_contract: crate::domain::chain::STANDARD_HUB,
        };
        assert_ne!(order.hash(&domain()), order.hash(&other));
    }

    #[test]
    fn test_json_round_trip_by_kind() {
        let order = create_order(OrderKind::App, app_fields()).unwrap();
        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("\"appprice\":0"));
        let back = Order::from_json(OrderKind::App, &json).unwrap();
        assert_eq!(back, order);
        assert!(Order::from_json(OrderKind::Request, &json).is_err());
    }

    #[test]
    fn test_uint_fields_accept_decimal_strings() {
        let order = create_order(OrderKind::App, OrderFields { price: Some(3), ..app_fields() }).unwrap();
        let mut value = serde_json::to_value(&order).unwrap();
        value["appprice"] = serde_json::json!("3");
        value["volume"] = serde_json::json!(" 1000000");

        let parsed = Order::from_json(OrderKind::App, &value.to_string()).unwrap();
        assert_eq!(parsed, order);
        assert_eq!(parsed.hash(&domain()), order.hash(&domain()));

        let again = Order::from_json(OrderKind::App, &serde_json::to_string(&parsed).unwrap()).unwrap();
        assert_eq!(again, order);

        value["volume"] = serde_json::json!("-1");
        assert_eq!(Order::from_json(OrderKind::App, &value.to_string()).unwrap_err().name(), "ValidationError");
    }

    #[test]
    fn test_request_uints_accept_decimal_strings() {
        let json = serde_json::json!({
            "app": Address::repeat_byte(0xaa),
            "appmaxprice": "10",
            "dataset": Address::ZERO,
            "datasetmaxprice": 0,
            "workerpool": Address::ZERO,
            "workerpoolmaxprice": "20",
            "requester": Address::repeat_byte(0xcc),
            "volume": "2",
            "tag": B256::ZERO,
            "category": "1",
            "trust": "0",
            "beneficiary": Address::repeat_byte(0xcc),
            "callback": Address::ZERO,
            "params": "",
            "salt": B256::repeat_byte(0x01),
            "sign": "0x",
        });
        let Order::Request(request) = Order::from_json(OrderKind::Request, &json.to_string()).unwrap() else {
            panic!("expected request order");
        };
        assert_eq!(request.appmaxprice, 10);
        assert_eq!(request.workerpoolmaxprice, 20);
        assert_eq!(request.volume, 2);
        assert_eq!(request.category, 1);
        assert!(request.sign.as_ref().is_some_and(|sign| sign.is_empty()));
    }

    #[test]
    fn test_order_kind_parse() {
        assert_eq!("requestorder".parse::<OrderKind>().unwrap(), OrderKind::Request);
        assert_eq!("app".parse::<OrderKind>().unwrap(), OrderKind::App);
        assert!("deal".parse::<OrderKind>().is_err());
    }
}
