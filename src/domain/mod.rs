//! Domain layer - Marketplace types and rules.
//!
//! Pure logic of the client: exact unit conversion, the chain context,
//! orders and their typed-data hashing, match rules, deal identifiers and
//! the bridge transfer state machine. Nothing here performs I/O.

pub mod bridge;
pub mod chain;
pub mod deal;
pub mod errors;
pub mod matching;
pub mod order;
pub mod receipt;
pub mod signing;
pub mod units;

pub use bridge::{BridgeDirection, BridgeLimits, BridgeProgress, BridgeState, BridgeTransferLog};
pub use chain::{ChainContext, ContractName, Flavor, GasPricePolicy, ResourceKind, TxOptions};
pub use deal::{Bot, Deal};
pub use errors::{LimitBound, SdkError, SdkResult};
pub use order::{AppOrder, DatasetOrder, Order, OrderFields, OrderKind, RequestOrder, WorkerpoolOrder};
pub use receipt::{ReceiptLog, TxReceipt};
pub use units::{NativeAmount, TokenAmount};
