//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use cases require from the
//! outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ChainClient`: raw chain reads, value sends and receipts
//! - `HubContract` / `TokenContract` / `BridgeContract`: typed contract capabilities
//! - `OrderBook`: the order-book gateway REST API
//!
//! `ContractClient` bundles the ports of one chain connection.

pub mod abi;
pub mod chain_client;
pub mod contract_client;
pub mod contracts;
pub mod gateway;

pub use chain_client::ChainClient;
pub use contract_client::ContractClient;
pub use contracts::{AccountBalance, BridgeContract, Category, HubContract, OrderOperation, TokenContract};
pub use gateway::OrderBook;
