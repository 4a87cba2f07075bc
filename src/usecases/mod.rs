//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! client's workflows. Each use case works on one `ContractClient`
//! (the bridge on two) and is safe to share across tasks.
//!
//! Use cases:
//! - `AccountManager`: escrow deposit, withdrawal and balance
//! - `WalletManager`: sends, sweep, enterprise wrap/unwrap
//! - `OrderManager`: order lifecycle, signatures and the order book
//! - `Settlement`: matching orders into a deal
//! - `BridgeOrchestrator`: mainchain/sidechain transfers
//! - `balance`: guards shared by every debit

pub mod account;
pub mod balance;
pub mod bridge;
pub mod order_manager;
pub mod settlement;
pub mod wallet_manager;

pub use account::AccountManager;
pub use bridge::{BridgeHandle, BridgeOrchestrator, BridgeOutcome};
pub use order_manager::OrderManager;
pub use settlement::Settlement;
pub use wallet_manager::{SweepResult, WalletManager};
