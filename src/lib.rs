//! iExec Client — Library Root
//!
//! Marketplace SDK: orders and their EIP-712 signatures, deals, the
//! escrow account, wallet transfers and the mainchain/sidechain bridge.
//! Re-exports all modules for the CLI, integration tests and benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
