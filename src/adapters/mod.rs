//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (JSON-RPC through alloy, HTTP through reqwest).
//!
//! Adapter categories:
//! - `api`: order-book gateway REST client and auth
//! - `chain`: EVM chain interaction via alloy-rs

pub mod api;
pub mod chain;
