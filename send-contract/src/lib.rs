//! Send Contract
//!
//! Balance transfer state transition for a replicated ledger.
//!
//! # Architecture
//!
//! - **Key Schema**: Namespaced, length-prefixed state keys
//! - **State Access**: Batched reads and atomic batched writes against the host store
//! - **CheckTx**: Stateless admission with a governance controlled minimum fee
//! - **DeliverTx**: Conservation-preserving transfer with pruning of drained accounts
//!
//! # Invariants
//!
//! - Money conservation: a transfer never changes Σ(from, to)
//! - Zero balances are never stored
//! - No partial writes: debit and credit commit in one batch or not at all

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod contract;
pub mod error;
pub mod keys;
pub mod metrics;
pub mod storage;
pub mod store;
pub mod types;

// Re-exports
pub use config::Config;
pub use contract::{Contract, Plugin};
pub use error::{Error, Result, StoreError};
pub use storage::RocksStore;
pub use store::{MemoryStore, StateStore};
pub use types::{Account, FeeParams, Message, MessageSend, Transaction};
