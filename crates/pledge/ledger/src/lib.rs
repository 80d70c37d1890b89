//! Pledge ledger adapter boundary.
//!
//! This crate provides:
//! - the `PledgeLedger` trait, the sole boundary the campaign layer
//!   depends on
//! - the ledger-side error taxonomy
//! - an in-memory ledger implementation for tests, demos, and local use
//!
//! Durable balance storage, the admin hierarchy, and serialization of
//! concurrent administrative operations are the ledger's own concerns;
//! callers observe them only through this boundary.

#![deny(unsafe_code)]

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{LedgerError, TransferRejection};
pub use memory::{InMemoryPledgeLedger, Pledge};
pub use traits::PledgeLedger;
