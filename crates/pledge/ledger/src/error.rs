use pledge_types::{AdminId, AssetId, PledgeId};
use thiserror::Error;

/// Errors returned across the ledger adapter boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("transfer rejected: {0}")]
    TransferRejected(#[from] TransferRejection),

    #[error("update rejected: {0}")]
    UpdateRejected(String),

    #[error("unknown admin {0}")]
    UnknownAdmin(AdminId),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Reason the ledger refused a transfer instruction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferRejection {
    #[error("unknown pledge {0}")]
    UnknownPledge(PledgeId),

    #[error("pledge {pledge} holds {available} base units, {requested} requested")]
    InsufficientBalance {
        pledge: PledgeId,
        requested: u64,
        available: u64,
    },

    #[error("admin {admin} does not accept asset {asset}")]
    RuleViolation { admin: AdminId, asset: AssetId },

    #[error("batch contains no entries")]
    EmptyBatch,
}
