use pledge_codec::EncodingError;
use pledge_ledger::{LedgerError, TransferRejection};
use thiserror::Error;

/// Errors from campaign governance operations.
///
/// Local precondition failures (authorization, state machine, encoding)
/// are raised before any ledger exchange; ledger-side rejections surface
/// typed and are never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CampaignError {
    #[error("caller is not authorized for this operation")]
    NotAuthorized,

    #[error("campaign is already canceled")]
    AlreadyCanceled,

    #[error("no reviewer handoff is pending")]
    NoPendingHandoff,

    #[error("nominated reviewer matches the current reviewer")]
    SelfHandoff,

    #[error("batch encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("transfer rejected: {0}")]
    Transfer(TransferRejection),

    #[error("update rejected: {0}")]
    UpdateRejected(String),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl From<LedgerError> for CampaignError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::TransferRejected(rejection) => Self::Transfer(rejection),
            LedgerError::UpdateRejected(reason) => Self::UpdateRejected(reason),
            LedgerError::UnknownAdmin(id) => {
                Self::Unavailable(format!("admin {id} cannot be resolved"))
            }
            LedgerError::Unavailable(reason) => Self::Unavailable(reason),
        }
    }
}
