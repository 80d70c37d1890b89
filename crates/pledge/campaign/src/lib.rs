//! Campaign governance over a pledge ledger.
//!
//! A campaign is one project admin registered on an external pledge
//! ledger. This crate implements its governance state machine:
//!
//! - two-phase reviewer handoff (nominate, then accept)
//! - terminal cancellation
//! - single and batch pledge transfers delegated to the ledger
//! - transfer-permission rule stewardship
//!
//! Authorization is a pure guard re-evaluated against a fresh governance
//! record on every call. Ledger failures propagate upward unchanged;
//! nothing is retried, since a retried transfer could double-apply.

#![deny(unsafe_code)]

pub mod campaign;
pub mod error;
pub mod guard;
pub mod state;

pub use campaign::{Campaign, CampaignConfig};
pub use error::CampaignError;
pub use guard::{authorize, OperationKind};
pub use state::{CampaignState, CampaignStatus, GovernancePhase, GovernanceRecord};
