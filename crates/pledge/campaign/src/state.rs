use pledge_types::{Address, AdminId, AdminRecord, AssetRule, LedgerRef};
use serde::{Deserialize, Serialize};

/// Derived campaign status exposed in state snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignStatus {
    Active,
    Canceled,
}

/// Governance phase of a campaign.
///
/// Cancellation is terminal, and a canceled campaign structurally cannot
/// carry a pending handoff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernancePhase {
    Active {
        reviewer: Address,
        pending_reviewer: Option<Address>,
    },
    Canceled {
        reviewer: Address,
    },
}

impl GovernancePhase {
    pub fn status(&self) -> CampaignStatus {
        match self {
            Self::Active { .. } => CampaignStatus::Active,
            Self::Canceled { .. } => CampaignStatus::Canceled,
        }
    }

    pub fn reviewer(&self) -> &Address {
        match self {
            Self::Active { reviewer, .. } | Self::Canceled { reviewer } => reviewer,
        }
    }

    pub fn pending_reviewer(&self) -> Option<&Address> {
        match self {
            Self::Active {
                pending_reviewer, ..
            } => pending_reviewer.as_ref(),
            Self::Canceled { .. } => None,
        }
    }
}

/// The campaign's local governance fields, guarded by one lock so no read
/// ever observes a reviewer and a pending reviewer from two different
/// handoff generations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceRecord {
    pub phase: GovernancePhase,
    pub transfer_rules: Vec<AssetRule>,
}

/// One self-consistent snapshot of a campaign: local governance fields
/// joined with the admin record resolved from the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignState {
    pub ledger_ref: LedgerRef,
    pub project_id: AdminId,
    pub reviewer: Address,
    pub pending_reviewer: Option<Address>,
    pub status: CampaignStatus,
    pub transfer_rules: Vec<AssetRule>,
    pub record: AdminRecord,
}
