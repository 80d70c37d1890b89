use std::sync::{Arc, RwLock};

use pledge_codec::decode_batch;
use pledge_ledger::PledgeLedger;
use pledge_types::{Address, AdminId, AdminKind, AdminMetadata, AssetRule, LedgerRef, PledgeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CampaignError;
use crate::guard::{authorize, OperationKind};
use crate::state::{CampaignState, GovernancePhase, GovernanceRecord};

/// Registration configuration for a new campaign.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Identity the campaign registers under; also its plugin reference.
    pub address: Address,
    pub name: String,
    pub url: String,
    /// Seconds a transfer into the campaign stays revocable.
    pub commit_time: u64,
    /// Creator identity; moves pledges and may cancel. Immutable.
    pub owner: Address,
    /// Identity empowered to cancel and to hand its own role off.
    pub reviewer: Address,
}

/// A campaign registered as one project admin on an external pledge
/// ledger.
///
/// Composition wrapper over the raw ledger boundary: governance methods
/// are inherent methods here, and the ledger stays behind
/// `Arc<dyn PledgeLedger>`. The campaign holds no durable state of its
/// own beyond the governance record; every balance lives in the ledger.
pub struct Campaign {
    ledger: Arc<dyn PledgeLedger>,
    project_id: AdminId,
    owner: Address,
    governance: RwLock<GovernanceRecord>,
}

impl Campaign {
    /// Register a new campaign with the ledger.
    ///
    /// The project id is assigned here, exactly once; it never changes
    /// afterwards.
    pub async fn register(
        ledger: Arc<dyn PledgeLedger>,
        config: CampaignConfig,
    ) -> Result<Self, CampaignError> {
        let CampaignConfig {
            address,
            name,
            url,
            commit_time,
            owner,
            reviewer,
        } = config;

        let metadata = AdminMetadata {
            address,
            name,
            url,
            commit_time,
        };
        let project_id = ledger.register_admin(AdminKind::Project, metadata).await?;
        info!(project = %project_id, %owner, %reviewer, "campaign registered");

        Ok(Self {
            ledger,
            project_id,
            owner,
            governance: RwLock::new(GovernanceRecord {
                phase: GovernancePhase::Active {
                    reviewer,
                    pending_reviewer: None,
                },
                transfer_rules: Vec::new(),
            }),
        })
    }

    pub fn project_id(&self) -> AdminId {
        self.project_id
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn ledger_ref(&self) -> LedgerRef {
        self.ledger.ledger_ref()
    }

    /// Nominate a new reviewer, overwriting any prior nomination.
    ///
    /// The handoff completes only when the nominee accepts; there is no
    /// timeout on a pending nomination.
    pub fn change_reviewer(
        &self,
        caller: &Address,
        new_reviewer: Address,
    ) -> Result<(), CampaignError> {
        let mut governance = self.write_governance()?;
        authorize(
            OperationKind::ChangeReviewer,
            caller,
            &self.owner,
            &governance.phase,
        )?;

        match &mut governance.phase {
            GovernancePhase::Active {
                reviewer,
                pending_reviewer,
            } => {
                if *reviewer == new_reviewer {
                    return Err(CampaignError::SelfHandoff);
                }
                if let Some(prior) = pending_reviewer.replace(new_reviewer.clone()) {
                    debug!(project = %self.project_id, %prior, "prior nomination overwritten");
                }
                info!(project = %self.project_id, nominee = %new_reviewer, "reviewer nominated");
                Ok(())
            }
            GovernancePhase::Canceled { .. } => Err(CampaignError::AlreadyCanceled),
        }
    }

    /// Complete a pending handoff: the nominee becomes the reviewer and
    /// the nomination is cleared.
    pub fn accept_new_reviewer(&self, caller: &Address) -> Result<(), CampaignError> {
        let mut governance = self.write_governance()?;
        authorize(
            OperationKind::AcceptNewReviewer,
            caller,
            &self.owner,
            &governance.phase,
        )?;

        match &mut governance.phase {
            GovernancePhase::Active {
                reviewer,
                pending_reviewer,
            } => match pending_reviewer.take() {
                Some(next) => {
                    info!(project = %self.project_id, from = %reviewer, to = %next, "reviewer handoff completed");
                    *reviewer = next;
                    Ok(())
                }
                None => Err(CampaignError::NoPendingHandoff),
            },
            GovernancePhase::Canceled { .. } => Err(CampaignError::AlreadyCanceled),
        }
    }

    /// Cancel the campaign: ledger record first, then the local phase.
    ///
    /// Terminal. If the ledger exchange fails the campaign stays active
    /// and the failure propagates unchanged.
    pub async fn cancel_campaign(&self, caller: &Address) -> Result<(), CampaignError> {
        {
            let governance = self.read_governance()?;
            authorize(
                OperationKind::CancelCampaign,
                caller,
                &self.owner,
                &governance.phase,
            )?;
        }

        self.ledger.cancel_admin(self.project_id).await?;

        let mut governance = self.write_governance()?;
        match &governance.phase {
            // A concurrent cancellation landed between our guard check
            // and the ledger acknowledgement.
            GovernancePhase::Canceled { .. } => Err(CampaignError::AlreadyCanceled),
            GovernancePhase::Active { reviewer, .. } => {
                let reviewer = reviewer.clone();
                warn!(project = %self.project_id, by = %caller, "campaign canceled");
                governance.phase = GovernancePhase::Canceled { reviewer };
                Ok(())
            }
        }
    }

    /// Replace the campaign's display metadata on its ledger record.
    pub async fn update(
        &self,
        caller: &Address,
        name: &str,
        url: &str,
        commit_time: u64,
    ) -> Result<(), CampaignError> {
        {
            let governance = self.read_governance()?;
            authorize(OperationKind::Update, caller, &self.owner, &governance.phase)?;
        }

        self.ledger
            .update_admin_record(self.project_id, name, url, commit_time)
            .await?;
        debug!(project = %self.project_id, name, "campaign record updated");
        Ok(())
    }

    /// Move `amount` base units out of `pledge` to `to_admin`.
    pub async fn transfer(
        &self,
        caller: &Address,
        pledge: PledgeId,
        amount: u64,
        to_admin: AdminId,
    ) -> Result<(), CampaignError> {
        {
            let governance = self.read_governance()?;
            authorize(
                OperationKind::Transfer,
                caller,
                &self.owner,
                &governance.phase,
            )?;
        }

        self.ledger.apply_transfer(pledge, amount, to_admin).await?;
        info!(project = %self.project_id, %pledge, amount, to = %to_admin, "pledge transferred");
        Ok(())
    }

    /// Decode an encoded batch and issue it as one multi-transfer.
    ///
    /// Malformed input fails before any ledger exchange is attempted, and
    /// a batch the ledger rejects is not applied in part.
    pub async fn m_transfer(
        &self,
        caller: &Address,
        encoded: &[u8],
        to_admin: AdminId,
    ) -> Result<(), CampaignError> {
        {
            let governance = self.read_governance()?;
            authorize(
                OperationKind::MTransfer,
                caller,
                &self.owner,
                &governance.phase,
            )?;
        }

        let entries = decode_batch(encoded)?;
        self.ledger
            .apply_batch_transfer(&entries, to_admin)
            .await?;
        info!(project = %self.project_id, entries = entries.len(), to = %to_admin, "batch transferred");
        Ok(())
    }

    /// Replace the transfer-permission rule set wholesale.
    ///
    /// The rules are forwarded to the ledger, which enforces them when
    /// value moves into the campaign; they are stored locally only after
    /// the ledger accepts them.
    pub async fn set_transfer_permissions(
        &self,
        caller: &Address,
        rules: Vec<AssetRule>,
    ) -> Result<(), CampaignError> {
        {
            let governance = self.read_governance()?;
            authorize(
                OperationKind::SetTransferPermissions,
                caller,
                &self.owner,
                &governance.phase,
            )?;
        }

        self.ledger.set_admin_rules(self.project_id, &rules).await?;

        let mut governance = self.write_governance()?;
        info!(project = %self.project_id, rules = rules.len(), "transfer permissions replaced");
        governance.transfer_rules = rules;
        Ok(())
    }

    /// Assemble one self-consistent snapshot: the admin record resolved
    /// from the ledger, joined with the local governance fields read
    /// under a single lock acquisition.
    pub async fn get_state(&self) -> Result<CampaignState, CampaignError> {
        let record = self.ledger.get_admin_record(self.project_id).await?;

        let governance = self.read_governance()?;
        Ok(CampaignState {
            ledger_ref: self.ledger.ledger_ref(),
            project_id: self.project_id,
            reviewer: governance.phase.reviewer().clone(),
            pending_reviewer: governance.phase.pending_reviewer().cloned(),
            status: governance.phase.status(),
            transfer_rules: governance.transfer_rules.clone(),
            record,
        })
    }

    fn read_governance(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, GovernanceRecord>, CampaignError> {
        self.governance
            .read()
            .map_err(|_| CampaignError::Unavailable("governance lock poisoned".into()))
    }

    fn write_governance(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, GovernanceRecord>, CampaignError> {
        self.governance
            .write()
            .map_err(|_| CampaignError::Unavailable("governance lock poisoned".into()))
    }
}
