use async_trait::async_trait;
use pledge_codec::TransferInstruction;
use pledge_types::{
    AdminId, AdminKind, AdminMetadata, AdminRecord, AssetRule, LedgerRef, PledgeId,
};

use crate::error::LedgerError;

/// The narrow boundary through which a campaign reads admin records and
/// issues transfer instructions.
///
/// Implementations serialize concurrent administrative operations; callers
/// hold no lock of their own. A rejected exchange must leave balances
/// untouched.
#[async_trait]
pub trait PledgeLedger: Send + Sync {
    /// Instance identity, included in campaign state snapshots.
    fn ledger_ref(&self) -> LedgerRef;

    /// Register a new admin and assign its identifier. Called once per admin.
    async fn register_admin(
        &self,
        kind: AdminKind,
        metadata: AdminMetadata,
    ) -> Result<AdminId, LedgerError>;

    /// Resolve one admin record.
    async fn get_admin_record(&self, id: AdminId) -> Result<AdminRecord, LedgerError>;

    /// Move `amount` base units out of `from` into a pledge owned by `to_admin`.
    async fn apply_transfer(
        &self,
        from: PledgeId,
        amount: u64,
        to_admin: AdminId,
    ) -> Result<(), LedgerError>;

    /// Apply a pre-decoded batch as one multi-transfer: every entry lands
    /// or none do.
    async fn apply_batch_transfer(
        &self,
        entries: &[TransferInstruction],
        to_admin: AdminId,
    ) -> Result<(), LedgerError>;

    /// Replace an admin's display metadata.
    async fn update_admin_record(
        &self,
        id: AdminId,
        name: &str,
        url: &str,
        commit_time: u64,
    ) -> Result<(), LedgerError>;

    /// Replace the transfer-permission rule set enforced whenever value
    /// moves into a pledge owned by `id`.
    async fn set_admin_rules(&self, id: AdminId, rules: &[AssetRule]) -> Result<(), LedgerError>;

    /// Mark an admin record canceled.
    async fn cancel_admin(&self, id: AdminId) -> Result<(), LedgerError>;
}
