use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use pledge_codec::TransferInstruction;
use pledge_types::{
    rules_permit, AdminId, AdminKind, AdminMetadata, AdminRecord, AssetId, AssetRule, LedgerRef,
    PledgeId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LedgerError, TransferRejection};
use crate::traits::PledgeLedger;

/// In-memory pledge ledger used for tests, local demos, and embedding.
///
/// Admin and pledge identifiers are assigned sequentially starting at 1.
/// Value moving into an admin lands in one pledge per `(admin, asset)`
/// pair, created on first use.
pub struct InMemoryPledgeLedger {
    reference: LedgerRef,
    inner: RwLock<LedgerState>,
}

/// A quantity of value held under one admin's custody.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pledge {
    pub owner: AdminId,
    pub asset: AssetId,
    pub amount: u64,
}

#[derive(Default)]
struct LedgerState {
    offline: bool,
    admins: Vec<AdminEntry>,
    pledges: BTreeMap<PledgeId, Pledge>,
    next_pledge: u64,
}

struct AdminEntry {
    record: AdminRecord,
    rules: Vec<AssetRule>,
}

impl InMemoryPledgeLedger {
    pub fn new() -> Self {
        Self::with_ref("memory")
    }

    pub fn with_ref(reference: impl Into<String>) -> Self {
        Self {
            reference: LedgerRef(reference.into()),
            inner: RwLock::new(LedgerState::default()),
        }
    }

    /// Toggle simulated unavailability: while offline, every operation
    /// fails with [`LedgerError::Unavailable`].
    pub fn set_offline(&self, offline: bool) -> Result<(), LedgerError> {
        self.write_state()?.offline = offline;
        Ok(())
    }

    /// Create value under `to_admin` from outside the ledger, subject to
    /// the admin's transfer-permission rules. Returns the receiving pledge.
    pub fn donate(
        &self,
        to_admin: AdminId,
        asset: AssetId,
        amount: u64,
    ) -> Result<PledgeId, LedgerError> {
        let mut state = self.write_state()?;
        state.check_online()?;
        state.check_asset_accepted(to_admin, &asset)?;

        let pledge = state.credit(to_admin, &asset, amount);
        debug!(admin = %to_admin, %asset, amount, %pledge, "donation accepted");
        Ok(pledge)
    }

    /// Current balance of one pledge.
    pub fn pledge_amount(&self, id: PledgeId) -> Result<Option<u64>, LedgerError> {
        Ok(self.read_state()?.pledges.get(&id).map(|p| p.amount))
    }

    /// Full pledge row, for assertions on ownership and asset kind.
    pub fn pledge(&self, id: PledgeId) -> Result<Option<Pledge>, LedgerError> {
        Ok(self.read_state()?.pledges.get(&id).cloned())
    }

    /// Sum of all pledge balances; invariant under successful transfers.
    pub fn total_value(&self) -> Result<u64, LedgerError> {
        Ok(self
            .read_state()?
            .pledges
            .values()
            .map(|p| p.amount)
            .sum())
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, LedgerState>, LedgerError> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Unavailable("ledger read lock poisoned".into()))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, LedgerState>, LedgerError> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Unavailable("ledger write lock poisoned".into()))
    }
}

impl Default for InMemoryPledgeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerState {
    fn check_online(&self) -> Result<(), LedgerError> {
        if self.offline {
            return Err(LedgerError::Unavailable("ledger offline".into()));
        }
        Ok(())
    }

    fn admin(&self, id: AdminId) -> Result<&AdminEntry, LedgerError> {
        let AdminId(raw) = id;
        raw.checked_sub(1)
            .and_then(|index| self.admins.get(index as usize))
            .ok_or(LedgerError::UnknownAdmin(id))
    }

    fn admin_mut(&mut self, id: AdminId) -> Result<&mut AdminEntry, LedgerError> {
        let AdminId(raw) = id;
        raw.checked_sub(1)
            .and_then(|index| self.admins.get_mut(index as usize))
            .ok_or(LedgerError::UnknownAdmin(id))
    }

    fn check_asset_accepted(&self, admin: AdminId, asset: &AssetId) -> Result<(), LedgerError> {
        let entry = self.admin(admin)?;
        if !rules_permit(&entry.rules, asset) {
            return Err(TransferRejection::RuleViolation {
                admin,
                asset: asset.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn pledge_row(&self, id: PledgeId) -> Result<&Pledge, LedgerError> {
        self.pledges
            .get(&id)
            .ok_or_else(|| TransferRejection::UnknownPledge(id).into())
    }

    /// Add `amount` to the pledge holding `asset` for `owner`, creating
    /// the pledge on first use.
    fn credit(&mut self, owner: AdminId, asset: &AssetId, amount: u64) -> PledgeId {
        let existing = self
            .pledges
            .iter()
            .find(|(_, p)| p.owner == owner && &p.asset == asset)
            .map(|(id, _)| *id);

        match existing {
            Some(id) => {
                if let Some(pledge) = self.pledges.get_mut(&id) {
                    pledge.amount += amount;
                }
                id
            }
            None => {
                self.next_pledge += 1;
                let id = PledgeId(self.next_pledge);
                self.pledges.insert(
                    id,
                    Pledge {
                        owner,
                        asset: asset.clone(),
                        amount,
                    },
                );
                id
            }
        }
    }

    /// Validate one draw against a source pledge without mutating it.
    fn check_draw(&self, from: PledgeId, requested: u64) -> Result<&Pledge, LedgerError> {
        let pledge = self.pledge_row(from)?;
        if pledge.amount < requested {
            return Err(TransferRejection::InsufficientBalance {
                pledge: from,
                requested,
                available: pledge.amount,
            }
            .into());
        }
        Ok(pledge)
    }
}

#[async_trait]
impl PledgeLedger for InMemoryPledgeLedger {
    fn ledger_ref(&self) -> LedgerRef {
        self.reference.clone()
    }

    async fn register_admin(
        &self,
        kind: AdminKind,
        metadata: AdminMetadata,
    ) -> Result<AdminId, LedgerError> {
        let mut state = self.write_state()?;
        state.check_online()?;

        let record = AdminRecord {
            kind,
            address: metadata.address.clone(),
            name: metadata.name,
            url: metadata.url,
            commit_time: metadata.commit_time,
            canceled: false,
            plugin: Some(metadata.address),
        };
        state.admins.push(AdminEntry {
            record,
            rules: Vec::new(),
        });

        let id = AdminId(state.admins.len() as u64);
        info!(admin = %id, ?kind, "admin registered");
        Ok(id)
    }

    async fn get_admin_record(&self, id: AdminId) -> Result<AdminRecord, LedgerError> {
        let state = self.read_state()?;
        state.check_online()?;
        Ok(state.admin(id)?.record.clone())
    }

    async fn apply_transfer(
        &self,
        from: PledgeId,
        amount: u64,
        to_admin: AdminId,
    ) -> Result<(), LedgerError> {
        let mut state = self.write_state()?;
        state.check_online()?;

        let asset = {
            let source = state.check_draw(from, amount)?;
            source.asset.clone()
        };
        state.check_asset_accepted(to_admin, &asset)?;

        if let Some(source) = state.pledges.get_mut(&from) {
            source.amount -= amount;
        }
        let destination = state.credit(to_admin, &asset, amount);

        debug!(%from, %destination, to = %to_admin, amount, "transfer applied");
        Ok(())
    }

    async fn apply_batch_transfer(
        &self,
        entries: &[TransferInstruction],
        to_admin: AdminId,
    ) -> Result<(), LedgerError> {
        let mut state = self.write_state()?;
        state.check_online()?;

        if entries.is_empty() {
            return Err(TransferRejection::EmptyBatch.into());
        }

        // Validate every entry before mutating anything, accumulating
        // draws so repeated sources are checked against their combined
        // total. A rejected batch leaves every balance untouched.
        let mut draws: BTreeMap<PledgeId, u64> = BTreeMap::new();
        for entry in entries {
            let asset = state.pledge_row(entry.pledge)?.asset.clone();
            state.check_asset_accepted(to_admin, &asset)?;
            *draws.entry(entry.pledge).or_default() += entry.amount;
        }
        for (&pledge, &total) in &draws {
            state.check_draw(pledge, total)?;
        }

        for entry in entries {
            let asset = match state.pledges.get_mut(&entry.pledge) {
                Some(source) => {
                    source.amount -= entry.amount;
                    source.asset.clone()
                }
                // Unreachable after validation; kept as a typed failure
                // rather than a panic.
                None => return Err(TransferRejection::UnknownPledge(entry.pledge).into()),
            };
            state.credit(to_admin, &asset, entry.amount);
        }

        info!(
            entries = entries.len(),
            to = %to_admin,
            total = entries.iter().map(|e| e.amount).sum::<u64>(),
            "batch transfer applied"
        );
        Ok(())
    }

    async fn update_admin_record(
        &self,
        id: AdminId,
        name: &str,
        url: &str,
        commit_time: u64,
    ) -> Result<(), LedgerError> {
        let mut state = self.write_state()?;
        state.check_online()?;

        let entry = state.admin_mut(id)?;
        if entry.record.canceled {
            return Err(LedgerError::UpdateRejected(format!(
                "admin {id} is canceled"
            )));
        }
        entry.record.name = name.to_string();
        entry.record.url = url.to_string();
        entry.record.commit_time = commit_time;

        debug!(admin = %id, name, "admin record updated");
        Ok(())
    }

    async fn set_admin_rules(&self, id: AdminId, rules: &[AssetRule]) -> Result<(), LedgerError> {
        let mut state = self.write_state()?;
        state.check_online()?;

        let entry = state.admin_mut(id)?;
        entry.rules = rules.to_vec();

        debug!(admin = %id, rules = rules.len(), "transfer-permission rules replaced");
        Ok(())
    }

    async fn cancel_admin(&self, id: AdminId) -> Result<(), LedgerError> {
        let mut state = self.write_state()?;
        state.check_online()?;

        let entry = state.admin_mut(id)?;
        if entry.record.canceled {
            return Err(LedgerError::UpdateRejected(format!(
                "admin {id} is already canceled"
            )));
        }
        entry.record.canceled = true;

        info!(admin = %id, "admin canceled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pledge_types::Address;

    fn metadata(name: &str) -> AdminMetadata {
        AdminMetadata {
            address: Address::new(format!("addr-{name}")),
            name: name.to_string(),
            url: String::new(),
            commit_time: 0,
        }
    }

    fn eth() -> AssetId {
        AssetId::new("ETH")
    }

    async fn ledger_with_admins(count: usize) -> InMemoryPledgeLedger {
        let ledger = InMemoryPledgeLedger::new();
        for i in 0..count {
            ledger
                .register_admin(AdminKind::Project, metadata(&format!("admin-{i}")))
                .await
                .unwrap();
        }
        ledger
    }

    #[tokio::test]
    async fn admin_ids_are_sequential_from_one() {
        let ledger = InMemoryPledgeLedger::new();
        let first = ledger
            .register_admin(AdminKind::Giver, metadata("giver"))
            .await
            .unwrap();
        let second = ledger
            .register_admin(AdminKind::Project, metadata("project"))
            .await
            .unwrap();

        assert_eq!(first, AdminId(1));
        assert_eq!(second, AdminId(2));
        let record = ledger.get_admin_record(second).await.unwrap();
        assert_eq!(record.kind, AdminKind::Project);
        assert!(!record.canceled);
        assert_eq!(record.plugin, Some(record.address.clone()));
    }

    #[tokio::test]
    async fn transfer_conserves_value_and_creates_destination_pledge() {
        let ledger = ledger_with_admins(3).await;
        let source = ledger.donate(AdminId(2), eth(), 5000).unwrap();

        ledger.apply_transfer(source, 1000, AdminId(3)).await.unwrap();

        assert_eq!(ledger.pledge_amount(source).unwrap(), Some(5000 - 1000));
        let destination = ledger.pledge(PledgeId(2)).unwrap().unwrap();
        assert_eq!(destination.owner, AdminId(3));
        assert_eq!(destination.amount, 1000);
        assert_eq!(ledger.total_value().unwrap(), 5000);
    }

    #[tokio::test]
    async fn overdraw_is_rejected_and_balances_untouched() {
        let ledger = ledger_with_admins(2).await;
        let source = ledger.donate(AdminId(1), eth(), 100).unwrap();

        let err = ledger
            .apply_transfer(source, 101, AdminId(2))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::from(TransferRejection::InsufficientBalance {
                pledge: source,
                requested: 101,
                available: 100,
            })
        );
        assert_eq!(ledger.pledge_amount(source).unwrap(), Some(100));
    }

    #[tokio::test]
    async fn unknown_pledge_is_rejected() {
        let ledger = ledger_with_admins(1).await;
        let err = ledger
            .apply_transfer(PledgeId(9), 1, AdminId(1))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::from(TransferRejection::UnknownPledge(PledgeId(9)))
        );
    }

    #[tokio::test]
    async fn batch_merges_into_one_destination_pledge() {
        let ledger = ledger_with_admins(3).await;
        // Occupy pledge ids 1-5 so the batch source sits at id 6.
        for admin in [1u64, 2] {
            for asset in ["A", "B"] {
                ledger
                    .donate(AdminId(admin), AssetId::new(asset), 1)
                    .unwrap();
            }
        }
        ledger.donate(AdminId(1), eth(), 1).unwrap();
        let source = ledger.donate(AdminId(2), eth(), 100).unwrap();
        assert_eq!(source, PledgeId(6));

        let entries = [
            TransferInstruction::new(10, 6),
            TransferInstruction::new(9, 6),
            TransferInstruction::new(11, 6),
            TransferInstruction::new(5, 6),
        ];
        ledger
            .apply_batch_transfer(&entries, AdminId(3))
            .await
            .unwrap();

        assert_eq!(ledger.pledge_amount(source).unwrap(), Some(100 - 35));
        let destination = ledger.pledge(PledgeId(7)).unwrap().unwrap();
        assert_eq!(destination.owner, AdminId(3));
        assert_eq!(destination.amount, 35);
    }

    #[tokio::test]
    async fn batch_with_cumulative_overdraw_changes_nothing() {
        let ledger = ledger_with_admins(2).await;
        let source = ledger.donate(AdminId(1), eth(), 30).unwrap();
        let total_before = ledger.total_value().unwrap();

        // Each entry fits individually; the combined draw does not.
        let entries = [
            TransferInstruction::new(20, source.0),
            TransferInstruction::new(20, source.0),
        ];
        let err = ledger
            .apply_batch_transfer(&entries, AdminId(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::TransferRejected(TransferRejection::InsufficientBalance { .. })
        ));

        assert_eq!(ledger.pledge_amount(source).unwrap(), Some(30));
        assert_eq!(ledger.total_value().unwrap(), total_before);
    }

    #[tokio::test]
    async fn rules_gate_donations_and_transfers() {
        let ledger = ledger_with_admins(2).await;
        ledger
            .set_admin_rules(AdminId(2), &[AssetRule::Accept(eth())])
            .await
            .unwrap();

        let err = ledger
            .donate(AdminId(2), AssetId::new("DAI"), 10)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::TransferRejected(TransferRejection::RuleViolation { .. })
        ));
        ledger.donate(AdminId(2), eth(), 10).unwrap();

        let dai_source = ledger.donate(AdminId(1), AssetId::new("DAI"), 10).unwrap();
        let err = ledger
            .apply_transfer(dai_source, 5, AdminId(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::TransferRejected(TransferRejection::RuleViolation { .. })
        ));
    }

    #[tokio::test]
    async fn canceled_admin_rejects_updates() {
        let ledger = ledger_with_admins(1).await;
        ledger.cancel_admin(AdminId(1)).await.unwrap();

        let record = ledger.get_admin_record(AdminId(1)).await.unwrap();
        assert!(record.canceled);

        let err = ledger
            .update_admin_record(AdminId(1), "n", "u", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UpdateRejected(_)));

        let err = ledger.cancel_admin(AdminId(1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::UpdateRejected(_)));
    }

    #[tokio::test]
    async fn offline_ledger_is_unavailable() {
        let ledger = ledger_with_admins(1).await;
        ledger.set_offline(true).unwrap();

        let err = ledger.get_admin_record(AdminId(1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Unavailable(_)));

        ledger.set_offline(false).unwrap();
        ledger.get_admin_record(AdminId(1)).await.unwrap();
    }
}
