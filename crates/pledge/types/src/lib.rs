//! Pledge Types - shared identifiers and ledger records
#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Identity of a caller or a registered admin within the ledger's
/// administrative hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);
impl Address {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}
impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger-assigned administrator identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdminId(pub u64);
impl std::fmt::Display for AdminId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger-assigned pledge identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PledgeId(pub u64);
impl std::fmt::Display for PledgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token/asset kind held by a pledge.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);
impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}
impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference naming one ledger instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerRef(pub String);
impl std::fmt::Display for LedgerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a registered pledge admin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminKind {
    Giver,
    Delegate,
    Project,
}

/// Registration payload for a new pledge admin.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminMetadata {
    pub address: Address,
    pub name: String,
    pub url: String,
    /// Seconds a transfer into this admin stays revocable.
    pub commit_time: u64,
}

/// Read model of a registered admin, as resolved from the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord {
    pub kind: AdminKind,
    pub address: Address,
    pub name: String,
    pub url: String,
    pub commit_time: u64,
    pub canceled: bool,
    pub plugin: Option<Address>,
}

/// One predicate in an admin's transfer-permission rule set.
///
/// Rules are evaluated in order; the first rule naming an asset decides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetRule {
    Accept(AssetId),
    Reject(AssetId),
}

/// Evaluate an ordered rule set against an asset kind.
///
/// When no rule names the asset, the set is open unless it contains at
/// least one `Accept`: an allowlist is closed, a blocklist is open, and
/// the empty set accepts everything.
pub fn rules_permit(rules: &[AssetRule], asset: &AssetId) -> bool {
    let mut has_allowlist = false;
    for rule in rules {
        match rule {
            AssetRule::Accept(allowed) => {
                if allowed == asset {
                    return true;
                }
                has_allowlist = true;
            }
            AssetRule::Reject(denied) => {
                if denied == asset {
                    return false;
                }
            }
        }
    }
    !has_allowlist
}
