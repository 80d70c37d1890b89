use pledge_types::Address;

use crate::error::CampaignError;
use crate::state::GovernancePhase;

/// State-changing campaign operations subject to authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    CancelCampaign,
    ChangeReviewer,
    AcceptNewReviewer,
    Transfer,
    MTransfer,
    Update,
    SetTransferPermissions,
}

/// Decide whether `caller` may perform `op` against the current phase.
///
/// Pure function, no side effects. It must be evaluated against a fresh
/// governance record immediately before every state-changing operation,
/// since a concurrent cancellation or handoff may have landed after any
/// earlier read.
///
/// Precedence: cancellation shadows everything, then per-operation
/// identity checks.
pub fn authorize(
    op: OperationKind,
    caller: &Address,
    owner: &Address,
    phase: &GovernancePhase,
) -> Result<(), CampaignError> {
    let (reviewer, pending_reviewer) = match phase {
        GovernancePhase::Canceled { .. } => return Err(CampaignError::AlreadyCanceled),
        GovernancePhase::Active {
            reviewer,
            pending_reviewer,
        } => (reviewer, pending_reviewer.as_ref()),
    };

    match op {
        OperationKind::CancelCampaign => {
            if caller == reviewer || caller == owner {
                Ok(())
            } else {
                Err(CampaignError::NotAuthorized)
            }
        }
        OperationKind::ChangeReviewer => {
            // The owner may not nominate; only the sitting reviewer can.
            if caller == reviewer {
                Ok(())
            } else {
                Err(CampaignError::NotAuthorized)
            }
        }
        OperationKind::AcceptNewReviewer => match pending_reviewer {
            None => Err(CampaignError::NoPendingHandoff),
            Some(pending) if caller == pending => Ok(()),
            Some(_) => Err(CampaignError::NotAuthorized),
        },
        OperationKind::Transfer
        | OperationKind::MTransfer
        | OperationKind::Update
        | OperationKind::SetTransferPermissions => {
            if caller == owner {
                Ok(())
            } else {
                Err(CampaignError::NotAuthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::new("owner")
    }

    fn reviewer() -> Address {
        Address::new("reviewer")
    }

    fn active(pending: Option<&str>) -> GovernancePhase {
        GovernancePhase::Active {
            reviewer: reviewer(),
            pending_reviewer: pending.map(Address::new),
        }
    }

    #[test]
    fn cancellation_shadows_every_operation() {
        let phase = GovernancePhase::Canceled {
            reviewer: reviewer(),
        };
        for op in [
            OperationKind::CancelCampaign,
            OperationKind::ChangeReviewer,
            OperationKind::AcceptNewReviewer,
            OperationKind::Transfer,
            OperationKind::MTransfer,
            OperationKind::Update,
            OperationKind::SetTransferPermissions,
        ] {
            assert_eq!(
                authorize(op, &owner(), &owner(), &phase),
                Err(CampaignError::AlreadyCanceled)
            );
        }
    }

    #[test]
    fn cancel_is_open_to_reviewer_and_owner_only() {
        let phase = active(None);
        assert!(authorize(OperationKind::CancelCampaign, &reviewer(), &owner(), &phase).is_ok());
        assert!(authorize(OperationKind::CancelCampaign, &owner(), &owner(), &phase).is_ok());
        assert_eq!(
            authorize(
                OperationKind::CancelCampaign,
                &Address::new("stranger"),
                &owner(),
                &phase
            ),
            Err(CampaignError::NotAuthorized)
        );
    }

    #[test]
    fn owner_may_not_nominate_a_reviewer() {
        let phase = active(None);
        assert!(authorize(OperationKind::ChangeReviewer, &reviewer(), &owner(), &phase).is_ok());
        assert_eq!(
            authorize(OperationKind::ChangeReviewer, &owner(), &owner(), &phase),
            Err(CampaignError::NotAuthorized)
        );
    }

    #[test]
    fn acceptance_requires_the_nominee() {
        let no_handoff = active(None);
        assert_eq!(
            authorize(
                OperationKind::AcceptNewReviewer,
                &Address::new("r2"),
                &owner(),
                &no_handoff
            ),
            Err(CampaignError::NoPendingHandoff)
        );

        let pending = active(Some("r2"));
        assert!(authorize(
            OperationKind::AcceptNewReviewer,
            &Address::new("r2"),
            &owner(),
            &pending
        )
        .is_ok());
        assert_eq!(
            authorize(OperationKind::AcceptNewReviewer, &reviewer(), &owner(), &pending),
            Err(CampaignError::NotAuthorized)
        );
    }

    #[test]
    fn funds_operations_are_owner_only() {
        let phase = active(None);
        for op in [
            OperationKind::Transfer,
            OperationKind::MTransfer,
            OperationKind::Update,
            OperationKind::SetTransferPermissions,
        ] {
            assert!(authorize(op, &owner(), &owner(), &phase).is_ok());
            assert_eq!(
                authorize(op, &reviewer(), &owner(), &phase),
                Err(CampaignError::NotAuthorized)
            );
        }
    }
}
