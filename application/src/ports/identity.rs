//! Authentication collaborator port

use gameplan_domain::UserId;

/// Supplies the signed-in user.
///
/// `None` means nobody is signed in; callers treat that as a precondition
/// failure rather than something to resolve.
pub trait IdentityPort: Send + Sync {
    fn current_user(&self) -> Option<UserId>;
}

/// Identity fixed at construction (CLI flag, tests).
pub struct FixedIdentity(Option<UserId>);

impl FixedIdentity {
    pub fn signed_in(user_id: UserId) -> Self {
        Self(Some(user_id))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityPort for FixedIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.0.clone()
    }
}
