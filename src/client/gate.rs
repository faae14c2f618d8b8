//! Admin authorization gate.
//!
//! A pure state machine over the identity bootstrap state and the outcome of
//! the caller-role query. Re-evaluated on every identity or role change; the
//! decision is never cached across them. Only `Authorized` unlocks protected
//! content, every other state maps to a blocking screen.

use crate::models::UserRole;

/// Bootstrap state of the identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityState {
    /// Identity provider still starting up.
    Initializing,
    /// Bootstrap finished without a signed-in principal.
    Anonymous,
    /// A principal is signed in.
    Authenticated,
}

/// Outcome of the caller-role query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleQuery {
    Pending,
    Failed,
    Ready(UserRole),
}

/// Gate verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Initializing,
    Unauthenticated,
    CheckingRole,
    RoleError,
    Unauthorized,
    Authorized,
}

impl GateState {
    /// Only `Authorized` ever renders protected content.
    pub fn allows_protected_content(&self) -> bool {
        matches!(self, GateState::Authorized)
    }

    /// Blocking screen text for every non-authorized state.
    pub fn blocking_notice(&self) -> Option<&'static str> {
        match self {
            GateState::Initializing | GateState::CheckingRole => Some("Loading..."),
            GateState::Unauthenticated => Some("Please log in to access the admin panel."),
            GateState::RoleError => {
                Some("Failed to verify admin access. Please try again later.")
            }
            GateState::Unauthorized => {
                Some("You do not have permission to access the admin panel.")
            }
            GateState::Authorized => None,
        }
    }
}

/// Evaluate the gate for the current identity and role-query states.
pub fn evaluate(identity: IdentityState, role: RoleQuery) -> GateState {
    match identity {
        IdentityState::Initializing => GateState::Initializing,
        IdentityState::Anonymous => GateState::Unauthenticated,
        IdentityState::Authenticated => match role {
            RoleQuery::Pending => GateState::CheckingRole,
            RoleQuery::Failed => GateState::RoleError,
            RoleQuery::Ready(UserRole::Admin) => GateState::Authorized,
            RoleQuery::Ready(_) => GateState::Unauthorized,
        },
    }
}
