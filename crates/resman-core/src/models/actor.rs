//! Acting identities.
//!
//! Every workflow operation receives the acting user explicitly; nothing
//! is read from ambient session state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    /// Regular staff who create and submit requests.
    Employee,
    /// The privileged role that approves or rejects requests (the CGO).
    Approver,
    /// Administrators; may override the status of finalized requests.
    SystemManager,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Employee, Role::Approver, Role::SystemManager];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub user: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user: impl Into<String>, role: Role) -> Self {
        Self {
            user: user.into(),
            role,
        }
    }

    pub fn is_approver(&self) -> bool {
        self.role == Role::Approver
    }
}
