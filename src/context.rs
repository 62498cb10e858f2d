//! Request-scoped caller identity and role membership.
//!
//! Every public operation receives an explicit [`RequestContext`] instead of
//! reading ambient user state. Elevated execution ("run this as admin") is an
//! explicit context value produced by [`RequestContext::elevated_to`], not a
//! thread-local push/pop.

use std::collections::HashSet;

use crate::error::{Result, TaskError};

/// Roles recognized by the lifecycle core. Role membership is established by
/// the surrounding authorization layer and carried in the request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular interactive user.
    User,
    /// May act on any task regardless of per-workbasket permissions.
    TaskAdmin,
    /// Full administrative access, including delete and terminate.
    Admin,
}

/// Identity and role set of the acting caller for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    user_id: Option<String>,
    access_ids: Vec<String>,
    roles: HashSet<Role>,
}

impl RequestContext {
    /// Context for a regular user. The user id is also the first access id.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            access_ids: vec![user_id.clone()],
            user_id: Some(user_id),
            roles: HashSet::from([Role::User]),
        }
    }

    /// Anonymous context, only useful when security is disabled.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    /// Additional group/access ids the caller acts under (beyond the user id).
    pub fn with_access_id(mut self, access_id: impl Into<String>) -> Self {
        self.access_ids.push(access_id.into());
        self
    }

    /// A copy of this context elevated to the given role, for internal
    /// operations that must bypass per-workbasket permissions.
    pub fn elevated_to(&self, role: Role) -> Self {
        let mut ctx = self.clone();
        ctx.roles.insert(role);
        ctx
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn access_ids(&self) -> &[String] {
        &self.access_ids
    }

    pub fn is_in_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// True if the caller holds any of the given roles.
    pub fn is_in_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }

    /// Errors with [`TaskError::NotAuthorized`] unless the caller holds one
    /// of the given roles.
    pub fn check_role_membership(&self, roles: &[Role]) -> Result<()> {
        if self.is_in_any_role(roles) {
            Ok(())
        } else {
            Err(TaskError::NotAuthorized {
                user_id: self.user_id.clone(),
                reason: format!("requires one of the roles {roles:?}"),
            })
        }
    }

    /// True if the given owner value matches one of the caller's access ids.
    pub fn owns(&self, owner: Option<&str>) -> bool {
        match owner {
            Some(owner) => self.access_ids.iter().any(|id| id == owner),
            None => false,
        }
    }
}
