//! Authorization collaborator and the capabilities derived from a role.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{NudgeError, NudgeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    SuperAdmin,
    Invites,
}

/// What a principal may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Save and delete rules.
    pub may_write: bool,
    /// Manage admin invites. Not used by rule editing.
    pub may_manage_invites: bool,
}

impl Capabilities {
    pub fn for_role(role: Option<Role>) -> Self {
        match role {
            Some(Role::SuperAdmin) => Self {
                may_write: true,
                may_manage_invites: true,
            },
            Some(Role::Admin) => Self {
                may_write: true,
                may_manage_invites: false,
            },
            Some(Role::Invites) => Self {
                may_write: false,
                may_manage_invites: true,
            },
            None => Self::default(),
        }
    }
}

/// An authenticated user and their resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Option<Role>,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_role(self.role)
    }

    /// Fail with `AuthorizationDenied` unless this principal may write rules.
    pub fn require_write(&self, action: &str) -> NudgeResult<()> {
        if self.capabilities().may_write {
            return Ok(());
        }
        Err(NudgeError::authorization(
            format!("user '{}' may not {}", self.user_id, action),
            self.role.map(|r| r.to_string()),
        ))
    }
}

/// Resolves the role of an authenticated user.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    async fn resolve(&self, user_id: &str) -> NudgeResult<Option<Role>>;

    /// Principal for `user_id` with its resolved role.
    async fn principal(&self, user_id: &str) -> NudgeResult<Principal> {
        let role = self.resolve(user_id).await?;
        Ok(Principal::new(user_id, role))
    }
}

/// Fixed user to role table.
#[derive(Debug, Clone, Default)]
pub struct StaticRoleResolver {
    roles: HashMap<String, Role>,
}

impl StaticRoleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, user_id: impl Into<String>, role: Role) -> Self {
        self.roles.insert(user_id.into(), role);
        self
    }
}

#[async_trait]
impl RoleResolver for StaticRoleResolver {
    async fn resolve(&self, user_id: &str) -> NudgeResult<Option<Role>> {
        Ok(self.roles.get(user_id).copied())
    }
}
