//! Authenticated caller identity
//!
//! Identity resolution is delegated to an external provider; this module only
//! defines the resolved value handed to every service call. Handlers receive
//! an `AuthContext` as an explicit parameter, never from ambient state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Role of an authenticated user within the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Member,
    Admin,
}

/// Resolved caller identity for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Identity-provider user id
    pub user_id: String,

    /// Organization the caller is acting in, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,

    /// Platform role
    #[serde(default)]
    pub role: UserRole,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            organization_id: None,
            role: UserRole::Member,
        }
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether this caller may read or mutate a workflow owned by `owner_id`
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

/// Boundary to the external identity provider
///
/// Resolves an opaque bearer token to a caller identity. `Ok(None)` means the
/// token is unknown and the request is unauthenticated.
#[async_trait]
pub trait AuthService: Send + Sync + std::fmt::Debug {
    async fn resolve(&self, token: &str) -> Result<Option<AuthContext>, DomainError>;
}
