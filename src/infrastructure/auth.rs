//! Identity resolution backed by a static token table
//!
//! The production deployment sits behind the platform identity provider; for
//! local development and tests the provider is replaced by a token table
//! loaded from configuration.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::auth::{AuthContext, AuthService};
use crate::domain::DomainError;

/// Token-table identity resolution
#[derive(Debug, Default)]
pub struct StaticTokenAuthService {
    tokens: HashMap<String, AuthContext>,
}

impl StaticTokenAuthService {
    pub fn new(tokens: HashMap<String, AuthContext>) -> Self {
        Self { tokens }
    }

    pub fn with_token(mut self, token: impl Into<String>, ctx: AuthContext) -> Self {
        self.tokens.insert(token.into(), ctx);
        self
    }
}

#[async_trait]
impl AuthService for StaticTokenAuthService {
    async fn resolve(&self, token: &str) -> Result<Option<AuthContext>, DomainError> {
        Ok(self.tokens.get(token).cloned())
    }
}
