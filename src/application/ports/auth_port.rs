use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::errors::VaultError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Exchanges credentials for a bearer access token.
    async fn login(&self, email: &str, password: &str) -> Result<String, VaultError>;
    async fn me(&self) -> Result<UserProfile, VaultError>;
}
