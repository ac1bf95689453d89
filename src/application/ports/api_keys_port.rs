use async_trait::async_trait;

use crate::application::errors::VaultError;
use crate::domain::api_keys::api_key::ApiKey;

#[async_trait]
pub trait ApiKeysPort: Send + Sync {
    async fn list_keys(&self) -> Result<Vec<ApiKey>, VaultError>;
    async fn create_key(&self, name: &str, description: &str) -> Result<ApiKey, VaultError>;
    async fn delete_key(&self, id: i64) -> Result<(), VaultError>;
}
