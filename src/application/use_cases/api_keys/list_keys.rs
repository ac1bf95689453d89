use crate::application::access::AccessScope;
use crate::application::errors::VaultError;
use crate::application::ports::api_keys_port::ApiKeysPort;
use crate::domain::api_keys::api_key::ApiKey;

pub struct ListApiKeys<'a, K: ApiKeysPort + ?Sized> {
    pub port: &'a K,
}

impl<'a, K: ApiKeysPort + ?Sized> ListApiKeys<'a, K> {
    pub async fn execute(&self, scope: &AccessScope) -> Result<Vec<ApiKey>, VaultError> {
        scope.require_edit()?;
        self.port.list_keys().await
    }
}
