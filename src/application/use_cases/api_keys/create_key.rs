use crate::application::access::AccessScope;
use crate::application::errors::VaultError;
use crate::application::ports::api_keys_port::ApiKeysPort;
use crate::application::ports::notifier::{Notification, Notifier};
use crate::domain::api_keys::api_key::ApiKey;

pub struct CreateApiKey<'a, K, N>
where
    K: ApiKeysPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub port: &'a K,
    pub notifier: &'a N,
}

impl<'a, K, N> CreateApiKey<'a, K, N>
where
    K: ApiKeysPort + ?Sized,
    N: Notifier + ?Sized,
{
    /// The returned key carries its token; it is not retrievable later.
    pub async fn execute(
        &self,
        scope: &AccessScope,
        name: &str,
        description: &str,
    ) -> Result<ApiKey, VaultError> {
        scope.require_edit()?;
        if name.trim().is_empty() {
            return Err(VaultError::validation("Please enter a name"));
        }
        match self.port.create_key(name.trim(), description.trim()).await {
            Ok(key) => {
                tracing::info!(key_id = key.id, "api_key_created");
                self.notifier.notify(Notification::success("Api created"));
                Ok(key)
            }
            Err(e) => {
                self.notifier.notify(Notification::error("Failed to create Api"));
                Err(e)
            }
        }
    }
}
