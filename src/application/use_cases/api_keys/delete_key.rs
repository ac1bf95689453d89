use crate::application::access::AccessScope;
use crate::application::errors::VaultError;
use crate::application::ports::api_keys_port::ApiKeysPort;
use crate::application::ports::notifier::{Notification, Notifier};

pub struct DeleteApiKey<'a, K, N>
where
    K: ApiKeysPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub port: &'a K,
    pub notifier: &'a N,
}

impl<'a, K, N> DeleteApiKey<'a, K, N>
where
    K: ApiKeysPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub async fn execute(&self, scope: &AccessScope, id: i64) -> Result<(), VaultError> {
        scope.require_edit()?;
        match self.port.delete_key(id).await {
            Ok(()) => {
                tracing::info!(key_id = id, "api_key_deleted");
                self.notifier.notify(Notification::success("Api deleted"));
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(Notification::error("Failed to delete Api"));
                Err(e)
            }
        }
    }
}
