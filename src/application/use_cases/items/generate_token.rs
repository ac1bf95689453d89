use crate::application::access::AccessScope;
use crate::application::dto::items::ShareLink;
use crate::application::errors::VaultError;
use crate::application::ports::items_port::ItemsPort;
use crate::application::ports::notifier::{Notification, Notifier};
use crate::domain::items::item::ItemId;

/// Creates or rotates the share token of a node.
pub struct GenerateToken<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub port: &'a P,
    pub notifier: &'a N,
    pub public_base: &'a str,
}

impl<'a, P, N> GenerateToken<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub async fn execute(&self, scope: &AccessScope, id: ItemId) -> Result<ShareLink, VaultError> {
        scope.require_edit()?;
        match self.port.generate_token(id).await {
            Ok(token) => {
                tracing::info!(item_id = id, "share_token_rotated");
                self.notifier.notify(Notification::success("Share link refreshed"));
                Ok(ShareLink::new(self.public_base, id, token))
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::error(format!("Failed to refresh link: {e}")));
                Err(e)
            }
        }
    }
}
