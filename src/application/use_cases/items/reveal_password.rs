use crate::application::access::AccessScope;
use crate::application::errors::VaultError;
use crate::application::ports::items_port::ItemsPort;
use crate::application::ports::notifier::{Notification, Notifier};
use crate::domain::items::item::{ItemId, ItemKind};

/// Password text is only fetched on demand, one item at a time.
pub struct RevealPassword<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub port: &'a P,
    pub notifier: &'a N,
}

impl<'a, P, N> RevealPassword<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub async fn execute(&self, scope: &AccessScope, id: ItemId) -> Result<String, VaultError> {
        scope.require_view()?;
        let item = match self.port.get_one(id, scope.token()).await {
            Ok(item) => item,
            Err(e) => {
                self.notifier.notify(Notification::error("Failed to decode"));
                return Err(e);
            }
        };
        match item.kind {
            ItemKind::Password { text } => Ok(text),
            other => Err(VaultError::validation(format!(
                "item {id} is a {} item, not a password",
                other.item_type()
            ))),
        }
    }
}
