use crate::application::access::AccessScope;
use crate::application::errors::VaultError;
use crate::application::ports::items_port::ItemsPort;
use crate::application::ports::notifier::{Notification, Notifier};
use crate::domain::items::item::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Non-empty group: the caller must ask before the cascading delete.
    NeedsConfirmation { children: usize },
}

pub struct DeleteItem<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub port: &'a P,
    pub notifier: &'a N,
}

impl<'a, P, N> DeleteItem<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub async fn execute(
        &self,
        scope: &AccessScope,
        item: &Item,
        confirmed: bool,
    ) -> Result<DeleteOutcome, VaultError> {
        scope.require_edit()?;
        let cascade = if item.is_group() {
            let children = match item.child_count() {
                Some(n) => n,
                None => self.port.list_children(Some(item.id), None).await?.len(),
            };
            if children > 0 && !confirmed {
                return Ok(DeleteOutcome::NeedsConfirmation { children });
            }
            children > 0
        } else {
            false
        };

        let res = if cascade {
            self.port.delete_group(item.id).await
        } else {
            self.port.delete(item.id).await
        };
        match res {
            Ok(()) => {
                tracing::info!(item_id = item.id, cascade, "item_deleted");
                self.notifier.notify(Notification::success("Item deleted"));
                Ok(DeleteOutcome::Deleted)
            }
            // Children appeared since the listing was fetched.
            Err(VaultError::GroupNotEmpty) if !confirmed => {
                Ok(DeleteOutcome::NeedsConfirmation { children: 1 })
            }
            Err(e) => {
                tracing::warn!(error = %e, item_id = item.id, "item_delete_failed");
                self.notifier
                    .notify(Notification::error(format!("Failed to delete item: {e}")));
                Err(e)
            }
        }
    }
}
