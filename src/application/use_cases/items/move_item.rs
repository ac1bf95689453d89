use crate::application::errors::MoveError;
use crate::application::hierarchy::{HierarchyModel, LoadHierarchy};
use crate::application::ports::items_port::ItemsPort;
use crate::application::ports::notifier::{Notification, Notifier};
use crate::domain::items::item::ItemId;

#[derive(Debug)]
pub struct MoveCommitted {
    /// Fresh model of the displayed container; `None` if the refetch failed.
    pub refreshed: Option<HierarchyModel>,
}

/// Commits a drag result. No optimistic local change is made: the displayed
/// container is re-read from the server after the move.
pub struct MoveItem<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub port: &'a P,
    pub notifier: &'a N,
}

impl<'a, P, N> MoveItem<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub async fn execute(
        &self,
        current: &HierarchyModel,
        item: ItemId,
        target: ItemId,
    ) -> Result<MoveCommitted, MoveError> {
        match self.commit(current, item, target).await {
            Ok(done) => {
                self.notifier.notify(Notification::success("Item moved"));
                Ok(done)
            }
            Err(e) => {
                tracing::warn!(error = %e, item_id = item, target, "move_failed");
                self.notifier
                    .notify(Notification::error(format!("Failed to move item: {e}")));
                Err(e)
            }
        }
    }

    async fn commit(
        &self,
        current: &HierarchyModel,
        item: ItemId,
        target: ItemId,
    ) -> Result<MoveCommitted, MoveError> {
        let scope = current.scope();
        scope.require_edit().map_err(|_| MoveError::Forbidden)?;
        if item == target {
            return Err(MoveError::CyclicMove { item });
        }
        if let Some(listed) = current.find(target) {
            if !listed.is_group() {
                return Err(MoveError::NotAGroup { target });
            }
        }

        self.port
            .move_item(item, target)
            .await
            .map_err(|e| MoveError::from_port(e, item, target))?;
        tracing::info!(item_id = item, target, "move_committed");

        let loader = LoadHierarchy {
            port: self.port,
            scope,
        };
        // Ancestry changes only when the moved node is on the displayed path.
        let refreshed = match current.container() {
            Some(container) if current.in_ancestry(item) => loader.load(Some(container)).await,
            _ => loader.reload_children(current).await,
        };
        let refreshed = match refreshed {
            Ok(model) => Some(model),
            Err(e) => {
                tracing::warn!(error = %e, item_id = item, "move_refresh_failed");
                None
            }
        };
        Ok(MoveCommitted { refreshed })
    }
}
