use crate::application::access::AccessScope;
use crate::application::dto::items::ItemDraft;
use crate::application::errors::VaultError;
use crate::application::ports::items_port::{ItemsPort, NewItem};
use crate::application::ports::notifier::{Notification, Notifier};
use crate::domain::items::item::{Item, ItemId};

pub struct CreateItem<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub port: &'a P,
    pub notifier: &'a N,
}

impl<'a, P, N> CreateItem<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub async fn execute(
        &self,
        scope: &AccessScope,
        parent: Option<ItemId>,
        draft: ItemDraft,
    ) -> Result<Item, VaultError> {
        scope.require_edit()?;
        if let Err(e) = validate_draft(&draft, true) {
            self.notifier.notify(Notification::error(e.to_string()));
            return Err(e);
        }
        let new_item = NewItem {
            name: draft.name.trim().to_string(),
            item_type: draft.item_type,
            parent,
            text: draft.text,
            logo: draft.logo,
            file: draft.file,
        };
        match self.port.create(new_item).await {
            Ok(item) => {
                tracing::info!(item_id = item.id, item_type = %item.item_type(), "item_created");
                self.notifier.notify(Notification::success("Item created"));
                Ok(item)
            }
            Err(e) => {
                tracing::warn!(error = %e, "item_create_failed");
                self.notifier
                    .notify(Notification::error(format!("Failed to create item: {e}")));
                Err(e)
            }
        }
    }
}

/// Client-side checks run before any request. `file_required` is false for
/// edits that keep the stored file.
pub(crate) fn validate_draft(draft: &ItemDraft, file_required: bool) -> Result<(), VaultError> {
    if draft.name.trim().is_empty() {
        return Err(VaultError::validation("Please enter a name"));
    }
    let ty = draft.item_type;
    if ty.carries_text() && draft.text.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(VaultError::validation(format!("A {ty} item needs a text value")));
    }
    if ty.carries_file() && file_required && draft.file.as_ref().is_none_or(|f| f.is_empty()) {
        return Err(VaultError::validation("Please select a file"));
    }
    Ok(())
}
