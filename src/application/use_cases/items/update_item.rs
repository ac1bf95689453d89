use crate::application::access::AccessScope;
use crate::application::dto::items::ItemDraft;
use crate::application::errors::VaultError;
use crate::application::ports::items_port::{ItemPatch, ItemsPort};
use crate::application::ports::notifier::{Notification, Notifier};
use crate::application::use_cases::items::create_item::validate_draft;
use crate::domain::items::item::{Item, ItemKind};

pub struct UpdateItem<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    pub port: &'a P,
    pub notifier: &'a N,
}

impl<'a, P, N> UpdateItem<'a, P, N>
where
    P: ItemsPort + ?Sized,
    N: Notifier + ?Sized,
{
    /// Sends only what differs from `original`. Returns `Ok(None)` without a
    /// request when nothing changed.
    pub async fn execute(
        &self,
        scope: &AccessScope,
        original: &Item,
        draft: ItemDraft,
    ) -> Result<Option<Item>, VaultError> {
        scope.require_edit()?;
        // A type switch to view/file needs a new file; otherwise the stored one stays.
        let file_required = draft.item_type.carries_file()
            && (draft.file.is_some() || original.item_type() != draft.item_type);
        if let Err(e) = validate_draft(&draft, file_required) {
            self.notifier.notify(Notification::error(e.to_string()));
            return Err(e);
        }

        let patch = diff(original, draft);
        if patch.is_empty() {
            tracing::debug!(item_id = original.id, "item_update_skipped_no_changes");
            return Ok(None);
        }

        match self.port.update(original.id, patch).await {
            Ok(item) => {
                tracing::info!(item_id = item.id, "item_updated");
                self.notifier.notify(Notification::success("Item updated"));
                Ok(Some(item))
            }
            Err(e) => {
                tracing::warn!(error = %e, item_id = original.id, "item_update_failed");
                self.notifier
                    .notify(Notification::error(format!("Failed to update item: {e}")));
                Err(e)
            }
        }
    }
}

fn diff(original: &Item, draft: ItemDraft) -> ItemPatch {
    let current_text = match &original.kind {
        ItemKind::Link { text } | ItemKind::Copy { text } | ItemKind::Password { text } => {
            Some(text.as_str())
        }
        ItemKind::View { .. } | ItemKind::File { .. } | ItemKind::Group => None,
    };
    let name = draft.name.trim();
    ItemPatch {
        name: (name != original.name).then(|| name.to_string()),
        item_type: (draft.item_type != original.item_type()).then_some(draft.item_type),
        parent: original.parent_id(),
        text: draft
            .text
            .filter(|t| draft.item_type.carries_text() && Some(t.as_str()) != current_text),
        logo: draft.logo.filter(|l| !l.is_empty()),
        file: draft.file,
    }
}
