use async_trait::async_trait;

use crate::application::errors::VaultError;
use crate::domain::items::item::{Item, ItemId, ItemParent, ItemType};

/// In-memory file payload for multipart uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub mimetype: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub item_type: ItemType,
    pub parent: Option<ItemId>,
    pub text: Option<String>,
    pub logo: Option<Upload>,
    pub file: Option<Upload>,
}

/// Partial update; `None` fields are left untouched server-side.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub item_type: Option<ItemType>,
    pub parent: Option<ItemId>,
    pub text: Option<String>,
    pub logo: Option<Upload>,
    pub file: Option<Upload>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.item_type.is_none()
            && self.text.is_none()
            && self.logo.is_none()
            && self.file.is_none()
    }
}

/// Persistence collaborator. `token` is the share token of a restricted view.
#[async_trait]
pub trait ItemsPort: Send + Sync {
    async fn list_children(
        &self,
        parent: Option<ItemId>,
        token: Option<&str>,
    ) -> Result<Vec<Item>, VaultError>;

    async fn get_ancestry(&self, id: ItemId, token: Option<&str>)
    -> Result<ItemParent, VaultError>;

    /// Full item, password plaintext included.
    async fn get_one(&self, id: ItemId, token: Option<&str>) -> Result<Item, VaultError>;

    async fn create(&self, item: NewItem) -> Result<Item, VaultError>;

    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<Item, VaultError>;

    /// Fails with `GroupNotEmpty` for a group that still has children.
    async fn delete(&self, id: ItemId) -> Result<(), VaultError>;

    /// Cascading delete of a group and its subtree.
    async fn delete_group(&self, id: ItemId) -> Result<(), VaultError>;

    async fn move_item(&self, id: ItemId, new_parent: ItemId) -> Result<(), VaultError>;

    /// Rotates the share token of a node; the previous one stops working.
    async fn generate_token(&self, id: ItemId) -> Result<String, VaultError>;

    async fn load_file(&self, path: &str, token: Option<&str>) -> Result<String, VaultError>;
}
