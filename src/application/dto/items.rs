use crate::application::ports::items_port::Upload;
use crate::domain::items::item::{ItemId, ItemType};

/// Create/edit form contents as submitted by the user.
#[derive(Debug, Clone)]
pub struct ItemDraft {
    pub name: String,
    pub item_type: ItemType,
    pub text: Option<String>,
    pub logo: Option<Upload>,
    pub file: Option<Upload>,
}

impl ItemDraft {
    pub fn new(name: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            name: name.into(),
            item_type,
            text: None,
            logo: None,
            file: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_file(mut self, file: Upload) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_logo(mut self, logo: Upload) -> Self {
        self.logo = Some(logo);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub item_id: ItemId,
    pub token: String,
    pub url: String,
}

impl ShareLink {
    pub fn new(public_base: &str, item_id: ItemId, token: String) -> Self {
        let url = format!(
            "{}/{}?token={}",
            public_base.trim_end_matches('/'),
            item_id,
            urlencoding::encode(&token)
        );
        Self {
            item_id,
            token,
            url,
        }
    }
}
