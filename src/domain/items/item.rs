use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type ItemId = i64;

/// Stored file descriptor. Opaque to the client; `path` is fetched as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileRef {
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub encoding: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub mimetype: String,
    #[serde(default)]
    pub originalname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Link {
        #[serde(default)]
        text: String,
    },
    Copy {
        #[serde(default)]
        text: String,
    },
    /// Listings may carry an empty or opaque `text`; the plaintext comes from `items/one`.
    Password {
        #[serde(default)]
        text: String,
    },
    View {
        file: Vec<FileRef>,
    },
    File {
        file: Vec<FileRef>,
    },
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Vec<FileRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Item>>,
    /// Current share token, only reported to the owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Group,
    Link,
    Copy,
    View,
    File,
    Password,
}

impl ItemType {
    /// Creation order offered to the user; groups first.
    pub const ALL: [ItemType; 6] = [
        ItemType::Group,
        ItemType::Link,
        ItemType::Copy,
        ItemType::View,
        ItemType::File,
        ItemType::Password,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Group => "group",
            ItemType::Link => "link",
            ItemType::Copy => "copy",
            ItemType::View => "view",
            ItemType::File => "file",
            ItemType::Password => "password",
        }
    }

    pub fn carries_text(self) -> bool {
        matches!(self, ItemType::Link | ItemType::Copy | ItemType::Password)
    }

    pub fn carries_file(self) -> bool {
        matches!(self, ItemType::View | ItemType::File)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown item type '{s}'"))
    }
}

/// What a plain click on a card does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemAction {
    OpenLink(String),
    CopyText(String),
    RevealPassword(ItemId),
    ViewFile(FileRef),
    DownloadFile(FileRef),
    OpenGroup(ItemId),
    /// File-backed item whose descriptor list is empty.
    Unavailable(ItemId),
}

impl ItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Link { .. } => ItemType::Link,
            ItemKind::Copy { .. } => ItemType::Copy,
            ItemKind::Password { .. } => ItemType::Password,
            ItemKind::View { .. } => ItemType::View,
            ItemKind::File { .. } => ItemType::File,
            ItemKind::Group => ItemType::Group,
        }
    }
}

impl Item {
    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ItemKind::Group)
    }

    pub fn parent_id(&self) -> Option<ItemId> {
        self.parent.as_ref().map(|p| p.id)
    }

    /// Only the first descriptor is used for file-backed items.
    pub fn primary_file(&self) -> Option<&FileRef> {
        match &self.kind {
            ItemKind::View { file } | ItemKind::File { file } => file.first(),
            ItemKind::Link { .. }
            | ItemKind::Copy { .. }
            | ItemKind::Password { .. }
            | ItemKind::Group => None,
        }
    }

    /// Children count as reported by the listing; `None` when the server omitted it.
    pub fn child_count(&self) -> Option<usize> {
        self.children.as_ref().map(Vec::len)
    }

    pub fn primary_action(&self) -> ItemAction {
        match &self.kind {
            ItemKind::Link { text } => ItemAction::OpenLink(text.clone()),
            ItemKind::Copy { text } => ItemAction::CopyText(text.clone()),
            ItemKind::Password { .. } => ItemAction::RevealPassword(self.id),
            ItemKind::View { file } => match file.first() {
                Some(f) => ItemAction::ViewFile(f.clone()),
                None => ItemAction::Unavailable(self.id),
            },
            ItemKind::File { file } => match file.first() {
                Some(f) => ItemAction::DownloadFile(f.clone()),
                None => ItemAction::Unavailable(self.id),
            },
            ItemKind::Group => ItemAction::OpenGroup(self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ancestor {
    pub id: ItemId,
    pub name: String,
}

/// Ancestry of a node, `parents` ordered from the root down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemParent {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub parents: Vec<Ancestor>,
}

impl ItemParent {
    /// Root-to-node chain, the node itself included exactly once.
    pub fn chain(&self) -> Vec<Ancestor> {
        let mut chain = self.parents.clone();
        if chain.last().map(|a| a.id) != Some(self.id) {
            chain.push(Ancestor {
                id: self.id,
                name: self.name.clone(),
            });
        }
        chain
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.id == id || self.parents.iter().any(|a| a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_items() {
        let raw = r#"[
            {"id":7,"name":"Docs","type":"link","text":"https://example.com"},
            {"id":3,"name":"Work","type":"group","children":[]},
            {"id":4,"name":"Notes","type":"view","file":[{"path":"uploads/a.txt","size":3,"encoding":"7bit","filename":"a","mimetype":"text/plain","originalname":"a.txt","fieldname":"file"}]},
            {"id":5,"name":"Mail","type":"password"}
        ]"#;
        let items: Vec<Item> = serde_json::from_str(raw).unwrap();
        assert_eq!(items[0].item_type(), ItemType::Link);
        assert!(items[1].is_group());
        assert_eq!(items[1].child_count(), Some(0));
        assert_eq!(items[2].primary_file().unwrap().originalname, "a.txt");
        assert_eq!(
            items[3].kind,
            ItemKind::Password {
                text: String::new()
            }
        );
    }

    #[test]
    fn primary_action_per_variant() {
        let group: Item =
            serde_json::from_str(r#"{"id":3,"name":"Work","type":"group"}"#).unwrap();
        assert_eq!(group.primary_action(), ItemAction::OpenGroup(3));

        let pwd: Item =
            serde_json::from_str(r#"{"id":9,"name":"Bank","type":"password","text":"x"}"#)
                .unwrap();
        assert_eq!(pwd.primary_action(), ItemAction::RevealPassword(9));

        let empty_file: Item =
            serde_json::from_str(r#"{"id":2,"name":"Dump","type":"file","file":[]}"#).unwrap();
        assert_eq!(empty_file.primary_action(), ItemAction::Unavailable(2));
    }

    #[test]
    fn ancestry_chain_appends_node_once() {
        let parent = ItemParent {
            id: 12,
            name: "Leaf".into(),
            parents: vec![Ancestor {
                id: 1,
                name: "Top".into(),
            }],
        };
        let ids: Vec<ItemId> = parent.chain().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 12]);

        let already = ItemParent {
            id: 12,
            name: "Leaf".into(),
            parents: parent.chain(),
        };
        assert_eq!(already.chain().len(), 2);
    }

    #[test]
    fn item_type_parses_case_insensitively() {
        assert_eq!("Group".parse::<ItemType>().unwrap(), ItemType::Group);
        assert!("folder".parse::<ItemType>().is_err());
    }
}
