use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rand::distributions::{Alphanumeric, DistString};
use tokio::sync::RwLock;

use crate::application::errors::VaultError;
use crate::application::ports::api_keys_port::ApiKeysPort;
use crate::application::ports::auth_port::{AuthPort, UserProfile};
use crate::application::ports::items_port::{ItemPatch, ItemsPort, NewItem, Upload};
use crate::domain::api_keys::api_key::ApiKey;
use crate::domain::items::item::{
    Ancestor, FileRef, Item, ItemId, ItemKind, ItemParent, ItemType, ParentRef,
};

const TOKEN_LEN: usize = 32;

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<ItemId>,
    kind: ItemKind,
    logo: Option<Vec<FileRef>>,
    token: Option<String>,
}

#[derive(Default)]
struct State {
    last_id: ItemId,
    nodes: BTreeMap<ItemId, Node>,
    files: HashMap<String, Vec<u8>>,
    last_patch: Option<ItemPatch>,
    keys: Vec<ApiKey>,
}

/// Process-local vault with the same rules as the remote API: subtree-scoped
/// share tokens, cycle-free moves and non-cascading plain deletes.
#[derive(Default)]
pub struct InMemoryVault {
    state: RwLock<State>,
    moves: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_group(&self, name: &str, parent: Option<ItemId>) -> ItemId {
        self.seed(name, parent, ItemKind::Group).await
    }

    pub async fn seed_link(&self, name: &str, url: &str, parent: Option<ItemId>) -> ItemId {
        let kind = ItemKind::Link { text: url.into() };
        self.seed(name, parent, kind).await
    }

    pub async fn seed_copy(&self, name: &str, text: &str, parent: Option<ItemId>) -> ItemId {
        let kind = ItemKind::Copy { text: text.into() };
        self.seed(name, parent, kind).await
    }

    pub async fn seed_password(&self, name: &str, text: &str, parent: Option<ItemId>) -> ItemId {
        let kind = ItemKind::Password { text: text.into() };
        self.seed(name, parent, kind).await
    }

    /// Viewable text file; `contents` is served back by `load_file`.
    pub async fn seed_view(
        &self,
        name: &str,
        filename: &str,
        contents: &str,
        parent: Option<ItemId>,
    ) -> ItemId {
        let mut st = self.state.write().await;
        let id = next_id(&mut st);
        let file = store_upload(
            &mut st,
            id,
            Upload {
                filename: filename.into(),
                mimetype: mime_guess::from_path(filename)
                    .first_or_text_plain()
                    .to_string(),
                bytes: contents.as_bytes().to_vec(),
            },
        );
        st.nodes.insert(
            id,
            Node {
                name: name.into(),
                parent,
                kind: ItemKind::View { file: vec![file] },
                logo: None,
                token: None,
            },
        );
        id
    }

    /// Rotates the share token of `id` and returns the new one.
    pub async fn issue_token(&self, id: ItemId) -> String {
        let token = Alphanumeric.sample_string(&mut rand::thread_rng(), TOKEN_LEN);
        if let Some(node) = self.state.write().await.nodes.get_mut(&id) {
            node.token = Some(token.clone());
        }
        token
    }

    pub async fn item(&self, id: ItemId) -> Option<Item> {
        to_item(&*self.state.read().await, id, true)
    }

    pub async fn parent_of(&self, id: ItemId) -> Option<ItemId> {
        self.state.read().await.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Drops a node and its subtree behind the back of any open view.
    pub async fn remove(&self, id: ItemId) {
        let mut st = self.state.write().await;
        remove_subtree(&mut st, id);
    }

    pub fn move_calls(&self) -> usize {
        self.moves.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub async fn last_patch(&self) -> Option<ItemPatch> {
        self.state.read().await.last_patch.clone()
    }

    async fn seed(&self, name: &str, parent: Option<ItemId>, kind: ItemKind) -> ItemId {
        let mut st = self.state.write().await;
        let id = next_id(&mut st);
        st.nodes.insert(
            id,
            Node {
                name: name.into(),
                parent,
                kind,
                logo: None,
                token: None,
            },
        );
        id
    }
}

fn next_id(st: &mut State) -> ItemId {
    st.last_id += 1;
    st.last_id
}

fn node<'a>(st: &'a State, id: ItemId) -> Result<&'a Node, VaultError> {
    st.nodes.get(&id).ok_or(VaultError::NotFound)
}

/// Root-first list of ancestors of `id`, excluding `id` itself.
fn ancestors(st: &State, id: ItemId) -> Vec<ItemId> {
    let mut out = Vec::new();
    let mut cursor = st.nodes.get(&id).and_then(|n| n.parent);
    while let Some(p) = cursor {
        if out.contains(&p) {
            break;
        }
        out.push(p);
        cursor = st.nodes.get(&p).and_then(|n| n.parent);
    }
    out.reverse();
    out
}

// Owner access has no token. A share token is valid for the node that holds it
// and for everything below that node.
fn authorize(st: &State, id: Option<ItemId>, token: Option<&str>) -> Result<(), VaultError> {
    let Some(token) = token else {
        return Ok(());
    };
    let id = id.ok_or(VaultError::Unauthorized)?;
    node(st, id)?;
    let holds = |n: ItemId| {
        st.nodes
            .get(&n)
            .and_then(|x| x.token.as_deref())
            .is_some_and(|t| t == token)
    };
    if holds(id) || ancestors(st, id).into_iter().any(holds) {
        Ok(())
    } else {
        Err(VaultError::Unauthorized)
    }
}

fn children_of(st: &State, parent: Option<ItemId>) -> Vec<ItemId> {
    st.nodes
        .iter()
        .filter(|(_, n)| n.parent == parent)
        .map(|(id, _)| *id)
        .collect()
}

fn to_item(st: &State, id: ItemId, with_children: bool) -> Option<Item> {
    let n = st.nodes.get(&id)?;
    let children = (with_children && matches!(n.kind, ItemKind::Group)).then(|| {
        children_of(st, Some(id))
            .into_iter()
            .filter_map(|c| to_item(st, c, false))
            .collect()
    });
    Some(Item {
        id,
        name: n.name.clone(),
        logo: n.logo.clone(),
        parent: n.parent.map(|p| ParentRef {
            id: p,
            name: st.nodes.get(&p).map(|x| x.name.clone()),
        }),
        children,
        token: n.token.clone(),
        kind: n.kind.clone(),
    })
}

fn remove_subtree(st: &mut State, id: ItemId) {
    for child in children_of(st, Some(id)) {
        remove_subtree(st, child);
    }
    if let Some(n) = st.nodes.remove(&id) {
        for f in files_of(&n) {
            st.files.remove(&f.path);
        }
    }
}

fn files_of(n: &Node) -> Vec<FileRef> {
    let mut out = n.logo.clone().unwrap_or_default();
    if let ItemKind::View { file } | ItemKind::File { file } = &n.kind {
        out.extend(file.iter().cloned());
    }
    out
}

fn store_upload(st: &mut State, id: ItemId, upload: Upload) -> FileRef {
    let path = format!("uploads/{id}-{}", upload.filename);
    let file = FileRef {
        path: path.clone(),
        size: upload.bytes.len() as u64,
        encoding: "7bit".into(),
        filename: format!("{id}-{}", upload.filename),
        mimetype: upload.mimetype,
        originalname: upload.filename,
    };
    st.files.insert(path, upload.bytes);
    file
}

fn primary_file(kind: &ItemKind) -> Option<FileRef> {
    match kind {
        ItemKind::View { file } | ItemKind::File { file } => file.first().cloned(),
        _ => None,
    }
}

fn text_of(kind: &ItemKind) -> Option<&str> {
    match kind {
        ItemKind::Link { text } | ItemKind::Copy { text } | ItemKind::Password { text } => {
            Some(text)
        }
        ItemKind::View { .. } | ItemKind::File { .. } | ItemKind::Group => None,
    }
}

fn build_kind(
    item_type: ItemType,
    text: Option<String>,
    file: Option<FileRef>,
) -> Result<ItemKind, VaultError> {
    let text = text.unwrap_or_default();
    let files = move || {
        file.map(|f| vec![f])
            .ok_or_else(|| VaultError::validation("file is required"))
    };
    Ok(match item_type {
        ItemType::Group => ItemKind::Group,
        ItemType::Link => ItemKind::Link { text },
        ItemType::Copy => ItemKind::Copy { text },
        ItemType::Password => ItemKind::Password { text },
        ItemType::View => ItemKind::View { file: files()? },
        ItemType::File => ItemKind::File { file: files()? },
    })
}

fn check_container(st: &State, parent: Option<ItemId>) -> Result<(), VaultError> {
    match parent {
        None => Ok(()),
        Some(p) if matches!(node(st, p)?.kind, ItemKind::Group) => Ok(()),
        Some(_) => Err(VaultError::NotAGroup),
    }
}

fn relocate(st: &mut State, id: ItemId, target: ItemId) -> Result<(), VaultError> {
    node(st, id)?;
    node(st, target)?;
    if id == target || ancestors(st, target).contains(&id) {
        return Err(VaultError::CyclicMove);
    }
    check_container(st, Some(target))?;
    if let Some(n) = st.nodes.get_mut(&id) {
        n.parent = Some(target);
    }
    Ok(())
}

#[async_trait]
impl ItemsPort for InMemoryVault {
    async fn list_children(
        &self,
        parent: Option<ItemId>,
        token: Option<&str>,
    ) -> Result<Vec<Item>, VaultError> {
        let st = self.state.read().await;
        authorize(&st, parent, token)?;
        check_container(&st, parent)?;
        Ok(children_of(&st, parent)
            .into_iter()
            .filter_map(|id| to_item(&st, id, true))
            .collect())
    }

    async fn get_ancestry(
        &self,
        id: ItemId,
        token: Option<&str>,
    ) -> Result<ItemParent, VaultError> {
        let st = self.state.read().await;
        authorize(&st, Some(id), token)?;
        let n = node(&st, id)?;
        let parents = ancestors(&st, id)
            .into_iter()
            .filter_map(|a| {
                st.nodes.get(&a).map(|x| Ancestor {
                    id: a,
                    name: x.name.clone(),
                })
            })
            .collect();
        Ok(ItemParent {
            id,
            name: n.name.clone(),
            parents,
        })
    }

    async fn get_one(&self, id: ItemId, token: Option<&str>) -> Result<Item, VaultError> {
        let st = self.state.read().await;
        authorize(&st, Some(id), token)?;
        to_item(&st, id, true).ok_or(VaultError::NotFound)
    }

    async fn create(&self, item: NewItem) -> Result<Item, VaultError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let mut st = self.state.write().await;
        check_container(&st, item.parent)?;
        let id = next_id(&mut st);
        let file = item
            .file
            .filter(|u| !u.is_empty())
            .map(|u| store_upload(&mut st, id, u));
        let logo = item
            .logo
            .filter(|u| !u.is_empty())
            .map(|u| vec![store_upload(&mut st, id, u)]);
        let kind = build_kind(item.item_type, item.text, file)?;
        st.nodes.insert(
            id,
            Node {
                name: item.name,
                parent: item.parent,
                kind,
                logo,
                token: None,
            },
        );
        to_item(&st, id, true).ok_or(VaultError::NotFound)
    }

    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<Item, VaultError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut st = self.state.write().await;
        st.last_patch = Some(patch.clone());
        let current = node(&st, id)?.clone();

        if let Some(parent) = patch.parent {
            relocate(&mut st, id, parent)?;
        }
        let item_type = patch.item_type.unwrap_or(current.kind.item_type());
        let text = patch
            .text
            .or_else(|| text_of(&current.kind).map(str::to_string));
        let file = match patch.file.filter(|u| !u.is_empty()) {
            Some(upload) => Some(store_upload(&mut st, id, upload)),
            None => primary_file(&current.kind),
        };
        let kind = build_kind(item_type, text, file)?;
        let logo = match patch.logo.filter(|u| !u.is_empty()) {
            Some(upload) => Some(vec![store_upload(&mut st, id, upload)]),
            None => current.logo,
        };
        if let Some(n) = st.nodes.get_mut(&id) {
            if let Some(name) = patch.name {
                n.name = name;
            }
            n.kind = kind;
            n.logo = logo;
        }
        to_item(&st, id, true).ok_or(VaultError::NotFound)
    }

    async fn delete(&self, id: ItemId) -> Result<(), VaultError> {
        let mut st = self.state.write().await;
        node(&st, id)?;
        if !children_of(&st, Some(id)).is_empty() {
            return Err(VaultError::GroupNotEmpty);
        }
        remove_subtree(&mut st, id);
        Ok(())
    }

    async fn delete_group(&self, id: ItemId) -> Result<(), VaultError> {
        let mut st = self.state.write().await;
        if !matches!(node(&st, id)?.kind, ItemKind::Group) {
            return Err(VaultError::NotAGroup);
        }
        remove_subtree(&mut st, id);
        Ok(())
    }

    async fn move_item(&self, id: ItemId, new_parent: ItemId) -> Result<(), VaultError> {
        self.moves.fetch_add(1, Ordering::SeqCst);
        let mut st = self.state.write().await;
        relocate(&mut st, id, new_parent)
    }

    async fn generate_token(&self, id: ItemId) -> Result<String, VaultError> {
        node(&*self.state.read().await, id)?;
        Ok(self.issue_token(id).await)
    }

    async fn load_file(&self, path: &str, token: Option<&str>) -> Result<String, VaultError> {
        let st = self.state.read().await;
        if token.is_some() {
            let owner = st
                .nodes
                .iter()
                .find(|(_, n)| files_of(n).iter().any(|f| f.path == path))
                .map(|(id, _)| *id);
            authorize(&st, owner, token)?;
        }
        let bytes = st.files.get(path).ok_or(VaultError::NotFound)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Single-owner stand-in: any non-empty credentials log in.
#[async_trait]
impl AuthPort for InMemoryVault {
    async fn login(&self, email: &str, password: &str) -> Result<String, VaultError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(VaultError::Unauthorized);
        }
        Ok(Alphanumeric.sample_string(&mut rand::thread_rng(), TOKEN_LEN))
    }

    async fn me(&self) -> Result<UserProfile, VaultError> {
        Ok(UserProfile {
            id: Some(1),
            email: Some("owner@localhost".into()),
            name: Some("Owner".into()),
        })
    }
}

#[async_trait]
impl ApiKeysPort for InMemoryVault {
    async fn list_keys(&self) -> Result<Vec<ApiKey>, VaultError> {
        Ok(self
            .state
            .read()
            .await
            .keys
            .iter()
            .map(|k| ApiKey {
                token: None,
                ..k.clone()
            })
            .collect())
    }

    async fn create_key(&self, name: &str, description: &str) -> Result<ApiKey, VaultError> {
        let mut st = self.state.write().await;
        let id = st.keys.iter().map(|k| k.id).max().unwrap_or(0) + 1;
        let key = ApiKey {
            id,
            name: name.into(),
            description: description.into(),
            token: Some(Alphanumeric.sample_string(&mut rand::thread_rng(), TOKEN_LEN)),
        };
        st.keys.push(key.clone());
        Ok(key)
    }

    async fn delete_key(&self, id: i64) -> Result<(), VaultError> {
        let mut st = self.state.write().await;
        let before = st.keys.len();
        st.keys.retain(|k| k.id != id);
        if st.keys.len() == before {
            return Err(VaultError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ancestry_runs_from_root_down() {
        let vault = InMemoryVault::new();
        let a = vault.seed_group("A", None).await;
        let b = vault.seed_group("B", Some(a)).await;
        let c = vault.seed_group("C", Some(b)).await;
        let anc = vault.get_ancestry(c, None).await.unwrap();
        let ids: Vec<ItemId> = anc.parents.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(anc.name, "C");
    }

    #[tokio::test]
    async fn plain_delete_refuses_non_empty_group() {
        let vault = InMemoryVault::new();
        let a = vault.seed_group("A", None).await;
        vault.seed_link("L", "https://l", Some(a)).await;
        assert!(matches!(
            vault.delete(a).await,
            Err(VaultError::GroupNotEmpty)
        ));
        vault.delete_group(a).await.unwrap();
        assert!(vault.list_children(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn move_rules() {
        let vault = InMemoryVault::new();
        let a = vault.seed_group("A", None).await;
        let b = vault.seed_group("B", Some(a)).await;
        let leaf = vault.seed_copy("C", "x", None).await;
        assert!(matches!(vault.move_item(a, b).await, Err(VaultError::CyclicMove)));
        assert!(matches!(vault.move_item(a, a).await, Err(VaultError::CyclicMove)));
        assert!(matches!(vault.move_item(b, leaf).await, Err(VaultError::NotAGroup)));
        assert!(matches!(vault.move_item(b, 999).await, Err(VaultError::NotFound)));
        vault.move_item(leaf, b).await.unwrap();
        assert_eq!(vault.parent_of(leaf).await, Some(b));
        assert_eq!(vault.move_calls(), 5);
    }

    #[tokio::test]
    async fn file_contents_follow_the_token_scope() {
        let vault = InMemoryVault::new();
        let shared = vault.seed_group("Shared", None).await;
        let private = vault.seed_group("Private", None).await;
        let inside = vault.seed_view("Notes", "notes.md", "# hi", Some(shared)).await;
        let outside = vault.seed_view("Diary", "diary.md", "secret", Some(private)).await;
        let token = vault.issue_token(shared).await;

        let path = |item: Item| item.primary_file().map(|f| f.path.clone()).unwrap();
        let inside_path = path(vault.item(inside).await.unwrap());
        let outside_path = path(vault.item(outside).await.unwrap());
        assert_eq!(
            vault.load_file(&inside_path, Some(&token)).await.unwrap(),
            "# hi"
        );
        assert!(matches!(
            vault.load_file(&outside_path, Some(&token)).await,
            Err(VaultError::Unauthorized)
        ));
        assert_eq!(vault.load_file(&outside_path, None).await.unwrap(), "secret");
    }

    #[tokio::test]
    async fn api_key_token_is_shown_once() {
        let vault = InMemoryVault::new();
        let key = vault.create_key("ci", "deploys").await.unwrap();
        assert!(key.token.is_some());
        let listed = vault.list_keys().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].token.is_none());
        vault.delete_key(key.id).await.unwrap();
        assert!(matches!(
            vault.delete_key(key.id).await,
            Err(VaultError::NotFound)
        ));
    }

    #[tokio::test]
    async fn update_switches_type_and_keeps_text() {
        let vault = InMemoryVault::new();
        let id = vault.seed_link("Docs", "https://example.com", None).await;
        let updated = vault
            .update(
                id,
                ItemPatch {
                    item_type: Some(ItemType::Copy),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(updated.kind, ItemKind::Copy { ref text } if text == "https://example.com"));
    }
}
