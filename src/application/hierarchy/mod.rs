use crate::application::access::AccessScope;
use crate::application::errors::VaultError;
use crate::application::ports::items_port::ItemsPort;
use crate::domain::items::item::{Ancestor, Item, ItemId, ItemParent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Home,
    Node(ItemId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreadcrumbEntry {
    pub target: NavTarget,
    pub label: String,
    pub clickable: bool,
}

/// Snapshot of one displayed container. Never patched in place: every
/// navigation or successful mutation builds a new one from the server.
#[derive(Debug, Clone)]
pub struct HierarchyModel {
    scope: AccessScope,
    container: Option<ItemId>,
    items: Vec<Item>,
    ancestry: Option<ItemParent>,
}

impl HierarchyModel {
    pub fn new(
        scope: AccessScope,
        container: Option<ItemId>,
        items: Vec<Item>,
        ancestry: Option<ItemParent>,
    ) -> Self {
        Self {
            scope,
            container,
            items,
            ancestry,
        }
    }

    pub fn scope(&self) -> &AccessScope {
        &self.scope
    }

    pub fn container(&self) -> Option<ItemId> {
        self.container
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn ancestry(&self) -> Option<&ItemParent> {
        self.ancestry.as_ref()
    }

    pub fn find(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.find(id).is_some()
    }

    /// True if `id` is the container itself or one of its ancestors.
    pub fn in_ancestry(&self, id: ItemId) -> bool {
        self.ancestry.as_ref().is_some_and(|a| a.contains(id))
    }

    /// Visible root-to-container chain; token views start at the token root.
    fn visible_chain(&self) -> Vec<Ancestor> {
        let chain = self
            .ancestry
            .as_ref()
            .map(ItemParent::chain)
            .unwrap_or_default();
        match self.scope.root_id() {
            None => chain,
            Some(root) => match chain.iter().position(|a| a.id == root) {
                Some(pos) => chain[pos..].to_vec(),
                // Token root not reported: only the current node is shown.
                None => chain.last().cloned().into_iter().collect(),
            },
        }
    }

    pub fn breadcrumb(&self) -> Vec<BreadcrumbEntry> {
        let mut entries = Vec::new();
        if !self.scope.is_restricted() {
            entries.push(BreadcrumbEntry {
                target: NavTarget::Home,
                label: "Home".to_string(),
                clickable: true,
            });
        }
        entries.extend(self.visible_chain().into_iter().map(|a| BreadcrumbEntry {
            target: NavTarget::Node(a.id),
            label: a.name,
            clickable: true,
        }));
        if let Some(last) = entries.last_mut() {
            last.clickable = false;
        }
        entries
    }

    /// Where the "back" button leads. `None` at the top of a token view.
    pub fn up_target(&self) -> Option<NavTarget> {
        let crumbs = self.breadcrumb();
        if crumbs.len() > 1 {
            return Some(crumbs[crumbs.len() - 2].target);
        }
        if self.scope.is_restricted() {
            None
        } else {
            Some(NavTarget::Home)
        }
    }

    /// Breadcrumb entries that accept a dropped item.
    pub fn drop_ancestors(&self) -> Vec<ItemId> {
        self.breadcrumb()
            .into_iter()
            .filter(|e| e.clickable)
            .filter_map(|e| match e.target {
                NavTarget::Node(id) => Some(id),
                NavTarget::Home => None,
            })
            .collect()
    }
}

pub struct LoadHierarchy<'a, P: ItemsPort + ?Sized> {
    pub port: &'a P,
    pub scope: &'a AccessScope,
}

impl<'a, P: ItemsPort + ?Sized> LoadHierarchy<'a, P> {
    pub async fn fetch_children(&self, node: Option<ItemId>) -> Result<Vec<Item>, VaultError> {
        if self.scope.is_restricted() && node.is_none() {
            return Err(VaultError::Unauthorized);
        }
        self.port.list_children(node, self.scope.token()).await
    }

    pub async fn fetch_ancestry(&self, node: ItemId) -> Result<ItemParent, VaultError> {
        self.port.get_ancestry(node, self.scope.token()).await
    }

    pub async fn load(&self, node: Option<ItemId>) -> Result<HierarchyModel, VaultError> {
        self.scope.require_view()?;
        let items = self.fetch_children(node).await?;
        let ancestry = match node {
            Some(id) => Some(self.fetch_ancestry(id).await?),
            None => None,
        };
        tracing::debug!(container = ?node, items = items.len(), "hierarchy_loaded");
        Ok(HierarchyModel::new(self.scope.clone(), node, items, ancestry))
    }

    /// Children refetch that keeps the already known ancestry.
    pub async fn reload_children(
        &self,
        current: &HierarchyModel,
    ) -> Result<HierarchyModel, VaultError> {
        let items = self.fetch_children(current.container).await?;
        Ok(HierarchyModel::new(
            self.scope.clone(),
            current.container,
            items,
            current.ancestry.clone(),
        ))
    }
}
