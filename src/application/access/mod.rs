use crate::application::errors::VaultError;
use crate::domain::items::item::ItemId;

/// Bearer credential of an authenticated owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
}

/// Per-node share token as found in `/{item_id}?token=T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareToken {
    pub item_id: ItemId,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessCapability {
    Session,
    Token { item_id: ItemId, token: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Capability {
    None,
    View,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Full,
    Restricted,
}

/// Mode and subtree root are derived from the capability, never stored apart from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessScope {
    capability: AccessCapability,
}

// A token always wins over a session: the view it opens is read-only even for the owner.
pub fn resolve(
    session: Option<&Session>,
    token: Option<&ShareToken>,
) -> Result<AccessScope, VaultError> {
    match (session, token) {
        (_, Some(t)) => Ok(AccessScope::restricted(t.item_id, t.token.clone())),
        (Some(_), None) => Ok(AccessScope::full()),
        (None, None) => Err(VaultError::Unauthorized),
    }
}

impl AccessScope {
    pub fn full() -> Self {
        Self {
            capability: AccessCapability::Session,
        }
    }

    pub fn restricted(item_id: ItemId, token: String) -> Self {
        Self {
            capability: AccessCapability::Token { item_id, token },
        }
    }

    pub fn mode(&self) -> AccessMode {
        match self.capability {
            AccessCapability::Session => AccessMode::Full,
            AccessCapability::Token { .. } => AccessMode::Restricted,
        }
    }

    /// Subtree root for token views; `None` means the whole vault.
    pub fn root_id(&self) -> Option<ItemId> {
        match self.capability {
            AccessCapability::Session => None,
            AccessCapability::Token { item_id, .. } => Some(item_id),
        }
    }

    pub fn capability(&self) -> Capability {
        match &self.capability {
            AccessCapability::Session => Capability::Edit,
            // A blank `?token=` grants nothing.
            AccessCapability::Token { token, .. } if token.trim().is_empty() => Capability::None,
            AccessCapability::Token { .. } => Capability::View,
        }
    }

    pub fn access(&self) -> &AccessCapability {
        &self.capability
    }

    /// Token forwarded as `?token=` on read requests.
    pub fn token(&self) -> Option<&str> {
        match &self.capability {
            AccessCapability::Token { token, .. } => Some(token.as_str()),
            AccessCapability::Session => None,
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.mode() == AccessMode::Restricted
    }

    pub fn allows_drag(&self) -> bool {
        self.capability() >= Capability::Edit
    }

    pub fn require_view(&self) -> Result<Capability, VaultError> {
        let cap = self.capability();
        if cap >= Capability::View {
            Ok(cap)
        } else {
            Err(VaultError::Unauthorized)
        }
    }

    pub fn require_edit(&self) -> Result<(), VaultError> {
        if self.capability() >= Capability::Edit {
            Ok(())
        } else {
            Err(VaultError::Forbidden)
        }
    }
}
