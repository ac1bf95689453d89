use crate::domain::items::item::ItemId;

#[derive(thiserror::Error, Debug)]
pub enum VaultError {
    /// Missing, invalid or expired session or share token.
    #[error("unauthorized")]
    Unauthorized,
    /// Mutation attempted from a token-scoped view.
    #[error("forbidden")]
    Forbidden,
    #[error("cannot move an item into itself or one of its descendants")]
    CyclicMove,
    #[error("target is not a group")]
    NotAGroup,
    #[error("not found")]
    NotFound,
    #[error("group is not empty")]
    GroupNotEmpty,
    #[error("too many requests")]
    RateLimited,
    #[error("{0}")]
    Validation(String),
    #[error("network failure")]
    Network(#[source] anyhow::Error),
    #[error("failed to persist session")]
    SessionStorage(#[source] anyhow::Error),
}

impl VaultError {
    pub fn validation(msg: impl Into<String>) -> Self {
        VaultError::Validation(msg.into())
    }

    /// Expired or missing credentials should send the user back to login.
    pub fn requires_login(&self) -> bool {
        matches!(self, VaultError::Unauthorized)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MoveError {
    #[error("cannot move item {item} into itself or one of its descendants")]
    CyclicMove { item: ItemId },
    #[error("move target {target} is not a group")]
    NotAGroup { target: ItemId },
    #[error("unauthorized")]
    Unauthorized,
    #[error("moves are not allowed from a shared view")]
    Forbidden,
    #[error("item or target no longer exists")]
    NotFound,
    #[error("failed to commit move")]
    Failed(#[source] VaultError),
}

impl MoveError {
    pub fn from_port(err: VaultError, item: ItemId, target: ItemId) -> Self {
        match err {
            VaultError::CyclicMove => MoveError::CyclicMove { item },
            VaultError::NotAGroup => MoveError::NotAGroup { target },
            VaultError::Unauthorized => MoveError::Unauthorized,
            VaultError::Forbidden => MoveError::Forbidden,
            VaultError::NotFound => MoveError::NotFound,
            other => MoveError::Failed(other),
        }
    }
}
