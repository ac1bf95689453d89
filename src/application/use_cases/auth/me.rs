use crate::application::errors::VaultError;
use crate::application::ports::auth_port::{AuthPort, UserProfile};

pub struct GetMe<'a, A: AuthPort + ?Sized> {
    pub auth: &'a A,
}

impl<'a, A: AuthPort + ?Sized> GetMe<'a, A> {
    pub async fn execute(&self) -> Result<UserProfile, VaultError> {
        self.auth.me().await
    }
}
