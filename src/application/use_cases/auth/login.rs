use crate::application::access::Session;
use crate::application::errors::VaultError;
use crate::application::ports::auth_port::AuthPort;
use crate::application::ports::notifier::{Notification, Notifier};
use crate::application::ports::session_store::SessionStore;

pub struct Login<'a, A, S, N>
where
    A: AuthPort + ?Sized,
    S: SessionStore + ?Sized,
    N: Notifier + ?Sized,
{
    pub auth: &'a A,
    pub sessions: &'a S,
    pub notifier: &'a N,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl<'a, A, S, N> Login<'a, A, S, N>
where
    A: AuthPort + ?Sized,
    S: SessionStore + ?Sized,
    N: Notifier + ?Sized,
{
    pub async fn execute(&self, req: &LoginRequest) -> Result<Session, VaultError> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(VaultError::validation("Email and password are required"));
        }
        let access_token = match self.auth.login(req.email.trim(), &req.password).await {
            Ok(t) => t,
            Err(e) => {
                let msg = match e {
                    VaultError::RateLimited => "Too many requests",
                    _ => "Login failed",
                };
                self.notifier.notify(Notification::error(msg));
                return Err(e);
            }
        };
        let session = Session { access_token };
        self.sessions
            .save(&session)
            .await
            .map_err(VaultError::SessionStorage)?;
        tracing::info!("login_succeeded");
        self.notifier.notify(Notification::success("Login successful"));
        Ok(session)
    }
}
