use crate::application::ports::session_store::SessionStore;

pub struct Logout<'a, S: SessionStore + ?Sized> {
    pub sessions: &'a S,
}

impl<'a, S: SessionStore + ?Sized> Logout<'a, S> {
    pub async fn execute(&self) -> anyhow::Result<()> {
        self.sessions.clear().await?;
        tracing::info!("logged_out");
        Ok(())
    }
}
