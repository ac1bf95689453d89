use crate::application::access::AccessScope;
use crate::application::errors::VaultError;
use crate::application::ports::items_port::ItemsPort;
use crate::domain::items::item::FileRef;

pub struct LoadFile<'a, P: ItemsPort + ?Sized> {
    pub port: &'a P,
}

impl<'a, P: ItemsPort + ?Sized> LoadFile<'a, P> {
    pub async fn execute(&self, scope: &AccessScope, file: &FileRef) -> Result<String, VaultError> {
        scope.require_view()?;
        if file.path.trim().is_empty() {
            return Err(VaultError::NotFound);
        }
        self.port.load_file(&file.path, scope.token()).await
    }
}
