mod file_store;
mod memory_store;

use std::path::PathBuf;

use tracing::info;

use crate::model::user::Role;
use file_store::FileCredentialStore;
use memory_store::MemoryCredentialStore;

pub const TOKEN_KEY: &str = "token";
pub const ROLE_KEY: &str = "role";

#[derive(Clone, Debug)]
enum CredentialBackend {
    Memory(MemoryCredentialStore),
    File(FileCredentialStore),
}

/// Process-local key-value store holding the bearer token and the signed-in
/// role. Populated by `login`, emptied by `logout`.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    backend: CredentialBackend,
}

impl CredentialStore {
    pub fn in_memory() -> Self {
        Self {
            backend: CredentialBackend::Memory(MemoryCredentialStore::default()),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: CredentialBackend::File(FileCredentialStore::new(path)),
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, CredentialBackend::File(_))
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        match &self.backend {
            CredentialBackend::Memory(store) => store.get(key),
            CredentialBackend::File(store) => store.get(key),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        match &self.backend {
            CredentialBackend::Memory(store) => store.set(key, value),
            CredentialBackend::File(store) => store.set(key, value),
        }
    }

    pub fn remove(&self, key: &str) -> anyhow::Result<()> {
        match &self.backend {
            CredentialBackend::Memory(store) => store.remove(key),
            CredentialBackend::File(store) => store.remove(key),
        }
    }

    /// Bearer token, if one is stored. Blank tokens count as absent.
    pub fn token(&self) -> anyhow::Result<Option<String>> {
        Ok(self
            .get(TOKEN_KEY)?
            .map(|token| token.trim().to_owned())
            .filter(|token| !token.is_empty()))
    }

    pub fn role(&self) -> anyhow::Result<Option<Role>> {
        Ok(self.get(ROLE_KEY)?.as_deref().map(Role::parse))
    }

    pub fn login(&self, token: &str, role: Role) -> anyhow::Result<()> {
        self.set(TOKEN_KEY, token.trim())?;
        self.set(ROLE_KEY, role.as_str())?;
        info!(role = role.as_str(), "credentials stored");
        Ok(())
    }

    pub fn logout(&self) -> anyhow::Result<()> {
        self.remove(TOKEN_KEY)?;
        self.remove(ROLE_KEY)?;
        info!("credentials cleared");
        Ok(())
    }
}
