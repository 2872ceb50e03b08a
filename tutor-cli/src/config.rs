use std::path::PathBuf;
use std::time::Duration;

use tutor_store::{CredentialStore, EntityCache};
use tutor_utils::env::{env_bool, env_string, env_u64};

pub const DEFAULT_CREDENTIALS_PATH: &str = ".tutor/credentials.json";

/// Settings read from the environment (and `.env`) at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub credentials_path: PathBuf,
    pub persist_credentials: bool,
    pub cache_stale_after: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            credentials_path: PathBuf::from(env_string(
                "TUTOR_CREDENTIALS_PATH",
                DEFAULT_CREDENTIALS_PATH,
            )),
            persist_credentials: env_bool("TUTOR_CREDENTIALS_PERSIST", true),
            cache_stale_after: Duration::from_secs(env_u64("TUTOR_CACHE_STALE_SECS", 0)),
        }
    }

    pub fn credential_store(&self) -> CredentialStore {
        if self.persist_credentials {
            CredentialStore::file(&self.credentials_path)
        } else {
            CredentialStore::in_memory()
        }
    }

    pub fn entity_cache(&self) -> EntityCache {
        EntityCache::with_stale_after(self.cache_stale_after)
    }
}
