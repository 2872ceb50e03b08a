use std::sync::Arc;

use tutor_api::{ActivityApi, HttpAccessor, UserApi};
use tutor_store::{CredentialStore, EntityCache};

pub type Error = anyhow::Error;

/// Shared handles passed to every command and view.
#[derive(Clone)]
pub struct Data {
    pub users: Arc<dyn UserApi>,
    pub activities: Arc<dyn ActivityApi>,
    pub cache: EntityCache,
    pub credentials: CredentialStore,
    /// Base URL that stored profile image paths are resolved against.
    pub api_url: String,
}

impl Data {
    pub fn from_accessor(
        accessor: HttpAccessor,
        cache: EntityCache,
        credentials: CredentialStore,
    ) -> Self {
        let api_url = accessor.base_url().to_owned();
        let accessor = Arc::new(accessor);
        Self {
            users: accessor.clone(),
            activities: accessor,
            cache,
            credentials,
            api_url,
        }
    }
}
