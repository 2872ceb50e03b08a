use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Error recorded by a failed fetch. Every waiter attached to the same
/// in-flight fetch receives a clone of the same error.
#[derive(Clone)]
pub struct FetchError(Arc<anyhow::Error>);

impl FetchError {
    pub fn new(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Debug for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for FetchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("cached value for `{key}` has an unexpected shape: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache entry `{key}` was evicted before its fetch settled")]
    Evicted { key: String },

    #[error("no fetcher registered for `{key}`")]
    NoFetcher { key: String },
}

/// Point-in-time view of one cache slot.
#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    pub value: Option<T>,
    pub is_loading: bool,
    pub is_stale: bool,
    pub error: Option<FetchError>,
    pub updated_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
    pub fn empty() -> Self {
        Self {
            value: None,
            is_loading: false,
            is_stale: false,
            error: None,
            updated_at: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// True once a value is present and the last fetch did not fail.
    pub fn is_success(&self) -> bool {
        self.value.is_some() && self.error.is_none()
    }
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self::empty()
    }
}
