pub mod cache;
pub mod credentials;
pub mod model;

pub use cache::{CacheEntry, CacheError, EntityCache, Fetcher, QueryKey, Subscription};
pub use credentials::CredentialStore;
