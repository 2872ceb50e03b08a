pub mod complete;
pub mod edit;
pub mod list;
pub mod show;

use std::sync::Arc;

use tutor_api::ActivityApi;
use tutor_store::Fetcher;

pub fn activities_fetcher(api: Arc<dyn ActivityApi>) -> Fetcher {
    Fetcher::new(move || {
        let api = Arc::clone(&api);
        async move { api.fetch_activities().await.map_err(anyhow::Error::from) }
    })
}

pub fn activity_fetcher(api: Arc<dyn ActivityApi>, activity_id: String) -> Fetcher {
    Fetcher::new(move || {
        let api = Arc::clone(&api);
        let activity_id = activity_id.clone();
        async move {
            api.fetch_activity_by_id(&activity_id)
                .await
                .map_err(anyhow::Error::from)
        }
    })
}
