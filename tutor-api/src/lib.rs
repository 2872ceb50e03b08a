pub mod client;
pub mod error;
pub mod upload;

use async_trait::async_trait;
use serde_json::Value;
use tutor_store::model::activity::{Activity, FinalScore};
use tutor_store::model::user::User;

pub use client::HttpAccessor;
pub use error::ApiError;
pub use reqwest::StatusCode;
pub use upload::{ImageFile, ProfilePictureUpload};

/// User endpoints consumed by the profile view.
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn fetch_user_by_id(&self, id: &str) -> Result<User, ApiError>;

    async fn fetch_users(&self) -> Result<Vec<User>, ApiError>;

    async fn update_profile_picture(&self, upload: ProfilePictureUpload)
    -> Result<User, ApiError>;
}

#[async_trait]
pub trait ActivityApi: Send + Sync {
    async fn fetch_activities(&self) -> Result<Vec<Activity>, ApiError>;

    async fn fetch_activity_by_id(&self, id: &str) -> Result<Activity, ApiError>;

    async fn update_activity(&self, id: &str, data: Value) -> Result<Activity, ApiError>;

    async fn send_final_score(&self, score: FinalScore) -> Result<Value, ApiError>;
}
