//! Shared fakes for command and controller tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use tutor_api::{ActivityApi, ApiError, ProfilePictureUpload, StatusCode, UserApi};
use tutor_core::Data;
use tutor_store::model::activity::{Activity, FinalScore};
use tutor_store::model::user::{Role, User};
use tutor_store::{CredentialStore, EntityCache};

#[derive(Default)]
pub(crate) struct FakeApi {
    pub users: Vec<User>,
    pub activities: Vec<Activity>,
    pub fail_upload: bool,
    /// Number of upcoming single-user fetches that fail with a server error.
    pub failing_user_fetches: AtomicUsize,
    pub uploaded: AtomicBool,
    pub user_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub activity_calls: AtomicUsize,
    pub scores: Mutex<Vec<FinalScore>>,
}

impl FakeApi {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }
}

#[async_trait]
impl UserApi for FakeApi {
    async fn fetch_user_by_id(&self, id: &str) -> Result<User, ApiError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        let failing = self
            .failing_user_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(ApiError::Server {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: String::new(),
            });
        }
        let mut user = self
            .users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("user `{id}`"),
            })?;
        if self.uploaded.load(Ordering::SeqCst) {
            user.profile_url = Some("/fresh.png".to_owned());
        }
        Ok(user)
    }

    async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(self.users.clone())
    }

    async fn update_profile_picture(
        &self,
        upload: ProfilePictureUpload,
    ) -> Result<User, ApiError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        if self.fail_upload {
            return Err(ApiError::Server {
                status: StatusCode::BAD_GATEWAY,
                body: String::new(),
            });
        }
        self.uploaded.store(true, Ordering::SeqCst);
        let mut user = self
            .users
            .iter()
            .find(|user| user.id == upload.user_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("user `{}`", upload.user_id),
            })?;
        user.profile_url = Some("/fresh.png".to_owned());
        Ok(user)
    }
}

#[async_trait]
impl ActivityApi for FakeApi {
    async fn fetch_activities(&self) -> Result<Vec<Activity>, ApiError> {
        self.activity_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.activities.clone())
    }

    async fn fetch_activity_by_id(&self, id: &str) -> Result<Activity, ApiError> {
        self.activity_calls.fetch_add(1, Ordering::SeqCst);
        self.activities
            .iter()
            .find(|activity| activity.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("activity `{id}`"),
            })
    }

    async fn update_activity(&self, id: &str, data: Value) -> Result<Activity, ApiError> {
        let mut activity = self
            .activities
            .iter()
            .find(|activity| activity.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("activity `{id}`"),
            })?;
        if let Value::Object(fields) = data {
            activity.fields.extend(fields);
        }
        Ok(activity)
    }

    async fn send_final_score(&self, score: FinalScore) -> Result<Value, ApiError> {
        self.scores.lock().unwrap().push(score);
        Ok(json!({ "ok": true }))
    }
}

pub(crate) fn user(id: &str, role: &str, points: u64) -> User {
    serde_json::from_value(json!({
        "id": id,
        "role": role,
        "firstName": id,
        "gender": "Male",
        "expPoints": points
    }))
    .unwrap()
}

pub(crate) fn scenario_users() -> Vec<User> {
    vec![
        user("u1", "Student", 50),
        user("u2", "Student", 80),
        user("u3", "Student", 50),
        user("t1", "Teacher", 0),
    ]
}

pub(crate) fn activity(id: &str, title: &str) -> Activity {
    serde_json::from_value(json!({ "id": id, "title": title })).unwrap()
}

pub(crate) fn data(api: &Arc<FakeApi>, viewer: Option<Role>) -> Data {
    let credentials = CredentialStore::in_memory();
    if let Some(role) = viewer {
        credentials.login("token", role).unwrap();
    }
    Data {
        users: api.clone(),
        activities: api.clone(),
        cache: EntityCache::new(),
        credentials,
        api_url: "http://api".to_owned(),
    }
}
