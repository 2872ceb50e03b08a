use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use anyhow::Context as _;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tutor_api::{ApiError, ImageFile, ProfilePictureUpload, UserApi};
use tutor_core::Data;
use tutor_store::model::user::{Role, User};
use tutor_store::{CacheEntry, CacheError, EntityCache, Fetcher, QueryKey, Subscription};

use crate::profile::avatar::Avatar;
use crate::profile::leaderboard::{Standing, standing_of};
use crate::profile::upload::{
    Notification, Preview, UPLOAD_FAILED, UPLOAD_SUCCEEDED, UploadHandle, UploadState,
    UploadStatus,
};

pub type Notifications = mpsc::UnboundedReceiver<Notification>;

#[derive(Clone, Debug, PartialEq)]
pub enum ProfilePhase {
    /// No user id was given; nothing is fetched.
    Empty,
    Loading,
    NotFound,
    Failed(String),
    Ready(User),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaderboardState {
    /// The profile has not loaded yet, so the user list is not requested.
    Disabled,
    Loading,
    Ready(Standing),
    Failed(String),
}

pub fn user_fetcher(api: Arc<dyn UserApi>, user_id: String) -> Fetcher {
    Fetcher::new(move || {
        let api = Arc::clone(&api);
        let user_id = user_id.clone();
        async move { api.fetch_user_by_id(&user_id).await.map_err(anyhow::Error::from) }
    })
}

pub fn users_fetcher(api: Arc<dyn UserApi>) -> Fetcher {
    Fetcher::new(move || {
        let api = Arc::clone(&api);
        async move { api.fetch_users().await.map_err(anyhow::Error::from) }
    })
}

/// Drives one mounted profile view: the profile read, the dependent
/// leaderboard read, and the picture upload mutation.
///
/// Dropping the controller unmounts the view. Fetches and uploads already in
/// flight still finish and update the shared cache, but never touch this
/// view's upload state.
pub struct ProfileController {
    data: Data,
    user_id: Option<String>,
    viewer_role: Option<Role>,
    profile: Option<Subscription>,
    leaderboard: Option<Subscription>,
    upload: Arc<Mutex<UploadState>>,
    notify: mpsc::UnboundedSender<Notification>,
}

impl ProfileController {
    pub fn mount(data: Data, user_id: Option<&str>) -> anyhow::Result<(Self, Notifications)> {
        let viewer_role = data
            .credentials
            .role()
            .context("failed to read viewer role")?;
        let user_id = user_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_owned);
        let (notify, notifications) = mpsc::unbounded_channel();

        Ok((
            Self {
                data,
                user_id,
                viewer_role,
                profile: None,
                leaderboard: None,
                upload: Arc::default(),
                notify,
            },
            notifications,
        ))
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn viewer_role(&self) -> Option<Role> {
        self.viewer_role
    }

    /// Points, rank and progress are only shown to signed-in students.
    pub fn shows_student_sections(&self) -> bool {
        self.viewer_role == Some(Role::Student)
    }

    fn cache(&self) -> &EntityCache {
        &self.data.cache
    }

    /// Resolve the profile through the cache. Returns `None` without
    /// fetching when no user id was given.
    pub async fn load_profile(&mut self) -> Result<Option<User>, CacheError> {
        let Some(user_id) = self.user_id.clone() else {
            debug!("no user id; profile fetch skipped");
            return Ok(None);
        };

        let key = QueryKey::user(&user_id);
        let fetcher = user_fetcher(Arc::clone(&self.data.users), user_id);
        if self.profile.is_none() {
            self.profile = Some(self.cache().subscribe(&key, fetcher.clone()));
        }

        self.cache().fetch::<User>(&key, fetcher).await.map(Some)
    }

    pub fn profile(&self) -> Result<CacheEntry<User>, CacheError> {
        match &self.user_id {
            Some(user_id) => self.cache().peek(&QueryKey::user(user_id)),
            None => Ok(CacheEntry::empty()),
        }
    }

    pub fn phase(&self) -> ProfilePhase {
        if self.user_id.is_none() {
            return ProfilePhase::Empty;
        }

        let entry = match self.profile() {
            Ok(entry) => entry,
            Err(e) => return ProfilePhase::Failed(e.to_string()),
        };

        match (entry.value, entry.error) {
            (Some(user), _) => ProfilePhase::Ready(user),
            (None, Some(error)) => {
                let not_found = error
                    .downcast_ref::<ApiError>()
                    .is_some_and(ApiError::is_not_found);
                if not_found {
                    ProfilePhase::NotFound
                } else {
                    ProfilePhase::Failed(error.to_string())
                }
            }
            (None, None) => ProfilePhase::Loading,
        }
    }

    fn loaded_user(&self) -> Option<User> {
        self.profile().ok().and_then(|entry| entry.value)
    }

    /// Rank the profile among all students. Returns `None` without fetching
    /// until the profile itself has loaded.
    pub async fn load_leaderboard(&mut self) -> Result<Option<Standing>, CacheError> {
        let Some(user) = self.loaded_user() else {
            debug!("profile not loaded; leaderboard fetch skipped");
            return Ok(None);
        };

        let key = QueryKey::leaderboard();
        let fetcher = users_fetcher(Arc::clone(&self.data.users));
        if self.leaderboard.is_none() {
            self.leaderboard = Some(self.cache().subscribe(&key, fetcher.clone()));
        }

        let users = self.cache().fetch::<Vec<User>>(&key, fetcher).await?;
        Ok(Some(standing_of(&users, &user.id)))
    }

    pub fn leaderboard(&self) -> LeaderboardState {
        let Some(user) = self.loaded_user() else {
            return LeaderboardState::Disabled;
        };

        match self.cache().peek::<Vec<User>>(&QueryKey::leaderboard()) {
            Ok(CacheEntry {
                value: Some(users), ..
            }) => LeaderboardState::Ready(standing_of(&users, &user.id)),
            Ok(CacheEntry {
                error: Some(error), ..
            }) => LeaderboardState::Failed(error.to_string()),
            Ok(_) => LeaderboardState::Loading,
            Err(e) => LeaderboardState::Failed(e.to_string()),
        }
    }

    /// Show `file` locally right away and submit exactly one upload for it.
    pub fn select_image(&mut self, file: ImageFile) -> Option<UploadHandle> {
        let Some(user_id) = self.user_id.clone() else {
            warn!("image selected without a user id; ignoring");
            return None;
        };

        let action = {
            let mut state = self.upload_state();
            if let Some(previous) = state.preview.replace(Preview::create(&file)) {
                previous.revoke();
            }
            state.status = UploadStatus::Pending;
            state.action += 1;
            state.action
        };

        let job = UploadJob {
            api: Arc::clone(&self.data.users),
            cache: self.data.cache.clone(),
            state: Arc::downgrade(&self.upload),
            notify: self.notify.clone(),
            user_id,
            action,
        };
        Some(UploadHandle::new(tokio::spawn(job.run(file))))
    }

    pub fn upload_status(&self) -> UploadStatus {
        self.upload_state().status().clone()
    }

    pub fn preview(&self) -> Option<Preview> {
        self.upload_state().preview().cloned()
    }

    pub fn avatar(&self) -> Option<Avatar> {
        let user = self.loaded_user()?;
        let state = self.upload_state();
        Some(Avatar::resolve(&user, state.preview(), &self.data.api_url))
    }

    /// Manual retry of the profile fetch.
    pub fn refresh(&self) -> bool {
        match &self.user_id {
            Some(user_id) => self.cache().refetch(&QueryKey::user(user_id)),
            None => false,
        }
    }

    pub fn unmount(self) {
        debug!(user_id = ?self.user_id, "profile view unmounted");
    }

    fn upload_state(&self) -> MutexGuard<'_, UploadState> {
        self.upload.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct UploadJob {
    api: Arc<dyn UserApi>,
    cache: EntityCache,
    state: Weak<Mutex<UploadState>>,
    notify: mpsc::UnboundedSender<Notification>,
    user_id: String,
    action: u64,
}

impl UploadJob {
    async fn run(self, file: ImageFile) -> UploadStatus {
        let upload = ProfilePictureUpload {
            user_id: self.user_id.clone(),
            file,
        };

        if let Err(e) = self.api.update_profile_picture(upload).await {
            warn!(
                ?e,
                user_id = %self.user_id,
                local = e.is_local(),
                "profile picture upload failed"
            );
            let _ = self.notify.send(Notification::Error(UPLOAD_FAILED.to_owned()));
            let status = UploadStatus::Failed(e.to_string());
            self.apply(|state| state.status = status.clone());
            return status;
        }

        info!(user_id = %self.user_id, "profile picture uploaded");
        let _ = self
            .notify
            .send(Notification::Success(UPLOAD_SUCCEEDED.to_owned()));

        let key = QueryKey::user(&self.user_id);
        self.cache.invalidate(&key);

        if self.state.strong_count() == 0 {
            debug!(user_id = %self.user_id, "view unmounted; leaving re-fetch to the next read");
            return UploadStatus::Succeeded;
        }

        // The preview stays up until the authoritative image is cached.
        let fetcher = user_fetcher(Arc::clone(&self.api), self.user_id.clone());
        let refreshed = self.cache.fetch::<User>(&key, fetcher).await;
        self.apply(|state| {
            state.status = UploadStatus::Succeeded;
            match refreshed {
                Ok(_) => {
                    if let Some(preview) = state.preview.take() {
                        preview.revoke();
                    }
                }
                Err(e) => warn!(?e, "profile re-fetch after upload failed; keeping preview"),
            }
        });

        UploadStatus::Succeeded
    }

    fn apply(&self, update: impl FnOnce(&mut UploadState)) {
        let Some(state) = self.state.upgrade() else {
            debug!(user_id = %self.user_id, "view unmounted; discarding upload result");
            return;
        };

        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.action != self.action {
            debug!(user_id = %self.user_id, "upload superseded by a newer selection");
            return;
        }
        update(&mut state);
    }
}
