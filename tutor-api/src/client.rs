use std::env;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use tutor_store::CredentialStore;
use tutor_store::model::activity::{Activity, FinalScore};
use tutor_store::model::user::User;

use crate::error::ApiError;
use crate::upload::ProfilePictureUpload;
use crate::{ActivityApi, UserApi};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:4000";
const PROFILE_PICTURE_FIELD: &str = "profilePicture";

/// Authenticated client for the tutoring backend. Every call reads the bearer
/// token from the credential store first and fails without touching the
/// network when none is stored.
#[derive(Clone, Debug)]
pub struct HttpAccessor {
    http: reqwest::Client,
    base_url: Url,
    credentials: CredentialStore,
}

impl HttpAccessor {
    pub fn from_env(credentials: CredentialStore) -> anyhow::Result<Self> {
        let base_url = env::var("TUTOR_API_URL")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let timeout = env::var("TUTOR_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self::new(base_url, credentials, timeout).context("failed to build http client")
    }

    pub fn new(
        base_url: impl Into<String>,
        credentials: CredentialStore,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let raw = base_url.into();
        let invalid = |reason: String| ApiError::InvalidBaseUrl {
            url: raw.clone(),
            reason,
        };
        let base_url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("not a hierarchical url".to_owned()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append `segments` to the base path. Each segment is percent-encoded,
    /// so an id can never climb out of its resource path or add a query.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn bearer(&self) -> Result<String, ApiError> {
        self.credentials
            .token()
            .map_err(ApiError::Credentials)?
            .ok_or(ApiError::MissingCredential)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        resource: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.inspect_err(|e| {
            warn!(?e, resource, "request failed before a response arrived");
        })?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                resource: resource.to_owned(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, resource, "server rejected request");
            return Err(ApiError::Server { status, body });
        }

        let bytes = response.bytes().await?;
        debug!(%status, resource, bytes = bytes.len(), "response received");
        serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
            resource: resource.to_owned(),
            source,
        })
    }
}

#[async_trait]
impl UserApi for HttpAccessor {
    async fn fetch_user_by_id(&self, id: &str) -> Result<User, ApiError> {
        let token = self.bearer()?;
        let request = self
            .http
            .get(self.url(&["api", "users", id.trim()]))
            .bearer_auth(token);
        self.send(&format!("user `{id}`"), request).await
    }

    async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        let token = self.bearer()?;
        let request = self.http.get(self.url(&["api", "users"])).bearer_auth(token);
        self.send("users", request).await
    }

    async fn update_profile_picture(
        &self,
        upload: ProfilePictureUpload,
    ) -> Result<User, ApiError> {
        let token = self.bearer()?;
        let ProfilePictureUpload { user_id, file } = upload;

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;
        let form = Form::new().part(PROFILE_PICTURE_FIELD, part);

        let request = self
            .http
            .patch(self.url(&["api", "users", user_id.trim(), "profile-picture"]))
            .bearer_auth(token)
            .multipart(form);
        self.send(&format!("user `{user_id}`"), request).await
    }
}

#[async_trait]
impl ActivityApi for HttpAccessor {
    async fn fetch_activities(&self) -> Result<Vec<Activity>, ApiError> {
        let token = self.bearer()?;
        let request = self
            .http
            .get(self.url(&["api", "activities"]))
            .bearer_auth(token);
        self.send("activities", request).await
    }

    async fn fetch_activity_by_id(&self, id: &str) -> Result<Activity, ApiError> {
        let token = self.bearer()?;
        let request = self
            .http
            .get(self.url(&["api", "activities", id.trim()]))
            .bearer_auth(token);
        self.send(&format!("activity `{id}`"), request).await
    }

    async fn update_activity(&self, id: &str, data: Value) -> Result<Activity, ApiError> {
        let token = self.bearer()?;
        let request = self
            .http
            .patch(self.url(&["api", "activities", id.trim()]))
            .bearer_auth(token)
            .json(&data);
        self.send(&format!("activity `{id}`"), request).await
    }

    async fn send_final_score(&self, score: FinalScore) -> Result<Value, ApiError> {
        let token = self.bearer()?;
        let request = self
            .http
            .post(self.url(&["api", "activities", "mark-as-done"]))
            .bearer_auth(token)
            .json(&score);
        self.send("activity score", request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    use tutor_store::CredentialStore;
    use tutor_store::model::activity::FinalScore;
    use tutor_store::model::user::Role;

    use super::HttpAccessor;
    use crate::error::ApiError;
    use crate::upload::{ImageFile, ProfilePictureUpload};
    use crate::{ActivityApi, UserApi};

    struct FakeServer {
        base_url: String,
        connections: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    /// Answers every request with `status` and `body`, recording request heads.
    async fn serve(status: &'static str, body: &'static str) -> FakeServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let connections = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&connections);
        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                seen.fetch_add(1, Ordering::SeqCst);
                let mut head = Vec::new();
                let mut buf = [0_u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                log.lock().await.push(String::from_utf8_lossy(&head).into_owned());

                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        FakeServer {
            base_url,
            connections,
            requests,
        }
    }

    fn accessor(server: &FakeServer, credentials: CredentialStore) -> HttpAccessor {
        HttpAccessor::new(&server.base_url, credentials, None).unwrap()
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_connection() {
        let server = serve("200 OK", "{}").await;
        let api = accessor(&server, CredentialStore::in_memory());

        assert!(matches!(
            api.fetch_user_by_id("u1").await,
            Err(ApiError::MissingCredential)
        ));
        assert!(matches!(api.fetch_users().await, Err(ApiError::MissingCredential)));
        assert!(matches!(
            api.update_profile_picture(ProfilePictureUpload {
                user_id: "u1".to_owned(),
                file: ImageFile::new("me.png", vec![1, 2, 3]),
            })
            .await,
            Err(ApiError::MissingCredential)
        ));
        assert!(matches!(
            api.fetch_activities().await,
            Err(ApiError::MissingCredential)
        ));
        assert!(matches!(
            api.fetch_activity_by_id("a1").await,
            Err(ApiError::MissingCredential)
        ));
        assert!(matches!(
            api.update_activity("a1", json!({ "title": "x" })).await,
            Err(ApiError::MissingCredential)
        ));
        assert!(matches!(
            api.send_final_score(FinalScore {
                student_id: "u1".to_owned(),
                activity_id: "a1".to_owned(),
                score: 10,
            })
            .await,
            Err(ApiError::MissingCredential)
        ));

        assert_eq!(server.connections.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn authenticated_fetch_sends_bearer_token() {
        let server = serve(
            "200 OK",
            r#"{"id":"u1","role":"Student","firstName":"Ada","username":"ada","expPoints":50}"#,
        )
        .await;
        let credentials = CredentialStore::in_memory();
        credentials.login("secret-token", Role::Student).unwrap();
        let api = accessor(&server, credentials);

        let user = api.fetch_user_by_id("u1").await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.exp_points, 50);

        let requests = server.requests.lock().await;
        let head = requests[0].to_ascii_lowercase();
        assert!(head.starts_with("get /api/users/u1 "));
        assert!(head.contains("authorization: bearer secret-token"));
    }

    #[tokio::test]
    async fn not_found_and_server_errors_are_distinguished() {
        let credentials = CredentialStore::in_memory();
        credentials.login("t", Role::Teacher).unwrap();

        let missing = serve("404 Not Found", "{}").await;
        let err = accessor(&missing, credentials.clone())
            .fetch_user_by_id("ghost")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let broken = serve("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let err = accessor(&broken, credentials)
            .fetch_users()
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status, .. } if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn ids_are_escaped_into_a_single_path_segment() {
        let server = serve("404 Not Found", "{}").await;
        let credentials = CredentialStore::in_memory();
        credentials.login("t", Role::Teacher).unwrap();
        let api = accessor(&server, credentials);

        let err = api.fetch_user_by_id("../activities?x=1").await.unwrap_err();
        assert!(err.is_not_found());

        let requests = server.requests.lock().await;
        let head = requests[0].to_ascii_lowercase();
        assert!(
            head.starts_with("get /api/users/..%2factivities%3fx=1 http/1.1"),
            "{head}"
        );
    }

    #[tokio::test]
    async fn base_url_keeps_prefix_and_drops_trailing_slash() {
        let api = HttpAccessor::new("http://api.local/", CredentialStore::in_memory(), None)
            .unwrap();
        assert_eq!(api.base_url(), "http://api.local");
        assert_eq!(
            api.url(&["api", "users"]).as_str(),
            "http://api.local/api/users"
        );

        let nested =
            HttpAccessor::new("http://api.local/v2/", CredentialStore::in_memory(), None)
                .unwrap();
        assert_eq!(
            nested.url(&["api", "users", "a b"]).as_str(),
            "http://api.local/v2/api/users/a%20b"
        );
    }

    #[test]
    fn unusable_base_url_is_rejected() {
        let err = HttpAccessor::new("not a url", CredentialStore::in_memory(), None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl { .. }));
        assert!(err.is_local());
    }
}
