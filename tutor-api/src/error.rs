use std::path::PathBuf;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no token found")]
    MissingCredential,

    #[error("credential store unavailable: {0:#}")]
    Credentials(anyhow::Error),

    #[error("invalid api base url `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("server responded {status}: {body}")]
    Server { status: StatusCode, body: String },

    #[error("failed to decode {resource}: {source}")]
    Decode {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Raised locally, before any request left the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential
                | Self::Credentials(_)
                | Self::InvalidBaseUrl { .. }
                | Self::Io { .. }
        )
    }
}
