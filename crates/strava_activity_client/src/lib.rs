//! Strava OAuth and activity retrieval.
//!
//! [`StravaClient`] is the seam callers program against; [`http_client::ReqwestStravaClient`]
//! is the reqwest-backed implementation.

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

pub mod activity;
pub mod config;
pub mod credential;
pub mod http_client;
pub mod observability;
pub mod pagination;
pub mod retry;

pub use activity::RawActivity;
pub use credential::{Clock, Credential, SystemClock};

/// Coarse error classes exposed to callers that only need to branch on the
/// category of a failure (refresh and retry, report missing fields, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    ExpiredToken,
    Fetch,
    Validation,
    Config,
}

#[derive(Debug, Error)]
pub enum StravaError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("access token expired")]
    ExpiredToken,
    #[error("request failed{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Fetch {
        status: Option<u16>,
        message: String,
    },
    #[error("pagination stopped after {max_pages} pages without reaching the last page")]
    PageLimitExceeded { max_pages: u32 },
    #[error("missing required credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl StravaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StravaError::Auth(_) => ErrorKind::Auth,
            StravaError::ExpiredToken => ErrorKind::ExpiredToken,
            StravaError::Http(_)
            | StravaError::Fetch { .. }
            | StravaError::PageLimitExceeded { .. } => ErrorKind::Fetch,
            StravaError::MissingCredentials(_) | StravaError::InvalidInput(_) => {
                ErrorKind::Validation
            }
            StravaError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether repeating the same call unchanged might succeed.
    ///
    /// Transport failures, rate limiting and server errors qualify. An expired
    /// token never does: the caller has to refresh first.
    pub fn is_transient(&self) -> bool {
        match self {
            StravaError::Http(e) => e.is_timeout() || e.is_connect(),
            StravaError::Fetch {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[async_trait]
pub trait StravaClient: Send + Sync + 'static {
    /// Consent URL the athlete visits to grant access. Pure, no I/O; fails
    /// only when no client id is configured.
    fn authorization_url(&self) -> Result<String, StravaError>;

    async fn exchange_code(&self, code: &str) -> Result<Credential, StravaError>;

    async fn refresh(&self, refresh_token: &SecretString) -> Result<Credential, StravaError>;

    /// Issue one bearer-authenticated request and return the JSON body.
    ///
    /// A 401 surfaces as [`StravaError::ExpiredToken`]; the request is never
    /// retried here.
    async fn authenticated_request(
        &self,
        access_token: &SecretString,
        method: reqwest::Method,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, StravaError>;

    /// Profile of the athlete owning `access_token`.
    async fn get_athlete(&self, access_token: &SecretString)
    -> Result<serde_json::Value, StravaError>;

    async fn fetch_page(
        &self,
        access_token: &SecretString,
        url: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RawActivity>, StravaError>;

    /// Fetch every page of a list endpoint. Either all items are returned or
    /// an error is; partial results are never handed back.
    async fn fetch_all(
        &self,
        access_token: &SecretString,
        url: &str,
        per_page: u32,
    ) -> Result<Vec<RawActivity>, StravaError>;
}
