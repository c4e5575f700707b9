//! OAuth credential state and the wall clock used to age it.

use crate::StravaError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

/// Source of "now" in epoch seconds.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock frozen at a given instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Access/refresh token pair. Tokens are redacted from `Debug` output.
#[derive(Clone, Debug)]
pub struct Credential {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    /// Epoch seconds.
    pub expires_at: i64,
    /// Athlete summary sent along with an authorization-code exchange.
    pub athlete: Option<serde_json::Value>,
}

impl Credential {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: i64,
    ) -> Self {
        let access_token: String = access_token.into();
        let refresh_token: String = refresh_token.into();
        Self {
            access_token: SecretString::new(access_token.into()),
            refresh_token: SecretString::new(refresh_token.into()),
            expires_at,
            athlete: None,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// True when the token is expired or will be within `margin_secs`.
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        now + margin_secs >= self.expires_at
    }

    pub fn expires_at_iso(&self) -> Option<String> {
        chrono::DateTime::from_timestamp(self.expires_at, 0).map(|dt| dt.to_rfc3339())
    }

    /// JSON rendering with the raw token values. Only for surfaces whose job
    /// is to hand the tokens to the user, such as the token CLI.
    pub fn to_exposed_json(&self) -> serde_json::Value {
        let mut value = json!({
            "access_token": self.access_token.expose_secret(),
            "refresh_token": self.refresh_token.expose_secret(),
            "expires_at": self.expires_at,
            "expires_at_iso": self.expires_at_iso(),
        });
        if let Some(athlete) = &self.athlete {
            value["athlete"] = athlete.clone();
        }
        value
    }

    pub(crate) fn from_token_response(
        resp: TokenResponse,
        clock: &dyn Clock,
    ) -> Result<Self, StravaError> {
        let expires_at = match (resp.expires_in, resp.expires_at) {
            (Some(expires_in), _) => clock.now() + expires_in,
            (None, Some(expires_at)) => expires_at,
            (None, None) => {
                return Err(StravaError::Auth(
                    "token response carried no expiry".into(),
                ));
            }
        };
        Ok(Self {
            access_token: SecretString::new(resp.access_token.into()),
            refresh_token: SecretString::new(resp.refresh_token.into()),
            expires_at,
            athlete: resp.athlete,
        })
    }
}

/// Body of a successful `/oauth/token` response.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    #[serde(default)]
    athlete: Option<serde_json::Value>,
}
