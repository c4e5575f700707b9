use crate::StravaError;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://www.strava.com/api/v3";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://www.strava.com/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost/exchange_token";
pub const DEFAULT_SCOPE: &str = "read,activity:read_all";
pub const DEFAULT_PER_PAGE: u32 = 30;
pub const DEFAULT_MAX_PAGES: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct Config {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub api_base_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub per_page: u32,
    pub max_pages: u32,
    pub timeout: Duration,
    /// Skip TLS certificate verification. Off unless explicitly enabled.
    pub accept_invalid_certs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            access_token: None,
            refresh_token: None,
            api_base_url: DEFAULT_API_BASE_URL.into(),
            authorize_url: DEFAULT_AUTHORIZE_URL.into(),
            token_url: DEFAULT_TOKEN_URL.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.into(),
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            accept_invalid_certs: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, StravaError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    ///
    /// Credentials are optional here; operations that need them check with
    /// [`Config::require`] before issuing any request.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, StravaError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut get = |k: &str| get(k).filter(|v| !v.trim().is_empty());
        let secret = |v: String| SecretString::new(v.into());
        let defaults = Self::default();

        Ok(Self {
            client_id: get("STRAVA_CLIENT_ID"),
            client_secret: get("STRAVA_CLIENT_SECRET").map(secret),
            access_token: get("STRAVA_ACCESS_TOKEN").map(secret),
            refresh_token: get("STRAVA_REFRESH_TOKEN").map(secret),
            api_base_url: get("STRAVA_API_BASE_URL").unwrap_or(defaults.api_base_url),
            authorize_url: get("STRAVA_URL_AUTHORIZE").unwrap_or(defaults.authorize_url),
            token_url: get("STRAVA_URL_TOKEN").unwrap_or(defaults.token_url),
            redirect_uri: get("STRAVA_REDIRECT_URI").unwrap_or(defaults.redirect_uri),
            per_page: parse_or("STRAVA_PER_PAGE", get("STRAVA_PER_PAGE"), defaults.per_page)?,
            max_pages: parse_or(
                "STRAVA_MAX_PAGES",
                get("STRAVA_MAX_PAGES"),
                defaults.max_pages,
            )?,
            timeout: Duration::from_secs(parse_or(
                "STRAVA_TIMEOUT_SECS",
                get("STRAVA_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?),
            accept_invalid_certs: parse_or(
                "STRAVA_ACCEPT_INVALID_CERTS",
                get("STRAVA_ACCEPT_INVALID_CERTS"),
                false,
            )?,
        })
    }

    /// Fail with every absent field named when any of `fields` is unset.
    ///
    /// Recognized names: `client_id`, `client_secret`, `access_token`,
    /// `refresh_token`.
    pub fn require(&self, fields: &[&'static str]) -> Result<(), StravaError> {
        let missing: Vec<&'static str> = fields
            .iter()
            .copied()
            .filter(|f| match *f {
                "client_id" => self.client_id.is_none(),
                "client_secret" => self.client_secret.is_none(),
                "access_token" => self.access_token.is_none(),
                "refresh_token" => self.refresh_token.is_none(),
                _ => false,
            })
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StravaError::MissingCredentials(missing))
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &str,
    value: Option<String>,
    default: T,
) -> Result<T, StravaError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| StravaError::Config(format!("{key} has invalid value {v:?}"))),
    }
}
