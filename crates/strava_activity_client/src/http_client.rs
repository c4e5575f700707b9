//! HTTP client implementation for the Strava API.
//!
//! This module provides a reqwest-based implementation of the
//! [`StravaClient`](crate::StravaClient) trait.

use crate::config::{Config, DEFAULT_SCOPE};
use crate::credential::{Clock, Credential, SystemClock, TokenResponse};
use crate::pagination::Pagination;
use crate::{RawActivity, StravaClient, StravaError, observability};
use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Client for the Strava API using reqwest.
///
/// Holds no per-user state: tokens are passed into each call, so one instance
/// can serve unrelated athletes concurrently.
#[derive(Clone, Debug)]
pub struct ReqwestStravaClient {
    api_base_url: String,
    authorize_url: Url,
    token_url: String,
    redirect_uri: String,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    max_pages: u32,
    clock: Arc<dyn Clock>,
    client: reqwest::Client,
}

impl ReqwestStravaClient {
    /// Build a client from configuration. TLS certificates are verified unless
    /// `accept_invalid_certs` was explicitly enabled.
    pub fn new(config: &Config) -> Result<Self, StravaError> {
        let authorize_url = Url::parse(&config.authorize_url).map_err(|e| {
            StravaError::Config(format!("invalid authorize url {}: {e}", config.authorize_url))
        })?;

        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for the Strava client");
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| StravaError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            authorize_url,
            token_url: config.token_url.clone(),
            redirect_uri: config.redirect_uri.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            max_pages: config.max_pages,
            clock: Arc::new(SystemClock),
            client,
        })
    }

    /// Replace the wall clock used to compute token expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// URL of the authenticated athlete's activity list.
    pub fn activities_url(&self) -> String {
        format!("{}/athlete/activities", self.api_base_url)
    }

    fn app_credentials(&self) -> Result<(&str, &SecretString), StravaError> {
        match (self.client_id.as_deref(), self.client_secret.as_ref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            (id, secret) => {
                let mut missing = Vec::new();
                if id.is_none() {
                    missing.push("client_id");
                }
                if secret.is_none() {
                    missing.push("client_secret");
                }
                Err(StravaError::MissingCredentials(missing))
            }
        }
    }

    /// POST to the token endpoint and turn the reply into a credential.
    async fn token_grant(
        &self,
        grant_type: &'static str,
        grant_field: &'static str,
        grant_value: &str,
    ) -> Result<Credential, StravaError> {
        let (client_id, client_secret) = self.app_credentials()?;
        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret.expose_secret()),
            (grant_field, grant_value),
            ("grant_type", grant_type),
        ];
        let resp = self.client.post(&self.token_url).form(&form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            observability::record_token_grant(grant_type, false);
            let body = body_snippet(resp).await;
            tracing::warn!(grant_type, status = status.as_u16(), "token grant rejected");
            return Err(StravaError::Auth(format!("{grant_type} grant failed ({status}): {body}")));
        }
        observability::record_token_grant(grant_type, true);
        let payload: TokenResponse = resp.json().await?;
        Credential::from_token_response(payload, self.clock.as_ref())
    }

    /// Handle a response, converting status codes to appropriate errors.
    async fn handle_response(
        &self,
        resp: reqwest::Response,
    ) -> Result<serde_json::Value, StravaError> {
        let status = resp.status();
        observability::record_request(status.as_u16());
        if status == StatusCode::UNAUTHORIZED {
            return Err(StravaError::ExpiredToken);
        }
        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!("Strava rate limit hit (429)");
            }
            return Err(StravaError::Fetch {
                status: Some(status.as_u16()),
                message: body_snippet(resp).await,
            });
        }
        Ok(resp.json().await?)
    }
}

/// Leading part of a response body for error messages.
async fn body_snippet(resp: reqwest::Response) -> String {
    let body = resp.text().await.unwrap_or_default();
    body.chars().take(256).collect()
}

#[async_trait]
impl StravaClient for ReqwestStravaClient {
    fn authorization_url(&self) -> Result<String, StravaError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| StravaError::MissingCredentials(vec!["client_id"]))?;
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("approval_prompt", "force")
            .append_pair("scope", DEFAULT_SCOPE);
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<Credential, StravaError> {
        if code.trim().is_empty() {
            return Err(StravaError::InvalidInput("authorization code is empty".into()));
        }
        let cred = self.token_grant("authorization_code", "code", code).await?;
        tracing::info!(expires_at = cred.expires_at, "exchanged authorization code");
        Ok(cred)
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<Credential, StravaError> {
        if refresh_token.expose_secret().trim().is_empty() {
            return Err(StravaError::MissingCredentials(vec!["refresh_token"]));
        }
        let cred = self
            .token_grant(
                "refresh_token",
                "refresh_token",
                refresh_token.expose_secret(),
            )
            .await?;
        tracing::info!(expires_at = cred.expires_at, "refreshed access token");
        Ok(cred)
    }

    async fn authenticated_request(
        &self,
        access_token: &SecretString,
        method: Method,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, StravaError> {
        tracing::debug!(%method, url, "authenticated request");
        let resp = self
            .client
            .request(method, url)
            .bearer_auth(access_token.expose_secret())
            .query(params)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn get_athlete(
        &self,
        access_token: &SecretString,
    ) -> Result<serde_json::Value, StravaError> {
        let url = format!("{}/athlete", self.api_base_url);
        self.authenticated_request(access_token, Method::GET, &url, &[])
            .await
    }

    async fn fetch_page(
        &self,
        access_token: &SecretString,
        url: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RawActivity>, StravaError> {
        let params = [("page", page.to_string()), ("per_page", per_page.to_string())];
        let body = self
            .authenticated_request(access_token, Method::GET, url, &params)
            .await?;
        observability::record_page();

        let serde_json::Value::Array(items) = body else {
            return Err(StravaError::Fetch {
                status: None,
                message: format!("page {page} is not a JSON array"),
            });
        };
        items
            .into_iter()
            .map(|item| {
                RawActivity::try_from(item).map_err(|other| StravaError::Fetch {
                    status: None,
                    message: format!("page {page} contains a non-object item: {other}"),
                })
            })
            .collect()
    }

    async fn fetch_all(
        &self,
        access_token: &SecretString,
        url: &str,
        per_page: u32,
    ) -> Result<Vec<RawActivity>, StravaError> {
        let items = Pagination::new(per_page, self.max_pages)
            .collect(|page| self.fetch_page(access_token, url, page, per_page))
            .await?;
        observability::record_fetch_complete(items.len());
        tracing::info!(items = items.len(), "fetched all activity pages");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(config: Config) -> ReqwestStravaClient {
        ReqwestStravaClient::new(&config).expect("client")
    }

    #[test]
    fn authorization_url_has_fixed_scope_and_redirect() {
        let c = client(Config {
            client_id: Some("12345".into()),
            ..Config::default()
        });
        let url = c.authorization_url().expect("url");
        assert_eq!(
            url,
            "https://www.strava.com/oauth/authorize?client_id=12345&response_type=code\
             &redirect_uri=http%3A%2F%2Flocalhost%2Fexchange_token&approval_prompt=force\
             &scope=read%2Cactivity%3Aread_all"
        );
    }

    #[test]
    fn authorization_url_requires_client_id() {
        let c = client(Config::default());
        assert!(matches!(
            c.authorization_url(),
            Err(StravaError::MissingCredentials(f)) if f == vec!["client_id"]
        ));
    }

    #[test]
    fn invalid_authorize_url_is_config_error() {
        let res = ReqwestStravaClient::new(&Config {
            authorize_url: "not a url".into(),
            ..Config::default()
        });
        assert!(matches!(res, Err(StravaError::Config(_))));
    }

    #[test]
    fn activities_url_trims_trailing_slash() {
        let c = client(Config {
            api_base_url: "http://localhost:9000/api/v3/".into(),
            ..Config::default()
        });
        assert_eq!(
            c.activities_url(),
            "http://localhost:9000/api/v3/athlete/activities"
        );
    }

    #[tokio::test]
    async fn exchange_without_app_credentials_fails_before_any_request() {
        let c = client(Config {
            token_url: "http://127.0.0.1:9/unreachable".into(),
            ..Config::default()
        });
        match c.exchange_code("abc").await {
            Err(StravaError::MissingCredentials(missing)) => {
                assert_eq!(missing, vec!["client_id", "client_secret"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
