//! Tool layer over the Strava activity pipeline.
//!
//! Exposes the two operations an orchestration layer calls,
//! [`get_activities`] and [`summarize_activities`]. Both return plain JSON:
//! the payload on success or `{"error": message}` on failure, so a caller can
//! present problems without unwinding.

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use strava_activity_client::config::Config;
use strava_activity_client::{StravaClient, StravaError};

pub mod domains;
pub mod error;
pub mod tool_utils;
pub mod transforms;
pub mod types;

pub use error::{ToolError, ToolResult};
pub use types::{ActivityFormat, GetActivitiesParams, SummarizeParams, WindowBasisParam};

use domains::{Summary, SummaryOptions, Window, normalize_all, summarize, to_csv};
use tool_utils::{into_tool_response, pick, to_raw_activities};

/// Fetch activities with credentials from `params`, falling back to `config`.
pub async fn get_activities<C>(client: &C, config: &Config, params: GetActivitiesParams) -> Value
where
    C: StravaClient + ?Sized,
{
    into_tool_response(
        "get_activities",
        fetch_activities(client, config, params).await,
    )
}

/// Summarize raw activities; see [`build_summary`].
pub fn summarize_activities(params: SummarizeParams) -> Value {
    let today = chrono::Local::now().date_naive();
    into_tool_response("summarize_activities", build_summary(params, today))
}

/// Typed core of [`get_activities`]. CSV output comes back as a JSON string.
///
/// All three of `client_id`, `client_secret` and `access_token` must resolve;
/// otherwise the call fails before any request, naming every missing field.
pub async fn fetch_activities<C>(
    client: &C,
    config: &Config,
    params: GetActivitiesParams,
) -> ToolResult<Value>
where
    C: StravaClient + ?Sized,
{
    let client_id = pick(params.client_id, config.client_id.as_deref());
    let client_secret = pick(
        params.client_secret,
        config.client_secret.as_ref().map(|s| s.expose_secret()),
    );
    let access_token = pick(
        params.access_token,
        config.access_token.as_ref().map(|s| s.expose_secret()),
    );

    let missing: Vec<&'static str> = [
        ("client_id", client_id.is_none()),
        ("client_secret", client_secret.is_none()),
        ("access_token", access_token.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();
    let access_token = match access_token {
        Some(token) if missing.is_empty() => SecretString::new(token.into()),
        _ => return Err(StravaError::MissingCredentials(missing).into()),
    };

    let endpoint = params.endpoint.unwrap_or_else(|| {
        format!(
            "{}/athlete/activities",
            config.api_base_url.trim_end_matches('/')
        )
    });
    let per_page = params.per_page.unwrap_or(config.per_page);
    let all_pages = params.all_pages.unwrap_or(false);
    tracing::info!(endpoint = %endpoint, all_pages, per_page, "fetching activities");

    let activities = if all_pages {
        client.fetch_all(&access_token, &endpoint, per_page).await?
    } else {
        let page = params.page.unwrap_or(1);
        client
            .fetch_page(&access_token, &endpoint, page, per_page)
            .await?
    };

    match params.format.unwrap_or_default() {
        ActivityFormat::Csv => Ok(Value::String(to_csv(&normalize_all(activities))?)),
        ActivityFormat::Json if params.clean.unwrap_or(false) => {
            Ok(serde_json::to_value(normalize_all(activities))?)
        }
        ActivityFormat::Json => Ok(serde_json::to_value(activities)?),
    }
}

/// Filter, normalize and summarize. `today` anchors calendar windows.
pub fn build_summary(params: SummarizeParams, today: NaiveDate) -> ToolResult<Summary> {
    let raw = to_raw_activities(params.activities)?;
    let mut activities = normalize_all(raw);
    if let Some(types) = params.activity_types.filter(|t| !t.is_empty()) {
        activities.retain(|a| a.matches_type(&types));
    }

    let window = params
        .window_weeks
        .map(|weeks| match params.window_basis.unwrap_or_default() {
            WindowBasisParam::Data => Window::data_relative(weeks),
            WindowBasisParam::Calendar => Window::calendar_relative(weeks, today),
        });
    let options = SummaryOptions {
        include_weekly: params.include_weekly.unwrap_or(true),
        window,
    };
    Ok(summarize(&activities, &options)?)
}

/// JSON schemas of the tool parameters, keyed by tool name.
pub fn tool_schemas() -> Value {
    json!({
        "get_activities": schemars::schema_for!(GetActivitiesParams),
        "summarize_activities": schemars::schema_for!(SummarizeParams),
    })
}
