use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for `get_activities`. Credentials not given here are taken from
/// the `STRAVA_*` environment configuration.
#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct GetActivitiesParams {
    /// Strava client ID (falls back to STRAVA_CLIENT_ID)
    pub client_id: Option<String>,
    /// Strava client secret (falls back to STRAVA_CLIENT_SECRET)
    pub client_secret: Option<String>,
    /// Strava access token (falls back to STRAVA_ACCESS_TOKEN)
    pub access_token: Option<String>,
    /// Endpoint to call (default: the athlete activities endpoint)
    pub endpoint: Option<String>,
    /// Follow pagination until the last page (default: false = one page)
    pub all_pages: Option<bool>,
    /// Page number for single-page requests (default: 1)
    pub page: Option<u32>,
    /// Items per page (default: STRAVA_PER_PAGE or 30)
    pub per_page: Option<u32>,
    /// Strip bulky fields and convert to miles/feet/mph (default: false)
    pub clean: Option<bool>,
    /// Output format (default: json). CSV output is always cleaned.
    pub format: Option<ActivityFormat>,
}

/// Rendering of fetched activities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityFormat {
    /// A JSON array of activity objects
    #[default]
    Json,
    /// CSV text for spreadsheets, one row per activity
    Csv,
}

/// How `window_weeks` is counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WindowBasisParam {
    /// The most recent weeks that contain activities
    #[default]
    Data,
    /// The most recent calendar weeks up to today, including empty ones
    Calendar,
}

/// Parameters for `summarize_activities`.
#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct SummarizeParams {
    /// Activities as returned by the Strava API (metric units)
    pub activities: Vec<serde_json::Value>,
    /// Include the per-week breakdown (default: true)
    pub include_weekly: Option<bool>,
    /// Only summarize the most recent N weeks
    pub window_weeks: Option<u32>,
    /// What the window is measured against (default: data)
    pub window_basis: Option<WindowBasisParam>,
    /// Keep only these activity types, matched against `type` or `sport_type` (e.g. ["Run"])
    pub activity_types: Option<Vec<String>>,
}
