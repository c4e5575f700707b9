//! Metric names and recording helpers. Installing a recorder/exporter is left
//! to the embedding application; without one these calls are no-ops.

pub const REQUESTS_TOTAL: &str = "strava_requests_total";
pub const PAGES_FETCHED_TOTAL: &str = "strava_pages_fetched_total";
pub const ACTIVITIES_FETCHED: &str = "strava_activities_fetched";
pub const TOKEN_GRANTS_TOTAL: &str = "strava_token_grants_total";

pub(crate) fn record_request(status: u16) {
    metrics::counter!(REQUESTS_TOTAL, "status" => status.to_string()).increment(1);
}

pub(crate) fn record_page() {
    metrics::counter!(PAGES_FETCHED_TOTAL).increment(1);
}

pub(crate) fn record_fetch_complete(items: usize) {
    metrics::histogram!(ACTIVITIES_FETCHED).record(items as f64);
}

pub(crate) fn record_token_grant(grant_type: &'static str, success: bool) {
    metrics::counter!(
        TOKEN_GRANTS_TOTAL,
        "grant_type" => grant_type,
        "outcome" => if success { "success" } else { "failure" }
    )
    .increment(1);
}
