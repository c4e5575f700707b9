//! Weekly aggregation of normalized activities.
//!
//! Activities are bucketed into Monday–Sunday weeks keyed by the Monday's
//! date. Buckets partition the input: every activity lands in exactly one
//! bucket and bucket ranges never overlap. Callers filter by activity type
//! before handing activities in.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::normalize::NormalizedActivity;
use crate::transforms::{parse_local_date, week_end, week_key, week_start};

const SECS_PER_HOUR: f64 = 3600.0;
const UNKNOWN_TYPE: &str = "Unknown";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("activity {id} has no start date")]
    MissingStartDate { id: String },
    #[error("activity {id} has an unparseable start date: {value}")]
    InvalidStartDate { id: String, value: String },
    #[error("window must cover at least one week")]
    EmptyWindow,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActivityStats {
    pub total_activities: usize,
    pub total_distance_miles: f64,
    pub total_moving_time_hours: f64,
    pub total_elapsed_time_hours: f64,
    /// Activity count per `type`.
    pub activity_types: BTreeMap<String, usize>,
}

impl ActivityStats {
    pub fn from_activities<'a>(
        activities: impl IntoIterator<Item = &'a NormalizedActivity>,
    ) -> Self {
        let mut stats = Self::default();
        let mut moving_secs = 0.0;
        let mut elapsed_secs = 0.0;
        for a in activities {
            stats.total_activities += 1;
            stats.total_distance_miles += a.distance_miles();
            moving_secs += a.moving_time_secs();
            elapsed_secs += a.elapsed_time_secs();
            let kind = a.activity_type().unwrap_or(UNKNOWN_TYPE).to_string();
            *stats.activity_types.entry(kind).or_insert(0) += 1;
        }
        stats.total_moving_time_hours = moving_secs / SECS_PER_HOUR;
        stats.total_elapsed_time_hours = elapsed_secs / SECS_PER_HOUR;
        stats
    }
}

/// Overall and per-week statistics. Serializes as `{}` when empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<ActivityStats>,
    /// Week start (`YYYY-MM-DD`, a Monday) → stats, oldest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly: Option<BTreeMap<String, ActivityStats>>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.overall.is_none() && self.weekly.is_none()
    }
}

/// Activities whose local start date falls in `[start, start + 6 days]`.
#[derive(Clone, Debug, PartialEq)]
pub struct WeekBucket<'a> {
    pub start: NaiveDate,
    pub activities: Vec<&'a NormalizedActivity>,
}

impl WeekBucket<'_> {
    pub fn end(&self) -> NaiveDate {
        week_end(self.start)
    }

    pub fn key(&self) -> String {
        week_key(self.start)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end()
    }
}

/// What "the most recent N weeks" is measured against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WindowBasis {
    /// The N most recent weeks that contain at least one activity.
    #[default]
    DataRelative,
    /// The N calendar weeks ending with the week containing `today`, whether
    /// or not they contain activities. Later weeks are excluded.
    CalendarRelative { today: NaiveDate },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub weeks: u32,
    pub basis: WindowBasis,
}

impl Window {
    pub fn data_relative(weeks: u32) -> Self {
        Self {
            weeks,
            basis: WindowBasis::DataRelative,
        }
    }

    pub fn calendar_relative(weeks: u32, today: NaiveDate) -> Self {
        Self {
            weeks,
            basis: WindowBasis::CalendarRelative { today },
        }
    }

    /// Keep the buckets inside the window. `buckets` must be sorted oldest first.
    fn apply<'a>(&self, mut buckets: Vec<WeekBucket<'a>>) -> Vec<WeekBucket<'a>> {
        match self.basis {
            WindowBasis::DataRelative => {
                let skip = buckets.len().saturating_sub(self.weeks as usize);
                buckets.split_off(skip)
            }
            WindowBasis::CalendarRelative { today } => {
                let newest = week_start(today);
                // Windows reaching past the earliest representable date keep everything.
                let oldest = Duration::try_weeks(i64::from(self.weeks) - 1)
                    .and_then(|span| newest.checked_sub_signed(span))
                    .unwrap_or(NaiveDate::MIN);
                buckets.retain(|b| oldest <= b.start && b.start <= newest);
                buckets
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SummaryOptions {
    pub include_weekly: bool,
    pub window: Option<Window>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            include_weekly: true,
            window: None,
        }
    }
}

/// Group activities into week buckets, oldest week first. Within a bucket
/// activities keep their input order.
pub fn group_by_week(
    activities: &[NormalizedActivity],
) -> Result<Vec<WeekBucket<'_>>, SummaryError> {
    let mut weeks: BTreeMap<NaiveDate, Vec<&NormalizedActivity>> = BTreeMap::new();
    for activity in activities {
        let monday = week_start(start_date_of(activity)?);
        weeks.entry(monday).or_default().push(activity);
    }
    Ok(weeks
        .into_iter()
        .map(|(start, activities)| WeekBucket { start, activities })
        .collect())
}

fn start_date_of(activity: &NormalizedActivity) -> Result<NaiveDate, SummaryError> {
    let id = || activity.id().unwrap_or_else(|| "<no id>".into());
    let raw = activity
        .local_start()
        .ok_or_else(|| SummaryError::MissingStartDate { id: id() })?;
    parse_local_date(raw).ok_or_else(|| SummaryError::InvalidStartDate {
        id: id(),
        value: raw.to_string(),
    })
}

/// Summarize `activities`.
///
/// With a window set, both the weekly breakdown and `overall` cover only the
/// activities inside the window. An empty input, or a window that keeps
/// nothing, yields an empty summary.
pub fn summarize(
    activities: &[NormalizedActivity],
    options: &SummaryOptions,
) -> Result<Summary, SummaryError> {
    if let Some(window) = options.window
        && window.weeks == 0
    {
        return Err(SummaryError::EmptyWindow);
    }
    if activities.is_empty() {
        return Ok(Summary::default());
    }

    if !options.include_weekly && options.window.is_none() {
        return Ok(Summary {
            overall: Some(ActivityStats::from_activities(activities)),
            weekly: None,
        });
    }

    let mut buckets = group_by_week(activities)?;
    let overall = match options.window {
        Some(window) => {
            buckets = window.apply(buckets);
            if buckets.is_empty() {
                return Ok(Summary::default());
            }
            ActivityStats::from_activities(
                buckets.iter().flat_map(|b| b.activities.iter().copied()),
            )
        }
        None => ActivityStats::from_activities(activities),
    };

    let weekly = options.include_weekly.then(|| {
        buckets
            .iter()
            .map(|b| {
                let stats = ActivityStats::from_activities(b.activities.iter().copied());
                (b.key(), stats)
            })
            .collect()
    });

    tracing::debug!(
        activities = overall.total_activities,
        weeks = buckets.len(),
        "summarized activities"
    );
    Ok(Summary {
        overall: Some(overall),
        weekly,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn act(id: u64, date: &str, miles: f64, kind: Option<&str>) -> NormalizedActivity {
        let mut v = json!({
            "id": id,
            "start_date_local": format!("{date}T08:00:00Z"),
            "distance": miles,
            "moving_time": 1800,
            "elapsed_time": 2000
        });
        if let Some(kind) = kind {
            v["type"] = json!(kind);
        }
        serde_json::from_value(v).expect("activity")
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
    }

    /// One activity on each of `n` consecutive weeks starting the week of
    /// 2025-01-06, with a mid-week day to exercise bucketing.
    fn weekly_series(n: u64) -> Vec<NormalizedActivity> {
        (0..n)
            .map(|i| {
                let date = d("2025-01-08") + Duration::weeks(i as i64);
                act(i, &date.to_string(), 1.0, Some("Run"))
            })
            .collect()
    }

    #[test]
    fn empty_input_is_empty_summary() {
        let s = summarize(&[], &SummaryOptions::default()).expect("summary");
        assert!(s.is_empty());
        assert_eq!(serde_json::to_value(&s).unwrap(), json!({}));
    }

    #[test]
    fn buckets_partition_the_input() {
        let acts: Vec<_> = (0..60u64)
            .map(|i| {
                let date = d("2025-03-01") + Duration::days((i * 5 % 47) as i64);
                act(i, &date.to_string(), 1.0, Some("Run"))
            })
            .collect();
        let buckets = group_by_week(&acts).expect("buckets");

        let mut seen: Vec<String> = buckets
            .iter()
            .flat_map(|b| b.activities.iter().filter_map(|a| a.id()))
            .collect();
        seen.sort();
        let mut expected: Vec<String> = acts.iter().filter_map(|a| a.id()).collect();
        expected.sort();
        assert_eq!(seen, expected);

        for pair in buckets.windows(2) {
            assert!(pair[0].end() < pair[1].start, "buckets overlap");
        }
        for b in &buckets {
            assert_eq!((b.end() - b.start).num_days(), 6);
            for a in &b.activities {
                let date = parse_local_date(a.local_start().unwrap()).unwrap();
                assert!(b.contains(date));
            }
        }
    }

    #[test]
    fn sunday_and_following_monday_split() {
        let acts = vec![
            act(1, "2025-06-08", 1.0, Some("Run")),
            act(2, "2025-06-09", 1.0, Some("Run")),
        ];
        let s = summarize(&acts, &SummaryOptions::default()).expect("summary");
        let weekly = s.weekly.expect("weekly");
        let keys: Vec<_> = weekly.keys().cloned().collect();
        assert_eq!(keys, vec!["2025-06-02", "2025-06-09"]);
    }

    #[test]
    fn end_to_end_two_mondays() {
        let acts = vec![
            act(1, "2025-06-02", 1609.34 * 0.000621371, Some("Run")),
            act(2, "2025-06-09", 3218.68 * 0.000621371, Some("Run")),
        ];
        let s = summarize(&acts, &SummaryOptions::default()).expect("summary");
        let weekly = s.weekly.expect("weekly");
        assert_eq!(weekly.len(), 2);
        let first = &weekly["2025-06-02"];
        let second = &weekly["2025-06-09"];
        assert_eq!(first.total_activities, 1);
        assert_eq!(second.total_activities, 1);
        assert!((first.total_distance_miles - 1.0).abs() < 1e-3);
        assert!((second.total_distance_miles - 2.0).abs() < 1e-3);
        let overall = s.overall.expect("overall");
        assert!((overall.total_distance_miles - 3.0).abs() < 1e-3);
        assert_eq!(overall.activity_types.get("Run"), Some(&2));
    }

    #[test]
    fn stats_convert_seconds_to_hours_and_default_type() {
        let acts = vec![
            act(1, "2025-06-02", 2.0, None),
            act(2, "2025-06-03", 3.0, Some("Ride")),
        ];
        let stats = ActivityStats::from_activities(&acts);
        assert_eq!(stats.total_activities, 2);
        assert!((stats.total_moving_time_hours - 1.0).abs() < 1e-12);
        assert!((stats.total_elapsed_time_hours - 4000.0 / 3600.0).abs() < 1e-12);
        assert_eq!(stats.activity_types.get("Unknown"), Some(&1));
        assert_eq!(stats.activity_types.get("Ride"), Some(&1));
    }

    #[test]
    fn data_relative_window_keeps_most_recent_weeks() {
        let acts = weekly_series(10);
        let opts = SummaryOptions {
            include_weekly: true,
            window: Some(Window::data_relative(4)),
        };
        let s = summarize(&acts, &opts).expect("summary");
        let keys: Vec<_> = s.weekly.expect("weekly").keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["2025-02-17", "2025-02-24", "2025-03-03", "2025-03-10"]
        );
        assert_eq!(s.overall.expect("overall").total_activities, 4);
    }

    #[test]
    fn data_relative_window_larger_than_data_keeps_everything() {
        let acts = weekly_series(3);
        let opts = SummaryOptions {
            include_weekly: true,
            window: Some(Window::data_relative(12)),
        };
        let s = summarize(&acts, &opts).expect("summary");
        assert_eq!(s.weekly.expect("weekly").len(), 3);
    }

    #[test]
    fn calendar_window_skips_gaps_instead_of_reaching_back() {
        // data weeks: 2025-01-06 .. 2025-03-10; "today" is three weeks after the last one
        let acts = weekly_series(10);
        let opts = SummaryOptions {
            include_weekly: true,
            window: Some(Window::calendar_relative(4, d("2025-04-02"))),
        };
        let s = summarize(&acts, &opts).expect("summary");
        let keys: Vec<_> = s.weekly.expect("weekly").keys().cloned().collect();
        assert_eq!(keys, vec!["2025-03-10"]);

        let far_future = SummaryOptions {
            include_weekly: true,
            window: Some(Window::calendar_relative(4, d("2026-01-01"))),
        };
        let s = summarize(&acts, &far_future).expect("summary");
        assert!(s.is_empty());
    }

    #[test]
    fn huge_calendar_window_keeps_every_week() {
        let acts = weekly_series(10);
        let opts = SummaryOptions {
            include_weekly: true,
            window: Some(Window::calendar_relative(u32::MAX, d("2025-04-02"))),
        };
        let s = summarize(&acts, &opts).expect("summary");
        assert_eq!(s.weekly.expect("weekly").len(), 10);
        assert_eq!(s.overall.expect("overall").total_activities, 10);
    }

    #[test]
    fn zero_week_window_is_rejected() {
        let opts = SummaryOptions {
            include_weekly: true,
            window: Some(Window::data_relative(0)),
        };
        assert_eq!(summarize(&weekly_series(2), &opts), Err(SummaryError::EmptyWindow));
    }

    #[test]
    fn overall_only_does_not_need_dates() {
        let acts: Vec<NormalizedActivity> =
            vec![serde_json::from_value(json!({"id": 1, "distance": 2.5})).unwrap()];
        let opts = SummaryOptions {
            include_weekly: false,
            window: None,
        };
        let s = summarize(&acts, &opts).expect("summary");
        assert!(s.weekly.is_none());
        assert_eq!(s.overall.expect("overall").total_distance_miles, 2.5);
    }

    #[test]
    fn bad_start_date_names_the_activity() {
        let acts: Vec<NormalizedActivity> = vec![
            serde_json::from_value(json!({"id": 42, "start_date_local": "soon"})).unwrap(),
        ];
        assert_eq!(
            summarize(&acts, &SummaryOptions::default()),
            Err(SummaryError::InvalidStartDate {
                id: "42".into(),
                value: "soon".into()
            })
        );
        let acts: Vec<NormalizedActivity> =
            vec![serde_json::from_value(json!({"id": 43})).unwrap()];
        assert_eq!(
            summarize(&acts, &SummaryOptions::default()),
            Err(SummaryError::MissingStartDate { id: "43".into() })
        );
    }

    #[test]
    fn single_activity_week_has_full_stats() {
        let acts = vec![act(1, "2025-06-04", 4.2, Some("Walk"))];
        let s = summarize(&acts, &SummaryOptions::default()).expect("summary");
        let week = &s.weekly.expect("weekly")["2025-06-02"];
        assert_eq!(week.total_activities, 1);
        assert_eq!(week.total_distance_miles, 4.2);
        assert_eq!(week.activity_types.get("Walk"), Some(&1));
    }
}
