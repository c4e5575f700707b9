//! CSV rendering of cleaned activities.

use serde_json::Value;

use super::normalize::NormalizedActivity;

/// Render `activities` as CSV text.
///
/// Columns are the first activity's fields. Later activities leave missing
/// columns empty and their extra fields are dropped. No activities render as
/// an empty string, without a header row.
pub fn to_csv(activities: &[NormalizedActivity]) -> Result<String, csv::Error> {
    let Some(first) = activities.first() else {
        return Ok(String::new());
    };
    let header: Vec<&str> = first.as_map().keys().map(String::as_str).collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;
    for activity in activities {
        writer.write_record(header.iter().map(|field| cell(activity.get(field))))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
