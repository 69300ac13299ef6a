use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, macros::format_description};

use crate::{geo::GeoCode, term::TermDefinition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
	/// Upstream day label: `YYYYMMDDT000000Z` for mention volume, `YYYY-MM-DD` for search interest.
	pub date: String,
	/// Raw volume, or the 0..100 score for search interest.
	pub value: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub normalized_value: Option<f64>,
}

/// Points for one (term, geo) pair, in the order the source delivered them.
#[derive(Debug, Clone, PartialEq)]
pub struct TermTimeSeries {
	pub term: TermDefinition,
	pub geo: GeoCode,
	pub points: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionRecord {
	pub term: String,
	pub date: String,
	pub value: f64,
	#[serde(default)]
	pub normalized_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestRecord {
	pub geo: String,
	pub term: String,
	pub date: String,
	pub score: f64,
}

/// Day label the mention-volume source uses for the UTC day before `now`.
pub fn yesterday_label(now: OffsetDateTime) -> String {
	let yesterday = (now - Duration::days(1)).date();

	// Infallible for this format and any representable date.
	yesterday
		.format(format_description!("[year][month][day]"))
		.map(|day| format!("{day}T000000Z"))
		.unwrap_or_default()
}

/// `YYYY-MM-DD` label for a unix timestamp in seconds, or `None` when out of range.
pub fn day_label_from_unix(seconds: i64) -> Option<String> {
	let at = OffsetDateTime::from_unix_timestamp(seconds).ok()?;

	at.date().format(format_description!("[year]-[month]-[day]")).ok()
}
