use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::Value;

use pulse_config::MentionVolumeSource;
use pulse_domain::{SourceKind, Timeframe, TimeSeriesPoint};

use crate::{Error, Result, pacing::Pacing};

/// Client for the public-web mention-volume timeline API. No internal retry.
pub struct MentionVolumeClient {
	client: Client,
	cfg: MentionVolumeSource,
	pacing: Pacing,
}
impl MentionVolumeClient {
	pub fn new(cfg: &MentionVolumeSource) -> Result<Self> {
		if cfg.api_base.trim().is_empty() {
			return Err(Error::InvalidConfig {
				message: "Mention-volume api_base must be non-empty.".to_string(),
			});
		}

		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { client, cfg: cfg.clone(), pacing: Pacing::from_config(cfg) })
	}

	pub fn pacing_delay(&self, timeframe: Timeframe) -> Duration {
		self.pacing.delay_for(timeframe)
	}

	/// Fetches the raw volume timeline for an already URL-safe `query`.
	///
	/// A response without a timeline yields no points.
	pub async fn fetch(&self, query: &str, timeframe: Timeframe) -> Result<Vec<TimeSeriesPoint>> {
		let url = timeline_url(&self.cfg, query, timeframe)?;
		let start = Instant::now();
		let res = self.client.get(&url).send().await?;
		let json: Value = crate::check_status(res)?.json().await?;
		let points = parse_timeline(json)?;

		tracing::debug!(
			query,
			?timeframe,
			points = points.len(),
			duration_ms = start.elapsed().as_millis() as u64,
			"Mention-volume timeline fetched."
		);

		Ok(points)
	}
}

fn timeline_url(cfg: &MentionVolumeSource, query: &str, timeframe: Timeframe) -> Result<String> {
	let span = match timeframe {
		Timeframe::Unrestricted => None,
		Timeframe::TrailingWeek => Some("1w"),
		other =>
			return Err(Error::UnsupportedTimeframe {
				kind: SourceKind::MentionVolume,
				timeframe: other,
			}),
	};
	let mut url = format!(
		"{}{}?query={}&mode=timelinevolraw&format=json",
		cfg.api_base,
		cfg.path,
		escape_reserved(query)
	);

	if let Some(span) = span {
		url.push_str("&TIMESPAN=");
		url.push_str(span);
	}

	Ok(url)
}

// Queries arrive with spaces already encoded; only characters that would split the URL remain.
fn escape_reserved(query: &str) -> String {
	let mut out = String::with_capacity(query.len());

	for ch in query.chars() {
		match ch {
			'&' => out.push_str("%26"),
			'#' => out.push_str("%23"),
			'+' => out.push_str("%2B"),
			'?' => out.push_str("%3F"),
			' ' => out.push_str("%20"),
			_ => out.push(ch),
		}
	}

	out
}

fn parse_timeline(json: Value) -> Result<Vec<TimeSeriesPoint>> {
	let Some(series) = json
		.get("timeline")
		.and_then(|v| v.as_array())
		.and_then(|timeline| timeline.first())
	else {
		return Ok(Vec::new());
	};
	let Some(data) = series.get("data").and_then(|v| v.as_array()) else {
		return Ok(Vec::new());
	};
	let mut points = Vec::with_capacity(data.len());

	for day in data {
		let date = day
			.get("date")
			.and_then(|v| v.as_str())
			.ok_or_else(|| Error::InvalidResponse {
				message: "Timeline entry is missing date.".to_string(),
			})?;
		let value = day.get("value").and_then(|v| v.as_f64()).ok_or_else(|| {
			Error::InvalidResponse { message: format!("Timeline entry {date} is missing value.") }
		})?;
		let normalized_value = day.get("norm").and_then(|v| v.as_f64());

		points.push(TimeSeriesPoint { date: date.to_string(), value, normalized_value });
	}

	Ok(points)
}
