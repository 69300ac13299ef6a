use std::{
	sync::atomic::{AtomicBool, Ordering},
	time::Instant,
};

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use pulse_config::SearchInterestSource;
use pulse_domain::{SourceKind, Timeframe, TimeSeriesPoint, series};

use crate::{Error, Result, pacing::RetryPolicy};

const TIMESERIES_WIDGET: &str = "TIMESERIES";

/// Client for the search-interest API: explore for a widget token, then read the multiline
/// timeline. Every upstream call goes through the configured [`RetryPolicy`].
pub struct SearchInterestClient {
	client: Client,
	cfg: SearchInterestSource,
	policy: RetryPolicy,
	cookies_ready: AtomicBool,
}
impl SearchInterestClient {
	pub fn new(cfg: &SearchInterestSource) -> Result<Self> {
		if cfg.api_base.trim().is_empty() {
			return Err(Error::InvalidConfig {
				message: "Search-interest api_base must be non-empty.".to_string(),
			});
		}

		let policy = RetryPolicy::from_config(&cfg.retry);
		let client = Client::builder()
			.cookie_store(true)
			.connect_timeout(policy.connect_timeout)
			.read_timeout(policy.read_timeout)
			.build()?;

		Ok(Self { client, cfg: cfg.clone(), policy, cookies_ready: AtomicBool::new(false) })
	}

	/// Interest-over-time scores for `keyword` in `geo` (empty for no restriction).
	///
	/// Rows come back in upstream order. No rows yields no points.
	pub async fn fetch(
		&self,
		keyword: &str,
		geo: &str,
		timeframe: Timeframe,
	) -> Result<Vec<TimeSeriesPoint>> {
		let time = timeframe_param(timeframe)?;
		let start = Instant::now();

		self.warm_cookies(geo).await;

		let widget = self.policy.run("explore", || self.explore(keyword, geo, time)).await?;
		let Some(widget) = widget else {
			tracing::debug!(keyword, geo, "Explore returned no time-series widget.");

			return Ok(Vec::new());
		};
		let body = self.policy.run("multiline", || self.multiline(&widget)).await?;
		let points = parse_multiline(&body)?;

		tracing::debug!(
			keyword,
			geo,
			time,
			points = points.len(),
			duration_ms = start.elapsed().as_millis() as u64,
			"Search-interest timeline fetched."
		);

		Ok(points)
	}

	// Explore rejects sessions without a cookie; one warm-up per client is enough.
	async fn warm_cookies(&self, geo: &str) {
		if self.cookies_ready.load(Ordering::Acquire) {
			return;
		}

		let url = format!("{}/", self.cfg.api_base);
		let geo = if geo.is_empty() { "US" } else { geo };

		match self.client.get(&url).query(&[("geo", geo)]).send().await {
			Ok(_) => self.cookies_ready.store(true, Ordering::Release),
			Err(err) => tracing::warn!(error = %err, "Search-interest cookie warm-up failed."),
		}
	}

	async fn explore(&self, keyword: &str, geo: &str, time: &str) -> Result<Option<Widget>> {
		let url = format!("{}{}", self.cfg.api_base, self.cfg.explore_path);
		let req = serde_json::json!({
			"comparisonItem": [{ "keyword": keyword, "time": time, "geo": geo }],
			"category": 0,
			"property": "",
		});
		let res = self
			.client
			.get(&url)
			.query(&[
				("hl", self.cfg.host_language.clone()),
				("tz", self.cfg.tz_offset.to_string()),
				("req", req.to_string()),
			])
			.send()
			.await?;
		let text = crate::check_status(res)?.text().await?;

		parse_explore(&text)
	}

	async fn multiline(&self, widget: &Widget) -> Result<String> {
		let url = format!("{}{}", self.cfg.api_base, self.cfg.multiline_path);
		let res = self
			.client
			.get(&url)
			.query(&[
				("hl", self.cfg.host_language.clone()),
				("tz", self.cfg.tz_offset.to_string()),
				("req", widget.request.to_string()),
				("token", widget.token.clone()),
			])
			.send()
			.await?;

		Ok(crate::check_status(res)?.text().await?)
	}
}

#[derive(Debug, Clone, Deserialize)]
struct Widget {
	id: String,
	request: Value,
	token: String,
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
	#[serde(default)]
	widgets: Vec<Widget>,
}

fn timeframe_param(timeframe: Timeframe) -> Result<&'static str> {
	match timeframe {
		Timeframe::FiveYears => Ok("today 5-y"),
		Timeframe::TrailingMonth => Ok("today 1-m"),
		Timeframe::TrailingSevenDays => Ok("now 7-d"),
		other =>
			Err(Error::UnsupportedTimeframe { kind: SourceKind::SearchInterest, timeframe: other }),
	}
}

/// Drops the anti-hijacking prefix (`)]}'` and friends) in front of the JSON body.
fn strip_guard(text: &str) -> Result<&str> {
	let start = text.find('{').ok_or_else(|| Error::InvalidResponse {
		message: "Search-interest response carries no JSON object.".to_string(),
	})?;

	Ok(&text[start..])
}

fn parse_explore(text: &str) -> Result<Option<Widget>> {
	let parsed: ExploreResponse = serde_json::from_str(strip_guard(text)?)?;

	Ok(parsed.widgets.into_iter().find(|widget| widget.id == TIMESERIES_WIDGET))
}

fn parse_multiline(text: &str) -> Result<Vec<TimeSeriesPoint>> {
	let json: Value = serde_json::from_str(strip_guard(text)?)?;
	let Some(rows) = json
		.get("default")
		.and_then(|v| v.get("timelineData"))
		.and_then(|v| v.as_array())
	else {
		return Ok(Vec::new());
	};
	let mut points = Vec::with_capacity(rows.len());

	for row in rows {
		let seconds = row
			.get("time")
			.and_then(|v| v.as_str().and_then(|raw| raw.parse::<i64>().ok()).or_else(|| v.as_i64()))
			.ok_or_else(|| Error::InvalidResponse {
				message: "Timeline row is missing time.".to_string(),
			})?;
		let date = series::day_label_from_unix(seconds).ok_or_else(|| Error::InvalidResponse {
			message: format!("Timeline row time {seconds} is out of range."),
		})?;
		let score = row
			.get("value")
			.and_then(|v| v.as_array())
			.and_then(|values| values.first())
			.and_then(|v| v.as_f64())
			.ok_or_else(|| Error::InvalidResponse {
				message: format!("Timeline row {date} is missing a score."),
			})?;

		points.push(TimeSeriesPoint { date, value: score, normalized_value: None });
	}

	Ok(points)
}
