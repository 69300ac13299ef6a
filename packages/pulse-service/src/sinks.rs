//! Flat text and row-batch forms of aggregated records, plus the fixed blob layout.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use pulse_domain::{InterestRecord, MentionRecord};
use pulse_storage::models::ScoreRow;

use crate::{ServiceError, ServiceResult};

pub const NEWS_INITIAL_KEY: &str = "input/news_volume_initial.csv";
pub const NEWS_UPDATE_KEY: &str = "input/news_volume_update.csv";
pub const TRENDS_INITIAL_KEY: &str = "input/trend_scores_initial.csv";
pub const TRENDS_UPDATE_KEY: &str = "input/trend_scores_update.csv";
pub const GROWTH_RATES_KEY: &str = "output/growth_rates.json";

const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// `term,date,value,normalizedValue` lines. No header, no trailing newline.
pub fn mention_csv(records: &[MentionRecord]) -> String {
	records
		.iter()
		.map(|record| {
			format!(
				"{},{},{},{}",
				text_field(&record.term),
				line_field(&record.date),
				record.value,
				record.normalized_value.map(|value| value.to_string()).unwrap_or_default()
			)
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// `geo,term,date,score` lines. No header, no trailing newline.
pub fn interest_csv(records: &[InterestRecord]) -> String {
	records
		.iter()
		.map(|record| {
			format!(
				"{},{},{},{}",
				text_field(&record.geo),
				text_field(&record.term),
				line_field(&record.date),
				record.score
			)
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// One warehouse row per record. Dates must be `YYYY-MM-DD`.
pub fn score_rows(records: &[InterestRecord]) -> ServiceResult<Vec<ScoreRow>> {
	records
		.iter()
		.map(|record| {
			let date = Date::parse(&record.date, DAY_FORMAT).map_err(|err| {
				ServiceError::Serialization {
					message: format!("Record date {:?} is not a calendar day: {err}.", record.date),
				}
			})?;

			Ok(ScoreRow {
				geo: record.geo.clone(),
				term: record.term.clone(),
				date,
				score: record.score,
			})
		})
		.collect()
}

/// Geos and terms lose their commas so the field count stays fixed.
fn text_field(value: &str) -> String {
	line_field(value).replace(',', "")
}

/// Line breaks become spaces so every record stays on one line.
fn line_field(value: &str) -> String {
	value.replace(['\r', '\n'], " ")
}
