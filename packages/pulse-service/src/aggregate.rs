//! Turns raw per-pair series into the records each run mode emits.

use pulse_domain::{InterestRecord, MentionRecord, TermDefinition, TermTimeSeries, TrendsDocument};

/// Which name a record carries for its term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermLabel {
	/// The name exactly as the caller stored it.
	Raw,
	/// The normalized name, leading space included.
	Normalized,
}
impl TermLabel {
	pub fn of(self, term: &TermDefinition) -> &str {
		match self {
			Self::Raw => &term.raw_name,
			Self::Normalized => &term.normalized_name,
		}
	}
}

/// One record per (term, date).
pub fn mention_records(series: &[TermTimeSeries], label: TermLabel) -> Vec<MentionRecord> {
	series
		.iter()
		.flat_map(|s| {
			s.points.iter().map(move |point| MentionRecord {
				term: label.of(&s.term).to_string(),
				date: point.date.clone(),
				value: point.value,
				normalized_value: point.normalized_value,
			})
		})
		.collect()
}

/// Keeps only points dated exactly `day`; terms without such a point are absent.
pub fn latest_mention_records(
	series: &[TermTimeSeries],
	label: TermLabel,
	day: &str,
) -> Vec<MentionRecord> {
	mention_records(series, label).into_iter().filter(|record| record.date == day).collect()
}

/// One record per (term, geo, date). Empty pairs contribute nothing.
pub fn interest_records(series: &[TermTimeSeries], label: TermLabel) -> Vec<InterestRecord> {
	series
		.iter()
		.flat_map(|s| {
			s.points
				.iter()
				.map(move |point| interest_record(s, label, point.date.as_str(), point.value))
		})
		.collect()
}

/// The last point the source returned for each pair, whatever its date.
pub fn refresh_records(series: &[TermTimeSeries], label: TermLabel) -> Vec<InterestRecord> {
	series
		.iter()
		.filter_map(|s| {
			s.points.last().map(|point| interest_record(s, label, point.date.as_str(), point.value))
		})
		.collect()
}

/// Appends each record onto its term's `data` list. Returns how many records found a term.
///
/// Prior entries are never replaced, so repeated refreshes accumulate.
pub fn merge_into_document(doc: &mut TrendsDocument, records: &[InterestRecord]) -> usize {
	records.iter().filter(|record| doc.append_datum(record)).count()
}

fn interest_record(
	series: &TermTimeSeries,
	label: TermLabel,
	date: &str,
	score: f64,
) -> InterestRecord {
	InterestRecord {
		geo: series.geo.label().to_string(),
		term: label.of(&series.term).to_string(),
		date: date.to_string(),
		score,
	}
}
