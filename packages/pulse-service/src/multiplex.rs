use std::collections::HashSet;

use pulse_domain::{
	GeoCode, SourceKind, TermDefinition, TermTimeSeries, Timeframe,
	query::{build_keyword, build_query},
};

use crate::{ServiceError, ServiceResult, ports::TimeSeriesSource};

/// Series gathered by [`collect`], with the number of distinct terms and geos it visited.
#[derive(Debug, Clone, Default)]
pub struct Collection {
	pub series: Vec<TermTimeSeries>,
	pub terms: usize,
	pub geos: usize,
}

/// Fetches one series per (term, geo) pair, term-major then geo-minor, one call at a time.
///
/// Repeated terms (by raw name) and repeated geos are visited once, so a pair never appears twice.
/// The source's pacing delay is slept between consecutive terms. Any source failure aborts the
/// whole collection.
pub async fn collect(
	source: &dyn TimeSeriesSource,
	terms: &[TermDefinition],
	geos: &[GeoCode],
	qualifier: &str,
	timeframe: Timeframe,
) -> ServiceResult<Collection> {
	let kind = source.kind();

	if timeframe.source() != kind {
		return Err(ServiceError::invalid(format!(
			"Timeframe {timeframe:?} cannot be served by the {kind} source."
		)));
	}

	let terms = unique_terms(terms);
	let geos = unique_geos(geos);
	let pacing = source.pacing(timeframe).filter(|delay| !delay.is_zero());
	let mut out = Vec::with_capacity(terms.len() * geos.len());

	for (idx, term) in terms.iter().enumerate() {
		if idx > 0
			&& let Some(delay) = pacing
		{
			tokio::time::sleep(delay).await;
		}

		let query = query_for(kind, term, qualifier);

		for geo in &geos {
			let points = source
				.fetch(&query, geo.as_param(), timeframe)
				.await
				.map_err(|err| ServiceError::upstream(kind, err))?;

			tracing::debug!(
				source = %kind,
				term = %term.raw_name,
				geo = %geo,
				points = points.len(),
				"Series fetched."
			);

			out.push(TermTimeSeries { term: (*term).clone(), geo: geo.clone(), points });
		}
	}

	Ok(Collection { series: out, terms: terms.len(), geos: geos.len() })
}

/// Mention volume takes a URL-safe token query; search interest takes a plain keyword.
pub fn query_for(kind: SourceKind, term: &TermDefinition, qualifier: &str) -> String {
	match kind {
		SourceKind::MentionVolume => build_query(&term.normalized_name, qualifier),
		SourceKind::SearchInterest => build_keyword(&term.normalized_name, qualifier),
	}
}

fn unique_terms(terms: &[TermDefinition]) -> Vec<&TermDefinition> {
	let mut seen = HashSet::new();

	terms.iter().filter(|term| seen.insert(term.raw_name.as_str())).collect()
}

fn unique_geos(geos: &[GeoCode]) -> Vec<GeoCode> {
	let mut seen = HashSet::new();

	geos.iter().filter(|geo| seen.insert(*geo)).cloned().collect()
}
