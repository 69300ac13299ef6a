//! Search-interest flows. `trends_latest` reads the legacy catalog; the rest are driven by the
//! topic document.

use serde::Deserialize;
use uuid::Uuid;

use pulse_domain::{
	GeoCode, InterestRecord, RunMode, SourceKind, TermDefinition, TrendsDocument,
};

use crate::{
	PulseService, RunReport, ServiceError, ServiceResult,
	aggregate::{self, TermLabel},
	check_term_name,
	multiplex::{self, Collection},
	require_qualifier, require_topic, sinks,
};

/// Body of an initial run. `terms` and `geos` override the stored document when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitialRequest {
	pub topic_singular: String,
	#[serde(default)]
	pub terms: Option<Vec<String>>,
	#[serde(default)]
	pub geos: Option<Vec<String>>,
}

/// Body of an all-history or refresh run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
	pub topic_singular: String,
}

impl PulseService {
	/// Trailing-month scores for every catalog term and geo, written to
	/// `input/trend_scores_update.csv`.
	pub async fn trends_latest(&self, topic_singular: &str) -> ServiceResult<RunReport> {
		let qualifier = require_qualifier(topic_singular)?;
		let catalog = self.load_catalog().await?;
		let terms = catalog.term_definitions();
		let geos = catalog.geo_codes(&self.cfg.pipeline.default_geos);
		let (collection, run_id) =
			self.collect_interest("trends_latest", RunMode::Latest, &terms, &geos, qualifier).await?;
		let records = aggregate::interest_records(&collection.series, TermLabel::Normalized);

		self.ports
			.blobs
			.upload(sinks::TRENDS_UPDATE_KEY, sinks::interest_csv(&records).as_bytes())
			.await?;

		Ok(self.finish(
			run_id,
			"trends_latest",
			RunMode::Latest,
			(collection.terms, collection.geos),
			records.len(),
			vec![sinks::TRENDS_UPDATE_KEY.to_string()],
		))
	}

	/// Five-year scores for the topic, written to `input/trend_scores_initial.csv` and the
	/// warehouse.
	pub async fn trends_initial(
		&self,
		topic: &str,
		req: InitialRequest,
	) -> ServiceResult<RunReport> {
		let topic = require_topic(topic)?;
		let qualifier = require_qualifier(&req.topic_singular)?;
		let doc = match (req.terms.is_some(), req.geos.is_some()) {
			(true, true) => None,
			_ => self.load_document(topic).await?,
		};
		let terms = match req.terms.as_ref() {
			Some(names) => override_terms(names)?,
			None => document_terms(topic, doc.as_ref())?,
		};
		let geos = match req.geos.as_ref() {
			Some(codes) => override_geos(codes)?,
			None => document_geos(topic, doc.as_ref())?,
		};
		let (collection, run_id) =
			self.collect_interest("trends_initial", RunMode::Initial, &terms, &geos, qualifier).await?;
		let records = aggregate::interest_records(&collection.series, TermLabel::Raw);
		let rows = sinks::score_rows(&records)?;

		self.ports
			.blobs
			.upload(sinks::TRENDS_INITIAL_KEY, sinks::interest_csv(&records).as_bytes())
			.await?;
		self.ports.warehouse.insert_rows(&rows).await?;

		Ok(self.finish(
			run_id,
			"trends_initial",
			RunMode::Initial,
			(collection.terms, collection.geos),
			records.len(),
			vec![
				sinks::TRENDS_INITIAL_KEY.to_string(),
				self.cfg.storage.warehouse.scores_table.clone(),
			],
		))
	}

	/// Five-year scores for the topic's stored terms and geos, appended to the warehouse.
	pub async fn trends_all(&self, topic: &str, req: RefreshRequest) -> ServiceResult<RunReport> {
		let topic = require_topic(topic)?;
		let qualifier = require_qualifier(&req.topic_singular)?;
		let doc = self.load_document(topic).await?;
		let terms = document_terms(topic, doc.as_ref())?;
		let geos = document_geos(topic, doc.as_ref())?;
		let (collection, run_id) =
			self.collect_interest("trends_all", RunMode::All, &terms, &geos, qualifier).await?;
		let records = aggregate::interest_records(&collection.series, TermLabel::Raw);
		let rows = sinks::score_rows(&records)?;

		self.ports.warehouse.insert_rows(&rows).await?;

		Ok(self.finish(
			run_id,
			"trends_all",
			RunMode::All,
			(collection.terms, collection.geos),
			records.len(),
			vec![self.cfg.storage.warehouse.scores_table.clone()],
		))
	}

	/// Appends the latest trailing-week score of every (term, geo) pair onto the term's `data`
	/// list and writes the document back once at the end.
	///
	/// Entries are never deduplicated or pruned, so repeated refreshes accumulate. The document is
	/// read and written without a guard; the last writer wins.
	pub async fn trends_refresh(
		&self,
		topic: &str,
		req: RefreshRequest,
	) -> ServiceResult<RunReport> {
		let topic = require_topic(topic)?;
		let qualifier = require_qualifier(&req.topic_singular)?;
		let doc = self.load_document(topic).await?;
		let terms = document_terms(topic, doc.as_ref())?;
		let geos = document_geos(topic, doc.as_ref())?;
		let mut doc = doc.unwrap_or_default();
		let (collection, run_id) =
			self.collect_interest("trends_refresh", RunMode::Refresh, &terms, &geos, qualifier).await?;
		let records: Vec<InterestRecord> =
			aggregate::refresh_records(&collection.series, TermLabel::Raw);
		let merged = aggregate::merge_into_document(&mut doc, &records);

		self.store_document(topic, &doc).await?;

		tracing::debug!(%run_id, topic, merged, "Refresh records appended.");

		Ok(self.finish(
			run_id,
			"trends_refresh",
			RunMode::Refresh,
			(collection.terms, collection.geos),
			records.len(),
			vec![format!("{}/{topic}", self.cfg.storage.documents.collection)],
		))
	}

	async fn collect_interest(
		&self,
		operation: &'static str,
		mode: RunMode,
		terms: &[TermDefinition],
		geos: &[GeoCode],
		qualifier: &str,
	) -> ServiceResult<(Collection, Uuid)> {
		let run_id = Uuid::new_v4();

		tracing::info!(
			%run_id,
			operation,
			terms = terms.len(),
			geos = geos.len(),
			"Search-interest run started."
		);

		let collection = multiplex::collect(
			self.ports.search_interest.as_ref(),
			terms,
			geos,
			qualifier,
			mode.timeframe(SourceKind::SearchInterest),
		)
		.await?;

		Ok((collection, run_id))
	}

	fn finish(
		&self,
		run_id: Uuid,
		operation: &'static str,
		mode: RunMode,
		(terms, geos): (usize, usize),
		records: usize,
		outputs: Vec<String>,
	) -> RunReport {
		tracing::info!(%run_id, operation, records, "Search-interest run finished.");

		RunReport {
			run_id,
			operation,
			mode,
			source: Some(SourceKind::SearchInterest),
			terms,
			geos,
			records,
			outputs,
		}
	}
}

fn document_terms(
	topic: &str,
	doc: Option<&TrendsDocument>,
) -> ServiceResult<Vec<TermDefinition>> {
	doc.and_then(TrendsDocument::term_definitions).ok_or_else(|| missing(topic, "terms"))
}

fn document_geos(topic: &str, doc: Option<&TrendsDocument>) -> ServiceResult<Vec<GeoCode>> {
	doc.and_then(TrendsDocument::geo_codes).ok_or_else(|| missing(topic, "geos"))
}

fn missing(topic: &str, field: &'static str) -> ServiceError {
	ServiceError::DocumentFieldMissing { topic: topic.to_string(), field }
}

fn override_terms(names: &[String]) -> ServiceResult<Vec<TermDefinition>> {
	for (idx, name) in names.iter().enumerate() {
		check_term_name(&format!("terms[{idx}]"), name)?;
	}

	Ok(names.iter().map(|name| TermDefinition::new(name.as_str())).collect())
}

fn override_geos(codes: &[String]) -> ServiceResult<Vec<GeoCode>> {
	let mut geos = Vec::with_capacity(codes.len());

	for (idx, code) in codes.iter().enumerate() {
		let code = code.trim().to_ascii_uppercase();

		if !GeoCode::is_well_formed(&code) {
			return Err(ServiceError::invalid(format!("geos[{idx}] is not a valid geo code.")));
		}

		geos.push(GeoCode::parse(&code));
	}

	Ok(geos)
}
