//! Legacy mention-volume flows driven by the entity catalog blob.

use time::OffsetDateTime;
use uuid::Uuid;

use pulse_domain::{GeoCode, RunMode, SourceKind, series::yesterday_label};

use crate::{
	PulseService, RunReport, ServiceResult,
	aggregate::{self, TermLabel},
	multiplex, require_qualifier, sinks,
};

impl PulseService {
	/// Full-history volume for every catalog term, written to `input/news_volume_initial.csv`.
	pub async fn news_initial(&self, topic_singular: &str) -> ServiceResult<RunReport> {
		let qualifier = require_qualifier(topic_singular)?;
		let run_id = Uuid::new_v4();
		let mode = RunMode::Initial;
		let timeframe = mode.timeframe(SourceKind::MentionVolume);
		let terms = self.load_catalog().await?.term_definitions();

		tracing::info!(%run_id, terms = terms.len(), "News initial run started.");

		let collection = multiplex::collect(
			self.ports.mention_volume.as_ref(),
			&terms,
			&[GeoCode::World],
			qualifier,
			timeframe,
		)
		.await?;
		let records = aggregate::mention_records(&collection.series, TermLabel::Normalized);

		self.ports
			.blobs
			.upload(sinks::NEWS_INITIAL_KEY, sinks::mention_csv(&records).as_bytes())
			.await?;

		tracing::info!(%run_id, records = records.len(), "News initial run finished.");

		Ok(RunReport {
			run_id,
			operation: "news_initial",
			mode,
			source: Some(SourceKind::MentionVolume),
			terms: collection.terms,
			geos: collection.geos,
			records: records.len(),
			outputs: vec![sinks::NEWS_INITIAL_KEY.to_string()],
		})
	}

	pub async fn news_latest(&self, topic_singular: &str) -> ServiceResult<RunReport> {
		self.news_latest_at(topic_singular, OffsetDateTime::now_utc()).await
	}

	/// Trailing-week volume filtered to the day before `now`, written to
	/// `input/news_volume_update.csv`.
	pub async fn news_latest_at(
		&self,
		topic_singular: &str,
		now: OffsetDateTime,
	) -> ServiceResult<RunReport> {
		let qualifier = require_qualifier(topic_singular)?;
		let run_id = Uuid::new_v4();
		let mode = RunMode::Latest;
		let timeframe = mode.timeframe(SourceKind::MentionVolume);
		let day = yesterday_label(now);
		let terms = self.load_catalog().await?.term_definitions();

		tracing::info!(%run_id, terms = terms.len(), day = %day, "News latest run started.");

		let collection = multiplex::collect(
			self.ports.mention_volume.as_ref(),
			&terms,
			&[GeoCode::World],
			qualifier,
			timeframe,
		)
		.await?;
		let records =
			aggregate::latest_mention_records(&collection.series, TermLabel::Normalized, &day);

		self.ports
			.blobs
			.upload(sinks::NEWS_UPDATE_KEY, sinks::mention_csv(&records).as_bytes())
			.await?;

		tracing::info!(%run_id, records = records.len(), "News latest run finished.");

		Ok(RunReport {
			run_id,
			operation: "news_latest",
			mode,
			source: Some(SourceKind::MentionVolume),
			terms: collection.terms,
			geos: collection.geos,
			records: records.len(),
			outputs: vec![sinks::NEWS_UPDATE_KEY.to_string()],
		})
	}
}
