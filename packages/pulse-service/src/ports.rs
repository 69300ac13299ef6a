//! Narrow seams between the pipeline and its collaborators. Production wiring lives in
//! [`Ports::from_config`]; tests substitute in-memory doubles.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::Value;

use pulse_config::Config;
use pulse_domain::{SourceKind, TimeSeriesPoint, Timeframe};
use pulse_providers::{MentionVolumeClient, SearchInterestClient};
use pulse_storage::{
	blobs::FsBlobStore,
	db::Db,
	documents::PgDocumentStore,
	models::{GrowthRate, ScoreRow},
	warehouse::PgWarehouse,
};

use crate::{ServiceError, ServiceResult};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait TimeSeriesSource
where
	Self: Send + Sync,
{
	fn kind(&self) -> SourceKind;

	/// Sleep enforced between consecutive terms.
	fn pacing(&self, _timeframe: Timeframe) -> Option<Duration> {
		None
	}

	/// `query` is already built for this source; `geo` is the translated parameter.
	fn fetch<'a>(
		&'a self,
		query: &'a str,
		geo: &'a str,
		timeframe: Timeframe,
	) -> BoxFuture<'a, pulse_providers::Result<Vec<TimeSeriesPoint>>>;
}

pub trait DocumentStore
where
	Self: Send + Sync,
{
	fn read<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, ServiceResult<Option<Value>>>;

	fn write<'a>(&'a self, topic: &'a str, body: &'a Value) -> BoxFuture<'a, ServiceResult<()>>;
}

pub trait BlobStore
where
	Self: Send + Sync,
{
	fn download<'a>(&'a self, key: &'a str) -> BoxFuture<'a, ServiceResult<Option<Vec<u8>>>>;

	fn upload<'a>(&'a self, key: &'a str, bytes: &'a [u8]) -> BoxFuture<'a, ServiceResult<()>>;
}

pub trait Warehouse
where
	Self: Send + Sync,
{
	fn insert_rows<'a>(&'a self, rows: &'a [ScoreRow]) -> BoxFuture<'a, ServiceResult<u64>>;

	fn growth_rates(&self, limit: u32) -> BoxFuture<'_, ServiceResult<Vec<GrowthRate>>>;
}

#[derive(Clone)]
pub struct Ports {
	pub mention_volume: Arc<dyn TimeSeriesSource>,
	pub search_interest: Arc<dyn TimeSeriesSource>,
	pub documents: Arc<dyn DocumentStore>,
	pub blobs: Arc<dyn BlobStore>,
	pub warehouse: Arc<dyn Warehouse>,
}
impl Ports {
	/// Connects to Postgres, bootstraps the schema and builds both source clients.
	pub async fn from_config(cfg: &Config) -> ServiceResult<Self> {
		let db = Db::connect(&cfg.storage.postgres).await.map_err(storage_error)?;

		db.ensure_schema(&cfg.storage.warehouse.scores_table).await.map_err(storage_error)?;

		let mention_volume = MentionVolumeClient::new(&cfg.sources.mention_volume)
			.map_err(|err| client_error(SourceKind::MentionVolume, err))?;
		let search_interest = SearchInterestClient::new(&cfg.sources.search_interest)
			.map_err(|err| client_error(SourceKind::SearchInterest, err))?;

		tracing::info!(
			collection = %cfg.storage.documents.collection,
			bucket = %cfg.storage.blobs.bucket,
			scores_table = %cfg.storage.warehouse.scores_table,
			"Ports initialized."
		);

		Ok(Self {
			mention_volume: Arc::new(mention_volume),
			search_interest: Arc::new(search_interest),
			documents: Arc::new(PgDocumentStore::new(
				db.pool.clone(),
				cfg.storage.documents.collection.as_str(),
			)),
			blobs: Arc::new(FsBlobStore::new(cfg.storage.blobs.bucket.as_str())),
			warehouse: Arc::new(PgWarehouse::new(
				db.pool,
				cfg.storage.warehouse.scores_table.as_str(),
				cfg.storage.warehouse.growth_table.as_str(),
			)),
		})
	}
}

impl TimeSeriesSource for MentionVolumeClient {
	fn kind(&self) -> SourceKind {
		SourceKind::MentionVolume
	}

	fn pacing(&self, timeframe: Timeframe) -> Option<Duration> {
		Some(self.pacing_delay(timeframe))
	}

	fn fetch<'a>(
		&'a self,
		query: &'a str,
		_geo: &'a str,
		timeframe: Timeframe,
	) -> BoxFuture<'a, pulse_providers::Result<Vec<TimeSeriesPoint>>> {
		Box::pin(MentionVolumeClient::fetch(self, query, timeframe))
	}
}

impl TimeSeriesSource for SearchInterestClient {
	fn kind(&self) -> SourceKind {
		SourceKind::SearchInterest
	}

	fn fetch<'a>(
		&'a self,
		query: &'a str,
		geo: &'a str,
		timeframe: Timeframe,
	) -> BoxFuture<'a, pulse_providers::Result<Vec<TimeSeriesPoint>>> {
		Box::pin(SearchInterestClient::fetch(self, query, geo, timeframe))
	}
}

impl DocumentStore for PgDocumentStore {
	fn read<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, ServiceResult<Option<Value>>> {
		Box::pin(async move { self.get(topic).await.map_err(storage_error) })
	}

	fn write<'a>(&'a self, topic: &'a str, body: &'a Value) -> BoxFuture<'a, ServiceResult<()>> {
		Box::pin(async move { self.put(topic, body).await.map_err(storage_error) })
	}
}

impl BlobStore for FsBlobStore {
	fn download<'a>(&'a self, key: &'a str) -> BoxFuture<'a, ServiceResult<Option<Vec<u8>>>> {
		Box::pin(async move { self.get(key).await.map_err(blob_error) })
	}

	fn upload<'a>(&'a self, key: &'a str, bytes: &'a [u8]) -> BoxFuture<'a, ServiceResult<()>> {
		Box::pin(async move { self.put(key, bytes).await.map_err(blob_error) })
	}
}

impl Warehouse for PgWarehouse {
	fn insert_rows<'a>(&'a self, rows: &'a [ScoreRow]) -> BoxFuture<'a, ServiceResult<u64>> {
		Box::pin(async move { self.insert_scores(rows).await.map_err(storage_error) })
	}

	fn growth_rates(&self, limit: u32) -> BoxFuture<'_, ServiceResult<Vec<GrowthRate>>> {
		Box::pin(async move { PgWarehouse::growth_rates(self, limit).await.map_err(storage_error) })
	}
}

fn storage_error(err: pulse_storage::Error) -> ServiceError {
	ServiceError::Storage { message: err.to_string() }
}

fn blob_error(err: pulse_storage::Error) -> ServiceError {
	match err {
		pulse_storage::Error::InvalidArgument(message) => ServiceError::InvalidRequest { message },
		err => ServiceError::Blob { message: err.to_string() },
	}
}

fn client_error(kind: SourceKind, err: pulse_providers::Error) -> ServiceError {
	ServiceError::ConfigurationMissing { message: format!("Failed to build the {kind} client: {err}") }
}
