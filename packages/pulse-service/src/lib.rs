pub mod aggregate;
pub mod growth;
pub mod multiplex;
pub mod news;
pub mod ports;
pub mod sinks;
pub mod terms;
pub mod trends;

mod error;

pub use error::{ServiceError, ServiceResult};
pub use ports::{BlobStore, BoxFuture, DocumentStore, Ports, TimeSeriesSource, Warehouse};
pub use terms::{TermListing, TermUpdate};
pub use trends::{InitialRequest, RefreshRequest};

use serde::Serialize;
use uuid::Uuid;

use pulse_config::Config;
use pulse_domain::{EntityCatalog, RunMode, SourceKind, TrendsDocument};

/// Summary of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
	pub run_id: Uuid,
	pub operation: &'static str,
	pub mode: RunMode,
	pub source: Option<SourceKind>,
	pub terms: usize,
	pub geos: usize,
	pub records: usize,
	pub outputs: Vec<String>,
}

pub struct PulseService {
	pub cfg: Config,
	pub ports: Ports,
}
impl PulseService {
	pub fn new(cfg: Config, ports: Ports) -> Self {
		Self { cfg, ports }
	}

	/// Reads and parses the topic document. `None` when the topic has never been written.
	pub(crate) async fn load_document(&self, topic: &str) -> ServiceResult<Option<TrendsDocument>> {
		let Some(body) = self.ports.documents.read(topic).await? else {
			return Ok(None);
		};

		Ok(Some(serde_json::from_value(body)?))
	}

	pub(crate) async fn store_document(
		&self,
		topic: &str,
		doc: &TrendsDocument,
	) -> ServiceResult<()> {
		let body = serde_json::to_value(doc)?;

		self.ports.documents.write(topic, &body).await
	}

	/// Reads the legacy entity catalog blob that drives the GET-triggered flows.
	pub(crate) async fn load_catalog(&self) -> ServiceResult<EntityCatalog> {
		let key = self.cfg.pipeline.entity_catalog.as_str();
		let Some(bytes) = self.ports.blobs.download(key).await? else {
			return Err(ServiceError::Blob { message: format!("Entity catalog {key} is missing.") });
		};

		Ok(serde_json::from_slice(&bytes)?)
	}
}

pub(crate) fn require_topic(topic: &str) -> ServiceResult<&str> {
	let topic = topic.trim();

	if topic.is_empty() {
		return Err(ServiceError::invalid("topic must not be empty."));
	}

	Ok(topic)
}

/// Term names must be non-blank and free of control characters such as line breaks.
pub(crate) fn check_term_name(field: &str, name: &str) -> ServiceResult<()> {
	if name.trim().is_empty() {
		return Err(ServiceError::invalid(format!("{field} must not be empty.")));
	}
	if name.chars().any(char::is_control) {
		return Err(ServiceError::invalid(format!("{field} must not contain control characters.")));
	}

	Ok(())
}

pub(crate) fn require_qualifier(topic_singular: &str) -> ServiceResult<&str> {
	let qualifier = topic_singular.trim();

	if qualifier.is_empty() {
		return Err(ServiceError::invalid("topic_singular must not be empty."));
	}

	Ok(qualifier)
}
