use serde::{Deserialize, Serialize};

use pulse_domain::{DocumentTerm, GeoCode, TrendsDocument};

use crate::{PulseService, ServiceError, ServiceResult, check_term_name, require_topic};

/// Terms and geos of a topic. Absent fields read as empty lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermListing {
	pub terms: Vec<DocumentTerm>,
	pub geos: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TermUpdate {
	pub terms: Vec<DocumentTerm>,
	#[serde(default)]
	pub geos: Option<Vec<String>>,
}

impl PulseService {
	pub async fn list_terms(&self, topic: &str) -> ServiceResult<TermListing> {
		let topic = require_topic(topic)?;
		let doc = self.load_document(topic).await?.unwrap_or_default();

		Ok(listing(doc))
	}

	/// Replaces the term list wholesale, and the geo list when one is given.
	///
	/// Whole-document read-modify-write without a guard: a concurrent writer on the same topic
	/// can overwrite this change.
	pub async fn replace_terms(&self, topic: &str, update: TermUpdate) -> ServiceResult<TermListing> {
		let topic = require_topic(topic)?;

		validate_update(&update)?;

		let mut doc = self.load_document(topic).await?.unwrap_or_default();

		if doc.topic.is_none() {
			doc.topic = Some(topic.to_string());
		}

		doc.terms = Some(update.terms);

		if let Some(geos) = update.geos {
			doc.geos = Some(geos.iter().map(|geo| geo.trim().to_ascii_uppercase()).collect());
		}

		self.store_document(topic, &doc).await?;

		tracing::info!(
			topic,
			terms = doc.terms.as_ref().map(Vec::len).unwrap_or_default(),
			"Topic terms replaced."
		);

		Ok(listing(doc))
	}
}

fn listing(doc: TrendsDocument) -> TermListing {
	TermListing { terms: doc.terms.unwrap_or_default(), geos: doc.geos.unwrap_or_default() }
}

fn validate_update(update: &TermUpdate) -> ServiceResult<()> {
	for (idx, term) in update.terms.iter().enumerate() {
		check_term_name(&format!("terms[{idx}].name"), &term.name)?;
	}

	if let Some(geos) = update.geos.as_ref() {
		for (idx, geo) in geos.iter().enumerate() {
			if !GeoCode::is_well_formed(&geo.trim().to_ascii_uppercase()) {
				return Err(ServiceError::invalid(format!("geos[{idx}] is not a valid geo code.")));
			}
		}
	}

	Ok(())
}
