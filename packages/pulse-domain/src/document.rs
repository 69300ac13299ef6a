//! Persisted topic documents and the legacy entity catalog.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{geo::GeoCode, series::InterestRecord, term::TermDefinition};

/// One document per topic. `terms` and `geos` stay optional so an absent field can be told
/// apart from an empty one; unknown fields survive a read-modify-write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendsDocument {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub topic: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub terms: Option<Vec<DocumentTerm>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub geos: Option<Vec<String>>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl TrendsDocument {
	pub fn term_definitions(&self) -> Option<Vec<TermDefinition>> {
		self.terms
			.as_ref()
			.map(|terms| terms.iter().map(|term| TermDefinition::new(term.name.as_str())).collect())
	}

	pub fn geo_codes(&self) -> Option<Vec<GeoCode>> {
		self.geos.as_ref().map(|geos| GeoCode::parse_all(geos.as_slice()))
	}

	/// Appends `record` to the `data` list of every term named `record.term`.
	///
	/// Returns false when no term carries that name. Existing entries are never replaced.
	pub fn append_datum(&mut self, record: &InterestRecord) -> bool {
		let Some(terms) = self.terms.as_mut() else {
			return false;
		};
		let mut matched = false;

		for term in terms.iter_mut().filter(|term| term.name == record.term) {
			term.data.get_or_insert_with(Vec::new).push(TrendsDatum::from(record));

			matched = true;
		}

		matched
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTerm {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Vec<TrendsDatum>>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl DocumentTerm {
	pub fn named(name: impl Into<String>) -> Self {
		Self { name: name.into(), data: None, extra: Map::new() }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsDatum {
	pub name: String,
	pub geo: String,
	pub score: f64,
	pub last_update: String,
}
impl From<&InterestRecord> for TrendsDatum {
	fn from(record: &InterestRecord) -> Self {
		Self {
			name: record.term.clone(),
			geo: record.geo.clone(),
			score: record.score,
			last_update: record.date.clone(),
		}
	}
}

/// The legacy `output/topic_entities.json` blob.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityCatalog {
	pub terms: Vec<CatalogEntry>,
	#[serde(default)]
	pub geos: Option<Vec<String>>,
}
impl EntityCatalog {
	pub fn term_definitions(&self) -> Vec<TermDefinition> {
		self.terms.iter().map(|entry| TermDefinition::new(entry.name.as_str())).collect()
	}

	/// Catalog geos, or `fallback` when the catalog carries none.
	pub fn geo_codes(&self, fallback: &[String]) -> Vec<GeoCode> {
		match self.geos.as_ref() {
			Some(geos) => GeoCode::parse_all(geos.as_slice()),
			None => GeoCode::parse_all(fallback),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
	#[serde(rename = "Name")]
	pub name: String,
}
