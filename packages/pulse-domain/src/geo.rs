use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel meaning "no regional restriction".
pub const WORLD: &str = "WORLD";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeoCode {
	World,
	Region(String),
}
impl GeoCode {
	pub fn parse(raw: &str) -> Self {
		let trimmed = raw.trim();

		if trimmed == WORLD { Self::World } else { Self::Region(trimmed.to_string()) }
	}

	/// The value passed to a source. `WORLD` is always sent as the empty string.
	pub fn as_param(&self) -> &str {
		match self {
			Self::World => "",
			Self::Region(code) => code.as_str(),
		}
	}

	/// The label used in records and documents.
	pub fn label(&self) -> &str {
		match self {
			Self::World => WORLD,
			Self::Region(code) => code.as_str(),
		}
	}

	/// Whether `raw` is `WORLD` or an upper-case region code such as `US-CA`.
	pub fn is_well_formed(raw: &str) -> bool {
		pulse_config::is_geo_code(raw.trim())
	}

	pub fn parse_all<S>(raw: &[S]) -> Vec<Self>
	where
		S: AsRef<str>,
	{
		raw.iter().map(|geo| Self::parse(geo.as_ref())).collect()
	}
}

impl fmt::Display for GeoCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl Serialize for GeoCode {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.label())
	}
}

impl<'de> Deserialize<'de> for GeoCode {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		Ok(Self::parse(&raw))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn world_maps_to_empty_param() {
		assert_eq!(GeoCode::parse("WORLD").as_param(), "");
		assert_eq!(GeoCode::parse("WORLD").label(), "WORLD");
		assert_eq!(GeoCode::parse("US").as_param(), "US");
	}

	#[test]
	fn only_exact_sentinel_is_world() {
		assert_eq!(GeoCode::parse("world"), GeoCode::Region("world".to_string()));
	}
}
