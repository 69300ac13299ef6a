use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDefinition {
	pub raw_name: String,
	/// Derived from `raw_name` by [`normalize`]. Carries a leading space and may be empty.
	pub normalized_name: String,
}
impl TermDefinition {
	pub fn new(raw_name: impl Into<String>) -> Self {
		let raw_name = raw_name.into();
		let normalized_name = normalize(&raw_name);

		Self { raw_name, normalized_name }
	}
}

/// Cleans a raw entity name into a search term.
///
/// Hyphens become spaces, pieces of two characters or fewer are dropped, and commas are
/// stripped from the pieces that remain. Every kept piece is prefixed with a single space, so a
/// non-empty result always starts with one.
pub fn normalize(raw_name: &str) -> String {
	let spaced = raw_name.replace('-', " ");
	let mut out = String::with_capacity(spaced.len() + 1);

	for piece in spaced.split_whitespace() {
		if piece.chars().count() > 2 {
			out.push(' ');
			out.push_str(&piece.replace(',', ""));
		}
	}

	out
}
