const STRIPPED: [&str; 4] = [",", ".", " or ", " and "];
const STRIPPED_AFTER_HYPHEN: [&str; 2] = ["(", ")"];
const ALIAS_MARKER: &str = "aka";
const ENCODED_SPACE: &str = "%20";

/// Builds the URL-safe mention-volume query for a term scoped by `qualifier`.
///
/// Words that clean down to two characters or fewer are dropped. When nothing survives, the
/// query is the qualifier alone.
pub fn build_query(term: &str, qualifier: &str) -> String {
	let mut tokens: Vec<String> = term.split_whitespace().filter_map(clean_word).collect();
	let qualifier = qualifier.trim();

	if !qualifier.is_empty() {
		tokens.push(encode_spaces(qualifier));
	}

	tokens.join(ENCODED_SPACE)
}

/// Keyword sent to the search-interest source: the trimmed term, a space, then the qualifier.
pub fn build_keyword(term: &str, qualifier: &str) -> String {
	let term = term.trim();
	let qualifier = qualifier.trim();

	match (term.is_empty(), qualifier.is_empty()) {
		(true, _) => qualifier.to_string(),
		(false, true) => term.to_string(),
		(false, false) => format!("{term} {qualifier}"),
	}
}

fn clean_word(word: &str) -> Option<String> {
	let mut cleaned = word.to_lowercase();

	for pattern in STRIPPED {
		cleaned = cleaned.replace(pattern, "");
	}

	cleaned = cleaned.replace('-', " ");

	for pattern in STRIPPED_AFTER_HYPHEN {
		cleaned = cleaned.replace(pattern, "");
	}

	// Removing one marker can splice a new one together ("aakaka"), so strip to a fixed point.
	while cleaned.contains(ALIAS_MARKER) {
		cleaned = cleaned.replace(ALIAS_MARKER, "");
	}

	if cleaned.chars().count() > 2 { Some(encode_spaces(&cleaned)) } else { None }
}

fn encode_spaces(value: &str) -> String {
	value.replace(' ', ENCODED_SPACE)
}
