use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Historical window requested from a time-series source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
	/// Full history, mention-volume only.
	Unrestricted,
	/// Trailing week, mention-volume only.
	TrailingWeek,
	/// Five years of history, search-interest only.
	FiveYears,
	/// Trailing month, search-interest only.
	TrailingMonth,
	/// Trailing seven days, search-interest only.
	TrailingSevenDays,
}
impl Timeframe {
	pub fn source(self) -> SourceKind {
		match self {
			Self::Unrestricted | Self::TrailingWeek => SourceKind::MentionVolume,
			Self::FiveYears | Self::TrailingMonth | Self::TrailingSevenDays =>
				SourceKind::SearchInterest,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
	MentionVolume,
	SearchInterest,
}
impl SourceKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::MentionVolume => "mention_volume",
			Self::SearchInterest => "search_interest",
		}
	}
}

impl fmt::Display for SourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
	Initial,
	Latest,
	Refresh,
	All,
}
impl RunMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Initial => "initial",
			Self::Latest => "latest",
			Self::Refresh => "refresh",
			Self::All => "all",
		}
	}

	/// Window requested from `source` in this mode.
	pub fn timeframe(self, source: SourceKind) -> Timeframe {
		match (source, self) {
			(SourceKind::MentionVolume, Self::Latest) => Timeframe::TrailingWeek,
			(SourceKind::MentionVolume, _) => Timeframe::Unrestricted,
			(SourceKind::SearchInterest, Self::Initial | Self::All) => Timeframe::FiveYears,
			(SourceKind::SearchInterest, Self::Latest) => Timeframe::TrailingMonth,
			(SourceKind::SearchInterest, Self::Refresh) => Timeframe::TrailingSevenDays,
		}
	}
}

impl fmt::Display for RunMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for RunMode {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim() {
			"initial" => Ok(Self::Initial),
			"latest" => Ok(Self::Latest),
			"refresh" => Ok(Self::Refresh),
			"all" => Ok(Self::All),
			other => Err(format!("Unknown run mode {other:?}.")),
		}
	}
}
