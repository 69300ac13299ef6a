use serde::Serialize;
use time::Date;

/// One warehouse score row. Dates are stored as calendar days.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreRow {
	pub geo: String,
	pub term: String,
	pub date: Date,
	pub score: f64,
}

/// One row of the growth-rate view, in the shape the web layer returns.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GrowthRate {
	pub name: String,
	pub date: Option<String>,
	pub growth_rate: Option<f64>,
	pub trends_growth: Option<f64>,
	pub news_growth: Option<f64>,
}
