pub mod document;
pub mod geo;
pub mod query;
pub mod series;
pub mod term;
pub mod timeframe;

pub use document::{CatalogEntry, DocumentTerm, EntityCatalog, TrendsDatum, TrendsDocument};
pub use geo::GeoCode;
pub use series::{InterestRecord, MentionRecord, TermTimeSeries, TimeSeriesPoint};
pub use term::TermDefinition;
pub use timeframe::{RunMode, SourceKind, Timeframe};
