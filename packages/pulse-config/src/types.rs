use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub sources: Sources,
	#[serde(default)]
	pub pipeline: Pipeline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	#[serde(default)]
	pub documents: Documents,
	pub blobs: Blobs,
	pub warehouse: Warehouse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Documents {
	/// Collection holding one document per topic.
	pub collection: String,
}
impl Default for Documents {
	fn default() -> Self {
		Self { collection: "trends".to_string() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Blobs {
	/// Bucket root directory. Overridden by `BUCKET_NAME`.
	pub bucket: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Warehouse {
	/// Append-only table receiving search-interest score rows.
	pub scores_table: String,
	/// Table or view read by the growth-rate extraction. Overridden by `TABLE_NAME`.
	pub growth_table: String,
	#[serde(default = "default_growth_limit")]
	pub growth_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sources {
	pub mention_volume: MentionVolumeSource,
	pub search_interest: SearchInterestSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MentionVolumeSource {
	pub api_base: String,
	pub path: String,
	#[serde(default = "default_mention_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_full_pacing_ms")]
	pub full_pacing_ms: u64,
	#[serde(default = "default_latest_pacing_ms")]
	pub latest_pacing_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchInterestSource {
	pub api_base: String,
	#[serde(default = "default_explore_path")]
	pub explore_path: String,
	#[serde(default = "default_multiline_path")]
	pub multiline_path: String,
	#[serde(default = "default_host_language")]
	pub host_language: String,
	/// Timezone offset in minutes, passed through as the `tz` parameter.
	#[serde(default = "default_tz_offset")]
	pub tz_offset: i32,
	#[serde(default)]
	pub retry: RetrySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
	pub max_retries: u32,
	pub connect_timeout_ms: u64,
	pub read_timeout_ms: u64,
	pub backoff_factor: f64,
	pub max_backoff_ms: u64,
}
impl Default for RetrySettings {
	fn default() -> Self {
		Self {
			max_retries: 8,
			connect_timeout_ms: 10_000,
			read_timeout_ms: 25_000,
			backoff_factor: 0.8,
			max_backoff_ms: 120_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Pipeline {
	/// Geos used by legacy runs when the entity catalog carries none.
	pub default_geos: Vec<String>,
	/// Blob key of the legacy entity catalog.
	pub entity_catalog: String,
}
impl Default for Pipeline {
	fn default() -> Self {
		Self {
			default_geos: vec!["WORLD".to_string()],
			entity_catalog: "output/topic_entities.json".to_string(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_growth_limit() -> u32 {
	1_000
}

fn default_mention_timeout_ms() -> u64 {
	30_000
}

fn default_full_pacing_ms() -> u64 {
	300
}

fn default_latest_pacing_ms() -> u64 {
	200
}

fn default_explore_path() -> String {
	"/trends/api/explore".to_string()
}

fn default_multiline_path() -> String {
	"/trends/api/widgetdata/multiline".to_string()
}

fn default_host_language() -> String {
	"en-US".to_string()
}

fn default_tz_offset() -> i32 {
	60
}
