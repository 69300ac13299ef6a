mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Blobs, Config, Documents, MentionVolumeSource, Pipeline, Postgres, RetrySettings,
	SearchInterestSource, Service, Sources, Storage, Warehouse,
};

use std::{env, fs, path::Path, sync::LazyLock};

use regex::Regex;

static GEO_CODE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(WORLD|[A-Z]{2}(-[A-Z0-9]{1,3})?)$").expect("Geo code pattern must compile.")
});
static TABLE_IDENT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*){0,2}$")
		.expect("Table identifier pattern must compile.")
});

/// Environment variable overriding `storage.blobs.bucket`.
pub const BUCKET_ENV: &str = "BUCKET_NAME";
/// Environment variable overriding `storage.warehouse.growth_table`.
pub const TABLE_ENV: &str = "TABLE_NAME";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	apply_overrides(&mut cfg, |key| env::var(key).ok());
	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

/// Applies deployment overrides. Blank values are ignored.
pub fn apply_overrides<F>(cfg: &mut Config, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(bucket) = lookup(BUCKET_ENV).filter(|value| !value.trim().is_empty()) {
		cfg.storage.blobs.bucket = bucket;
	}
	if let Some(table) = lookup(TABLE_ENV).filter(|value| !value.trim().is_empty()) {
		cfg.storage.warehouse.growth_table = table;
	}
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (key, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("storage.documents.collection", &cfg.storage.documents.collection),
		("storage.blobs.bucket", &cfg.storage.blobs.bucket),
		("storage.warehouse.scores_table", &cfg.storage.warehouse.scores_table),
		("storage.warehouse.growth_table", &cfg.storage.warehouse.growth_table),
		("sources.mention_volume.api_base", &cfg.sources.mention_volume.api_base),
		("sources.search_interest.api_base", &cfg.sources.search_interest.api_base),
		("pipeline.entity_catalog", &cfg.pipeline.entity_catalog),
	] {
		if value.trim().is_empty() {
			return Err(Error::Missing { key: key.to_string() });
		}
	}

	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, table) in [
		("storage.warehouse.scores_table", &cfg.storage.warehouse.scores_table),
		("storage.warehouse.growth_table", &cfg.storage.warehouse.growth_table),
	] {
		if !is_table_identifier(table) {
			return Err(Error::Validation {
				message: format!("{label} must be a plain or schema-qualified SQL identifier."),
			});
		}
	}

	if cfg.storage.warehouse.growth_limit == 0 {
		return Err(Error::Validation {
			message: "storage.warehouse.growth_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.sources.mention_volume.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "sources.mention_volume.timeout_ms must be greater than zero.".to_string(),
		});
	}

	let retry = &cfg.sources.search_interest.retry;

	if retry.connect_timeout_ms == 0 || retry.read_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "sources.search_interest.retry timeouts must be greater than zero."
				.to_string(),
		});
	}
	if !retry.backoff_factor.is_finite() || retry.backoff_factor < 0.0 {
		return Err(Error::Validation {
			message: "sources.search_interest.retry.backoff_factor must be a finite number, zero or greater."
				.to_string(),
		});
	}
	if cfg.pipeline.default_geos.is_empty() {
		return Err(Error::Validation {
			message: "pipeline.default_geos must be non-empty.".to_string(),
		});
	}

	for geo in &cfg.pipeline.default_geos {
		if !is_geo_code(geo) {
			return Err(Error::Validation {
				message: format!("pipeline.default_geos contains an invalid geo code {geo:?}."),
			});
		}
	}

	Ok(())
}

/// Accepts `WORLD` or a region code such as `US` or `US-CA`.
pub fn is_geo_code(value: &str) -> bool {
	GEO_CODE.is_match(value)
}

fn is_table_identifier(value: &str) -> bool {
	TABLE_IDENT.is_match(value)
}

fn normalize(cfg: &mut Config) {
	cfg.storage.blobs.bucket = cfg.storage.blobs.bucket.trim().to_string();
	cfg.storage.warehouse.scores_table = cfg.storage.warehouse.scores_table.trim().to_string();
	cfg.storage.warehouse.growth_table = cfg.storage.warehouse.growth_table.trim().to_string();

	for base in [
		&mut cfg.sources.mention_volume.api_base,
		&mut cfg.sources.search_interest.api_base,
	] {
		let trimmed = base.trim().trim_end_matches('/').to_string();

		*base = trimmed;
	}

	for geo in cfg.pipeline.default_geos.iter_mut() {
		*geo = geo.trim().to_ascii_uppercase();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn geo_code_pattern_accepts_world_and_regions() {
		for geo in ["WORLD", "US", "US-CA", "GB-ENG", "FR-75"] {
			assert!(is_geo_code(geo), "Expected {geo:?} to be accepted.");
		}
		for geo in ["", "world", "USA", "US-", "US-CALIF", "U S"] {
			assert!(!is_geo_code(geo), "Expected {geo:?} to be rejected.");
		}
	}

	#[test]
	fn table_pattern_accepts_up_to_three_parts() {
		for table in ["trend_scores", "analytics.growth_rates", "db.analytics.growth_rates"] {
			assert!(is_table_identifier(table), "Expected {table:?} to be accepted.");
		}
		for table in ["", "1scores", "a.b.c.d", "rates; DROP TABLE x", "analytics."] {
			assert!(!is_table_identifier(table), "Expected {table:?} to be rejected.");
		}
	}
}
