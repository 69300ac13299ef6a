pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read config file at {path:?}.")]
	ReadConfig { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse config file at {path:?}.")]
	ParseConfig { path: std::path::PathBuf, source: toml::de::Error },
	/// A required bucket, table, or endpoint setting is absent or blank.
	#[error("Missing required setting {key}.")]
	Missing { key: String },
	#[error("{message}")]
	Validation { message: String },
}
