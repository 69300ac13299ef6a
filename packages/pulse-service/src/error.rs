use pulse_domain::SourceKind;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	#[error("Configuration missing: {message}")]
	ConfigurationMissing { message: String },
	#[error("The {kind} source is unavailable: {message}")]
	UpstreamUnavailable { kind: SourceKind, message: String },
	#[error("Document {topic:?} has no {field} field.")]
	DocumentFieldMissing { topic: String, field: &'static str },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Blob error: {message}")]
	Blob { message: String },
	#[error("Serialization error: {message}")]
	Serialization { message: String },
}
impl ServiceError {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}

	/// Maps a source failure. An unsupported timeframe is a caller mistake, everything else is the
	/// upstream's.
	pub(crate) fn upstream(kind: SourceKind, err: pulse_providers::Error) -> Self {
		match err {
			pulse_providers::Error::UnsupportedTimeframe { .. } =>
				Self::InvalidRequest { message: err.to_string() },
			err => Self::UpstreamUnavailable { kind, message: err.to_string() },
		}
	}
}

impl From<serde_json::Error> for ServiceError {
	fn from(err: serde_json::Error) -> Self {
		Self::Serialization { message: err.to_string() }
	}
}

impl From<pulse_config::Error> for ServiceError {
	fn from(err: pulse_config::Error) -> Self {
		Self::ConfigurationMissing { message: err.to_string() }
	}
}
