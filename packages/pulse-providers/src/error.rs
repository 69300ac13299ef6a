use pulse_domain::{SourceKind, Timeframe};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Upstream returned status {status} for {url}.")]
	Status { status: u16, url: String },
	#[error("The {kind} source does not support timeframe {timeframe:?}.")]
	UnsupportedTimeframe { kind: SourceKind, timeframe: Timeframe },
	#[error("Gave up after {attempts} attempts: {message}")]
	RetriesExhausted { attempts: u32, message: String },
}
impl Error {
	/// Connect failures, timeouts, throttling and gateway errors are worth another attempt.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Reqwest(err) => err.is_connect() || err.is_timeout(),
			Self::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
			_ => false,
		}
	}
}
