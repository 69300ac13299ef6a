pub mod mention_volume;
pub mod pacing;
pub mod search_interest;

mod error;

pub use error::{Error, Result};
pub use mention_volume::MentionVolumeClient;
pub use pacing::{Pacing, RetryPolicy};
pub use search_interest::SearchInterestClient;

use reqwest::Response;

/// Turns a non-success status into [`Error::Status`].
pub(crate) fn check_status(res: Response) -> Result<Response> {
	let status = res.status();

	if status.is_success() {
		return Ok(res);
	}

	Err(Error::Status { status: status.as_u16(), url: res.url().to_string() })
}
