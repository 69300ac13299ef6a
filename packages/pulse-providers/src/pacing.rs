//! Inter-call pacing for the mention-volume source and retry/backoff for the search-interest
//! source.

use std::{future::Future, time::Duration};

use pulse_config::{MentionVolumeSource, RetrySettings};
use pulse_domain::Timeframe;

use crate::{Error, Result};

/// Fixed sleep between consecutive mention-volume terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
	pub full: Duration,
	pub latest: Duration,
}
impl Pacing {
	pub fn from_config(cfg: &MentionVolumeSource) -> Self {
		Self {
			full: Duration::from_millis(cfg.full_pacing_ms),
			latest: Duration::from_millis(cfg.latest_pacing_ms),
		}
	}

	pub fn delay_for(&self, timeframe: Timeframe) -> Duration {
		match timeframe {
			Timeframe::TrailingWeek => self.latest,
			_ => self.full,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
	pub max_retries: u32,
	pub connect_timeout: Duration,
	pub read_timeout: Duration,
	pub backoff_factor: f64,
	pub max_backoff: Duration,
}
impl RetryPolicy {
	pub fn from_config(cfg: &RetrySettings) -> Self {
		Self {
			max_retries: cfg.max_retries,
			connect_timeout: Duration::from_millis(cfg.connect_timeout_ms),
			read_timeout: Duration::from_millis(cfg.read_timeout_ms),
			backoff_factor: cfg.backoff_factor,
			max_backoff: Duration::from_millis(cfg.max_backoff_ms),
		}
	}

	/// Sleep before the `retry`-th retry (1-based): `backoff_factor * 2^(retry - 1)` seconds.
	pub fn delay_for_retry(&self, retry: u32) -> Duration {
		let exp = retry.max(1).saturating_sub(1).min(30);
		let seconds = self.backoff_factor * f64::from(1_u32 << exp);

		if !seconds.is_finite() || seconds <= 0.0 {
			return Duration::ZERO;
		}

		Duration::try_from_secs_f64(seconds).unwrap_or(self.max_backoff).min(self.max_backoff)
	}

	/// Runs `op` until it succeeds, fails with a permanent error, or retries run out.
	pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let mut retry = 0;

		loop {
			match op().await {
				Ok(value) => return Ok(value),
				Err(err) if err.is_transient() && retry < self.max_retries => {
					retry += 1;

					let delay = self.delay_for_retry(retry);

					tracing::warn!(
						error = %err,
						label,
						retry,
						delay_ms = delay.as_millis() as u64,
						"Transient upstream failure. Retrying."
					);
					tokio::time::sleep(delay).await;
				},
				Err(err) if err.is_transient() =>
					return Err(Error::RetriesExhausted {
						attempts: retry + 1,
						message: err.to_string(),
					}),
				Err(err) => return Err(err),
			}
		}
	}
}
