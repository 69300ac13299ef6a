use pulse_storage::models::GrowthRate;

use crate::{PulseService, ServiceResult, sinks};

impl PulseService {
	/// Reads the growth view and mirrors the rows to `output/growth_rates.json`.
	pub async fn growth_rates(&self) -> ServiceResult<Vec<GrowthRate>> {
		let limit = self.cfg.storage.warehouse.growth_limit;
		let rows = self.ports.warehouse.growth_rates(limit).await?;
		let body = serde_json::to_vec(&rows)?;

		self.ports.blobs.upload(sinks::GROWTH_RATES_KEY, &body).await?;

		tracing::info!(rows = rows.len(), "Growth rates exported.");

		Ok(rows)
	}
}
