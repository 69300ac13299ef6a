use std::sync::Arc;

use pulse_config::Config;
use pulse_service::{Ports, PulseService};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<PulseService>,
}
impl AppState {
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let ports = Ports::from_config(&config).await?;

		Ok(Self::with_ports(config, ports))
	}

	pub fn with_ports(config: Config, ports: Ports) -> Self {
		Self { service: Arc::new(PulseService::new(config, ports)) }
	}
}
