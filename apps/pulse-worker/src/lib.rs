use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use pulse_domain::RunMode;
use pulse_service::{InitialRequest, Ports, PulseService, RefreshRequest};

/// Runs a single ingestion mode to completion and prints its report as JSON.
#[derive(Debug, Parser)]
#[command(
	version = pulse_cli::VERSION,
	rename_all = "kebab",
	styles = pulse_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Full-history news volume for the entity catalog.
	NewsInitial {
		#[arg(long)]
		topic_singular: String,
	},
	/// Yesterday's news volume for the entity catalog.
	NewsLatest {
		#[arg(long)]
		topic_singular: String,
	},
	/// Trailing-month search interest for the entity catalog.
	TrendsLatest {
		#[arg(long)]
		topic_singular: String,
	},
	/// Five-year search interest for a topic, optionally overriding its terms and geos.
	TrendsInitial {
		topic: String,
		#[arg(long)]
		topic_singular: String,
		#[arg(long = "term", value_name = "TERM")]
		terms: Vec<String>,
		#[arg(long = "geo", value_name = "GEO")]
		geos: Vec<String>,
	},
	/// Five-year search interest for a topic's stored terms, appended to the warehouse.
	TrendsAll {
		topic: String,
		#[arg(long)]
		topic_singular: String,
	},
	/// Latest trailing-week score per pair, appended to the topic document.
	TrendsRefresh {
		topic: String,
		#[arg(long)]
		topic_singular: String,
	},
	/// Growth-rate export.
	GrowthRates,
}
impl Command {
	pub fn mode(&self) -> Option<RunMode> {
		match self {
			Self::NewsInitial { .. } | Self::TrendsInitial { .. } => Some(RunMode::Initial),
			Self::NewsLatest { .. } | Self::TrendsLatest { .. } => Some(RunMode::Latest),
			Self::TrendsAll { .. } => Some(RunMode::All),
			Self::TrendsRefresh { .. } => Some(RunMode::Refresh),
			Self::GrowthRates => None,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = pulse_config::load(&args.config)?;

	pulse_cli::init_tracing(&config.service.log_level);

	let ports = Ports::from_config(&config).await?;
	let service = PulseService::new(config, ports);
	let output = execute(&service, args.command).await?;

	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}

pub async fn execute(service: &PulseService, command: Command) -> color_eyre::Result<Value> {
	tracing::info!(mode = ?command.mode(), "Worker command started.");

	let output = match command {
		Command::NewsInitial { topic_singular } =>
			serde_json::to_value(service.news_initial(&topic_singular).await?)?,
		Command::NewsLatest { topic_singular } =>
			serde_json::to_value(service.news_latest(&topic_singular).await?)?,
		Command::TrendsLatest { topic_singular } =>
			serde_json::to_value(service.trends_latest(&topic_singular).await?)?,
		Command::TrendsInitial { topic, topic_singular, terms, geos } => {
			let req = InitialRequest {
				topic_singular,
				terms: (!terms.is_empty()).then_some(terms),
				geos: (!geos.is_empty()).then_some(geos),
			};

			serde_json::to_value(service.trends_initial(&topic, req).await?)?
		},
		Command::TrendsAll { topic, topic_singular } => serde_json::to_value(
			service.trends_all(&topic, RefreshRequest { topic_singular }).await?,
		)?,
		Command::TrendsRefresh { topic, topic_singular } => serde_json::to_value(
			service.trends_refresh(&topic, RefreshRequest { topic_singular }).await?,
		)?,
		Command::GrowthRates => serde_json::to_value(service.growth_rates().await?)?,
	};

	Ok(output)
}
