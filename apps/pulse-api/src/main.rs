use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = pulse_api::Args::parse();

	pulse_api::run(args).await
}
