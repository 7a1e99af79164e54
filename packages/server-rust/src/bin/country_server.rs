use anyhow::Result;
use clap::Parser;
use country_context_core::CountryContext;
use country_context_server::telemetry::init_tracing;
use country_context_server::{NetworkModule, ServerArgs};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    init_tracing(args.log_json)?;

    let table = args.country_table()?;
    let resolver = args.resolver()?;
    let context =
        country_context_core::install(CountryContext::new(args.context_config()?, table))?;
    info!(default_country = %context.default_country(), "country context installed");

    let mut module = NetworkModule::new(args.network_config()?, context, resolver);
    let port = module.start().await?;
    info!(port, "country server listening");

    module.serve(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C; shutting down");
    }
}
