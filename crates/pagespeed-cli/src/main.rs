use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod run;

#[derive(Debug, Parser)]
#[command(name = "pagespeed-cli")]
#[command(about = "Fetch PageSpeed Insights reports and flatten them into CSV tables")]
struct Cli {
    /// JSON run configuration naming the URL list and output directory.
    #[arg(long)]
    config_file: PathBuf,

    /// Re-flatten a previously saved response file instead of fetching.
    #[arg(long)]
    from_response: Option<PathBuf>,

    /// Abort on the first row that cannot be extracted.
    #[arg(long)]
    strict: bool,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = pagespeed_core::load_run_config(&cli.config_file).with_context(|| {
        format!(
            "failed to load run config from {}",
            cli.config_file.display()
        )
    })?;
    init_tracing(&config.log_level);
    tracing::debug!(?config, "loaded run config");

    let options = run::RunOptions {
        from_response: cli.from_response,
        strict: cli.strict || config.strict,
    };
    run::run_pipeline(&config, &options).await
}
