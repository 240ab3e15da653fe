//! Fetch, persist and flatten pipeline driven by `main`.
//!
//! Fetch failures and unreadable reports never abort a run: dropped entries
//! and error rows are logged and the tables are still written.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local, TimeZone};
use pagespeed_client::store::RESPONSE_FILE_TIME_FORMAT;
use pagespeed_client::{Fetcher, PageSpeedClient, ReportStore, RetryPolicy};
use pagespeed_core::RunConfig;
use pagespeed_flatten::{flatten, ErrorPolicy, TableSchema};

#[derive(Debug, Default)]
pub(crate) struct RunOptions {
    pub(crate) from_response: Option<PathBuf>,
    pub(crate) strict: bool,
}

/// `<timestamp>-<table>.csv`, sharing the timestamp format of the response
/// file so every artifact of one run sorts together.
pub(crate) fn table_file_name<Tz>(at: &DateTime<Tz>, table: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}-{table}.csv", at.format(RESPONSE_FILE_TIME_FORMAT))
}

fn build_client(config: &RunConfig) -> anyhow::Result<PageSpeedClient> {
    let api_key = config.api_key.as_deref();
    let client = match config.base_url.as_deref() {
        Some(base_url) => {
            PageSpeedClient::with_base_url(api_key, config.request_timeout_secs, base_url)
        }
        None => PageSpeedClient::new(api_key, config.request_timeout_secs),
    };
    client.context("failed to build PageSpeed client")
}

async fn fetch_store(config: &RunConfig) -> anyhow::Result<ReportStore> {
    let specs = pagespeed_core::load_url_specs(&config.url_file).with_context(|| {
        format!("failed to load url list from {}", config.url_file.display())
    })?;
    tracing::info!(entries = specs.len(), "loaded url list");

    let policy = RetryPolicy::new(
        config.max_attempts,
        config.server_error_backoff_secs,
        config.other_error_backoff_secs,
    );
    let fetcher = Fetcher::new(build_client(config)?, policy);
    Ok(fetcher.fetch(&specs).await.into_store())
}

fn write_table<Tz>(
    store: &ReportStore,
    schema: TableSchema,
    fetched_at: &DateTime<Tz>,
    policy: ErrorPolicy,
    output_dir: &Path,
) -> anyhow::Result<()>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let table = flatten(store, schema, fetched_at, policy)
        .with_context(|| format!("failed to flatten {} table", schema.name()))?;
    let path = output_dir.join(table_file_name(fetched_at, schema.name()));
    table.save_csv(&path)?;
    Ok(())
}

/// Runs one full pass: fetch (or load) the report store, then write the
/// field and lab tables into `config.output_dir`.
///
/// # Errors
///
/// Returns an error if the url list or a saved response cannot be read, the
/// output directory cannot be created, a table cannot be written, or a row
/// fails to extract under the strict policy.
pub(crate) async fn run_pipeline(config: &RunConfig, options: &RunOptions) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let store = match &options.from_response {
        Some(path) => {
            tracing::info!(path = %path.display(), "re-flattening saved response");
            ReportStore::load(path)
                .with_context(|| format!("failed to load saved response {}", path.display()))?
        }
        None => fetch_store(config).await?,
    };

    // Taken once the store is complete; names every artifact of the run.
    let finished = Local::now();

    if options.from_response.is_none() {
        // A failed write loses the raw responses but not the tables.
        if let Err(e) = store.persist(&config.output_dir, &finished) {
            tracing::error!(error = %e, "failed to persist report store");
        }
    }

    let policy = ErrorPolicy::from_strict(options.strict);
    for schema in [TableSchema::Field(config.field_revision), TableSchema::Lab] {
        write_table(&store, schema, &finished, policy, &config.output_dir)?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
