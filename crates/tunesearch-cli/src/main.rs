// SPDX-License-Identifier: GPL-3.0-or-later

mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_json::to_string_pretty;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tunesearch_client::{ContentResult, ItunesClient, LookupOutcome, SearchRequest, TracingLogger};
use tunesearch_config::{load as load_config, AppConfig, TelemetryConfig};

use crate::cli::{Cli, Command, LookupTarget};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.telemetry);

    let client = build_client(&config)?;
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(
        cancel.clone(),
        config.itunes.read_timeout(),
    ));

    let results = match cli.command {
        Command::Search(args) => {
            let request = SearchRequest::from(args);
            client.search(&cancel, &request).await?.results
        }
        Command::Lookup(args) => {
            let outcome = match args.into_target() {
                LookupTarget::Selector(request) => client.lookup_all(&cancel, &request).await?,
                LookupTarget::Urls(urls, base) => {
                    client.lookup_app_store_urls(&cancel, &urls, &base).await?
                }
            };
            return print_lookup(outcome);
        }
    };

    print_results(&results)
}

fn print_results(results: &[ContentResult]) -> Result<()> {
    println!("{}", to_string_pretty(results)?);
    Ok(())
}

/// Print whatever was found; missing items still make the command fail.
fn print_lookup(outcome: LookupOutcome) -> Result<()> {
    match outcome.into_result() {
        Ok(results) => print_results(&results),
        Err(partial) => {
            print_results(&partial.results)?;
            Err(anyhow!(partial.error)).context("lookup incomplete")
        }
    }
}

fn build_client(config: &AppConfig) -> Result<ItunesClient> {
    let itunes = &config.itunes;
    let mut builder = ItunesClient::builder()
        .timeout(itunes.timeout())
        .requests_per_minute(itunes.requests_per_minute)
        .max_retries(itunes.max_retries)
        .max_retry_wait(itunes.max_retry_wait())
        .logger(Arc::new(TracingLogger::new()));

    if let Some(base_url) = &itunes.base_url {
        builder = builder.base_url(base_url.clone());
    }

    Ok(builder.build()?)
}

fn init_tracing(telemetry: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    if telemetry.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Cancel in-flight work on Ctrl-C or once `read_timeout` elapses.
async fn cancel_on_shutdown(cancel: CancellationToken, read_timeout: Duration) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                warn!(target: "cli", %error, "failed to listen for ctrl-c");
                return;
            }
            info!(target: "cli", "interrupt received, cancelling");
        }
        _ = tokio::time::sleep(read_timeout) => {
            warn!(target: "cli", ?read_timeout, "read timeout elapsed, cancelling");
        }
    }
    cancel.cancel();
}
