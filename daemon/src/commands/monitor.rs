//! The `run` command: monitor until Ctrl-C.

use anyhow::Context;
use menuwatch_browser::ChromeLauncher;
use menuwatch_core::AppConfig;
use menuwatch_notify::{HttpAlertSink, HttpTabularSink};
use menuwatch_scheduler::ScrapeLoop;
use menuwatch_store::RecipientStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;

    let data_dir = config
        .data_dir()
        .context("could not determine data directory")?;
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("could not create {}", data_dir.display()))?;
    info!("Data directory: {}", data_dir.display());

    let timeout = config.sinks.request_timeout();
    let recipients = Arc::new(RecipientStore::in_dir(&data_dir));
    let alerts = Arc::new(HttpAlertSink::new(
        config.sinks.alert_url.clone(),
        config.sinks.alert_token.clone(),
        recipients,
        timeout,
    )?);
    if !alerts.is_configured() {
        warn!("alert sink credentials unset, expiry alerts are disabled");
    }

    let launcher = Arc::new(ChromeLauncher::new(config.browser.clone()));
    let mut scrape_loop = ScrapeLoop::new(&config, &data_dir, launcher, alerts);
    match config.sinks.tabular_url.as_deref() {
        Some(url) => {
            let sink = HttpTabularSink::new(url, timeout)?;
            scrape_loop = scrape_loop.with_tabular_sink(Arc::new(sink));
        }
        None => warn!("no tabular sink configured, snapshots are kept locally"),
    }

    scrape_loop
        .start()
        .await
        .context("failed to start the browser")?;

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                stopper.cancel();
            }
            Err(e) => warn!(error = %e, "could not listen for Ctrl-C"),
        }
    });

    scrape_loop.run(cancel).await;
    scrape_loop.shutdown().await;

    let status = scrape_loop.status().read().await;
    info!(
        total_scrapes = status.total_scrapes,
        scrape_errors = status.scrape_errors,
        logged_in = status.is_logged_in,
        "menuwatch stopped"
    );
    Ok(())
}
