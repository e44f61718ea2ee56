pub mod config;
pub mod db;
pub mod models;
pub mod portal;
pub mod reconcile;
pub mod scraping;
mod utils;

use anyhow::{Context, Result};

use config::{Config, OrganizationId};
use db::Store;
use reconcile::{ReconcileOptions, ReconcileSummary};
use scraping::handson_html;
use scraping::render::{ChromeRenderer, PageRenderer};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub extracted: usize,
    pub upserted: usize,
    pub skipped: usize,
}

/// One harvest: log in, render the listing, extract, normalize, reconcile.
pub fn run(config: &Config) -> Result<RunSummary> {
    // The session is not handed to the renderer; rendering runs unauthenticated.
    let _session = match portal::login(config.credentials.as_ref()) {
        Ok(session) => Some(session),
        Err(err) => {
            tracing::warn!(error = %err, "portal login skipped");
            None
        }
    };

    let renderer = ChromeRenderer::new(config.render.clone(), handson_html::TABLE_SELECTOR_CSS);
    run_with(config, &renderer)
}

pub fn run_with(config: &Config, renderer: &dyn PageRenderer) -> Result<RunSummary> {
    let rows = scraping::scrape_listing(renderer, &config.listing_url);
    if rows.is_empty() {
        tracing::info!("no events this run");
        return Ok(RunSummary::default());
    }
    let extracted = rows.len();
    for row in &rows {
        if let Ok(json) = serde_json::to_string(row) {
            tracing::debug!(row = %json, "raw event");
        }
    }

    let events = scraping::normalize_rows(rows);

    let mut store = Store::open(&config.database_path).with_context(|| {
        format!("unable to open event store at {}", config.database_path.display())
    })?;
    if let OrganizationId::Fixed(o_id) = &config.organization_id {
        let existing = store
            .count_for_organization(o_id)
            .context("unable to count existing events")?;
        tracing::info!(o_id = %o_id, existing, "current events in database");
    }

    let ReconcileSummary { event_ids, skipped } =
        reconcile::reconcile(&mut store, &events, &ReconcileOptions::from(config))
            .context("event batch was not saved")?;

    Ok(RunSummary {
        extracted,
        upserted: event_ids.len(),
        skipped,
    })
}
