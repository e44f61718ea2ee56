use chrono::NaiveDate;
use thiserror::Error;

use crate::config::{Config, OrganizationId};
use crate::db::{self, Store, StoreError};
use crate::models::{EventUpsert, NormalizedEvent};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to persist event {name:?} ({committed} rows committed before the failure): {source}")]
    Persist {
        name: String,
        committed: usize,
        #[source]
        source: StoreError,
    },
    #[error("transaction failed ({committed} rows committed before the failure): {source}")]
    Transaction {
        committed: usize,
        #[source]
        source: StoreError,
    },
}

/// Attributes the listing page does not carry, applied to every record.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub organization_id: OrganizationId,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Records per transaction; 0 means one transaction for the whole batch.
    pub chunk_size: usize,
}

impl From<&Config> for ReconcileOptions {
    fn from(config: &Config) -> Self {
        Self {
            organization_id: config.organization_id.clone(),
            image_url: config.image_url.clone(),
            tags: config.tags.clone(),
            chunk_size: config.chunk_size,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// `event_id` of every upserted row, in input order.
    pub event_ids: Vec<i64>,
    pub skipped: usize,
}

impl ReconcileSummary {
    pub fn upserted(&self) -> usize {
        self.event_ids.len()
    }
}

/// Upserts `events` on their `(name, o_id, date)` key.
///
/// Records without a canonical date are logged and skipped. Everything else is
/// written inside a transaction per chunk; a database error rolls back the open
/// chunk and ends the batch.
pub fn reconcile(
    store: &mut Store,
    events: &[NormalizedEvent],
    options: &ReconcileOptions,
) -> Result<ReconcileSummary, ReconcileError> {
    let mut summary = ReconcileSummary::default();

    let mut pending = Vec::with_capacity(events.len());
    for event in events {
        match event.date.canonical() {
            Some(date) => pending.push(to_upsert(event, date, options)),
            None => {
                summary.skipped += 1;
                tracing::warn!(
                    title = %event.title,
                    date = ?event.date,
                    "skipping event with invalid date"
                );
            }
        }
    }

    let chunk_size = if options.chunk_size == 0 {
        pending.len().max(1)
    } else {
        options.chunk_size
    };

    for chunk in pending.chunks(chunk_size) {
        let committed = summary.event_ids.len();
        let tx = store
            .transaction()
            .map_err(|source| ReconcileError::Transaction { committed, source })?;

        let mut chunk_ids = Vec::with_capacity(chunk.len());
        for upsert in chunk {
            // Returning early drops `tx`, which rolls the chunk back.
            let event_id = db::upsert_event(&tx, upsert).map_err(|source| {
                tracing::error!(name = %upsert.name, error = %source, "error inserting event; rolling back");
                ReconcileError::Persist {
                    name: upsert.name.clone(),
                    committed,
                    source,
                }
            })?;
            tracing::info!(event_id, name = %upsert.name, "inserted/updated event");
            chunk_ids.push(event_id);
        }

        tx.commit().map_err(|err| {
            tracing::error!(error = %err, "commit failed");
            ReconcileError::Transaction {
                committed,
                source: StoreError::from(err),
            }
        })?;
        summary.event_ids.extend(chunk_ids);
    }

    tracing::info!(
        upserted = summary.upserted(),
        skipped = summary.skipped,
        "reconciled events"
    );
    Ok(summary)
}

fn to_upsert(event: &NormalizedEvent, date: NaiveDate, options: &ReconcileOptions) -> EventUpsert {
    EventUpsert {
        o_id: options.organization_id.resolve(&event.organization),
        name: event.title.clone(),
        date,
        description: event.description.clone(),
        time: None,
        people_needed: None,
        location: event.location.clone(),
        image_url: options.image_url.clone(),
        tags: options.tags.clone(),
        search_text: event.search_text(),
    }
}
