use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// `YYYY-MM-DD`, the form dates are stored and compared in.
pub fn canonical_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// One listing-table row, as scraped. Consumed by the date normalizer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RawEventRow {
    pub title: String,
    pub organization: String,
    pub location: String,
    pub raw_date: String,
    pub url: Option<String>,
    pub description: String, // filled by the detail page, never by the listing
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventDate {
    Canonical(NaiveDate),
    Unparseable { raw: String },
}

impl EventDate {
    pub fn canonical(&self) -> Option<NaiveDate> {
        match self {
            EventDate::Canonical(date) => Some(*date),
            EventDate::Unparseable { .. } => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub title: String,
    pub organization: String,
    pub location: String,
    pub url: Option<String>,
    pub description: String,
    pub date: EventDate,
}

impl NormalizedEvent {
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.title, self.organization, self.location)
    }
}

/// A stored row. `event_id` is owned by the store; `(name, o_id, date)` is unique.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedEvent {
    pub event_id: i64,
    pub o_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub time: Option<NaiveTime>,
    pub people_needed: Option<i64>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub search_text: Option<String>,
}

/// Values written by one upsert. The store assigns `event_id`.
#[derive(Clone, Debug)]
pub struct EventUpsert {
    pub o_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub description: String,
    pub time: Option<NaiveTime>,
    pub people_needed: Option<i64>,
    pub location: String,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub search_text: String,
}
