pub mod base;
pub mod dates;
pub mod handson_html;
pub mod render;

use crate::models::{EventDate, NormalizedEvent, RawEventRow};
use render::PageRenderer;

/// Renders the listing page and extracts its rows. A failed render yields no rows.
pub fn scrape_listing(renderer: &dyn PageRenderer, url: &str) -> Vec<RawEventRow> {
    let html = render::render_or_empty(renderer, url);
    if html.is_empty() {
        return Vec::new();
    }
    handson_html::parse_document(&html)
}

pub fn normalize_row(row: RawEventRow) -> NormalizedEvent {
    let date = match dates::normalize_date(&row.raw_date) {
        Ok(date) => EventDate::Canonical(date),
        Err(_) => EventDate::Unparseable { raw: row.raw_date },
    };
    NormalizedEvent {
        title: row.title,
        organization: row.organization,
        location: row.location,
        url: row.url,
        description: row.description,
        date,
    }
}

pub fn normalize_rows(rows: Vec<RawEventRow>) -> Vec<NormalizedEvent> {
    rows.into_iter().map(normalize_row).collect()
}
