use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::base;
use crate::config::PORTAL_ORIGIN;
use crate::models::RawEventRow;

pub const TABLE_ID: &str = "datatable-search-opportunities-block";
pub const TABLE_SELECTOR_CSS: &str = "table#datatable-search-opportunities-block";

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(TABLE_SELECTOR_CSS).expect("handson table selector"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody > tr").expect("handson row selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("handson cell selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("handson link selector"));

const MIN_COLUMNS: usize = 4;

/// Reads the opportunities table out of a rendered search page.
///
/// Columns are title (with link), organization, location, date-and-time.
/// Rows with fewer than four cells are skipped; order follows the document.
pub fn parse_document(html: &str) -> Vec<RawEventRow> {
    let document = Html::parse_document(html);

    let Some(table) = document.select(&TABLE_SELECTOR).next() else {
        tracing::warn!(table = TABLE_ID, "events table not found on page");
        return Vec::new();
    };

    let mut rows = Vec::new();
    let mut seen = 0usize;
    for row in table.select(&ROW_SELECTOR) {
        seen += 1;
        match parse_row(row) {
            Some(event) => rows.push(event),
            None => tracing::debug!(row = seen, "skipping row with too few columns"),
        }
    }

    tracing::info!(rows = seen, events = rows.len(), "extracted listing rows");
    rows
}

fn parse_row(row: ElementRef<'_>) -> Option<RawEventRow> {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL_SELECTOR).collect();
    if cells.len() < MIN_COLUMNS {
        return None;
    }

    let url = base::absolute_url(
        PORTAL_ORIGIN,
        base::first_attr(&cells[0], &LINK_SELECTOR, "href"),
    );

    Some(RawEventRow {
        title: base::inner_text(cells[0]),
        organization: base::inner_text(cells[1]),
        location: base::inner_text(cells[2]),
        raw_date: base::inner_text(cells[3]),
        url,
        description: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r##"
    <html><body>
    <table id="other"><tbody><tr><td>a</td><td>b</td><td>c</td><td>d</td></tr></tbody></table>
    <table id="datatable-search-opportunities-block" class="table">
        <thead>
            <tr><th>Title</th><th>Organization</th><th>Location</th><th>Date</th></tr>
        </thead>
        <tbody>
            <tr>
                <td><a href="/opportunity/A123">Food <strong>Sorting</strong> Shift</a></td>
                <td>Second Harvest</td>
                <td> Nashville, TN </td>
                <td><span>6/5/24</span> <span>9:00 AM</span><a href="#">+ More</a></td>
            </tr>
            <tr>
                <td><a href="https://example.org/event/9">Park Cleanup</a></td>
                <td>Metro Parks</td>
                <td>Shelby Park</td>
                <td>6/8/2024 8:30 AM</td>
            </tr>
            <tr>
                <td>Short Row</td>
                <td>Nobody</td>
                <td>6/9/24 1:00 PM</td>
            </tr>
            <tr>
                <td>No Link Tutoring</td>
                <td>Library Foundation</td>
                <td>Main Library</td>
                <td>6/10/24 3:00 PM</td>
            </tr>
            <tr>
                <td><a href="/opportunity/B7">Meal Prep</a></td>
                <td>Nashville Food Project</td>
                <td>Kitchen</td>
                <td>next Tuesday</td>
                <td>extra column</td>
            </tr>
        </tbody>
    </table>
    </body></html>
    "##;

    #[test]
    fn extracts_rows_in_document_order() {
        let rows = parse_document(SAMPLE_HTML);
        assert_eq!(rows.len(), 4, "the three-cell row is skipped");

        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Food Sorting Shift", "Park Cleanup", "No Link Tutoring", "Meal Prep"]
        );

        let first = &rows[0];
        assert_eq!(first.organization, "Second Harvest");
        assert_eq!(first.location, "Nashville, TN");
        assert_eq!(first.raw_date, "6/5/24 9:00 AM + More");
        assert_eq!(first.description, "");
    }

    #[test]
    fn resolves_links_against_portal_origin() {
        let rows = parse_document(SAMPLE_HTML);
        assert_eq!(
            rows[0].url.as_deref(),
            Some("https://handson.unitedwaygreaternashville.org/opportunity/A123")
        );
        assert_eq!(rows[1].url.as_deref(), Some("https://example.org/event/9"));
        assert_eq!(rows[2].url, None);
    }

    #[test]
    fn extraction_is_repeatable() {
        assert_eq!(parse_document(SAMPLE_HTML), parse_document(SAMPLE_HTML));
    }

    #[test]
    fn missing_table_yields_nothing() {
        let html = "<html><body><p>Loading…</p></body></html>";
        assert!(parse_document(html).is_empty());
        assert!(parse_document("").is_empty());
    }

    #[test]
    fn rows_without_a_link_are_kept() {
        let rows = parse_document(SAMPLE_HTML);
        let tutoring = rows
            .iter()
            .find(|r| r.title == "No Link Tutoring")
            .expect("row without link");
        assert_eq!(tutoring.url, None);
        assert_eq!(tutoring.raw_date, "6/10/24 3:00 PM");
    }

    #[test]
    fn table_without_body_rows_yields_nothing() {
        let html = r#"<table id="datatable-search-opportunities-block"><thead><tr><th>x</th></tr></thead></table>"#;
        assert!(parse_document(html).is_empty());
    }
}
