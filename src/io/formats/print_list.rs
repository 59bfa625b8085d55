//! RoboForm HTML print lists.
//!
//! Every login is a `<table>`. Rows are classified by the CSS class of
//! their cells: `caption` holds the title, `subcaption` the url, a
//! `field`/`wordbreakfield` pair one form field (label colon dropped), and a
//! lone `wordbreakfield` a line of notes.

use crate::io::traits::{ImportSource, read_error};
use crate::models::RawRecord;
use crate::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::VecDeque;
use std::io::BufRead;

/// Selectors for the print-list cell classes.
struct Selectors {
    table: Selector,
    row: Selector,
    caption: Selector,
    subcaption: Selector,
    field: Selector,
    value: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            table: parse_selector("table")?,
            row: parse_selector("tr")?,
            caption: parse_selector(".caption")?,
            subcaption: parse_selector(".subcaption")?,
            field: parse_selector(".field")?,
            value: parse_selector(".wordbreakfield")?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::OperationFailed {
        operation: "parse_selector".to_string(),
        cause: format!("{css}: {e}"),
    })
}

/// HTML print-list import source.
///
/// The document is parsed up front; records are then handed out one by one.
pub struct PrintListImportSource {
    records: VecDeque<RawRecord>,
    total: usize,
}

impl PrintListImportSource {
    /// Parses the document and collects one record per login table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the document cannot be read.
    pub fn new<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut html = String::new();
        reader.read_to_string(&mut html).map_err(read_error)?;

        let selectors = Selectors::new()?;
        let document = Html::parse_document(&html);

        let mut records = VecDeque::new();
        let mut skipped = 0usize;
        for table in document.select(&selectors.table) {
            match table_to_record(records.len() + 1, table, &selectors) {
                Some(record) => records.push_back(record),
                None => skipped += 1,
            }
        }

        tracing::debug!(
            logins = records.len(),
            skipped_tables = skipped,
            "Parsed print list"
        );
        let total = records.len();
        Ok(Self { records, total })
    }
}

impl ImportSource for PrintListImportSource {
    fn next(&mut self) -> Result<Option<RawRecord>> {
        Ok(self.records.pop_front())
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.total)
    }
}

/// Reads one table; `None` when it holds no form fields.
fn table_to_record(
    index: usize,
    table: ElementRef<'_>,
    selectors: &Selectors,
) -> Option<RawRecord> {
    let mut title = None;
    let mut url = None;
    let mut fields = Vec::new();
    let mut note_lines = Vec::new();

    for row in table.select(&selectors.row) {
        let value = first_text(row, &selectors.value);
        if let Some(caption) = first_text(row, &selectors.caption) {
            title = Some(caption);
        } else if let Some(subcaption) = first_text(row, &selectors.subcaption) {
            url = Some(subcaption);
        } else if let Some(key) = first_text(row, &selectors.field) {
            fields.push((key.trim_end_matches(':').trim_end().to_string(), value));
        } else if let Some(line) = value {
            note_lines.push(line);
        }
    }

    if fields.is_empty() {
        return None;
    }

    let mut record = RawRecord::new(index)
        .with_title(title)
        .with_notes(Some(note_lines.join("\n")))
        .with_field("url", url);
    for (key, value) in fields {
        record.push_field(key, value);
    }
    Some(record)
}

fn first_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    row.select(selector)
        .next()
        .map(|cell| cell.text().collect::<String>().trim().to_string())
}
