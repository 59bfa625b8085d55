//! Enpass flat CSV.
//!
//! No header row is used: the first row is skipped and every following row
//! reads `title, key1, value1, key2, value2, ..., note`.

use crate::Result;
use crate::io::traits::{ImportSource, csv_error};
use crate::models::RawRecord;
use std::io::BufRead;

/// Flat key/value CSV import source.
pub struct KeyValueImportSource<R: BufRead> {
    reader: csv::Reader<R>,
    /// Data rows read so far.
    index: usize,
    header_skipped: bool,
}

impl<R: BufRead> KeyValueImportSource<R> {
    /// Creates a new key/value import source.
    #[must_use]
    pub fn new(reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        Self {
            reader,
            index: 0,
            header_skipped: false,
        }
    }

    fn read_row(&mut self, row: &mut csv::StringRecord) -> Result<bool> {
        self.reader
            .read_record(row)
            .map_err(|e| csv_error(e, self.index))
    }
}

impl<R: BufRead> ImportSource for KeyValueImportSource<R> {
    fn next(&mut self) -> Result<Option<RawRecord>> {
        let mut row = csv::StringRecord::new();

        if !self.header_skipped {
            self.header_skipped = true;
            if !self.read_row(&mut row)? {
                return Ok(None);
            }
        }

        self.index += 1;
        if !self.read_row(&mut row)? {
            return Ok(None);
        }

        Ok(Some(row_to_record(self.index, &row)))
    }
}

/// Splits a row into title, pairs and note.
fn row_to_record(index: usize, row: &csv::StringRecord) -> RawRecord {
    let cells: Vec<&str> = row.iter().collect();
    let (title, middle, note) = match cells.as_slice() {
        [] => (None, &[][..], None),
        [title] => (Some(*title), &[][..], None),
        [title, middle @ .., note] => (Some(*title), middle, Some(*note)),
    };

    let mut record = RawRecord::new(index)
        .with_title(title.map(String::from))
        .with_notes(note.map(String::from));

    let mut pairs = middle.chunks_exact(2);
    for pair in pairs.by_ref() {
        record.push_field(pair[0], Some(pair[1].to_string()));
    }
    if let [orphan] = pairs.remainder() {
        tracing::warn!(record = index, key = %orphan, "Ignoring key without a value");
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(input: &str) -> Vec<RawRecord> {
        let mut source = KeyValueImportSource::new(Cursor::new(input.to_string()));
        let mut records = Vec::new();
        while let Some(record) = source.next().unwrap() {
            records.push(record);
        }
        records
    }

    #[test]
    fn test_reads_title_pairs_and_note() {
        let records = read_all(
            "\"Title\",\"Field\",\"Value\",\"Field\",\"Value\",\"Note\"\n\
             \"GitHub\",\"Username\",\"octo\",\"Password\",\"hunter2\",\"recovery codes in safe\"\n",
        );

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.index, 1);
        assert_eq!(record.title.as_deref(), Some("GitHub"));
        assert_eq!(record.notes.as_deref(), Some("recovery codes in safe"));
        let pairs: Vec<_> = record
            .fields
            .iter()
            .map(|f| (f.key.as_str(), f.value.as_deref()))
            .collect();
        assert_eq!(
            pairs,
            vec![("Username", Some("octo")), ("Password", Some("hunter2"))]
        );
    }

    #[test]
    fn test_drops_unpaired_middle_cell() {
        let records = read_all("header\nWiki,Username,me,TOTP,\n");
        // TOTP has no value cell before the note.
        let record = &records[0];
        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.fields[0].key, "Username");
        assert!(record.notes.is_none());
    }

    #[test]
    fn test_title_only_row() {
        let records = read_all("header\nLonely\n");
        assert_eq!(records[0].title.as_deref(), Some("Lonely"));
        assert!(records[0].fields.is_empty());
    }

    #[test]
    fn test_header_only_file() {
        assert!(read_all("Title,Field,Value,Note\n").is_empty());
        assert!(read_all("").is_empty());
    }
}
