//! Password Gorilla CSV.
//!
//! Columns are `uuid,group,title,url,user,password,notes`, looked up by
//! header name. Notes store line breaks as a literal `\n`.

use crate::io::traits::{ImportSource, csv_error};
use crate::models::RawRecord;
use crate::{Error, Result};
use std::io::BufRead;

/// Column positions resolved from the header row.
#[derive(Debug)]
struct Columns {
    group: Option<usize>,
    title: usize,
    url: Option<usize>,
    user: Option<usize>,
    password: Option<usize>,
    notes: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let title = find("title").ok_or_else(|| {
            Error::UnsupportedFormat("Gorilla export has no title column".to_string())
        })?;

        Ok(Self {
            group: find("group"),
            title,
            url: find("url"),
            user: find("user"),
            password: find("password"),
            notes: find("notes"),
        })
    }
}

/// Password Gorilla import source.
pub struct GorillaImportSource<R: BufRead> {
    reader: csv::Reader<R>,
    columns: Columns,
    index: usize,
}

impl<R: BufRead> GorillaImportSource<R> {
    /// Creates a new Gorilla import source.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be read or lacks a title column.
    pub fn new(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let columns = Columns::from_headers(reader.headers().map_err(|e| csv_error(e, 0))?)?;

        Ok(Self {
            reader,
            columns,
            index: 0,
        })
    }
}

impl<R: BufRead> ImportSource for GorillaImportSource<R> {
    fn next(&mut self) -> Result<Option<RawRecord>> {
        let mut row = csv::StringRecord::new();
        self.index += 1;
        if !self
            .reader
            .read_record(&mut row)
            .map_err(|e| csv_error(e, self.index))?
        {
            return Ok(None);
        }

        let cell = |column: Option<usize>| column.and_then(|i| row.get(i)).map(String::from);
        let columns = &self.columns;

        Ok(Some(
            RawRecord::new(self.index)
                .with_group(cell(columns.group))
                .with_title(cell(Some(columns.title)))
                .with_field("url", cell(columns.url))
                .with_field("user", cell(columns.user))
                .with_field("password", cell(columns.password))
                .with_notes(cell(columns.notes).map(|n| unescape_notes(&n))),
        ))
    }
}

/// Turns literal `\n` sequences back into line breaks and trims the result.
#[must_use]
pub fn unescape_notes(notes: &str) -> String {
    notes.replace("\\n", "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const EXPORT: &str = "uuid,group,title,url,user,password,notes\n\
        5d1b,Web,Forum,https://forum.example,bob,pw1,line one\\nline two \n\
        8c2e,Web,Forum-merged2019-01-0110:00:00,https://forum.example,bob,pw2,\n";

    #[test]
    fn test_reads_rows_without_uuid() {
        let mut source = GorillaImportSource::new(Cursor::new(EXPORT)).unwrap();
        let record = source.next().unwrap().unwrap();

        assert_eq!(record.group.as_deref(), Some("Web"));
        assert_eq!(record.title.as_deref(), Some("Forum"));
        assert_eq!(record.notes.as_deref(), Some("line one\nline two"));
        let keys: Vec<_> = record.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["url", "user", "password"]);
        assert!(!record.fields.iter().any(|f| f.value.as_deref() == Some("5d1b")));
    }

    #[test]
    fn test_keeps_merge_suffix_in_title() {
        let mut source = GorillaImportSource::new(Cursor::new(EXPORT)).unwrap();
        source.next().unwrap();
        let record = source.next().unwrap().unwrap();
        assert_eq!(
            record.title.as_deref(),
            Some("Forum-merged2019-01-0110:00:00")
        );
        assert!(record.notes.is_none());
        assert!(source.next().unwrap().is_none());
    }

    #[test]
    fn test_missing_title_column_is_unsupported() {
        let result = GorillaImportSource::new(Cursor::new("uuid,group,url\n"));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_unescape_notes() {
        assert_eq!(unescape_notes("a\\nb\\n"), "a\nb");
        assert_eq!(unescape_notes("plain"), "plain");
    }
}
