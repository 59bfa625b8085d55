//! Header-row delimited text.
//!
//! Covers 1Password's comma or tab separated `.txt` exports and any CSV whose
//! first row names its columns (KeePassX, Chrome, ...). Column names become
//! record keys; field inference decides what they mean.

use crate::io::traits::{ImportSource, csv_error, read_error};
use crate::models::RawRecord;
use crate::{Error, Result};
use std::io::{BufRead, Chain, Cursor, Read};

/// Delimited text import source.
pub struct DelimitedImportSource<R: BufRead> {
    /// CSV reader over the sniffed first line followed by the rest.
    reader: csv::Reader<Chain<Cursor<Vec<u8>>, R>>,
    /// Normalized header keys.
    headers: Vec<String>,
    /// Data rows read so far.
    index: usize,
}

/// Picks the delimiter from the first line of the file.
///
/// A comma anywhere in the line wins; otherwise a tab; otherwise the file is
/// not delimited text.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] if the line has neither.
pub fn sniff_delimiter(first_line: &str) -> Result<u8> {
    if first_line.contains(',') {
        Ok(b',')
    } else if first_line.contains('\t') {
        Ok(b'\t')
    } else {
        Err(Error::UnsupportedFormat(
            "cannot detect delimiter: first line has neither a comma nor a tab".to_string(),
        ))
    }
}

/// Normalizes a header cell into a record key.
///
/// Lower-cases, trims, and collapses inner whitespace to `_`, so
/// `"Login Name"` becomes `login_name`.
#[must_use]
pub fn normalize_header(cell: &str) -> String {
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

impl<R: BufRead> DelimitedImportSource<R> {
    /// Creates a new delimited import source.
    ///
    /// # Errors
    ///
    /// Returns an error if the first line cannot be read or names no
    /// delimiter.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut first_line = String::new();
        let read = reader.read_line(&mut first_line).map_err(read_error)?;
        if read == 0 {
            return Err(Error::UnsupportedFormat(
                "empty file: expected a header row".to_string(),
            ));
        }
        let delimiter = sniff_delimiter(&first_line)?;
        tracing::debug!(delimiter = %char::from(delimiter).escape_default(), "Sniffed delimiter");

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(Cursor::new(first_line.into_bytes()).chain(reader));

        let headers = csv_reader
            .headers()
            .map_err(|e| csv_error(e, 0))?
            .iter()
            .map(normalize_header)
            .collect();

        Ok(Self {
            reader: csv_reader,
            headers,
            index: 0,
        })
    }

    /// Returns the normalized header keys.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl<R: BufRead> ImportSource for DelimitedImportSource<R> {
    fn next(&mut self) -> Result<Option<RawRecord>> {
        let mut row = csv::StringRecord::new();
        self.index += 1;

        let has_record = self
            .reader
            .read_record(&mut row)
            .map_err(|e| csv_error(e, self.index))?;
        if !has_record {
            return Ok(None);
        }

        let mut record = RawRecord::new(self.index);
        for (i, key) in self.headers.iter().enumerate() {
            record.push_field(key.clone(), row.get(i).map(String::from));
        }
        if row.len() > self.headers.len() {
            tracing::warn!(
                record = self.index,
                extra = row.len() - self.headers.len(),
                "Ignoring cells beyond the header"
            );
        }

        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str) -> Vec<RawRecord> {
        let mut source = DelimitedImportSource::new(Cursor::new(input.to_string())).unwrap();
        let mut records = Vec::new();
        while let Some(record) = source.next().unwrap() {
            records.push(record);
        }
        records
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("title,password\n").unwrap(), b',');
        assert_eq!(sniff_delimiter("title\tpassword\n").unwrap(), b'\t');
        assert_eq!(sniff_delimiter("title\t\"a,b\"\n").unwrap(), b',');
        assert!(matches!(
            sniff_delimiter("title password\n"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Title "), "title");
        assert_eq!(normalize_header("Login  Name"), "login_name");
        assert_eq!(normalize_header("URL"), "url");
    }

    #[test]
    fn test_comma_delimited_rows() {
        let records = read_all(
            "title,username,password,url,notes\n\
             Bank,alice,secret1,https://bank.example,Call before 5pm\n",
        );

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.index, 1);
        let keys: Vec<_> = record.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["title", "username", "password", "url", "notes"]);
        assert_eq!(record.fields[2].value.as_deref(), Some("secret1"));
    }

    #[test]
    fn test_tab_delimited_rows_keep_spaces() {
        let records = read_all("Title\tPassword\nMail\t two words \n");
        assert_eq!(records[0].fields[0].key, "title");
        assert_eq!(records[0].fields[1].value.as_deref(), Some(" two words "));
    }

    #[test]
    fn test_short_rows_have_absent_values() {
        let records = read_all("title,username,password\nSolo,bob\n");
        assert_eq!(records[0].fields[2].value, None);
    }

    #[test]
    fn test_empty_file_is_unsupported() {
        let result = DelimitedImportSource::new(Cursor::new(String::new()));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_invalid_utf8_is_a_record_failure() {
        let mut bytes = b"title,password\nok,1\n".to_vec();
        bytes.extend_from_slice(b"bad,\xff\xfe\n");
        bytes.extend_from_slice(b"fine,2\n");

        let mut source = DelimitedImportSource::new(Cursor::new(bytes)).unwrap();
        assert!(source.next().unwrap().is_some());
        let err = source.next().unwrap_err();
        assert!(err.is_record_level());
        let record = source.next().unwrap().unwrap();
        assert_eq!(record.fields[0].value.as_deref(), Some("fine"));
    }
}
