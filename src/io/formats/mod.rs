//! Format adapters for import.
//!
//! Each format implements [`ImportSource`]. [`Format::detect`] picks the
//! adapter from a file's extension and, where the extension is shared, its
//! first line.

pub mod delimited;
pub mod gorilla;
pub mod key_value;
pub mod pif;
pub mod print_list;

use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use super::traits::ImportSource;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Header-row delimited text (1Password `.txt`, generic CSV).
    Delimited,
    /// 1Password Interchange Format.
    Pif,
    /// RoboForm HTML print list.
    PrintList,
    /// Enpass flat CSV: title, key/value pairs, note.
    KeyValue,
    /// Password Gorilla CSV.
    Gorilla,
}

impl Format {
    /// Returns all supported formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Delimited,
            Self::Pif,
            Self::PrintList,
            Self::KeyValue,
            Self::Gorilla,
        ]
    }

    /// Returns the name accepted by `--format`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delimited => "delimited",
            Self::Pif => "1pif",
            Self::PrintList => "html",
            Self::KeyValue => "keyvalue",
            Self::Gorilla => "gorilla",
        }
    }

    /// Returns whether titles in this format may carry a
    /// `-merged<timestamp>` suffix left by manual conflict resolution.
    #[must_use]
    pub const fn encodes_merge_history(&self) -> bool {
        matches!(self, Self::Gorilla)
    }

    /// Detects the format from the file extension alone.
    ///
    /// `.csv` files resolve to [`Format::Delimited`] here; use
    /// [`Format::detect`] to tell the CSV dialects apart.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is not recognized.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match ext.as_deref() {
            Some("txt" | "csv" | "tsv") => Ok(Self::Delimited),
            Some("1pif") => Ok(Self::Pif),
            Some("html" | "htm") => Ok(Self::PrintList),
            Some(ext) => Err(Error::UnsupportedFormat(format!(
                "unsupported file extension: .{ext}"
            ))),
            None => Err(Error::UnsupportedFormat(
                "cannot determine format: file has no extension".to_string(),
            )),
        }
    }

    /// Detects the format from the extension and, for `.csv`, the header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for unknown extensions and
    /// [`Error::Io`] if a `.csv` file cannot be read.
    pub fn detect(path: &Path) -> Result<Self> {
        let format = Self::from_path(path)?;
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Ok(format);
        }

        let file = File::open(path).map_err(|e| Error::Io {
            context: path.display().to_string(),
            source: e,
        })?;
        let mut first_line = String::new();
        BufReader::new(file)
            .read_line(&mut first_line)
            .map_err(|e| Error::Io {
                context: path.display().to_string(),
                source: e,
            })?;

        Ok(Self::sniff_csv_header(&first_line))
    }

    /// Picks a CSV dialect from its header line.
    ///
    /// A leading `uuid` column means Password Gorilla, a `field`/`value`
    /// column means Enpass; anything else is a header-row CSV.
    #[must_use]
    pub fn sniff_csv_header(line: &str) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());
        let mut header = csv::StringRecord::new();
        if !reader.read_record(&mut header).unwrap_or(false) {
            return Self::Delimited;
        }

        let cells: Vec<String> = header.iter().map(|c| c.trim().to_lowercase()).collect();
        if cells.first().is_some_and(|c| c == "uuid") {
            Self::Gorilla
        } else if cells.iter().any(|c| c == "field" || c == "value") {
            Self::KeyValue
        } else {
            Self::Delimited
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "delimited" | "csv" | "txt" | "1password" => Ok(Self::Delimited),
            "1pif" | "pif" => Ok(Self::Pif),
            "html" | "roboform" | "printlist" => Ok(Self::PrintList),
            "keyvalue" | "key-value" | "enpass" => Ok(Self::KeyValue),
            "gorilla" => Ok(Self::Gorilla),
            _ => Err(Error::UnsupportedFormat(format!("unknown format: {s}"))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates an import source for the given format and reader.
///
/// # Errors
///
/// Returns an error if the source cannot read its header or detect its
/// delimiter.
pub fn create_import_source<R: BufRead + 'static>(
    reader: R,
    format: Format,
) -> Result<Box<dyn ImportSource>> {
    match format {
        Format::Delimited => Ok(Box::new(delimited::DelimitedImportSource::new(reader)?)),
        Format::Pif => Ok(Box::new(pif::PifImportSource::new(reader)?)),
        Format::PrintList => Ok(Box::new(print_list::PrintListImportSource::new(reader)?)),
        Format::KeyValue => Ok(Box::new(key_value::KeyValueImportSource::new(reader))),
        Format::Gorilla => Ok(Box::new(gorilla::GorillaImportSource::new(reader)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_case::test_case;

    #[test_case("export.txt", Format::Delimited)]
    #[test_case("EXPORT.TXT", Format::Delimited)]
    #[test_case("data.1pif", Format::Pif)]
    #[test_case("RoboForm Logins.html", Format::PrintList)]
    #[test_case("list.htm", Format::PrintList)]
    #[test_case("passwords.csv", Format::Delimited)]
    fn test_format_from_path(name: &str, expected: Format) {
        assert_eq!(Format::from_path(Path::new(name)).unwrap(), expected);
    }

    #[test]
    fn test_format_from_path_rejects_unknown() {
        let err = Format::from_path(Path::new("vault.kdbx")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert!(Format::from_path(Path::new("noextension")).is_err());
    }

    #[test_case("uuid,group,title,url,user,password,notes", Format::Gorilla)]
    #[test_case("\"Title\",\"Field\",\"Value\",\"Note\"", Format::KeyValue)]
    #[test_case("Group,Title,Username,Password,URL,Notes", Format::Delimited)]
    #[test_case("", Format::Delimited)]
    fn test_sniff_csv_header(line: &str, expected: Format) {
        assert_eq!(Format::sniff_csv_header(line), expected);
    }

    #[test]
    fn test_detect_reads_csv_header() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "uuid,group,title,url,user,password,notes").unwrap();
        assert_eq!(Format::detect(file.path()).unwrap(), Format::Gorilla);
    }

    #[test]
    fn test_format_from_str_roundtrips() {
        for format in Format::all() {
            assert_eq!(Format::from_str(format.as_str()).unwrap(), *format);
        }
        assert!(Format::from_str("kdbx").is_err());
    }

    #[test]
    fn test_only_gorilla_encodes_merge_history() {
        assert!(Format::Gorilla.encodes_merge_history());
        assert!(!Format::Delimited.encodes_merge_history());
        assert!(!Format::KeyValue.encodes_merge_history());
    }
}
