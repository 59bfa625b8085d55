//! 1Password Interchange Format.
//!
//! A `.1pif` file is a sequence of JSON objects separated by lines of the
//! form `***<uuid>***`. Each object is decoded on its own so one malformed
//! object only costs that record.

use crate::io::traits::{ImportSource, read_error};
use crate::models::RawRecord;
use crate::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashSet, VecDeque};
use std::io::BufRead;
use std::sync::LazyLock;

/// Separator line between objects.
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*\*.*\*\*\*$").unwrap_or_else(|_| unreachable!()));

/// Type name of login items; every other item type is skipped.
pub const WEB_FORM_TYPE: &str = "webforms.WebForm";

/// One object between separators, with the line it starts on.
#[derive(Debug)]
struct Chunk {
    first_line: usize,
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PifItem {
    #[serde(default)]
    type_name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    secure_contents: Option<SecureContents>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecureContents {
    #[serde(default)]
    fields: Option<Vec<PifField>>,
    #[serde(default)]
    notes_plain: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PifField {
    #[serde(default)]
    designation: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

/// 1PIF import source.
pub struct PifImportSource {
    chunks: VecDeque<Chunk>,
    total: usize,
    /// Objects consumed so far, including skipped ones.
    index: usize,
}

impl PifImportSource {
    /// Reads the whole file and splits it into objects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    pub fn new<R: BufRead>(reader: R) -> Result<Self> {
        let mut chunks = VecDeque::new();
        let mut current = Chunk {
            first_line: 1,
            text: String::new(),
        };

        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(read_error)?;
            if SEPARATOR.is_match(line.trim_end()) {
                push_chunk(&mut chunks, current);
                current = Chunk {
                    first_line: i + 2,
                    text: String::new(),
                };
            } else {
                current.text.push_str(&line);
                current.text.push('\n');
            }
        }
        push_chunk(&mut chunks, current);

        let total = chunks.len();
        tracing::debug!(objects = total, "Split 1PIF file");
        Ok(Self {
            chunks,
            total,
            index: 0,
        })
    }
}

fn push_chunk(chunks: &mut VecDeque<Chunk>, chunk: Chunk) {
    if !chunk.text.trim().is_empty() {
        chunks.push_back(chunk);
    }
}

impl ImportSource for PifImportSource {
    fn next(&mut self) -> Result<Option<RawRecord>> {
        while let Some(chunk) = self.chunks.pop_front() {
            self.index += 1;
            let item: PifItem = serde_json::from_str(&chunk.text).map_err(|e| {
                Error::parse(
                    format!("record {}", self.index),
                    format!(
                        "line {}, column {}: malformed 1PIF object ({:?} error)",
                        chunk.first_line + e.line().saturating_sub(1),
                        e.column(),
                        e.classify()
                    ),
                )
            })?;

            if let Some(record) = to_record(self.index, item) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.total)
    }
}

/// Converts a login item; anything else yields `None`.
fn to_record(index: usize, item: PifItem) -> Option<RawRecord> {
    if item.type_name.as_deref() != Some(WEB_FORM_TYPE) {
        tracing::debug!(
            record = index,
            type_name = item.type_name.as_deref().unwrap_or(""),
            "Skipping non-login item"
        );
        return None;
    }
    let contents = item.secure_contents?;
    let fields = contents.fields?;

    let mut record = RawRecord::new(index)
        .with_title(item.title)
        .with_notes(contents.notes_plain)
        .with_field("location", item.location);

    let mut seen = HashSet::new();
    for field in fields {
        let value = field.value.map(value_to_string);
        match (field.designation, field.name) {
            (Some(designation), _) if !designation.is_empty() => {
                if seen.insert(designation.clone()) {
                    record.push_field(designation, value);
                }
            },
            (_, Some(name)) if !name.is_empty() => record.push_field(name, value),
            _ => {},
        }
    }

    Some(record)
}

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
