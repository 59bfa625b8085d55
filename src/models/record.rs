//! Raw records as read from an export file.

/// One `key: value` pair of a raw record.
///
/// The value is `None` when the source had a key but no cell for it (short
/// CSV rows, missing JSON members).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    /// Key as named by the source, not normalized beyond what the parser does.
    pub key: String,
    /// Value, if any.
    pub value: Option<String>,
}

impl RawField {
    /// Creates a field.
    #[must_use]
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Returns the value when it is present and not blank.
    #[must_use]
    pub fn non_empty_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.trim().is_empty())
    }
}

/// One record read from an export file.
///
/// Parsers that know an entry's title, group or notes structurally (a
/// caption cell, a fixed column) fill the matching slot; everything else is
/// kept as ordered fields for inference. Keys may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    /// 1-based position of the record in its source, for error reporting.
    pub index: usize,
    /// Entry title, when the format has a dedicated slot for it.
    pub title: Option<String>,
    /// Folder or group, when the format has one.
    pub group: Option<String>,
    /// Free-text notes, when the format has a dedicated slot for them.
    pub notes: Option<String>,
    /// Remaining key/value pairs in source order.
    pub fields: Vec<RawField>,
}

impl RawRecord {
    /// Creates an empty record at the given source position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Sets the title, ignoring blank values.
    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = non_blank(title);
        self
    }

    /// Sets the group, ignoring blank values.
    #[must_use]
    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = non_blank(group);
        self
    }

    /// Sets the notes, ignoring blank values.
    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = non_blank(notes);
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.push_field(key, value);
        self
    }

    /// Appends a field in place.
    pub fn push_field(&mut self, key: impl Into<String>, value: Option<String>) {
        self.fields.push(RawField::new(key, value));
    }

    /// Label used in error reports before a path is known.
    #[must_use]
    pub fn label(&self) -> String {
        format!("record {}", self.index)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
