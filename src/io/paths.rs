//! Store paths: naming, sanitizing and collision handling.
//!
//! [`PathBuilder`] turns an [`InferredEntry`] into a [`CanonicalEntry`] with
//! a path of the form `[root/][notes/][group/]basename`. [`PathRegistry`]
//! then settles collisions across the whole run before anything is written.
//!
//! # Merge history
//!
//! Password Gorilla resolves sync conflicts by appending
//! `-merged<YYYY-MM-DD><HH:MM:SS>` to the title of one copy. Such an entry
//! belongs at the path of the title without the suffix:
//!
//! | Already in the family | Result |
//! |-----------------------|--------|
//! | nothing | merged entry takes the path |
//! | same payload | merged entry dropped, that copy takes the path |
//! | different payloads | merged entry takes the path, the rest renumber |
//!
//! A path family is the path plus its numbered variants (`Foo`, `Foo2`,
//! ...). A plain entry is dropped when its payload is already in the family
//! and otherwise takes the next numbered variant. Whenever a merged entry
//! takes the plain path, the other members are renumbered from 2 in the
//! order they arrived, so the layout does not depend on where in the export
//! the merged copy sits. With several merged copies of one title, the last
//! one holds the plain path.

use super::inference::InferredEntry;
use crate::config::{ImportConfig, NameField};
use crate::models::CanonicalEntry;
use crate::store::Payload;
use crate::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Title suffix left by a manual merge.
static MERGE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base>.+?)-merged\d{4}-\d{2}-\d{2} ?\d{2}:\d{2}:\d{2}$")
        .unwrap_or_else(|_| unreachable!())
});

/// Splits a merge suffix off a title.
///
/// Returns the title without the suffix, or `None` if it has none.
#[must_use]
pub fn strip_merge_suffix(title: &str) -> Option<&str> {
    MERGE_SUFFIX
        .captures(title.trim())
        .and_then(|c| c.name("base"))
        .map(|m| m.as_str())
}

/// Sanitizes one path segment.
///
/// Whitespace and path separators become `-`, the characters `[]()!?'"`
/// become `_`, control characters are dropped. A leading `-` becomes `_` so
/// the path is never read as an option by the store command. Returns `None`
/// when nothing usable is left (empty, `.` or `..`).
#[must_use]
pub fn sanitize_segment(raw: &str) -> Option<String> {
    let mut segment: String = raw
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('-'),
            '/' | '\\' => Some('-'),
            '[' | ']' | '(' | ')' | '!' | '?' | '\'' | '"' => Some('_'),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    if segment.starts_with('-') {
        segment.replace_range(..1, "_");
    }

    match segment.as_str() {
        "" | "." | ".." => None,
        _ => Some(segment),
    }
}

/// Sanitizes a `/`-separated prefix such as a root or a nested group.
///
/// Unusable parts are skipped.
fn sanitize_prefix(raw: &str) -> Vec<String> {
    raw.split('/').filter_map(sanitize_segment).collect()
}

/// Strips the scheme and trailing slashes off a url.
#[must_use]
pub fn url_basename(url: &str) -> &str {
    let url = url.trim();
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme.trim_end_matches('/')
}

/// An entry with its path, as produced by [`PathBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPath {
    /// The entry, path set.
    pub entry: CanonicalEntry,
    /// Whether the title carried merge history.
    pub merged: bool,
}

/// Derives store paths from inferred entries.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    root: Vec<String>,
    notes_prefix: Option<Vec<String>>,
    default_group: Option<String>,
    name: NameField,
}

impl PathBuilder {
    /// Creates a builder from the run configuration.
    #[must_use]
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            root: config.root.as_deref().map(sanitize_prefix).unwrap_or_default(),
            notes_prefix: config
                .features
                .notes_namespace
                .then(|| sanitize_prefix(&config.notes_prefix)),
            default_group: config.default_group.clone(),
            name: config.name,
        }
    }

    /// Builds the path of one entry.
    ///
    /// With `merge_history`, a `-merged<timestamp>` title suffix is dropped
    /// from the path and reported in [`BuiltPath::merged`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if neither title nor url yields a usable
    /// basename.
    pub fn build(&self, inferred: InferredEntry, merge_history: bool) -> Result<BuiltPath> {
        let mut title = inferred.title.as_deref();
        let mut merged = false;
        if merge_history && let Some(base) = title.and_then(strip_merge_suffix) {
            title = Some(base);
            merged = true;
        }

        let from_title = || title.and_then(sanitize_segment);
        let from_url = || {
            inferred
                .url
                .as_deref()
                .map(url_basename)
                .and_then(sanitize_segment)
        };
        let basename = match self.name {
            NameField::Title => from_title().or_else(from_url),
            NameField::Url => from_url().or_else(from_title),
        }
        .ok_or_else(|| Error::parse(inferred.label(), "no title or url to name the entry"))?;

        let mut entry = CanonicalEntry {
            path: String::new(),
            title: inferred.title,
            password: inferred.password,
            login: inferred.login,
            url: inferred.url,
            otp: inferred.otp,
            notes: inferred.notes,
            misc: inferred.misc,
        };

        let mut segments = self.root.clone();
        if !entry.has_password()
            && let Some(prefix) = &self.notes_prefix
        {
            segments.extend(prefix.iter().cloned());
        }
        if let Some(group) = inferred.group.as_deref().or(self.default_group.as_deref()) {
            segments.extend(sanitize_prefix(group));
        }
        segments.push(basename);
        entry.path = segments.join("/");

        Ok(BuiltPath { entry, merged })
    }
}

/// How the registry placed an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Placed at its own path.
    Added {
        /// Final path.
        path: String,
    },
    /// Dropped: the same payload is already registered under this path.
    Duplicate {
        /// Path of the entry it duplicates.
        path: String,
    },
    /// Merged entry took its path; the previous occupant moved.
    DisplacedExisting {
        /// Path the merged entry took.
        path: String,
        /// Where the previous occupant went.
        moved_to: String,
    },
    /// Path was taken; placed at a numbered variant.
    Suffixed {
        /// Final path.
        path: String,
    },
}

#[derive(Debug)]
struct Slot {
    /// Path before any numbering.
    family: String,
    /// Holds the plain path because of merge history.
    merged: bool,
    entry: CanonicalEntry,
    payload: Payload,
}

/// Collision bookkeeping for one run.
///
/// Entries come back out in first-registration order.
#[derive(Debug, Default)]
pub struct PathRegistry {
    slots: Vec<Slot>,
    by_path: HashMap<String, usize>,
    counters: HashMap<String, usize>,
}

impl PathRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registers an entry under `entry.path`.
    ///
    /// Paths already handed out may change when a later merged entry claims
    /// the family; only [`PathRegistry::into_entries`] gives final paths.
    pub fn register(
        &mut self,
        entry: CanonicalEntry,
        payload: Payload,
        merged: bool,
    ) -> Registration {
        let family = entry.path.clone();

        if let Some(copy) = self
            .slots
            .iter()
            .position(|s| s.family == family && s.payload == payload)
        {
            if merged && !self.slots[copy].merged {
                self.promote(&family, copy);
            }
            tracing::debug!(
                path = %family,
                existing = %self.slots[copy].entry.path,
                "Dropping duplicate entry"
            );
            return Registration::Duplicate {
                path: self.slots[copy].entry.path.clone(),
            };
        }

        let Some(&occupant) = self.by_path.get(&family) else {
            self.insert(family.clone(), merged, entry, payload);
            return Registration::Added { path: family };
        };

        if merged {
            let index = self.insert(family.clone(), true, entry, payload);
            self.promote(&family, index);
            let moved_to = self.slots[occupant].entry.path.clone();
            tracing::debug!(
                path = %family,
                moved_to = %moved_to,
                "Merged entry displaced occupant"
            );
            Registration::DisplacedExisting {
                path: family,
                moved_to,
            }
        } else {
            let numbered = self.next_numbered(&family);
            let mut entry = entry;
            entry.path.clone_from(&numbered);
            self.insert(family, false, entry, payload);
            Registration::Suffixed { path: numbered }
        }
    }

    /// Consumes the registry, returning entries in registration order.
    #[must_use]
    pub fn into_entries(self) -> Vec<(CanonicalEntry, Payload)> {
        self.slots
            .into_iter()
            .map(|slot| (slot.entry, slot.payload))
            .collect()
    }

    fn insert(
        &mut self,
        family: String,
        merged: bool,
        entry: CanonicalEntry,
        payload: Payload,
    ) -> usize {
        let index = self.slots.len();
        self.by_path.insert(entry.path.clone(), index);
        self.slots.push(Slot {
            family,
            merged,
            entry,
            payload,
        });
        index
    }

    /// Puts `head` at the plain path of `family` and renumbers the other
    /// members in arrival order.
    fn promote(&mut self, family: &str, head: usize) {
        let members: Vec<usize> = (0..self.slots.len())
            .filter(|&i| self.slots[i].family == family)
            .collect();
        for &i in &members {
            let path = &self.slots[i].entry.path;
            if self.by_path.get(path) == Some(&i) {
                self.by_path.remove(path);
            }
        }
        self.counters.remove(family);

        self.slots[head].merged = true;
        self.slots[head].entry.path = family.to_string();
        self.by_path.insert(family.to_string(), head);
        for i in members.into_iter().filter(|&i| i != head) {
            let path = self.next_numbered(family);
            self.slots[i].merged = false;
            self.slots[i].entry.path.clone_from(&path);
            self.by_path.insert(path, i);
        }
    }

    /// Next free `<family><n>` path, `n` starting at 2.
    fn next_numbered(&mut self, family: &str) -> String {
        let counter = self.counters.entry(family.to_string()).or_insert(2);
        loop {
            let candidate = format!("{family}{counter}");
            *counter += 1;
            if !self.by_path.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}
