//! Field inference: raw keys onto the canonical entry schema.
//!
//! Which key means what is pure data in [`FIELD_TABLE`]. Each canonical
//! field lists its accepted key names in priority order; matching ignores
//! case. The first name in the list that some record key carries (with a
//! non-blank value) wins; record order breaks ties. A rule may also carry a
//! fallback predicate, consulted only when no listed name matched.
//!
//! Whatever no rule claims is kept as a misc attribute, unless its value
//! repeats a claimed credential or the noise filter drops its key.

use crate::config::FeatureFlags;
use crate::models::RawRecord;

/// Canonical fields that inference can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    /// The secret.
    Password,
    /// Username or email.
    Login,
    /// Site address.
    Url,
    /// One-time-password seed.
    Otp,
    /// Entry title, when the parser had no slot for it.
    Title,
    /// Folder or group, when the parser had no slot for it.
    Group,
    /// Notes, when the parser had no slot for them.
    Notes,
}

/// One row of the inference table.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Field this rule fills.
    pub field: CanonicalField,
    /// Accepted key names, lower-case, highest priority first.
    pub names: &'static [&'static str],
    /// Predicate on the key, tried when no name matched.
    pub fallback: Option<fn(&str) -> bool>,
}

/// The inference table, in claiming order.
pub const FIELD_TABLE: &[FieldRule] = &[
    FieldRule {
        field: CanonicalField::Password,
        names: &[
            "password",
            "pass",
            ".pw1",
            "regpassword",
            "logonpassword",
            "pwd",
            "passwd",
            "password_value",
        ],
        fallback: Some(looks_like_password),
    },
    FieldRule {
        field: CanonicalField::Login,
        names: &[
            "login",
            "username",
            "loginuser",
            "user",
            "userid",
            "uid",
            "email",
            "emailaddress",
            "regemail",
            "user[email]",
            "username_value",
        ],
        fallback: None,
    },
    FieldRule {
        field: CanonicalField::Url,
        names: &["url", "location", "website", "origin_url", "uri"],
        fallback: None,
    },
    FieldRule {
        field: CanonicalField::Otp,
        names: &["totp"],
        fallback: None,
    },
    FieldRule {
        field: CanonicalField::Title,
        names: &["title", "name"],
        fallback: None,
    },
    FieldRule {
        field: CanonicalField::Group,
        names: &["group", "grouping", "folder"],
        fallback: None,
    },
    FieldRule {
        field: CanonicalField::Notes,
        names: &["notes", "note", "extra", "comments"],
        fallback: None,
    },
];

/// Substrings that mark a misc key as browser autofill noise.
pub const NOISE_MARKERS: &[&str] = &[
    "remember",
    "persistent",
    "tos",
    "captcha",
    "submit",
    "scope",
    "confirm",
];

/// Password fallback: any key mentioning `pass`, except old passwords.
///
/// Keys starting with `o` are excluded too (`opass`, `oldpass`).
#[must_use]
pub fn looks_like_password(key: &str) -> bool {
    let key = key.to_lowercase();
    key.contains("pass") && !key.starts_with('o') && !key.contains("old")
}

/// Returns whether a misc key is autofill noise.
#[must_use]
pub fn is_noise(key: &str) -> bool {
    let key = key.trim().to_lowercase();
    key.is_empty() || key.starts_with("html") || NOISE_MARKERS.iter().any(|m| key.contains(m))
}

/// A record after inference, before it has a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferredEntry {
    /// Position of the record in its source.
    pub index: usize,
    /// Title.
    pub title: Option<String>,
    /// Group.
    pub group: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Login.
    pub login: Option<String>,
    /// Url.
    pub url: Option<String>,
    /// One-time-password seed.
    pub otp: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Unclaimed attributes in source order, keys unique.
    pub misc: Vec<(String, String)>,
}

impl InferredEntry {
    /// Label used in error reports before a path is known.
    #[must_use]
    pub fn label(&self) -> String {
        format!("record {}", self.index)
    }

    fn slot(&mut self, field: CanonicalField) -> &mut Option<String> {
        match field {
            CanonicalField::Password => &mut self.password,
            CanonicalField::Login => &mut self.login,
            CanonicalField::Url => &mut self.url,
            CanonicalField::Otp => &mut self.otp,
            CanonicalField::Title => &mut self.title,
            CanonicalField::Group => &mut self.group,
            CanonicalField::Notes => &mut self.notes,
        }
    }
}

/// Maps raw records onto the canonical schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldInference {
    noise_filter: bool,
}

impl FieldInference {
    /// Creates an inference step.
    #[must_use]
    pub const fn new(noise_filter: bool) -> Self {
        Self { noise_filter }
    }

    /// Creates an inference step from feature flags.
    #[must_use]
    pub const fn from_features(features: &FeatureFlags) -> Self {
        Self::new(features.noise_filter)
    }

    /// Infers the canonical fields of one record.
    #[must_use]
    pub fn infer(&self, record: &RawRecord) -> InferredEntry {
        let mut entry = InferredEntry {
            index: record.index,
            title: record.title.clone(),
            group: record.group.clone(),
            notes: record.notes.clone(),
            ..InferredEntry::default()
        };
        let mut claimed = vec![false; record.fields.len()];

        for rule in FIELD_TABLE {
            let slot = entry.slot(rule.field);
            if slot.is_some() {
                continue;
            }
            if let Some(i) = select(record, rule, &claimed) {
                claimed[i] = true;
                *slot = record.fields[i].value.clone();
            }
        }

        let credentials = [&entry.password, &entry.login, &entry.url, &entry.otp];
        let mut misc: Vec<(String, String)> = Vec::new();
        for (field, _) in record
            .fields
            .iter()
            .zip(&claimed)
            .filter(|(_, claimed)| !**claimed)
        {
            let Some(value) = field.non_empty_value() else {
                continue;
            };
            if credentials.iter().any(|c| c.as_deref() == Some(value)) {
                continue;
            }
            if self.noise_filter && is_noise(&field.key) {
                tracing::debug!(
                    record = record.index,
                    key = %field.key,
                    "Filtered noise attribute"
                );
                continue;
            }
            if misc.iter().any(|(k, _)| k == &field.key) {
                continue;
            }
            misc.push((field.key.clone(), value.to_string()));
        }
        entry.misc = misc;

        tracing::debug!(
            record = record.index,
            has_password = entry.password.is_some(),
            has_login = entry.login.is_some(),
            misc = entry.misc.len(),
            "Inferred fields"
        );
        entry
    }
}

/// Picks the record field a rule claims, if any.
fn select(record: &RawRecord, rule: &FieldRule, claimed: &[bool]) -> Option<usize> {
    let candidates = || {
        record
            .fields
            .iter()
            .enumerate()
            .filter(|(i, f)| !claimed[*i] && f.non_empty_value().is_some())
    };

    rule.names
        .iter()
        .find_map(|name| {
            candidates()
                .find(|(_, f)| f.key.trim().eq_ignore_ascii_case(name))
                .map(|(i, _)| i)
        })
        .or_else(|| {
            let fallback = rule.fallback?;
            candidates().find(|(_, f)| fallback(&f.key)).map(|(i, _)| i)
        })
}
