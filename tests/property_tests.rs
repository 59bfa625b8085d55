//! Property-based tests for pass-import.
//!
//! Tests invariants that should hold for any input:
//! - Accepted key names match regardless of case
//! - The password fallback never picks an old password
//! - Rendered payloads read back to the same entry
//! - Misc attributes never read back as another field
//! - Sanitized path segments never escape their directory or start with `-`

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use pass_import::io::FieldInference;
use pass_import::io::inference::{CanonicalField, FIELD_TABLE, looks_like_password};
use pass_import::io::paths::sanitize_segment;
use pass_import::{CanonicalEntry, Payload, RawRecord};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Accepted names of the credential rules, with the field they fill.
fn credential_names() -> Vec<(CanonicalField, &'static str)> {
    FIELD_TABLE
        .iter()
        .filter(|rule| {
            matches!(
                rule.field,
                CanonicalField::Password
                    | CanonicalField::Login
                    | CanonicalField::Url
                    | CanonicalField::Otp
            )
        })
        .flat_map(|rule| rule.names.iter().map(move |name| (rule.field, *name)))
        .collect()
}

/// Applies a case mask to a name.
fn recase(name: &str, mask: &[bool]) -> String {
    name.chars()
        .zip(mask.iter().cycle())
        .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
        .collect()
}

fn otp_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|label| format!("otpauth://totp/{label}?secret=JBSWY3DP")),
        "[A-Z2-7]{8,16}",
    ]
}

/// Misc keys, including names that collide with the field lines.
fn misc_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec!["url", "login", "otp", "notes"]).prop_map(String::from),
        "[a-z0-9]{1,8}",
        "[a-z0-9]{1,8}".prop_map(|key| format!("\\{key}")),
        "[a-z]{1,8}".prop_map(|label| format!("otpauth://{label}")),
    ]
}

prop_compose! {
    fn entry_strategy()(
        password in proptest::option::of("[a-zA-Z0-9!@#%^&*]{1,24}"),
        url in proptest::option::of("[a-z]{1,12}".prop_map(|h| format!("https://{h}.example"))),
        login in proptest::option::of("[a-z0-9.]{1,16}"),
        otp in proptest::option::of(otp_strategy()),
        misc in prop::collection::vec(
            (misc_key_strategy(), "[a-zA-Z0-9][a-zA-Z0-9 ]{0,12}[a-zA-Z0-9]"),
            0..4,
        ),
        notes in prop::collection::vec("[a-zA-Z0-9][a-zA-Z0-9 .,]{0,30}", 0..4),
    ) -> CanonicalEntry {
        CanonicalEntry {
            password,
            url,
            login,
            otp,
            misc,
            notes: (!notes.is_empty()).then(|| notes.join("\n")),
            ..CanonicalEntry::default()
        }
    }
}

// ============================================================================
// Inference
// ============================================================================

proptest! {
    /// Property: an accepted name claims its field in any letter case.
    #[test]
    fn prop_accepted_names_ignore_case(
        (field, name) in prop::sample::select(credential_names()),
        mask in prop::collection::vec(any::<bool>(), 1..8),
        value in "[a-zA-Z0-9]{1,20}",
    ) {
        let record = RawRecord::new(1).with_field(recase(name, &mask), Some(value.clone()));
        let entry = FieldInference::default().infer(&record);

        let slot = match field {
            CanonicalField::Password => entry.password,
            CanonicalField::Login => entry.login,
            CanonicalField::Url => entry.url,
            _ => entry.otp,
        };
        prop_assert_eq!(slot, Some(value));
        prop_assert!(entry.misc.is_empty());
    }

    /// Property: the fallback rejects keys that name an old password.
    #[test]
    fn prop_fallback_never_selects_old_passwords(
        before in "[a-z_]{0,6}",
        after in "[a-z_]{0,6}",
    ) {
        let old = format!("{before}old{after}pass");
        let leading_o = format!("o{before}pass{after}");

        prop_assert!(!looks_like_password(&old));
        prop_assert!(!looks_like_password(&leading_o));

        let record = RawRecord::new(1)
            .with_field(old, Some("stale".to_string()))
            .with_field(leading_o, Some("older".to_string()));
        let entry = FieldInference::default().infer(&record);
        prop_assert_eq!(entry.password, None);
        prop_assert_eq!(entry.misc.len(), 2);
    }

    /// Property: the fallback only fires for keys mentioning `pass`.
    #[test]
    fn prop_fallback_requires_pass(key in "[a-z_]{1,16}") {
        if looks_like_password(&key) {
            prop_assert!(key.contains("pass"));
            prop_assert!(!key.starts_with('o'));
            prop_assert!(!key.contains("old"));
        }
    }
}

// ============================================================================
// Payload
// ============================================================================

proptest! {
    /// Property: parsing a rendered payload recovers the entry.
    #[test]
    fn prop_payload_roundtrip(entry in entry_strategy()) {
        let payload = Payload::render(&entry, true);
        prop_assert_eq!(Payload::parse(payload.as_str()), entry);
    }

    /// Property: only the first line of a payload may be blank.
    #[test]
    fn prop_payload_has_no_blank_metadata_lines(entry in entry_strategy()) {
        let payload = Payload::render(&entry, true);
        prop_assert!(payload.as_str().ends_with('\n'));
        prop_assert!(payload.as_str().lines().skip(1).all(|line| !line.trim().is_empty()));
    }

    /// Property: misc lines never parse as another field.
    #[test]
    fn prop_misc_keys_never_become_fields(
        key in misc_key_strategy(),
        value in "[a-zA-Z0-9]{1,12}",
    ) {
        let entry = CanonicalEntry {
            misc: vec![(key.clone(), value.clone())],
            ..CanonicalEntry::default()
        };
        let parsed = Payload::parse(Payload::render(&entry, true).as_str());
        prop_assert_eq!(parsed.url, None);
        prop_assert_eq!(parsed.login, None);
        prop_assert_eq!(parsed.otp, None);
        prop_assert_eq!(parsed.notes, None);
        prop_assert_eq!(parsed.misc, vec![(key, value)]);
    }

    /// Property: without metadata the payload is the password line alone.
    #[test]
    fn prop_payload_without_metadata_is_one_line(entry in entry_strategy()) {
        let payload = Payload::render(&entry, false);
        prop_assert_eq!(payload.as_str().lines().count(), 1);
        prop_assert_eq!(Payload::parse(payload.as_str()).password, entry.password);
    }
}

// ============================================================================
// Paths
// ============================================================================

proptest! {
    /// Property: a sanitized segment is a single usable path component.
    #[test]
    fn prop_sanitized_segment_stays_in_place(raw in "\\PC{0,30}") {
        if let Some(segment) = sanitize_segment(&raw) {
            prop_assert!(!segment.is_empty());
            prop_assert!(!segment.contains('/'));
            prop_assert!(!segment.contains('\\'));
            prop_assert!(segment != "." && segment != "..");
            prop_assert!(!segment.chars().any(char::is_whitespace));
            prop_assert!(!segment.starts_with('-'));
        }
    }
}
