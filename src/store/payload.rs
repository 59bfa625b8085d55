//! Plaintext layout of a store entry.
//!
//! ```text
//! secret1
//! url: https://bank.example
//! login: alice
//! otpauth://totp/Bank?secret=JBSWY3DPEHPK3PXP
//! security question: blue
//! notes: Call before 5pm
//! ask for Carol
//! ```
//!
//! The first line is always the password, empty when there is none. The
//! remaining lines appear in the order above and only for values that are
//! set. An `otpauth://` URI is written bare so `pass otp` can find it; any
//! other seed is written as `otp: <seed>`.
//!
//! A misc line that would read as one of the field lines above, such as an
//! attribute named `otp` or `notes`, is written with a leading `\`. So is a
//! misc line that already starts with `\`. Parsing drops exactly one leading
//! `\` from a misc line.

use crate::models::CanonicalEntry;

const URL: &str = "url: ";
const LOGIN: &str = "login: ";
const OTP: &str = "otp: ";
const OTP_URI: &str = "otpauth://";
const NOTES: &str = "notes: ";
const ESCAPE: &str = "\\";

/// Line starts that parse as something other than a misc attribute.
const RESERVED: [&str; 6] = [URL, LOGIN, OTP, OTP_URI, NOTES, ESCAPE];

/// Serialized entry, as fed to the store command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Payload(String);

impl Payload {
    /// Renders an entry.
    ///
    /// Without metadata only the password line is written.
    #[must_use]
    pub fn render(entry: &CanonicalEntry, metadata: bool) -> Self {
        let mut lines = vec![entry.password.as_deref().map(one_line).unwrap_or_default()];

        if metadata {
            push_prefixed(&mut lines, URL, entry.url.as_deref());
            push_prefixed(&mut lines, LOGIN, entry.login.as_deref());
            match entry.otp.as_deref() {
                Some(otp) if otp.starts_with(OTP_URI) => lines.push(one_line(otp)),
                otp => push_prefixed(&mut lines, OTP, otp),
            }
            for (key, value) in &entry.misc {
                if !value.is_empty() {
                    let line = format!("{}: {}", one_line(key), one_line(value));
                    if RESERVED.iter().any(|prefix| line.starts_with(prefix)) {
                        lines.push(format!("{ESCAPE}{line}"));
                    } else {
                        lines.push(line);
                    }
                }
            }
            let mut notes = entry
                .notes
                .iter()
                .flat_map(|n| n.lines())
                .filter(|l| !l.trim().is_empty());
            if let Some(first) = notes.next() {
                lines.push(format!("{NOTES}{first}"));
                lines.extend(notes.map(String::from));
            }
        }

        let mut text = lines.join("\n");
        text.push('\n');
        Self(text)
    }

    /// Returns the payload text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Reads a rendered payload back into an entry.
    ///
    /// Only the fields the layout carries are recovered; `path` and `title`
    /// stay empty. Lines are matched in layout order, so an unescaped misc
    /// attribute named `login` is not mistaken for the login once misc lines
    /// started.
    #[must_use]
    pub fn parse(text: &str) -> CanonicalEntry {
        let mut entry = CanonicalEntry::default();
        let mut lines = text.lines();
        entry.password = lines.next().filter(|l| !l.is_empty()).map(String::from);

        let mut stage = Stage::Url;
        let mut notes: Vec<&str> = Vec::new();
        for line in lines {
            if stage == Stage::Notes {
                notes.push(line);
                continue;
            }
            if let Some(url) = line.strip_prefix(URL).filter(|_| stage <= Stage::Url) {
                entry.url = Some(url.to_string());
                stage = Stage::Login;
            } else if let Some(login) = line.strip_prefix(LOGIN).filter(|_| stage <= Stage::Login) {
                entry.login = Some(login.to_string());
                stage = Stage::Otp;
            } else if line.starts_with(OTP_URI) && stage <= Stage::Otp {
                entry.otp = Some(line.to_string());
                stage = Stage::Misc;
            } else if let Some(otp) = line.strip_prefix(OTP).filter(|_| stage <= Stage::Otp) {
                entry.otp = Some(otp.to_string());
                stage = Stage::Misc;
            } else if let Some(first) = line.strip_prefix(NOTES) {
                notes.push(first);
                stage = Stage::Notes;
            } else if let Some((key, value)) =
                line.strip_prefix(ESCAPE).unwrap_or(line).split_once(": ")
            {
                entry.misc.push((key.to_string(), value.to_string()));
                stage = Stage::Misc;
            }
        }

        if !notes.is_empty() {
            entry.notes = Some(notes.join("\n"));
        }
        entry
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Url,
    Login,
    Otp,
    Misc,
    Notes,
}

fn push_prefixed(lines: &mut Vec<String>, prefix: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        lines.push(format!("{prefix}{}", one_line(value)));
    }
}

/// Flattens a single-line field.
fn one_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> CanonicalEntry {
        CanonicalEntry {
            path: "Bank".to_string(),
            title: Some("Bank".to_string()),
            password: Some("secret1".to_string()),
            login: Some("alice".to_string()),
            url: Some("https://bank.example".to_string()),
            otp: None,
            notes: Some("Call before 5pm\n\nask for Carol".to_string()),
            misc: vec![("security question".to_string(), "blue".to_string())],
        }
    }

    #[test]
    fn test_render_layout() {
        let payload = Payload::render(&bank(), true);
        assert_eq!(
            payload.as_str(),
            "secret1\n\
             url: https://bank.example\n\
             login: alice\n\
             security question: blue\n\
             notes: Call before 5pm\n\
             ask for Carol\n"
        );
    }

    #[test]
    fn test_render_without_metadata() {
        assert_eq!(Payload::render(&bank(), false).as_str(), "secret1\n");
    }

    #[test]
    fn test_render_without_password_starts_blank() {
        let entry = CanonicalEntry {
            notes: Some("wifi: guest".to_string()),
            ..CanonicalEntry::default()
        };
        assert_eq!(Payload::render(&entry, true).as_str(), "\nnotes: wifi: guest\n");
    }

    #[test]
    fn test_render_otp() {
        let mut entry = bank();
        entry.otp = Some("otpauth://totp/Bank?secret=ABC".to_string());
        assert!(
            Payload::render(&entry, true)
                .as_str()
                .contains("\notpauth://totp/Bank?secret=ABC\n")
        );

        entry.otp = Some("ABC".to_string());
        assert!(Payload::render(&entry, true).as_str().contains("\notp: ABC\n"));
    }

    #[test]
    fn test_single_line_fields_are_flattened() {
        let entry = CanonicalEntry {
            password: Some("a\nb".to_string()),
            login: Some("x\r\ny".to_string()),
            ..CanonicalEntry::default()
        };
        assert_eq!(Payload::render(&entry, true).as_str(), "a b\nlogin: x  y\n");
    }

    #[test]
    fn test_parse_recovers_fields() {
        let mut expected = bank();
        let parsed = Payload::parse(Payload::render(&expected, true).as_str());

        expected.path = String::new();
        expected.title = None;
        expected.notes = Some("Call before 5pm\nask for Carol".to_string());
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_misc_named_otp_stays_misc() {
        let entry = CanonicalEntry {
            password: Some("pw".to_string()),
            misc: vec![("otp".to_string(), "123456".to_string())],
            ..CanonicalEntry::default()
        };
        let payload = Payload::render(&entry, true);
        assert_eq!(payload.as_str(), "pw\n\\otp: 123456\n");

        let parsed = Payload::parse(payload.as_str());
        assert!(parsed.otp.is_none());
        assert_eq!(parsed.misc_value("otp"), Some("123456"));
    }

    #[test]
    fn test_misc_named_notes_keeps_later_misc() {
        let entry = CanonicalEntry {
            password: Some("pw".to_string()),
            misc: vec![
                ("notes".to_string(), "a".to_string()),
                ("pin".to_string(), "1".to_string()),
            ],
            ..CanonicalEntry::default()
        };
        let parsed = Payload::parse(Payload::render(&entry, true).as_str());
        assert!(parsed.notes.is_none());
        assert_eq!(parsed.misc, entry.misc);
    }

    #[test]
    fn test_misc_escaping_is_reversible() {
        let misc = vec![
            ("url".to_string(), "x".to_string()),
            ("otpauth://k".to_string(), "y".to_string()),
            ("\\dir".to_string(), "z".to_string()),
            ("login name".to_string(), "w".to_string()),
        ];
        let entry = CanonicalEntry {
            misc: misc.clone(),
            ..CanonicalEntry::default()
        };
        let payload = Payload::render(&entry, true);
        assert_eq!(
            payload.as_str(),
            "\n\\url: x\n\\otpauth://k: y\n\\\\dir: z\nlogin name: w\n"
        );
        assert_eq!(Payload::parse(payload.as_str()).misc, misc);
    }

    #[test]
    fn test_parse_misc_named_like_a_field() {
        let parsed = Payload::parse("pw\nsecurity question: blue\nlogin: second\n");
        assert!(parsed.login.is_none());
        assert_eq!(parsed.misc_value("login"), Some("second"));
    }
}
