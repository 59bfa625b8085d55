//! Canonical entries ready to be written to the store.

/// The normalized form of one imported secret.
///
/// `path` is always non-empty and made only of sanitized segments; `misc`
/// never repeats a value already held by `password`, `login`, `url` or `otp`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalEntry {
    /// Store path, `/`-separated.
    pub path: String,
    /// Original title.
    pub title: Option<String>,
    /// The secret itself.
    pub password: Option<String>,
    /// Username or email.
    pub login: Option<String>,
    /// Site address.
    pub url: Option<String>,
    /// One-time-password seed or `otpauth://` URI.
    pub otp: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Every other attribute, in source order.
    pub misc: Vec<(String, String)>,
}

impl CanonicalEntry {
    /// Returns whether the entry carries a password.
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Looks up a misc attribute by key.
    #[must_use]
    pub fn misc_value(&self, key: &str) -> Option<&str> {
        self.misc
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
