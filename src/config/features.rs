//! Feature flags for optional import behavior.

/// Feature flags controlling how entries are shaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Write metadata lines (url, login, otp, misc, notes) below the password.
    pub metadata: bool,
    /// Drop browser-autofill noise from misc attributes.
    pub noise_filter: bool,
    /// Place entries without a password under the notes prefix.
    pub notes_namespace: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            metadata: true,
            noise_filter: false,
            notes_namespace: true,
        }
    }
}
