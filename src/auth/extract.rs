//! Credential extraction from a request header value.

/// Extracts the raw API key from a header value.
///
/// Pure and total: absence in, absence out; a malformed scheme prefix is
/// treated as absence (fail closed), never as an error.
#[derive(Debug, Clone)]
pub struct CredentialExtractor {
    /// Scheme prefix including the trailing separator, e.g. `"Bearer "`.
    prefix: String,
}

impl CredentialExtractor {
    /// Create an extractor for the given scheme (e.g. `"Bearer"`).
    pub fn new(scheme: impl Into<String>) -> Self {
        let mut prefix = scheme.into();
        if !prefix.ends_with(' ') {
            prefix.push(' ');
        }
        Self { prefix }
    }

    /// Extractor for the default `Bearer` scheme.
    pub fn bearer() -> Self {
        Self::new("Bearer")
    }

    /// Extract the raw credential from the header value.
    ///
    /// Returns the remainder after the scheme prefix, unmodified. No
    /// trimming is applied beyond removing the prefix itself.
    pub fn extract<'a>(&self, header_value: Option<&'a str>) -> Option<&'a str> {
        header_value?.strip_prefix(self.prefix.as_str())
    }
}

impl Default for CredentialExtractor {
    fn default() -> Self {
        Self::bearer()
    }
}
