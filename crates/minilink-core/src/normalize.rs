use crate::error::{CoreError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::LazyLock;
use url::{ParseError, Url};

/// Structural shape every stored URL must have: optional `http(s)://`, a host
/// of alphanumerics, dots and hyphens ending in a 2-6 letter top-level label,
/// and an optional path of word characters, slashes and hyphens.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?([a-zA-Z0-9.-]+)(\.[a-zA-Z]{2,6})(/[\w/-]*)?$")
        .expect("url pattern is a valid regex")
});

/// A URL in canonical form.
///
/// Only [`normalize`] produces values from caller input, so holding a
/// `NormalizedUrl` means the string is safe to persist and to compare for
/// deduplication.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    /// Wraps a value read back from a trusted backend without re-normalizing.
    pub fn new_unchecked(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for NormalizedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalizes a caller-supplied URL.
///
/// Scheme-less input is treated as `http://`. The result always uses the
/// `http` scheme, has any leading `www.` stripped from the host, and keeps
/// path and query while dropping the fragment, so `example.com/a`,
/// `http://www.example.com/a` and `https://example.com/a` all normalize to
/// `http://example.com/a`.
pub fn normalize(raw: &str) -> Result<NormalizedUrl> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CoreError::InvalidUrl("url cannot be empty".to_string()));
    }

    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("http://{raw}")).map_err(|e| invalid(raw, e))?
        }
        Err(e) => return Err(invalid(raw, e)),
    };

    let host = match parsed.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => {
            return Err(CoreError::InvalidUrl(format!(
                "url must have a host: '{raw}'"
            )))
        }
    };

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(CoreError::InvalidUrl(format!(
            "url must not carry credentials: '{raw}'"
        )));
    }
    if parsed.port().is_some() {
        return Err(CoreError::InvalidUrl(format!(
            "url must not carry an explicit port: '{raw}'"
        )));
    }

    let host = host.strip_prefix("www.").unwrap_or(host);
    let path = match parsed.path() {
        "/" => "",
        path => path,
    };

    let mut normalized = format!("http://{host}{path}");
    if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
        normalized.push('?');
        normalized.push_str(query);
    }

    if !URL_PATTERN.is_match(&normalized) {
        return Err(CoreError::InvalidUrl(format!(
            "url does not have a supported shape: '{raw}'"
        )));
    }

    Ok(NormalizedUrl(normalized))
}

fn invalid(raw: &str, err: ParseError) -> CoreError {
    CoreError::InvalidUrl(format!("failed to parse '{raw}': {err}"))
}
