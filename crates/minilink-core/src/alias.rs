use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A short public identifier for a shortened URL.
///
/// Aliases are derived from store identities with a base62 encoding over the
/// alphabet `0-9A-Za-z`, most significant digit first. Because identities are
/// unique and the encoding is injective, two entries never share an alias.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alias(String);

const MIN_LENGTH: usize = 1;
// base62 of u128::MAX
const MAX_LENGTH: usize = 22;

impl Alias {
    /// Encodes a store identity as an alias.
    ///
    /// `0` encodes to the first alphabet symbol; every other value has no
    /// leading zero symbols.
    pub fn from_id(id: u64) -> Self {
        Self(base62::encode(id))
    }

    /// Parses an alias received from a caller.
    ///
    /// Returns `None` for anything the codec could never have produced, which
    /// lets resolution short-circuit to "not found" without a lookup.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = (MIN_LENGTH..=MAX_LENGTH).contains(&raw.len())
            && raw.chars().all(|c| c.is_ascii_alphanumeric());
        valid.then(|| Self(raw.to_owned()))
    }

    /// Wraps a value read back from a trusted backend without validation.
    pub fn new_unchecked(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn zero_encodes_to_first_symbol() {
        assert_eq!(Alias::from_id(0).as_str(), "0");
    }

    #[test]
    fn encodes_most_significant_digit_first() {
        assert_eq!(Alias::from_id(1).as_str(), "1");
        assert_eq!(Alias::from_id(10).as_str(), "A");
        assert_eq!(Alias::from_id(36).as_str(), "a");
        assert_eq!(Alias::from_id(61).as_str(), "z");
        assert_eq!(Alias::from_id(62).as_str(), "10");
        assert_eq!(Alias::from_id(62 * 62 + 1).as_str(), "101");
    }

    #[test]
    fn largest_identity_fits_within_bounds() {
        let alias = Alias::from_id(u64::MAX);
        assert_eq!(alias.as_str().len(), 11);
        assert_eq!(Alias::parse(alias.as_str()), Some(alias));
    }

    #[test]
    fn distinct_identities_never_collide() {
        let aliases: HashSet<_> = (0..20_000u64).map(Alias::from_id).collect();
        assert_eq!(aliases.len(), 20_000);
    }

    #[test]
    fn parse_accepts_codec_output() {
        assert!(Alias::parse("B").is_some());
        assert!(Alias::parse("aZ09").is_some());
    }

    #[test]
    fn parse_rejects_foreign_input() {
        assert!(Alias::parse("").is_none());
        assert!(Alias::parse("abc-def").is_none());
        assert!(Alias::parse("abc def").is_none());
        assert!(Alias::parse("favicon.ico").is_none());
        assert!(Alias::parse(&"a".repeat(23)).is_none());
    }

    #[test]
    fn display_matches_as_str() {
        let alias = Alias::from_id(125);
        assert_eq!(alias.to_string(), alias.as_str());
    }
}
