//! Named search flags
//!
//! Flags travel over the wire as a pipe-separated list of names
//! (`flags=SEARCH_BY_ATTRIBUTES_STRONG|SEARCH_INCLUDE_STATS`) and are carried
//! internally as a bitset.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Bitset of search behavior toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchFlags(u64);

/// Rejected flag expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown search flag: {0}")]
pub struct UnknownFlag(pub String);

impl SearchFlags {
    /// Match on any single shared attribute
    pub const SEARCH_BY_ATTRIBUTES_ALL: Self = Self(1 << 0);
    /// Require at least two shared attributes
    pub const SEARCH_BY_ATTRIBUTES_STRONG: Self = Self(1 << 1);
    /// Embed each matched record's attributes
    pub const ENTITY_INCLUDE_RECORD_DATA: Self = Self(1 << 2);
    /// Report per-attribute match details
    pub const INCLUDE_MATCH_KEY_DETAILS: Self = Self(1 << 3);
    /// Attach search statistics to the answer
    pub const SEARCH_INCLUDE_STATS: Self = Self(1 << 4);

    /// Flags applied when the caller names none
    pub const SEARCH_BY_ATTRIBUTES_DEFAULT_FLAGS: Self = Self(Self::SEARCH_BY_ATTRIBUTES_ALL.0);

    const NAMED: &'static [(&'static str, SearchFlags)] = &[
        ("SEARCH_BY_ATTRIBUTES_ALL", Self::SEARCH_BY_ATTRIBUTES_ALL),
        ("SEARCH_BY_ATTRIBUTES_STRONG", Self::SEARCH_BY_ATTRIBUTES_STRONG),
        (
            "SEARCH_BY_ATTRIBUTES_DEFAULT_FLAGS",
            Self::SEARCH_BY_ATTRIBUTES_DEFAULT_FLAGS,
        ),
        ("ENTITY_INCLUDE_RECORD_DATA", Self::ENTITY_INCLUDE_RECORD_DATA),
        ("INCLUDE_MATCH_KEY_DETAILS", Self::INCLUDE_MATCH_KEY_DETAILS),
        ("SEARCH_INCLUDE_STATS", Self::SEARCH_INCLUDE_STATS),
    ];

    /// Empty flag set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bit representation
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Parse a pipe-separated flag expression
    ///
    /// `None` or an expression without names yields the default flags.
    /// Names are case-insensitive and may carry the `SZ_` prefix.
    pub fn parse(expr: Option<&str>) -> Result<Self, UnknownFlag> {
        let Some(expr) = expr else {
            return Ok(Self::default());
        };

        let mut flags = Self::empty();
        for name in expr.split('|').map(str::trim).filter(|n| !n.is_empty()) {
            flags = flags | Self::lookup(name).ok_or_else(|| UnknownFlag(name.to_string()))?;
        }

        if flags.is_empty() {
            Ok(Self::default())
        } else {
            Ok(flags)
        }
    }

    fn lookup(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        let bare = upper.strip_prefix("SZ_").unwrap_or(&upper);
        Self::NAMED
            .iter()
            .find(|(known, _)| *known == bare)
            .map(|(_, flag)| *flag)
    }

    /// Names of the individual flags that are set
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(name, flag)| {
                *name != "SEARCH_BY_ATTRIBUTES_DEFAULT_FLAGS" && self.contains(*flag)
            })
            .map(|(name, _)| *name)
            .collect()
    }
}

impl Default for SearchFlags {
    fn default() -> Self {
        Self::SEARCH_BY_ATTRIBUTES_DEFAULT_FLAGS
    }
}

impl std::ops::BitOr for SearchFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::Display for SearchFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.names().join("|"))
    }
}

impl Serialize for SearchFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}
