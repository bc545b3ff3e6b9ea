//! Release tag parsing and ordering
//!
//! Tags are parsed leniently: a single leading `v` is stripped and the rest
//! must be semantic-version syntax. Anything else becomes
//! [`VersionTag::Malformed`], which sorts below every well-formed tag and is
//! never picked as latest, but still shows up in listings.

use crate::release::Release;
use semver::Version;
use std::cmp::Ordering;
use std::fmt;

/// A parsed release tag
#[derive(Debug, Clone)]
pub enum VersionTag {
    /// Tag with valid `major.minor.patch[-pre][+build]` syntax
    WellFormed { raw: String, version: Version },
    /// Tag that could not be parsed, kept verbatim
    Malformed(String),
}

impl VersionTag {
    /// Parse a raw tag. Never fails.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let candidate = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        match Version::parse(candidate) {
            Ok(version) => Self::WellFormed {
                raw: raw.to_string(),
                version,
            },
            Err(_) => Self::Malformed(raw.to_string()),
        }
    }

    /// The tag exactly as published
    pub fn as_str(&self) -> &str {
        match self {
            Self::WellFormed { raw, .. } => raw,
            Self::Malformed(raw) => raw,
        }
    }

    /// Parsed version, if the tag is well formed
    pub fn version(&self) -> Option<&Version> {
        match self {
            Self::WellFormed { version, .. } => Some(version),
            Self::Malformed(_) => None,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        matches!(self, Self::WellFormed { .. })
    }

    /// Whether `other` names this tag, either verbatim or as the same version
    pub fn matches(&self, other: &str) -> bool {
        if self.as_str() == other {
            return true;
        }
        match (self.version(), VersionTag::parse(other).version()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Total order over tags.
///
/// Malformed < well-formed; well-formed compare by semantic version, then by
/// raw text so that `Eq` agrees with `Ord`.
pub fn compare(a: &VersionTag, b: &VersionTag) -> Ordering {
    match (a, b) {
        (VersionTag::Malformed(x), VersionTag::Malformed(y)) => x.cmp(y),
        (VersionTag::Malformed(_), VersionTag::WellFormed { .. }) => Ordering::Less,
        (VersionTag::WellFormed { .. }, VersionTag::Malformed(_)) => Ordering::Greater,
        (
            VersionTag::WellFormed {
                raw: raw_a,
                version: va,
            },
            VersionTag::WellFormed {
                raw: raw_b,
                version: vb,
            },
        ) => va.cmp(vb).then_with(|| raw_a.cmp(raw_b)),
    }
}

impl Ord for VersionTag {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl PartialOrd for VersionTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionTag {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionTag {}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the release with the greatest well-formed tag.
///
/// Among equal tags the first one in slice order wins, so repeated calls over
/// the same listing always return the same release.
pub fn latest_of(releases: &[Release]) -> Option<&Release> {
    releases
        .iter()
        .filter(|r| r.tag.is_well_formed())
        .fold(None, |best: Option<&Release>, candidate| match best {
            Some(current) if candidate.tag <= current.tag => Some(current),
            _ => Some(candidate),
        })
}
