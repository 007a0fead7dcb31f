//! Enhancement kinds and sets of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One independently toggleable value transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Enhance {
    /// Replace enumeration codes by their labels.
    ConvertEnums,
    /// Reinterpret signed storage as unsigned values.
    ConvertUnsigned,
    /// Apply `scale_factor` and `add_offset`.
    ApplyScaleOffset,
    /// Replace missing, fill and invalid values by NaN.
    ConvertMissing,
    /// Normalize floating data to zero mean, unit deviation.
    ApplyStandardizer,
}

impl Enhance {
    pub const ALL: [Enhance; 5] = [
        Enhance::ConvertEnums,
        Enhance::ConvertUnsigned,
        Enhance::ApplyScaleOffset,
        Enhance::ConvertMissing,
        Enhance::ApplyStandardizer,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConvertEnums => "ConvertEnums",
            Self::ConvertUnsigned => "ConvertUnsigned",
            Self::ApplyScaleOffset => "ApplyScaleOffset",
            Self::ConvertMissing => "ConvertMissing",
            Self::ApplyStandardizer => "ApplyStandardizer",
        }
    }
}

impl fmt::Display for Enhance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Enhance {
    type Err = String;

    /// Parse a kind name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown enhancement '{wanted}'"))
    }
}

/// Membership-only set of [`Enhance`] kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Enhance>", into = "Vec<Enhance>")]
pub struct EnhanceSet(u8);

impl EnhanceSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Enhance::ALL.into_iter().collect()
    }

    /// Enhancements applied when a dataset is opened with enhancement on.
    pub fn default_mode() -> Self {
        [
            Enhance::ConvertEnums,
            Enhance::ConvertUnsigned,
            Enhance::ApplyScaleOffset,
            Enhance::ConvertMissing,
        ]
        .into_iter()
        .collect()
    }

    pub fn contains(&self, kind: Enhance) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Returns `true` if `kind` was not already present.
    pub fn insert(&mut self, kind: Enhance) -> bool {
        let added = !self.contains(kind);
        self.0 |= kind.bit();
        added
    }

    /// Returns `true` if `kind` was present.
    pub fn remove(&mut self, kind: Enhance) -> bool {
        let present = self.contains(kind);
        self.0 &= !kind.bit();
        present
    }

    pub fn union(&self, other: EnhanceSet) -> Self {
        Self(self.0 | other.0)
    }

    /// Kinds in `self` that are not in `other`.
    pub fn difference(&self, other: EnhanceSet) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Enhance> + '_ {
        Enhance::ALL.into_iter().filter(|e| self.contains(*e))
    }

    /// Parse `all`, `none`, or a comma-separated list of kind names.
    pub fn parse_list(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::all()),
            "none" | "" => Ok(Self::empty()),
            _ => s.split(',').map(str::parse::<Enhance>).collect(),
        }
    }
}

impl FromIterator<Enhance> for EnhanceSet {
    fn from_iter<I: IntoIterator<Item = Enhance>>(iter: I) -> Self {
        let mut set = Self::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl From<Vec<Enhance>> for EnhanceSet {
    fn from(kinds: Vec<Enhance>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<EnhanceSet> for Vec<Enhance> {
    fn from(set: EnhanceSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for EnhanceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for EnhanceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|e| e.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_operations() {
        let mut set = EnhanceSet::empty();
        assert!(set.insert(Enhance::ConvertMissing));
        assert!(!set.insert(Enhance::ConvertMissing));
        set.insert(Enhance::ConvertUnsigned);
        assert_eq!(set.len(), 2);

        let inherited: EnhanceSet = [Enhance::ConvertUnsigned].into_iter().collect();
        let local = set.difference(inherited);
        assert!(local.contains(Enhance::ConvertMissing));
        assert!(!local.contains(Enhance::ConvertUnsigned));
        assert_eq!(local.union(inherited), set);

        assert!(set.remove(Enhance::ConvertMissing));
        assert!(!set.remove(Enhance::ConvertMissing));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(EnhanceSet::parse_list("ALL").unwrap(), EnhanceSet::all());
        assert!(EnhanceSet::parse_list("none").unwrap().is_empty());

        let set = EnhanceSet::parse_list("convertmissing, ApplyScaleOffset").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(Enhance::ApplyScaleOffset));

        assert!(EnhanceSet::parse_list("ConvertMissing,Bogus").is_err());
    }

    #[test]
    fn test_default_mode_excludes_standardizer() {
        let mode = EnhanceSet::default_mode();
        assert_eq!(mode.len(), 4);
        assert!(!mode.contains(Enhance::ApplyStandardizer));
    }

    #[test]
    fn test_display() {
        let set: EnhanceSet = [Enhance::ConvertMissing, Enhance::ConvertEnums]
            .into_iter()
            .collect();
        assert_eq!(set.to_string(), "{ConvertEnums, ConvertMissing}");
    }
}
