//! `major.minor` version numbers of library items.
//!
//! The rendered form `"{major}.{minor}"` is relied upon by callers for
//! display and sorting, so it must never change. Ordering is numeric on the
//! `(major, minor)` tuple, not lexicographic on the string ("10.0" > "9.3").

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::MdrError;

/// A library item version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    /// Incremented on every approval.
    pub major: u32,
    /// Incremented on every draft edit, reset to 0 on approval.
    pub minor: u32,
}

impl Version {
    /// Version of a freshly created draft.
    pub const INITIAL_DRAFT: Version = Version::new(0, 1);

    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// True for `x.0` versions, the only ones a final item can carry.
    #[must_use]
    pub fn is_round(&self) -> bool {
        self.minor == 0
    }

    /// True once the item has been approved at least once.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.major > 0
    }

    /// `major.(minor + 1)`, or `None` once the minor number is exhausted.
    #[must_use]
    pub fn next_minor(&self) -> Option<Self> {
        let minor = self.minor.checked_add(1)?;
        Some(Self::new(self.major, minor))
    }

    /// `(major + 1).0`, or `None` once the major number is exhausted.
    #[must_use]
    pub fn next_major(&self) -> Option<Self> {
        let major = self.major.checked_add(1)?;
        Some(Self::new(major, 0))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = MdrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MdrError::invalid_value("library item", "version", s);
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        let major = major.parse::<u32>().map_err(|_| invalid())?;
        let minor = minor.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self::new(major, minor))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_major_dot_minor() {
        assert_eq!(Version::INITIAL_DRAFT.to_string(), "0.1");
        assert_eq!(Version::new(1, 0).to_string(), "1.0");
        assert_eq!(Version::new(2, 3).to_string(), "2.3");
    }

    #[test]
    fn parses_rendered_form() {
        assert_eq!("0.1".parse::<Version>().unwrap(), Version::new(0, 1));
        assert_eq!(" 12.4 ".parse::<Version>().unwrap(), Version::new(12, 4));
        assert!("1".parse::<Version>().is_err());
        assert!("1.x".parse::<Version>().is_err());
        assert!("-1.0".parse::<Version>().is_err());
    }

    #[test]
    fn orders_numerically() {
        assert!(Version::new(10, 0) > Version::new(9, 3));
        assert!(Version::new(1, 1) > Version::new(1, 0));
        assert!(Version::new(2, 0) > Version::new(1, 9));
    }

    #[test]
    fn increments() {
        assert_eq!(Version::new(1, 0).next_minor(), Some(Version::new(1, 1)));
        assert_eq!(Version::new(1, 3).next_major(), Some(Version::new(2, 0)));
        assert!(Version::new(1, 0).is_round());
        assert!(!Version::INITIAL_DRAFT.is_released());
    }

    #[test]
    fn increments_stop_at_the_numeric_limit() {
        assert_eq!(Version::new(0, u32::MAX).next_minor(), None);
        assert_eq!(Version::new(u32::MAX, 4).next_major(), None);
        assert_eq!(
            Version::new(u32::MAX, 4).next_minor(),
            Some(Version::new(u32::MAX, 5))
        );
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Version::new(3, 2)).unwrap();
        assert_eq!(json, "\"3.2\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Version::new(3, 2));
    }
}
