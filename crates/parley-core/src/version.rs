//! Interface Versions
//!
//! Semantic (major, minor) versions carried by provider registrations, and the
//! compatibility rule a consumer applies before selecting a provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interface version of a provider or of the interface a consumer was built against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct Version {
    pub major: i32,
    pub minor: i32,
}

impl Version {
    pub const fn new(major: i32, minor: i32) -> Self {
        Self { major, minor }
    }

    /// A provider at `self` can serve a consumer requiring `required` when the
    /// majors match exactly and the provider's minor is not older.
    pub fn is_compatible_with(&self, required: &Version) -> bool {
        self.major == required.major && self.minor >= required.minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or("version must be written as <major>.<minor>")?;
        let major = major.parse().map_err(|_| "major version is not an integer")?;
        let minor = minor.parse().map_err(|_| "minor version is not an integer")?;
        Ok(Self { major, minor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility_rule() {
        let required = Version::new(2, 3);
        assert!(Version::new(2, 3).is_compatible_with(&required));
        assert!(Version::new(2, 9).is_compatible_with(&required));
        assert!(!Version::new(2, 2).is_compatible_with(&required));
        assert!(!Version::new(3, 3).is_compatible_with(&required));
        assert!(!Version::new(1, 7).is_compatible_with(&required));
    }

    #[test]
    fn test_parse_and_display() {
        let v: Version = "4.12".parse().unwrap();
        assert_eq!(v, Version::new(4, 12));
        assert_eq!(v.to_string(), "4.12");
        assert!("4".parse::<Version>().is_err());
        assert!("a.1".parse::<Version>().is_err());
    }

    #[test]
    fn test_ordering_is_major_then_minor() {
        assert!(Version::new(1, 9) < Version::new(2, 0));
        assert!(Version::new(2, 0) < Version::new(2, 1));
    }
}
