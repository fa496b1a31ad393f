//! Availability versions
//!
//! Every entity records the platform version it was introduced in as a
//! single byte: `major << 3 | minor`. Zero means "no version recorded".

use crate::error::MetaError;
use std::fmt;
use std::str::FromStr;

/// Pack a major/minor pair into the one-byte availability encoding.
///
/// Only majors below 32 and minors below 8 are representable; larger
/// values wrap.
pub fn encode_version(major: u8, minor: u8) -> u8 {
    debug_assert!(major < 32 && minor < 8, "version {major}.{minor} out of range");
    (major << 3) | (minor & 0b111)
}

/// Major component of an encoded version.
pub fn major_of(encoded: u8) -> u8 {
    encoded >> 3
}

/// Minor component of an encoded version.
pub fn minor_of(encoded: u8) -> u8 {
    encoded & 0b111
}

/// Version of the platform the metadata is being queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemVersion {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
}

impl SystemVersion {
    /// Highest version the one-byte encoding can express; admits everything.
    pub const LATEST: SystemVersion = SystemVersion { major: 31, minor: 7 };

    /// Create a system version
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Whether an entity introduced in `introduced` (encoded) can be used on
    /// this system. Entities without a recorded version are always usable.
    pub fn admits(self, introduced: u8) -> bool {
        if introduced == 0 {
            return true;
        }
        let entity = SystemVersion::new(major_of(introduced), minor_of(introduced));
        entity <= self
    }
}

impl Default for SystemVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for SystemVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for SystemVersion {
    type Err = MetaError;

    /// Parses `"13"`, `"13.2"`, `"10.15"` or `"13.2.1"` (the patch component is
    /// ignored). Components are not limited to the entity encoding's range.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MetaError::InvalidVersion(s.to_string());
        let mut parts = s.trim().split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(p) => p.parse::<u8>().map_err(|_| invalid())?,
            None => 0,
        };
        if let Some(patch) = parts.next() {
            patch.parse::<u32>().map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { major, minor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let v = encode_version(13, 4);
        assert_eq!(major_of(v), 13);
        assert_eq!(minor_of(v), 4);
        assert_eq!(encode_version(8, 0), 64);
    }

    #[test]
    fn test_unset_version_always_admitted() {
        assert!(SystemVersion::new(0, 0).admits(0));
        assert!(SystemVersion::new(7, 0).admits(0));
    }

    #[test]
    fn test_admits_by_major_and_minor() {
        let introduced = encode_version(8, 0);
        assert!(!SystemVersion::new(7, 0).admits(introduced));
        assert!(!SystemVersion::new(7, 7).admits(introduced));
        assert!(SystemVersion::new(8, 0).admits(introduced));
        assert!(SystemVersion::new(9, 0).admits(introduced));

        let introduced = encode_version(8, 3);
        assert!(!SystemVersion::new(8, 2).admits(introduced));
        assert!(SystemVersion::new(8, 3).admits(introduced));
    }

    #[test]
    fn test_parse_minor_beyond_entity_range() {
        let macos = "10.15".parse::<SystemVersion>().unwrap();
        assert_eq!(macos, SystemVersion::new(10, 15));
        assert!(macos.admits(encode_version(10, 7)));
        assert!(!macos.admits(encode_version(11, 0)));
        assert_eq!("40.0".parse::<SystemVersion>().unwrap(), SystemVersion::new(40, 0));
    }

    #[test]
    fn test_parse() {
        assert_eq!("13".parse::<SystemVersion>().unwrap(), SystemVersion::new(13, 0));
        assert_eq!("13.2".parse::<SystemVersion>().unwrap(), SystemVersion::new(13, 2));
        assert_eq!("13.2.1".parse::<SystemVersion>().unwrap(), SystemVersion::new(13, 2));
        assert!("".parse::<SystemVersion>().is_err());
        assert!("x.1".parse::<SystemVersion>().is_err());
        assert!("256.0".parse::<SystemVersion>().is_err());
        assert!("1.2.3.4".parse::<SystemVersion>().is_err());
    }
}
