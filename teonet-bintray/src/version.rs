//! Version series rules.
//!
//! A version `X.Y[.rest][-build]` belongs to the release series when
//! `X >= 4` and `Y` is even, and to the testing series otherwise. The series
//! decides the remote path segment and the Debian component.

use crate::classify::RepoKind;
use crate::error::ClassificationError;
use std::fmt;
use std::str::FromStr;

/// Release series of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Release { major: u32, minor: u32 },
    Testing,
}

/// A parsed package version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub major: u32,
    pub minor: u32,
    /// Components after the minor number, without the leading dot.
    pub rest: String,
    /// Build identifier after the first `-`.
    pub build: Option<String>,
}

impl VersionInfo {
    pub fn parse(version: &str) -> Result<Self, ClassificationError> {
        let invalid = || ClassificationError::InvalidVersion {
            version: version.to_string(),
        };

        let (base, build) = match version.find('-') {
            Some(pos) if pos > 0 => (&version[..pos], Some(version[pos + 1..].to_string())),
            _ => (version, None),
        };

        let mut parts = base.splitn(3, '.');
        let major = parts.next().ok_or_else(invalid)?;
        let minor = parts.next().ok_or_else(invalid)?;
        let rest = parts.next().unwrap_or_default().to_string();

        Ok(Self {
            major: major.trim().parse().map_err(|_| invalid())?,
            minor: minor.trim().parse().map_err(|_| invalid())?,
            rest,
            build,
        })
    }

    pub fn series(&self) -> Series {
        if self.major >= 4 && self.minor % 2 == 0 {
            Series::Release {
                major: self.major,
                minor: self.minor,
            }
        } else {
            Series::Testing
        }
    }

    /// Whether the build identifier carries the `~` stable marker.
    pub fn is_stable(&self) -> bool {
        self.build
            .as_deref()
            .and_then(|build| build.find('~'))
            .is_some_and(|pos| pos > 0)
    }

    /// Series segment of the remote path.
    pub fn series_path(&self, kind: RepoKind) -> String {
        match self.series() {
            Series::Release { major, minor } => {
                if kind.uses_release_suffix() && !self.is_stable() {
                    format!("{}.{}-release", major, minor)
                } else {
                    format!("{}.{}", major, minor)
                }
            }
            Series::Testing => "t".to_string(),
        }
    }

    /// Debian component for this version.
    pub fn component(&self) -> String {
        match self.series() {
            Series::Release { major, minor } if self.is_stable() => {
                format!("stable-{}.{}", major, minor)
            }
            Series::Release { major, minor } => format!("release-{}.{}", major, minor),
            Series::Testing => "unstable".to_string(),
        }
    }
}

impl FromStr for VersionInfo {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if !self.rest.is_empty() {
            write!(f, ".{}", self.rest)?;
        }
        if let Some(build) = &self.build {
            write!(f, "-{}", build)?;
        }
        Ok(())
    }
}
