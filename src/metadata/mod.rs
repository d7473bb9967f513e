//! Build metadata: version, timestamp and source-control identifiers exposed
//! as compiler definitions.
//!
//! Nothing here fails the build. Source-control queries that cannot be
//! answered degrade to `"unknown"` for the revision and branch and to
//! `false` for the dirty flag, while [`Probed`] keeps the distinction for
//! callers that care.

mod defines;
mod source_control;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone};
use thiserror::Error;

pub use defines::{Define, DefineValue, DefinesFormat, render_defines};
pub use source_control::{Git, Probed, SourceControl, SourceControlError};

pub const UNKNOWN: &str = "unknown";
pub const DEFAULT_PREFIX: &str = "FIRMWARE";
pub const DEFAULT_VERSION: Version = Version::new(1, 0, 0);

const BUILD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const BUILD_DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("invalid version '{0}', expected MAJOR.MINOR.PATCH")]
    InvalidVersion(String),

    #[error("unknown defines format '{0}', expected cflags, cargo, header or env")]
    InvalidFormat(String),

    #[error("invalid define prefix '{0}', expected a C identifier")]
    InvalidPrefix(String),

    #[error("failed to write build metadata {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MetadataError::InvalidVersion(s.to_string());
        let parts: Vec<_> = s.trim().split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(invalid());
        };
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
            patch: patch.parse().map_err(|_| invalid())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOptions {
    /// Prefix for every define name, e.g. `FIRMWARE` gives `FIRMWARE_GIT_REV`.
    pub prefix: String,
    pub version: Version,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            version: DEFAULT_VERSION,
        }
    }
}

impl MetadataOptions {
    pub fn validate(&self) -> Result<(), MetadataError> {
        let mut chars = self.prefix.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(MetadataError::InvalidPrefix(self.prefix.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetadata {
    pub prefix: String,
    pub version: Version,
    pub revision: Probed<String>,
    pub branch: Probed<String>,
    pub dirty: Probed<bool>,
    pub build_time: String,
    pub build_date: String,
}

/// Describe the current build from the git checkout in the working directory.
pub fn describe() -> BuildMetadata {
    describe_with(&Git::new(), Local::now(), &MetadataOptions::default())
}

pub fn describe_with<S, Tz>(
    source: &S,
    now: DateTime<Tz>,
    options: &MetadataOptions,
) -> BuildMetadata
where
    S: SourceControl + ?Sized,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    BuildMetadata {
        prefix: options.prefix.clone(),
        version: options.version,
        revision: source.revision().into(),
        branch: source.branch().into(),
        dirty: source.is_dirty().into(),
        build_time: now.format(BUILD_TIME_FORMAT).to_string(),
        build_date: now.format(BUILD_DATE_FORMAT).to_string(),
    }
}

impl BuildMetadata {
    pub fn revision_or_unknown(&self) -> &str {
        self.revision.known().map_or(UNKNOWN, String::as_str)
    }

    pub fn branch_or_unknown(&self) -> &str {
        self.branch.known().map_or(UNKNOWN, String::as_str)
    }

    /// Unavailable counts as clean.
    pub fn is_dirty(&self) -> bool {
        self.dirty.known().copied().unwrap_or(false)
    }

    pub fn source_control_available(&self) -> bool {
        self.revision.is_known() || self.branch.is_known() || self.dirty.is_known()
    }

    /// `MAJOR.MINOR.PATCH[-REV][-dirty]`
    pub fn version_string(&self) -> String {
        let mut version = self.version.to_string();
        if let Some(rev) = self.revision.known() {
            version.push('-');
            version.push_str(rev);
        }
        if self.is_dirty() {
            version.push_str("-dirty");
        }
        version
    }

    pub fn defines(&self) -> Vec<Define> {
        let p = &self.prefix;
        vec![
            Define::int(format!("{p}_VERSION_MAJOR"), self.version.major),
            Define::int(format!("{p}_VERSION_MINOR"), self.version.minor),
            Define::int(format!("{p}_VERSION_PATCH"), self.version.patch),
            Define::str(format!("{p}_VERSION_STRING"), self.version_string()),
            Define::str(format!("{p}_BUILD_TIME"), self.build_time.clone()),
            Define::str(format!("{p}_BUILD_DATE"), self.build_date.clone()),
            Define::str(format!("{p}_GIT_REV"), self.revision_or_unknown()),
            Define::str(format!("{p}_GIT_BRANCH"), self.branch_or_unknown()),
            Define::int(format!("{p}_GIT_DIRTY"), u32::from(self.is_dirty())),
        ]
    }

    pub fn render(&self, format: DefinesFormat) -> String {
        let guard = format!("{}_BUILD_INFO_H", self.prefix);
        render_defines(&self.defines(), format, &guard)
    }

    pub fn write_to(&self, path: &Path, format: DefinesFormat) -> Result<(), MetadataError> {
        crate::io::write_binary(path, self.render(format).as_bytes()).map_err(|source| {
            MetadataError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    pub fn log_summary(&self) {
        log::info!("Building version {}", self.version_string());
        log::info!(
            "Git: {}@{}{}",
            self.branch_or_unknown(),
            self.revision_or_unknown(),
            if self.is_dirty() { " (dirty)" } else { "" }
        );
        log::info!("Build time: {}", self.build_time);
        if !self.source_control_available() {
            log::debug!("Source control unavailable, using defaults");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    struct FakeScm {
        revision: Option<&'static str>,
        branch: Option<&'static str>,
        dirty: Option<bool>,
    }

    fn unavailable() -> SourceControlError {
        SourceControlError::EmptyOutput {
            command: "git".to_string(),
        }
    }

    impl SourceControl for FakeScm {
        fn revision(&self) -> Result<String, SourceControlError> {
            self.revision.map(str::to_string).ok_or_else(unavailable)
        }

        fn branch(&self) -> Result<String, SourceControlError> {
            self.branch.map(str::to_string).ok_or_else(unavailable)
        }

        fn is_dirty(&self) -> Result<bool, SourceControlError> {
            self.dirty.ok_or_else(unavailable)
        }
    }

    fn at_fixed_time(scm: &FakeScm) -> BuildMetadata {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 9, 5, 3).unwrap();
        describe_with(scm, now, &MetadataOptions::default())
    }

    #[test]
    fn test_version_string_clean() {
        let meta = at_fixed_time(&FakeScm {
            revision: Some("abc1234"),
            branch: Some("main"),
            dirty: Some(false),
        });
        assert_eq!(meta.version_string(), "1.0.0-abc1234");
    }

    #[test]
    fn test_version_string_dirty() {
        let meta = at_fixed_time(&FakeScm {
            revision: Some("abc1234"),
            branch: Some("main"),
            dirty: Some(true),
        });
        assert_eq!(meta.version_string(), "1.0.0-abc1234-dirty");
    }

    #[test]
    fn test_version_string_unknown_revision_dirty() {
        let meta = at_fixed_time(&FakeScm {
            revision: None,
            branch: None,
            dirty: Some(true),
        });
        assert_eq!(meta.version_string(), "1.0.0-dirty");
    }

    #[test]
    fn test_unavailable_degrades_to_defaults() {
        let meta = at_fixed_time(&FakeScm {
            revision: None,
            branch: None,
            dirty: None,
        });
        assert_eq!(meta.version_string(), "1.0.0");
        assert_eq!(meta.revision_or_unknown(), UNKNOWN);
        assert_eq!(meta.branch_or_unknown(), UNKNOWN);
        assert!(!meta.is_dirty());
        assert!(!meta.source_control_available());
        assert!(matches!(meta.dirty, Probed::Unavailable(_)));
    }

    #[test]
    fn test_clean_is_distinct_from_unavailable() {
        let meta = at_fixed_time(&FakeScm {
            revision: None,
            branch: None,
            dirty: Some(false),
        });
        assert_eq!(meta.dirty, Probed::Known(false));
        assert!(meta.source_control_available());
    }

    #[test]
    fn test_timestamps() {
        let meta = at_fixed_time(&FakeScm {
            revision: None,
            branch: None,
            dirty: None,
        });
        assert_eq!(meta.build_time, "2026-10-17 09:05:03");
        assert_eq!(meta.build_date, "20261017");
    }

    #[test]
    fn test_defines_mapping() {
        let meta = at_fixed_time(&FakeScm {
            revision: Some("abc1234"),
            branch: Some("main"),
            dirty: Some(true),
        });
        let defines = meta.defines();
        let names: Vec<_> = defines.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "FIRMWARE_VERSION_MAJOR",
                "FIRMWARE_VERSION_MINOR",
                "FIRMWARE_VERSION_PATCH",
                "FIRMWARE_VERSION_STRING",
                "FIRMWARE_BUILD_TIME",
                "FIRMWARE_BUILD_DATE",
                "FIRMWARE_GIT_REV",
                "FIRMWARE_GIT_BRANCH",
                "FIRMWARE_GIT_DIRTY",
            ]
        );
        assert_eq!(defines[0].value, DefineValue::Int(1));
        assert_eq!(
            defines[3].value,
            DefineValue::Str("1.0.0-abc1234-dirty".to_string())
        );
        assert_eq!(defines[8].value, DefineValue::Int(1));
    }

    #[test]
    fn test_custom_prefix_and_version() {
        let scm = FakeScm {
            revision: Some("deadbee"),
            branch: Some("release"),
            dirty: Some(false),
        };
        let options = MetadataOptions {
            prefix: "BADGE".to_string(),
            version: "2.3.4".parse().unwrap(),
        };
        let meta = describe_with(&scm, Utc::now(), &options);
        assert_eq!(meta.version_string(), "2.3.4-deadbee");
        assert_eq!(meta.defines()[6].name, "BADGE_GIT_REV");
        assert!(meta
            .render(DefinesFormat::Header)
            .contains("#ifndef BADGE_BUILD_INFO_H"));
    }

    #[test]
    fn test_version_from_str() {
        assert_eq!("1.2.3".parse::<Version>().unwrap(), Version::new(1, 2, 3));
        assert!("1.2".parse::<Version>().is_err());
        assert!("1.2.x".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
    }

    #[test]
    fn test_prefix_validation() {
        let mut options = MetadataOptions::default();
        options.validate().unwrap();
        options.prefix = "9LIVES".to_string();
        assert!(options.validate().is_err());
        options.prefix = "MY-FW".to_string();
        assert!(options.validate().is_err());
        options.prefix = String::new();
        assert!(options.validate().is_err());
    }
}
