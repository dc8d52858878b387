// Tool version detection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::cache::{Cache, CacheEntry, CacheKey};
use super::parse::parse_version;
use super::runner::ProcessRunner;

/// Release number of the installed ffmpeg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

    pub fn parts(&self) -> [u32; 3] {
        [self.major, self.minor, self.patch]
    }

    /// `self >= other` over the components `other` names; see
    /// [`is_version_greater_or_equal`]
    pub fn at_least(&self, other: &[u32]) -> bool {
        is_version_greater_or_equal(&self.parts(), other)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Compare two version prefixes.
///
/// Only the first `min(a.len(), b.len())` components take part; anything past
/// that is ignored, so `[1, 2, 3] >= [1, 2]` holds whatever the patch level.
/// Callers pass the prefix they care about. `a` is at least `b` when no
/// compared component of `a` is smaller than its counterpart in `b`.
pub fn is_version_greater_or_equal(a: &[u32], b: &[u32]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x >= y)
}

/// Version probe backed by the capability cache.
///
/// A detected version, or the failure sentinel, is written once and then
/// served from the cache until it is cleared externally.
pub struct VersionProbe<'a> {
    runner: &'a dyn ProcessRunner,
    cache: &'a dyn Cache,
    binary: &'a Path,
}

impl<'a> VersionProbe<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, cache: &'a dyn Cache, binary: &'a Path) -> Self {
        Self {
            runner,
            cache,
            binary,
        }
    }

    /// Installed version, or `None` if it could not be determined
    pub fn get_version(&self) -> Option<Version> {
        if let Some(CacheEntry::Version(cached)) = self.cache.read(CacheKey::Version) {
            tracing::debug!(version = ?cached, "version cache hit");
            return cached;
        }

        let detected = self.probe();
        match detected {
            Some(v) => tracing::debug!(version = %v, "detected ffmpeg version"),
            None => tracing::warn!(
                binary = %self.binary.display(),
                "could not determine ffmpeg version, assuming legacy behaviour"
            ),
        }

        self.cache.write(CacheEntry::Version(detected));
        detected
    }

    fn probe(&self) -> Option<Version> {
        let output = match self.runner.run(self.binary, &["-version".to_string()]) {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(error = %e, "failed to run version query");
                return None;
            }
        };

        if !output.success() {
            return None;
        }

        output.lines.first().and_then(|line| parse_version(line))
    }
}
