//! Encoder capability detection.

use std::path::Path;

use super::cache::{Cache, CacheEntry, CacheKey};
use super::parse::parse_encoders;
use super::runner::ProcessRunner;
use super::version::VersionProbe;

/// First release with the `-encoders` listing
pub const ENCODERS_LISTING_SINCE: [u32; 3] = [0, 8, 0];

const MODERN_LISTING_ARG: &str = "-encoders";
const LEGACY_LISTING_ARG: &str = "-formats";

/// Reports which encoders the installed ffmpeg can use
pub struct CapabilityDetector<'a> {
    runner: &'a dyn ProcessRunner,
    cache: &'a dyn Cache,
    binary: &'a Path,
}

impl<'a> CapabilityDetector<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, cache: &'a dyn Cache, binary: &'a Path) -> Self {
        Self {
            runner,
            cache,
            binary,
        }
    }

    /// Sorted encoder names, empty if detection failed.
    ///
    /// An empty probe result is not cached so the next call tries again.
    pub fn get_encoders(&self) -> Vec<String> {
        if let Some(CacheEntry::Encoders(cached)) = self.cache.read(CacheKey::Encoders) {
            tracing::debug!(count = cached.len(), "encoder cache hit");
            return cached;
        }

        let arg = self.listing_arg();
        let lines = match self.runner.run(self.binary, &[arg.to_string()]) {
            Ok(output) => output.lines,
            Err(e) => {
                tracing::warn!(binary = %self.binary.display(), error = %e, "failed to list encoders");
                Vec::new()
            }
        };

        if lines.is_empty() {
            tracing::warn!(arg, "encoder listing produced no output, not caching");
            return Vec::new();
        }

        let encoders = parse_encoders(&lines);
        tracing::debug!(arg, count = encoders.len(), "detected encoders");
        self.cache.write(CacheEntry::Encoders(encoders.clone()));
        encoders
    }

    fn listing_arg(&self) -> &'static str {
        let version = VersionProbe::new(self.runner, self.cache, self.binary).get_version();
        match version {
            Some(v) if v.at_least(&ENCODERS_LISTING_SINCE) => MODERN_LISTING_ARG,
            _ => LEGACY_LISTING_ARG,
        }
    }
}
