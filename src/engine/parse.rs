//! Text scraping of ffmpeg output.
//!
//! Everything here is a pure function over captured lines so it can be tested
//! against sample output without running ffmpeg.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::version::Version;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+\s+(?:version\s+)?n?(\d+)\.(\d+)\.(\d+)").expect("valid version regex")
});

// Flag column, then a name of two or more characters, then a description.
// The flag class covers both the legacy `-formats` and the modern `-encoders`
// column layouts.
static CAPABILITY_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Z .]+)\s+(\S{2,})\s+(.*)$").expect("valid capability row regex")
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid duration regex")
});

static DIMENSIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([1-9]\d*)x([1-9]\d*)$").expect("valid dimensions regex"));

/// Stream type letters that open a row of the modern `-encoders` table
const STREAM_TYPES: &[char] = &['V', 'A', 'S'];

/// Legacy `-formats` tables mark encoding support with `E` anywhere in the flags
const ENCODE_FLAG: char = 'E';

/// What `ffmpeg -i <file>` reports about a source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Seconds; `None` when no Duration line was found
    pub duration: Option<f64>,
    pub video_streams: u32,
    pub audio_streams: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Parse the first line of `ffmpeg -version`
pub fn parse_version(first_line: &str) -> Option<Version> {
    let caps = VERSION_RE.captures(first_line.trim_start())?;
    let major = caps[1].parse().ok()?;
    let minor = caps[2].parse().ok()?;
    let patch = caps[3].parse().ok()?;
    Some(Version::new(major, minor, patch))
}

/// Collect encoder names from a capability table, sorted lexicographically.
///
/// Comma-joined names (`libx264,x264`) are split into aliases. Duplicates are
/// kept.
pub fn parse_encoders<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut encoders = Vec::new();

    for line in lines {
        let Some(caps) = CAPABILITY_ROW_RE.captures(line.as_ref()) else {
            continue;
        };

        if !can_encode(&caps[1]) {
            continue;
        }

        encoders.extend(
            caps[2]
                .split(',')
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        );
    }

    encoders.sort();
    encoders
}

fn can_encode(flags: &str) -> bool {
    flags.trim_start().starts_with(STREAM_TYPES) || flags.contains(ENCODE_FLAG)
}

/// Extract duration, stream counts and video dimensions from `ffmpeg -i` output
pub fn parse_media_info<S: AsRef<str>>(lines: &[S]) -> MediaInfo {
    let mut info = MediaInfo::default();

    for line in lines {
        let line = line.as_ref();

        if let Some(caps) = DURATION_RE.captures(line) {
            let hours: f64 = caps[1].parse().unwrap_or(0.0);
            let minutes: f64 = caps[2].parse().unwrap_or(0.0);
            let seconds: f64 = caps[3].parse().unwrap_or(0.0);
            info.duration = Some(hours * 3600.0 + minutes * 60.0 + seconds);
            continue;
        }

        if !line.contains("Stream #") {
            continue;
        }

        if line.contains("Video:") {
            info.video_streams += 1;
            if let Some((width, height)) = find_dimensions(line) {
                info.width = Some(width);
                info.height = Some(height);
            }
        } else if line.contains("Audio:") {
            info.audio_streams += 1;
        }
    }

    info
}

/// Last `<w>x<h>` field on a stream line
fn find_dimensions(line: &str) -> Option<(u32, u32)> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|field| {
            let caps = DIMENSIONS_RE.captures(field)?;
            Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
        })
        .last()
}
