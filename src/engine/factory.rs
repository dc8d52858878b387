//! Builds a converter from a target container, a profile and what the
//! installed ffmpeg reports.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::cache::Cache;
use super::capabilities::CapabilityDetector;
use super::converter::Converter;
use super::driver::Driver;
use super::error::{Result, StreamKind, TranscodeError};
use super::profile::ProfileRepository;
use super::runner::ProcessRunner;
use super::version::VersionProbe;
use crate::config::Config;

/// Target containers browsers can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    Mp4,
    Webm,
    Ogg,
}

impl ContainerFormat {
    pub const ALL: [ContainerFormat; 3] = [Self::Mp4, Self::Webm, Self::Ogg];

    /// Look up a container by identifier (`mp4`, `webm`, `ogg`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mp4" => Some(Self::Mp4),
            "webm" => Some(Self::Webm),
            "ogg" => Some(Self::Ogg),
            _ => None,
        }
    }

    /// Container implied by a file extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "ogv" => Some(Self::Ogg),
            other => Self::from_name(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Ogg => "ogg",
        }
    }

    /// Muxer name passed to `-f`
    pub fn muxer(&self) -> &'static str {
        self.as_str()
    }

    /// Substrings the video and audio encoder names must contain
    pub fn codec_requirement(&self) -> (&'static str, &'static str) {
        match self {
            Self::Mp4 => ("x264", "aac"),
            Self::Webm => ("vpx", "vorbis"),
            Self::Ogg => ("theora", "vorbis"),
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First encoder in sorted order whose name contains `keyword`
pub fn find_encoder<'e>(encoders: &'e [String], keyword: &str) -> Option<&'e str> {
    encoders
        .iter()
        .find(|name| name.contains(keyword))
        .map(String::as_str)
}

pub struct ConverterFactory<'a> {
    runner: &'a Arc<dyn ProcessRunner>,
    cache: &'a dyn Cache,
    profiles: &'a ProfileRepository,
    config: &'a Config,
}

impl<'a> ConverterFactory<'a> {
    pub fn new(
        runner: &'a Arc<dyn ProcessRunner>,
        cache: &'a dyn Cache,
        profiles: &'a ProfileRepository,
        config: &'a Config,
    ) -> Self {
        Self {
            runner,
            cache,
            profiles,
            config,
        }
    }

    /// Resolve everything a conversion to `target_format` with `profile_name`
    /// needs. Fails on the first missing piece.
    pub fn create_converter(&self, target_format: &str, profile_name: &str) -> Result<Converter> {
        let profile = self.profiles.get_profile(profile_name)?;

        let container = ContainerFormat::from_name(target_format).ok_or_else(|| {
            TranscodeError::UnsupportedContainer {
                format: target_format.to_string(),
            }
        })?;
        let (video_keyword, audio_keyword) = container.codec_requirement();

        let binary = self.config.tool.ffmpeg_path.as_path();
        let encoders = CapabilityDetector::new(&**self.runner, self.cache, binary).get_encoders();

        let video_encoder = find_encoder(&encoders, video_keyword).ok_or_else(|| {
            TranscodeError::EncoderNotFound {
                stream: StreamKind::Video,
                keyword: video_keyword.to_string(),
            }
        })?;
        let audio_encoder = find_encoder(&encoders, audio_keyword).ok_or_else(|| {
            TranscodeError::EncoderNotFound {
                stream: StreamKind::Audio,
                keyword: audio_keyword.to_string(),
            }
        })?;

        let version = VersionProbe::new(&**self.runner, self.cache, binary).get_version();
        let driver = Driver::select(version);
        tracing::debug!(
            container = %container,
            profile = profile_name,
            driver = %driver,
            video = video_encoder,
            audio = audio_encoder,
            "converter resolved"
        );

        Ok(Converter::new(
            Arc::clone(self.runner),
            driver,
            self.config.clone(),
            profile,
            container,
            video_encoder.to_string(),
            audio_encoder.to_string(),
        ))
    }
}
