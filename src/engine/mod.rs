// Transcoding engine - independent of the CLI

pub mod cache;
pub mod capabilities;
pub mod converter;
pub mod driver;
pub mod error;
pub mod factory;
pub mod parse;
pub mod profile;
pub mod runner;
pub mod version;

pub use cache::{Cache, CacheEntry, CacheKey, FileCache, MemoryCache};
pub use capabilities::CapabilityDetector;
pub use converter::{ConversionReport, ConvertOptions, Converter, ConverterKind};
pub use driver::{Driver, EncodeJob};
pub use error::{Result, StreamKind, TranscodeError};
pub use factory::{ContainerFormat, ConverterFactory, find_encoder};
pub use parse::{MediaInfo, parse_encoders, parse_media_info, parse_version};
pub use profile::{Profile, ProfileRepository, builtin_profiles_dir};
pub use runner::{ProcessOutput, ProcessRunner, SystemRunner};
pub use version::{Version, VersionProbe, is_version_greater_or_equal};

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;

/// Entry point for every request: owns the process runner, the capability
/// cache and the profile search path.
pub struct Transcoder {
    config: Config,
    runner: Arc<dyn ProcessRunner>,
    cache: Arc<dyn Cache>,
    profiles: ProfileRepository,
}

impl Transcoder {
    /// Real processes, with the cache chosen by `config.cache`
    pub fn new(config: Config) -> Self {
        let cache: Arc<dyn Cache> = match config.cache.resolved_dir() {
            Some(dir) => Arc::new(FileCache::in_dir(&dir)),
            None => Arc::new(MemoryCache::new()),
        };
        Self::with_parts(config, Arc::new(SystemRunner), cache)
    }

    pub fn with_parts(config: Config, runner: Arc<dyn ProcessRunner>, cache: Arc<dyn Cache>) -> Self {
        let profiles = ProfileRepository::with_builtin(&config.profiles.search_dirs);
        Self {
            config,
            runner,
            cache,
            profiles,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileRepository {
        &self.profiles
    }

    /// Installed ffmpeg version, `None` if detection failed
    pub fn get_version(&self) -> Option<Version> {
        VersionProbe::new(&*self.runner, &*self.cache, self.ffmpeg()).get_version()
    }

    /// Sorted encoder names the installed ffmpeg reports
    pub fn get_encoders(&self) -> Vec<String> {
        CapabilityDetector::new(&*self.runner, &*self.cache, self.ffmpeg()).get_encoders()
    }

    /// Dialect used for the installed version
    pub fn driver(&self) -> Driver {
        Driver::select(self.get_version())
    }

    pub fn get_profile(&self, name: &str) -> Result<Profile> {
        self.profiles.get_profile(name)
    }

    pub fn list_profiles(&self) -> Vec<String> {
        self.profiles.list_profiles()
    }

    /// Duration, stream counts and dimensions of `path` as ffmpeg reports them
    pub fn get_video_info(&self, path: &Path) -> Result<MediaInfo> {
        ensure_readable(path)?;

        let args = vec!["-i".to_string(), path.to_string_lossy().to_string()];
        // Without an output file ffmpeg exits non-zero; the banner is all we need
        let output = self
            .runner
            .run(self.ffmpeg(), &args)
            .map_err(|source| TranscodeError::Spawn {
                binary: self.ffmpeg().to_path_buf(),
                source,
            })?;

        let info = parse_media_info(&output.lines);
        tracing::debug!(path = %path.display(), info = ?info, "probed source");
        Ok(info)
    }

    pub fn create_converter(&self, target_format: &str, profile_name: &str) -> Result<Converter> {
        ConverterFactory::new(&self.runner, &*self.cache, &self.profiles, &self.config)
            .create_converter(target_format, profile_name)
    }

    /// Convert `src` into `dst` with the named container and profile.
    ///
    /// Missing dimensions are taken from the source, and a source without
    /// audio always converts with `no_audio`.
    pub fn create(
        &self,
        src: &Path,
        dst: &Path,
        target_format: &str,
        profile_name: &str,
        options: &ConvertOptions,
    ) -> Result<ConversionReport> {
        let info = self.get_video_info(src)?;
        let options = merge_source_info(options, &info);

        let converter = self.create_converter(target_format, profile_name)?;
        converter.create(src, dst, &options)
    }

    fn ffmpeg(&self) -> &Path {
        &self.config.tool.ffmpeg_path
    }
}

/// Fill request options from what the source reports
pub fn merge_source_info(options: &ConvertOptions, info: &MediaInfo) -> ConvertOptions {
    let mut merged = options.clone();

    if merged.width.is_none() && merged.height.is_none() {
        merged.width = info.width;
        merged.height = info.height;
    }
    if info.audio_streams == 0 {
        merged.no_audio = true;
    }

    merged
}

fn ensure_readable(path: &Path) -> Result<()> {
    let unreadable = || TranscodeError::UnreadableSource {
        path: path.to_path_buf(),
    };

    if !path.is_file() {
        return Err(unreadable());
    }
    File::open(path).map_err(|_| unreadable())?;
    Ok(())
}
