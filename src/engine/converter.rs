// One end-to-end conversion

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::driver::{Driver, EncodeJob};
use super::error::{Result, TranscodeError};
use super::factory::ContainerFormat;
use super::profile::Profile;
use super::runner::{ProcessOutput, ProcessRunner};
use crate::config::Config;

/// Lines of tool output kept in an `EncodeFailed` error
const ERROR_TAIL_LINES: usize = 5;

/// Per-request options layered on top of the profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Drop the audio track
    #[serde(default)]
    pub no_audio: bool,
    /// Replace an existing destination file
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    /// Single encode straight to the destination
    Generic,
    /// Encode to a temporary file, then fast-start rewrite into the destination
    Mp4,
}

#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub output: PathBuf,
    pub driver: Driver,
    pub video_encoder: String,
    pub audio_encoder: String,
    pub post_processed: bool,
    pub elapsed: Duration,
}

pub struct Converter {
    runner: Arc<dyn ProcessRunner>,
    driver: Driver,
    config: Config,
    profile: Profile,
    container: ContainerFormat,
    video_encoder: String,
    audio_encoder: String,
    kind: ConverterKind,
}

impl Converter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        driver: Driver,
        config: Config,
        profile: Profile,
        container: ContainerFormat,
        video_encoder: String,
        audio_encoder: String,
    ) -> Self {
        let kind = match container {
            ContainerFormat::Mp4 => ConverterKind::Mp4,
            _ => ConverterKind::Generic,
        };

        Self {
            runner,
            driver,
            config,
            profile,
            container,
            video_encoder,
            audio_encoder,
            kind,
        }
    }

    pub fn kind(&self) -> ConverterKind {
        self.kind
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn container(&self) -> ContainerFormat {
        self.container
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn video_encoder(&self) -> &str {
        &self.video_encoder
    }

    pub fn audio_encoder(&self) -> &str {
        &self.audio_encoder
    }

    /// Arguments the primary encode would run with when writing to `output`
    pub fn encode_arguments(&self, src: &Path, output: &Path, options: &ConvertOptions) -> Vec<String> {
        self.driver.encode_arguments(&EncodeJob {
            input: src,
            output,
            container: self.container,
            video_encoder: &self.video_encoder,
            audio_encoder: &self.audio_encoder,
            profile: &self.profile,
            options,
        })
    }

    /// Convert `src` into `dst`
    pub fn create(&self, src: &Path, dst: &Path, options: &ConvertOptions) -> Result<ConversionReport> {
        let started = Instant::now();
        tracing::info!(
            src = %src.display(),
            dst = %dst.display(),
            driver = %self.driver,
            video = %self.video_encoder,
            audio = %self.audio_encoder,
            "starting conversion"
        );

        let post_processed = match self.kind {
            ConverterKind::Generic => {
                self.encode(src, dst, options)?;
                false
            }
            ConverterKind::Mp4 => {
                self.create_mp4(src, dst, options)?;
                true
            }
        };

        let elapsed = started.elapsed();
        tracing::info!(dst = %dst.display(), elapsed_ms = elapsed.as_millis() as u64, "conversion finished");

        Ok(ConversionReport {
            output: dst.to_path_buf(),
            driver: self.driver,
            video_encoder: self.video_encoder.clone(),
            audio_encoder: self.audio_encoder.clone(),
            post_processed,
            elapsed,
        })
    }

    fn create_mp4(&self, src: &Path, dst: &Path, options: &ConvertOptions) -> Result<()> {
        if !options.overwrite && dst.exists() {
            return Err(TranscodeError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", dst.display()),
            )));
        }

        let partial = partial_path(dst);
        if let Err(e) = self.encode(src, &partial, options) {
            remove_partial(&partial);
            return Err(e);
        }

        let result = self.fast_start(&partial, dst);
        remove_partial(&partial);
        result
    }

    fn encode(&self, src: &Path, output: &Path, options: &ConvertOptions) -> Result<()> {
        let args = self.encode_arguments(src, output, options);
        let result = self.run(&self.config.tool.ffmpeg_path, &args)?;

        if !result.success() {
            return Err(TranscodeError::EncodeFailed {
                exit_code: result.exit_code,
                output_tail: result.tail(ERROR_TAIL_LINES),
            });
        }
        Ok(())
    }

    /// Move the moov atom to the front so playback can start before the
    /// download finishes
    fn fast_start(&self, partial: &Path, dst: &Path) -> Result<()> {
        let args = vec![
            partial.to_string_lossy().to_string(),
            dst.to_string_lossy().to_string(),
        ];
        let result = self.run(&self.config.tool.faststart_path, &args)?;

        if !result.success() {
            return Err(TranscodeError::PostProcessFailed {
                exit_code: result.exit_code,
            });
        }
        tracing::debug!(dst = %dst.display(), "fast-start rewrite done");
        Ok(())
    }

    fn run(&self, binary: &Path, args: &[String]) -> Result<ProcessOutput> {
        self.runner
            .run(binary, args)
            .map_err(|source| TranscodeError::Spawn {
                binary: binary.to_path_buf(),
                source,
            })
    }
}

/// Sibling of `dst` the primary mp4 encode writes to
fn partial_path(dst: &Path) -> PathBuf {
    let file_name = dst
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    dst.with_file_name(format!("{}.{}.part.mp4", file_name, Uuid::new_v4()))
}

fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output"),
    }
}
