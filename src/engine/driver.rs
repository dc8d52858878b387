//! Version-specific ffmpeg command lines.
//!
//! ffmpeg changed its option syntax several times in the 0.x series. Each
//! `Driver` variant knows the conventions of one generation; the variant is
//! picked once from the detected version.

use std::fmt;
use std::path::Path;

use super::converter::ConvertOptions;
use super::factory::ContainerFormat;
use super::profile::Profile;
use super::version::Version;

/// Command-line dialect of one ffmpeg generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// 0.6 and older
    Legacy06,
    /// 0.8
    Series08,
    /// 0.9 and 0.10
    Series010,
    /// 0.11 onwards
    Current,
}

/// Everything one encode needs
#[derive(Debug, Clone, Copy)]
pub struct EncodeJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub container: ContainerFormat,
    pub video_encoder: &'a str,
    pub audio_encoder: &'a str,
    pub profile: &'a Profile,
    pub options: &'a ConvertOptions,
}

impl Driver {
    /// Pick the dialect for `version`, newest band first.
    ///
    /// An unknown version gets the legacy dialect, which every release still
    /// understands best.
    pub fn select(version: Option<Version>) -> Self {
        let Some(version) = version else {
            return Driver::Legacy06;
        };

        if version.at_least(&[0, 11, 0]) {
            Driver::Current
        } else if version.at_least(&[0, 9, 0]) {
            Driver::Series010
        } else if version.at_least(&[0, 8, 0]) {
            Driver::Series08
        } else {
            Driver::Legacy06
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Legacy06 => "0.6-series",
            Self::Series08 => "0.8-series",
            Self::Series010 => "0.10-series",
            Self::Current => "current",
        }
    }

    fn uses_stream_specifiers(&self) -> bool {
        matches!(self, Self::Series010 | Self::Current)
    }

    fn video_codec_flag(&self) -> &'static str {
        if self.uses_stream_specifiers() { "-c:v" } else { "-vcodec" }
    }

    fn audio_codec_flag(&self) -> &'static str {
        if self.uses_stream_specifiers() { "-c:a" } else { "-acodec" }
    }

    fn video_bitrate_flag(&self) -> &'static str {
        if self.uses_stream_specifiers() { "-b:v" } else { "-b" }
    }

    fn audio_bitrate_flag(&self) -> &'static str {
        if self.uses_stream_specifiers() { "-b:a" } else { "-ab" }
    }

    fn preset_flag(&self) -> &'static str {
        match self {
            Self::Legacy06 => "-vpre",
            _ => "-preset",
        }
    }

    /// Full argument list for one encode, output path last
    pub fn encode_arguments(&self, job: &EncodeJob<'_>) -> Vec<String> {
        let mut args = Vec::new();

        if job.options.overwrite {
            args.push("-y".to_string());
        }
        args.push("-i".to_string());
        args.push(job.input.to_string_lossy().to_string());

        self.push_video_args(&mut args, job);
        self.push_audio_args(&mut args, job);

        args.extend(job.profile.extra_args());

        args.push("-f".to_string());
        args.push(job.container.muxer().to_string());
        args.push(job.output.to_string_lossy().to_string());
        args
    }

    fn push_video_args(&self, args: &mut Vec<String>, job: &EncodeJob<'_>) {
        let profile = job.profile;

        push_pair(args, self.video_codec_flag(), job.video_encoder);

        if let Some(preset) = profile.get_string("video", "preset") {
            push_pair(args, self.preset_flag(), &preset);
        }
        if self.uses_stream_specifiers() {
            if let Some(level) = profile.get_string("video", "profile") {
                push_pair(args, "-profile:v", &level);
            }
        }
        if let Some(bitrate) = profile.get_string("video", "bitrate") {
            push_pair(args, self.video_bitrate_flag(), &bitrate);
        }
        if let Some(rate) = profile.get_string("video", "framerate") {
            push_pair(args, "-r", &rate);
        }
        if let Some(pix_fmt) = profile.get_string("video", "pixel_format") {
            push_pair(args, "-pix_fmt", &pix_fmt);
        }

        self.push_scale_args(args, job.options.width, job.options.height);
    }

    fn push_scale_args(&self, args: &mut Vec<String>, width: Option<u32>, height: Option<u32>) {
        match (self, width, height) {
            (_, None, None) => {}
            (Self::Current, w, h) => {
                let side = |v: Option<u32>| v.map_or("-2".to_string(), |v| v.to_string());
                push_pair(args, "-vf", &format!("scale={}:{}", side(w), side(h)));
            }
            (_, Some(w), Some(h)) => push_pair(args, "-s", &format!("{}x{}", w, h)),
            (driver, w, h) => {
                tracing::warn!(
                    driver = driver.name(),
                    width = ?w,
                    height = ?h,
                    "driver needs both width and height to scale, keeping source size"
                );
            }
        }
    }

    fn push_audio_args(&self, args: &mut Vec<String>, job: &EncodeJob<'_>) {
        if job.options.no_audio {
            args.push("-an".to_string());
            return;
        }

        let profile = job.profile;
        push_pair(args, self.audio_codec_flag(), job.audio_encoder);

        // The native aac encoder sat behind -strict for the whole 0.x series
        if job.audio_encoder == "aac" {
            push_pair(args, "-strict", "experimental");
        }
        if let Some(bitrate) = profile.get_string("audio", "bitrate") {
            push_pair(args, self.audio_bitrate_flag(), &bitrate);
        }
        if let Some(rate) = profile.get_string("audio", "sample_rate") {
            push_pair(args, "-ar", &rate);
        }
        if let Some(channels) = profile.get_string("audio", "channels") {
            push_pair(args, "-ac", &channels);
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: &str) {
    args.push(flag.to_string());
    args.push(value.to_string());
}
