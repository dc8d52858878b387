//! Error types for the transcoding engine.
//!
//! Detection problems (no version, no encoders) never show up here: probing is
//! best-effort and degrades to `None` or an empty encoder list instead.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which half of the output an encoder was needed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => f.write_str("video"),
            Self::Audio => f.write_str("audio"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Source file is missing or unreadable: {}", .path.display())]
    UnreadableSource { path: PathBuf },

    #[error("Unsupported target container: '{format}' (expected mp4, webm or ogg)")]
    UnsupportedContainer { format: String },

    #[error("No {stream} encoder found matching '{keyword}'")]
    EncoderNotFound { stream: StreamKind, keyword: String },

    #[error("Profile not found: '{name}'")]
    ProfileNotFound { name: String },

    #[error("Failed to parse profile {}", .path.display())]
    ProfileInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to execute {}", .binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Encode failed with exit code {}: {}", fmt_exit(.exit_code), .output_tail.join(" | "))]
    EncodeFailed {
        exit_code: Option<i32>,
        output_tail: Vec<String>,
    },

    #[error("Fast-start post-processing failed with exit code {}", fmt_exit(.exit_code))]
    PostProcessFailed { exit_code: Option<i32> },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn fmt_exit(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none (terminated by signal)".to_string())
}

pub type Result<T> = std::result::Result<T, TranscodeError>;
