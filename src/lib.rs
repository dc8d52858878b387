//! Drive ffmpeg to produce video browsers can play.
//!
//! The [`engine`] module probes the installed ffmpeg, picks the command-line
//! dialect for its version, resolves named encoding profiles and runs one
//! conversion per request.

pub mod config;
pub mod engine;
