use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::error::{Result, TranscodeError};

pub const PROFILE_EXTENSION: &str = "profile";

/// Profiles shipped with the crate; always searched last
pub fn builtin_profiles_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/profiles"))
}

/// Named bag of encoding parameters.
///
/// The parameters are kept as loaded. Only driver argument construction looks
/// inside, through the accessors below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub params: Value,
}

impl Profile {
    pub fn new(name: impl Into<String>, params: Value) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Value at `section.key`, e.g. `("video", "bitrate")`
    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        self.params.get(section)?.get(key)
    }

    /// Scalar at `section.key` rendered as a command-line value
    pub fn get_string(&self, section: &str, key: &str) -> Option<String> {
        match self.get(section, key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Extra arguments from `args`: either one shell-style string or a list
    pub fn extra_args(&self) -> Vec<String> {
        match self.params.get("args") {
            Some(Value::String(s)) => shlex::split(s).unwrap_or_else(|| {
                tracing::warn!(profile = %self.name, "unbalanced quoting in profile args, ignoring");
                Vec::new()
            }),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Resolves profile names against an ordered list of directories
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    search_dirs: Vec<PathBuf>,
}

impl ProfileRepository {
    /// Search exactly `search_dirs`, in order
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Search `configured` first, then the built-in directory
    pub fn with_builtin(configured: &[PathBuf]) -> Self {
        let mut search_dirs = configured.to_vec();
        search_dirs.push(builtin_profiles_dir());
        Self::new(search_dirs)
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Load `<name>.profile` from the first directory that has a readable copy
    pub fn get_profile(&self, name: &str) -> Result<Profile> {
        if !is_plain_name(name) {
            return Err(TranscodeError::ProfileNotFound {
                name: name.to_string(),
            });
        }

        let file_name = format!("{}.{}", name, PROFILE_EXTENSION);
        for dir in &self.search_dirs {
            if !dir.is_dir() {
                continue;
            }

            let path = dir.join(&file_name);
            let Ok(json) = fs::read_to_string(&path) else {
                continue;
            };

            let params = serde_json::from_str(&json)
                .map_err(|source| TranscodeError::ProfileInvalid { path: path.clone(), source })?;
            tracing::debug!(profile = name, path = %path.display(), "loaded profile");
            return Ok(Profile::new(name, params));
        }

        Err(TranscodeError::ProfileNotFound {
            name: name.to_string(),
        })
    }

    /// Every profile name in every readable directory, in discovery order.
    /// A name shadowed by an earlier directory is still listed.
    pub fn list_profiles(&self) -> Vec<String> {
        let mut names = Vec::new();
        for dir in &self.search_dirs {
            names.extend(profiles_in(dir));
        }
        names
    }
}

fn profiles_in(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().and_then(|s| s.to_str()) == Some(PROFILE_EXTENSION)
        })
        .filter_map(|entry| {
            entry
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .collect()
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}
