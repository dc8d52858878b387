// Profile lookup across configured and built-in directories

use h5transcode::engine::{ProfileRepository, TranscodeError, builtin_profiles_dir};
use proptest::prelude::*;
use tempfile::TempDir;

use crate::common::fake_runner::FakeRunner;
use crate::common::helpers::*;

#[test]
fn test_builtin_profiles_are_listed() {
    let h = Harness::new(FakeRunner::modern());

    let mut names = h.transcoder.list_profiles();
    names.sort();
    assert_eq!(names, ["default", "hq", "mobile"]);
    assert_eq!(h.transcoder.profiles().search_dirs(), [builtin_profiles_dir()]);
}

#[test]
fn test_configured_directory_shadows_builtin() {
    let dir = TempDir::new().unwrap();
    write_profile(dir.path(), "default", r#"{"video": {"bitrate": "999k"}}"#);
    write_profile(dir.path(), "archive", r#"{"video": {"bitrate": "8M"}}"#);

    let mut config = test_config();
    config.profiles.search_dirs = vec![dir.path().to_path_buf()];
    let h = Harness::with_config(FakeRunner::modern(), config);

    let profile = h.transcoder.get_profile("default").unwrap();
    assert_eq!(profile.get_string("video", "bitrate").as_deref(), Some("999k"));

    // Shadowed names are still listed once per directory
    let names = h.transcoder.list_profiles();
    assert_eq!(names.iter().filter(|n| *n == "default").count(), 2);
    assert!(names.contains(&"archive".to_string()));
    assert!(names.contains(&"hq".to_string()));

    let converter = h.transcoder.create_converter("webm", "default").unwrap();
    assert_eq!(converter.profile().get_string("video", "bitrate").as_deref(), Some("999k"));
}

#[test]
fn test_missing_directories_are_skipped() {
    let dir = TempDir::new().unwrap();
    let repo = ProfileRepository::new(vec![dir.path().join("nope"), builtin_profiles_dir()]);

    assert!(repo.get_profile("hq").is_ok());
    assert_eq!(repo.list_profiles().len(), 3);
}

#[test]
fn test_invalid_profile_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_profile(dir.path(), "broken", "{ not json");
    let repo = ProfileRepository::new(vec![dir.path().to_path_buf()]);

    let err = repo.get_profile("broken").err().unwrap();
    assert!(matches!(err, TranscodeError::ProfileInvalid { path: ref p, .. } if *p == path));
}

#[test]
fn test_path_like_names_are_not_found() {
    let repo = ProfileRepository::with_builtin(&[]);
    for name in ["../default", "profiles/default", "..", ".", ""] {
        assert!(
            matches!(repo.get_profile(name), Err(TranscodeError::ProfileNotFound { .. })),
            "{:?}",
            name
        );
    }
}

#[test]
fn test_other_extensions_are_ignored() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "{}").unwrap();
    std::fs::write(dir.path().join("default.json"), "{}").unwrap();
    write_profile(dir.path(), "tiny", "{}");

    let repo = ProfileRepository::new(vec![dir.path().to_path_buf()]);
    assert_eq!(repo.list_profiles(), ["tiny"]);
    assert!(repo.get_profile("notes").is_err());
}

proptest! {
    #[test]
    fn prop_written_profiles_are_found(name in "[a-z][a-z0-9_-]{0,15}", bitrate in 100u32..10_000) {
        let dir = TempDir::new().unwrap();
        let json = format!(r#"{{"video": {{"bitrate": "{}k"}}}}"#, bitrate);
        write_profile(dir.path(), &name, &json);

        let repo = ProfileRepository::new(vec![dir.path().to_path_buf()]);
        let profile = repo.get_profile(&name).unwrap();
        prop_assert_eq!(&profile.name, &name);
        prop_assert_eq!(profile.get_string("video", "bitrate"), Some(format!("{}k", bitrate)));
        prop_assert_eq!(repo.list_profiles(), vec![name]);
    }
}
