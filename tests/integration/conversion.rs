// End-to-end conversions against a scripted ffmpeg

use h5transcode::engine::{ConvertOptions, Driver, TranscodeError};
use std::fs;
use std::io;

use crate::common::fake_runner::{FakeRunner, SOURCE_WITHOUT_AUDIO};
use crate::common::helpers::*;

fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
    args.windows(2).any(|w| w[0] == flag && w[1] == value)
}

#[test]
fn test_mp4_conversion_with_fast_start() {
    let h = Harness::new(FakeRunner::modern());
    let src = h.source("clip.avi");
    let dst = h.path("clip.mp4");

    let report = h
        .transcoder
        .create(&src, &dst, "mp4", "default", &ConvertOptions::default())
        .unwrap();

    assert_eq!(report.output, dst);
    assert_eq!(report.driver, Driver::Current);
    assert_eq!(report.video_encoder, "libx264");
    assert_eq!(report.audio_encoder, "aac");
    assert!(report.post_processed);

    let encodes = h.runner.encode_calls();
    assert_eq!(encodes.len(), 1);
    let partial = encodes[0].output().unwrap().to_string();
    assert!(partial.ends_with(".part.mp4"), "{}", partial);

    let src_arg = src.to_string_lossy().to_string();
    let expected = vec![
        "-i", src_arg.as_str(), "-c:v", "libx264", "-preset", "medium", "-b:v", "1200k",
        "-pix_fmt", "yuv420p", "-vf", "scale=1280:720", "-c:a", "aac", "-strict", "experimental",
        "-b:a", "128k", "-ar", "44100", "-ac", "2", "-f", "mp4", partial.as_str(),
    ];
    assert_eq!(encodes[0].args, expected);

    let faststart = h.runner.faststart_calls();
    assert_eq!(faststart.len(), 1);
    assert_eq!(faststart[0].args, [partial.clone(), dst.to_string_lossy().to_string()]);

    assert_eq!(fs::read(&dst).unwrap(), b"encoded");
    assert!(partial_files(h.dir.path()).is_empty());
}

#[test]
fn test_probe_runs_before_encode() {
    let h = Harness::new(FakeRunner::modern());
    let src = h.source("clip.avi");
    let dst = h.path("clip.webm");

    h.transcoder
        .create(&src, &dst, "webm", "default", &ConvertOptions::default())
        .unwrap();

    let calls = h.runner.calls();
    let probe = calls
        .iter()
        .position(|c| c.args.len() == 2 && c.args[0] == "-i")
        .unwrap();
    let encode = calls.iter().position(|c| c.is_encode()).unwrap();
    assert!(probe < encode);
}

#[test]
fn test_silent_source_forces_no_audio() {
    let h = Harness::new(FakeRunner::modern().with_probe(SOURCE_WITHOUT_AUDIO));
    let src = h.source("silent.avi");
    let dst = h.path("silent.webm");

    h.transcoder
        .create(&src, &dst, "webm", "default", &ConvertOptions::default())
        .unwrap();

    let encodes = h.runner.encode_calls();
    let args = &encodes[0].args;
    assert!(args.contains(&"-an".to_string()));
    assert!(!args.contains(&"-c:a".to_string()));
    assert!(!args.contains(&"-ar".to_string()));
    assert!(has_pair(args, "-vf", "scale=640:480"));
}

#[test]
fn test_caller_dimensions_win() {
    let h = Harness::new(FakeRunner::modern());
    let src = h.source("clip.avi");
    let dst = h.path("clip.webm");
    let options = ConvertOptions {
        width: Some(320),
        ..ConvertOptions::default()
    };

    h.transcoder.create(&src, &dst, "webm", "default", &options).unwrap();

    let encodes = h.runner.encode_calls();
    let args = &encodes[0].args;
    assert!(has_pair(args, "-vf", "scale=320:-2"));
}

#[test]
fn test_generic_conversion_writes_destination_directly() {
    let h = Harness::new(FakeRunner::modern());
    let src = h.source("clip.avi");
    let dst = h.path("clip.ogv");

    let report = h
        .transcoder
        .create(&src, &dst, "ogg", "default", &ConvertOptions::default())
        .unwrap();

    assert!(!report.post_processed);
    let encodes = h.runner.encode_calls();
    let dst_arg = dst.to_string_lossy().to_string();
    assert_eq!(encodes[0].output(), Some(dst_arg.as_str()));
    assert!(has_pair(&encodes[0].args, "-f", "ogg"));
    assert!(has_pair(&encodes[0].args, "-c:v", "libtheora"));
    assert!(h.runner.faststart_calls().is_empty());
    assert!(dst.exists());
}

#[test]
fn test_failed_encode_skips_fast_start() {
    let runner = FakeRunner::modern().with_encode_exit(
        1,
        &["Input #0, avi", "", "Unknown encoder 'libx264'", "Conversion failed!"],
    );
    let h = Harness::new(runner);
    let src = h.source("clip.avi");
    let dst = h.path("clip.mp4");

    let err = h
        .transcoder
        .create(&src, &dst, "mp4", "default", &ConvertOptions::default())
        .err()
        .unwrap();

    match &err {
        TranscodeError::EncodeFailed {
            exit_code,
            output_tail,
        } => {
            assert_eq!(*exit_code, Some(1));
            assert_eq!(
                output_tail,
                &["Input #0, avi", "Unknown encoder 'libx264'", "Conversion failed!"]
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().starts_with("Encode failed with exit code 1:"));

    assert!(h.runner.faststart_calls().is_empty());
    assert!(!dst.exists());
    assert!(partial_files(h.dir.path()).is_empty());
}

#[test]
fn test_failed_fast_start() {
    let h = Harness::new(FakeRunner::modern().with_faststart_exit(2));
    let src = h.source("clip.avi");
    let dst = h.path("clip.mp4");

    let err = h
        .transcoder
        .create(&src, &dst, "mp4", "default", &ConvertOptions::default())
        .err()
        .unwrap();

    assert!(matches!(err, TranscodeError::PostProcessFailed { exit_code: Some(2) }));
    assert_eq!(h.runner.faststart_calls().len(), 1);
    assert!(partial_files(h.dir.path()).is_empty());
}

#[test]
fn test_unreadable_source_runs_nothing() {
    let h = Harness::new(FakeRunner::modern());
    let src = h.path("missing.avi");
    let dst = h.path("missing.mp4");

    let err = h
        .transcoder
        .create(&src, &dst, "mp4", "default", &ConvertOptions::default())
        .err()
        .unwrap();

    assert!(matches!(err, TranscodeError::UnreadableSource { ref path } if *path == src));
    assert!(h.runner.calls().is_empty());
}

#[test]
fn test_existing_mp4_destination() {
    let h = Harness::new(FakeRunner::modern());
    let src = h.source("clip.avi");
    let dst = h.path("clip.mp4");
    fs::write(&dst, b"previous").unwrap();

    let err = h
        .transcoder
        .create(&src, &dst, "mp4", "default", &ConvertOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err, TranscodeError::Io(ref e) if e.kind() == io::ErrorKind::AlreadyExists));
    assert!(h.runner.encode_calls().is_empty());
    assert_eq!(fs::read(&dst).unwrap(), b"previous");

    let options = ConvertOptions {
        overwrite: true,
        ..ConvertOptions::default()
    };
    h.transcoder.create(&src, &dst, "mp4", "default", &options).unwrap();

    assert_eq!(h.runner.encode_calls()[0].args[0], "-y");
    assert_eq!(fs::read(&dst).unwrap(), b"encoded");
}

#[test]
fn test_missing_ffmpeg_reports_spawn_failure() {
    let h = Harness::new(FakeRunner::missing());
    let src = h.source("clip.avi");
    let dst = h.path("clip.mp4");

    let err = h
        .transcoder
        .create(&src, &dst, "mp4", "default", &ConvertOptions::default())
        .err()
        .unwrap();

    assert!(matches!(err, TranscodeError::Spawn { .. }));
    assert!(err.to_string().starts_with("Failed to execute ffmpeg"));
}

#[test]
fn test_legacy_release_uses_old_syntax() {
    let runner = FakeRunner::modern()
        .with_version("FFmpeg version 0.6.1, Copyright (c) 2000-2010 the FFmpeg developers")
        .with_formats(&[
            " DEVSD  libx264         libx264 H.264 / AVC / MPEG-4 AVC",
            "  EA    libfaac         libfaac AAC (Advanced Audio Codec)",
        ]);
    let h = Harness::new(runner);
    let src = h.source("clip.avi");
    let dst = h.path("clip.mp4");

    let report = h
        .transcoder
        .create(&src, &dst, "mp4", "mobile", &ConvertOptions::default())
        .unwrap();
    assert_eq!(report.driver, Driver::Legacy06);
    assert_eq!(report.audio_encoder, "libfaac");

    let encodes = h.runner.encode_calls();
    let args = &encodes[0].args;
    assert!(has_pair(args, "-vcodec", "libx264"));
    assert!(has_pair(args, "-vpre", "fast"));
    assert!(has_pair(args, "-b", "500k"));
    assert!(has_pair(args, "-s", "1280x720"));
    assert!(has_pair(args, "-acodec", "libfaac"));
    assert!(has_pair(args, "-ab", "64k"));
    assert!(has_pair(args, "-threads", "0"));
    assert!(!args.contains(&"-profile:v".to_string()));
    assert!(!args.contains(&"-strict".to_string()));
}
