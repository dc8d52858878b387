use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use h5transcode::config::Config;
use h5transcode::engine::{ContainerFormat, ConvertOptions, FileCache, Transcoder, merge_source_info};
use std::path::{Path, PathBuf};
use std::process;

pub fn run(cli: Cli) {
    if let Err(e) = dispatch(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    let load = || load_config(config_path.as_deref());

    match cli.command {
        Commands::InitConfig => handle_init_config(config_path.as_deref()),
        Commands::Version => handle_version(&load()?),
        Commands::Encoders => handle_encoders(&load()?),
        Commands::Profiles => handle_profiles(&load()?),
        Commands::Info { file } => handle_info(&load()?, &file),
        Commands::Convert {
            src,
            dst,
            format,
            profile,
            width,
            height,
            no_audio,
            overwrite,
            dry_run,
        } => {
            let config = load()?;
            let request = ConvertRequest {
                format: resolve_format(format, &dst, &config),
                profile: profile.unwrap_or_else(|| config.defaults.profile.clone()),
                options: ConvertOptions {
                    width,
                    height,
                    no_audio,
                    overwrite,
                },
                dry_run,
            };
            handle_convert(&config, &src, &dst, request)
        }
        Commands::ClearCache => handle_clear_cache(&load()?),
    }
}

struct ConvertRequest {
    format: String,
    profile: String,
    options: ConvertOptions,
    dry_run: bool,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Explicit flag, then destination extension, then the configured default
fn resolve_format(flag: Option<String>, dst: &Path, config: &Config) -> String {
    flag.or_else(|| ContainerFormat::from_path(dst).map(|c| c.as_str().to_string()))
        .unwrap_or_else(|| config.defaults.format.clone())
}

fn handle_version(config: &Config) -> Result<()> {
    let transcoder = Transcoder::new(config.clone());

    match transcoder.get_version() {
        Some(version) => println!("ffmpeg version: {}", version),
        None => println!(
            "ffmpeg version: unknown (could not run {})",
            config.tool.ffmpeg_path.display()
        ),
    }
    println!("driver: {}", transcoder.driver());

    if let Some(dir) = config.cache.resolved_dir() {
        let cache = FileCache::in_dir(&dir);
        if let Some(updated) = cache.updated_at() {
            println!(
                "cached: {} ({})",
                cache.path().display(),
                updated.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }
    Ok(())
}

fn handle_encoders(config: &Config) -> Result<()> {
    let transcoder = Transcoder::new(config.clone());
    let encoders = transcoder.get_encoders();

    if encoders.is_empty() {
        anyhow::bail!(
            "no encoders detected; is {} installed?",
            config.tool.ffmpeg_path.display()
        );
    }
    for encoder in encoders {
        println!("{}", encoder);
    }
    Ok(())
}

fn handle_profiles(config: &Config) -> Result<()> {
    let transcoder = Transcoder::new(config.clone());

    println!("Search path:");
    for dir in transcoder.profiles().search_dirs() {
        let marker = if dir.is_dir() { "" } else { " (missing)" };
        println!("  {}{}", dir.display(), marker);
    }
    println!();
    println!("Profiles:");
    for name in transcoder.list_profiles() {
        println!("  {}", name);
    }
    Ok(())
}

fn handle_info(config: &Config, file: &Path) -> Result<()> {
    let transcoder = Transcoder::new(config.clone());
    let info = transcoder
        .get_video_info(file)
        .with_context(|| format!("Failed to probe {}", file.display()))?;

    match info.duration {
        Some(d) => println!("Duration: {:.2}s", d),
        None => println!("Duration: unknown"),
    }
    println!("Video streams: {}", info.video_streams);
    println!("Audio streams: {}", info.audio_streams);
    if let (Some(w), Some(h)) = (info.width, info.height) {
        println!("Dimensions: {}x{}", w, h);
    }
    Ok(())
}

fn handle_convert(config: &Config, src: &Path, dst: &Path, request: ConvertRequest) -> Result<()> {
    let transcoder = Transcoder::new(config.clone());

    if request.dry_run {
        let info = transcoder.get_video_info(src)?;
        let options = merge_source_info(&request.options, &info);
        let converter = transcoder.create_converter(&request.format, &request.profile)?;
        let args = converter.encode_arguments(src, dst, &options);
        let command = shlex::try_join(args.iter().map(String::as_str))?;
        println!("{} {}", config.tool.ffmpeg_path.display(), command);
        return Ok(());
    }

    let report = transcoder
        .create(src, dst, &request.format, &request.profile, &request.options)
        .with_context(|| format!("Failed to convert {}", src.display()))?;

    println!(
        "Wrote {} ({} / {}, {} driver{}) in {:.1}s",
        report.output.display(),
        report.video_encoder,
        report.audio_encoder,
        report.driver,
        if report.post_processed { ", fast-start" } else { "" },
        report.elapsed.as_secs_f64()
    );
    Ok(())
}

fn handle_clear_cache(config: &Config) -> Result<()> {
    let Some(dir) = config.cache.resolved_dir() else {
        println!("Persistent cache is disabled; nothing to clear");
        return Ok(());
    };

    let cache = FileCache::in_dir(&dir);
    cache
        .clear()
        .with_context(|| format!("Failed to remove {}", cache.path().display()))?;
    println!("Cleared {}", cache.path().display());
    Ok(())
}

fn handle_init_config(path: Option<&Path>) -> Result<()> {
    let config_path: PathBuf = match path {
        Some(p) => p.to_path_buf(),
        None => Config::config_path()?,
    };

    if config_path.exists() {
        println!("Config file exists: {}", config_path.display());
        Config::load_from(&config_path)?;
        println!("Config is valid");
    } else {
        Config::default().save_to(&config_path)?;
        println!("Created default config: {}", config_path.display());
    }
    Ok(())
}
