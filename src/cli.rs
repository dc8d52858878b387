use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "h5transcode")]
#[command(about = "Convert media into browser-playable video with ffmpeg", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the detected ffmpeg version and command-line driver
    Version,

    /// List the encoders the installed ffmpeg can use
    Encoders,

    /// List profiles across the search path
    Profiles,

    /// Show duration, streams and dimensions of a media file
    Info {
        /// Path to the media file
        file: PathBuf,
    },

    /// Convert one file
    Convert {
        /// Source media file
        src: PathBuf,

        /// Destination file
        dst: PathBuf,

        /// Target container: mp4, webm or ogg (defaults to the destination extension)
        #[arg(short, long)]
        format: Option<String>,

        /// Encoding profile name
        #[arg(short, long)]
        profile: Option<String>,

        /// Output width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Output height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Drop the audio track
        #[arg(long)]
        no_audio: bool,

        /// Replace the destination if it exists
        #[arg(short = 'y', long)]
        overwrite: bool,

        /// Print the primary ffmpeg command instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Forget cached version and encoder detection
    ClearCache,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
