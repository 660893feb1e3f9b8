use anyhow::Result;
use clap::{Parser, Subcommand};
use m4a_tagger::acquire::{find_yt_dlp, YtDlpSource};
use m4a_tagger::model::Attribution;
use m4a_tagger::pipeline::OutputOrganizer;
use m4a_tagger::transcoder::probe_transcoder;
use m4a_tagger::{Pipeline, PipelineConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "m4a-tagger")]
#[command(about = "Download a single video as tagged M4A audio with cover art", long_about = None)]
struct Args {
    /// Directory receiving finished files
    #[arg(short = 'o', long, default_value = "~/Music/m4a-tagger", global = true)]
    output: String,

    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download, tag and store one item
    Download {
        /// Video URL (single video, playlists are rejected)
        url: String,

        /// Title to write instead of the one parsed from the video title
        #[arg(long, requires = "artist")]
        title: Option<String>,

        /// Artist to write instead of the one parsed from the video title
        #[arg(long, requires = "title")]
        artist: Option<String>,

        /// Directory for per-run scratch directories (default: system temp)
        #[arg(long)]
        work_dir: Option<String>,

        /// Thumbnail download timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },

    /// Show the title/artist that would be written, without downloading
    Preview {
        /// Video URL
        url: String,
    },

    /// Delete stored files older than the given age
    Prune {
        /// Maximum age in hours
        #[arg(long, default_value = "24")]
        max_age_hours: u64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let output = PathBuf::from(shellexpand::tilde(&args.output).as_ref());

    match args.command {
        Command::Prune { max_age_hours } => {
            let organizer = OutputOrganizer::new(output);
            let deleted = organizer.prune(Duration::from_secs(max_age_hours * 60 * 60))?;
            log::info!("Deleted {} old file(s)", deleted);
        }

        Command::Preview { url } => {
            let pipeline = Pipeline::new(PipelineConfig::new(output), yt_dlp_source()?);
            let preview = pipeline.preview(&url)?;

            println!("Title:    {}", preview.attribution.title);
            println!("Artist:   {}", preview.attribution.artist);
            if let Some(uploader) = &preview.uploader {
                println!("Uploader: {}", uploader);
            }
            if let Some(secs) = preview.duration_secs {
                println!("Duration: {}:{:02}", secs / 60, secs % 60);
            }
            if let Some(thumbnail) = &preview.thumbnail_url {
                println!("Thumbnail: {}", thumbnail);
            }
            if !preview.description.is_empty() {
                println!("\n{}", preview.description);
            }
        }

        Command::Download {
            url,
            title,
            artist,
            work_dir,
            timeout,
        } => {
            let mut config =
                PipelineConfig::new(output).with_http_timeout(Duration::from_secs(timeout));
            if let Some(work_dir) = work_dir {
                config = config.with_work_root(PathBuf::from(shellexpand::tilde(&work_dir).as_ref()));
            }

            let pipeline = Pipeline::new(config, yt_dlp_source()?);
            let outcome = match (title, artist) {
                (Some(title), Some(artist)) => {
                    pipeline.run_with_attribution(&url, Attribution::new(title, artist))?
                }
                _ => pipeline.run(&url)?,
            };

            for note in &outcome.notes {
                log::warn!("Note: {}", note);
            }
            log::info!(
                "✅ Saved: {} - {}",
                outcome.attribution.artist,
                outcome.attribution.title
            );
            println!("{}", outcome.output_path.display());
        }
    }

    Ok(())
}

fn yt_dlp_source() -> Result<YtDlpSource> {
    let binary = find_yt_dlp()
        .ok_or_else(|| anyhow::anyhow!("yt-dlp was not found; install it or set YT_DLP_PATH"))?;
    log::debug!("Using yt-dlp at {}", binary.display());

    Ok(YtDlpSource::new(binary, probe_transcoder()))
}
