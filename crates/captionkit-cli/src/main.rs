//! CaptionKit command-line front end.
//!
//! Builds subtitle documents, inspects playback and layout, and runs
//! burned-in exports through a local FFmpeg.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use captionkit_lib::core::captions::{
    export_srt, group_lines, parse_srt, split_words, CueList, WordCue,
};
use captionkit_lib::core::color::{hex_to_packed, hex_to_rgba, normalize_color, packed_to_rgba, ColorRole};
use captionkit_lib::core::ffmpeg::FfmpegTranscoder;
use captionkit_lib::core::preview::{letterbox_fit, DirectoryFontSource, FontResolver};
use captionkit_lib::core::render::{ExportCoordinator, ResolutionTier, SourceVideo};
use captionkit_lib::core::settings::{default_settings_path, EngineSettings};
use captionkit_lib::core::style::{apply_defaults, builtin_presets, StyleConfig, StylePatch};
use captionkit_lib::core::timeline::line_view;
use captionkit_lib::core::Size;

#[derive(Parser, Debug)]
#[command(name = "captionkit", version, about = "Styled subtitle documents and burned-in exports")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Also write logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the ASS document for a cue file
    Build {
        /// Cue file: JSON array of {start, end, text} or an .srt file
        #[arg(long)]
        cues: PathBuf,
        /// Style JSON (any subset of style fields)
        #[arg(long)]
        style: Option<PathBuf>,
        #[arg(long)]
        words_per_line: Option<usize>,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show the active word and line at a playback time
    Active {
        #[arg(long)]
        cues: PathBuf,
        #[arg(long)]
        style: Option<PathBuf>,
        /// Playback time in seconds
        #[arg(long)]
        time: f64,
    },
    /// Compute the letterboxed preview fit
    Fit {
        /// Native video size, e.g. 1920x1080
        #[arg(long)]
        video: Size,
        /// Container size, e.g. 800x600
        #[arg(long)]
        container: Size,
        #[arg(long, default_value_t = 1.0)]
        dpr: f64,
    },
    /// Burn subtitles into a video with FFmpeg
    Export {
        /// Source video file
        #[arg(long)]
        video: PathBuf,
        #[arg(long)]
        cues: PathBuf,
        #[arg(long)]
        style: Option<PathBuf>,
        /// original, 1080p or 4k
        #[arg(long)]
        tier: Option<ResolutionTier>,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Convert a colour between hex, packed and rgba forms
    Colors {
        value: String,
        #[arg(long, value_enum, default_value_t = RoleArg::Primary)]
        role: RoleArg,
        /// Opacity percent for the rgba approximation
        #[arg(long, default_value_t = 100.0)]
        opacity: f64,
    },
    /// Resolve a font family against a directory of font files
    Fonts {
        name: String,
        #[arg(long)]
        dir: PathBuf,
    },
    /// Write grouped lines as SRT
    Srt {
        #[arg(long)]
        cues: PathBuf,
        #[arg(long)]
        words_per_line: Option<usize>,
    },
    /// List built-in style presets
    Presets,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Primary,
    Secondary,
    Outline,
    Shadow,
    Back,
}

impl From<RoleArg> for ColorRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Primary => ColorRole::Primary,
            RoleArg::Secondary => ColorRole::Secondary,
            RoleArg::Outline => ColorRole::Outline,
            RoleArg::Shadow => ColorRole::Shadow,
            RoleArg::Back => ColorRole::Back,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    captionkit_lib::init_logging(cli.log_dir.as_deref());

    let settings = load_settings(cli.settings.as_deref());

    match cli.command {
        Commands::Build {
            cues,
            style,
            words_per_line,
            out,
        } => {
            let cues = load_cues(&cues, &settings)?;
            let style = load_style(style.as_deref())?;
            let words_per_line = words_per_line.unwrap_or(settings.document.words_per_line);
            let document = settings
                .document_builder()
                .build(&cues, &style, words_per_line);

            match out {
                Some(path) => std::fs::write(&path, document)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => print!("{}", document),
            }
        }
        Commands::Active { cues, style, time } => {
            let cues = load_cues(&cues, &settings)?;
            let style = load_style(style.as_deref())?;
            let line = line_view(
                &cues,
                time,
                settings.document.words_per_line,
                &style,
                settings.highlight.default_active_scale,
            );
            print_json(&json!({
                "time": time,
                "activeIndex": line.as_ref().and_then(|l| l.active_index),
                "line": line,
            }))?;
        }
        Commands::Fit {
            video,
            container,
            dpr,
        } => {
            let fit = letterbox_fit(video, container, dpr)
                .ok_or_else(|| anyhow!("Both sizes must be positive"))?;
            print_json(&fit)?;
        }
        Commands::Export {
            video,
            cues,
            style,
            tier,
            out,
        } => {
            let cues = load_cues(&cues, &settings)?;
            let style = load_style(style.as_deref())?;
            run_export(&settings, video, cues, style, tier, &out).await?;
        }
        Commands::Colors {
            value,
            role,
            opacity,
        } => {
            let role = ColorRole::from(role);
            let hex = normalize_color(&value, role);
            let packed = hex_to_packed(&hex, role);
            print_json(&json!({
                "hex": hex,
                "packed": packed,
                "rgba": packed_to_rgba(&packed, role),
                "previewRgba": hex_to_rgba(&hex, opacity, role),
            }))?;
        }
        Commands::Fonts { name, dir } => {
            let source = Arc::new(DirectoryFontSource::new(dir));
            let resolver = FontResolver::new(source, settings.font_resolver_options());
            let resolved = resolver.resolve(&name).await;
            print_json(&json!({
                "requested": resolved.requested,
                "stage": resolved.stage,
                "files": resolved.files(),
            }))?;
        }
        Commands::Srt {
            cues,
            words_per_line,
        } => {
            let cues = load_cues(&cues, &settings)?;
            let words_per_line = words_per_line.unwrap_or(settings.document.words_per_line);
            print!("{}", export_srt(&group_lines(&cues, words_per_line)));
        }
        Commands::Presets => {
            print_json(&builtin_presets())?;
        }
    }

    Ok(())
}

async fn run_export(
    settings: &EngineSettings,
    video: PathBuf,
    cues: Vec<WordCue>,
    style: StyleConfig,
    tier: Option<ResolutionTier>,
    out: &Path,
) -> Result<()> {
    if !video.is_file() {
        bail!("Input file not found: {}", video.display());
    }

    let transcoder = FfmpegTranscoder::detect()?;
    tracing::info!(
        ffmpeg = %transcoder.runner().info().ffmpeg_path.display(),
        version = %transcoder.runner().info().version,
        "Using FFmpeg"
    );

    let mut source = SourceVideo::from_path(&video);
    match transcoder.runner().probe_video_size(&video).await {
        Ok(size) => source.size = Some(size),
        Err(e) => tracing::warn!("Could not probe source size, assuming landscape: {}", e),
    }

    let mut coordinator = ExportCoordinator::new(Arc::new(transcoder), settings.export_options());
    coordinator.set_source(source);

    let tier = tier.unwrap_or(settings.export.default_tier);
    let artifact = coordinator
        .request_export(&cues, &style, tier)
        .await
        .map_err(|e| anyhow!(e.to_user_message()))?;

    let path = artifact.save_to(out)?;
    println!("{}", path.display());
    Ok(())
}

fn load_settings(path: Option<&Path>) -> EngineSettings {
    match path.map(Path::to_path_buf).or_else(default_settings_path) {
        Some(path) => EngineSettings::load(&path),
        None => EngineSettings::default(),
    }
}

/// Reads cues from JSON, or from SRT split into evenly timed words
fn load_cues(path: &Path, settings: &EngineSettings) -> Result<Vec<WordCue>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_srt = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));

    let cues = if is_srt {
        split_words(&parse_srt(&content)?)
    } else {
        serde_json::from_str::<Vec<WordCue>>(&content)
            .with_context(|| format!("Invalid cue JSON in {}", path.display()))?
    };

    Ok(CueList::new(cues, settings.editing.cue_epsilon_sec).into_vec())
}

fn load_style(path: Option<&Path>) -> Result<StyleConfig> {
    let Some(path) = path else {
        return Ok(StyleConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let patch: StylePatch = serde_json::from_str(&content)
        .with_context(|| format!("Invalid style JSON in {}", path.display()))?;
    Ok(apply_defaults(&patch))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
