use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use stitchgrid_lib::config::{MatchMetric, PatternSettings, SymbolStyle};
use stitchgrid_lib::error::PatternError;
use stitchgrid_lib::pipeline;
use stitchgrid_lib::thread_palette::ThreadPalette;

#[derive(Parser)]
#[command(name = "stitchgrid")]
#[command(about = "Convert images into counted cross-stitch patterns")]
struct Cli {
    /// Thread catalog JSON to use instead of the built-in DMC table
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Settings JSON file; command-line flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Limits {
    /// Maximum pattern width in stitches
    #[arg(long)]
    width: Option<u32>,

    /// Maximum pattern height in stitches
    #[arg(long)]
    height: Option<u32>,

    /// Maximum number of thread colors
    #[arg(long)]
    colors: Option<u32>,

    /// Apply Floyd-Steinberg dithering while reducing colors
    #[arg(long)]
    dither: bool,

    /// Color distance used to pick threads
    #[arg(long, value_enum)]
    metric: Option<MatchMetric>,

    /// Directory for request-scoped scratch copies of the source
    #[arg(long, default_value = "scratch")]
    scratch_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the preview markup and floss table as JSON
    Preview {
        /// Source image (png, jpg, jpeg or gif)
        input: PathBuf,

        #[command(flatten)]
        limits: Limits,
    },
    /// Write the printable pattern document and its cover image
    Pattern {
        /// Source image (png, jpg, jpeg or gif)
        input: PathBuf,

        /// Directory that receives the generated files
        #[arg(short, long, default_value = "patterns")]
        output_dir: PathBuf,

        /// Render symbols as <img> tags from this directory instead of glyphs
        #[arg(long)]
        symbols: Option<String>,

        #[command(flatten)]
        limits: Limits,
    },
    /// List the thread catalog
    Catalog,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, PatternError> {
    let owned_palette;
    let palette: &ThreadPalette = match &cli.catalog {
        Some(path) => {
            owned_palette = ThreadPalette::from_json_file(path)?;
            log::info!("Loaded {} threads from {}", owned_palette.len(), path.display());
            &owned_palette
        }
        None => ThreadPalette::dmc()?,
    };

    let base = match &cli.config {
        Some(path) => PatternSettings::from_json_file(path)?,
        None => PatternSettings::default(),
    };

    match cli.command {
        Commands::Preview { input, limits } => {
            let settings = apply_limits(base, &limits);
            let response =
                pipeline::generate_preview(&input, &settings, palette, &limits.scratch_dir);
            print_json(&response)?;
            Ok(if response.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Pattern {
            input,
            output_dir,
            symbols,
            limits,
        } => {
            let mut settings = apply_limits(base, &limits);
            if let Some(dir) = symbols {
                settings.symbol_style = SymbolStyle::Image { dir };
            }
            let artifacts = pipeline::generate_pattern(
                &input,
                &settings,
                palette,
                &limits.scratch_dir,
                &output_dir,
            )?;
            log::info!(
                "Wrote {} ({}x{}, {} threads)",
                artifacts.document.display(),
                artifacts.width,
                artifacts.height,
                artifacts.thread_count
            );
            print_json(&artifacts)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Catalog => {
            print_json(&palette.threads())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn apply_limits(mut settings: PatternSettings, limits: &Limits) -> PatternSettings {
    if let Some(width) = limits.width {
        settings.width = width;
    }
    if let Some(height) = limits.height {
        settings.height = height;
    }
    if let Some(colors) = limits.colors {
        settings.colors = colors;
    }
    if limits.dither {
        settings.dither = true;
    }
    if let Some(metric) = limits.metric {
        settings.metric = metric;
    }
    settings
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), PatternError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| PatternError::Io(format!("failed to encode output: {}", e)))?;
    println!("{}", json);
    Ok(())
}
