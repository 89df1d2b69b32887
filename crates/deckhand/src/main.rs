//! # deckhand CLI
//!
//! Command-line interface for deckhand.
//!
//! deckhand converts presentation files (PPTX decks or their PDF renderings)
//! into a normalized JSON bundle: document metadata, per-slide raster
//! images, per-slide text, and AI-generated slide descriptions.
//!
//! ## Commands
//!
//! - `deckhand process <FILE>` - Run the full pipeline on a presentation
//! - `deckhand inspect <FILE>` - Show document metadata only
//! - `deckhand config show|init|path` - Manage configuration
//!
//! ## Examples
//!
//! ```bash
//! # Rasterize and extract every slide
//! deckhand process talk.pptx --out-dir ./slides --output talk.json
//!
//! # Describe three slides through Gemini, four at a time
//! GEMINI_API_KEY=... deckhand process talk.pdf \
//!     --slides 1,2,3 --describe --parallel --resize 1024x768
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deckhand_core::{DescribeRequest, ImageFormat, ImageSize, SlideSelector};
use deckhand_describe::{DescribeOptions, Describer, GeminiClient};
use deckhand_extract::{MetadataExtractor, PptxDeckReader};
use deckhand_pipeline::{detect_kind, AssembleOptions, Assembler};
use deckhand_raster::{PdftoppmRenderer, SofficeConverter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(about = "Convert slide decks and PDFs into described JSON bundles")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/deckhand/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ImageFormatArg {
    Png,
    Jpeg,
}

impl From<ImageFormatArg> for ImageFormat {
    fn from(arg: ImageFormatArg) -> Self {
        match arg {
            ImageFormatArg::Png => ImageFormat::Png,
            ImageFormatArg::Jpeg => ImageFormat::Jpeg,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on a presentation
    Process {
        /// Presentation file (.pptx or .pdf)
        file: PathBuf,

        /// Directory for rasterized slide images
        #[arg(short, long, default_value = "slides")]
        out_dir: PathBuf,

        /// Comma-separated 1-based slide indices (default: all slides)
        #[arg(short, long, value_delimiter = ',')]
        slides: Option<Vec<u32>>,

        /// Slide image encoding
        #[arg(long)]
        image_format: Option<ImageFormatArg>,

        /// Stretch slide images to exactly WIDTHxHEIGHT
        #[arg(long)]
        resize: Option<ImageSize>,

        /// Generate AI descriptions for the slides
        #[arg(short, long)]
        describe: bool,

        /// Prompt applied to every slide image
        #[arg(long)]
        prompt: Option<String>,

        /// Model identifier
        #[arg(long)]
        model: Option<String>,

        /// Describe slides through the bounded worker pool
        #[arg(long)]
        parallel: bool,

        /// Worker pool bound
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Seconds to wait before every AI call
        #[arg(long)]
        pacing_secs: Option<u64>,

        /// Stage images via the Files API instead of inline bytes
        #[arg(long)]
        remote_upload: bool,

        /// Write the JSON result here instead of stdout
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
    },

    /// Show document metadata without processing slides
    Inspect {
        /// Presentation file (.pptx or .pdf)
        file: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Arguments of the `process` subcommand, bundled for handoff.
#[allow(clippy::struct_excessive_bools)]
struct ProcessArgs {
    file: PathBuf,
    out_dir: PathBuf,
    slides: Option<Vec<u32>>,
    image_format: Option<ImageFormatArg>,
    resize: Option<ImageSize>,
    describe: bool,
    prompt: Option<String>,
    model: Option<String>,
    parallel: bool,
    max_concurrent: Option<usize>,
    pacing_secs: Option<u64>,
    remote_upload: bool,
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    // Load config from file or CLI-specified path
    let config = if let Some(ref path) = cli.config {
        Config::load_from(Some(path.clone()))
            .context(format!("Failed to load config from {}", path.display()))?
    } else {
        Config::load().context("Failed to load config")?
    };

    match cli.command {
        Commands::Process {
            file,
            out_dir,
            slides,
            image_format,
            resize,
            describe,
            prompt,
            model,
            parallel,
            max_concurrent,
            pacing_secs,
            remote_upload,
            output,
        } => {
            run_process(
                &config,
                ProcessArgs {
                    file,
                    out_dir,
                    slides,
                    image_format,
                    resize,
                    describe,
                    prompt,
                    model,
                    parallel,
                    max_concurrent,
                    pacing_secs,
                    remote_upload,
                    output,
                },
            )
            .await?;
        }

        Commands::Inspect { file } => {
            run_inspect(&config, &file, cli.format).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}

/// Create the standard component stack.
fn build_assembler(config: &Config) -> Assembler {
    Assembler::new(
        Arc::new(PptxDeckReader::new()),
        Arc::new(
            SofficeConverter::new()
                .with_binary(&config.convert.soffice_binary)
                .with_timeout(Duration::from_secs(config.convert.timeout_secs)),
        ),
        Arc::new(
            PdftoppmRenderer::new()
                .with_binary(&config.convert.pdftoppm_binary)
                .with_dpi(config.images.dpi),
        ),
    )
}

async fn run_process(config: &Config, args: ProcessArgs) -> Result<()> {
    if !args.file.exists() {
        anyhow::bail!("File does not exist: {}", args.file.display());
    }

    // A missing credential must surface before any conversion or rendering
    // work starts, not in the middle of the description batch.
    let client = if args.describe {
        Some(GeminiClient::from_env()?)
    } else {
        None
    };

    let assembler = build_assembler(config);
    let options = AssembleOptions {
        selector: args
            .slides
            .map(SlideSelector::Indices)
            .unwrap_or_default(),
        image_format: args
            .image_format
            .map_or(config.images.format, Into::into),
        resize: args.resize.or_else(|| config.images.size()),
        metadata: config.metadata,
    };

    info!("Processing {:?}", args.file);
    let mut result = assembler
        .assemble(&args.file, &args.out_dir, &options)
        .await
        .context("Failed to assemble presentation")?;

    if let Some(client) = client {
        let prompt = args
            .prompt
            .unwrap_or_else(|| config.describe.prompt.clone());

        // Only slides that actually produced an image can be described;
        // slides with a failed render keep their recorded error.
        let indexed: Vec<(u32, DescribeRequest)> = result
            .slides
            .iter()
            .filter_map(|slide| {
                slide.image_path.as_ref().map(|image_path| {
                    (
                        slide.index,
                        DescribeRequest {
                            image_path: image_path.clone(),
                            prompt: prompt.clone(),
                        },
                    )
                })
            })
            .collect();

        let describer = Describer::new(
            Arc::new(client),
            DescribeOptions {
                model_name: args
                    .model
                    .unwrap_or_else(|| config.describe.model.clone()),
                // Slide images are already sized by the rasterizer
                resize: None,
                remote_upload: args.remote_upload || config.describe.remote_upload,
                parallel: args.parallel || config.describe.parallel,
                max_concurrent: args
                    .max_concurrent
                    .unwrap_or(config.describe.max_concurrent),
                pacing: Duration::from_secs(
                    args.pacing_secs.unwrap_or(config.describe.pacing_secs),
                ),
            },
        );

        let requests: Vec<DescribeRequest> =
            indexed.iter().map(|(_, request)| request.clone()).collect();
        let outcomes = describer.describe_many(&requests).await;

        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        info!(
            "Described {}/{} slides",
            outcomes.len() - failed,
            outcomes.len()
        );

        result.apply_descriptions(
            indexed
                .into_iter()
                .map(|(index, _)| index)
                .zip(outcomes),
        );
    }

    let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {:?}", path);
        }
        None => println!("{json}"),
    }

    Ok(())
}

async fn run_inspect(config: &Config, file: &Path, format: OutputFormat) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let kind = detect_kind(file).await?;
    let extractor = MetadataExtractor::new(Arc::new(PptxDeckReader::new()));
    let record = extractor
        .extract(file, kind, &config.metadata)
        .await
        .context("Failed to extract metadata")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        OutputFormat::Text => {
            println!("Metadata for {} ({:?})", file.display(), kind);
            print_field("Title", record.title.as_deref());
            print_field("Author", record.author.as_deref());
            print_field("Subject", record.subject.as_deref());
            print_field(
                "Created",
                record.created.map(|t| t.to_rfc3339()).as_deref(),
            );
            print_field(
                "Modified",
                record.modified.map(|t| t.to_rfc3339()).as_deref(),
            );
            print_field(
                "Slides",
                record.slide_count.map(|n| n.to_string()).as_deref(),
            );
            print_field("Language", record.language.as_deref());
            print_field(
                "Last printed",
                record.last_printed.map(|t| t.to_rfc3339()).as_deref(),
            );
            print_field(
                "Encrypted",
                record.encrypted.map(|b| b.to_string()).as_deref(),
            );
            print_field("PDF version", record.pdf_version.as_deref());
        }
    }

    Ok(())
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("  {label:<12} {value}");
    }
}
