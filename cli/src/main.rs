//! ocrdump CLI - OCR annotation dumper

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use ocrdump::config::{self, Settings, ENV_LOG_LEVEL, ENV_VARS};
use ocrdump::{
    BatchSummary, DrawSettings, DumpOptions, Dumper, ItemStatus, JsonFormat, MappingMode,
    RenderSummary, Renderer, ResolveOptions, VisionClient, VisionConfig,
};

/// Settings file picked up by `render` when none is given.
const DEFAULT_SETTINGS_FILE: &str = "draw_settings.yaml";

#[derive(Parser)]
#[command(name = "ocrdump")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Dump Google Cloud Vision OCR annotations and render them onto images", long_about = None)]
struct Cli {
    /// Input file or directory
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", env = "OCR_OUTPUT_DIR")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate files and write images/ and labels/
    Dump(DumpArgs),

    /// Draw annotations onto images
    #[command(alias = "visualize")]
    Render {
        /// Image file or folder of images
        #[arg(value_name = "IMAGES")]
        images: PathBuf,

        /// Label folder, or a label file for a single image
        #[arg(short, long, value_name = "PATH")]
        labels: Option<PathBuf>,

        /// YAML drawing settings
        #[arg(short, long, value_name = "FILE")]
        settings: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Check whether a file can be sent to the service
    Validate {
        /// File to check
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recognised environment variables
    Env,

    /// Show version information
    Version,
}

#[derive(Args)]
struct DumpArgs {
    /// Input file or directory
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR", env = "OCR_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Service-account key file
    #[arg(short, long, value_name = "FILE", env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Search directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Label layout
    #[arg(long, value_enum, default_value = "raw")]
    mode: LabelMode,

    /// Images per API request (1-16)
    #[arg(long, value_name = "N", env = "OCR_BATCH_SIZE", value_parser = parse_batch_size)]
    batch_size: Option<usize>,

    /// Write compact JSON labels
    #[arg(long)]
    compact: bool,

    /// Write reports/summary.json with reading statistics
    #[arg(long)]
    report: bool,

    /// Vision API base URL
    #[arg(long, value_name = "URL", env = "OCR_VISION_ENDPOINT")]
    endpoint: Option<String>,
}

impl DumpArgs {
    fn for_input(input: PathBuf, output: Option<PathBuf>) -> Self {
        Self {
            input,
            output,
            credentials: None,
            recursive: false,
            mode: LabelMode::Raw,
            batch_size: None,
            compact: false,
            report: false,
            endpoint: None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LabelMode {
    /// Verbatim service response (default)
    Raw,
    /// Normalized page/block/paragraph/word/symbol record
    Simplified,
}

impl From<LabelMode> for MappingMode {
    fn from(mode: LabelMode) -> Self {
        match mode {
            LabelMode::Raw => MappingMode::Raw,
            LabelMode::Simplified => MappingMode::Simplified,
        }
    }
}

fn parse_batch_size(value: &str) -> Result<usize, String> {
    Ok(config::parse_batch_size(value))
}

fn main() {
    config::load_dotenv();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Dump(args)) => cmd_dump(args),
        Some(Commands::Render {
            images,
            labels,
            settings,
            output,
        }) => cmd_render(&images, labels.as_deref(), settings.as_deref(), output.as_deref()),
        Some(Commands::Validate { file, json }) => cmd_validate(&file, json),
        Some(Commands::Env) => {
            cmd_env();
            Ok(())
        }
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: dump if input is provided
            if let Some(input) = cli.input {
                let mut args = DumpArgs::for_input(input, cli.output);
                args.credentials = std::env::var_os(config::ENV_CREDENTIALS).map(PathBuf::from);
                cmd_dump(args)
            } else {
                println!("{}", "Usage: ocrdump <INPUT> [-o DIR]".yellow());
                println!("       ocrdump --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// `OCR_LOG_LEVEL` first, then `RUST_LOG`, then `info`.
fn init_logging() {
    match std::env::var(ENV_LOG_LEVEL) {
        Ok(level) if !level.trim().is_empty() => {
            env_logger::Builder::new()
                .parse_filters(&config::normalize_log_level(&level))
                .init();
        }
        _ => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .init();
        }
    }
}

fn cmd_dump(args: DumpArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env();
    let credentials = config::validate_credentials(args.credentials.as_deref())?;

    let vision_config =
        VisionConfig::new().with_endpoint(args.endpoint.unwrap_or(settings.endpoint));
    let client = VisionClient::from_credentials_file(&credentials, vision_config)?;
    client.authenticate()?;
    log::debug!("Authenticated with {}", credentials.display());

    let output_dir = args.output.unwrap_or(settings.output_dir);
    let recursive = args.recursive || settings.recursive;
    let resolved = ocrdump::resolve(&args.input, ResolveOptions::new().with_recursive(recursive))?;

    for path in &resolved.unsupported {
        println!("{} {}", "Skipping unsupported file:".yellow(), path.display());
    }
    for path in &resolved.oversized {
        println!("{} {}", "Skipping oversized file:".yellow(), path.display());
    }

    if resolved.is_empty() {
        println!("{}", "No supported files found".yellow());
        return Ok(());
    }

    let json_format = if args.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let options = DumpOptions::new()
        .with_output_dir(&output_dir)
        .with_mode(args.mode.into())
        .with_json_format(json_format)
        .with_batch_size(args.batch_size.unwrap_or(settings.batch_size));

    println!(
        "{} {} file(s) into {}",
        "Processing".cyan().bold(),
        resolved.files.len(),
        output_dir.display()
    );

    let pb = ProgressBar::new(resolved.files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let dumper = Dumper::new(client, options);
    let mut summary = dumper.dump_with_progress(&resolved.files, |item| {
        pb.set_message(item.file_name.clone());
        pb.inc(1);
    })?;
    pb.finish_with_message("Done!");

    summary.skipped = resolved.unsupported;
    summary.skipped.extend(resolved.oversized);
    log::info!(
        "Dump finished: {} processed, {} failed, {} skipped",
        summary.processed(),
        summary.failed(),
        summary.skipped.len()
    );

    print_summary_table(&summary);

    println!("\n{}", "Output files:".green().bold());
    println!("  {} images/", "├─".dimmed());
    if args.report {
        println!("  {} labels/", "├─".dimmed());
        let path = ocrdump::write_summary_report(&summary, &output_dir)?;
        println!("  {} {}", "└─".dimmed(), path.display());
    } else {
        println!("  {} labels/", "└─".dimmed());
    }

    Ok(())
}

fn print_summary_table(summary: &BatchSummary) {
    println!();
    println!("{}", "OCR Results Summary".cyan().bold());
    println!("{}", "─".repeat(72).dimmed());
    println!(
        "{:<32} {:>10} {:>11} {:>6} {:>10}",
        "File".bold(),
        "Status".bold(),
        "Text Length".bold(),
        "Pages".bold(),
        "Avg Conf".bold()
    );

    for item in &summary.items {
        let status = match item.status {
            ItemStatus::Success => item.status.as_str().green(),
            ItemStatus::ApiError => item.status.as_str().yellow(),
            ItemStatus::Failed => item.status.as_str().red(),
        };
        println!(
            "{:<32} {:>10} {:>11} {:>6} {:>10.2}",
            truncate(&item.file_name, 32),
            status,
            item.text_length,
            item.page_count,
            item.average_confidence
        );
        if let Some(error) = &item.error {
            println!("  {} {}", "└─".dimmed(), error.dimmed());
        }
    }

    println!("{}", "─".repeat(72).dimmed());
    println!(
        "{}: {}  {}: {}  {}: {}",
        "Processed".bold(),
        summary.processed(),
        "Failed".bold(),
        if summary.failed() > 0 {
            summary.failed().to_string().red()
        } else {
            summary.failed().to_string().green()
        },
        "Skipped".bold(),
        summary.skipped.len()
    );
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let head: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn cmd_render(
    images: &Path,
    labels: Option<&Path>,
    settings: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let draw_settings = match settings {
        Some(path) => DrawSettings::load_or_default(path),
        None if Path::new(DEFAULT_SETTINGS_FILE).is_file() => {
            DrawSettings::load_or_default(DEFAULT_SETTINGS_FILE)
        }
        None => DrawSettings::default(),
    };
    draw_settings.validate()?;

    let output_dir = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| draw_settings.global.output_dir.clone());
    let renderer = Renderer::new(draw_settings);

    if images.is_dir() {
        let labels_dir = labels
            .map(Path::to_path_buf)
            .unwrap_or_else(|| sibling_labels_dir(images));
        let summary = renderer.visualize_folder(images, &labels_dir, Some(&output_dir))?;
        print_render_summary(&summary);
    } else if images.is_file() {
        let label_path = match labels {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(dir) => label_for(images, dir),
            None => label_for(images, &sibling_labels_dir(images.parent().unwrap_or(Path::new(".")))),
        };
        let output_path = renderer.output_path_for(images, &output_dir);
        let path = renderer.visualize(images, &label_path, Some(&output_path))?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        return Err(ocrdump::Error::InputNotFound(images.to_path_buf()).into());
    }

    Ok(())
}

/// `out/images` pairs with `out/labels`.
fn sibling_labels_dir(images_dir: &Path) -> PathBuf {
    match images_dir.parent() {
        Some(parent) => parent.join("labels"),
        None => PathBuf::from("labels"),
    }
}

fn label_for(image: &Path, labels_dir: &Path) -> PathBuf {
    let stem = image.file_stem().unwrap_or_default().to_string_lossy();
    labels_dir.join(format!("{}.json", stem))
}

fn print_render_summary(summary: &RenderSummary) {
    for path in &summary.rendered {
        println!("{} {}", "Rendered".green(), path.display());
    }
    for path in &summary.missing_labels {
        println!("{} {}", "No label for".yellow(), path.display());
    }
    for (path, error) in &summary.failed {
        println!("{} {}: {}", "Failed".red(), path.display(), error);
    }
    println!(
        "\n{} {} rendered, {} without labels, {} failed",
        "Done!".green().bold(),
        summary.rendered.len(),
        summary.missing_labels.len(),
        summary.failed.len()
    );
}

fn cmd_validate(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let report = ocrdump::validate_file(file);

    if json {
        let value = serde_json::json!({
            "file": file.display().to_string(),
            "valid": report.valid,
            "size_mb": report.size_mb,
            "format": report.format.map(|f| f.to_string()),
            "dimensions": report.dimensions,
            "errors": report.errors,
            "warnings": report.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "File Validation".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), file.display());
    println!(
        "{}: {}",
        "Valid".bold(),
        if report.valid { "Yes".green() } else { "No".red() }
    );
    println!("{}: {:.2} MB", "Size".bold(), report.size_mb);
    if let Some(format) = report.format {
        println!("{}: {} ({})", "Format".bold(), format, format.mime_type());
    }
    if let Some((width, height)) = report.dimensions {
        println!("{}: {}x{}", "Dimensions".bold(), width, height);
    }

    for error in &report.errors {
        println!("{} {}", "error:".red().bold(), error);
    }
    for warning in &report.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }

    Ok(())
}

fn cmd_env() {
    println!("{}", "Environment Variables".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for (name, description) in ENV_VARS {
        let value = std::env::var(name).unwrap_or_else(|_| "(not set)".to_string());
        println!("{}: {}", name.bold(), value);
        println!("  {}", description.dimmed());
    }
}

fn cmd_version() {
    println!("{} {}", "ocrdump".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("OCR annotation dumper for Google Cloud Vision");
    println!();
    println!("Library: ocrdump {}", ocrdump::VERSION);
    println!("License: MIT");
}
