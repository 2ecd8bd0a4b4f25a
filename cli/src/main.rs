//! unidoc CLI - document extraction and conversion tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unidoc::bidi::ShapingMode;
use unidoc::{ConvertOptions, ExtractOptions, Loaded, Unidoc};

/// Targets written by the default conversion.
const DEFAULT_TARGETS: [&str; 4] = ["md", "html", "txt", "json"];

#[derive(Parser)]
#[command(name = "unidoc")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract documents into one canonical model and convert them", long_about = None)]
struct Cli {
    /// Input document
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a document to canonical JSON
    Extract {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Source format tag (detected from the file if not specified)
        #[arg(short, long)]
        format: Option<String>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Convert a document to one or more target formats
    Convert {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Target format tags (html, md, txt, json, docx)
        #[arg(short, long = "to", value_name = "TAG", num_args = 1.., required = true)]
        targets: Vec<String>,

        /// Output file for one target, directory for several (stdout if not specified)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Source format tag (detected from the file if not specified)
        #[arg(short, long)]
        format: Option<String>,

        /// Fail instead of degrading blocks the target cannot hold
        #[arg(long)]
        strict: bool,

        /// Drop bold, italic, underline and strike
        #[arg(long)]
        no_styles: bool,

        /// Reference images by path instead of embedding them
        #[arg(long)]
        link_images: bool,

        /// Override the target's shaping mode
        #[arg(long, value_enum)]
        shaping: Option<Shaping>,
    },

    /// Show document information
    #[command(alias = "info")]
    Summarize {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Source format tag (detected from the file if not specified)
        #[arg(short, long)]
        format: Option<String>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported input and output formats
    Formats,

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Shaping {
    /// Leave logical text untouched
    None,
    /// Contextual Arabic glyphs only
    Reshape,
    /// Glyphs plus visual reordering
    Visual,
}

impl From<Shaping> for ShapingMode {
    fn from(mode: Shaping) -> Self {
        match mode {
            Shaping::None => ShapingMode::None,
            Shaping::Reshape => ShapingMode::Reshape,
            Shaping::Visual => ShapingMode::Visual,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Some(Commands::Extract {
            input,
            output,
            format,
            compact,
        }) => cmd_extract(&input, output.as_deref(), format.as_deref(), compact),
        Some(Commands::Convert {
            input,
            targets,
            output,
            format,
            strict,
            no_styles,
            link_images,
            shaping,
        }) => {
            let mut options = ConvertOptions::new()
                .with_strict(strict)
                .with_styles(!no_styles)
                .with_embedded_images(!link_images);
            if let Some(mode) = shaping {
                options = options.with_shaping(mode.into());
            }
            cmd_convert(&input, &targets, output.as_deref(), format.as_deref(), options)
        }
        Some(Commands::Summarize { input, format, json }) => cmd_summarize(&input, format.as_deref(), json),
        Some(Commands::Formats) => {
            cmd_formats();
            Ok(())
        }
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert to every text target if input is provided
            if let Some(input) = cli.input {
                cmd_convert_all(&input, cli.output.as_deref())
            } else {
                println!("{}", "Usage: unidoc <FILE> [OUTPUT]".yellow());
                println!("       unidoc --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load(input: &Path, format: Option<&str>, options: ConvertOptions) -> unidoc::Result<Loaded> {
    let unidoc = Unidoc::new().with_convert_options(options);
    match format {
        Some(tag) => {
            let bytes = fs::read(input)?;
            let mut extract = ExtractOptions::new();
            if let Some(name) = input.file_name() {
                extract = extract.with_source_name(name.to_string_lossy());
            }
            unidoc.with_extract_options(extract).load(&bytes, tag)
        }
        None => unidoc.load_file(input),
    }
}

fn report_warnings(loaded: &Loaded) {
    let warnings = &loaded.document().metadata().warnings;
    if warnings.is_empty() {
        return;
    }
    eprintln!("{} {} warning(s)", "Partial extraction:".yellow().bold(), warnings.len());
    for warning in warnings {
        eprintln!("  {} {}", "-".dimmed(), warning);
    }
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    format: Option<&str>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(input, format, ConvertOptions::default())?;
    report_warnings(&loaded);

    let json = loaded.document().to_json(!compact)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_convert(
    input: &Path,
    targets: &[String],
    output: Option<&Path>,
    format: Option<&str>,
    options: ConvertOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(input, format, options)?;
    report_warnings(&loaded);

    if let [target] = targets {
        let result = loaded.export(target)?;
        for degradation in &result.degradations {
            log::info!("{}", degradation);
        }
        match (output, result.text()) {
            (Some(path), _) => {
                fs::write(path, result.bytes())?;
                println!("{} {}", "Saved to".green(), path.display());
            }
            (None, Some(text)) => print!("{}", text),
            (None, None) => {
                let path = default_output_path(input, target);
                fs::write(&path, result.bytes())?;
                println!("{} {}", "Saved to".green(), path.display());
            }
        }
        return Ok(());
    }

    let output_dir = output.map(Path::to_path_buf).unwrap_or_else(|| default_output_dir(input));
    let tags: Vec<&str> = targets.iter().map(String::as_str).collect();
    write_targets(&loaded, &tags, &output_dir)
}

fn cmd_convert_all(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(input, None, ConvertOptions::default())?;
    report_warnings(&loaded);

    let output_dir = output.map(Path::to_path_buf).unwrap_or_else(|| default_output_dir(input));
    write_targets(&loaded, &DEFAULT_TARGETS, &output_dir)
}

fn write_targets(loaded: &Loaded, tags: &[&str], output_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(output_dir)?;

    let pb = ProgressBar::new(tags.len() as u64 + 1);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    pb.set_message("Rendering...");
    let results = loaded.export_many(tags);
    pb.inc(1);

    let mut written = Vec::new();
    for (tag, result) in tags.iter().zip(results) {
        let result = result?;
        let filename = format!("extract.{}", tag);
        pb.set_message(format!("Writing {}...", filename));
        fs::write(output_dir.join(&filename), result.bytes())?;
        written.push((filename, result.degradations.len()));
        pb.inc(1);
    }

    pb.finish_with_message("Done!");

    println!("\n{} {}", "Output files:".green().bold(), output_dir.display());
    let last = written.len().saturating_sub(1);
    for (i, (filename, degraded)) in written.iter().enumerate() {
        let branch = if i == last { "└─" } else { "├─" };
        if *degraded > 0 {
            println!("  {} {} {}", branch.dimmed(), filename, format!("({} degraded)", degraded).yellow());
        } else {
            println!("  {} {}", branch.dimmed(), filename);
        }
    }

    Ok(())
}

fn default_output_dir(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}_output", stem))
}

fn default_output_path(input: &Path, tag: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}.{}", stem, tag))
}

fn cmd_summarize(input: &Path, format: Option<&str>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(input, format, ConvertOptions::default())?;
    let summary = loaded.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let metadata = loaded.document().metadata();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), summary.source_format);
    println!("{}: {}", "Pages".bold(), summary.page_count);
    println!("{}: {}", "Direction".bold(), summary.direction);

    if let Some(ref title) = summary.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref language) = metadata.language {
        println!("{}: {}", "Language".bold(), language);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Words".bold(), metadata.word_count.unwrap_or(0));
    println!("{}: {}", "Blocks".bold(), summary.block_count);
    println!("{}: {}", "Headings".bold(), summary.heading_count);
    println!("{}: {}", "Paragraphs".bold(), summary.paragraph_count);
    println!("{}: {}", "Tables".bold(), summary.table_count);
    println!("{}: {}", "Lists".bold(), summary.list_count);
    println!("{}: {}", "Images".bold(), summary.image_count);
    println!("{}: {}", "Links".bold(), summary.link_count);
    if summary.positioned_count > 0 {
        println!(
            "{}: {} ({} low confidence)",
            "OCR blocks".bold(),
            summary.positioned_count,
            summary.low_confidence_count
        );
    }
    if summary.warning_count > 0 {
        println!("{}: {}", "Warnings".bold().yellow(), summary.warning_count);
    }

    Ok(())
}

fn cmd_formats() {
    let unidoc = Unidoc::new();
    println!("{}", "Input formats".cyan().bold());
    println!("  {}", unidoc.supported_input_formats().join(", "));
    println!("  {}", "(images need an OCR engine through the library API)".dimmed());
    println!("{}", "Output formats".cyan().bold());
    println!("  {}", unidoc.supported_output_formats().join(", "));
}

fn cmd_version() {
    println!("{} {}", "unidoc".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document extraction and conversion tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/unidoc".dimmed());
    println!("License: MIT");
}
