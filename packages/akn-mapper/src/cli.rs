//! Command-line interface for the mapper.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::UnmatchedElementPolicy;
use crate::error::{MapperError, Result};
use crate::hierarchy::HierarchicalExpander;
use crate::mapper::SchemaMapper;
use crate::profile::EditorProfile;
use crate::transform::TransformStats;
use crate::types::Direction;
use crate::xml::{parse_document_with, save_markup, write_document, write_document_pretty, XML_DECLARATION};

/// AKN Mapper - Convert between Akoma Ntoso XML and editor HTML.
#[derive(Parser)]
#[command(name = "akn-mapper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the verbosity flag.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transform documents with the rules of an editor profile.
    Transform {
        /// Editor profile (YAML or JSON)
        #[arg(short, long)]
        profile: PathBuf,

        /// `to` converts Akoma Ntoso to HTML, `from` converts HTML back
        #[arg(short, long, value_enum)]
        direction: Direction,

        /// Active plugins in composition order (default: the profile's list)
        #[arg(long, value_delimiter = ',')]
        plugins: Option<Vec<String>>,

        /// Output directory (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Policy for elements without a rule (default: the profile's policy)
        #[arg(short, long, value_enum)]
        unmatched: Option<UnmatchedElementPolicy>,

        /// Indent the output
        #[arg(long)]
        pretty: bool,

        /// Input documents
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Validate a profile and show how its plugins compose.
    Check {
        /// Editor profile (YAML or JSON)
        #[arg(short, long)]
        profile: PathBuf,
    },
}

/// Run a parsed command.
///
/// # Errors
/// Returns the first error raised by the command.
pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Transform {
            profile,
            direction,
            plugins,
            output,
            unmatched,
            pretty,
            inputs,
        } => {
            let mut profile = EditorProfile::from_path(&profile)?;
            if let Some(policy) = unmatched {
                profile.options.unmatched = policy;
            }
            if plugins.is_some() {
                profile.active = plugins;
            }
            let mut mapper = profile.into_mapper()?;
            transform_command(&mut mapper, direction, &inputs, output.as_deref(), pretty)
        }
        Commands::Check { profile } => check_command(&profile),
    }
}

/// Execute the transform command.
fn transform_command(
    mapper: &mut SchemaMapper,
    direction: Direction,
    inputs: &[PathBuf],
    output: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    if let Some(output_dir) = output {
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(MapperError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Output path is not a directory: {}", output_dir.display()),
            )));
        }
    }

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let mut written = Vec::new();
    for input in inputs {
        pb.set_message(format!("Transforming {}...", input.display()));

        let (markup, stats) = match transform_file(mapper, direction, input, pretty) {
            Ok(result) => result,
            Err(e) => {
                pb.finish_and_clear();
                return Err(e);
            }
        };

        match output {
            Some(dir) => {
                let path = dir.join(output_file_name(input, direction));
                if let Err(e) = save_markup(&markup, &path) {
                    pb.finish_and_clear();
                    return Err(e);
                }
                written.push((path, stats));
            }
            None => pb.suspend(|| print!("{markup}")),
        }
    }

    pb.finish_and_clear();

    for (path, stats) in &written {
        println!(
            "{} {} ({})",
            style("Saved to:").green().bold(),
            path.display(),
            stats
        );
        if stats.unmatched > 0 {
            println!(
                "  {} {}",
                style("Unmatched elements:").yellow(),
                style(stats.unmatched).yellow().bold()
            );
        }
    }

    Ok(())
}

/// Transform one file into markup ready to write.
fn transform_file(
    mapper: &mut SchemaMapper,
    direction: Direction,
    input: &Path,
    pretty: bool,
) -> Result<(String, TransformStats)> {
    let text = fs::read_to_string(input)?;
    let source = parse_document_with(&text, !mapper.options().drop_blank_text)?;

    let active = mapper.active().to_vec();
    let (root, stats) = mapper.transform_with_stats(&active, direction, &source)?;

    let body = if pretty {
        write_document_pretty(&root)
    } else {
        write_document(&root)
    };
    let markup = match direction {
        Direction::To => format!("{body}\n"),
        Direction::From => format!("{XML_DECLARATION}\n{body}\n"),
    };
    Ok((markup, stats))
}

/// `recitals.xml` becomes `recitals.html` going to HTML and back.
fn output_file_name(input: &Path, direction: Direction) -> PathBuf {
    let extension = match direction {
        Direction::To => "html",
        Direction::From => "xml",
    };
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    PathBuf::from(format!("{stem}.{extension}"))
}

/// Execute the check command.
fn check_command(profile_path: &Path) -> Result<()> {
    let profile = EditorProfile::from_path(profile_path)?;
    let mut mapper = profile.into_mapper()?;
    let active = mapper.active().to_vec();
    let registered = mapper.registry().len();

    println!(
        "{} {}",
        style("Profile").bold(),
        style(profile_path.display()).cyan()
    );
    println!("  Plugins: {registered} registered, {} active", active.len());

    let resolved = mapper.resolved(&active);
    for direction in [Direction::To, Direction::From] {
        println!(
            "  Rules ({direction}): {}",
            resolved.rules(direction).count()
        );
    }

    if resolved.overrides().is_empty() {
        println!("  Overrides: {}", style("none").green());
    } else {
        println!(
            "  Overrides: {}",
            style(resolved.overrides().len()).yellow().bold()
        );
        for record in resolved.overrides() {
            println!("    {}", style(record).yellow());
        }
    }

    for profile in resolved.hierarchies() {
        println!();
        println!(
            "{} {} (max depth {})",
            style("Hierarchy").bold(),
            style(&profile.root_element_name).cyan(),
            profile.max_depth
        );
        for direction in [Direction::To, Direction::From] {
            for (depth, rule) in HierarchicalExpander::expand(profile, direction)
                .iter()
                .enumerate()
            {
                println!(
                    "  {direction:<4} {}: {} -> {}",
                    depth + 1,
                    rule.input_selector(direction),
                    rule.output_selector(direction)
                );
            }
        }
    }

    println!();
    println!("{}", style("Profile is valid").green().bold());
    Ok(())
}
