//! Command line host: reads the enclosing file, applies edits, and writes results back.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use dialoguer::Input;

use crate::app::extract::{ExtractOptions, ExtractRequest, Extractor};
use crate::app::naming::{SuffixPolicy, TagStyle};
use crate::app::scanner::BlockScan;
use crate::domain::errors::ExtractError;
use crate::domain::model::SelectionSpan;
use crate::infra::config::Config;
use crate::infra::host::{FsHost, Host, Notification};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Extract a template fragment into a standalone Angular component",
    long_about = None
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug); NGEXTRACT_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Move a selection of FILE into a new component and reference it in place
    Extract(ExtractArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Source file holding the selection
    pub file: PathBuf,
    /// Byte range of the selection, end exclusive
    #[arg(long, value_name = "START:END", value_parser = parse_byte_range, conflicts_with = "lines")]
    pub bytes: Option<(usize, usize)>,
    /// Line range of the selection, 1-based and inclusive
    #[arg(long, value_name = "FIRST[-LAST]", value_parser = parse_line_range)]
    pub lines: Option<(usize, usize)>,
    /// Component name in kebab-case; prompted for when omitted
    #[arg(short, long)]
    pub name: Option<String>,
    #[arg(long, value_enum)]
    pub suffix_policy: Option<SuffixPolicy>,
    #[arg(long, value_enum)]
    pub tag_style: Option<TagStyle>,
    /// How the @Component block is located
    #[arg(long, value_enum)]
    pub scan: Option<BlockScan>,
    /// Leave the enclosing component's imports alone
    #[arg(long)]
    pub no_rewire: bool,
    /// Print the planned changes as JSON without touching any file
    #[arg(long)]
    pub dry_run: bool,
}

impl ExtractArgs {
    fn apply_overrides(&self, options: &mut ExtractOptions) {
        if let Some(policy) = self.suffix_policy {
            options.naming.policy = policy;
        }
        if let Some(style) = self.tag_style {
            options.naming.tag_style = style;
        }
        if let Some(scan) = self.scan {
            options.block_scan = scan;
        }
        if self.no_rewire {
            options.rewire_enclosing = false;
        }
    }

    fn selection(&self, buffer: &str) -> Result<Option<SelectionSpan>> {
        let range = match (self.bytes, self.lines) {
            (Some(range), _) => range,
            (None, Some((first, last))) => line_span(buffer, first, last).ok_or_else(|| {
                anyhow!(
                    "lines {first}-{last} are outside {} ({} lines)",
                    self.file.display(),
                    buffer.lines().count()
                )
            })?,
            (None, None) => return Ok(None),
        };
        Ok(Some(SelectionSpan::from_buffer(buffer, range)?))
    }
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Config => {
            let config = Config::load()?;
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_extract(args: ExtractArgs) -> Result<ExitCode> {
    let config = Config::load()?;
    let mut options = ExtractOptions::from_config(&config);
    args.apply_overrides(&mut options);
    let extractor = Extractor::new(options)?;

    let mut host = FsHost::open(&args.file)?;
    let selection = match args.selection(host.buffer()) {
        Ok(selection) => selection,
        Err(err) => {
            host.notify(Notification::Error(format!("{err:#}")));
            return Ok(ExitCode::FAILURE);
        }
    };
    if let Err(err) = Extractor::validate_selection(host.buffer(), selection.as_ref()) {
        return Ok(report_failure(&mut host, err));
    }

    let identifier = match args.name.clone() {
        Some(name) => Some(name),
        None => prompt_identifier()?,
    };

    let request = ExtractRequest {
        enclosing_path: args.file.clone(),
        buffer: host.buffer().to_owned(),
        selection,
        identifier,
    };

    if args.dry_run {
        return match extractor.plan(&request) {
            Ok(plan) => {
                let rendered =
                    serde_json::to_string_pretty(&plan).context("failed to serialize plan")?;
                println!("{rendered}");
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(report_failure(&mut host, err)),
        };
    }

    match extractor.run(&request, &mut host) {
        Ok(report) => {
            tracing::debug!(created = %report.created.display(), partial = report.is_partial(), "extract complete");
            host.finish()?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_silent() => Ok(ExitCode::SUCCESS),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

fn report_failure(host: &mut dyn Host, err: ExtractError) -> ExitCode {
    if err.is_silent() {
        tracing::debug!("extraction cancelled");
        return ExitCode::SUCCESS;
    }
    host.notify(Notification::Error(err.to_string()));
    ExitCode::FAILURE
}

/// Ask for the component name. A blank answer means the user backed out.
fn prompt_identifier() -> Result<Option<String>> {
    let answer: String = Input::new()
        .with_prompt("Enter component name (in kebab-case, e.g. my-new-component)")
        .allow_empty(true)
        .interact_text()
        .context("failed to read component name")?;
    Ok(Some(answer).filter(|name| !name.trim().is_empty()))
}

fn parse_byte_range(value: &str) -> Result<(usize, usize), String> {
    let (start, end) = value
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{value}'"))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|err| format!("invalid start offset '{start}': {err}"))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|err| format!("invalid end offset '{end}': {err}"))?;
    if end < start {
        return Err(format!("end offset {end} is before start offset {start}"));
    }
    Ok((start, end))
}

fn parse_line_range(value: &str) -> Result<(usize, usize), String> {
    let (first, last) = value.split_once('-').unwrap_or((value, value));
    let first: usize = first
        .trim()
        .parse()
        .map_err(|err| format!("invalid line '{first}': {err}"))?;
    let last: usize = last
        .trim()
        .parse()
        .map_err(|err| format!("invalid line '{last}': {err}"))?;
    if first == 0 || last < first {
        return Err(format!("invalid line range {first}-{last}"));
    }
    Ok((first, last))
}

/// Byte range covering lines `first..=last` (1-based), excluding the final line break.
fn line_span(buffer: &str, first: usize, last: usize) -> Option<(usize, usize)> {
    let mut offset = 0;
    let mut start = None;
    for (index, line) in buffer.split_inclusive('\n').enumerate() {
        let number = index + 1;
        if number == first {
            start = Some(offset);
        }
        if number == last {
            let content = line.trim_end_matches(['\n', '\r']);
            return start.map(|start| (start, offset + content.len()));
        }
        offset += line.len();
    }
    None
}
