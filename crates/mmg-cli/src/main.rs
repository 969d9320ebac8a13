use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use mmg_config::Settings;
use mmg_engine::{
    BaseDocument, BaseFile, ConvertOptions, HealthStatus, Verbosity, scan_base_files,
    write_targets,
};

#[derive(Parser, Debug)]
#[command(
    name = "mmg",
    version,
    about = "Split multilingual base documents into one document per language"
)]
struct Cli {
    /// Base files (`*.base.md`, `*.base.ipynb`, `*.base.yml`) or directories to scan
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Scan directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Only run the health check, write nothing
    #[arg(long)]
    check: bool,

    /// Convert without running the health check
    #[arg(long)]
    skip_health_check: bool,

    /// Convert even when the health check fails
    #[arg(short, long)]
    force: bool,

    /// Health log detail: -v adds tag counts, -vv adds every message
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Do not insert a table of contents
    #[arg(long)]
    no_toc: bool,

    /// Write outputs into this directory instead of next to each base file
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Ignore the settings file
    #[arg(long)]
    no_config: bool,

    /// Store the effective options as the new defaults
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// Flags override settings; switches can only be turned on.
    fn merge(&self, settings: Settings) -> Settings {
        Settings {
            verbosity: self.verbose.max(settings.verbosity).min(2),
            force_convert: self.force || settings.force_convert,
            skip_health_check: self.skip_health_check || settings.skip_health_check,
            recursive: self.recursive || settings.recursive,
            insert_toc: settings.insert_toc && !self.no_toc,
            output_dir: self.output_dir.clone().or(settings.output_dir),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    let stored = if cli.no_config {
        Settings::default()
    } else {
        Settings::load().context("Failed to load settings")?
    };
    let settings = cli.merge(stored);

    if cli.save_config {
        settings.save()?;
        log::info!("Saved settings to {}", Settings::config_path().display());
    }

    let files = collect_files(&cli.paths, settings.recursive)?;
    if files.is_empty() {
        log::warn!("No base files found");
        return Ok(());
    }

    let mut failed = 0;
    for file in &files {
        if let Err(e) = process_file(file, &settings, cli.check) {
            log::error!("{}: {e:#}", file.path.display());
            failed += 1;
        }
    }

    if failed > 0 {
        log::error!("{failed} of {} base file(s) failed", files.len());
        process::exit(1);
    }

    Ok(())
}

/// Directories are scanned, files must be base files.
fn collect_files(paths: &[PathBuf], recursive: bool) -> Result<Vec<BaseFile>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(scan_base_files(path, recursive)?);
        } else {
            files.push(BaseFile::new(path)?);
        }
    }
    Ok(files)
}

/// Runs the health check only when `check_only`, otherwise converts and writes.
fn process_file(file: &BaseFile, settings: &Settings, check_only: bool) -> Result<()> {
    if check_only {
        check_file(file, settings)
    } else {
        convert_file(file, settings).map(|_| ())
    }
}

fn check_file(file: &BaseFile, settings: &Settings) -> Result<()> {
    let doc = BaseDocument::read(file)?;
    let config = doc.extract_config()?;
    config.validate()?;

    let checker = doc.health_check(&config);
    let label = file.path.display().to_string();
    for line in checker.render_log(Some(&label), Verbosity::from(settings.verbosity)) {
        match checker.status() {
            HealthStatus::Healthy => log::info!("{line}"),
            _ => log::warn!("{line}"),
        }
    }

    if checker.status() != HealthStatus::Healthy {
        bail!("health check reported {}", checker.status());
    }
    Ok(())
}

fn convert_file(file: &BaseFile, settings: &Settings) -> Result<Vec<PathBuf>> {
    let doc = BaseDocument::read(file)?;
    let config = doc.extract_config()?;

    let options = ConvertOptions::new()
        .config(config.clone())
        .skip_health_check(settings.skip_health_check)
        .force_convert(settings.force_convert)
        .print_log(true)
        .file_name(file.path.display().to_string())
        .verbosity(Verbosity::from(settings.verbosity))
        .insert_toc(settings.insert_toc);
    let outputs = doc.convert(&options)?;

    let written = write_targets(file, &outputs, &config, settings.output_dir.as_deref())?;
    for path in &written {
        log::info!("  -> {}", display_relative(path));
    }
    Ok(written)
}

fn display_relative(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
