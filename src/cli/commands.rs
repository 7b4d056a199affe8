use crate::config::{ConsolidateConfig, SheetMatch, TextEncoding};
use crate::error::{ConsolidateError, ConsolidateResult};
use crate::export::write_outputs;
use crate::ingest::{self, SheetPicker};
use crate::pipeline::{BatchReport, Consolidator, FileStatus};
use crate::schema::SchemaPreset;
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub delimiter: Option<String>,
    pub encoding: Option<String>,
    pub sheet: Option<String>,
    pub normalized_sheet_match: bool,
    pub pick_sheet: bool,
    pub preset: Option<String>,
}

/// Options shared by `run` and `watch`.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub output: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    pub preview: usize,
    pub verbose: bool,
}

/// Interactive sheet choice on a terminal.
struct TerminalPicker;

impl SheetPicker for TerminalPicker {
    fn pick(&self, file_name: &str, sheet_names: &[String]) -> Option<String> {
        if !std::io::stdin().is_terminal() {
            return None;
        }
        let choice = dialoguer::Select::new()
            .with_prompt(format!("Choose sheet for {}", file_name))
            .items(sheet_names)
            .default(0)
            .interact_opt()
            .ok()??;
        sheet_names.get(choice).cloned()
    }
}

/// Load the config file (if any) and apply command-line overrides.
pub fn load_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> ConsolidateResult<ConsolidateConfig> {
    let mut config = match path {
        Some(p) => ConsolidateConfig::from_yaml_file(p)?,
        None => ConsolidateConfig::default(),
    };

    if let Some(delimiter) = &overrides.delimiter {
        config.csv.delimiter = delimiter.clone();
    }
    if let Some(encoding) = &overrides.encoding {
        config.csv.encoding = encoding.parse::<TextEncoding>()?;
    }
    if let Some(sheet) = &overrides.sheet {
        config.workbook.preferred_sheet = sheet.clone();
    }
    if overrides.normalized_sheet_match {
        config.workbook.sheet_match = SheetMatch::Normalized;
    }
    if overrides.pick_sheet {
        config.workbook.allow_sheet_picker = true;
    }
    if let Some(preset) = &overrides.preset {
        config.schema.preset = preset.parse::<SchemaPreset>()?;
        config.schema.columns = None;
    }

    Ok(config)
}

/// Execute the run command
pub fn run(files: Vec<PathBuf>, options: RunOptions) -> ConsolidateResult<()> {
    println!("{}", "📑 Consolidating spreadsheets".bold().green());

    let config = load_config(options.config.as_deref(), &options.overrides)?;
    let inputs = ingest::expand_inputs(&files)?;
    if inputs.is_empty() {
        return Err(ConsolidateError::Validation(
            "No input files (expected .csv, .xlsx or .xls)".to_string(),
        ));
    }

    println!("   Files: {}", inputs.len());
    if options.verbose {
        println!(
            "   Preferred sheet: {} | CSV: '{}' {}",
            config.workbook.preferred_sheet.cyan(),
            config.csv.delimiter,
            config.csv.encoding.label()
        );
    }
    println!();

    let report = run_batch(&inputs, config, &options)?;
    print_summary(&report, options.preview);
    Ok(())
}

/// Consolidate `inputs`, print progress, and write both outputs.
fn run_batch(
    inputs: &[PathBuf],
    config: ConsolidateConfig,
    options: &RunOptions,
) -> ConsolidateResult<BatchReport> {
    let workbook_path = options
        .output
        .clone()
        .unwrap_or_else(|| config.output.workbook.clone());
    let log_path = options
        .log
        .clone()
        .unwrap_or_else(|| config.output.log.clone());
    let output_config = config.output.clone();

    let mut consolidator = Consolidator::new(config)?;
    if consolidator.config().workbook.allow_sheet_picker {
        consolidator = consolidator.with_picker(Box::new(TerminalPicker));
    }

    let report = consolidator.run_paths(inputs, |progress| {
        println!(
            "   [{}/{}] {}",
            progress.processed, progress.total, progress.file_name
        );
    });

    let written = write_outputs(&report, &output_config, &workbook_path, &log_path)?;

    println!();
    println!("{}", "✅ Consolidation complete".bold().green());
    println!("   Excel file: {}", written.workbook.display());
    if let Some(log) = &written.log {
        println!("   Log file:   {}", log.display().to_string().yellow());
    }

    Ok(report)
}

fn print_summary(report: &BatchReport, preview: usize) {
    println!();
    println!(
        "   {} rows from {} files ({} failed)",
        report.rows().to_string().bold(),
        report.files.len(),
        report.files_failed()
    );

    for file in &report.files {
        match &file.status {
            FileStatus::Consolidated => println!(
                "   {} {} ({} kept, {} discarded, {} missing columns)",
                "✓".green(),
                file.name,
                file.rows_kept,
                file.rows_discarded,
                file.missing_columns.len()
            ),
            FileStatus::Failed { cause } => {
                println!("   {} {} - {}", "✗".red(), file.name, cause.red())
            }
        }
    }

    if !report.diagnostics.is_empty() {
        println!();
        println!("{}", "⚠️  Warnings / errors:".yellow().bold());
        for line in report.diagnostics.lines() {
            println!("   {}", line.yellow());
        }
    }

    if preview > 0 {
        println!();
        println!("{}", "📋 Preview:".bold().cyan());
        println!("   {}", report.table.columns.join(" | ").bold());
        for row in report.table.preview(preview) {
            println!("   {}", row.join(" | "));
        }
        if report.rows() > preview {
            println!("   … {} more rows", report.rows() - preview);
        }
    }
    println!();
}

/// Execute the schema command - list canonical columns
pub fn schema(config: Option<PathBuf>, overrides: ConfigOverrides) -> ConsolidateResult<()> {
    let config = load_config(config.as_deref(), &overrides)?;
    let catalog = config.catalog()?;

    println!("{}", "📐 Canonical schema".bold().green());
    println!("   {:>2}. {}", 0, config.schema.provenance_column.cyan());
    for (idx, column) in catalog.columns().iter().enumerate() {
        let marker = if catalog.position(&config.schema.required_column) == Some(idx) {
            " (required)".yellow().to_string()
        } else {
            String::new()
        };
        println!("   {:>2}. {:?}{}", idx + 1, column, marker);
    }
    println!();
    Ok(())
}

/// Execute the sheets command - show a workbook's sheets and which one is read
pub fn sheets(
    file: PathBuf,
    config: Option<PathBuf>,
    overrides: ConfigOverrides,
) -> ConsolidateResult<()> {
    let config = load_config(config.as_deref(), &overrides)?;
    let input = ingest::load_input(&file)?;
    let names = ingest::sheet_names(&input.name, &input.bytes)?;
    // Sheet picker is never invoked here; report the non-interactive choice.
    let selected = ingest::select_sheet(
        &input.name,
        &names,
        &crate::config::WorkbookOptions {
            allow_sheet_picker: false,
            ..config.workbook.clone()
        },
        None,
    )?;

    println!("{}", "📒 Workbook sheets".bold().green());
    println!("   File: {}", file.display());
    for name in &names {
        if *name == selected {
            println!("   {} {}", "→".green(), name.bold());
        } else {
            println!("     {}", name);
        }
    }
    if preferred_sheet_missing(&names, &config.workbook) {
        println!(
            "   {}",
            format!(
                "Preferred sheet '{}' not found; first sheet is used",
                config.workbook.preferred_sheet
            )
            .yellow()
        );
    }
    println!();
    Ok(())
}

/// Whether `sheets` should warn that the preferred sheet falls back to the first.
fn preferred_sheet_missing(names: &[String], options: &crate::config::WorkbookOptions) -> bool {
    ingest::find_preferred_sheet(names, options).is_none()
}

/// Execute the watch command - re-consolidate a directory on every change
pub fn watch(dir: PathBuf, options: RunOptions) -> ConsolidateResult<()> {
    println!("{}", "👁️  Consolidator - Watch Mode".bold().green());
    println!("   Watching: {}", dir.display());
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !dir.is_dir() {
        return Err(ConsolidateError::Validation(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }

    let config = load_config(options.config.as_deref(), &options.overrides)?;
    // Fail fast on configuration before watching anything
    config.catalog()?;

    let excluded = excluded_names(&config, &options);

    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)
        .map_err(|e| ConsolidateError::Validation(format!("Failed to create file watcher: {}", e)))?;
    debouncer
        .watcher()
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| ConsolidateError::Validation(format!("Failed to watch directory: {}", e)))?;

    println!("{}", "🔄 Initial run...".cyan());
    run_watch_action(&dir, &config, &options, &excluded);

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && ingest::is_supported(&event.path)
                        && !is_excluded(&event.path, &excluded)
                });
                if relevant {
                    println!(
                        "\n{} {}",
                        "🔄 Change detected at".cyan(),
                        chrono::Local::now().format("%H:%M:%S").to_string().cyan()
                    );
                    run_watch_action(&dir, &config, &options, &excluded);
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

/// Output files live next to the inputs in watch mode and must not be re-read.
fn excluded_names(config: &ConsolidateConfig, options: &RunOptions) -> Vec<String> {
    let workbook = options.output.as_ref().unwrap_or(&config.output.workbook);
    let log = options.log.as_ref().unwrap_or(&config.output.log);
    [workbook, log]
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect()
}

fn is_excluded(path: &Path, excluded: &[String]) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| excluded.iter().any(|e| e == n))
        .unwrap_or(false)
}

fn run_watch_action(dir: &Path, config: &ConsolidateConfig, options: &RunOptions, excluded: &[String]) {
    let inputs = match ingest::expand_inputs(&[dir]) {
        Ok(paths) => paths
            .into_iter()
            .filter(|p| !is_excluded(p, excluded))
            .collect::<Vec<_>>(),
        Err(e) => {
            println!("{} {}", "❌ Cannot list directory:".bold().red(), e);
            return;
        }
    };

    if inputs.is_empty() {
        println!("{}", "⚠️  No input files yet".yellow());
        return;
    }

    match run_batch(&inputs, config.clone(), options) {
        Ok(report) => print_summary(&report, options.preview),
        Err(e) => println!("{} {}", "❌ Consolidation failed:".bold().red(), e),
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
