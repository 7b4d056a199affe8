use clap::{Args, Parser, Subcommand};
use planilla_consolidator::cli::{self, ConfigOverrides, RunOptions};
use planilla_consolidator::error::ConsolidateResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "consolidate")]
#[command(about = "Consolidate Excel / CSV work-report spreadsheets into one canonical table")]
#[command(long_about = "Consolidator - merge heterogeneous payroll spreadsheets

Reads every .xlsx/.xls/.csv file given, maps its headers onto the canonical
schema (trim + whitespace collapse), drops rows without NUMERO OBRA ICONSTRUYE
and writes one consolidated Excel file plus a log of warnings/errors.

COMMANDS:
  run      - Consolidate files into one Excel workbook
  schema   - Show the canonical columns
  sheets   - Show which sheet of a workbook would be read
  watch    - Re-consolidate a directory on every change

EXAMPLES:
  consolidate run planillas/ -o unificado.xlsx
  consolidate run a.xlsx b.csv --delimiter ';' --encoding latin-1
  consolidate run *.xlsx --sheet Datos --pick-sheet
  consolidate schema --preset split")]
#[command(version)]
struct Cli {
    /// Show debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
struct ConfigArgs {
    /// YAML configuration file
    #[arg(short, long, env = "CONSOLIDATE_CONFIG")]
    config: Option<PathBuf>,

    /// CSV separator (single character, "\t" for tab)
    #[arg(long)]
    delimiter: Option<String>,

    /// CSV encoding: utf-8, latin-1 or utf-16 (latin-1 is read as windows-1252,
    /// so bytes 0x80-0x9F decode to characters such as € and curly quotes)
    #[arg(long)]
    encoding: Option<String>,

    /// Preferred workbook sheet name
    #[arg(long)]
    sheet: Option<String>,

    /// Match the preferred sheet name ignoring surrounding/doubled whitespace
    #[arg(long)]
    loose_sheet_match: bool,

    /// Ask which sheet to read when the preferred one is missing
    #[arg(long)]
    pick_sheet: bool,

    /// Canonical schema preset: combined or split
    #[arg(long)]
    preset: Option<String>,
}

impl ConfigArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            delimiter: self.delimiter.clone(),
            encoding: self.encoding.clone(),
            sheet: self.sheet.clone(),
            normalized_sheet_match: self.loose_sheet_match,
            pick_sheet: self.pick_sheet,
            preset: self.preset.clone(),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
struct OutputArgs {
    /// Consolidated Excel file (default: unificado.xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Warnings/errors log, written only when there is something to report
    #[arg(long)]
    log: Option<PathBuf>,

    /// Print the first N consolidated rows
    #[arg(long, default_value_t = 0)]
    preview: usize,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Consolidate spreadsheets into one Excel workbook.

Each file is read fully as text. Workbooks use the preferred sheet (BBDD by
default) or fall back to the first sheet. A file that cannot be read is
reported in the log and skipped; the rest are still consolidated.

Directories are expanded to their .csv/.xlsx/.xls files in name order.")]
    /// Consolidate files into one Excel workbook
    Run {
        /// Input files or directories
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Show the canonical columns
    Schema {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Show which sheet of a workbook would be read
    Sheets {
        /// Workbook file (.xlsx / .xls)
        file: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    #[command(long_about = "Watch a directory and re-consolidate on changes.

The output workbook and log are excluded from the inputs even when they are
written into the watched directory.

Press Ctrl+C to stop watching.")]
    /// Re-consolidate a directory on every change
    Watch {
        /// Directory holding the input files
        dir: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn run_options(output: OutputArgs, config: &ConfigArgs, verbose: bool) -> RunOptions {
    RunOptions {
        output: output.output,
        log: output.log,
        config: config.config.clone(),
        overrides: config.overrides(),
        preview: output.preview,
        verbose,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "planilla_consolidator=debug"
    } else {
        "planilla_consolidator=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ConsolidateResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            files,
            output,
            config,
        } => cli::run(files, run_options(output, &config, cli.verbose)),

        Commands::Schema { config } => cli::schema(config.config.clone(), config.overrides()),

        Commands::Sheets { file, config } => {
            cli::sheets(file, config.config.clone(), config.overrides())
        }

        Commands::Watch {
            dir,
            output,
            config,
        } => cli::watch(dir, run_options(output, &config, cli.verbose)),
    }
}
