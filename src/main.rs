//! regmark CLI
//!
//! Usage:
//!   regmark convert -i <CSV>... [-o <JSON>...]
//!   regmark generate -i <FILE>... [-o <FILE>...] [-d <DIR>] [-t <DIR>]
//!
//! Options:
//!   -v, --verbose            Print parsed rows and rendered regions
//!   -c, --config <FILE>      Generation settings (TOML format)
//!   --dry-run                Report what would be written, write nothing
//!   --check                  Exit with status 1 if any file is out of date
//!   -h, --help               Print help

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::error;

use regmark::{convert_all, Config, DuplicatePolicy, Error, FilePair, Generator, Summary};

#[derive(Parser)]
#[command(name = "regmark")]
#[command(about = "Generate register code blocks from templates inside files")]
struct Cli {
    /// Print parsed rows and rendered regions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert CSV register tables into JSON data files
    Convert {
        /// Input tables
        #[arg(short, long, num_args = 1.., required = true, value_parser = existing_file)]
        input: Vec<PathBuf>,

        /// Output files, one per input
        #[arg(short, long, num_args = 1..)]
        output: Option<Vec<PathBuf>>,

        /// Fail on repeated register or field names instead of keeping the last one
        #[arg(long)]
        strict: bool,

        /// Report what would be written, write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Regenerate the marked regions of host files
    Generate {
        /// Host files
        #[arg(short, long, num_args = 1.., required = true, value_parser = existing_file)]
        input: Vec<PathBuf>,

        /// Output files, one per input; inputs are rewritten in place if not set
        #[arg(short, long, num_args = 1..)]
        output: Option<Vec<PathBuf>>,

        /// Base data directory
        #[arg(short, long, value_parser = existing_dir)]
        data_dir: Option<PathBuf>,

        /// Base template directory
        #[arg(short, long, value_parser = existing_dir)]
        template_dir: Option<PathBuf>,

        /// Generation settings (TOML format)
        #[arg(short, long, value_parser = existing_file)]
        config: Option<PathBuf>,

        /// Fail on undefined template variables
        #[arg(long)]
        strict_undefined: bool,

        /// Report what would be written, write nothing
        #[arg(long)]
        dry_run: bool,

        /// Write nothing and exit with status 1 if any file is out of date
        #[arg(long)]
        check: bool,
    },
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("{} is not a valid file", value))
    }
}

fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("{} is not a valid directory", value))
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e.report());
            process::exit(1);
        }
    }
}

fn run(command: Command) -> Result<i32, Error> {
    match command {
        Command::Convert {
            input,
            output,
            strict,
            dry_run,
        } => {
            let policy = if strict {
                DuplicatePolicy::Reject
            } else {
                DuplicatePolicy::LastWriteWins
            };
            let config = Config::new()
                .with_duplicates(policy)
                .with_dry_run(dry_run);
            let pairs = FilePair::zip(input, output)?;
            convert_all(&pairs, &config)?;
            Ok(0)
        }

        Command::Generate {
            input,
            output,
            data_dir,
            template_dir,
            config,
            strict_undefined,
            dry_run,
            check,
        } => {
            let mut settings = match &config {
                Some(path) => Config::from_file(path)?,
                None => Config::new(),
            };
            if let Some(dir) = data_dir {
                settings = settings.with_data_root(dir);
            }
            if let Some(dir) = template_dir {
                settings = settings.with_template_root(dir);
            }
            if strict_undefined {
                settings = settings.with_strict_undefined(true);
            }
            settings = settings.with_dry_run(dry_run || check);

            let pairs = FilePair::zip(input, output)?;
            let summary = Generator::new(settings).run(&pairs)?;
            Ok(exit_code(&summary, check))
        }
    }
}

/// Process status for a finished run; out-of-date outputs fail `--check`
fn exit_code(summary: &Summary, check: bool) -> i32 {
    if check && !summary.is_clean() {
        error!("{} file(s) out of date", summary.changed);
        return 1;
    }
    0
}
