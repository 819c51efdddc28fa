//! Ward administration CLI.
//!
//! Scaffolds `.triage/`, validates the persisted ward and reports active
//! triages and expired step timers for scripts and shift handovers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use triage::clock::SystemClock;
use triage::core::snapshot::ActiveTriageRow;
use triage::exit_codes;
use triage::io::config::load_config;
use triage::io::init::{InitOptions, TriagePaths, init_triage};
use triage::io::store::load_ward;
use triage::logging;
use triage::ward::Ward;

#[derive(Parser)]
#[command(
    name = "triage",
    version,
    about = "Emergency-department triage ward administration"
)]
struct Cli {
    /// Project directory containing `.triage/`.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.triage/` with schema, default config and an empty ward.
    Init {
        /// Overwrite existing files, including the ward.
        #[arg(short, long)]
        force: bool,
    },
    /// Check config, then the ward against schema and invariants.
    Validate,
    /// Print active triages with their remaining times.
    List,
    /// Exit with code 2 if any running step timer has expired.
    Overdue,
}

fn main() -> ExitCode {
    logging::init();
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(exit_code_byte(exit_codes::INVALID))
        }
    }
}

fn run() -> Result<u8> {
    let cli = Cli::parse();
    let paths = TriagePaths::new(cli.root);
    let code = match cli.command {
        Command::Init { force } => cmd_init(&paths, force)?,
        Command::Validate => cmd_validate(&paths)?,
        Command::List => cmd_list(&paths)?,
        Command::Overdue => cmd_overdue(&paths)?,
    };
    Ok(exit_code_byte(code))
}

fn cmd_init(paths: &TriagePaths, force: bool) -> Result<i32> {
    let paths = init_triage(&paths.root, &InitOptions { force })?;
    println!("initialized {}", paths.triage_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_validate(paths: &TriagePaths) -> Result<i32> {
    load_config(&paths.config_path)?;
    let ward = load_ward(&paths.schema_path, &paths.ward_path)?;
    println!("ok: {} patients", ward.patients.len());
    Ok(exit_codes::OK)
}

fn cmd_list(paths: &TriagePaths) -> Result<i32> {
    let ward = Ward::open(paths, Box::new(SystemClock))?;
    for row in ward.snapshot_all() {
        println!("{}", format_row(&row));
    }
    Ok(exit_codes::OK)
}

fn cmd_overdue(paths: &TriagePaths) -> Result<i32> {
    let ward = Ward::open(paths, Box::new(SystemClock))?;
    let overdue: Vec<ActiveTriageRow> = ward
        .snapshot_all()
        .into_iter()
        .filter(is_overdue)
        .collect();
    for row in &overdue {
        println!("{}", format_row(row));
    }
    Ok(if overdue.is_empty() {
        exit_codes::OK
    } else {
        exit_codes::OVERDUE
    })
}

/// Step timer running and at zero.
fn is_overdue(row: &ActiveTriageRow) -> bool {
    row.timer_ends_at.is_some() && row.time_remaining == 0
}

fn format_row(row: &ActiveTriageRow) -> String {
    let mut line = format!(
        "{}\t{}\t{}\tstep {} ({})\t{}s",
        row.id,
        row.full_name,
        row.priority,
        row.step,
        row.step_name,
        row.time_remaining
    );
    if let Some(actions) = row.actions_time_remaining {
        line.push_str(&format!(
            "\tactions {}/{} {}s",
            row.actions_completed, row.actions_total, actions
        ));
    }
    if let Some(brigade) = row.brigade_time_remaining {
        line.push_str(&format!("\ttimer {brigade}s"));
    }
    line
}

fn exit_code_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
