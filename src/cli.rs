use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};
use crate::logging;
use crate::probe::config::load_config;
use crate::probe::container::HostContainerProbe;
use crate::probe::descriptor::{establish, lookup_for};
use crate::probe::paths::{resolve_paths, resolve_working_copy};
use crate::probe::resolver::{ConfigSourceResolver, ShellConfigLoader};

#[derive(Parser, Debug)]
#[command(
    name = "instance-probe",
    version,
    about = "Resolve the authoritative config and install state of a deployed instance"
)]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        help = "Working copy root (default: PROBE_WORKING_COPY or the current directory)"
    )]
    working_copy: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the installation state.
    State {
        #[arg(long, help = "Fail unless the instance is fully installed and in sync")]
        strict: bool,
    },
    /// Print the authoritative config file and the tracked files.
    Resolve,
    /// Operator report: settings, instance root, URL, state, container addresses.
    Info,
    /// Per-file drift between the working copy and the instance.
    Drift,
    /// Copy locally newer tracked files into the instance.
    Sync {
        #[arg(long)]
        dry_run: bool,
    },
}

fn print_report(json: bool, report: &CommandReport) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    match &report.text {
        Some(text) => println!("{text}"),
        None => {
            for detail in &report.details {
                println!("{detail}");
            }
        }
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let working_copy = resolve_working_copy(cli.working_copy.as_deref())?;
    let cfg = load_config(&working_copy)?;
    let paths = resolve_paths(working_copy, &cfg);
    let lookup = lookup_for(&cfg, &paths.working_copy);
    let (descriptor, lookup_events) = establish(&*lookup, &cfg);
    logging::emit_all(&lookup_events);

    let mut resolver =
        ConfigSourceResolver::new(descriptor, paths, cfg, Box::new(ShellConfigLoader));

    let (report, enforce) = match &cli.command {
        Commands::State { strict } => (
            commands::state::run(
                &mut resolver,
                &commands::state::StateOptions { strict: *strict },
            )?,
            *strict,
        ),
        Commands::Resolve => (commands::resolve::run(&mut resolver)?, false),
        Commands::Info => (commands::info::run(&mut resolver, &HostContainerProbe)?, false),
        Commands::Drift => (commands::drift::run(&mut resolver)?, false),
        Commands::Sync { dry_run } => (
            commands::sync::run(
                &mut resolver,
                &commands::sync::SyncOptions { dry_run: *dry_run },
            )?,
            false,
        ),
    };

    print_report(cli.json, &report)?;
    if enforce && !report.ok {
        anyhow::bail!("{}", report.issues.join("; "));
    }
    Ok(())
}
