//! metadump: command-line inspector for objbridge metadata blobs
//!
//! Loads a blob from disk and answers the same lookups the bridge performs
//! at run time, for a chosen platform version.

use anyhow::Context;
use clap::{Parser, Subcommand};
use objbridge_cli::commands::{self, list::KindFilter, members::MemberFilter};
use objbridge_cli::output::{resolve_color_choice, StyledOutput};
use objbridge_meta::{MetaFile, SystemVersion};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "metadump")]
#[command(about = "Inspect objbridge metadata blobs", long_about = None)]
#[command(version)]
struct Cli {
    /// Metadata blob to read
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Platform version availability is checked against, e.g. "13.2"
    #[arg(long, global = true, value_name = "VERSION")]
    system_version: Option<SystemVersion>,

    /// Include entities not available on the system version
    #[arg(long, global = true)]
    all: bool,

    /// Colorize output: auto, always or never
    #[arg(long, global = true, value_name = "WHEN")]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Table sizes and entity counts
    Info,

    /// Describe one entity
    Find {
        /// Scripting name of the entity
        name: String,
    },

    /// List entities
    List {
        /// Only entities of this kind
        #[arg(long, value_enum)]
        kind: Option<KindFilter>,
    },

    /// Members of an interface or protocol
    Members {
        /// Interface or protocol name
        class: String,
        /// Only this member table
        #[arg(long, value_enum)]
        kind: Option<MemberFilter>,
    },

    /// Base class chain of an interface
    Hierarchy {
        /// Interface name
        interface: String,
    },

    /// Modules and their libraries
    Modules,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let blob = std::fs::read(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let system = cli.system_version.unwrap_or_default();
    let file = MetaFile::new(&blob, system)
        .with_context(|| format!("Failed to open {}", cli.file.display()))?;
    log::debug!("opened {} for system {}", cli.file.display(), system);

    let mut out = StyledOutput::stdout(resolve_color_choice(cli.color.as_deref()));
    match cli.command {
        Commands::Info => commands::info::execute(file, &mut out)?,
        Commands::Find { name } => commands::find::execute(file, &name, cli.all, &mut out)?,
        Commands::List { kind } => {
            commands::list::execute(file, kind, cli.all, &mut out)?;
        }
        Commands::Members { class, kind } => {
            commands::members::execute(file, &class, kind, cli.all, &mut out)?;
        }
        Commands::Hierarchy { interface } => {
            commands::hierarchy::execute(file, &interface, &mut out)?;
        }
        Commands::Modules => commands::modules::execute(file, &mut out)?,
    }

    Ok(())
}
