//! kiln CLI - plans JavaScript build rules for a project.

mod colors;
mod output;
mod plan;
mod project;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use kiln_core::CompilationMode;

use crate::plan::PlanOptions;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Plan JavaScript compilation and linking rules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan rules for every library and executable of a project
    Plan {
        /// Path to the project file (.json)
        project: PathBuf,

        /// Override the project's compilation mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Compiler path to use instead of searching PATH
        #[arg(long)]
        compiler: Option<PathBuf>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Plan precompilation of an installed library
    Precompile {
        /// Path to the project file (.json)
        project: PathBuf,

        /// Path components below the installed JS directory: <variant> <library>
        components: Vec<String>,

        /// Compiler path to use instead of searching PATH
        #[arg(long)]
        compiler: Option<PathBuf>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every configuration variant and the flags selecting it
    Variants,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Separate,
    WholeProgram,
}

impl From<ModeArg> for CompilationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Separate => CompilationMode::SeparateCompilation,
            ModeArg::WholeProgram => CompilationMode::WholeProgram,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format kiln-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(kiln_err) = err.downcast_ref::<kiln_core::Error>() {
            anyhow::anyhow!("{}", kiln_err.with_hint())
        } else {
            err
        }
    };

    match cli.command {
        Commands::Plan {
            project,
            mode,
            compiler,
            json,
        } => {
            let opts = PlanOptions {
                mode: mode.map(Into::into),
                compiler: compiler.as_deref(),
                json,
            };
            plan::execute(&project, &opts).map_err(format_error)?;
        }

        Commands::Precompile {
            project,
            components,
            compiler,
            json,
        } => {
            let opts = PlanOptions {
                mode: None,
                compiler: compiler.as_deref(),
                json,
            };
            plan::precompile(&project, &components, &opts).map_err(format_error)?;
        }

        Commands::Variants => output::print_variants(),
    }

    Ok(())
}
