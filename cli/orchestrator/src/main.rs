//! Clientgen command line
//!
//! Turns a code model document into client library sources.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clientgen_cli::{generate, write_graph, write_output, CliError, Overrides};
use config::Config;

/// Command-line interface of the client generator.
#[derive(Parser, Debug)]
#[command(name = "clientgen", about = "Generate typed client libraries from a code model", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
    /// Settings file (TOML); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate sources from a code model document
    Generate {
        /// Code model JSON document
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Directory the sources are written into
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep flattened objects nested
        #[arg(long)]
        no_flatten: bool,
        /// Leave optional constants as constants
        #[arg(long)]
        no_promote_constants: bool,
        /// Skip typed convenience methods
        #[arg(long)]
        no_convenience: bool,
        /// Skip `_async` methods
        #[arg(long)]
        no_async: bool,
        /// Run rustfmt over each written file
        #[arg(long)]
        rustfmt: bool,
        /// Also write the client model graph as JSON to this path
        #[arg(long)]
        graph: Option<PathBuf>,
    },
    /// Print the effective settings as TOML
    Settings,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(path) = e.model_path() {
                eprintln!("  at: {}", path);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = Config::from_optional_file(cli.config.as_ref())?;
    logging::init(&config.logging.level);

    match cli.cmd {
        Commands::Generate {
            input,
            output,
            no_flatten,
            no_promote_constants,
            no_convenience,
            no_async,
            rustfmt,
            graph,
        } => {
            Overrides { no_flatten, no_promote_constants, no_convenience, no_async }
                .apply(&mut config.settings);
            let input = input.unwrap_or_else(|| config.codegen.input_path.clone());
            let out_dir = output.unwrap_or_else(|| config.codegen.output_dir.clone());

            let generated = generate(&input, &config)?;
            let written = write_output(&generated, &out_dir, rustfmt)?;
            if let Some(path) = graph {
                write_graph(&generated, &path)?;
            }
            println!(
                "Generated {} files for `{}` in {}",
                written,
                generated.graph.namespace,
                out_dir.display()
            );
        }
        Commands::Settings => print!("{}", config.to_toml()?),
    }
    Ok(())
}
