#![forbid(unsafe_code)]

mod cmd;
mod input;
mod output;

use arbor_core::config::{load_engine_config, resolve_output_mode};
use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "arbor: render flat hierarchy records as navigable forests",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Render the forest of a record file",
        after_help = "EXAMPLES:\n    arbor tree records.json\n    arbor tree records.json --json"
    )]
    Tree(cmd::tree::TreeArgs),

    #[command(
        about = "Render items grouped under their types",
        after_help = "EXAMPLES:\n    arbor grouped catalog.json\n    arbor grouped items.json types.json"
    )]
    Grouped(cmd::grouped::GroupedArgs),

    #[command(
        name = "check-parent",
        about = "Check whether a parent or subtype edit would create a cycle",
        after_help = "EXAMPLES:\n    arbor check-parent records.json child new-parent\n    arbor check-parent records.json child base --subtype"
    )]
    CheckParent(cmd::check::CheckArgs),

    #[command(about = "List cycles already present in stored parent edges")]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(about = "List every visible position with its index")]
    Flat(cmd::flat::FlatArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ARBOR_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "arbor=debug,info"
        } else {
            "arbor=info,warn"
        })
    });

    let format = env::var("ARBOR_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = OutputMode::from_name(&resolve_output_mode(cli.json)?);
    let project_root = env::current_dir()?;
    let config = match load_engine_config(&project_root) {
        Ok(config) => config,
        Err(e) => {
            render_error(
                output,
                &CliError::from_code(
                    arbor_core::error::ErrorCode::ConfigParseError,
                    format!("{e:#}"),
                ),
            )?;
            return Err(e);
        }
    };

    match cli.command {
        Commands::Tree(ref args) => cmd::tree::run_tree(args, output, &config),
        Commands::Grouped(ref args) => cmd::grouped::run_grouped(args, output, &config),
        Commands::CheckParent(ref args) => cmd::check::run_check(args, output, &config),
        Commands::Cycles(ref args) => cmd::cycles::run_cycles(args, output),
        Commands::Flat(ref args) => cmd::flat::run_flat(args, output, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_before_subcommand() {
        let cli = Cli::parse_from(["arbor", "--json", "tree", "r.json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Tree(_)));
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["arbor", "cycles", "r.json", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Cycles(_)));
    }

    #[test]
    fn check_parent_is_kebab_case() {
        let cli = Cli::parse_from(["arbor", "check-parent", "r.json", "a", "b"]);
        assert!(matches!(cli.command, Commands::CheckParent(_)));
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        assert!(Cli::try_parse_from(["arbor", "tree"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
