mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pyrite",
    version,
    about = "Validator, normalizer, and reformatter for pyproject.toml"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate a pyproject.toml file.
    Check {
        /// Path to the pyproject.toml file.
        #[arg(default_value = "pyproject.toml")]
        file: PathBuf,
        /// Skip reading and rendering the readme file.
        #[arg(long, default_value_t = false)]
        skip_readme: bool,
    },
    /// Reformat a pyproject.toml file in place.
    Reformat {
        /// Path to the pyproject.toml file.
        #[arg(default_value = "pyproject.toml")]
        file: PathBuf,
        /// Print a unified diff of the changes.
        #[arg(long, default_value_t = false)]
        diff: bool,
        /// Report whether the file would change without rewriting it.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Extract a field from a pyproject.toml file and print it as JSON.
    Info {
        /// Dotted field path, e.g. 'project.authors[0].name'.
        field: String,
        /// Path to the pyproject.toml file.
        #[arg(long, default_value = "pyproject.toml")]
        file: PathBuf,
        /// Inline readme and license file contents before extraction.
        #[arg(long, default_value_t = false)]
        resolve: bool,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PYRITE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Check { file, skip_readme } => {
            commands::check::run(&file, skip_readme, json_output)
        }
        Commands::Reformat { file, diff, check } => {
            commands::reformat::run(&file, diff, check, json_output)
        }
        Commands::Info {
            field,
            file,
            resolve,
        } => commands::info::run(&field, &file, resolve),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:") || msg.starts_with("failed to read") {
                EXIT_CONFIG_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
