use anyhow::Result;
use clap::{Parser, Subcommand};
use quicklaunch_cli::{commands, OutputFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quicklaunch")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Developer tool for the POE quick-launch page automation",
    long_about = "Quicklaunch shows how the content script classifies portal pages and \
                  validates the DOM selector tables it consumes."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "pretty")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which page handler would run for a URL
    Classify {
        /// Page URL
        #[arg(value_name = "URL")]
        url: String,

        /// Document referrer of the page
        #[arg(short, long)]
        referrer: Option<String>,
    },

    /// Validate and print a DOM selector table
    Selectors {
        /// JSON selector table (defaults to the built-in table)
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Classify { url, referrer } => {
            commands::classify::execute(&url, referrer.as_deref(), cli.format)
        }
        Commands::Selectors { file } => commands::selectors::execute(file.as_deref(), cli.format),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "quicklaunch=debug,quicklaunch_core=debug,quicklaunch_content=debug,quicklaunch_cli=debug",
        )
    } else {
        EnvFilter::new("quicklaunch=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
