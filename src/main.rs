// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! archive-router CLI - navigate a static repository archive from the terminal

use anyhow::Result;
use archive_router::commands::{self, Output};
use archive_router::config;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "archive-router")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "ARCHIVE_ROUTER_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Export directory or URL of the published archive
    #[arg(long, env = "ARCHIVE_ROUTER_DATA_ROOT", global = true)]
    data_root: Option<String>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true, value_parser = clap::builder::FalseyValueParser::new())]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Navigate to viewer URLs and print the resulting transitions
    Resolve {
        /// URLs such as `/owner/project/issues` or `#!/owner/project/src/tip/README`
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Print the route table in match order
    Routes,

    /// List archived projects
    Projects,

    /// Walk a paginated resource and report its items
    Pages {
        /// Archive path of the first page
        path: String,
    },

    /// Navigate to a URL and print the view's data as JSON
    View {
        /// Viewer URL
        url: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(data_root) = cli.data_root {
        config.data_root = data_root;
    }

    // Initialize logging; RUST_LOG wins over flags and configuration
    let level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.json, !cli.no_color);

    // Execute command
    match cli.command {
        Commands::Resolve { urls } => commands::resolve::run(&config, output, &urls).await,
        Commands::Routes => commands::routes::run(output),
        Commands::Projects => commands::projects::run(&config, output).await,
        Commands::Pages { path } => commands::pages::run(&config, output, &path).await,
        Commands::View { url } => commands::view::run(&config, output, &url).await,
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
