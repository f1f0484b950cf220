//! vox CLI - Upload recordings and documents, then ask questions about them

mod commands;
mod server;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// vox - Ask questions about your interviews, recordings and documents
#[derive(Parser)]
#[command(name = "vox")]
#[command(author = "Lalo Morales <lalomorales22@github.com>")]
#[command(version)]
#[command(about = "Ask questions about your interviews, recordings and documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind (default: from config)
        #[arg(long, env = "VOX_HOST")]
        host: Option<String>,

        /// Port to listen on (default: from config)
        #[arg(short, long, env = "VOX_PORT")]
        port: Option<u16>,
    },

    /// Initialize vox (create the config file)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Check external tools and the Ollama server
    Check,

    /// Ingest local files in-process and ask one question about them
    Query {
        /// Files or directories to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// The question to ask
        #[arg(short, long)]
        question: String,

        /// Answer mode: auto, qa or summary
        #[arg(short, long, default_value = "auto")]
        mode: String,

        /// Number of chunks to retrieve (default: per mode, from config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file location
    Path,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vox=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vox=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Serve { host, port } => commands::serve::run(host, port),
        Commands::Init => commands::init::run(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(),
            ConfigCommands::Path => commands::config::path(),
        },
        Commands::Check => commands::check::run(),
        Commands::Query {
            paths,
            question,
            mode,
            top_k,
        } => commands::query::run(&paths, &question, &mode, top_k),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
