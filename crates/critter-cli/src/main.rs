mod cmd;
mod output;
mod settings;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, list::ListSubcommand, review::ReviewArgs};

#[derive(Parser)]
#[command(
    name = "critter",
    about = "Create and update code reviews from the command line",
    version,
    propagate_version = true
)]
struct Cli {
    /// Settings file (default: ~/.config/critter/settings.yaml)
    #[arg(long, global = true, env = "CRITTER_CONFIG")]
    config: Option<PathBuf>,

    /// Review server URL
    #[arg(long, global = true, env = "CRITTER_SERVER")]
    server: Option<String>,

    /// User name for the review server
    #[arg(long, global = true, env = "CRITTER_USER")]
    user: Option<String>,

    /// Password for the review server
    #[arg(long, global = true, env = "CRITTER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log every request and reply
    #[arg(long, global = true)]
    debug: bool,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(flatten)]
    review: ReviewArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List what the review server knows about
    List {
        #[command(subcommand)]
        subcommand: ListSubcommand,
    },

    /// Inspect or persist connection settings
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let overrides = settings::Overrides {
        config: cli.config,
        server: cli.server,
        user: cli.user,
        password: cli.password,
    };

    let result = settings::resolve(overrides).and_then(|(settings, path)| match cli.command {
        Some(Commands::List { subcommand }) => cmd::list::run(&settings, subcommand, cli.json),
        Some(Commands::Config { subcommand }) => {
            cmd::config::run(&settings, &path, subcommand, cli.json)
        }
        None => cmd::review::run(settings, cli.review, cli.json),
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
