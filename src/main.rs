use clap::{Parser, Subcommand};
use sample_rebase::config::{self, Config};
use sample_rebase::rebase::SystemClock;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sample-rebase")]
#[command(about = "Rebase a captured telemetry sample onto the current time", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Archive to prepare (defaults to sample.tar.gz)
    archive: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the archive and rebase its logs
    Run { archive: Option<PathBuf> },
    /// Extract the archive only
    Extract { archive: Option<PathBuf> },
    /// Rebase a newline-delimited JSON log file
    Rebase {
        input: PathBuf,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sample_rebase=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = config::resolve_config_path(cli.config.as_deref());

    let succeeded = match cli.command {
        Some(Commands::Run { archive }) => with_config(config_path, |config| {
            sample_rebase::cli::run::run(archive, &config, &SystemClock)
        }),
        None => with_config(config_path, |config| {
            sample_rebase::cli::run::run(cli.archive, &config, &SystemClock)
        }),
        Some(Commands::Extract { archive }) => with_config(config_path, |config| {
            let archive = sample_rebase::cli::run::resolve_archive(archive, &config);
            report(sample_rebase::archive::extract_with(&archive, &config.archive))
        }),
        Some(Commands::Rebase { input, output }) => {
            report(sample_rebase::rebase::rebase(&input, output.as_deref()))
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { stdout } => report(sample_rebase::cli::config::init(stdout)),
            ConfigAction::Validate => report(sample_rebase::cli::config::validate(config_path)),
        },
    };

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn with_config(path: Option<PathBuf>, f: impl FnOnce(Config) -> bool) -> bool {
    match config::load_or_default(path.as_deref()) {
        Ok(config) => f(config),
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            false
        }
    }
}

fn report<T, E: std::fmt::Display>(result: Result<T, E>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            error!(error = %e, "Command failed");
            false
        }
    }
}
