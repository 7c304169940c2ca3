use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use ynab_trends::args::{Args, Command};
use ynab_trends::{commands, error_type, Config, ErrorType, IntoResult, Mode, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match error_type(&e) {
                Some(t) => error!("Exiting with {t} error: {e:#}"),
                None => error!("Exiting with error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().trends_home().path();

    // This allows for testing the program without hitting the YNAB API. When
    // YNAB_TRENDS_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Ynab.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.api_token_file(), init_args.api_url())
                .await?
                .print()
        }

        Command::Budgets => commands::budgets(load_config(home).await?, mode)
            .await?
            .print(),

        Command::Select(select_args) => {
            commands::select(load_config(home).await?, mode, select_args.budget_id())
                .await?
                .print()
        }

        Command::Analyze(analyze_args) => {
            let out = commands::analyze(load_config(home).await?, mode, analyze_args).await?;
            if analyze_args.json() {
                out.print_json()?
            } else {
                out.print()
            }
        }

        Command::Theme(theme_args) => {
            commands::theme(load_config(home).await?, theme_args.toggle())
                .await?
                .print()
        }
    };
    Ok(())
}

async fn load_config(home: &Path) -> Result<Config> {
    Config::load(home).await.pub_result(ErrorType::Config)
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
