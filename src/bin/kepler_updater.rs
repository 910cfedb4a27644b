use std::process::ExitCode;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kepler_updater::app::{ProgressSink, Updater};
use kepler_updater::domain::{DEFAULT_TIMEOUT, FetchOutcome, Settings};
use kepler_updater::error::KeplerError;
use kepler_updater::fetch::KeplerHttpClient;
use kepler_updater::output::{JsonOutput, OutputMode, TextProgress, print_settings_summary};
use kepler_updater::store::Paths;

#[derive(Parser)]
#[command(name = "kepler-updater")]
#[command(about = "Download and verify NOAA weather satellite Kepler data for WXtoImg")]
#[command(version, author)]
struct Cli {
    /// Directory holding weather.txt and kepler-updater.cfg (defaults to the WXtoImg directory)
    #[arg(long, global = true)]
    dir: Option<Utf8PathBuf>,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Connect directly, ignoring proxy environment variables
    #[arg(long, global = true)]
    no_proxy: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Update Kepler data now")]
    Update,
    #[command(about = "Show current settings")]
    Show,
    #[command(about = "Set the URL Kepler data is downloaded from")]
    SetUrl { url: String },
    #[command(about = "Reset the download URL to the default")]
    ResetUrl,
    #[command(about = "Update automatically whenever the program starts")]
    AutoRun { mode: Toggle },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() -> ExitCode {
    match run() {
        Ok(Some(outcome)) => ExitCode::from(map_exit_code(&outcome)),
        Ok(None) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(outcome: &FetchOutcome) -> u8 {
    match outcome {
        FetchOutcome::Success { .. } => 0,
        FetchOutcome::PreflightRejected { .. } => 2,
        FetchOutcome::NetworkError { .. } => 3,
        FetchOutcome::ValidationFailed => 4,
        FetchOutcome::PersistenceError { .. } => 5,
    }
}

fn run() -> miette::Result<Option<FetchOutcome>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let paths = match cli.dir {
        Some(dir) => Paths::new_with_root(dir),
        None => Paths::new().into_diagnostic()?,
    };
    paths.ensure_root().into_diagnostic()?;

    let timeout = cli
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT);
    let client = if cli.no_proxy {
        KeplerHttpClient::direct()
    } else {
        KeplerHttpClient::new()
    }
    .into_diagnostic()?;
    let updater = Updater::new(paths, client).with_timeout(timeout);
    let mut settings = updater.load_settings();

    match cli.command {
        Some(Command::Update) => run_update(&updater, &mut settings, output_mode).map(Some),
        Some(Command::Show) => {
            show_settings(&settings, output_mode)?;
            Ok(None)
        }
        Some(Command::SetUrl { url }) => {
            let url = url.trim();
            if url.is_empty() {
                return Err(KeplerError::InvalidSetting("URL must not be empty".to_string()))
                    .into_diagnostic();
            }
            settings.url = url.to_string();
            save_and_show(&updater, &settings, output_mode)
        }
        Some(Command::ResetUrl) => {
            settings.reset_url();
            save_and_show(&updater, &settings, output_mode)
        }
        Some(Command::AutoRun { mode }) => {
            settings.auto_run = matches!(mode, Toggle::On);
            save_and_show(&updater, &settings, output_mode)
        }
        None => {
            if settings.auto_run {
                run_update(&updater, &mut settings, output_mode).map(Some)
            } else {
                show_settings(&settings, output_mode)?;
                Ok(None)
            }
        }
    }
}

fn run_update(
    updater: &Updater<KeplerHttpClient>,
    settings: &mut Settings,
    output_mode: OutputMode,
) -> miette::Result<FetchOutcome> {
    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Json => &JsonOutput,
        OutputMode::Text => &TextProgress,
    };
    let outcome = updater.run(settings, sink);
    match output_mode {
        OutputMode::Json => JsonOutput::print_outcome(&outcome).into_diagnostic()?,
        OutputMode::Text if outcome.is_success() => println!("{outcome}"),
        OutputMode::Text => eprintln!("error: {outcome}"),
    }
    Ok(outcome)
}

fn save_and_show(
    updater: &Updater<KeplerHttpClient>,
    settings: &Settings,
    output_mode: OutputMode,
) -> miette::Result<Option<FetchOutcome>> {
    updater.save_settings(settings).into_diagnostic()?;
    show_settings(settings, output_mode)?;
    Ok(None)
}

fn show_settings(settings: &Settings, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::Json => JsonOutput::print_settings(settings).into_diagnostic(),
        OutputMode::Text => {
            print_settings_summary(settings);
            Ok(())
        }
    }
}
