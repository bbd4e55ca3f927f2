// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::sync::Arc;

use slidelingo::app_config::{self, Config};
use slidelingo::diagnostics;
use slidelingo::language_utils::TargetLanguage;
use slidelingo::progress::{ProgressBarTracker, ProgressTracker};
use slidelingo::server;
use slidelingo::translation::PresentationTranslator;
use slidelingo::translation::concurrency::ConcurrencyLimits;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (default command)
    Serve {
        /// Address to bind, overrides config and HOST
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overrides config and PORT
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Translate one presentation from the command line
    Translate {
        /// Google Slides URL (https://docs.google.com/presentation/d/<id>/edit)
        #[arg(value_name = "SLIDE_URL")]
        slide_url: String,

        /// Target language: 'auto' flips English and Chinese, or a code such as 'zh-CN'
        #[arg(short, long)]
        target: Option<String>,

        /// Maximum concurrent Translation API requests
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// Check Google credentials and API access
    CheckCredentials {
        /// Also fetch a token and call the Translation API
        #[arg(long)]
        live: bool,
    },

    /// Generate shell completions for slidelingo
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Slidelingo - Google Slides translation between English and Chinese
#[derive(Parser, Debug)]
#[command(name = "slidelingo")]
#[command(version)]
#[command(about = "Translate Google Slides presentations in place")]
#[command(long_about = "Slidelingo reads a Google Slides presentation, translates every text run
with the Google Cloud Translation API and writes the translations back.

EXAMPLES:
    slidelingo                                          # Run the HTTP API on 0.0.0.0:3000
    slidelingo serve --port 8080                        # Run the HTTP API on another port
    slidelingo translate https://docs.google.com/presentation/d/<id>/edit
    slidelingo translate -t en <URL>                    # Force English output
    slidelingo check-credentials --live                 # Verify credentials against Google
    slidelingo completions bash > slidelingo.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. Service account credentials are read from
    GOOGLE_APPLICATION_CREDENTIALS (inline JSON or a file path); a .env file
    in the working directory is loaded first.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short = 'C', long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let level = record.level();
        let _ = writeln!(
            std::io::stderr(),
            "\x1B[{}m{} {} {}\x1B[0m",
            Self::color_for_level(level),
            now,
            Self::get_emoji_for_level(level),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "slidelingo", &mut std::io::stdout());
        return Ok(());
    }

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!("Failed to load .env: {}", e);
        }
    }

    let mut config = load_config(&cli)?;

    match cli.command {
        None => server::serve(config).await,
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::serve(config).await
        }
        Some(Commands::Translate { slide_url, target, concurrency }) => {
            run_translate(config, &slide_url, target.as_deref(), concurrency).await
        }
        Some(Commands::CheckCredentials { live }) => run_check_credentials(&config, live).await,
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

/// Load the config file, then apply environment and command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_translate(
    mut config: Config,
    slide_url: &str,
    target: Option<&str>,
    concurrency: Option<usize>,
) -> Result<()> {
    let target: TargetLanguage = match target {
        Some(code) => code.parse()?,
        None => config.translation.default_target_language.clone(),
    };

    let limits = ConcurrencyLimits::from_config(&config.translation).with_request_override(concurrency);
    config.translation.max_concurrent_requests = limits.max_concurrent_requests;

    let tracker = Arc::new(ProgressBarTracker::new());
    let progress: Arc<dyn ProgressTracker> = tracker.clone();
    let translator = PresentationTranslator::from_config(&config, progress)
        .map_err(|e| anyhow!("{}", e))?;

    let job_id = uuid::Uuid::new_v4().to_string();
    let result = translator.translate_url(slide_url, &target, &job_id).await;
    tracker.finish();

    let report = result.map_err(|e| anyhow!("{}: {}", e.title(), e.user_message()))?;

    for slide in &report.results {
        match &slide.error {
            None => info!(
                "Slide {}: {} elements ({} kept original)",
                slide.slide_index + 1,
                slide.translated_elements,
                slide.fallback_elements
            ),
            Some(error) => warn!("Slide {}: update failed: {}", slide.slide_index + 1, error),
        }
    }

    let (hits, misses, _) = translator.cache().stats();
    info!(
        "{}: {} slides in presentation {} (cache hits {}, misses {})",
        report.message(),
        report.translated_slides(),
        report.presentation_id,
        hits,
        misses
    );
    Ok(())
}

async fn run_check_credentials(config: &Config, live: bool) -> Result<()> {
    let report = diagnostics::run(&config.google, live).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.all_passed() {
        info!("All credential checks passed");
        Ok(())
    } else {
        Err(anyhow!("One or more credential checks failed"))
    }
}
