use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use eyre::Result;
use safe_engagement_cli::commands;
use safe_engagement_cli::config::{self, AppConfig, Mode};
use safe_engagement_cli::loader::{self, LoadedScreening};
use safe_engagement_cli::render::{self, TerminalPrompter, report};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "safe-engagement",
    version,
    about = "Confidential HIV risk screening"
)]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true, env = "SAFE_ENGAGEMENT_CONFIG")]
    config: Option<PathBuf>,

    /// Flow definition JSON replacing the built-in flow.
    #[arg(long, global = true)]
    flow: Option<PathBuf>,

    /// Tier list JSON replacing the default tiers.
    #[arg(long, global = true)]
    tiers: Option<PathBuf>,

    /// Renderer to run when no subcommand is given (overrides the config).
    #[arg(long, global = true, value_enum)]
    mode: Option<Mode>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Conversational screening, side dialogue included.
    Chat {
        /// Pause before each message, in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Numbered questionnaire with progress and a Previous option.
    Form,
    /// Check a flow and tier file without running them.
    Validate,
    /// Print entry, size, longest path, max score and tier bands.
    Describe,
    /// Print the effective config.
    Config {
        /// Write the effective config back to the config file.
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let config = config::load_config(&config_path)?;
    let flow = cli.flow.clone().or_else(|| config.flow_path.clone());
    let tiers = cli.tiers.clone().or_else(|| config.tiers_path.clone());

    let default_mode = cli.mode.unwrap_or(config.default_mode);
    let command = cli.command.unwrap_or(match default_mode {
        Mode::Chat => Commands::Chat { delay_ms: None },
        Mode::Form => Commands::Form,
    });

    match command {
        Commands::Chat { delay_ms } => {
            let delay = Duration::from_millis(delay_ms.unwrap_or(config.typing_delay_ms));
            let mut prompter = TerminalPrompter::new(delay);
            match loader::load_screening(flow.as_deref(), tiers.as_deref())? {
                LoadedScreening::Builtin(s) => render::chat::run(&s, &mut prompter)?,
                LoadedScreening::Custom(s) => render::chat::run(&s, &mut prompter)?,
            }
        }
        Commands::Form => {
            let mut prompter = TerminalPrompter::default();
            match loader::load_screening(flow.as_deref(), tiers.as_deref())? {
                LoadedScreening::Builtin(s) => render::form::run(&s, &mut prompter)?,
                LoadedScreening::Custom(s) => render::form::run(&s, &mut prompter)?,
            };
        }
        Commands::Validate => {
            let report = commands::validate(flow.as_deref(), tiers.as_deref())?;
            print!("{}", report.render());
            if !report.is_ok() {
                return Err(eyre::eyre!("validation failed"));
            }
        }
        Commands::Describe => {
            let summary = match loader::load_screening(flow.as_deref(), tiers.as_deref())? {
                LoadedScreening::Builtin(s) => report::describe(&s),
                LoadedScreening::Custom(s) => report::describe(&s),
            };
            print!("{summary}");
        }
        Commands::Config { write } => {
            let effective = AppConfig {
                flow_path: flow,
                tiers_path: tiers,
                default_mode,
                ..config
            };
            println!("{}", serde_json::to_string_pretty(&effective)?);
            if write {
                config::save_config(&config_path, &effective)?;
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so they never interleave with the screening on stdout.
/// Default level is `warn`; `RUST_LOG` overrides it.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
