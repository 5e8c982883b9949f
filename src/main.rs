use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use costbook::AppCommand;
use costbook::core::log::init_logging;
use costbook::core::{Category, Currency, NewCost};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Add {
                amount,
                currency,
                category,
                description,
            } => AppCommand::Add(NewCost::new(amount, currency, category, &description)),
            Commands::Delete { id } => AppCommand::Delete { id },
            Commands::History => AppCommand::History,
            Commands::Report {
                year,
                month,
                currency,
                json,
            } => AppCommand::Report {
                year,
                month,
                currency,
                json,
            },
            Commands::Annual {
                year,
                currency,
                json,
            } => AppCommand::Annual {
                year,
                currency,
                json,
            },
            Commands::Settings { command } => match command {
                SettingsCommands::Show => AppCommand::ShowSettings,
                SettingsCommands::SetRatesUrl { url } => AppCommand::SetRatesUrl(url),
                SettingsCommands::ClearRatesUrl => AppCommand::ClearRatesUrl,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Record a new cost
    Add {
        #[arg(long)]
        amount: f64,
        /// One of USD, ILS, GBP, EUR
        #[arg(long)]
        currency: Currency,
        /// One of FOOD, HEALTH, EDUCATION, TRAVEL, HOUSING, OTHER
        #[arg(long)]
        category: Category,
        #[arg(long)]
        description: String,
    },
    /// Delete a recorded cost by id
    Delete { id: u64 },
    /// List every recorded cost, newest first
    History,
    /// Monthly report converted to a single currency
    Report {
        /// Defaults to the current year
        #[arg(short, long)]
        year: Option<i32>,
        /// 1-12, defaults to the current month
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// Target currency, defaults to the configured one
        #[arg(long)]
        currency: Option<Currency>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Per-month category totals for a whole year
    Annual {
        /// Defaults to the current year
        #[arg(short, long)]
        year: Option<i32>,
        /// Target currency, defaults to the configured one
        #[arg(long)]
        currency: Option<Currency>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change persisted settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Display current settings
    Show,
    /// Set the exchange rate source URL
    SetRatesUrl { url: String },
    /// Remove the exchange rate source URL and use default rates
    ClearRatesUrl,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => costbook::cli::setup::setup(),
        Some(cmd) => costbook::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
