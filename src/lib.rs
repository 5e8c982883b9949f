pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::settings::SettingsFile;
use crate::core::{Currency, NewCost};
use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use std::sync::Arc;
use tracing::{debug, info};

/// Commands runnable against a configured cost book.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Add(NewCost),
    Delete {
        id: u64,
    },
    History,
    /// Period fields default to the current month, currency to the configured one.
    Report {
        year: Option<i32>,
        month: Option<u32>,
        currency: Option<Currency>,
        json: bool,
    },
    Annual {
        year: Option<i32>,
        currency: Option<Currency>,
        json: bool,
    },
    ShowSettings,
    SetRatesUrl(String),
    ClearRatesUrl,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Costbook starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load_or_default()?,
    };
    debug!("Loaded config: {config:#?}");

    let settings = SettingsFile::new(config.settings_path()?);
    match &command {
        AppCommand::ShowSettings => return cli::settings::show(&settings),
        AppCommand::SetRatesUrl(url) => return cli::settings::set_rates_url(&settings, url),
        AppCommand::ClearRatesUrl => return cli::settings::clear_rates_url(&settings),
        _ => {}
    }

    let store = store::open_configured(&config).context("Failed to open cost store")?;
    let rate_provider = providers::HttpRateProvider::new(Arc::new(settings));
    let today = Local::now();

    match command {
        AppCommand::Add(cost) => cli::costs::add(&store, cost).await,
        AppCommand::Delete { id } => cli::costs::delete(&store, id).await,
        AppCommand::History => cli::costs::history(&store).await,
        AppCommand::Report {
            year,
            month,
            currency,
            json,
        } => {
            cli::report::run(
                &store,
                &rate_provider,
                year.unwrap_or_else(|| today.year()),
                month.unwrap_or_else(|| today.month()),
                currency.unwrap_or(config.currency),
                json,
            )
            .await
        }
        AppCommand::Annual {
            year,
            currency,
            json,
        } => {
            cli::annual::run(
                &store,
                &rate_provider,
                year.unwrap_or_else(|| today.year()),
                currency.unwrap_or(config.currency),
                json,
            )
            .await
        }
        AppCommand::ShowSettings | AppCommand::SetRatesUrl(_) | AppCommand::ClearRatesUrl => {
            unreachable!("Settings commands are handled before the store is opened")
        }
    }
}
