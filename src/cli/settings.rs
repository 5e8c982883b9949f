use super::ui;
use crate::core::settings::{SettingsFile, SettingsSource};
use anyhow::Result;

pub fn show(settings: &SettingsFile) -> Result<()> {
    let loaded = settings.load()?;
    let url = loaded.exchange_rates_url().unwrap_or_else(|| {
        ui::style_text("(not set, using default rates)", ui::StyleType::Subtle)
    });
    println!("Settings file: {}", settings.path().display());
    println!("Exchange rate source URL: {url}");
    Ok(())
}

pub fn set_rates_url(settings: &SettingsFile, url: &str) -> Result<()> {
    settings.set_exchange_rates_url(url)?;
    tracing::info!("Saved exchange rate source URL to {}", settings.path().display());
    println!("Exchange rate source URL saved");
    Ok(())
}

pub fn clear_rates_url(settings: &SettingsFile) -> Result<()> {
    settings.clear_exchange_rates_url()?;
    println!("Exchange rate source URL cleared, default rates will be used");
    Ok(())
}
