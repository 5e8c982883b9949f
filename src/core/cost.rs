//! Expense records and the enumerations they are built from.

use crate::core::error::CostError;
use chrono::{DateTime, Datelike, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "ILS")]
    Ils,
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "EUR", alias = "EURO")]
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Usd, Currency::Ils, Currency::Gbp, Currency::Eur];

    pub const fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Ils => "ILS",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
        }
    }

    /// Older spellings still found in hand-written rate tables.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Currency::Eur => &["EURO"],
            _ => &[],
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Ils => "₪",
            Currency::Gbp => "£",
            Currency::Eur => "€",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code || c.aliases().contains(&code.as_str()))
            .ok_or_else(|| CostError::Validation(format!("Unsupported currency: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Food,
    Health,
    Education,
    Travel,
    Housing,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Health,
        Category::Education,
        Category::Travel,
        Category::Housing,
        Category::Other,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Category::Food => "FOOD",
            Category::Health => "HEALTH",
            Category::Education => "EDUCATION",
            Category::Travel => "TRAVEL",
            Category::Housing => "HOUSING",
            Category::Other => "OTHER",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase();
        Category::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| CostError::Validation(format!("Unknown category: {s}")))
    }
}

/// Largest amount a single cost may carry. Keeps report sums far from `f64` overflow.
pub const MAX_AMOUNT: f64 = 1e12;

/// An expense as entered by the user, before the store has accepted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCost {
    pub amount: f64,
    pub currency: Currency,
    pub category: Category,
    pub description: String,
}

impl NewCost {
    pub fn new(amount: f64, currency: Currency, category: Category, description: &str) -> Self {
        Self {
            amount,
            currency,
            category,
            description: description.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), CostError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(CostError::Validation(format!(
                "Amount must be a positive number, got {}",
                self.amount
            )));
        }
        if self.amount > MAX_AMOUNT {
            return Err(CostError::Validation(format!(
                "Amount must not exceed {MAX_AMOUNT}, got {}",
                self.amount
            )));
        }
        if self.description.trim().is_empty() {
            return Err(CostError::Validation(
                "Description must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// An expense persisted by a [`CostStore`](crate::core::store::CostStore).
///
/// `month` and `year` are copies of the calendar date of `created_at`, kept
/// alongside it so period scans do not have to re-derive them. They can only be
/// produced by [`StoredCost::stamp`], which is what keeps them in agreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCost {
    id: u64,
    amount: f64,
    currency: Currency,
    category: Category,
    description: String,
    created_at: DateTime<FixedOffset>,
    month: u32,
    year: i32,
}

impl StoredCost {
    pub(crate) fn stamp(id: u64, cost: NewCost, created_at: DateTime<FixedOffset>) -> Self {
        Self {
            id,
            amount: cost.amount,
            currency: cost.currency,
            category: cost.category,
            description: cost.description.trim().to_string(),
            month: created_at.month(),
            year: created_at.year(),
            created_at,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn day(&self) -> u32 {
        self.created_at.day()
    }

    pub fn in_period(&self, year: i32, month: Option<u32>) -> bool {
        self.year == year && month.is_none_or(|m| self.month == m)
    }

    #[cfg(test)]
    pub(crate) fn with_period_for_test(mut self, year: i32, month: u32) -> Self {
        self.year = year;
        self.month = month;
        self
    }
}

/// Source of insertion timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
