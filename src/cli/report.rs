use super::ui;
use crate::core::report::{Report, monthly_report};
use crate::core::{CostStore, Currency, RateProvider};
use anyhow::{Context, Result};
use comfy_table::Cell;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
        .copied()
        .unwrap_or("Unknown")
}

impl Report {
    pub fn display_as_table(&self) -> String {
        let target = self.total.currency;
        let mut output = format!(
            "{}\n\n",
            ui::style_text(
                &format!("{} {}", month_name(self.month), self.year),
                ui::StyleType::Title
            )
        );

        if self.costs.is_empty() {
            output.push_str(&ui::style_text(
                "No costs for this month",
                ui::StyleType::Subtle,
            ));
            return output;
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Day"),
            ui::header_cell("Category"),
            ui::header_cell("Description"),
            ui::header_cell("Amount"),
            ui::header_cell(&format!("Amount ({target})")),
        ]);
        for cost in &self.costs {
            table.add_row(vec![
                Cell::new(cost.day),
                Cell::new(cost.category),
                Cell::new(&cost.description),
                Cell::new(format!("{:.2} {}", cost.amount, cost.currency)),
                ui::amount_cell(cost.converted_amount),
            ]);
        }
        output.push_str(&table.to_string());

        let mut by_category = ui::new_styled_table();
        by_category.set_header(vec![
            ui::header_cell("Category"),
            ui::header_cell(&format!("Total ({target})")),
        ]);
        for (category, total) in &self.by_category {
            by_category.add_row(vec![Cell::new(category), ui::amount_cell(*total)]);
        }
        output.push_str("\n\n");
        output.push_str(&by_category.to_string());

        output.push_str(&format!(
            "\n\nTotal ({} {}): {}",
            ui::style_text(target.code(), ui::StyleType::TotalLabel),
            target.symbol(),
            ui::style_text(&format!("{:.2}", self.total.total), ui::StyleType::TotalValue)
        ));
        output
    }
}

pub async fn run(
    store: &dyn CostStore,
    rate_provider: &dyn RateProvider,
    year: i32,
    month: u32,
    target: Currency,
    json: bool,
) -> Result<()> {
    let pb = ui::new_spinner("Building monthly report...");
    let report = monthly_report(store, rate_provider, year, month, target).await;
    pb.finish_and_clear();
    let report = report.context("Failed to build monthly report")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.display_as_table());
    }
    Ok(())
}
