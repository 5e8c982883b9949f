use super::report::month_name;
use super::ui;
use crate::core::report::{AnnualReport, annual_by_category};
use crate::core::{Category, CostStore, Currency, RateProvider};
use anyhow::{Context, Result};
use comfy_table::Cell;

impl AnnualReport {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        let mut header = vec![ui::header_cell("Month")];
        header.extend(Category::ALL.iter().map(|c| ui::header_cell(c.name())));
        header.push(ui::header_cell(&format!("Total ({})", self.currency)));
        table.set_header(header);

        for bucket in &self.months {
            let name = month_name(bucket.month);
            let mut row = vec![Cell::new(&name[..3])];
            row.extend(Category::ALL.iter().map(|c| {
                ui::sparse_amount_cell(bucket.totals.get(c).copied().unwrap_or(0.0))
            }));
            row.push(ui::sparse_amount_cell(bucket.total()));
            table.add_row(row);
        }

        let mut totals = vec![Cell::new("Year")];
        totals.extend(
            Category::ALL
                .iter()
                .map(|c| ui::amount_cell(self.category_total(*c))),
        );
        totals.push(ui::amount_cell(self.total()));
        table.add_row(totals);

        format!(
            "{}\n\n{}",
            ui::style_text(
                &format!("{} by category ({})", self.year, self.currency),
                ui::StyleType::Title
            ),
            table
        )
    }
}

pub async fn run(
    store: &dyn CostStore,
    rate_provider: &dyn RateProvider,
    year: i32,
    target: Currency,
    json: bool,
) -> Result<()> {
    let pb = ui::new_spinner("Building annual report...");
    let report = annual_by_category(store, rate_provider, year, target).await;
    pb.finish_and_clear();
    let report = report.context("Failed to build annual report")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.display_as_table());
    }
    Ok(())
}
