use super::ui;
use crate::core::{CostStore, NewCost, StoredCost};
use anyhow::{Context, Result};
use comfy_table::Cell;

/// Orders records the way the history listing shows them: latest first.
pub fn newest_first(mut costs: Vec<StoredCost>) -> Vec<StoredCost> {
    costs.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
    costs
}

pub fn history_table(costs: &[StoredCost]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Date"),
        ui::header_cell("Category"),
        ui::header_cell("Description"),
        ui::header_cell("Amount"),
    ]);

    for cost in costs {
        table.add_row(vec![
            Cell::new(cost.id()),
            Cell::new(cost.created_at().format("%Y-%m-%d %H:%M")),
            Cell::new(cost.category()),
            Cell::new(cost.description()),
            Cell::new(format!(
                "{:.2} {}",
                cost.amount(),
                cost.currency().symbol()
            )),
        ]);
    }
    table.to_string()
}

pub async fn add(store: &dyn CostStore, cost: NewCost) -> Result<()> {
    let stored = store.insert(cost).await.context("Failed to add cost")?;
    tracing::info!(id = stored.id(), "Added cost");
    println!(
        "Added cost #{}: {:.2} {} for {} ({})",
        stored.id(),
        stored.amount(),
        stored.currency(),
        stored.category(),
        stored.description()
    );
    Ok(())
}

pub async fn delete(store: &dyn CostStore, id: u64) -> Result<()> {
    let removed = store
        .delete(id)
        .await
        .with_context(|| format!("Failed to delete cost #{id}"))?;
    if removed {
        println!("Deleted cost #{id}");
    } else {
        println!(
            "{}",
            ui::style_text(&format!("No cost with id #{id}"), ui::StyleType::Subtle)
        );
    }
    Ok(())
}

pub async fn history(store: &dyn CostStore) -> Result<()> {
    let costs = newest_first(store.scan_all().await.context("Failed to read costs")?);
    if costs.is_empty() {
        println!(
            "{}",
            ui::style_text("No costs recorded yet", ui::StyleType::Subtle)
        );
        return Ok(());
    }
    println!("{}", history_table(&costs));
    Ok(())
}
