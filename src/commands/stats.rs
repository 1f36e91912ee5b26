//! Aggregate counts for one owner

use anyhow::Result;
use colored::Colorize;

use jot::store::ItemStore;
use jot::Config;

pub fn execute(config: &Config, owner: &str) -> Result<()> {
    let store = ItemStore::open(&config.data_dir)?;
    let stats = store.stats(owner)?;

    println!("{}", "Your items".bold());
    println!(
        "  Total: {} ({} tasks, {} ideas)",
        stats.total, stats.tasks, stats.ideas
    );

    println!("\n{}", "By status".bold());
    println!("  pending: {}", stats.pending);
    println!("  completed: {}", stats.completed);
    println!("  cancelled: {}", stats.cancelled);

    if stats.pending_high + stats.pending_medium + stats.pending_low > 0 {
        println!("\n{}", "Pending by priority".bold());
        if stats.pending_high > 0 {
            println!("  {} high: {}", "●".red(), stats.pending_high);
        }
        if stats.pending_medium > 0 {
            println!("  {} medium: {}", "●".yellow(), stats.pending_medium);
        }
        if stats.pending_low > 0 {
            println!("  {} low: {}", "●".green(), stats.pending_low);
        }
    }

    if !stats.by_category.is_empty() {
        println!("\n{}", "Top categories".bold());
        for (category, count) in &stats.by_category {
            println!("  {category}: {count}");
        }
    }

    Ok(())
}
