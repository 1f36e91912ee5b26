//! Add an item directly, bypassing classification

use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;

use jot::items::ClassifiedItem;
use jot::store::ItemStore;
use jot::Config;

pub fn execute(
    config: &Config,
    owner: &str,
    kind: &str,
    content: &str,
    priority: Option<String>,
    category: Option<String>,
    deadline: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    let item = ClassifiedItem {
        kind: kind.parse()?,
        content: content.to_string(),
        priority: priority.as_deref().map(str::parse).transpose()?,
        category,
        deadline: deadline
            .as_deref()
            .map(|d| {
                d.parse::<NaiveDate>()
                    .map_err(|_| anyhow::anyhow!("deadline must be an ISO date (YYYY-MM-DD): {d}"))
            })
            .transpose()?,
        tags,
    };

    let store = ItemStore::open(&config.data_dir)?;
    let id = store.save(owner, &item, None)?;

    println!(
        "{} Saved {}: {} (ID: {id})",
        "✓".green(),
        item.kind.as_str().bold(),
        item.content.trim()
    );
    Ok(())
}
