//! Flip an item's status

use anyhow::Result;
use colored::Colorize;

use jot::items::Status;
use jot::store::ItemStore;
use jot::Config;

pub fn execute(config: &Config, owner: &str, id: i64, status: Status) -> Result<()> {
    let store = ItemStore::open(&config.data_dir)?;

    if !store.update_status(owner, id, status)? {
        anyhow::bail!("No item with ID {id} found for {owner}");
    }

    let item = store.get(owner, id)?;
    let content = item.map(|i| i.content).unwrap_or_default();
    println!("{} Marked #{id} as {status}: {content}", "✓".green());
    Ok(())
}
