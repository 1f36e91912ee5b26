//! List items with ad-hoc structural filters
//!
//! This is the dashboard-equivalent path: filters go straight to the
//! search executor's structural strategy, bypassing the query analyzer.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use colored::Colorize;

use jot::items::{ItemKind, Priority, Status, StoredItem};
use jot::query::{QueryAnalysis, QueryFilters, SearchType};
use jot::search::SearchExecutor;
use jot::store::ItemStore;
use jot::Config;

pub fn execute(
    config: &Config,
    owner: &str,
    kind: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    category: Option<String>,
    limit: usize,
) -> Result<()> {
    let filters = QueryFilters {
        kind: kind.as_deref().map(str::parse).transpose()?,
        priority: priority.as_deref().map(str::parse).transpose()?,
        // Unlike the analyzer's default, an explicit --status wins
        status: Some(
            status
                .as_deref()
                .map(str::parse)
                .transpose()?
                .unwrap_or(Status::Pending),
        ),
        category,
        deadline_from: None,
        deadline_to: None,
    };

    let analysis = QueryAnalysis {
        filters: filters.clone(),
        keywords: vec![],
        search_type: SearchType::Structural,
        limit,
    };

    let store = ItemStore::open(&config.data_dir)?;
    let items = SearchExecutor::new(&store).execute(&analysis, owner)?;

    print_items(&items, &filters);
    Ok(())
}

fn print_items(items: &[StoredItem], filters: &QueryFilters) {
    if items.is_empty() {
        println!(
            "No {} found matching your filters.",
            filters.kind.map(|k| k.as_str()).unwrap_or("items")
        );
        return;
    }

    let kind_text = match filters.kind {
        Some(ItemKind::Task) => "tasks",
        Some(ItemKind::Idea) => "ideas",
        None => "items",
    };
    let mut header = format!("{} {kind_text}", items.len());
    if let Some(priority) = filters.priority {
        header.push_str(&format!(" ({priority} priority)"));
    }
    if let Some(category) = &filters.category {
        header.push_str(&format!(" in \"{category}\""));
    }
    if let Some(status) = filters.status {
        if status != Status::Pending {
            header.push_str(&format!(" - {status}"));
        }
    }
    println!("{}\n", header.bold());

    let today = Utc::now().date_naive();

    // Group by priority for the default pending view; otherwise a flat list
    if filters.priority.is_none() && filters.status == Some(Status::Pending) {
        for (bucket, label) in [
            (Some(Priority::High), "HIGH PRIORITY".red().bold()),
            (Some(Priority::Medium), "MEDIUM PRIORITY".yellow().bold()),
            (Some(Priority::Low), "LOW PRIORITY".green().bold()),
            (None, "NO PRIORITY".normal()),
        ] {
            let group: Vec<&StoredItem> =
                items.iter().filter(|i| i.priority == bucket).collect();
            if group.is_empty() {
                continue;
            }

            println!("{label}");
            for (idx, item) in group.iter().enumerate() {
                println!("{}", format_item_line(item, idx + 1, today));
            }
            println!();
        }
    } else {
        for (idx, item) in items.iter().enumerate() {
            println!("{}", format_item_line(item, idx + 1, today));
        }
    }
}

fn format_item_line(item: &StoredItem, number: usize, today: NaiveDate) -> String {
    let marker = match item.kind {
        ItemKind::Task => "✓",
        ItemKind::Idea => "💡",
    };

    let mut line = format!("{number}. {marker} {}", item.content);

    if let Some(category) = &item.category {
        line.push_str(&format!(" [{category}]"));
    }

    if let Some(deadline) = item.deadline {
        let days = (deadline - today).num_days();
        let due = if days < 0 {
            format!(" ⚠ OVERDUE by {} days", -days)
        } else if days == 0 {
            " 📅 Due TODAY".to_string()
        } else if days == 1 {
            " 📅 Due tomorrow".to_string()
        } else if days <= 7 {
            format!(" 📅 Due in {days} days")
        } else {
            format!(" 📅 Due {deadline}")
        };
        line.push_str(&due);
    }

    line
}
