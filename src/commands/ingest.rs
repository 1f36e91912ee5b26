//! Ingest one message through the full pipeline

use anyhow::Result;
use colored::Colorize;

use jot::ai::OpenAiClient;
use jot::items::InboundMessage;
use jot::pipeline::{Outcome, Pipeline, SavedItem};
use jot::store::ItemStore;
use jot::Config;

use super::fail_with_notice;

pub fn execute(config: &Config, owner: &str, text: &str) -> Result<()> {
    let store = ItemStore::open(&config.data_dir)?;
    let llm = OpenAiClient::new(&config.ai)?;
    let pipeline = Pipeline::new(&llm, &store);

    let message = InboundMessage::new(owner, text);
    match pipeline.handle(&message) {
        Ok(outcome) => print_outcome(outcome),
        Err(err) => fail_with_notice(err),
    }

    Ok(())
}

fn print_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Saved {
            items,
            skipped_fragments,
        } => {
            for item in &items {
                print_confirmation(item);
            }
            if skipped_fragments > 0 {
                println!(
                    "{}",
                    format!("Skipped {skipped_fragments} fragment(s) that could not be classified")
                        .dimmed()
                );
            }
            println!("\nType \"show tasks\" or \"list ideas\" to see your items");
        }
        Outcome::Answer(answer) => println!("{answer}"),
        Outcome::Ignored => println!("{}", "Nothing actionable in that message.".dimmed()),
    }
}

fn print_confirmation(item: &SavedItem) {
    println!(
        "{} Saved as {} (ID: {})",
        "✓".green(),
        item.kind.as_str().bold(),
        item.id
    );
    if let Some(priority) = item.priority {
        println!("  Priority: {priority}");
    }
    if let Some(category) = &item.category {
        println!("  Category: {category}");
    }
    if let Some(deadline) = item.deadline {
        println!("  Deadline: {deadline}");
    }
}
