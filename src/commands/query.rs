//! Answer a natural-language question about stored items

use anyhow::Result;

use jot::ai::OpenAiClient;
use jot::items::InboundMessage;
use jot::pipeline::Pipeline;
use jot::store::ItemStore;
use jot::Config;

use super::fail_with_notice;

pub fn execute(config: &Config, owner: &str, question: &str) -> Result<()> {
    let store = ItemStore::open(&config.data_dir)?;
    let llm = OpenAiClient::new(&config.ai)?;
    let pipeline = Pipeline::new(&llm, &store);

    let message = InboundMessage::new(owner, question);
    match pipeline.answer(&message) {
        Ok(answer) => println!("{answer}"),
        Err(err) => fail_with_notice(err),
    }

    Ok(())
}
