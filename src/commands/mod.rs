pub mod add;
pub mod ingest;
pub mod list;
pub mod query;
pub mod stats;
pub mod status;

use colored::Colorize;

/// The only failure text the message sender ever sees. Diagnostics go to
/// stderr for the operator.
pub const GENERIC_FAILURE_NOTICE: &str =
    "Something went wrong processing your message. Please try again.";

/// Map a pipeline/store failure to the sender-visible notice and exit.
pub fn fail_with_notice(err: anyhow::Error) -> ! {
    eprintln!("{} {err:#}", "error:".red().bold());
    println!("{GENERIC_FAILURE_NOTICE}");
    std::process::exit(1);
}
