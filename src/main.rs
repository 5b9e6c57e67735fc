//! Command-line entrypoint for the merge-only record patch engine.
use eyre::Result;

pub mod cli;
pub mod config;
pub mod display;
pub mod logging;
pub mod patching;
pub mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
