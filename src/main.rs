use anyhow::Context;
use clap::Parser;
use holiday_travel_processor::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).context("holiday travel summary failed")
}
