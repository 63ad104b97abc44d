mod calendar;
mod cli;
mod commands;
mod config;
mod keys;
mod logging;
mod model;
mod planner;
mod records;
mod store;
mod tasks;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config = config::Config::load()?;
    if let Err(err) = logging::init(&config) {
        eprintln!("logging disabled: {:#}", err);
    }
    let command = args.command.unwrap_or(cli::Command::Tui { date: None });
    match command {
        cli::Command::Init => commands::init(),
        cli::Command::Show { date } => commands::show(&config, date),
        cli::Command::Add { text, date } => commands::add(&config, text, date),
        cli::Command::Toggle { id, date } => commands::toggle(&config, id, date),
        cli::Command::Remove { id, date } => commands::remove(&config, id, date),
        cli::Command::Journal { text, date } => commands::journal(&config, text, date),
        cli::Command::Reflect { text, date } => commands::reflect(&config, text, date),
        cli::Command::Calendar { month, date } => commands::calendar(&config, month, date),
        cli::Command::Tui { date } => commands::tui(&config, date),
    }
}
