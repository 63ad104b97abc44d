use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dayplan", version, about = "Daily tasks, journal and monthly reflection")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a project store in the current directory
    Init,
    /// Show tasks, journal and monthly reflection for a day
    Show {
        /// Day in YYYY-MM-DD format (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },
    /// Add a task to a day
    Add {
        /// Task text
        text: String,
        /// Day in YYYY-MM-DD format (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },
    /// Toggle completion of a task (fails if the id is not on that day)
    Toggle {
        /// Task id as printed by `show`
        id: i64,
        /// Day in YYYY-MM-DD format (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },
    /// Remove a task (fails if the id is not on that day)
    Remove {
        /// Task id as printed by `show`
        id: i64,
        /// Day in YYYY-MM-DD format (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },
    /// Replace the journal entry for a day
    Journal {
        /// Journal text (an empty string is kept as an entry)
        text: String,
        /// Day in YYYY-MM-DD format (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },
    /// Replace the reflection for the month containing a day
    Reflect {
        /// Reflection text
        text: String,
        /// Any day in the month, YYYY-MM-DD (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },
    /// Print a month grid with task and journal markers
    Calendar {
        /// Month in YYYY-MM format (defaults to the selected day's month)
        #[arg(long, short = 'm')]
        month: Option<String>,
        /// Selected day in YYYY-MM-DD format (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },
    /// Launch the interactive TUI
    Tui {
        /// Day to open on (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn every_argument_is_documented() {
        let cli = Cli::command();
        for sub in cli.get_subcommands() {
            for arg in sub.get_arguments() {
                if arg.get_id() == "help" {
                    continue;
                }
                assert!(
                    arg.get_help().is_some(),
                    "{} --{} has no help",
                    sub.get_name(),
                    arg.get_id()
                );
            }
        }
    }

    #[test]
    fn toggle_help_mentions_unknown_ids() {
        let cli = Cli::command();
        let toggle = cli.find_subcommand("toggle").unwrap();
        let about = toggle.get_about().unwrap().to_string();
        assert!(about.contains("not on that day"));
    }
}
