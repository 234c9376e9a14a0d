use clap::{Parser, Subcommand};

/// Command-line interface definition for rReminder
/// Telegram reminder bot with per-user task lists stored in SQLite
#[derive(Parser)]
#[command(
    name = "rreminder",
    version = env!("CARGO_PKG_VERSION"),
    about = "A Telegram reminder bot: task lists in SQLite, reminders repeated until confirmed",
    long_about = None
)]
pub struct Cli {
    /// Override the data directory (useful for tests or custom setups)
    #[arg(global = true, long = "data-dir")]
    pub data_dir: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the configuration file and data directory
    Init,

    /// Start the bot: Telegram polling plus the reminder scheduler
    Run,

    /// Inspect or upgrade the configuration file
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields to the configuration file")]
        migrate: bool,
    },

    /// Manage the task list files (migrations, integrity checks, info)
    Db {
        #[arg(long = "migrate", help = "Run pending migrations on every list")]
        migrate: bool,

        #[arg(long = "check", help = "Run an integrity check on every list")]
        check: bool,

        #[arg(long = "info", help = "Show users, lists and task counts")]
        info: bool,
    },

    /// Print the internal log table of one list
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        /// Owner (chat id) of the list
        #[arg(long = "user")]
        user: i64,

        /// List name
        #[arg(long = "store")]
        store: String,

        /// Number of rows to print
        #[arg(long = "limit", default_value_t = 20)]
        limit: usize,
    },

    /// Show the reminders a scan would send right now (nothing is sent)
    Scan,
}
