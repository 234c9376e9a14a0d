use crate::cli::commands::open_registry;
use crate::cli::parser::Cli;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file (skipped in test mode)
///  - the data directory holding one folder per user
///  - pending migrations of lists already on disk
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    println!("⚙️  Initializing rReminder…");

    let data_dir = Config::init_all(cli.data_dir.clone(), cli.test)?;

    let mut cfg = cfg.clone();
    cfg.data_dir = data_dir.to_string_lossy().to_string();

    let registry = open_registry(&cfg);
    let summary = registry.migrate_all()?;

    if summary.stores > 0 {
        println!(
            "🗄️  Lists found: {} (migrated: {}, failed: {})",
            summary.stores, summary.migrated, summary.failed
        );
    }
    if summary.failed > 0 {
        warning("Some lists could not be migrated, run `rreminder db --info` for details.");
    }

    if cfg.bot_token.trim().is_empty() {
        warning(format!(
            "No bot token configured: edit {} or set {}",
            Config::config_file().display(),
            crate::config::TOKEN_ENV
        ));
    }

    success("rReminder initialization completed!");
    Ok(())
}
