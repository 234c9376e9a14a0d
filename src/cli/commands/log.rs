use crate::cli::commands::open_registry;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::load_log;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREY, RESET};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Log {
        print,
        user,
        store,
        limit,
    } = cmd
    {
        if !*print {
            return Ok(());
        }

        let registry = open_registry(cfg);
        let rows = registry.with_store(*user, store, |conn| load_log(conn, *limit))?;

        println!("{}Log of {}/{}{}", CYAN, user, store, RESET);
        for r in rows {
            println!(
                "{}{:>5}  {}{}  {:<18} {:<28} {}",
                GREY, r.id, r.date, RESET, r.operation, r.target, r.message
            );
        }
    }

    Ok(())
}
