use crate::cli::commands::open_registry;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::stats;
use crate::errors::AppResult;
use crate::ui::messages::error;
use crate::utils::colors::{CYAN, GREEN, RED, RESET};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Db {
        migrate,
        check,
        info,
    } = cmd
    {
        let registry = open_registry(cfg);

        //
        // 1) MIGRATE
        //
        if *migrate {
            println!("{}▶ Running migrations…{}", CYAN, RESET);
            let summary = registry.migrate_all()?;
            println!(
                "{}✔ Migration completed.{} lists: {}, migrated: {}, failed: {}\n",
                GREEN, RESET, summary.stores, summary.migrated, summary.failed
            );
        }

        //
        // 2) INFO
        //
        if *info {
            stats::print_db_info(&registry)?;
        }

        //
        // 3) CHECK
        //
        if *check {
            println!("{}▶ Running integrity check…{}", CYAN, RESET);

            let mut failed = 0;
            for user_id in registry.list_users()? {
                for store in registry.list_stores(user_id)? {
                    let integrity: AppResult<String> =
                        registry.with_store(user_id, &store, |conn| {
                            Ok(conn.query_row("PRAGMA integrity_check;", [], |row| row.get(0))?)
                        });

                    match integrity {
                        Ok(result) if result == "ok" => {}
                        Ok(result) => {
                            failed += 1;
                            println!("{}✘ {}/{}:{} {}", RED, user_id, store, RESET, result);
                        }
                        Err(e) => {
                            failed += 1;
                            println!("{}✘ {}/{}:{} {}", RED, user_id, store, RESET, e);
                        }
                    }
                }
            }

            if failed == 0 {
                println!("{}✔ Integrity check passed.{}\n", GREEN, RESET);
            } else {
                error(format!("{} list(s) failed the integrity check.", failed));
            }
        }
    }

    Ok(())
}
