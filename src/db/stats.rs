use crate::db::migrate::pending_migrations;
use crate::db::queries::count_tasks;
use crate::db::registry::Registry;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREY, RED, RESET, YELLOW, color_for_pending};
use std::fs;

/// Per-list figures shown by `db --info`.
#[derive(Debug, Clone)]
pub struct StoreInfo {
    pub user_id: i64,
    pub store: String,
    pub size_bytes: u64,
    pub total: i64,
    pub unconfirmed: i64,
    pub pending_migrations: usize,
}

pub fn collect(registry: &Registry) -> AppResult<Vec<StoreInfo>> {
    let mut out = Vec::new();
    for user_id in registry.list_users()? {
        for store in registry.list_stores(user_id)? {
            let path = registry.store_path(user_id, &store);
            let size_bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

            let (total, unconfirmed, pending) = registry.with_store(user_id, &store, |conn| {
                let pending = pending_migrations(conn)?.len();
                // Lists behind on migrations may not have every column yet.
                let (total, unconfirmed) = if pending == 0 {
                    count_tasks(conn)?
                } else {
                    (0, 0)
                };
                Ok((total, unconfirmed, pending))
            })?;

            out.push(StoreInfo {
                user_id,
                store,
                size_bytes,
                total,
                unconfirmed,
                pending_migrations: pending,
            });
        }
    }
    Ok(out)
}

pub fn print_db_info(registry: &Registry) -> AppResult<()> {
    println!();
    println!(
        "{}• Data dir:{} {}{}{}",
        CYAN,
        RESET,
        YELLOW,
        registry.root().display(),
        RESET
    );

    let infos = collect(registry)?;
    let users = registry.list_users()?.len();
    println!("{}• Users:{} {}", CYAN, RESET, users);
    println!("{}• Lists:{} {}", CYAN, RESET, infos.len());
    println!();

    for i in &infos {
        let kb = (i.size_bytes as f64) / 1024.0;
        let migr = if i.pending_migrations > 0 {
            format!(" {}({} pending migrations){}", RED, i.pending_migrations, RESET)
        } else {
            String::new()
        };
        println!(
            "  {}{}/{}{}  {:.1} KB  tasks: {}  unconfirmed: {}{}{}{}",
            GREY,
            i.user_id,
            RESET,
            i.store,
            kb,
            i.total,
            color_for_pending(i.unconfirmed as usize),
            i.unconfirmed,
            RESET,
            migr
        );
    }

    println!();
    Ok(())
}
