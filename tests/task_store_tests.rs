use chrono::{Duration, NaiveDateTime};
use rreminder::core::source::ReminderSource;
use rreminder::db::log::load_log;
use rreminder::errors::AppError;
use rreminder::utils::time::DB_FORMAT;
use std::collections::HashSet;

mod common;
use common::{at, registry_with_store, temp_registry};

#[test]
fn test_add_tasks_get_distinct_ids() {
    let (_dir, reg) = registry_with_store(1, "work");
    let base = at(2026, 3, 1, 9, 0);

    let ids: Vec<i64> = (0..5)
        .map(|i| {
            reg.add_task(1, "work", &format!("task {i}"), base + Duration::hours(5 - i))
                .unwrap()
        })
        .collect();

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 5);

    let tasks = reg.list_tasks(1, "work").unwrap();
    assert_eq!(tasks.len(), 5);
    // ordered by due time
    assert_eq!(tasks[0].text, "task 4");
    assert_eq!(tasks[4].text, "task 0");
    assert!(tasks.iter().all(|t| !t.confirmed && t.last_notified_at.is_none()));
}

#[test]
fn test_task_fields_round_trip_through_storage() {
    let (_dir, reg) = registry_with_store(1, "work");
    let due = at(2026, 3, 1, 18, 45);

    let id = reg.add_task(1, "work", "  call mom: urgent  ", due).unwrap();
    let task = reg.get_task(1, "work", id).unwrap();

    assert_eq!(task.id, id);
    assert_eq!(task.text, "call mom: urgent");
    assert_eq!(task.due_at, due);
}

#[test]
fn test_missing_store_vs_empty_store() {
    let (_dir, reg) = registry_with_store(1, "empty");

    assert!(reg.list_tasks(1, "empty").unwrap().is_empty());

    let err = reg.list_tasks(1, "ghost").unwrap_err();
    assert!(matches!(err, AppError::StoreNotFound(ref n) if n == "ghost"));

    let err = reg
        .add_task(1, "ghost", "x", at(2026, 1, 1, 0, 0))
        .unwrap_err();
    assert!(matches!(err, AppError::StoreNotFound(_)));

    // another user's list is not visible
    assert!(matches!(
        reg.list_tasks(2, "empty").unwrap_err(),
        AppError::StoreNotFound(_)
    ));
}

#[test]
fn test_empty_text_is_rejected() {
    let (_dir, reg) = registry_with_store(1, "work");
    let err = reg.add_task(1, "work", "   ", at(2026, 1, 1, 0, 0)).unwrap_err();
    assert!(matches!(err, AppError::EmptyText));
    assert!(reg.list_tasks(1, "work").unwrap().is_empty());
}

#[test]
fn test_delete_task_twice() {
    let (_dir, reg) = registry_with_store(1, "work");
    let id = reg.add_task(1, "work", "once", at(2026, 1, 1, 8, 0)).unwrap();

    reg.delete_task(1, "work", id).unwrap();
    let err = reg.delete_task(1, "work", id).unwrap_err();
    assert!(matches!(err, AppError::TaskNotFound { id: i, .. } if i == id));
    assert!(err.is_not_found());
    assert!(reg.list_tasks(1, "work").unwrap().is_empty());
}

#[test]
fn test_ids_are_not_reused() {
    let (_dir, reg) = registry_with_store(1, "work");
    let due = at(2026, 1, 1, 8, 0);

    let a = reg.add_task(1, "work", "a", due).unwrap();
    let b = reg.add_task(1, "work", "b", due).unwrap();
    reg.delete_task(1, "work", b).unwrap();
    let c = reg.add_task(1, "work", "c", due).unwrap();

    assert!(c > b && b > a);
}

#[test]
fn test_confirm_is_idempotent() {
    let (_dir, reg) = registry_with_store(1, "work");
    let id = reg.add_task(1, "work", "pay rent", at(2026, 1, 1, 8, 0)).unwrap();

    assert!(reg.confirm_task(1, "work", id).unwrap());
    assert!(!reg.confirm_task(1, "work", id).unwrap());
    assert!(reg.get_task(1, "work", id).unwrap().confirmed);

    let err = reg.confirm_task(1, "work", id + 100).unwrap_err();
    assert!(matches!(err, AppError::TaskNotFound { .. }));
}

#[test]
fn test_operations_are_logged() {
    let (_dir, reg) = registry_with_store(1, "work");
    let id = reg.add_task(1, "work", "a", at(2026, 1, 1, 8, 0)).unwrap();
    reg.confirm_task(1, "work", id).unwrap();
    reg.delete_task(1, "work", id).unwrap();

    let rows = reg.with_store(1, "work", |conn| load_log(conn, 10)).unwrap();
    let ops: Vec<&str> = rows.iter().map(|r| r.operation.as_str()).collect();

    assert_eq!(ops[0], "delete_task");
    assert_eq!(ops[1], "confirm_task");
    assert_eq!(ops[2], "add_task");
    assert!(ops.contains(&"create_store"));
}

#[test]
fn test_deleting_store_removes_its_tasks() {
    let (_dir, reg) = temp_registry();
    reg.create_store(1, "work").unwrap();
    reg.add_task(1, "work", "old", at(2026, 1, 1, 8, 0)).unwrap();

    reg.delete_store(1, "work").unwrap();
    reg.create_store(1, "work").unwrap();

    assert!(reg.list_tasks(1, "work").unwrap().is_empty());
}

#[test]
fn test_mark_notified_never_moves_backwards_or_touches_confirmed() {
    let (_dir, reg) = registry_with_store(1, "work");
    let t = at(2026, 1, 1, 8, 0);
    let id = reg.add_task(1, "work", "water plants", t).unwrap();

    reg.mark_notified(1, "work", id, t + Duration::minutes(5)).unwrap();
    reg.mark_notified(1, "work", id, t).unwrap();
    assert_eq!(
        reg.get_task(1, "work", id).unwrap().last_notified_at,
        Some(t + Duration::minutes(5))
    );

    reg.confirm_task(1, "work", id).unwrap();
    reg.mark_notified(1, "work", id, t + Duration::minutes(9)).unwrap();
    reg.mark_notified(1, "work", id, t + Duration::minutes(9)).unwrap();

    let task = reg.get_task(1, "work", id).unwrap();
    assert!(task.confirmed);
    assert_eq!(task.last_notified_at, Some(t + Duration::minutes(5)));
}

#[test]
fn test_log_dates_use_storage_format() {
    let (_dir, reg) = registry_with_store(1, "work");
    let id = reg.add_task(1, "work", "a", at(2026, 1, 1, 8, 0)).unwrap();
    reg.confirm_task(1, "work", id).unwrap();

    let rows = reg.with_store(1, "work", |conn| load_log(conn, 10)).unwrap();
    assert!(!rows.is_empty());
    for r in &rows {
        assert!(r.date.ends_with('Z'), "{}", r.date);
        assert!(NaiveDateTime::parse_from_str(&r.date, DB_FORMAT).is_ok(), "{}", r.date);
    }
}
