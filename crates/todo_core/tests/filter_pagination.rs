use chrono::{Duration, NaiveDate, NaiveDateTime};
use todo_core::db::open_db_in_memory;
use todo_core::filter::{apply, FilterSpec};
use todo_core::model::id;
use todo_core::{SqliteTodoRepository, TodoId, TodoItem, TodoStatus, TodoStore};

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|date| date.and_hms_opt(8, 0, 0))
        .unwrap()
}

fn repo() -> SqliteTodoRepository {
    SqliteTodoRepository::new(open_db_in_memory().unwrap())
}

fn insert(
    repo: &SqliteTodoRepository,
    title: &str,
    status: TodoStatus,
    created_at: NaiveDateTime,
    due_date: NaiveDateTime,
) -> TodoId {
    let mut item = TodoItem::new_pending(
        id::generate_for(created_at).unwrap(),
        title,
        None,
        due_date,
        created_at,
    );
    item.status = status;
    repo.add(&item).unwrap();
    item.id
}

/// Inserts `count` pending items created one minute apart; returns ids newest first.
fn insert_pending(repo: &SqliteTodoRepository, count: usize) -> Vec<TodoId> {
    let mut ids: Vec<TodoId> = (0..count)
        .map(|n| {
            let created = base() + Duration::minutes(n as i64);
            insert(
                repo,
                &format!("pending {n:02}"),
                TodoStatus::Pending,
                created,
                created + Duration::days(7),
            )
        })
        .collect();
    ids.reverse();
    ids
}

#[test]
fn status_filter_paginates_twenty_five_items() {
    let repo = repo();
    insert_pending(&repo, 25);
    insert(&repo, "done", TodoStatus::Completed, base(), base());

    let spec = FilterSpec {
        status: Some(TodoStatus::Pending),
        page_index: 1,
        page_size: 10,
        ..FilterSpec::default()
    };
    let page = apply(&repo, &spec).unwrap();

    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items.len(), 10);
    assert!(page.has_next_page);
    assert!(!page.has_previous_page);
    assert!(page.items.iter().all(|item| item.status == TodoStatus::Pending));
}

#[test]
fn page_window_matches_default_ordering_slice() {
    let repo = repo();
    let newest_first = insert_pending(&repo, 25);

    for page_index in 1..=3u32 {
        let spec = FilterSpec {
            page_index,
            page_size: 10,
            ..FilterSpec::default()
        };
        let page = apply(&repo, &spec).unwrap();
        let start = (page_index as usize - 1) * 10;
        let end = (start + 10).min(newest_first.len());
        let ids: Vec<TodoId> = page.items.iter().map(|item| item.id).collect();
        assert_eq!(ids, newest_first[start..end].to_vec(), "page {page_index}");
    }
}

#[test]
fn exact_multiple_reports_trailing_empty_page() {
    let repo = repo();
    insert_pending(&repo, 20);

    let last = FilterSpec {
        page_index: 3,
        page_size: 10,
        ..FilterSpec::default()
    };
    let page = apply(&repo, &last).unwrap();
    assert_eq!(page.total_pages, 3);
    assert!(page.items.is_empty());
    assert!(!page.has_next_page);
    assert!(page.has_previous_page);
}

#[test]
fn created_bound_compares_dates_only() {
    let repo = repo();
    let day_one_late = base().date().and_hms_opt(23, 59, 0).unwrap();
    let kept = insert(&repo, "kept", TodoStatus::Pending, day_one_late, day_one_late);
    insert(
        &repo,
        "next day",
        TodoStatus::Pending,
        base() + Duration::days(1),
        base() + Duration::days(2),
    );

    let spec = FilterSpec {
        created_on_or_before: Some(base().date()),
        ..FilterSpec::default()
    };
    let page = apply(&repo, &spec).unwrap();
    let ids: Vec<TodoId> = page.items.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![kept]);
}

#[test]
fn due_bound_filters_and_orders_by_due_date() {
    let repo = repo();
    let soon = insert(
        &repo,
        "soon",
        TodoStatus::Pending,
        base() + Duration::hours(2),
        base() + Duration::days(1),
    );
    let later = insert(
        &repo,
        "later",
        TodoStatus::Overdue,
        base(),
        base() + Duration::days(3),
    );
    insert(
        &repo,
        "far",
        TodoStatus::Pending,
        base() + Duration::hours(1),
        base() + Duration::days(30),
    );

    let spec = FilterSpec {
        due_on_or_before: Some((base() + Duration::days(3)).date()),
        ..FilterSpec::default()
    };
    let page = apply(&repo, &spec).unwrap();
    let ids: Vec<TodoId> = page.items.iter().map(|item| item.id).collect();
    // "later" was created first but is due last.
    assert_eq!(ids, vec![later, soon]);
}

#[test]
fn filters_are_and_combined_with_case_sensitive_title() {
    let repo = repo();
    let match_id = insert(&repo, "Pay Rent", TodoStatus::Pending, base(), base());
    insert(&repo, "pay rent again", TodoStatus::Pending, base(), base());
    insert(&repo, "Pay Rent twice", TodoStatus::Completed, base(), base());

    let spec = FilterSpec {
        status: Some(TodoStatus::Pending),
        title: Some("Rent".to_string()),
        ..FilterSpec::default()
    };
    let page = apply(&repo, &spec).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, match_id);
    assert_eq!(page.total_pages, 1);
}
