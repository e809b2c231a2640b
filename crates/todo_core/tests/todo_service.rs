use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use todo_core::db::open_db_in_memory;
use todo_core::{
    seed_sample_items, CreateTodoRequest, FilterSpec, FixedClock, InvalidFilterError,
    SqliteTodoRepository, TodoService, TodoServiceError, TodoStatus, TodoStore,
    UpdateTodoRequest,
};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 11, 20)
        .and_then(|date| date.and_hms_opt(16, 30, 0))
        .unwrap()
}

fn service() -> (
    Arc<SqliteTodoRepository>,
    TodoService<Arc<SqliteTodoRepository>, FixedClock>,
) {
    let store = Arc::new(SqliteTodoRepository::new(open_db_in_memory().unwrap()));
    let service = TodoService::new(Arc::clone(&store), FixedClock(now()));
    (store, service)
}

fn create_request(title: &str) -> CreateTodoRequest {
    CreateTodoRequest {
        title: title.to_string(),
        description: Some("details".to_string()),
        due_date: now() + Duration::days(2),
    }
}

#[test]
fn create_starts_pending_with_matching_timestamps() {
    let (store, service) = service();
    let view = service.create(create_request("write tests")).unwrap();

    assert_eq!(view.status, TodoStatus::Pending);
    assert_eq!(view.title, "write tests");

    let stored = store.get_by_id(view.id).unwrap().unwrap();
    assert_eq!(stored.created_at, now());
    assert_eq!(stored.updated_at, now());
}

#[test]
fn create_allows_due_today_but_rejects_yesterday() {
    let (_store, service) = service();
    let mut today = create_request("today");
    today.due_date = now().date().and_hms_opt(0, 0, 0).unwrap();
    service.create(today).unwrap();

    let mut yesterday = create_request("yesterday");
    yesterday.due_date = now() - Duration::days(1);
    assert!(matches!(
        service.create(yesterday).unwrap_err(),
        TodoServiceError::DueDateInPast { .. }
    ));
}

#[test]
fn create_rejects_duplicate_title_and_bad_fields() {
    let (_store, service) = service();
    service.create(create_request("unique")).unwrap();

    assert!(matches!(
        service.create(create_request("unique")).unwrap_err(),
        TodoServiceError::DuplicateTitle(title) if title == "unique"
    ));
    assert!(matches!(
        service.create(create_request("")).unwrap_err(),
        TodoServiceError::Validation(_)
    ));

    let mut long = create_request("long");
    long.description = Some("x".repeat(81));
    assert!(matches!(
        service.create(long).unwrap_err(),
        TodoServiceError::Validation(_)
    ));
}

#[test]
fn update_replaces_fields_and_can_revert_overdue() {
    let (store, service) = service();
    let created = service.create(create_request("original")).unwrap();

    let mut stored = store.get_by_id(created.id).unwrap().unwrap();
    stored.status = TodoStatus::Overdue;
    store.update(&stored).unwrap();

    let updated = service
        .update(UpdateTodoRequest {
            id: created.id,
            title: "renamed".to_string(),
            description: Some("new details".to_string()),
            due_date: now() + Duration::days(5),
            status: TodoStatus::Pending,
        })
        .unwrap();

    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.status, TodoStatus::Pending);
    assert_eq!(updated.created_at, stored.created_at);
    assert_eq!(store.get_by_id(created.id).unwrap().unwrap(), updated);
}

#[test]
fn update_rejects_missing_or_blank_description() {
    let (store, service) = service();
    let created = service.create(create_request("described")).unwrap();
    let request = UpdateTodoRequest {
        id: created.id,
        title: "described".to_string(),
        description: None,
        due_date: created.due_date,
        status: TodoStatus::Completed,
    };

    assert!(matches!(
        service.update(request.clone()).unwrap_err(),
        TodoServiceError::DescriptionRequired
    ));
    let blank = UpdateTodoRequest {
        description: Some("   ".to_string()),
        ..request
    };
    assert!(matches!(
        service.update(blank).unwrap_err(),
        TodoServiceError::DescriptionRequired
    ));
    assert_eq!(
        store.get_by_id(created.id).unwrap().unwrap().status,
        TodoStatus::Pending
    );
}

#[test]
fn update_returns_exactly_what_was_stored() {
    let store = Arc::new(SqliteTodoRepository::new(open_db_in_memory().unwrap()));
    let sub_milli_now = now() + Duration::microseconds(2_750);
    let service = TodoService::new(Arc::clone(&store), FixedClock(sub_milli_now));
    let created = service.create(create_request("precise")).unwrap();

    let updated = service
        .update(UpdateTodoRequest {
            id: created.id,
            title: "precise".to_string(),
            description: Some("details".to_string()),
            due_date: now() + Duration::days(1) + Duration::microseconds(1_500),
            status: TodoStatus::Pending,
        })
        .unwrap();

    assert_eq!(updated.due_date, now() + Duration::days(1) + Duration::milliseconds(1));
    assert_eq!(updated.updated_at, now() + Duration::milliseconds(2));
    assert_eq!(store.get_by_id(created.id).unwrap().unwrap(), updated);
}

#[test]
fn update_keeps_own_title_but_rejects_anothers() {
    let (_store, service) = service();
    let first = service.create(create_request("first")).unwrap();
    service.create(create_request("second")).unwrap();

    let same_title = UpdateTodoRequest {
        id: first.id,
        title: "first".to_string(),
        description: Some("details".to_string()),
        due_date: first.due_date,
        status: TodoStatus::Completed,
    };
    service.update(same_title.clone()).unwrap();

    let taken = UpdateTodoRequest {
        title: "second".to_string(),
        ..same_title
    };
    assert!(matches!(
        service.update(taken).unwrap_err(),
        TodoServiceError::DuplicateTitle(_)
    ));
}

#[test]
fn update_and_delete_missing_return_not_found() {
    let (_store, service) = service();
    let missing = todo_core::model::id::generate_for(now()).unwrap();

    let update = UpdateTodoRequest {
        id: missing,
        title: "ghost".to_string(),
        description: Some("details".to_string()),
        due_date: now(),
        status: TodoStatus::Pending,
    };
    assert!(matches!(
        service.update(update).unwrap_err(),
        TodoServiceError::NotFound(id) if id == missing
    ));
    assert!(matches!(
        service.delete(missing).unwrap_err(),
        TodoServiceError::NotFound(id) if id == missing
    ));
}

#[test]
fn delete_removes_item() {
    let (_store, service) = service();
    let created = service.create(create_request("short lived")).unwrap();
    service.delete(created.id).unwrap();
    assert!(service.get(created.id).unwrap().is_none());
}

#[test]
fn list_validates_filter_input() {
    let (_store, service) = service();
    let bad_page = FilterSpec {
        page_index: 0,
        ..FilterSpec::default()
    };
    assert!(matches!(
        service.list(&bad_page).unwrap_err(),
        TodoServiceError::InvalidFilter(InvalidFilterError::PageIndexOutOfRange(0))
    ));

    let small_page = FilterSpec {
        page_size: 5,
        ..FilterSpec::default()
    };
    assert!(matches!(
        service.list(&small_page).unwrap_err(),
        TodoServiceError::InvalidFilter(InvalidFilterError::PageSizeTooSmall { .. })
    ));
}

#[test]
fn list_returns_views_in_creation_order() {
    let (store, _service) = service();
    seed_sample_items(store.as_ref(), now() - Duration::days(1)).unwrap();
    let service = TodoService::new(Arc::clone(&store), FixedClock(now()));

    let page = service.list(&FilterSpec::default()).unwrap();
    assert_eq!(page.items.len(), 9);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.items.last().unwrap().title, "Sample Task 1");
}

#[test]
fn seeding_only_fills_an_empty_store() {
    let (store, service) = service();
    assert_eq!(seed_sample_items(store.as_ref(), now()).unwrap(), 9);
    assert_eq!(seed_sample_items(store.as_ref(), now()).unwrap(), 0);

    let completed = service
        .list(&FilterSpec {
            status: Some(TodoStatus::Completed),
            ..FilterSpec::default()
        })
        .unwrap();
    assert_eq!(completed.items.len(), 3);
}
