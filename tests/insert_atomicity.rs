//! Insert Atomicity Tests
//!
//! A rejected insert must leave the container exactly as it was:
//! - Uniqueness conflicts mutate no view
//! - Missing key fields mutate no view
//! - The conflict outcome names the blocking record

use rankdb::container::{ContainerBuilder, EngineError, MultiIndexContainer};
use rankdb::record::{FieldValue, Record};

// =============================================================================
// Helper Functions
// =============================================================================

fn employee(id: i64, name: &str, age: i64) -> Record {
    Record::builder()
        .field("id", id)
        .field("name", name)
        .field("age", age)
        .build()
}

fn employee_container() -> MultiIndexContainer {
    ContainerBuilder::new()
        .ordered_unique("by_id", "id")
        .ordered_non_unique("by_name", "name")
        .ranked_non_unique("by_age", "age")
        .build()
        .unwrap()
}

/// Per-view (len, per-key counts) snapshot for before/after comparison
fn snapshot(container: &MultiIndexContainer) -> Vec<(String, usize, Vec<usize>)> {
    container
        .view_names()
        .map(|name| {
            let view = container.view(name).unwrap();
            let counts = (0..100i64)
                .map(|key| view.count(&FieldValue::from_int(key)))
                .collect();
            (name.to_string(), view.len(), counts)
        })
        .collect()
}

// =============================================================================
// Uniqueness Conflicts
// =============================================================================

/// A duplicate id changes nothing: size and every view's contents are
/// identical before and after.
#[test]
fn test_rejected_insert_leaves_container_unchanged() {
    let mut container = employee_container();

    container.insert(employee(1, "Joe", 41)).unwrap();
    container.insert(employee(2, "Anna", 52)).unwrap();

    let before = snapshot(&container);
    let size_before = container.size();

    let rejected = container.insert(employee(1, "Mark", 63)).unwrap();
    assert!(!rejected.inserted);

    assert_eq!(container.size(), size_before);
    assert_eq!(snapshot(&container), before);
}

/// The rejection outcome carries the handle of the record already
/// holding the contested key.
#[test]
fn test_rejection_names_the_blocking_record() {
    let mut container = employee_container();

    let joe = container.insert(employee(1, "Joe", 41)).unwrap().handle;
    let rejected = container.insert(employee(1, "Mark", 63)).unwrap();

    assert!(!rejected.inserted);
    assert_eq!(rejected.handle, joe);
    assert_eq!(
        container.get(rejected.handle).and_then(|r| r.get("name")),
        Some(&FieldValue::from_string("Joe"))
    );
}

/// After a key is erased, a previously conflicting insert succeeds.
#[test]
fn test_conflict_clears_after_erase() {
    let mut container = employee_container();

    let joe = container.insert(employee(1, "Joe", 41)).unwrap().handle;
    assert!(!container.insert(employee(1, "Mark", 63)).unwrap().inserted);

    container.erase(joe).unwrap();

    let retry = container.insert(employee(1, "Mark", 63)).unwrap();
    assert!(retry.inserted);
    assert_eq!(container.size(), 1);
}

// =============================================================================
// Missing Key Fields
// =============================================================================

/// A record lacking any view's key field is rejected before any view is
/// touched.
#[test]
fn test_missing_field_rejected_without_mutation() {
    let mut container = employee_container();

    container.insert(employee(1, "Joe", 41)).unwrap();
    let before = snapshot(&container);

    let incomplete = Record::builder().field("id", 2i64).field("age", 9i64).build();
    let err = container.insert(incomplete).unwrap_err();

    assert_eq!(
        err,
        EngineError::MissingKeyField {
            view: "by_name".to_string(),
            field: "name".to_string(),
        }
    );
    assert_eq!(container.size(), 1);
    assert_eq!(snapshot(&container), before);
}

// =============================================================================
// Unique View Interplay
// =============================================================================

/// Non-unique views never reject: equal keys accumulate.
#[test]
fn test_non_unique_views_accept_duplicates() {
    let mut container = employee_container();

    for id in 0..5i64 {
        let outcome = container.insert(employee(id, "Joe", 41)).unwrap();
        assert!(outcome.inserted);
    }

    assert_eq!(
        container
            .view("by_name")
            .unwrap()
            .count(&FieldValue::from_string("Joe")),
        5
    );
    assert_eq!(container.view("by_age").unwrap().count(&FieldValue::from_int(41)), 5);
}

/// With two unique views, a conflict on either one aborts the whole
/// insert.
#[test]
fn test_any_unique_view_can_veto() {
    let mut container = ContainerBuilder::new()
        .ordered_unique("by_id", "id")
        .ranked_unique("by_badge", "badge")
        .build()
        .unwrap();

    let record = |id: i64, badge: i64| {
        Record::builder().field("id", id).field("badge", badge).build()
    };

    container.insert(record(1, 100)).unwrap();

    // Fresh id, conflicting badge
    let by_badge = container.insert(record(2, 100)).unwrap();
    assert!(!by_badge.inserted);

    // Conflicting id, fresh badge
    let by_id = container.insert(record(1, 200)).unwrap();
    assert!(!by_id.inserted);

    assert_eq!(container.size(), 1);
    assert_eq!(
        container.view("by_id").unwrap().count(&FieldValue::from_int(2)),
        0
    );
    assert_eq!(
        container
            .view("by_badge")
            .unwrap()
            .count(&FieldValue::from_int(200)),
        0
    );
}
