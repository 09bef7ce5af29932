//! Tests for the bounded history store.

use worktrack::history::BoundedHistory;

// ---------------------------------------------------------------------------
// Capacity and eviction
// ---------------------------------------------------------------------------

#[test]
fn append_past_capacity_evicts_oldest_first() {
    let mut history = BoundedHistory::new(3);
    for name in ["a", "b", "c", "d"] {
        history.append(name);
    }

    assert_eq!(history.len(), 3);
    // Newest first; "a" is gone.
    assert_eq!(history.list(None), vec![&"d", &"c", &"b"]);
    assert!(history.find(|&item| item == "a").is_none());
}

#[test]
fn length_never_exceeds_capacity() {
    let mut history = BoundedHistory::new(5);
    for i in 0..100 {
        history.append(i);
        assert!(history.len() <= 5);
    }

    // Exactly the 5 most recent survive.
    assert_eq!(history.list(None), vec![&99, &98, &97, &96, &95]);
}

#[test]
fn zero_capacity_retains_nothing() {
    let mut history = BoundedHistory::new(0);
    history.append(1);
    history.append(2);

    assert!(history.is_empty());
    assert!(history.list(None).is_empty());
}

// ---------------------------------------------------------------------------
// Read conventions
// ---------------------------------------------------------------------------

#[test]
fn empty_store_lists_empty_never_panics() {
    let history: BoundedHistory<i32> = BoundedHistory::new(10);

    assert!(history.list(None).is_empty());
    assert!(history.list(Some(5)).is_empty());
    assert!(history.find(|_| true).is_none());
}

#[test]
fn limit_larger_than_length_returns_everything() {
    let mut history = BoundedHistory::new(10);
    history.append(1);
    history.append(2);

    assert_eq!(history.list(Some(100)), vec![&2, &1]);
}

#[test]
fn list_where_filters_then_limits() {
    let mut history = BoundedHistory::new(10);
    for i in 0..10 {
        history.append(i);
    }

    let evens = history.list_where(None, |&i| i % 2 == 0);
    assert_eq!(evens, vec![&8, &6, &4, &2, &0]);

    let limited = history.list_where(Some(2), |&i| i % 2 == 0);
    assert_eq!(limited, vec![&8, &6]);
}

#[test]
fn find_returns_oldest_match_while_list_is_newest_first() {
    let mut history = BoundedHistory::new(10);
    for i in [10, 20, 10, 30] {
        history.append(i);
    }

    // find: first match in insertion order — "the original record".
    let found = history.find(|&i| i == 10);
    assert_eq!(found, Some(&10));
    // list: newest first.
    assert_eq!(history.list(None), vec![&30, &10, &20, &10]);
}

#[test]
fn iter_is_insertion_order() {
    let mut history = BoundedHistory::new(3);
    for i in [1, 2, 3, 4] {
        history.append(i);
    }

    let collected: Vec<_> = history.iter().copied().collect();
    assert_eq!(collected, vec![2, 3, 4]);
}
