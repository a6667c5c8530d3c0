//! Property-based tests for path traversal and notification.

use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::{json, Value};
use state_tree::{expand_tree, Store};
use std::sync::Arc;

fn key_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-c]{1,2}", 1..5).prop_map(|segments| segments.join("."))
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
        Just(json!([1, 2, 3])),
    ]
}

fn is_at_or_below(path: &str, ancestor: &str) -> bool {
    path == ancestor || path.starts_with(&format!("{ancestor}."))
}

proptest! {
    #[test]
    fn prop_read_after_create(path in key_path(), value in leaf()) {
        let store = Store::new();

        store.create(&path, value.clone()).unwrap();

        prop_assert_eq!(store.get(&path).unwrap(), Some(value));
    }

    #[test]
    fn prop_successful_writes_are_readable(
        writes in prop::collection::vec((key_path(), leaf()), 1..20)
    ) {
        let store = Store::new();

        for (path, value) in writes {
            if store.create(&path, value.clone()).is_ok() {
                prop_assert_eq!(store.get(&path).unwrap(), Some(value));
            }
        }
    }

    #[test]
    fn prop_failed_writes_leave_tree_unchanged(
        writes in prop::collection::vec((key_path(), leaf(), any::<bool>()), 1..20)
    ) {
        let store = Store::new();

        for (path, value, create) in writes {
            let before = store.get_state();
            if store.update_with(&path, value, create).is_err() {
                let after = store.get_state();
                prop_assert_eq!(&*after, &*before);
            }
        }
    }

    #[test]
    fn prop_delete_removes_key(path in key_path(), value in leaf()) {
        let store = Store::new();
        store.create(&path, value).unwrap();

        store.delete(&path).unwrap();

        let last = path.rsplit('.').next().unwrap();
        match path.rsplit_once('.') {
            Some((parent, _)) => {
                let parent = store.get(parent).unwrap().unwrap();
                prop_assert!(!parent.as_object().unwrap().contains_key(last));
            }
            None => prop_assert!(!store.get_state().contains_key(last)),
        }
    }

    #[test]
    fn prop_expand_tree_is_prefix_chain(path in key_path()) {
        let chain = expand_tree(&path, '.');

        prop_assert_eq!(chain.len(), path.split('.').count());
        prop_assert_eq!(chain.last().unwrap(), &path);
        for pair in chain.windows(2) {
            let prefix = format!("{}.", pair[0]);
            prop_assert!(pair[1].starts_with(&prefix));
        }
    }

    #[test]
    fn prop_root_hears_every_mutation_in_order(
        writes in prop::collection::vec((key_path(), leaf()), 1..20)
    ) {
        let store = Store::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe_all(move |change| {
            sink.lock().push(change.path.to_string());
            Ok(())
        });

        let mut applied = Vec::new();
        for (path, value) in writes {
            if store.create(&path, value).is_ok() {
                applied.push(path);
            }
        }

        let seen = seen.lock();
        prop_assert_eq!(&*seen, &applied);
    }

    #[test]
    fn prop_interior_subscriber_hears_only_its_subtree(
        watched in key_path(),
        writes in prop::collection::vec((key_path(), leaf()), 1..20)
    ) {
        let store = Store::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(&watched, move |change| {
            sink.lock().push(change.path.to_string());
            Ok(())
        });

        let mut expected = Vec::new();
        for (path, value) in writes {
            if store.create(&path, value).is_ok() && is_at_or_below(&path, &watched) {
                expected.push(path);
            }
        }

        let seen = seen.lock();
        prop_assert_eq!(&*seen, &expected);
    }
}
