//! Integration tests for lease expiry, cancellation, and teardown failures.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use sortie_lease::LeaseRegistry;

/// Records every destroy call so tests can count them.
#[derive(Default)]
struct DestroyLog {
    calls: RefCell<Vec<String>>,
}

impl DestroyLog {
    fn destroy(&self, key: &String) -> Result<(), String> {
        self.calls.borrow_mut().push(key.clone());
        Ok(())
    }

    fn count(&self, key: &str) -> usize {
        self.calls.borrow().iter().filter(|k| *k == key).count()
    }

    fn total(&self) -> usize {
        self.calls.borrow().len()
    }
}

fn key(s: &str) -> String {
    s.to_string()
}

#[test]
fn test_lease_destroyed_exactly_once_on_final_tick() {
    let leases = LeaseRegistry::new();
    let log = DestroyLog::default();
    leases.register(key("r1"), 5).unwrap();

    for tick in 1..=4 {
        let expired = leases.tick(|k| log.destroy(k));
        assert!(expired.is_empty(), "expired early on tick {tick}");
        assert_eq!(log.total(), 0);
    }

    let expired = leases.tick(|k| log.destroy(k));
    assert_eq!(expired, vec![key("r1")]);
    assert_eq!(log.count("r1"), 1);
    assert_eq!(leases.remaining(&key("r1")), None);

    // Further ticks never destroy it again.
    for _ in 0..10 {
        leases.tick(|k| log.destroy(k));
    }
    assert_eq!(log.count("r1"), 1);
}

#[test]
fn test_simultaneous_expiry_destroys_each_once() {
    let leases = LeaseRegistry::new();
    let log = DestroyLog::default();
    for name in ["a", "b", "c"] {
        leases.register(key(name), 2).unwrap();
    }
    leases.register(key("d"), 3).unwrap();

    leases.tick(|k| log.destroy(k));
    let mut expired = leases.tick(|k| log.destroy(k));
    expired.sort();

    assert_eq!(expired, vec![key("a"), key("b"), key("c")]);
    assert_eq!(log.count("a"), 1);
    assert_eq!(log.count("b"), 1);
    assert_eq!(log.count("c"), 1);
    assert_eq!(log.count("d"), 0);
    assert_eq!(leases.len(), 1);
}

#[test]
fn test_cancel_prevents_destroy() {
    let leases = LeaseRegistry::new();
    let log = DestroyLog::default();
    leases.register(key("r1"), 2).unwrap();

    assert!(leases.cancel(&key("r1")));
    for _ in 0..5 {
        leases.tick(|k| log.destroy(k));
    }

    assert_eq!(log.total(), 0);
    assert!(leases.is_empty());
}

#[test]
fn test_failed_teardown_still_forgets_lease() {
    let leases = LeaseRegistry::new();
    let mut attempts: HashMap<String, usize> = HashMap::new();
    leases.register(key("broken"), 1).unwrap();

    let expired = leases.tick(|k: &String| {
        *attempts.entry(k.clone()).or_default() += 1;
        Err::<(), _>("disk busy")
    });
    assert_eq!(expired, vec![key("broken")]);

    // No retry storm: the lease is gone even though teardown failed.
    leases.tick(|k: &String| {
        *attempts.entry(k.clone()).or_default() += 1;
        Err::<(), _>("disk busy")
    });
    assert_eq!(attempts.get("broken"), Some(&1));
    assert!(leases.is_empty());
}

#[test]
fn test_concurrent_register_and_tick() {
    let leases = Arc::new(LeaseRegistry::new());

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let leases = Arc::clone(&leases);
            std::thread::spawn(move || {
                for i in 0..100 {
                    leases.register(format!("w{t}-{i}"), 1_000).unwrap();
                }
            })
        })
        .collect();

    for _ in 0..50 {
        leases.tick(|_: &String| Ok::<(), String>(()));
    }
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(leases.len(), 400);
}
