use alc_playground::interpreter::Object;
use alc_playground::runtime::{CallbackRegistry, ObserverId, PrintObserver};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    /// Register a fresh observer
    Register,
    /// Register the handle of an earlier observer again
    Reregister(usize),
    /// Unregister the n-th handle ever created
    Unregister(usize),
    /// Unregister by identity
    UnregisterObserver(usize),
    /// Dispatch one event and compare against the model
    Dispatch,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Register),
        1 => (0usize..16).prop_map(Op::Reregister),
        2 => (0usize..16).prop_map(Op::Unregister),
        1 => (0usize..16).prop_map(Op::UnregisterObserver),
        2 => Just(Op::Dispatch),
    ]
}

struct Harness {
    registry: CallbackRegistry,
    hits: Arc<Mutex<Vec<usize>>>,
    observers: Vec<(PrintObserver, ObserverId)>,
    model: BTreeSet<usize>,
}

impl Harness {
    fn new() -> Self {
        Self {
            registry: CallbackRegistry::new(),
            hits: Arc::new(Mutex::new(Vec::new())),
            observers: Vec::new(),
            model: BTreeSet::new(),
        }
    }

    fn apply(&mut self, op: &Op) {
        match op {
            Op::Register => {
                let index = self.observers.len();
                let hits = self.hits.clone();
                let observer = CallbackRegistry::observer(move |_| {
                    hits.lock().push(index);
                    Ok(())
                });
                let id = self.registry.register(observer.clone());
                self.observers.push((observer, id));
                self.model.insert(index);
            }
            Op::Reregister(n) => {
                if let Some((observer, id)) = self.observers.get(*n).cloned() {
                    let again = self.registry.register(observer);
                    if self.model.contains(n) {
                        assert_eq!(again, id);
                    } else {
                        self.observers[*n].1 = again;
                        self.model.insert(*n);
                    }
                }
            }
            Op::Unregister(n) => {
                if let Some((_, id)) = self.observers.get(*n) {
                    let removed = self.registry.unregister(*id);
                    assert_eq!(removed, self.model.remove(n));
                }
            }
            Op::UnregisterObserver(n) => {
                if let Some((observer, _)) = self.observers.get(*n) {
                    let removed = self.registry.unregister_observer(observer);
                    assert_eq!(removed, self.model.remove(n));
                }
            }
            Op::Dispatch => {
                self.hits.lock().clear();
                let report = self.registry.dispatch(&[Object::Integer(1)]);
                assert!(report.is_clean());

                let hits = self.hits.lock().clone();
                let dispatched: BTreeSet<usize> = hits.iter().copied().collect();
                assert_eq!(hits.len(), dispatched.len(), "observer invoked twice");
                assert_eq!(dispatched, self.model);
            }
        }
        assert_eq!(self.registry.len(), self.model.len());
    }
}

proptest! {
    #[test]
    fn dispatched_set_matches_registered_set(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut harness = Harness::new();
        for op in &ops {
            harness.apply(op);
        }
        harness.apply(&Op::Dispatch);
    }

    #[test]
    fn unregister_twice_equals_once(count in 1usize..8, victim in 0usize..8) {
        let registry = CallbackRegistry::new();
        let ids: Vec<ObserverId> = (0..count)
            .map(|_| registry.register_fn(|_| Ok(())))
            .collect();
        let victim = ids[victim % count];

        prop_assert!(registry.unregister(victim));
        let after_once = registry.ids();
        prop_assert!(!registry.unregister(victim));
        prop_assert_eq!(registry.ids(), after_once);
    }

    #[test]
    fn dispatch_preserves_registration_order(count in 1usize..10) {
        let registry = CallbackRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for index in 0..count {
            let order = order.clone();
            registry.register_fn(move |_| {
                order.lock().push(index);
                Ok(())
            });
        }

        registry.dispatch(&[]);
        prop_assert_eq!(order.lock().clone(), (0..count).collect::<Vec<_>>());
    }
}
