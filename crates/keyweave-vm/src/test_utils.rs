use std::sync::Arc;

use parking_lot::Mutex;

use keyweave_core::events::{EventSink, EventTriple};

/// Sink that records everything written to it. Clones share the buffer, so a
/// test can hand one clone to a spawned run and keep another for asserts.
#[derive(Debug, Clone, Default)]
pub(crate) struct Recorder(Arc<Mutex<Vec<EventTriple>>>);

impl Recorder {
    pub(crate) fn events(&self) -> Vec<EventTriple> {
        self.0.lock().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub(crate) fn count(&self, event: EventTriple) -> usize {
        self.0.lock().iter().filter(|e| **e == event).count()
    }
}

impl EventSink for Recorder {
    fn write(&self, ev_type: u16, code: u16, value: i32) {
        self.0.lock().push((ev_type, code, value));
    }
}

/// Every key-down must be balanced by exactly one key-up of the same code.
pub(crate) fn assert_balanced(events: &[EventTriple]) {
    use std::collections::HashMap;

    let mut open: HashMap<u16, i64> = HashMap::new();
    for (ev_type, code, value) in events {
        if *ev_type != keyweave_core::events::ecodes::EV_KEY {
            continue;
        }
        match value {
            1 => *open.entry(*code).or_default() += 1,
            0 => {
                let depth = open.entry(*code).or_default();
                assert!(*depth > 0, "key-up without key-down for code {code}");
                *depth -= 1;
            }
            _ => {}
        }
    }
    for (code, depth) in open {
        assert_eq!(depth, 0, "unreleased key-down for code {code}");
    }
}
