//! A runnable macro instance.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use keyweave_compiler::{Capabilities, MacroTree};
use keyweave_core::config::MappingConfig;
use keyweave_core::events::EventSink;
use keyweave_core::vars::VarStore;

use crate::emit::Emitter;
use crate::eval::Evaluator;

/// A compiled macro bound to one physical trigger key.
///
/// The injector arms it with [`press_key`](Self::press_key) when the trigger
/// goes down, starts [`run`](Self::run), and calls
/// [`release_key`](Self::release_key) when the trigger comes back up; the
/// hold-sensitive operations react to that flag while the run is in flight.
/// The tree itself is immutable, so one instance can run any number of times.
#[derive(Debug)]
pub struct Macro {
    source: String,
    tree: MacroTree,
    keystroke_sleep_ms: u64,
    holding: watch::Sender<bool>,
    running: AtomicBool,
    store: VarStore,
}

impl Macro {
    pub(crate) fn new(
        source: &str,
        tree: MacroTree,
        config: &MappingConfig,
        store: VarStore,
    ) -> Self {
        Self {
            source: source.to_string(),
            tree,
            keystroke_sleep_ms: config.keystroke_sleep_ms(),
            holding: watch::Sender::new(false),
            running: AtomicBool::new(false),
            store,
        }
    }

    /// The source text this macro was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &MacroTree {
        &self.tree
    }

    /// Superset of every `(type, code)` this macro can emit; the injector
    /// registers its virtual device from this before any run.
    pub fn capabilities(&self) -> Capabilities {
        self.tree.capabilities()
    }

    /// The physical trigger went down. Idempotent.
    pub fn press_key(&self) {
        self.holding.send_replace(true);
    }

    /// The physical trigger came back up. Idempotent.
    pub fn release_key(&self) {
        self.holding.send_replace(false);
    }

    pub fn is_holding(&self) -> bool {
        *self.holding.borrow()
    }

    /// Evaluate the tree, writing events into `sink`.
    ///
    /// Completes when the whole tree has been evaluated. A second call while
    /// one is live is a no-op (restarting would corrupt the hold state);
    /// once a run finishes, later calls execute normally.
    pub async fn run(&self, sink: &dyn EventSink) {
        if self
            .running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        // Clears on every exit path, including a dropped future.
        let _guard = RunningGuard(&self.running);

        let evaluator = Evaluator {
            emitter: Emitter::new(sink, self.keystroke_sleep_ms),
            holding: &self.holding,
            store: &self.store,
        };
        evaluator.run(&self.tree).await;
    }
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
