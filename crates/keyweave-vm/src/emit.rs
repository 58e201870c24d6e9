//! Thin adapters between evaluator intents and sink writes.
//!
//! The emitter knows how to spell an intent as events and pauses; it makes no
//! scheduling decisions of its own. Key values are `1` down, `0` up.

use std::time::Duration;

use tokio::time;

use keyweave_core::events::{EventSink, ecodes};

pub(crate) struct Emitter<'a> {
    sink: &'a dyn EventSink,
    keystroke_sleep: Duration,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(sink: &'a dyn EventSink, keystroke_sleep_ms: u64) -> Self {
        Self {
            sink,
            keystroke_sleep: Duration::from_millis(keystroke_sleep_ms),
        }
    }

    pub(crate) fn key_down(&self, code: u16) {
        self.sink.write(ecodes::EV_KEY, code, 1);
    }

    pub(crate) fn key_up(&self, code: u16) {
        self.sink.write(ecodes::EV_KEY, code, 0);
    }

    /// Full tap: down, pause, up, pause. The trailing pause spaces the taps
    /// of a chain evenly; its cost is asserted by the timing tests.
    pub(crate) async fn tap(&self, code: u16) {
        self.key_down(code);
        self.pause().await;
        self.key_up(code);
        self.pause().await;
    }

    pub(crate) fn relative(&self, axis: u16, value: i32) {
        self.sink.write(ecodes::EV_REL, axis, value);
    }

    pub(crate) fn raw(&self, ev_type: u16, code: u16, value: i32) {
        self.sink.write(ev_type, code, value);
    }

    /// One inter-keystroke quantum.
    pub(crate) async fn pause(&self) {
        time::sleep(self.keystroke_sleep).await;
    }

    pub(crate) async fn sleep_ms(&self, ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }
}
