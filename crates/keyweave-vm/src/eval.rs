//! Cooperative evaluation of a macro tree.
//!
//! The evaluator walks the tree top to bottom and suspends only at sleeps
//! and at "await release"; emissions between suspension points are
//! synchronous, so a tap always produces its down and its up from the same
//! task. The holding flag is read through a watch channel: loops poll it
//! once per iteration, the bare wait subscribes and parks until release.

use async_recursion::async_recursion;
use tokio::sync::watch;

use keyweave_compiler::{MacroNode, MacroTree};
use keyweave_core::vars::VarStore;

use crate::emit::Emitter;

pub(crate) struct Evaluator<'a> {
    pub(crate) emitter: Emitter<'a>,
    pub(crate) holding: &'a watch::Sender<bool>,
    pub(crate) store: &'a VarStore,
}

impl Evaluator<'_> {
    fn is_holding(&self) -> bool {
        *self.holding.borrow()
    }

    /// Park until the holding flag drops. Returns immediately when the macro
    /// was never armed.
    async fn await_release(&self) {
        let mut rx = self.holding.subscribe();
        // Cannot fail: the sender lives in the macro we are borrowing from.
        let _ = rx.wait_for(|holding| !holding).await;
    }

    #[async_recursion]
    pub(crate) async fn run(&self, tree: &MacroTree) {
        for node in tree.nodes() {
            self.run_node(node).await;
        }
    }

    async fn run_node(&self, node: &MacroNode) {
        match node {
            MacroNode::Key { code, .. } => self.emitter.tap(*code).await,

            MacroNode::Repeat { count, body } => {
                for _ in 0..*count {
                    self.run(body).await;
                }
            }

            MacroNode::Wait { ms } => self.emitter.sleep_ms(*ms).await,

            MacroNode::AwaitRelease => self.await_release().await,

            MacroNode::HoldKey { code, .. } => {
                self.emitter.key_down(*code);
                self.await_release().await;
                self.emitter.key_up(*code);
            }

            MacroNode::HoldRepeat { body } => {
                while self.is_holding() {
                    self.run(body).await;
                }
            }

            MacroNode::Modify { code, body, .. } => {
                self.emitter.key_down(*code);
                self.run(body).await;
                self.emitter.key_up(*code);
            }

            MacroNode::Mouse { direction, speed } => {
                let axis = direction.pointer_axis();
                let value = direction.sign() * speed;
                while self.is_holding() {
                    self.emitter.relative(axis, value);
                    self.emitter.pause().await;
                }
            }

            MacroNode::Wheel { direction, speed } => {
                let axis = direction.wheel_axis();
                let value = direction.sign() * speed;
                while self.is_holding() {
                    self.emitter.relative(axis, value);
                    self.emitter.pause().await;
                }
            }

            MacroNode::Event {
                ev_type,
                code,
                value,
            } => self.emitter.raw(*ev_type, *code, *value),

            MacroNode::Set { name, value } => self.store.set(name, value.clone()),

            MacroNode::IfEq {
                name,
                value,
                then_branch,
                else_branch,
            } => {
                // An absent key never equals anything.
                let equal = self
                    .store
                    .get(name)
                    .is_some_and(|stored| stored.matches(value));
                let branch = if equal { then_branch } else { else_branch };
                if let Some(branch) = branch {
                    self.run(branch).await;
                }
            }
        }
    }
}
