//! Runtime for keyweave macros.
//!
//! This crate ties the compiler to an executable surface: [`compile`] (or the
//! silent [`parse`]) turns source text into a [`Macro`], and the injector
//! drives that instance with `press_key` / `release_key` / `run`.
//!
//! Execution is cooperative: every instance runs as an ordinary future,
//! suspending at sleeps and at "await release", so any number of macros can
//! share one runtime and interact only through the variable store.

mod emit;
mod eval;
mod instance;

pub use instance::Macro;

pub use keyweave_compiler::{Capabilities, CompileError, MacroNode, MacroTree, is_macro};
pub use keyweave_core::config::{Config, DEFAULT_KEYSTROKE_SLEEP_MS, MappingConfig};
pub use keyweave_core::events::{EventSink, EventTriple, ecodes};
pub use keyweave_core::symbols::SymbolTable;
pub use keyweave_core::vars::{Value, VarStore};

use tracing::debug;

/// Compile macro source into a runnable [`Macro`], reporting what is wrong
/// with it. Used by the mapping editor, where the error string ends up next
/// to the offending field.
pub fn compile(source: &str, config: &MappingConfig) -> Result<Macro, CompileError> {
    compile_with(source, config, SymbolTable::builtin(), VarStore::global())
}

/// [`compile`] with explicit collaborators, for embedders that bring their
/// own symbol registry or variable store.
pub fn compile_with(
    source: &str,
    config: &MappingConfig,
    symbols: &SymbolTable,
    store: VarStore,
) -> Result<Macro, CompileError> {
    let tree = keyweave_compiler::compile_tree(source, symbols)?;
    Ok(Macro::new(source, tree, config, store))
}

/// Silent-mode parse for the injection hot path: `None` on any compile
/// error. The mapping was validated when the user wrote it, so failures here
/// are only worth a debug line.
pub fn parse(source: &str, config: &MappingConfig) -> Option<Macro> {
    match compile(source, config) {
        Ok(compiled) => Some(compiled),
        Err(err) => {
            debug!(source, %err, "not a runnable macro");
            None
        }
    }
}

#[cfg(test)]
mod eval_tests;
#[cfg(test)]
mod test_utils;
