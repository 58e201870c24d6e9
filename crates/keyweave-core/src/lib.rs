//! Shared primitives for the keyweave macro engine.
//!
//! Four small layers, consumed by the compiler and the vm:
//! - `events` - the synthetic event triple and the sink it is written to
//! - `symbols` - case-insensitive name-to-code lookup (collaborator of `k`, `m`, `e`)
//! - `config` - timing knobs with per-mapping overrides
//! - `vars` - the shared variable store feeding `set` / `ifeq`

pub mod config;
pub mod events;
pub mod symbols;
pub mod vars;

pub use config::{Config, DEFAULT_KEYSTROKE_SLEEP_MS, MappingConfig};
pub use events::{EventSink, EventTriple};
pub use symbols::SymbolTable;
pub use vars::{Value, VarStore};

#[cfg(test)]
mod config_tests;
