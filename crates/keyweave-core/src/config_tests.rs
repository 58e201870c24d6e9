use std::sync::Arc;

use crate::config::{Config, DEFAULT_KEYSTROKE_SLEEP_MS, MappingConfig};

#[test]
fn default_when_nothing_is_set() {
    let mapping = MappingConfig::default();
    assert_eq!(mapping.keystroke_sleep_ms(), DEFAULT_KEYSTROKE_SLEEP_MS);
}

#[test]
fn global_shadows_default() {
    let mut global = Config::new();
    global.set_keystroke_sleep_ms(100);
    let mapping = MappingConfig::new(Arc::new(global));
    assert_eq!(mapping.keystroke_sleep_ms(), 100);
}

#[test]
fn mapping_shadows_global() {
    let mut global = Config::new();
    global.set_keystroke_sleep_ms(100);
    let mut mapping = MappingConfig::new(Arc::new(global));
    mapping.set_keystroke_sleep_ms(50);
    assert_eq!(mapping.keystroke_sleep_ms(), 50);
}

#[test]
fn global_is_shared_between_mappings() {
    let mut global = Config::new();
    global.set_keystroke_sleep_ms(25);
    let global = Arc::new(global);

    let a = MappingConfig::new(Arc::clone(&global));
    let b = MappingConfig::new(global);
    assert_eq!(a.keystroke_sleep_ms(), 25);
    assert_eq!(b.keystroke_sleep_ms(), 25);
}

#[test]
fn from_json() {
    let config = Config::from_json(r#"{"keystroke_sleep_ms": 42}"#).unwrap();
    assert_eq!(config.keystroke_sleep_ms(), Some(42));

    let config = Config::from_json("{}").unwrap();
    assert_eq!(config.keystroke_sleep_ms(), None);
}
