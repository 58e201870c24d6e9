//! Case-insensitive symbol table mapping human-readable names to codes.
//!
//! The surrounding system owns the real name registry (it knows the attached
//! devices); the engine only needs lookup. [`SymbolTable::builtin`] provides
//! a default covering the common keyboard range plus the `EV_*`/`REL_*`
//! constant names that `e(...)` accepts.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::events::ecodes;

/// Name-to-code lookup, case-insensitive on the name.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    map: HashMap<String, u16>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name. Stored lowercased; later inserts win.
    pub fn insert(&mut self, name: &str, code: u16) {
        self.map.insert(name.to_lowercase(), code);
    }

    /// Resolve a name, ignoring case.
    pub fn get(&self, name: &str) -> Option<u16> {
        self.map.get(&name.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> {
        self.map.iter().map(|(name, code)| (name.as_str(), *code))
    }

    /// The process-wide default table.
    ///
    /// Keyboard keys are registered under their `key_*` name and the short
    /// alias (`key_a` and `a`), buttons and event-type constants under their
    /// canonical name only.
    pub fn builtin() -> &'static SymbolTable {
        static BUILTIN: LazyLock<SymbolTable> = LazyLock::new(|| {
            let mut table = SymbolTable::new();
            for &(name, code) in KEYS {
                table.insert(name, code);
                // key_a -> a, key_1 -> 1, key_minus -> minus
                if let Some(short) = name.strip_prefix("key_") {
                    table.insert(short, code);
                }
            }
            for &(name, code) in CONSTANTS {
                table.insert(name, code);
            }
            table
        });
        &BUILTIN
    }
}

/// Keyboard range of the Linux key code table.
const KEYS: &[(&str, u16)] = &[
    ("key_esc", 1),
    ("key_1", 2),
    ("key_2", 3),
    ("key_3", 4),
    ("key_4", 5),
    ("key_5", 6),
    ("key_6", 7),
    ("key_7", 8),
    ("key_8", 9),
    ("key_9", 10),
    ("key_0", 11),
    ("key_minus", 12),
    ("key_equal", 13),
    ("key_backspace", 14),
    ("key_tab", 15),
    ("key_q", 16),
    ("key_w", 17),
    ("key_e", 18),
    ("key_r", 19),
    ("key_t", 20),
    ("key_y", 21),
    ("key_u", 22),
    ("key_i", 23),
    ("key_o", 24),
    ("key_p", 25),
    ("key_leftbrace", 26),
    ("key_rightbrace", 27),
    ("key_enter", 28),
    ("key_leftctrl", 29),
    ("key_a", 30),
    ("key_s", 31),
    ("key_d", 32),
    ("key_f", 33),
    ("key_g", 34),
    ("key_h", 35),
    ("key_j", 36),
    ("key_k", 37),
    ("key_l", 38),
    ("key_semicolon", 39),
    ("key_apostrophe", 40),
    ("key_grave", 41),
    ("key_leftshift", 42),
    ("key_backslash", 43),
    ("key_z", 44),
    ("key_x", 45),
    ("key_c", 46),
    ("key_v", 47),
    ("key_b", 48),
    ("key_n", 49),
    ("key_m", 50),
    ("key_comma", 51),
    ("key_dot", 52),
    ("key_slash", 53),
    ("key_rightshift", 54),
    ("key_kpasterisk", 55),
    ("key_leftalt", 56),
    ("key_space", 57),
    ("key_capslock", 58),
    ("key_f1", 59),
    ("key_f2", 60),
    ("key_f3", 61),
    ("key_f4", 62),
    ("key_f5", 63),
    ("key_f6", 64),
    ("key_f7", 65),
    ("key_f8", 66),
    ("key_f9", 67),
    ("key_f10", 68),
    ("key_rightctrl", 97),
    ("key_rightalt", 100),
    ("key_home", 102),
    ("key_up", 103),
    ("key_pageup", 104),
    ("key_left", 105),
    ("key_right", 106),
    ("key_end", 107),
    ("key_down", 108),
    ("key_pagedown", 109),
    ("key_insert", 110),
    ("key_delete", 111),
    ("key_mute", 113),
    ("key_volumedown", 114),
    ("key_volumeup", 115),
    ("key_leftmeta", 125),
];

/// Buttons and event-type constants accepted by `e(type, code, value)`.
const CONSTANTS: &[(&str, u16)] = &[
    ("btn_left", ecodes::BTN_LEFT),
    ("btn_right", ecodes::BTN_RIGHT),
    ("btn_middle", ecodes::BTN_MIDDLE),
    ("btn_side", ecodes::BTN_SIDE),
    ("btn_extra", ecodes::BTN_EXTRA),
    ("ev_syn", ecodes::EV_SYN),
    ("ev_key", ecodes::EV_KEY),
    ("ev_rel", ecodes::EV_REL),
    ("ev_abs", ecodes::EV_ABS),
    ("rel_x", ecodes::REL_X),
    ("rel_y", ecodes::REL_Y),
    ("rel_z", ecodes::REL_Z),
    ("rel_hwheel", ecodes::REL_HWHEEL),
    ("rel_wheel", ecodes::REL_WHEEL),
];
