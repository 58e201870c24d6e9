//! The macro tree and its static capability analysis.
//!
//! A tree is immutable once parsed; the evaluator only reads it. Symbol
//! names are resolved to codes at parse time, so nodes carry both the name
//! (for display) and the code (for emission).

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use keyweave_core::events::ecodes;
use keyweave_core::vars::Value;

/// Direction argument of `mouse(...)` and `wheel(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// `up` and `left` move toward negative coordinates.
    pub fn sign(self) -> i32 {
        match self {
            Self::Up | Self::Left => -1,
            Self::Down | Self::Right => 1,
        }
    }

    /// Axis for relative pointer motion.
    pub fn pointer_axis(self) -> u16 {
        match self {
            Self::Up | Self::Down => ecodes::REL_Y,
            Self::Left | Self::Right => ecodes::REL_X,
        }
    }

    /// Axis for wheel motion.
    pub fn wheel_axis(self) -> u16 {
        match self {
            Self::Up | Self::Down => ecodes::REL_WHEEL,
            Self::Left | Self::Right => ecodes::REL_HWHEEL,
        }
    }
}

/// One operation of a parsed macro.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroNode {
    /// `k(sym)` - tap: down, sleep, up, sleep.
    Key { symbol: String, code: u16 },
    /// `r(n, body)` - run the body `n` times.
    Repeat { count: u32, body: MacroTree },
    /// `w(ms)` - sleep.
    Wait { ms: u64 },
    /// `h()` - block until the trigger key is released.
    AwaitRelease,
    /// `h(sym)` - keep the key down while the trigger is held.
    HoldKey { symbol: String, code: u16 },
    /// `h(body)` - repeat the body while the trigger is held.
    HoldRepeat { body: MacroTree },
    /// `m(sym, body)` - modifier: down, body, up.
    Modify {
        symbol: String,
        code: u16,
        body: MacroTree,
    },
    /// `mouse(dir, speed)` - relative pointer motion while held.
    Mouse { direction: Direction, speed: i32 },
    /// `wheel(dir, speed)` - wheel motion while held.
    Wheel { direction: Direction, speed: i32 },
    /// `e(type, code, value)` - one raw event.
    Event { ev_type: u16, code: u16, value: i32 },
    /// `set(name, value)` - write to the shared variable store.
    Set { name: String, value: Value },
    /// `ifeq(name, value, then, else)` - branch on the shared store.
    IfEq {
        name: String,
        value: Value,
        then_branch: Option<MacroTree>,
        else_branch: Option<MacroTree>,
    },
}

/// A parsed macro: a sequence of operations, linearised from the `.`-chain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MacroTree {
    nodes: Vec<MacroNode>,
}

impl MacroTree {
    pub(crate) fn new(nodes: Vec<MacroNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[MacroNode] {
        &self.nodes
    }

    pub(crate) fn into_nodes(self) -> Vec<MacroNode> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every `(event type, code)` pair this macro could ever emit, regardless
    /// of hold timing or variable state. The injector uses this to declare
    /// its virtual device once, before anything runs.
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        for node in &self.nodes {
            node.collect_capabilities(&mut caps);
        }
        caps
    }

    /// Indented one-line-per-node rendering for diagnostics and tests.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        dump_into(&mut out, self, 0);
        out
    }
}

impl MacroNode {
    fn collect_capabilities(&self, caps: &mut Capabilities) {
        match self {
            MacroNode::Key { code, .. } | MacroNode::HoldKey { code, .. } => {
                caps.add(ecodes::EV_KEY, *code);
            }
            MacroNode::Modify { code, body, .. } => {
                caps.add(ecodes::EV_KEY, *code);
                for node in body.nodes() {
                    node.collect_capabilities(caps);
                }
            }
            MacroNode::Repeat { body, .. } | MacroNode::HoldRepeat { body } => {
                for node in body.nodes() {
                    node.collect_capabilities(caps);
                }
            }
            // All relative axes are advertised no matter the direction, so a
            // consumer can register the device once and reuse it when the
            // user edits the direction.
            MacroNode::Mouse { .. } | MacroNode::Wheel { .. } => {
                caps.add(ecodes::EV_REL, ecodes::REL_X);
                caps.add(ecodes::EV_REL, ecodes::REL_Y);
                caps.add(ecodes::EV_REL, ecodes::REL_WHEEL);
                caps.add(ecodes::EV_REL, ecodes::REL_HWHEEL);
            }
            MacroNode::Event { ev_type, code, .. } => {
                caps.add(*ev_type, *code);
            }
            MacroNode::IfEq {
                then_branch,
                else_branch,
                ..
            } => {
                for branch in [then_branch, else_branch].into_iter().flatten() {
                    for node in branch.nodes() {
                        node.collect_capabilities(caps);
                    }
                }
            }
            MacroNode::Wait { .. } | MacroNode::AwaitRelease | MacroNode::Set { .. } => {}
        }
    }
}

/// Static map from event type to the codes a macro may emit on it.
///
/// Always carries (possibly empty) entries for the key and relative event
/// types, since those are what virtual input devices register up front.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Capabilities {
    map: IndexMap<u16, IndexSet<u16>>,
}

impl Capabilities {
    pub fn new() -> Self {
        let mut map = IndexMap::new();
        map.insert(ecodes::EV_KEY, IndexSet::new());
        map.insert(ecodes::EV_REL, IndexSet::new());
        Self { map }
    }

    pub(crate) fn add(&mut self, ev_type: u16, code: u16) {
        self.map.entry(ev_type).or_default().insert(code);
    }

    /// Codes for one event type; `None` if the type never occurs.
    pub fn codes(&self, ev_type: u16) -> Option<&IndexSet<u16>> {
        self.map.get(&ev_type)
    }

    pub fn contains(&self, ev_type: u16, code: u16) -> bool {
        self.map
            .get(&ev_type)
            .is_some_and(|codes| codes.contains(&code))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &IndexSet<u16>)> {
        self.map.iter().map(|(ev_type, codes)| (*ev_type, codes))
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new()
    }
}

fn dump_into(out: &mut String, tree: &MacroTree, indent: usize) {
    for node in tree.nodes() {
        let pad = "  ".repeat(indent);
        match node {
            MacroNode::Key { symbol, code } => {
                out.push_str(&format!("{pad}Key \"{symbol}\" ({code})\n"));
            }
            MacroNode::Repeat { count, body } => {
                out.push_str(&format!("{pad}Repeat {count}\n"));
                dump_into(out, body, indent + 1);
            }
            MacroNode::Wait { ms } => {
                out.push_str(&format!("{pad}Wait {ms}\n"));
            }
            MacroNode::AwaitRelease => {
                out.push_str(&format!("{pad}AwaitRelease\n"));
            }
            MacroNode::HoldKey { symbol, code } => {
                out.push_str(&format!("{pad}HoldKey \"{symbol}\" ({code})\n"));
            }
            MacroNode::HoldRepeat { body } => {
                out.push_str(&format!("{pad}HoldRepeat\n"));
                dump_into(out, body, indent + 1);
            }
            MacroNode::Modify { symbol, code, body } => {
                out.push_str(&format!("{pad}Modify \"{symbol}\" ({code})\n"));
                dump_into(out, body, indent + 1);
            }
            MacroNode::Mouse { direction, speed } => {
                out.push_str(&format!("{pad}Mouse {} {speed}\n", direction.name()));
            }
            MacroNode::Wheel { direction, speed } => {
                out.push_str(&format!("{pad}Wheel {} {speed}\n", direction.name()));
            }
            MacroNode::Event {
                ev_type,
                code,
                value,
            } => {
                out.push_str(&format!("{pad}Event {ev_type} {code} {value}\n"));
            }
            MacroNode::Set { name, value } => {
                out.push_str(&format!("{pad}Set {name} = {value}\n"));
            }
            MacroNode::IfEq {
                name,
                value,
                then_branch,
                else_branch,
            } => {
                out.push_str(&format!("{pad}IfEq {name} == {value}\n"));
                if let Some(branch) = then_branch {
                    out.push_str(&format!("{pad}  then:\n"));
                    dump_into(out, branch, indent + 2);
                }
                if let Some(branch) = else_branch {
                    out.push_str(&format!("{pad}  else:\n"));
                    dump_into(out, branch, indent + 2);
                }
            }
        }
    }
}
