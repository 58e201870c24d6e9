//! Recursive descent over the macro grammar.
//!
//! The grammar is small enough to parse straight off the normalized source
//! string: a program is a `.`-chain of `name(arg, ...)` calls, where each
//! argument is empty, an integer, a bare or quoted word, or a nested chain.
//! Arity and argument kinds are checked while the node is built, and symbol
//! names resolve against the table right here, so a tree that parses is a
//! tree that can run.

use keyweave_core::symbols::SymbolTable;
use keyweave_core::vars::Value;

use crate::error::CompileError;
use crate::preprocess::{count_brackets, expand_plus, normalize};
use crate::tree::{Direction, MacroNode, MacroTree};

/// Nesting limit for macro expressions. Anything deeper is a runaway input,
/// not a plausible mapping.
const MAX_DEPTH: usize = 64;

/// Compile macro source text into a tree.
///
/// Applies whitespace normalization and plus expansion, then parses. The
/// whole text must form a macro; a bare word or number is rejected
/// (callers distinguish those with [`is_macro`](crate::is_macro)).
pub fn compile_tree(source: &str, symbols: &SymbolTable) -> Result<MacroTree, CompileError> {
    let text = normalize(source);
    let text = expand_plus(&text);
    match parse_recurse(&text, symbols, 0)? {
        Parsed::Tree(tree) => Ok(tree),
        Parsed::None => Err(CompileError::Empty),
        Parsed::Int(_) | Parsed::Word(_) => Err(CompileError::NotAMacro(text.into_owned())),
    }
}

/// Split a call's argument list on the commas at bracket depth zero.
///
/// Empty slots are preserved: `""` yields `[""]` and `",,"` yields
/// `["", "", ""]`, so arity checks see exactly what the user wrote.
pub fn extract_params(inner: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (position, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.push(&inner[start..position]);
                start = position + 1;
            }
            _ => {}
        }
    }
    params.push(&inner[start..]);
    params
}

/// One classified argument.
#[derive(Debug)]
pub(crate) enum Parsed {
    /// Empty slot.
    None,
    Int(i64),
    /// Bare or quoted word, quotes stripped.
    Word(String),
    /// Nested macro expression.
    Tree(MacroTree),
}

pub(crate) fn parse_recurse(
    text: &str,
    symbols: &SymbolTable,
    depth: usize,
) -> Result<Parsed, CompileError> {
    if depth > MAX_DEPTH {
        return Err(CompileError::TooDeep);
    }
    if text.is_empty() {
        return Ok(Parsed::None);
    }
    if let Some(value) = parse_int(text) {
        return Ok(Parsed::Int(value));
    }
    if text.contains('(') {
        return parse_chain(text, symbols, depth).map(Parsed::Tree);
    }
    Ok(Parsed::Word(strip_quotes(text).to_string()))
}

/// `head(args)` optionally followed by `.more(args)...`.
fn parse_chain(
    text: &str,
    symbols: &SymbolTable,
    depth: usize,
) -> Result<MacroTree, CompileError> {
    let end = count_brackets(text)?;
    let call = &text[..end];

    let open = match call.find('(') {
        Some(open) => open,
        // `count_brackets` found balanced brackets only after this chunk;
        // a chain element without a call is not a macro.
        None => return Err(CompileError::NotAMacro(call.to_string())),
    };
    if open == 0 {
        return Err(CompileError::MissingName(text.to_string()));
    }
    let head = &call[..open];
    let inner = &call[open + 1..call.len() - 1];

    let params = extract_params(inner)
        .into_iter()
        .map(|param| parse_recurse(param, symbols, depth + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let mut nodes = vec![build_node(head, params, symbols)?];

    let rest = &text[end..];
    if !rest.is_empty() {
        let Some(tail) = rest.strip_prefix('.') else {
            return Err(CompileError::TrailingInput(rest.to_string()));
        };
        match parse_recurse(tail, symbols, depth)? {
            Parsed::Tree(tree) => nodes.extend(tree.into_nodes()),
            _ => return Err(CompileError::DanglingChain),
        }
    }
    Ok(MacroTree::new(nodes))
}

/// Validate arity and argument kinds, resolve symbols, build the node.
fn build_node(
    head: &str,
    mut params: Vec<Parsed>,
    symbols: &SymbolTable,
) -> Result<MacroNode, CompileError> {
    let function = head.to_lowercase();
    match function.as_str() {
        "k" => {
            let [sym] = take(&function, "1", params)?;
            let (symbol, code) = symbol_param(&function, 1, sym, symbols)?;
            Ok(MacroNode::Key { symbol, code })
        }
        "r" => {
            let [count, body] = take(&function, "2", params)?;
            let count = int_param(&function, 1, count)?;
            let count = u32::try_from(count).map_err(|_| CompileError::OutOfRange {
                function: function.clone(),
                index: 1,
                value: count,
            })?;
            let body = tree_param(&function, 2, body)?;
            Ok(MacroNode::Repeat { count, body })
        }
        "w" => {
            let [ms] = take(&function, "1", params)?;
            let ms = int_param(&function, 1, ms)?;
            let ms = u64::try_from(ms).map_err(|_| CompileError::OutOfRange {
                function: function.clone(),
                index: 1,
                value: ms,
            })?;
            Ok(MacroNode::Wait { ms })
        }
        "h" => {
            let [body] = take(&function, "0 or 1", params)?;
            match body {
                Parsed::None => Ok(MacroNode::AwaitRelease),
                Parsed::Word(_) | Parsed::Int(_) => {
                    let (symbol, code) = symbol_param(&function, 1, body, symbols)?;
                    Ok(MacroNode::HoldKey { symbol, code })
                }
                Parsed::Tree(body) => Ok(MacroNode::HoldRepeat { body }),
            }
        }
        "m" => {
            let [sym, body] = take(&function, "2", params)?;
            let (symbol, code) = symbol_param(&function, 1, sym, symbols)?;
            let body = tree_param(&function, 2, body)?;
            Ok(MacroNode::Modify { symbol, code, body })
        }
        "mouse" | "wheel" => {
            let [direction, speed] = take(&function, "2", params)?;
            let direction = direction_param(direction)?;
            let speed = int_param(&function, 2, speed)?;
            let speed = i32::try_from(speed).map_err(|_| CompileError::OutOfRange {
                function: function.clone(),
                index: 2,
                value: speed,
            })?;
            if function == "mouse" {
                Ok(MacroNode::Mouse { direction, speed })
            } else {
                Ok(MacroNode::Wheel { direction, speed })
            }
        }
        "e" => {
            let [ev_type, code, value] = take(&function, "3", params)?;
            let ev_type = code_param(&function, 1, ev_type, symbols)?;
            let code = code_param(&function, 2, code, symbols)?;
            let value = int_param(&function, 3, value)?;
            let value = i32::try_from(value).map_err(|_| CompileError::OutOfRange {
                function: function.clone(),
                index: 3,
                value,
            })?;
            Ok(MacroNode::Event {
                ev_type,
                code,
                value,
            })
        }
        "set" => {
            let [name, value] = take(&function, "2", params)?;
            let name = name_param(&function, 1, name)?;
            let value = value_param(&function, 2, value)?;
            Ok(MacroNode::Set { name, value })
        }
        "ifeq" => {
            if !(2..=4).contains(&params.len()) {
                return Err(CompileError::ParamCount {
                    function,
                    expected: "2 to 4",
                    found: params.len(),
                });
            }
            params.resize_with(4, || Parsed::None);
            let [name, value, then_branch, else_branch] = take(&function, "2 to 4", params)?;
            let name = name_param(&function, 1, name)?;
            let value = value_param(&function, 2, value)?;
            let then_branch = branch_param(&function, 3, then_branch)?;
            let else_branch = branch_param(&function, 4, else_branch)?;
            Ok(MacroNode::IfEq {
                name,
                value,
                then_branch,
                else_branch,
            })
        }
        _ => Err(CompileError::UnknownFunction(head.to_string())),
    }
}

/// `-?[0-9]+`
fn parse_int(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Strip one pair of matching quotes, if present.
fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn take<const N: usize>(
    function: &str,
    expected: &'static str,
    params: Vec<Parsed>,
) -> Result<[Parsed; N], CompileError> {
    let found = params.len();
    <[Parsed; N]>::try_from(params).map_err(|_| CompileError::ParamCount {
        function: function.to_string(),
        expected,
        found,
    })
}

fn describe(param: &Parsed) -> String {
    match param {
        Parsed::None => "nothing".to_string(),
        Parsed::Int(n) => n.to_string(),
        Parsed::Word(w) => format!("\"{w}\""),
        Parsed::Tree(_) => "a macro".to_string(),
    }
}

/// A key name, written bare, quoted, or as a bare number (`k(1)` taps the
/// key named "1"). Resolution failures are compile errors.
fn symbol_param(
    function: &str,
    index: usize,
    param: Parsed,
    symbols: &SymbolTable,
) -> Result<(String, u16), CompileError> {
    let name = match param {
        Parsed::Int(n) => n.to_string(),
        Parsed::Word(w) => w,
        other => {
            return Err(CompileError::ExpectedSymbol {
                function: function.to_string(),
                index,
                found: describe(&other),
            });
        }
    };
    let code = symbols
        .get(&name)
        .ok_or_else(|| CompileError::UnknownSymbol(name.clone()))?;
    // names are case-insensitive; store the canonical form
    Ok((name.to_lowercase(), code))
}

/// Event type or code for `e(...)`: an integer literal, or a constant name
/// like `EV_KEY` resolved through the symbol table.
fn code_param(
    function: &str,
    index: usize,
    param: Parsed,
    symbols: &SymbolTable,
) -> Result<u16, CompileError> {
    match param {
        Parsed::Int(n) => u16::try_from(n).map_err(|_| CompileError::OutOfRange {
            function: function.to_string(),
            index,
            value: n,
        }),
        Parsed::Word(w) => symbols
            .get(&w)
            .ok_or_else(|| CompileError::UnknownSymbol(w.clone())),
        other => Err(CompileError::ExpectedInteger {
            function: function.to_string(),
            index,
            found: describe(&other),
        }),
    }
}

fn int_param(function: &str, index: usize, param: Parsed) -> Result<i64, CompileError> {
    match param {
        Parsed::Int(n) => Ok(n),
        other => Err(CompileError::ExpectedInteger {
            function: function.to_string(),
            index,
            found: describe(&other),
        }),
    }
}

fn tree_param(function: &str, index: usize, param: Parsed) -> Result<MacroTree, CompileError> {
    match param {
        Parsed::Tree(tree) => Ok(tree),
        other => Err(CompileError::ExpectedMacro {
            function: function.to_string(),
            index,
            found: describe(&other),
        }),
    }
}

/// Optional branch: an empty slot is an absent branch.
fn branch_param(
    function: &str,
    index: usize,
    param: Parsed,
) -> Result<Option<MacroTree>, CompileError> {
    match param {
        Parsed::None => Ok(None),
        other => tree_param(function, index, other).map(Some),
    }
}

fn name_param(function: &str, index: usize, param: Parsed) -> Result<String, CompileError> {
    match param {
        Parsed::Word(w) => Ok(w),
        other => Err(CompileError::ExpectedName {
            function: function.to_string(),
            index,
            found: describe(&other),
        }),
    }
}

fn value_param(function: &str, index: usize, param: Parsed) -> Result<Value, CompileError> {
    match param {
        Parsed::Int(n) => Ok(Value::Int(n)),
        Parsed::Word(w) => Ok(Value::Text(w)),
        other => Err(CompileError::ExpectedValue {
            function: function.to_string(),
            index,
            found: describe(&other),
        }),
    }
}

/// `up`, `down`, `left` or `right`, any case.
fn direction_param(param: Parsed) -> Result<Direction, CompileError> {
    match &param {
        Parsed::Word(w) => {
            Direction::from_name(w).ok_or_else(|| CompileError::UnknownDirection(describe(&param)))
        }
        _ => Err(CompileError::UnknownDirection(describe(&param))),
    }
}
