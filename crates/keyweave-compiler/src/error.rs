//! Compile errors.
//!
//! Message wording is part of the contract with the mapping editor: bracket
//! problems mention "bracket", unknown names are quoted verbatim, so the GUI
//! can surface them next to the offending field.

use thiserror::Error;

/// Errors produced while turning macro source text into a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("found {opening} opening and {closing} closing brackets")]
    UnbalancedBrackets { opening: usize, closing: usize },

    #[error("closing bracket without a matching opening bracket")]
    StrayClosingBracket,

    #[error("unknown function \"{0}\"")]
    UnknownFunction(String),

    #[error("unknown symbol \"{0}\"")]
    UnknownSymbol(String),

    #[error("unknown direction {0}, expected up, down, left or right")]
    UnknownDirection(String),

    #[error("{function} expects {expected} parameters but got {found}")]
    ParamCount {
        function: String,
        expected: &'static str,
        found: usize,
    },

    #[error("{function} parameter {index} must be an integer, got {found}")]
    ExpectedInteger {
        function: String,
        index: usize,
        found: String,
    },

    #[error("{function} parameter {index} must be a macro, got {found}")]
    ExpectedMacro {
        function: String,
        index: usize,
        found: String,
    },

    #[error("{function} parameter {index} must be a key symbol, got {found}")]
    ExpectedSymbol {
        function: String,
        index: usize,
        found: String,
    },

    #[error("{function} parameter {index} must be a variable name, got {found}")]
    ExpectedName {
        function: String,
        index: usize,
        found: String,
    },

    #[error("{function} parameter {index} must be a literal value, got {found}")]
    ExpectedValue {
        function: String,
        index: usize,
        found: String,
    },

    #[error("{function} parameter {index} is out of range: {value}")]
    OutOfRange {
        function: String,
        index: usize,
        value: i64,
    },

    #[error("missing function name in \"{0}\"")]
    MissingName(String),

    #[error("unexpected trailing input \"{0}\"")]
    TrailingInput(String),

    #[error("expected another call after \".\"")]
    DanglingChain,

    #[error("macro is nested too deeply")]
    TooDeep,

    #[error("empty macro")]
    Empty,

    #[error("\"{0}\" is not a macro")]
    NotAMacro(String),
}
