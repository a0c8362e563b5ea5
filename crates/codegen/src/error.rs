/// Errors that abort code generation.
///
/// All of them point at an IR/grammar mismatch upstream, never at the
/// input being parsed, and carry the names needed to fix the grammar.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// Two distinct nonterminals normalize to the same enum variant.
    #[error("{first} and {second} have the same camel-case spelling ({camel})")]
    CamelCaseCollision {
        first: String,
        second: String,
        camel: String,
    },

    #[error("terminals {first} and {second} would share the variant TerminalId::{name}")]
    TerminalNameCollision {
        first: String,
        second: String,
        name: String,
    },

    #[error("error codes '{first}' and '{second}' would share the variant ErrorCode::{name}")]
    ErrorCodeCollision {
        first: String,
        second: String,
        name: String,
    },

    /// Two goals would get the same `parse_*` entry point.
    #[error("goal nonterminals {first} and {second} would share the entry point parse_{name}")]
    GoalNameCollision {
        first: String,
        second: String,
        name: String,
    },

    #[error("production `{production}` calls unknown method '{method}'")]
    UnknownMethod { method: String, production: String },

    #[error(
        "production `{production}` calls '{method}' with {found} arguments, but it is declared with {expected}"
    )]
    ArityMismatch {
        method: String,
        production: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "production `{production}` reads slot {slot}, but it has only {concrete} concrete elements"
    )]
    SlotOutOfRange {
        slot: usize,
        concrete: usize,
        production: String,
    },

    #[error("no result type declared for nonterminal {0}")]
    MissingNonterminalType(String),

    /// A unit value was asked to live in a stack slot.
    #[error("cannot box a unit-typed value ({0})")]
    BoxedUnit(String),

    #[error("goal nonterminal {0} must not take arguments")]
    GoalWithArguments(String),

    #[error("goal nonterminal {goal} starts in state {state}, but there are only {count} states")]
    GoalStateOutOfRange {
        goal: String,
        state: usize,
        count: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
