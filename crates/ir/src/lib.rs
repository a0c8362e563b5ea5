//! lrgen-ir: the parser-table IR consumed by the lrgen emitters.
//!
//! The automaton builder upstream produces a [`ParserStates`] value: the
//! grammar metadata (declared nonterminal types, method signatures, the
//! set of terminals that carry a scanned value), the LR states with their
//! action and goto rows, the productions with their reduction
//! expressions, and the entry state of every goal nonterminal.
//!
//! Nothing in this crate mutates the IR after loading. Every collection
//! that the emitters iterate is an ordered one (`Vec`, `IndexMap`,
//! `IndexSet`), so the order of the JSON document is the order of the
//! generated code.

pub mod deserialize;
pub mod grammar;
pub mod states;
pub mod types;

pub use deserialize::{from_json, from_value, IrError};
pub use grammar::{
    Element, Grammar, MethodCall, MethodType, Nonterminal, Production, ReduceExpr, Terminal,
};
pub use states::{ParserStates, State, ERROR};
pub use types::{Type, TypeShapeError};
