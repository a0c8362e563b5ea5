//! lrgen-codegen: parser source emitters for LR automata.
//!
//! Consumes a [`ParserStates`] produced by the table builder and renders
//! one self-contained source unit for the selected [`Target`]:
//! Python tables plus reducer lambdas for the interpreted runtime, or
//! typed Rust enums, flat tables and a `reduce` dispatcher for the
//! compiled runtime.
//!
//! Both targets share the identifier normalizer ([`naming`]) and the
//! reduction-expression compiler ([`reduce_expr`]); the Rust target
//! adds the type translator ([`rust_types`]).

pub mod config;
pub mod error;
pub mod naming;
mod python;
pub mod reduce_expr;
mod rust;
pub mod rust_types;
mod writer;

use std::fmt;
use std::io::Write;

use lrgen_ir::ParserStates;
use tracing::debug;

pub use config::{EmitConfig, PythonConfig, RustConfig, DEFAULT_FALLIBLE_METHODS};
pub use error::CodegenError;

/// Output language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Table-walking Python runtime.
    Python,
    /// Statically typed Rust runtime.
    Rust,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Python => write!(f, "python"),
            Target::Rust => write!(f, "rust"),
        }
    }
}

/// Render the whole output unit for `target` into a string.
///
/// Nothing is rendered if the goal map or the nonterminal names are
/// unusable; see [`check`].
pub fn render(
    ps: &ParserStates,
    target: Target,
    config: &EmitConfig,
) -> Result<String, CodegenError> {
    check(ps)?;
    let text = match target {
        Target::Python => python::write_python_parser(ps, &config.python)?,
        Target::Rust => rust::write_rust_parser(ps, &config.rust)?,
    };
    debug!(%target, bytes = text.len(), "rendered parser");
    Ok(text)
}

/// Render for `target` and write the result to `out`.
///
/// `out` is written only once rendering succeeded, so a failed
/// generation leaves it untouched.
pub fn generate<W: Write>(
    out: &mut W,
    ps: &ParserStates,
    target: Target,
    config: &EmitConfig,
) -> Result<(), CodegenError> {
    let text = render(ps, target, config)?;
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Target-independent checks run before any emission: goals must take
/// no arguments and start in an existing state. Live nonterminals,
/// terminals, error codes and goals must each keep distinct spellings
/// once normalized.
pub fn check(ps: &ParserStates) -> Result<(), CodegenError> {
    for (goal, &state) in &ps.init_state_map {
        if !goal.args.is_empty() {
            return Err(CodegenError::GoalWithArguments(goal.pretty()));
        }
        if state >= ps.states.len() {
            return Err(CodegenError::GoalStateOutOfRange {
                goal: goal.pretty(),
                state,
                count: ps.states.len(),
            });
        }
    }
    naming::check_camel_case(&ps.live_nonterminals())?;
    naming::check_terminal_names(&ps.terminals())?;
    naming::check_error_codes(ps.states.iter().filter_map(|s| s.error_code.as_deref()))?;
    naming::check_goal_names(ps.init_state_map.keys())?;
    Ok(())
}
