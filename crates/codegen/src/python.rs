//! Interpreted target: Python tables plus reducer lambdas for a runtime
//! that walks them by indexing.

use lrgen_ir::{MethodType, ParserStates, Terminal};
use tracing::debug;

use crate::config::PythonConfig;
use crate::error::CodegenError;
use crate::naming::method_name_to_python;
use crate::reduce_expr::{compile_reduce_expr, ExprSyntax};
use crate::writer::{comment_text, CodeWriter};

/// Error codes per line of the `error_codes` list.
const ERROR_CODES_PER_LINE: usize = 16;

struct PythonSyntax;

impl ExprSyntax for PythonSyntax {
    fn slot(&self, index: usize) -> String {
        format!("x{}", index)
    }

    fn none(&self) -> String {
        "None".to_string()
    }

    // Optional values are plain values or None at run time.
    fn some(&self, inner: String) -> String {
        inner
    }

    fn method_call(&self, tag: &str, _method: &MethodType, args: Vec<String>) -> String {
        format!("builder.{}({})", method_name_to_python(tag), args.join(", "))
    }
}

pub(crate) fn write_python_parser(
    ps: &ParserStates,
    config: &PythonConfig,
) -> Result<String, CodegenError> {
    let mut w = CodeWriter::new();
    header(&mut w, ps, config);
    actions(&mut w, ps);
    ctns(&mut w, ps);
    error_codes(&mut w, ps);
    reductions(&mut w, ps)?;
    default_builder(&mut w, ps);
    goals(&mut w, ps);
    parser_class(&mut w, ps);
    Ok(w.finish())
}

fn header(w: &mut CodeWriter, ps: &ParserStates, config: &PythonConfig) {
    w.line(0, format!("from {} import runtime", config.runtime_package));
    let uses_error_token = ps
        .states
        .iter()
        .any(|s| s.action_row.contains_key(&Terminal::ErrorToken));
    if uses_error_token {
        w.line(
            0,
            format!("from {}.runtime import ErrorToken", config.runtime_package),
        );
    }
    w.blank();
}

fn actions(w: &mut CodeWriter, ps: &ParserStates) {
    w.line(0, "actions = [");
    for (i, state) in ps.states.iter().enumerate() {
        w.line(1, format!("# {}. {}", i, comment_text(state.traceback_or_empty())));
        let entries: Vec<String> = state
            .action_row
            .iter()
            .map(|(t, code)| format!("{}: {}", py_terminal(t), code))
            .collect();
        w.line(1, format!("{{{}}},", entries.join(", ")));
        w.blank();
    }
    w.line(0, "]");
    w.blank();
}

fn ctns(w: &mut CodeWriter, ps: &ParserStates) {
    w.line(0, "ctns = [");
    for state in &ps.states {
        let entries: Vec<String> = state
            .goto_row
            .iter()
            .map(|(nt, target)| format!("{}: {}", py_str(&nt.pretty()), target))
            .collect();
        w.line(1, format!("{{{}}},", entries.join(", ")));
    }
    w.line(0, "]");
    w.blank();
    debug!(states = ps.states.len(), "python tables written");
}

fn error_codes(w: &mut CodeWriter, ps: &ParserStates) {
    w.line(0, "error_codes = [");
    for chunk in ps.states.chunks(ERROR_CODES_PER_LINE) {
        let codes: Vec<String> = chunk
            .iter()
            .map(|s| format!("{},", py_opt_str(s.error_code.as_deref())))
            .collect();
        w.line(1, codes.join(" "));
    }
    w.line(0, "]");
    w.blank();
}

fn reductions(w: &mut CodeWriter, ps: &ParserStates) -> Result<(), CodegenError> {
    w.line(0, "reductions = [");
    let mut count = 0;
    for (index, prod) in ps.prods.iter().enumerate() {
        if prod.goal {
            continue;
        }
        let compiled = compile_reduce_expr(&PythonSyntax, &ps.grammar, prod)?;
        let arity = prod.concrete_len();
        let mut params = vec!["builder".to_string()];
        params.extend((0..arity).map(|i| format!("x{}", i)));
        w.line(1, format!("# {}. {}", index, comment_text(&prod.to_string())));
        w.line(
            1,
            format!(
                "({}, {}, lambda {}: {}),",
                py_str(&prod.nt.pretty()),
                arity,
                params.join(", "),
                compiled.text
            ),
        );
        count += 1;
    }
    w.line(0, "]");
    w.blank();
    w.blank();
    debug!(reductions = count, "python reductions written");
    Ok(())
}

/// Builder returning `(tag, args...)` tuples, used when the caller
/// supplies none.
fn default_builder(w: &mut CodeWriter, ps: &ParserStates) {
    w.line(0, "class DefaultBuilder:");
    if ps.grammar.methods.is_empty() {
        w.line(1, "pass");
    }
    for (tag, method) in &ps.grammar.methods {
        let args: Vec<String> = (0..method.value_arity()).map(|i| format!("x{}", i)).collect();
        let mut params = vec!["self".to_string()];
        params.extend(args.iter().cloned());
        let tuple = if args.is_empty() {
            format!("({},)", py_str(tag))
        } else {
            format!("({}, {})", py_str(tag), args.join(", "))
        };
        w.line(
            1,
            format!(
                "def {}({}): return {}",
                method_name_to_python(tag),
                params.join(", "),
                tuple
            ),
        );
    }
    w.blank();
    w.blank();
}

fn goals(w: &mut CodeWriter, ps: &ParserStates) {
    w.line(0, "goal_nt_to_init_state = {");
    for (goal, state) in &ps.init_state_map {
        w.line(1, format!("{}: {},", py_str(&goal.name), state));
    }
    w.line(0, "}");
    w.blank();
}

fn parser_class(w: &mut CodeWriter, ps: &ParserStates) {
    let default_goal = match ps.init_state_map.keys().next() {
        Some(goal) if ps.init_state_map.len() == 1 => format!("={}", py_str(&goal.name)),
        _ => String::new(),
    };
    w.line(0, "class Parser(runtime.Parser):");
    w.line(
        1,
        format!("def __init__(self, goal{}, builder=None):", default_goal),
    );
    w.line(2, "if builder is None:");
    w.line(3, "builder = DefaultBuilder()");
    w.line(2, "super().__init__(actions, ctns, reductions, error_codes,");
    w.line(2, "                 goal_nt_to_init_state[goal], builder)");
}

// ── Python literals ──────────────────────────────────────────────────

/// Dictionary key for a terminal: the end marker is `None` and the error
/// token is the runtime's sentinel object.
fn py_terminal(t: &Terminal) -> String {
    match t {
        Terminal::Symbol(text) => py_str(text),
        Terminal::End => "None".to_string(),
        Terminal::ErrorToken => "ErrorToken".to_string(),
    }
}

fn py_opt_str(s: Option<&str>) -> String {
    match s {
        Some(s) => py_str(s),
        None => "None".to_string(),
    }
}

/// String literal spelled the way Python's `repr` spells it.
pub(crate) fn py_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => {
                let code = c as u32;
                if code < 0x100 {
                    out.push_str(&format!("\\x{:02x}", code));
                } else if code < 0x10000 {
                    out.push_str(&format!("\\u{:04x}", code));
                } else {
                    out.push_str(&format!("\\U{:08x}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Characters `repr` keeps as-is. Controls, separators other than the
/// ASCII space, format characters and private-use code points are
/// escaped. Unassigned code points pass through.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c as u32,
        0xad | 0x600..=0x605
            | 0x61c
            | 0x6dd
            | 0x70f
            | 0x180e
            | 0x200b..=0x200f
            | 0x202a..=0x202e
            | 0x2060..=0x2064
            | 0x2066..=0x206f
            | 0xe000..=0xf8ff
            | 0xfeff
            | 0xfff9..=0xfffb
            | 0xe0001
            | 0xe0020..=0xe007f
            | 0xf0000..=0x10ffff
    )
}
