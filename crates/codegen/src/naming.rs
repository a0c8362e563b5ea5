//! Identifier normalization: grammar names to target identifiers.
//!
//! [`to_snake`] and [`to_camel`] are context-free string functions. The
//! nonterminal and method helpers build on them, and
//! [`check_camel_case`] rejects grammars where two nonterminals would
//! share an enum variant.

use indexmap::IndexMap;
use lrgen_ir::{Nonterminal, Terminal};
use tracing::debug;

use crate::error::CodegenError;

/// Terminals whose spelled-out names would be unreadable.
const TERMINAL_NAMES: &[(&str, &str)] = &[("=>", "Arrow")];

/// `HTMLParser` -> `html_parser`, `fooBar` -> `foo_bar`.
///
/// Inserts `_` before a capitalized lowercase run that follows any
/// character, then before an uppercase letter that follows a lowercase
/// letter or digit, then lowercases the result.
pub fn to_snake(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();

    // Pass 1: `(.)([A-Z][a-z]+)` -> `\1_\2`, non-overlapping, left to right.
    let mut pass1 = Vec::with_capacity(chars.len() + 4);
    let mut i = 0;
    while i < chars.len() {
        let run_end = if i + 2 < chars.len()
            && chars[i] != '\n'
            && chars[i + 1].is_ascii_uppercase()
            && chars[i + 2].is_ascii_lowercase()
        {
            let mut j = i + 3;
            while j < chars.len() && chars[j].is_ascii_lowercase() {
                j += 1;
            }
            Some(j)
        } else {
            None
        };
        match run_end {
            Some(j) => {
                pass1.push(chars[i]);
                pass1.push('_');
                pass1.extend_from_slice(&chars[i + 1..j]);
                i = j;
            }
            None => {
                pass1.push(chars[i]);
                i += 1;
            }
        }
    }

    // Pass 2: `([a-z0-9])([A-Z])` -> `\1_\2`.
    let mut out = String::with_capacity(pass1.len() + 4);
    let mut i = 0;
    while i < pass1.len() {
        let c = pass1[i];
        if i + 1 < pass1.len()
            && (c.is_ascii_lowercase() || c.is_ascii_digit())
            && pass1[i + 1].is_ascii_uppercase()
        {
            out.push(c);
            out.push('_');
            out.push(pass1[i + 1]);
            i += 2;
        } else {
            out.push(c);
            i += 1;
        }
    }
    out.to_lowercase()
}

/// `foo_bar` -> `FooBar`, `foo` -> `Foo`; mixed-case names without an
/// underscore are returned unchanged so camel-case grammar names survive.
pub fn to_camel(ident: &str) -> String {
    if ident.contains('_') {
        ident.split('_').map(capitalize).collect()
    } else if is_lower(ident) {
        capitalize(ident)
    } else {
        ident.to_string()
    }
}

/// First character uppercased, the rest lowercased.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Has a cased character and no uppercase ones.
fn is_lower(s: &str) -> bool {
    s.chars().any(char::is_lowercase) && !s.chars().any(char::is_uppercase)
}

fn is_upper(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

/// Base name plus one segment per argument bound to true:
/// `Expression[+In, ~Yield]` -> `expression_in`.
pub fn nonterminal_to_snake(nt: &Nonterminal) -> String {
    let mut name = to_snake(&nt.name);
    for (param, value) in &nt.args {
        if *value {
            name.push('_');
            name.push_str(&to_snake(param));
        }
    }
    name
}

pub fn nonterminal_to_camel(nt: &Nonterminal) -> String {
    to_camel(&nonterminal_to_snake(nt))
}

/// `"BindingList 2"` -> `binding_list_p2`.
pub fn method_name_to_rust(tag: &str) -> String {
    match tag.split_once(' ') {
        Some((nt_name, number)) => format!("{}_p{}", to_snake(nt_name), number),
        None => to_snake(tag),
    }
}

/// `"BindingList 2"` -> `BindingList_P2`.
pub fn method_name_to_python(tag: &str) -> String {
    tag.replace(' ', "_P")
}

/// Enum variant for a terminal: `"+"` -> `PlusSign`, `"if"` -> `If`.
pub fn terminal_name(t: &Terminal) -> String {
    let text = match t {
        Terminal::End => return "End".to_string(),
        Terminal::ErrorToken => return "ErrorToken".to_string(),
        Terminal::Symbol(text) => text,
    };

    if let Some((_, name)) = TERMINAL_NAMES.iter().find(|(sym, _)| *sym == text.as_str()) {
        return name.to_string();
    }

    if !text.is_empty() && text.chars().all(char::is_alphabetic) {
        if is_lower(text) || is_upper(text) {
            capitalize(text)
        } else {
            text.clone()
        }
    } else {
        let raw_name: Vec<String> = text.chars().map(char_name).collect();
        let snake_case = raw_name
            .join(" ")
            .replace('-', " ")
            .replace(' ', "_")
            .to_lowercase();
        to_camel(&snake_case)
    }
}

/// Unicode character name, for the characters terminals are made of.
fn char_name(c: char) -> String {
    let name = match c {
        ' ' => "SPACE",
        '!' => "EXCLAMATION MARK",
        '"' => "QUOTATION MARK",
        '#' => "NUMBER SIGN",
        '$' => "DOLLAR SIGN",
        '%' => "PERCENT SIGN",
        '&' => "AMPERSAND",
        '\'' => "APOSTROPHE",
        '(' => "LEFT PARENTHESIS",
        ')' => "RIGHT PARENTHESIS",
        '*' => "ASTERISK",
        '+' => "PLUS SIGN",
        ',' => "COMMA",
        '-' => "HYPHEN-MINUS",
        '.' => "FULL STOP",
        '/' => "SOLIDUS",
        ':' => "COLON",
        ';' => "SEMICOLON",
        '<' => "LESS-THAN SIGN",
        '=' => "EQUALS SIGN",
        '>' => "GREATER-THAN SIGN",
        '?' => "QUESTION MARK",
        '@' => "COMMERCIAL AT",
        '[' => "LEFT SQUARE BRACKET",
        '\\' => "REVERSE SOLIDUS",
        ']' => "RIGHT SQUARE BRACKET",
        '^' => "CIRCUMFLEX ACCENT",
        '_' => "LOW LINE",
        '`' => "GRAVE ACCENT",
        '{' => "LEFT CURLY BRACKET",
        '|' => "VERTICAL LINE",
        '}' => "RIGHT CURLY BRACKET",
        '~' => "TILDE",
        '0'..='9' => {
            const DIGITS: [&str; 10] = [
                "ZERO", "ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE",
            ];
            return format!("DIGIT {}", DIGITS[c as usize - '0' as usize]);
        }
        'A'..='Z' => return format!("LATIN CAPITAL LETTER {}", c),
        'a'..='z' => return format!("LATIN SMALL LETTER {}", c.to_ascii_uppercase()),
        _ => return format!("U{:04X}", c as u32),
    };
    name.to_string()
}

/// Fail if two distinct nonterminals share a camel-case spelling.
pub fn check_camel_case(nonterminals: &[&Nonterminal]) -> Result<(), CodegenError> {
    let mut seen: IndexMap<String, &Nonterminal> = IndexMap::new();
    for &nt in nonterminals {
        let camel = nonterminal_to_camel(nt);
        if let Some(prev) = seen.get(&camel) {
            return Err(CodegenError::CamelCaseCollision {
                first: prev.pretty(),
                second: nt.pretty(),
                camel,
            });
        }
        seen.insert(camel, nt);
    }
    debug!(count = seen.len(), "nonterminal names are distinct");
    Ok(())
}

/// Fail if two distinct terminals share a `TerminalId` variant
/// (`"num"` and `"NUM"`, or a symbol spelled `end`).
pub fn check_terminal_names(terminals: &[&Terminal]) -> Result<(), CodegenError> {
    let mut seen: IndexMap<String, &Terminal> = IndexMap::new();
    for &t in terminals {
        let name = terminal_name(t);
        if let Some(prev) = seen.get(&name) {
            return Err(CodegenError::TerminalNameCollision {
                first: prev.to_string(),
                second: t.to_string(),
                name,
            });
        }
        seen.insert(name, t);
    }
    Ok(())
}

/// Fail if two distinct error codes share an `ErrorCode` variant
/// (`"missing_semi"` and `"Missing_Semi"`).
pub fn check_error_codes<'a, I>(codes: I) -> Result<(), CodegenError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: IndexMap<String, &str> = IndexMap::new();
    for code in codes {
        let name = to_camel(code);
        match seen.get(&name) {
            Some(&prev) if prev != code => {
                return Err(CodegenError::ErrorCodeCollision {
                    first: prev.to_string(),
                    second: code.to_string(),
                    name,
                });
            }
            Some(_) => {}
            None => {
                seen.insert(name, code);
            }
        }
    }
    Ok(())
}

/// Fail if two goals share a snake-case spelling, which names both their
/// start-state constant and their parse function.
pub fn check_goal_names<'a, I>(goals: I) -> Result<(), CodegenError>
where
    I: IntoIterator<Item = &'a Nonterminal>,
{
    let mut seen: IndexMap<String, &Nonterminal> = IndexMap::new();
    for goal in goals {
        let name = to_snake(&goal.name);
        if let Some(prev) = seen.get(&name) {
            return Err(CodegenError::GoalNameCollision {
                first: prev.pretty(),
                second: goal.pretty(),
                name,
            });
        }
        seen.insert(name, goal);
    }
    Ok(())
}
