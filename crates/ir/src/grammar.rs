//! Grammar symbols, productions, reduction expressions and method
//! metadata.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::types::Type;

/// A terminal symbol as it appears in action rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    /// A lexical symbol, keyed by its literal text (`"+"`, `"if"`, `"NUM"`).
    Symbol(String),
    /// End of input.
    End,
    /// The error-token sentinel used for error recovery.
    ErrorToken,
}

impl Terminal {
    pub fn symbol(text: impl Into<String>) -> Self {
        Terminal::Symbol(text.into())
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Symbol(text) => write!(f, "{:?}", text),
            Terminal::End => write!(f, "<END>"),
            Terminal::ErrorToken => write!(f, "ErrorToken"),
        }
    }
}

/// A nonterminal: a name plus its bound arguments, if the grammar
/// parameterizes it (`Expression[+In]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nonterminal {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<(String, bool)>,
}

impl Nonterminal {
    pub fn new(name: impl Into<String>) -> Self {
        Nonterminal {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: &[(&str, bool)]) -> Self {
        Nonterminal {
            name: name.into(),
            args: args
                .iter()
                .map(|(param, value)| (param.to_string(), *value))
                .collect(),
        }
    }

    /// Grammar-notation spelling: `Name` or `Name[+In, ~Yield]`.
    pub fn pretty(&self) -> String {
        if self.args.is_empty() {
            return self.name.clone();
        }
        let args: Vec<String> = self
            .args
            .iter()
            .map(|(param, value)| format!("{}{}", if *value { '+' } else { '~' }, param))
            .collect();
        format!("{}[{}]", self.name, args.join(", "))
    }
}

impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}

/// One element of a production's right-hand side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Terminal(Terminal),
    Nonterminal(Nonterminal),
    Optional(Box<Element>),
    /// Matched by the automaton but never pushed on the value stack
    /// (lookahead restrictions, `[no LineTerminator here]`, elided
    /// punctuation). The text is only used in comments.
    Elided(String),
}

impl Element {
    /// Whether this element occupies a value-stack slot at parse time.
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Element::Elided(_))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Terminal(t) => write!(f, "{}", t),
            Element::Nonterminal(nt) => write!(f, "{}", nt),
            Element::Optional(inner) => write!(f, "{}?", inner),
            Element::Elided(text) => write!(f, "[{}]", text),
        }
    }
}

/// A method invocation inside a reduction expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodCall {
    /// Method tag: a bare name, or `"<nonterminal> <n>"` when one
    /// nonterminal has several reduction shapes.
    pub method: String,
    pub args: Vec<ReduceExpr>,
}

/// How a production computes its value from its right-hand-side slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceExpr {
    /// The value of the i-th concrete element (0-based).
    Slot(usize),
    None,
    Some(Box<ReduceExpr>),
    Call(MethodCall),
}

impl ReduceExpr {
    pub fn call(method: impl Into<String>, args: Vec<ReduceExpr>) -> Self {
        ReduceExpr::Call(MethodCall {
            method: method.into(),
            args,
        })
    }

    pub fn some(inner: ReduceExpr) -> Self {
        ReduceExpr::Some(Box::new(inner))
    }
}

impl fmt::Display for ReduceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReduceExpr::Slot(i) => write!(f, "${}", i),
            ReduceExpr::None => write!(f, "None"),
            ReduceExpr::Some(inner) => write!(f, "Some({})", inner),
            ReduceExpr::Call(call) => {
                let args: Vec<String> = call.args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", call.method, args.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub nt: Nonterminal,
    pub rhs: Vec<Element>,
    pub reducer: ReduceExpr,
    /// Augmented start production: accepted, never reduced.
    #[serde(default)]
    pub goal: bool,
}

impl Production {
    pub fn concrete_elements(&self) -> Vec<&Element> {
        self.rhs.iter().filter(|e| e.is_concrete()).collect()
    }

    pub fn concrete_len(&self) -> usize {
        self.rhs.iter().filter(|e| e.is_concrete()).count()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ::=", self.nt)?;
        if self.rhs.is_empty() {
            write!(f, " [empty]")?;
        }
        for e in &self.rhs {
            write!(f, " {}", e)?;
        }
        write!(f, " => {}", self.reducer)
    }
}

/// Declared signature of a builder method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodType {
    pub argument_types: Vec<Type>,
    pub return_type: Type,
    /// The method can fail and its result must be propagated.
    #[serde(default)]
    pub fallible: bool,
}

impl MethodType {
    pub fn new(argument_types: Vec<Type>, return_type: Type) -> Self {
        MethodType {
            argument_types,
            return_type,
            fallible: false,
        }
    }

    /// Arguments that carry a runtime value.
    pub fn value_arity(&self) -> usize {
        self.argument_types.iter().filter(|t| !t.is_unit()).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grammar {
    /// Declared result type per nonterminal base name.
    #[serde(default)]
    pub nonterminal_types: IndexMap<String, Type>,
    #[serde(default)]
    pub methods: IndexMap<String, MethodType>,
    /// Terminals whose tokens carry a scanned value (identifiers,
    /// literals), as opposed to keywords and punctuation.
    #[serde(default)]
    pub variable_terminals: IndexSet<String>,
}

impl Grammar {
    pub fn method(&self, tag: &str) -> Option<&MethodType> {
        self.methods.get(tag)
    }

    pub fn nonterminal_type(&self, nt: &Nonterminal) -> Option<&Type> {
        self.nonterminal_types.get(&nt.name)
    }

    pub fn is_variable_terminal(&self, t: &Terminal) -> bool {
        match t {
            Terminal::Symbol(text) => self.variable_terminals.contains(text),
            Terminal::End | Terminal::ErrorToken => false,
        }
    }
}
