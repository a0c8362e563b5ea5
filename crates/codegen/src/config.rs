//! Emitter configuration.
//!
//! Every field has a default, so an empty configuration file (or none at
//! all) produces output for the stock runtimes.
//!
//! # Example
//!
//! ```toml
//! [python]
//! runtime_package = "lrgen"
//!
//! [rust]
//! handler = "AstBuilder"
//! runtime_parse = "crate::parser_runtime::parse"
//! fallible_methods = ["assignment_expression"]
//! ```

use serde::{Deserialize, Serialize};

/// Method names whose builder calls return a `Result`. Grammars should
/// mark such methods `fallible` in their signatures instead; this list
/// keeps older grammars without annotations working.
pub const DEFAULT_FALLIBLE_METHODS: &[&str] = &[
    "assignment_expression",
    "compound_assignment_expression",
    "expression_to_parameter_list",
    "for_assignment_target",
    "for_await_of_statement",
    "post_decrement_expr",
    "post_increment_expr",
    "pre_decrement_expr",
    "pre_increment_expr",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    pub python: PythonConfig,
    pub rust: RustConfig,
}

/// `[python]` section: the interpreted target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Package providing the `runtime` module that walks the tables.
    pub runtime_package: String,
}

impl Default for PythonConfig {
    fn default() -> Self {
        PythonConfig {
            runtime_package: "lrgen".to_string(),
        }
    }
}

/// `[rust]` section: the compiled target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RustConfig {
    /// Paths imported at the top of the generated module, one `use` each.
    pub uses: Vec<String>,
    /// Builder type passed to `reduce` and the entry functions.
    pub handler: String,
    /// Module path prefixed to grammar-declared type names; empty for none.
    pub namespace: String,
    /// Runtime function driving the tables:
    /// `fn(&Handler, &ParserTables, usize, I) -> Result<StackValue>`.
    pub runtime_parse: String,
    pub fallible_methods: Vec<String>,
}

impl Default for RustConfig {
    fn default() -> Self {
        RustConfig {
            uses: vec![
                "ast::arena::{Box, Vec}".to_string(),
                "ast::types::*".to_string(),
                "crate::ast_builder::AstBuilder".to_string(),
                "crate::stack_value_generated::{StackValue, TryIntoStack}".to_string(),
                "crate::error::Result".to_string(),
            ],
            handler: "AstBuilder".to_string(),
            namespace: String::new(),
            runtime_parse: "crate::parser_runtime::parse".to_string(),
            fallible_methods: DEFAULT_FALLIBLE_METHODS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl RustConfig {
    pub fn is_fallible_method(&self, rust_name: &str) -> bool {
        self.fallible_methods.iter().any(|m| m == rust_name)
    }
}
