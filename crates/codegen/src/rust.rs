//! Compiled target: typed enums, flat tables and a `reduce` dispatcher
//! for the Rust runtime.
//!
//! Stack values are arena-owned `StackValue`s. A popped slot is
//! downcast with the checked `to_ast()?` only when the reduction
//! expression reads it; unread slots are dropped as they are.

use indexmap::IndexSet;
use lrgen_ir::{MethodType, Nonterminal, ParserStates, Production, Terminal, ERROR};
use tracing::debug;

use crate::config::RustConfig;
use crate::error::CodegenError;
use crate::naming::{
    method_name_to_rust, nonterminal_to_camel, nonterminal_to_snake, terminal_name, to_camel,
    to_snake,
};
use crate::reduce_expr::{compile_reduce_expr, reduction_shape, ExprSyntax, ReductionShape};
use crate::rust_types::{element_type, type_to_rust};
use crate::writer::{comment_text, CodeWriter};

struct RustSyntax<'a> {
    config: &'a RustConfig,
}

impl ExprSyntax for RustSyntax<'_> {
    fn slot(&self, index: usize) -> String {
        format!("x{}", index)
    }

    fn none(&self) -> String {
        "None".to_string()
    }

    fn some(&self, inner: String) -> String {
        format!("Some({})", inner)
    }

    fn method_call(&self, tag: &str, method: &MethodType, args: Vec<String>) -> String {
        let name = method_name_to_rust(tag);
        let propagate = method.fallible || self.config.is_fallible_method(&name);
        format!(
            "handler.{}({}){}",
            name,
            args.join(", "),
            if propagate { "?" } else { "" }
        )
    }
}

pub(crate) fn write_rust_parser(
    ps: &ParserStates,
    config: &RustConfig,
) -> Result<String, CodegenError> {
    RustParserWriter::new(ps, config).emit()
}

struct RustParserWriter<'a> {
    ps: &'a ParserStates,
    config: &'a RustConfig,
    terminals: Vec<&'a Terminal>,
    nonterminals: Vec<&'a Nonterminal>,
    w: CodeWriter,
}

impl<'a> RustParserWriter<'a> {
    fn new(ps: &'a ParserStates, config: &'a RustConfig) -> Self {
        RustParserWriter {
            ps,
            config,
            terminals: ps.terminals(),
            nonterminals: ps.live_nonterminals(),
            w: CodeWriter::new(),
        }
    }

    fn emit(mut self) -> Result<String, CodegenError> {
        self.header();
        self.terminal_id();
        self.token();
        self.actions();
        self.error_codes();
        self.nonterminal_id();
        self.goto();
        self.reduce()?;
        self.reduce_simulator();
        self.tables();
        self.entry()?;
        Ok(self.w.finish())
    }

    fn is_live(&self, nt: &Nonterminal) -> bool {
        self.nonterminals.contains(&nt)
    }

    fn live_prods(&self) -> impl Iterator<Item = (usize, &'a Production)> + '_ {
        self.ps
            .prods
            .iter()
            .enumerate()
            .filter(move |(_, prod)| self.is_live(&prod.nt))
    }

    fn header(&mut self) {
        self.w.line(0, "// WARNING: This file is autogenerated.");
        self.w.blank();
        for path in &self.config.uses {
            self.w.line(0, format!("use {};", path));
        }
        self.w.blank();
        self.w.line(0, format!("const ERROR: i64 = {:#x};", ERROR));
        self.w.blank();
    }

    fn terminal_id(&mut self) {
        self.w.line(0, "#[derive(Copy, Clone, Debug, PartialEq)]");
        self.w.line(0, "pub enum TerminalId {");
        for (i, t) in self.terminals.iter().enumerate() {
            self.w.line(
                1,
                format!("{} = {}, // {}", terminal_name(t), i, comment_text(&t.to_string())),
            );
        }
        self.w.line(0, "}");
        self.w.blank();
    }

    fn token(&mut self) {
        let w = &mut self.w;
        w.line(0, "#[derive(Clone, Debug, PartialEq)]");
        w.line(0, "pub struct Token<'a> {");
        w.line(1, "pub terminal_id: TerminalId,");
        w.line(1, "pub saw_newline: bool,");
        w.line(1, "pub value: Option<&'a str>,");
        w.line(0, "}");
        w.blank();
        w.line(0, "impl Token<'_> {");
        w.line(1, "pub fn basic_token(terminal_id: TerminalId) -> Self {");
        w.line(2, "Self {");
        w.line(3, "terminal_id,");
        w.line(3, "saw_newline: false,");
        w.line(3, "value: None,");
        w.line(2, "}");
        w.line(1, "}");
        w.blank();
        // The scanned text borrows the source buffer and cannot be kept.
        w.line(1, "pub fn into_static(self) -> Token<'static> {");
        w.line(2, "Token {");
        w.line(3, "terminal_id: self.terminal_id,");
        w.line(3, "saw_newline: self.saw_newline,");
        w.line(3, "value: None,");
        w.line(2, "}");
        w.line(1, "}");
        w.line(0, "}");
        w.blank();
    }

    fn actions(&mut self) {
        let states = &self.ps.states;
        self.w.line(0, "#[rustfmt::skip]");
        self.w.line(
            0,
            format!(
                "static ACTIONS: [i64; {}] = [",
                states.len() * self.terminals.len()
            ),
        );
        for (i, state) in states.iter().enumerate() {
            self.w
                .line(1, format!("// {}. {}", i, comment_text(state.traceback_or_empty())));
            let cells: Vec<String> = self
                .terminals
                .iter()
                .map(|t| match state.action_row.get(*t) {
                    Some(code) => format!("{},", code),
                    None => "ERROR,".to_string(),
                })
                .collect();
            self.w.line(1, cells.join(" "));
            if i + 1 < states.len() {
                self.w.blank();
            }
        }
        self.w.line(0, "];");
        self.w.blank();
        debug!(
            states = states.len(),
            terminals = self.terminals.len(),
            "action table written"
        );
    }

    fn error_codes(&mut self) {
        let states = &self.ps.states;
        let codes: IndexSet<&str> = states
            .iter()
            .filter_map(|s| s.error_code.as_deref())
            .collect();

        self.w.line(0, "#[derive(Clone, Debug, PartialEq)]");
        self.w.line(0, "pub enum ErrorCode {");
        for code in &codes {
            self.w.line(1, format!("{},", to_camel(code)));
        }
        self.w.line(0, "}");
        self.w.blank();

        self.w.line(
            0,
            format!(
                "static STATE_TO_ERROR_CODE: [Option<ErrorCode>; {}] = [",
                states.len()
            ),
        );
        for (i, state) in states.iter().enumerate() {
            self.w
                .line(1, format!("// {}. {}", i, comment_text(state.traceback_or_empty())));
            match &state.error_code {
                Some(code) => self
                    .w
                    .line(1, format!("Some(ErrorCode::{}),", to_camel(code))),
                None => self.w.line(1, "None,"),
            }
        }
        self.w.line(0, "];");
        self.w.blank();
        debug!(error_codes = codes.len(), "error codes written");
    }

    fn nonterminal_id(&mut self) {
        self.w.line(0, "#[derive(Clone, Copy, Debug, PartialEq)]");
        self.w.line(0, "pub enum NonterminalId {");
        for (i, nt) in self.nonterminals.iter().enumerate() {
            self.w
                .line(1, format!("{} = {},", nonterminal_to_camel(nt), i));
        }
        self.w.line(0, "}");
        self.w.blank();
    }

    fn goto(&mut self) {
        let states = &self.ps.states;
        self.w.line(0, "#[rustfmt::skip]");
        self.w.line(
            0,
            format!(
                "static GOTO: [u16; {}] = [",
                states.len() * self.nonterminals.len()
            ),
        );
        for state in states {
            let cells: Vec<String> = self
                .nonterminals
                .iter()
                .map(|nt| format!("{},", state.goto_row.get(*nt).copied().unwrap_or(0)))
                .collect();
            self.w.line(1, cells.join(" "));
        }
        self.w.line(0, "];");
        self.w.blank();
        debug!(nonterminals = self.nonterminals.len(), "goto table written");
    }

    /// One match arm per production of a live nonterminal. Goal
    /// productions are accepted, never reduced, so they get no arm.
    fn reduce(&mut self) -> Result<(), CodegenError> {
        // `std::vec::Vec` because the header imports the arena `Vec`.
        self.w.line(0, "pub fn reduce<'alloc>(");
        self.w
            .line(1, format!("handler: &{}<'alloc>,", self.config.handler));
        self.w.line(1, "prod: usize,");
        self.w
            .line(1, "stack: &mut std::vec::Vec<StackValue<'alloc>>,");
        self.w.line(0, ") -> Result<'alloc, NonterminalId> {");
        self.w.line(1, "match prod {");

        let prods: Vec<(usize, &Production)> = self.live_prods().collect();
        for (index, prod) in &prods {
            self.reduce_arm(*index, prod)?;
        }

        self.w
            .line(2, "_ => panic!(\"no such production: {}\", prod),");
        self.w.line(1, "}");
        self.w.line(0, "}");
        self.w.blank();
        debug!(arms = prods.len(), "reduce dispatcher written");
        Ok(())
    }

    fn reduce_arm(&mut self, index: usize, prod: &Production) -> Result<(), CodegenError> {
        let syntax = RustSyntax {
            config: self.config,
        };
        let compiled = compile_reduce_expr(&syntax, &self.ps.grammar, prod)?;
        let shape = reduction_shape(prod);

        self.w.line(2, format!("{} => {{", index));
        self.w.line(3, format!("// {}", comment_text(&prod.to_string())));

        if shape != ReductionShape::Trivial {
            let elements = prod.concrete_elements();
            for (slot, element) in elements.iter().enumerate().rev() {
                if !compiled.slots_read.contains(&slot) {
                    self.w.line(3, "stack.pop();");
                } else if shape == ReductionShape::Discarding {
                    self.w
                        .line(3, format!("let x{} = stack.pop().unwrap();", slot));
                } else {
                    let ty = element_type(&self.ps.grammar, element)?;
                    let rust_ty = type_to_rust(&ty, &self.config.namespace, true)?;
                    self.w.line(
                        3,
                        format!("let x{}: {} = stack.pop().unwrap().to_ast()?;", slot, rust_ty),
                    );
                }
            }
            if shape == ReductionShape::Discarding {
                self.w.line(3, format!("stack.push({});", compiled.text));
            } else {
                self.w.line(
                    3,
                    format!("stack.push(TryIntoStack::try_into_stack({})?);", compiled.text),
                );
            }
        }

        self.w.line(
            3,
            format!("Ok(NonterminalId::{})", nonterminal_to_camel(&prod.nt)),
        );
        self.w.line(2, "}");
        Ok(())
    }

    fn reduce_simulator(&mut self) {
        let rows: Vec<String> = self
            .live_prods()
            .map(|(_, prod)| {
                format!(
                    "({}, NonterminalId::{}),",
                    prod.concrete_len(),
                    nonterminal_to_camel(&prod.nt)
                )
            })
            .collect();
        self.w.line(
            0,
            format!(
                "static REDUCE_SIMULATOR: [(usize, NonterminalId); {}] = [",
                rows.len()
            ),
        );
        for row in rows {
            self.w.line(1, row);
        }
        self.w.line(0, "];");
        self.w.blank();
    }

    fn tables(&mut self) {
        let w = &mut self.w;
        w.line(0, "#[derive(Clone, Copy)]");
        w.line(0, "pub struct ParserTables<'a> {");
        w.line(1, "pub state_count: usize,");
        w.line(1, "pub action_table: &'a [i64],");
        w.line(1, "pub action_width: usize,");
        w.line(1, "pub error_codes: &'a [Option<ErrorCode>],");
        w.line(1, "pub reduce_simulator: &'a [(usize, NonterminalId)],");
        w.line(1, "pub goto_table: &'a [u16],");
        w.line(1, "pub goto_width: usize,");
        w.line(0, "}");
        w.blank();
        w.line(0, "impl<'a> ParserTables<'a> {");
        w.line(1, "pub fn check(&self) {");
        w.line(
            2,
            "assert_eq!(self.action_table.len(), self.state_count * self.action_width);",
        );
        w.line(
            2,
            "assert_eq!(self.goto_table.len(), self.state_count * self.goto_width);",
        );
        w.line(1, "}");
        w.line(0, "}");
        w.blank();

        w.line(0, "pub static TABLES: ParserTables<'static> = ParserTables {");
        w.line(1, format!("state_count: {},", self.ps.states.len()));
        w.line(1, "action_table: &ACTIONS,");
        w.line(1, format!("action_width: {},", self.terminals.len()));
        w.line(1, "error_codes: &STATE_TO_ERROR_CODE,");
        w.line(1, "reduce_simulator: &REDUCE_SIMULATOR,");
        w.line(1, "goto_table: &GOTO,");
        w.line(1, format!("goto_width: {},", self.nonterminals.len()));
        w.line(0, "};");
        w.blank();
    }

    /// Start-state constants and one typed parse function per goal.
    fn entry(&mut self) -> Result<(), CodegenError> {
        for (goal, state) in &self.ps.init_state_map {
            let konst = start_state_name(goal);
            self.w
                .line(0, format!("pub static {}: usize = {};", konst, state));
            self.w.blank();
        }

        for goal in self.ps.init_state_map.keys() {
            let ty = self
                .ps
                .grammar
                .nonterminal_type(goal)
                .ok_or_else(|| CodegenError::MissingNonterminalType(goal.pretty()))?;
            let rust_ty = type_to_rust(ty, &self.config.namespace, true)?;

            self.w.line(
                0,
                format!("pub fn parse_{}<'alloc, I>(", nonterminal_to_snake(goal)),
            );
            self.w
                .line(1, format!("handler: &{}<'alloc>,", self.config.handler));
            self.w.line(1, "tokens: I,");
            self.w.line(0, format!(") -> Result<'alloc, {}>", rust_ty));
            self.w.line(0, "where");
            self.w.line(1, "I: IntoIterator<Item = Token<'alloc>>,");
            self.w.line(0, "{");
            self.w.line(
                1,
                format!(
                    "let value = {}(handler, &TABLES, {}, tokens)?;",
                    self.config.runtime_parse,
                    start_state_name(goal)
                ),
            );
            self.w.line(1, "value.to_ast()");
            self.w.line(0, "}");
            self.w.blank();
        }
        debug!(goals = self.ps.init_state_map.len(), "entry points written");
        Ok(())
    }
}

fn start_state_name(goal: &Nonterminal) -> String {
    format!("START_STATE_{}", to_snake(&goal.name).to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use lrgen_ir::{Element, Grammar, ReduceExpr, State, Type};

    fn nt(name: &str) -> Nonterminal {
        Nonterminal::new(name)
    }

    fn sym(text: &str) -> Element {
        Element::Terminal(Terminal::symbol(text))
    }

    /// `Expr ::= NUM | Expr "+" NUM`, `Paren ::= "(" Expr ")"`.
    fn sample() -> ParserStates {
        let mut grammar = Grammar::default();
        grammar.variable_terminals.insert("NUM".to_string());
        grammar
            .nonterminal_types
            .insert("Expr".to_string(), Type::named("Expr"));
        grammar
            .nonterminal_types
            .insert("Paren".to_string(), Type::named("Expr"));
        grammar.methods.insert(
            "num".to_string(),
            MethodType::new(vec![Type::Token], Type::named("Expr")),
        );
        grammar.methods.insert(
            "add".to_string(),
            MethodType::new(
                vec![Type::named("Expr"), Type::Unit, Type::Token],
                Type::named("Expr"),
            ),
        );

        let prods = vec![
            Production {
                nt: nt("Expr"),
                rhs: vec![sym("NUM")],
                reducer: ReduceExpr::call("num", vec![ReduceExpr::Slot(0)]),
                goal: false,
            },
            Production {
                nt: nt("Expr"),
                rhs: vec![Element::Nonterminal(nt("Expr")), sym("+"), sym("NUM")],
                reducer: ReduceExpr::call(
                    "add",
                    vec![ReduceExpr::Slot(0), ReduceExpr::Slot(1), ReduceExpr::Slot(2)],
                ),
                goal: false,
            },
            Production {
                nt: nt("Paren"),
                rhs: vec![sym("("), Element::Nonterminal(nt("Expr")), sym(")")],
                reducer: ReduceExpr::Slot(1),
                goal: false,
            },
            Production {
                nt: nt("Expr"),
                rhs: vec![Element::Nonterminal(nt("Paren"))],
                reducer: ReduceExpr::Slot(0),
                goal: false,
            },
            Production {
                nt: nt("Start"),
                rhs: vec![Element::Nonterminal(nt("Expr"))],
                reducer: ReduceExpr::Slot(0),
                goal: true,
            },
        ];

        let mut s0 = State::default();
        s0.action_row.insert(Terminal::symbol("NUM"), 1);
        s0.action_row.insert(Terminal::symbol("("), 4);
        s0.goto_row.insert(nt("Expr"), 2);
        s0.goto_row.insert(nt("Paren"), 3);
        let mut s1 = State::default();
        s1.action_row.insert(Terminal::symbol("+"), -1);
        s1.action_row.insert(Terminal::End, -1);
        s1.error_code = Some("expected_number".to_string());
        s1.traceback = Some("Expr NUM".to_string());

        let mut init_state_map = IndexMap::new();
        init_state_map.insert(nt("Expr"), 0);
        ParserStates {
            grammar,
            states: vec![s0, s1],
            prods,
            init_state_map,
        }
    }

    fn render(ps: &ParserStates) -> String {
        write_rust_parser(ps, &RustConfig::default()).unwrap()
    }

    #[test]
    fn test_header_uses_configured_imports() {
        let config = RustConfig {
            uses: vec!["my_ast::*".to_string()],
            ..RustConfig::default()
        };
        let out = write_rust_parser(&sample(), &config).unwrap();
        assert!(out.starts_with(
            "// WARNING: This file is autogenerated.\n\nuse my_ast::*;\n\nconst ERROR: i64 = 0x7fffffffffffffff;\n"
        ));
    }

    #[test]
    fn test_terminal_enum_and_action_table() {
        let out = render(&sample());
        assert!(out.contains("    Num = 0, // \"NUM\"\n"));
        assert!(out.contains("    LeftParenthesis = 1, // \"(\"\n"));
        assert!(out.contains("    PlusSign = 2, // \"+\"\n"));
        assert!(out.contains("    End = 3, // <END>\n"));
        assert!(out.contains("static ACTIONS: [i64; 8] = [\n"));
        assert!(out.contains("    // 0. <empty>\n    1, 4, ERROR, ERROR,\n\n    // 1. Expr NUM\n    ERROR, ERROR, -1, -1,\n];\n"));
    }

    #[test]
    fn test_error_codes_and_goto() {
        let out = render(&sample());
        assert!(out.contains("pub enum ErrorCode {\n    ExpectedNumber,\n}\n"));
        assert!(out.contains("    None,\n    // 1. Expr NUM\n    Some(ErrorCode::ExpectedNumber),\n"));
        assert!(out.contains("pub enum NonterminalId {\n    Expr = 0,\n    Paren = 1,\n}\n"));
        assert!(out.contains("static GOTO: [u16; 4] = [\n    2, 3,\n    0, 0,\n];\n"));
    }

    #[test]
    fn test_full_reduction_downcasts_read_slots_only() {
        let out = render(&sample());
        let arm = "        1 => {\n            // Expr ::= Expr \"+\" \"NUM\" => add($0, $1, $2)\n            let x2: Box<'alloc, Token<'alloc>> = stack.pop().unwrap().to_ast()?;\n            stack.pop();\n            let x0: Box<'alloc, Expr> = stack.pop().unwrap().to_ast()?;\n            stack.push(TryIntoStack::try_into_stack(handler.add(x0, x2))?);\n            Ok(NonterminalId::Expr)\n        }\n";
        assert!(out.contains(arm), "missing arm in:\n{}", out);
    }

    #[test]
    fn test_discarding_and_trivial_reductions() {
        let out = render(&sample());
        let discarding = "            stack.pop();\n            let x1 = stack.pop().unwrap();\n            stack.pop();\n            stack.push(x1);\n            Ok(NonterminalId::Paren)\n";
        assert!(out.contains(discarding), "missing arm in:\n{}", out);
        let trivial = "        3 => {\n            // Expr ::= Paren => $0\n            Ok(NonterminalId::Expr)\n        }\n";
        assert!(out.contains(trivial), "missing arm in:\n{}", out);
    }

    #[test]
    fn test_goal_production_has_no_arm() {
        let out = render(&sample());
        assert!(!out.contains("        4 => {"));
        assert!(out.contains("static REDUCE_SIMULATOR: [(usize, NonterminalId); 4] = [\n    (1, NonterminalId::Expr),\n    (3, NonterminalId::Expr),\n    (3, NonterminalId::Paren),\n    (1, NonterminalId::Expr),\n];\n"));
    }

    #[test]
    fn test_tables_and_entry_points() {
        let out = render(&sample());
        assert!(out.contains("    state_count: 2,\n"));
        assert!(out.contains("    action_width: 4,\n"));
        assert!(out.contains("    goto_width: 2,\n"));
        assert!(out.contains("pub static START_STATE_EXPR: usize = 0;\n"));
        assert!(out.contains("pub fn parse_expr<'alloc, I>(\n    handler: &AstBuilder<'alloc>,\n    tokens: I,\n) -> Result<'alloc, Box<'alloc, Expr>>\n"));
        assert!(out.contains(
            "    let value = crate::parser_runtime::parse(handler, &TABLES, START_STATE_EXPR, tokens)?;\n"
        ));
    }

    #[test]
    fn test_fallible_by_signature_or_allow_list() {
        let mut ps = sample();
        ps.grammar.methods["num"].fallible = true;
        let out = render(&ps);
        assert!(out.contains("handler.num(x0)?"));
        assert!(!out.contains("handler.add(x0, x2)?"));

        let config = RustConfig {
            fallible_methods: vec!["add".to_string()],
            ..RustConfig::default()
        };
        let out = write_rust_parser(&sample(), &config).unwrap();
        assert!(out.contains("handler.add(x0, x2)?"));
        assert!(!out.contains("handler.num(x0)?"));
    }

    #[test]
    fn test_namespace_and_handler() {
        let config = RustConfig {
            namespace: "ast".to_string(),
            handler: "TreeBuilder".to_string(),
            ..RustConfig::default()
        };
        let out = write_rust_parser(&sample(), &config).unwrap();
        assert!(out.contains("let x0: Box<'alloc, ast::Expr> = stack.pop().unwrap().to_ast()?;"));
        assert!(out.contains("    handler: &TreeBuilder<'alloc>,\n    prod: usize,\n"));
    }

    #[test]
    fn test_reading_unit_slot_is_rejected() {
        let mut ps = sample();
        ps.prods[2].reducer = ReduceExpr::some(ReduceExpr::Slot(0));
        let err = write_rust_parser(&ps, &RustConfig::default()).unwrap_err();
        assert!(matches!(err, CodegenError::BoxedUnit(_)));
    }

    #[test]
    fn test_missing_goal_type() {
        let mut ps = sample();
        ps.grammar.nonterminal_types.shift_remove("Expr");
        ps.prods.truncate(1);
        let err = write_rust_parser(&ps, &RustConfig::default()).unwrap_err();
        assert!(matches!(err, CodegenError::MissingNonterminalType(name) if name == "Expr"));
    }
}
