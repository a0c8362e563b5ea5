//! LR states and the `ParserStates` aggregate handed to the emitters.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::deserialize::pairs;
use crate::grammar::{Grammar, Nonterminal, Production, Terminal};

/// Action code stored in every action-table cell with no entry.
pub const ERROR: i64 = 0x7fff_ffff_ffff_ffff;

/// One automaton state, exactly as the table builder left it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Terminal -> shift/reduce/accept code.
    #[serde(with = "pairs", default)]
    pub action_row: IndexMap<Terminal, i64>,
    /// Nonterminal -> state entered after reducing to it.
    #[serde(with = "pairs", default)]
    pub goto_row: IndexMap<Nonterminal, usize>,
    /// Diagnostic tag reported on a syntax error in this state.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Derivation trace; only ever emitted as a comment.
    #[serde(default)]
    pub traceback: Option<String>,
}

impl State {
    pub fn traceback_or_empty(&self) -> &str {
        match self.traceback.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => "<empty>",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserStates {
    pub grammar: Grammar,
    pub states: Vec<State>,
    pub prods: Vec<Production>,
    /// Goal nonterminal -> entry state.
    #[serde(with = "pairs")]
    pub init_state_map: IndexMap<Nonterminal, usize>,
}

impl ParserStates {
    /// Every terminal mentioned by some action row, in first-appearance
    /// order. These are the action table's columns.
    pub fn terminals(&self) -> Vec<&Terminal> {
        let set: IndexSet<&Terminal> = self
            .states
            .iter()
            .flat_map(|s| s.action_row.keys())
            .collect();
        set.into_iter().collect()
    }

    /// Every nonterminal mentioned by some goto row, in first-appearance
    /// order. Goal-only nonterminals never appear here.
    pub fn live_nonterminals(&self) -> Vec<&Nonterminal> {
        let set: IndexSet<&Nonterminal> = self
            .states
            .iter()
            .flat_map(|s| s.goto_row.keys())
            .collect();
        set.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(actions: &[(Terminal, i64)], gotos: &[(&str, usize)]) -> State {
        State {
            action_row: actions.iter().cloned().collect(),
            goto_row: gotos
                .iter()
                .map(|(nt, s)| (Nonterminal::new(*nt), *s))
                .collect(),
            error_code: None,
            traceback: None,
        }
    }

    #[test]
    fn test_terminals_first_appearance_order() {
        let ps = ParserStates {
            states: vec![
                state(&[(Terminal::symbol("b"), 1), (Terminal::symbol("a"), 2)], &[]),
                state(&[(Terminal::End, -1), (Terminal::symbol("b"), 3)], &[]),
            ],
            ..Default::default()
        };
        assert_eq!(
            ps.terminals(),
            vec![&Terminal::symbol("b"), &Terminal::symbol("a"), &Terminal::End]
        );
    }

    #[test]
    fn test_live_nonterminals_deduplicated() {
        let ps = ParserStates {
            states: vec![
                state(&[], &[("Expr", 1), ("Term", 2)]),
                state(&[], &[("Term", 4), ("Factor", 5)]),
            ],
            ..Default::default()
        };
        let names: Vec<&str> = ps
            .live_nonterminals()
            .iter()
            .map(|nt| nt.name.as_str())
            .collect();
        assert_eq!(names, vec!["Expr", "Term", "Factor"]);
    }

    #[test]
    fn test_traceback_placeholder() {
        let mut s = State::default();
        assert_eq!(s.traceback_or_empty(), "<empty>");
        s.traceback = Some(String::new());
        assert_eq!(s.traceback_or_empty(), "<empty>");
        s.traceback = Some("Expr \"+\"".to_string());
        assert_eq!(s.traceback_or_empty(), "Expr \"+\"");
    }
}
