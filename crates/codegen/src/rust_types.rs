//! Translation of grammar types into Rust type syntax for the compiled
//! target, including the decision of where the arena `Box` goes.

use lrgen_ir::{Element, Grammar, Terminal, Type};

use crate::error::CodegenError;

/// Rust spelling of `ty`.
///
/// Pass `boxed = true` when the value is held in an opaque stack slot and
/// must be arena-boxed. `Box<Option<T>>` is never produced: the box moves
/// inside as `Option<Box<T>>`, so an absent value costs no allocation.
/// Sequence elements are never boxed.
pub fn type_to_rust(ty: &Type, namespace: &str, boxed: bool) -> Result<String, CodegenError> {
    let rty = match ty {
        Type::Unit => {
            if boxed {
                return Err(CodegenError::BoxedUnit(ty.to_string()));
            }
            return Ok("()".to_string());
        }
        Type::Token => "Token<'alloc>".to_string(),
        Type::Option(inner) => {
            return Ok(format!("Option<{}>", type_to_rust(inner, namespace, boxed)?));
        }
        Type::Vec(inner) => format!("Vec<'alloc, {}>", type_to_rust(inner, namespace, false)?),
        Type::Named { name, args } => {
            let mut rty = if namespace.is_empty() {
                name.clone()
            } else {
                format!("{}::{}", namespace, name)
            };
            if !args.is_empty() {
                let args = args
                    .iter()
                    .map(|arg| type_to_rust(arg, namespace, boxed))
                    .collect::<Result<Vec<_>, _>>()?;
                rty = format!("{}<{}>", rty, args.join(", "));
            }
            rty
        }
    };
    if boxed {
        Ok(format!("Box<'alloc, {}>", rty))
    } else {
        Ok(rty)
    }
}

/// Static type of the value a concrete right-hand-side element pushes.
pub fn element_type(grammar: &Grammar, element: &Element) -> Result<Type, CodegenError> {
    match element {
        Element::Terminal(t) if grammar.is_variable_terminal(t) => Ok(Type::Token),
        Element::Terminal(Terminal::ErrorToken) => Ok(Type::Token),
        Element::Terminal(_) => Ok(Type::Unit),
        Element::Nonterminal(nt) => grammar
            .nonterminal_type(nt)
            .cloned()
            .ok_or_else(|| CodegenError::MissingNonterminalType(nt.pretty())),
        Element::Optional(inner) => Ok(Type::option(element_type(grammar, inner)?)),
        Element::Elided(_) => Ok(Type::Unit),
    }
}
