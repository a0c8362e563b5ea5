//! The grammar-level type algebra.
//!
//! Types are written in the IR as `{"name": ..., "args": [...]}`. Loading
//! classifies them into the closed [`Type`] enum and rejects any shape
//! that does not fit it, so the emitters never see a malformed type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A grammar-level type: the declared type of a nonterminal, a method
/// argument, or a method result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TypeRepr", into = "TypeRepr")]
pub enum Type {
    /// No runtime value (constant terminals, unit-returning methods).
    Unit,
    /// A scanned token.
    Token,
    Option(Box<Type>),
    /// A growable sequence.
    Vec(Box<Type>),
    /// A grammar-declared type, possibly generic.
    Named { name: String, args: Vec<Type> },
}

impl Type {
    pub fn named(name: impl Into<String>) -> Self {
        Type::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn option(inner: Type) -> Self {
        Type::Option(Box::new(inner))
    }

    pub fn vec(inner: Type) -> Self {
        Type::Vec(Box::new(inner))
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Type::Unit)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => write!(f, "()"),
            Type::Token => write!(f, "Token"),
            Type::Option(inner) => write!(f, "Option<{}>", inner),
            Type::Vec(inner) => write!(f, "Vec<{}>", inner),
            Type::Named { name, args } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// A type written in the IR that does not fit the type algebra.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type shape {shape}: {reason}")]
pub struct TypeShapeError {
    pub shape: String,
    pub reason: String,
}

/// Wire form of [`Type`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TypeRepr {
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<TypeRepr>,
}

fn spelling(name: &str, args: &[TypeRepr]) -> String {
    if args.is_empty() {
        name.to_string()
    } else {
        let args: Vec<String> = args.iter().map(|a| spelling(&a.name, &a.args)).collect();
        format!("{}<{}>", name, args.join(", "))
    }
}

impl TryFrom<TypeRepr> for Type {
    type Error = TypeShapeError;

    fn try_from(repr: TypeRepr) -> Result<Self, Self::Error> {
        let TypeRepr { name, args } = repr;
        let shape_error = |reason: String| TypeShapeError {
            shape: spelling(&name, &args),
            reason,
        };

        match name.as_str() {
            "" => Err(shape_error("type name is empty".to_string())),
            "()" | "Token" if !args.is_empty() => {
                Err(shape_error("takes no type arguments".to_string()))
            }
            "()" => Ok(Type::Unit),
            "Token" => Ok(Type::Token),
            "Option" | "Vec" if args.len() != 1 => Err(shape_error(format!(
                "expects exactly one type argument, got {}",
                args.len()
            ))),
            "Option" | "Vec" => {
                let is_option = name == "Option";
                let mut args = args;
                let inner = Type::try_from(args.remove(0))?;
                Ok(if is_option {
                    Type::option(inner)
                } else {
                    Type::vec(inner)
                })
            }
            _ => {
                let args = args
                    .into_iter()
                    .map(Type::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Type::Named { name, args })
            }
        }
    }
}

impl From<Type> for TypeRepr {
    fn from(ty: Type) -> Self {
        let leaf = |name: &str| TypeRepr {
            name: name.to_string(),
            args: Vec::new(),
        };
        match ty {
            Type::Unit => leaf("()"),
            Type::Token => leaf("Token"),
            Type::Option(inner) => TypeRepr {
                name: "Option".to_string(),
                args: vec![TypeRepr::from(*inner)],
            },
            Type::Vec(inner) => TypeRepr {
                name: "Vec".to_string(),
                args: vec![TypeRepr::from(*inner)],
            },
            Type::Named { name, args } => TypeRepr {
                name,
                args: args.into_iter().map(TypeRepr::from).collect(),
            },
        }
    }
}
