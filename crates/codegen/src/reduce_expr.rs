//! Compilation of reduction expressions into target expressions.
//!
//! The recursion is shared; each target supplies its concrete syntax
//! through [`ExprSyntax`]. Compilation also records which value-stack
//! slots the expression reads, so the compiled emitter only downcasts
//! the values that are actually used.

use std::collections::BTreeSet;

use lrgen_ir::{Grammar, MethodType, Production, ReduceExpr};

use crate::error::CodegenError;

/// Target-specific spelling of the reduction-expression forms.
pub trait ExprSyntax {
    /// Local holding the value popped for concrete element `index`.
    fn slot(&self, index: usize) -> String;
    fn none(&self) -> String;
    fn some(&self, inner: String) -> String;
    /// A builder call; `args` already excludes unit-typed parameters.
    fn method_call(&self, tag: &str, method: &MethodType, args: Vec<String>) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpr {
    pub text: String,
    pub slots_read: BTreeSet<usize>,
}

/// How much stack work a reduction needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionShape {
    /// One concrete element reduced by `$0`: the stack is left as is.
    Trivial,
    /// The reducer is a bare slot: that value is re-pushed without a
    /// downcast, since its type cannot have changed.
    Discarding,
    /// Pop, downcast the used values, evaluate, push.
    Full,
}

pub fn reduction_shape(prod: &Production) -> ReductionShape {
    match prod.reducer {
        ReduceExpr::Slot(0) if prod.concrete_len() == 1 => ReductionShape::Trivial,
        ReduceExpr::Slot(_) => ReductionShape::Discarding,
        _ => ReductionShape::Full,
    }
}

/// Compile `prod`'s reducer for one target.
pub fn compile_reduce_expr<S>(
    syntax: &S,
    grammar: &Grammar,
    prod: &Production,
) -> Result<CompiledExpr, CodegenError>
where
    S: ExprSyntax + ?Sized,
{
    let mut compiler = Compiler {
        syntax,
        grammar,
        prod,
        concrete: prod.concrete_len(),
        slots_read: BTreeSet::new(),
    };
    let text = compiler.compile(&prod.reducer)?;
    Ok(CompiledExpr {
        text,
        slots_read: compiler.slots_read,
    })
}

struct Compiler<'a, S: ?Sized> {
    syntax: &'a S,
    grammar: &'a Grammar,
    prod: &'a Production,
    concrete: usize,
    slots_read: BTreeSet<usize>,
}

impl<S: ExprSyntax + ?Sized> Compiler<'_, S> {
    fn compile(&mut self, expr: &ReduceExpr) -> Result<String, CodegenError> {
        match expr {
            ReduceExpr::Slot(i) => {
                if *i >= self.concrete {
                    return Err(CodegenError::SlotOutOfRange {
                        slot: *i,
                        concrete: self.concrete,
                        production: self.prod.to_string(),
                    });
                }
                self.slots_read.insert(*i);
                Ok(self.syntax.slot(*i))
            }
            ReduceExpr::None => Ok(self.syntax.none()),
            ReduceExpr::Some(inner) => {
                let inner = self.compile(inner)?;
                Ok(self.syntax.some(inner))
            }
            ReduceExpr::Call(call) => {
                let grammar = self.grammar;
                let method =
                    grammar
                        .method(&call.method)
                        .ok_or_else(|| CodegenError::UnknownMethod {
                            method: call.method.clone(),
                            production: self.prod.to_string(),
                        })?;
                if method.argument_types.len() != call.args.len() {
                    return Err(CodegenError::ArityMismatch {
                        method: call.method.clone(),
                        production: self.prod.to_string(),
                        expected: method.argument_types.len(),
                        found: call.args.len(),
                    });
                }
                let mut args = Vec::with_capacity(call.args.len());
                for (ty, arg) in method.argument_types.iter().zip(&call.args) {
                    // Unit arguments carry no value; their slots stay unread.
                    if !ty.is_unit() {
                        args.push(self.compile(arg)?);
                    }
                }
                Ok(self.syntax.method_call(&call.method, method, args))
            }
        }
    }
}
