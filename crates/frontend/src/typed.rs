#![forbid(unsafe_code)]

use crate::ast::{BinaryOp, Literal, Quantifier, UnaryOp};
use crate::builtins::{BuiltinMember, Conversion};
use crate::registry::MemberDecl;
use crate::types::Type;

/// A type-checked expression node. Every node carries its resolved type; all
/// name resolution has already happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedExpr {
    pub kind: TypedKind,
    pub ty: Type,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedKind {
    Literal(Literal),
    Subject,
    /// Comprehension loop variable, addressed by its binding depth.
    Local(usize),
    Field(TypedField),
    Builtin(BuiltinCall),
    Extension(ExtensionCall),
    Convert(Conversion, Box<TypedExpr>),
    Comprehension(TypedComprehension),
    Unary(UnaryOp, Box<TypedExpr>),
    Binary(Box<TypedExpr>, BinaryOp, Box<TypedExpr>),
    Conditional(Box<TypedConditional>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedField {
    pub base: Box<TypedExpr>,
    pub shape: String,
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinCall {
    pub base: Box<TypedExpr>,
    pub member: BuiltinMember,
    pub args: Vec<TypedExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionCall {
    pub base: Box<TypedExpr>,
    pub decl: MemberDecl,
    pub args: Vec<TypedExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedComprehension {
    pub base: Box<TypedExpr>,
    pub quantifier: Quantifier,
    pub slot: usize,
    pub predicate: Box<TypedExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedConditional {
    pub test: TypedExpr,
    pub then_branch: TypedExpr,
    pub else_branch: TypedExpr,
}

impl TypedExpr {
    /// Visits this node and all of its descendants, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a TypedExpr)) {
        f(self);
        match &self.kind {
            TypedKind::Literal(_) | TypedKind::Subject | TypedKind::Local(_) => {}
            TypedKind::Field(field) => field.base.walk(f),
            TypedKind::Builtin(call) => {
                call.base.walk(f);
                for arg in &call.args {
                    arg.walk(f);
                }
            }
            TypedKind::Extension(call) => {
                call.base.walk(f);
                for arg in &call.args {
                    arg.walk(f);
                }
            }
            TypedKind::Convert(_, arg) | TypedKind::Unary(_, arg) => arg.walk(f),
            TypedKind::Comprehension(c) => {
                c.base.walk(f);
                c.predicate.walk(f);
            }
            TypedKind::Binary(l, _, r) => {
                l.walk(f);
                r.walk(f);
            }
            TypedKind::Conditional(c) => {
                c.test.walk(f);
                c.then_branch.walk(f);
                c.else_branch.walk(f);
            }
        }
    }
}
