#![forbid(unsafe_code)]

use crate::ast::*;
use crate::builtins;
use crate::registry::TypeRegistry;
use crate::typed::*;
use crate::types::{format_type_list, Type};
use thiserror::Error;

/// The single free variable every expression is evaluated against.
pub const SUBJECT: &str = "subject";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown subject shape {shape}")]
    UnknownShape { offset: usize, shape: String },
    #[error("undeclared reference to '{name}'")]
    UnknownIdent { offset: usize, name: String },
    #[error("'{name}' is reserved and cannot be rebound")]
    ReservedName { offset: usize, name: String },
    #[error("undefined field '{field}' on shape {shape}")]
    UnknownField {
        offset: usize,
        field: String,
        shape: String,
    },
    #[error("type '{found}' does not support field selection of '{field}'")]
    NotAStruct {
        offset: usize,
        field: String,
        found: Type,
    },
    #[error("found no matching overload for '{op}' applied to '{operands}'")]
    NoMatchingOverload {
        offset: usize,
        op: String,
        operands: String,
    },
    #[error("found no matching overload for '{signature}'")]
    NoMatchingMember { offset: usize, signature: String },
    #[error("'{quantifier}' requires a list receiver, found '{found}'")]
    NotAList {
        offset: usize,
        quantifier: &'static str,
        found: Type,
    },
    #[error("predicate of '{quantifier}' must be bool, found '{found}'")]
    NonBoolPredicate {
        offset: usize,
        quantifier: &'static str,
        found: Type,
    },
    #[error("conditional test must be bool, found '{found}'")]
    ConditionNotBool { offset: usize, found: Type },
    #[error("conditional branches differ: '{then_ty}' and '{else_ty}'")]
    BranchMismatch {
        offset: usize,
        then_ty: Type,
        else_ty: Type,
    },
    #[error("could not resolve the type of this expression")]
    Unresolved { offset: usize },
}

impl TypeError {
    pub fn offset(&self) -> usize {
        match self {
            TypeError::UnknownShape { offset, .. }
            | TypeError::UnknownIdent { offset, .. }
            | TypeError::ReservedName { offset, .. }
            | TypeError::UnknownField { offset, .. }
            | TypeError::NotAStruct { offset, .. }
            | TypeError::NoMatchingOverload { offset, .. }
            | TypeError::NoMatchingMember { offset, .. }
            | TypeError::NotAList { offset, .. }
            | TypeError::NonBoolPredicate { offset, .. }
            | TypeError::ConditionNotBool { offset, .. }
            | TypeError::BranchMismatch { offset, .. }
            | TypeError::Unresolved { offset } => *offset,
        }
    }
}

#[derive(Debug, Clone)]
struct Local {
    name: String,
    ty: Type,
}

/// Bottom-up type inference of one expression against a registry.
pub struct TypeChecker<'r> {
    registry: &'r TypeRegistry,
    subject: Type,
    scopes: Vec<Local>,
}

impl<'r> TypeChecker<'r> {
    pub fn new(registry: &'r TypeRegistry, shape: &str) -> Result<Self, TypeError> {
        if registry.shape(shape).is_none() {
            return Err(TypeError::UnknownShape {
                offset: 0,
                shape: shape.to_string(),
            });
        }
        Ok(Self {
            registry,
            subject: Type::named(shape),
            scopes: Vec::new(),
        })
    }

    pub fn check(&mut self, expr: &Expr) -> Result<TypedExpr, TypeError> {
        let typed = self.check_expr(expr)?;
        let mut unresolved = None;
        typed.walk(&mut |node| {
            if unresolved.is_none() && !node.ty.is_resolved() {
                unresolved = Some(node.offset);
            }
        });
        match unresolved {
            Some(offset) => Err(TypeError::Unresolved { offset }),
            None => Ok(typed),
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> Result<TypedExpr, TypeError> {
        let offset = expr.offset;
        let (kind, ty) = match &expr.kind {
            ExprKind::Literal(lit) => (TypedKind::Literal(lit.clone()), literal_type(lit)),
            ExprKind::Ident(name) => self.check_ident(name, offset)?,
            ExprKind::Field(field) => self.check_field(field, offset)?,
            ExprKind::Call(call) => self.check_call(call, offset)?,
            ExprKind::Comprehension(c) => self.check_comprehension(c, offset)?,
            ExprKind::Unary(u) => {
                let inner = self.check_expr(&u.expr)?;
                let ty = match (u.op, &inner.ty) {
                    (UnaryOp::Neg, Type::Int) => Type::Int,
                    (UnaryOp::Not, Type::Bool) => Type::Bool,
                    (op, found) => {
                        return Err(TypeError::NoMatchingOverload {
                            offset,
                            op: op.overload_name().to_string(),
                            operands: format_type_list(std::slice::from_ref(found)),
                        })
                    }
                };
                (TypedKind::Unary(u.op, Box::new(inner)), ty)
            }
            ExprKind::Binary(b) => {
                let left = self.check_expr(&b.left)?;
                let right = self.check_expr(&b.right)?;
                let ty = binary_result(b.op, &left.ty, &right.ty).ok_or_else(|| {
                    TypeError::NoMatchingOverload {
                        offset,
                        op: b.op.overload_name(),
                        operands: format_type_list(&[left.ty.clone(), right.ty.clone()]),
                    }
                })?;
                (
                    TypedKind::Binary(Box::new(left), b.op, Box::new(right)),
                    ty,
                )
            }
            ExprKind::Conditional(c) => {
                let test = self.check_expr(&c.test)?;
                if test.ty != Type::Bool {
                    return Err(TypeError::ConditionNotBool {
                        offset,
                        found: test.ty,
                    });
                }
                let then_branch = self.check_expr(&c.then_branch)?;
                let else_branch = self.check_expr(&c.else_branch)?;
                if then_branch.ty != else_branch.ty {
                    return Err(TypeError::BranchMismatch {
                        offset,
                        then_ty: then_branch.ty,
                        else_ty: else_branch.ty,
                    });
                }
                let ty = then_branch.ty.clone();
                (
                    TypedKind::Conditional(Box::new(TypedConditional {
                        test,
                        then_branch,
                        else_branch,
                    })),
                    ty,
                )
            }
        };
        Ok(TypedExpr { kind, ty, offset })
    }

    fn check_ident(&self, name: &Ident, offset: usize) -> Result<(TypedKind, Type), TypeError> {
        if name.0 == SUBJECT {
            return Ok((TypedKind::Subject, self.subject.clone()));
        }
        // innermost binding wins
        self.scopes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, local)| local.name == name.0)
            .map(|(slot, local)| (TypedKind::Local(slot), local.ty.clone()))
            .ok_or_else(|| TypeError::UnknownIdent {
                offset,
                name: name.0.clone(),
            })
    }

    fn check_field(
        &mut self,
        field: &FieldAccess,
        offset: usize,
    ) -> Result<(TypedKind, Type), TypeError> {
        let base = self.check_expr(&field.base)?;
        let Type::Struct(shape_name) = &base.ty else {
            return Err(TypeError::NotAStruct {
                offset,
                field: field.name.0.clone(),
                found: base.ty,
            });
        };
        let shape = self
            .registry
            .shape(shape_name)
            .ok_or_else(|| TypeError::UnknownShape {
                offset,
                shape: shape_name.clone(),
            })?;
        let (index, ty) =
            shape
                .field_index(&field.name.0)
                .ok_or_else(|| TypeError::UnknownField {
                    offset,
                    field: field.name.0.clone(),
                    shape: shape_name.clone(),
                })?;
        let ty = ty.clone();
        let shape = shape_name.clone();
        Ok((
            TypedKind::Field(TypedField {
                base: Box::new(base),
                shape,
                index,
                name: field.name.0.clone(),
            }),
            ty,
        ))
    }

    fn check_call(&mut self, call: &Call, offset: usize) -> Result<(TypedKind, Type), TypeError> {
        let base = call
            .base
            .as_ref()
            .map(|b| self.check_expr(b))
            .transpose()?;
        let args = call
            .args
            .iter()
            .map(|a| self.check_expr(a))
            .collect::<Result<Vec<_>, _>>()?;
        let arg_types = args.iter().map(|a| a.ty.clone()).collect::<Vec<_>>();
        let name = call.member.0.as_str();

        let Some(base) = base else {
            let (conversion, ty) =
                builtins::lookup_function(name, &arg_types).ok_or_else(|| {
                    TypeError::NoMatchingMember {
                        offset,
                        signature: format!("{name}{}", format_type_list(&arg_types)),
                    }
                })?;
            let mut args = args;
            let Some(arg) = args.pop() else {
                return Err(TypeError::Unresolved { offset });
            };
            return Ok((TypedKind::Convert(conversion, Box::new(arg)), ty));
        };

        if let Some((member, ty)) = builtins::lookup_member(&base.ty, name, &arg_types) {
            return Ok((
                TypedKind::Builtin(BuiltinCall {
                    base: Box::new(base),
                    member,
                    args,
                }),
                ty,
            ));
        }

        let decl = self
            .registry
            .member(&base.ty, name, &arg_types)
            .ok_or_else(|| TypeError::NoMatchingMember {
                offset,
                signature: format!("{}.{name}{}", base.ty, format_type_list(&arg_types)),
            })?;
        let ty = decl.ret.clone();
        Ok((
            TypedKind::Extension(ExtensionCall {
                base: Box::new(base),
                decl: decl.clone(),
                args,
            }),
            ty,
        ))
    }

    fn check_comprehension(
        &mut self,
        c: &Comprehension,
        offset: usize,
    ) -> Result<(TypedKind, Type), TypeError> {
        let quantifier = c.quantifier.name();
        let base = self.check_expr(&c.base)?;
        let Type::List(elem) = &base.ty else {
            return Err(TypeError::NotAList {
                offset,
                quantifier,
                found: base.ty,
            });
        };
        if c.var.0 == SUBJECT {
            return Err(TypeError::ReservedName {
                offset,
                name: c.var.0.clone(),
            });
        }

        let slot = self.scopes.len();
        self.scopes.push(Local {
            name: c.var.0.clone(),
            ty: (**elem).clone(),
        });
        let predicate = self.check_expr(&c.predicate);
        self.scopes.pop();
        let predicate = predicate?;

        if predicate.ty != Type::Bool {
            return Err(TypeError::NonBoolPredicate {
                offset: predicate.offset,
                quantifier,
                found: predicate.ty,
            });
        }
        Ok((
            TypedKind::Comprehension(TypedComprehension {
                base: Box::new(base),
                quantifier: c.quantifier,
                slot,
                predicate: Box::new(predicate),
            }),
            Type::Bool,
        ))
    }
}

/// Fixed operator signatures. Operands never convert between int and uint.
fn binary_result(op: BinaryOp, left: &Type, right: &Type) -> Option<Type> {
    if left != right {
        return None;
    }
    match op {
        BinaryOp::And | BinaryOp::Or => (*left == Type::Bool).then_some(Type::Bool),
        BinaryOp::Eq | BinaryOp::Ne => Some(Type::Bool),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            matches!(left, Type::Int | Type::UInt | Type::String).then_some(Type::Bool)
        }
        BinaryOp::Add => {
            matches!(left, Type::Int | Type::UInt | Type::String).then(|| left.clone())
        }
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            matches!(left, Type::Int | Type::UInt).then(|| left.clone())
        }
    }
}

fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Bool(_) => Type::Bool,
        Literal::Int(_) => Type::Int,
        Literal::UInt(_) => Type::UInt,
        Literal::Str(_) => Type::String,
    }
}
