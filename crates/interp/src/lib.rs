#![forbid(unsafe_code)]

pub mod resolver;
pub mod value;

pub use resolver::{ExtensionResolver, NoExtensions, ResolveError};
pub use value::{conforms, StructValue, Value};

use frontend::ast::{BinaryOp, Quantifier, UnaryOp};
use frontend::builtins::{BuiltinMember, Conversion};
use frontend::typed::*;
use frontend::{Program, Type, TypeRegistry};
use std::borrow::Cow;
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("integer overflow in '{0}'")]
    Overflow(&'static str),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("extension member {member} failed: {source}")]
    Resolver {
        member: String,
        #[source]
        source: ResolveError,
    },
    #[error("extension member {member} returned an ill-typed value: {detail}")]
    ResolverType { member: String, detail: String },
}

/// Evaluates a compiled program against one subject.
///
/// The subject is first validated against the program's subject shape. Any
/// error means the condition does not hold; callers in an authorization
/// context must treat it as a denial.
#[tracing::instrument(level = "debug", skip_all, fields(shape = program.shape()), err)]
pub fn run<R>(program: &Program, subject: &Value, resolver: &R) -> Result<Value, EvalError>
where
    R: ExtensionResolver + ?Sized,
{
    let registry: &TypeRegistry = program.registry();
    conforms(subject, &Type::named(program.shape()), registry)
        .map_err(EvalError::ShapeMismatch)?;
    let mut evaluator = Evaluator {
        registry,
        subject,
        resolver,
        locals: Vec::new(),
    };
    let value = evaluator.eval(program.root())?.into_owned();
    tracing::debug!(%value, "evaluated expression");
    Ok(value)
}

/// Tree-walking evaluator for one `run` call. Values reachable from the subject
/// are borrowed, everything else is owned.
struct Evaluator<'s, R: ?Sized> {
    registry: &'s TypeRegistry,
    subject: &'s Value,
    resolver: &'s R,
    locals: Vec<Value>,
}

impl<'s, R> Evaluator<'s, R>
where
    R: ExtensionResolver + ?Sized,
{
    fn eval(&mut self, expr: &TypedExpr) -> Result<Cow<'s, Value>, EvalError> {
        match &expr.kind {
            TypedKind::Literal(lit) => Ok(Cow::Owned(Value::from(lit))),
            TypedKind::Subject => Ok(Cow::Borrowed(self.subject)),
            TypedKind::Local(slot) => {
                let local = self.locals.get(*slot).cloned().ok_or_else(|| {
                    EvalError::ShapeMismatch(format!("loop variable slot {slot} is not bound"))
                })?;
                Ok(Cow::Owned(local))
            }
            TypedKind::Field(field) => match self.eval(&field.base)? {
                Cow::Borrowed(base) => read_field(base, field).map(Cow::Borrowed),
                Cow::Owned(base) => read_field(&base, field).map(|v| Cow::Owned(v.clone())),
            },
            TypedKind::Builtin(call) => self.eval_builtin(call).map(Cow::Owned),
            TypedKind::Extension(call) => self.eval_extension(call).map(Cow::Owned),
            TypedKind::Convert(conversion, arg) => {
                let arg = self.eval(arg)?;
                convert(*conversion, &arg).map(Cow::Owned)
            }
            TypedKind::Comprehension(c) => {
                let holds = self.eval_comprehension(c)?;
                Ok(Cow::Owned(Value::Bool(holds)))
            }
            TypedKind::Unary(op, inner) => {
                let v = self.eval(inner)?;
                let out = match (op, v.as_ref()) {
                    (UnaryOp::Neg, Value::Int(i)) => {
                        Value::Int(i.checked_neg().ok_or(EvalError::Overflow("-_"))?)
                    }
                    (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
                    (_, other) => return Err(operand_mismatch(op.overload_name(), other)),
                };
                Ok(Cow::Owned(out))
            }
            TypedKind::Binary(left, op, right) => {
                self.eval_binary(left, *op, right).map(Cow::Owned)
            }
            TypedKind::Conditional(c) => {
                if self.eval_bool(&c.test)? {
                    self.eval(&c.then_branch)
                } else {
                    self.eval(&c.else_branch)
                }
            }
        }
    }

    fn eval_bool(&mut self, expr: &TypedExpr) -> Result<bool, EvalError> {
        let v = self.eval(expr)?;
        v.as_bool()
            .ok_or_else(|| EvalError::ShapeMismatch(format!("expected bool, found {}", v.kind())))
    }

    fn eval_binary(
        &mut self,
        left: &TypedExpr,
        op: BinaryOp,
        right: &TypedExpr,
    ) -> Result<Value, EvalError> {
        // && and || skip the right operand once the result is decided.
        match op {
            BinaryOp::And => {
                return Ok(Value::Bool(self.eval_bool(left)? && self.eval_bool(right)?));
            }
            BinaryOp::Or => {
                return Ok(Value::Bool(self.eval_bool(left)? || self.eval_bool(right)?));
            }
            _ => {}
        }

        let l = self.eval(left)?;
        let r = self.eval(right)?;
        let (l, r) = (l.as_ref(), r.as_ref());
        let out = match op {
            BinaryOp::Eq => Value::Bool(l == r),
            BinaryOp::Ne => Value::Bool(l != r),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ord = compare(l, r).ok_or_else(|| operand_mismatch(&op.overload_name(), l))?;
                Value::Bool(match op {
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::Le => ord != Ordering::Greater,
                    BinaryOp::Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                })
            }
            _ => arithmetic(op, l, r)?,
        };
        Ok(out)
    }

    fn eval_builtin(&mut self, call: &BuiltinCall) -> Result<Value, EvalError> {
        let base = self.eval(&call.base)?;
        let args = self.eval_args(&call.args)?;
        let out = match (call.member, base.as_ref(), args.as_slice()) {
            (BuiltinMember::LowerAscii, Value::Str(s), []) => Value::Str(s.to_ascii_lowercase()),
            (BuiltinMember::UpperAscii, Value::Str(s), []) => Value::Str(s.to_ascii_uppercase()),
            (BuiltinMember::Trim, Value::Str(s), []) => Value::str(s.trim()),
            (BuiltinMember::Contains, Value::Str(s), [Value::Str(p)]) => {
                Value::Bool(s.contains(p.as_str()))
            }
            (BuiltinMember::StartsWith, Value::Str(s), [Value::Str(p)]) => {
                Value::Bool(s.starts_with(p.as_str()))
            }
            (BuiltinMember::EndsWith, Value::Str(s), [Value::Str(p)]) => {
                Value::Bool(s.ends_with(p.as_str()))
            }
            (BuiltinMember::StringSize, Value::Str(s), []) => {
                Value::Int(len_to_int(s.chars().count())?)
            }
            (BuiltinMember::ListSize, Value::List(items), []) => {
                Value::Int(len_to_int(items.len())?)
            }
            (member, receiver, _) => {
                return Err(EvalError::ShapeMismatch(format!(
                    "built-in {member:?} cannot be applied to {}",
                    receiver.kind()
                )))
            }
        };
        Ok(out)
    }

    fn eval_extension(&mut self, call: &ExtensionCall) -> Result<Value, EvalError> {
        let base = self.eval(&call.base)?;
        let args = self.eval_args(&call.args)?;
        let member = call.decl.name.as_str();
        let identity = self.identity_of(&base);

        tracing::debug!(member, "resolving extension member");
        let value = self
            .resolver
            .resolve(member, identity, &args)
            .map_err(|source| {
                tracing::debug!(member, error = %source, "extension resolver failed");
                EvalError::Resolver {
                    member: member.to_string(),
                    source,
                }
            })?;
        conforms(&value, &call.decl.ret, self.registry).map_err(|detail| EvalError::ResolverType {
            member: member.to_string(),
            detail,
        })?;
        Ok(value)
    }

    fn identity_of<'v>(&self, receiver: &'v Value) -> &'v Value {
        let Value::Struct(s) = receiver else {
            return receiver;
        };
        self.registry
            .shape(&s.shape)
            .and_then(|shape| shape.identity.as_deref())
            .and_then(|field| s.fields.get(field))
            .unwrap_or(receiver)
    }

    fn eval_args(&mut self, args: &[TypedExpr]) -> Result<Vec<Value>, EvalError> {
        args.iter()
            .map(|a| self.eval(a).map(Cow::into_owned))
            .collect()
    }

    fn eval_comprehension(&mut self, c: &TypedComprehension) -> Result<bool, EvalError> {
        let base = self.eval(&c.base)?;
        let Value::List(items) = base.as_ref() else {
            return Err(EvalError::ShapeMismatch(format!(
                "'{}' expects a list, found {}",
                c.quantifier.name(),
                base.kind()
            )));
        };
        debug_assert_eq!(self.locals.len(), c.slot);

        let mut matched = 0usize;
        for item in items {
            self.locals.push(item.clone());
            let holds = self.eval_bool(&c.predicate);
            self.locals.pop();
            let holds = holds?;
            match c.quantifier {
                Quantifier::Exists if holds => return Ok(true),
                Quantifier::All if !holds => return Ok(false),
                Quantifier::ExistsOne if holds => {
                    matched += 1;
                    if matched > 1 {
                        return Ok(false);
                    }
                }
                _ => {}
            }
        }
        Ok(match c.quantifier {
            Quantifier::Exists => false,
            Quantifier::All => true,
            Quantifier::ExistsOne => matched == 1,
        })
    }
}

/// Positional field read, verified against the checked field name and shape.
fn read_field<'v>(base: &'v Value, field: &TypedField) -> Result<&'v Value, EvalError> {
    let Value::Struct(s) = base else {
        return Err(EvalError::ShapeMismatch(format!(
            "field {} read from {}",
            field.name,
            base.kind()
        )));
    };
    if s.shape != field.shape {
        return Err(EvalError::ShapeMismatch(format!(
            "expected shape {}, found {}",
            field.shape, s.shape
        )));
    }
    match s.fields.get_index(field.index) {
        Some((name, value)) if *name == field.name => Ok(value),
        _ => Err(EvalError::ShapeMismatch(format!(
            "shape {} has no field {} at position {}",
            s.shape, field.name, field.index
        ))),
    }
}

fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::UInt(a), Value::UInt(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn arithmetic(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let overflow = || EvalError::Overflow(op.symbol());
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            let out = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div if b == 0 => return Err(EvalError::DivisionByZero),
                BinaryOp::Div => a.checked_div(b),
                BinaryOp::Rem if b == 0 => return Err(EvalError::ModuloByZero),
                BinaryOp::Rem => a.checked_rem(b),
                _ => return Err(operand_mismatch(&op.overload_name(), l)),
            };
            out.map(Value::Int).ok_or_else(overflow)
        }
        (Value::UInt(a), Value::UInt(b)) => {
            let (a, b) = (*a, *b);
            let out = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div if b == 0 => return Err(EvalError::DivisionByZero),
                BinaryOp::Div => a.checked_div(b),
                BinaryOp::Rem if b == 0 => return Err(EvalError::ModuloByZero),
                BinaryOp::Rem => a.checked_rem(b),
                _ => return Err(operand_mismatch(&op.overload_name(), l)),
            };
            out.map(Value::UInt).ok_or_else(overflow)
        }
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => Ok(Value::Str(format!("{a}{b}"))),
        _ => Err(operand_mismatch(&op.overload_name(), l)),
    }
}

fn convert(conversion: Conversion, arg: &Value) -> Result<Value, EvalError> {
    let out = match (conversion, arg) {
        (Conversion::ToInt, Value::Int(i)) => Value::Int(*i),
        (Conversion::ToInt, Value::UInt(u)) => Value::Int(
            i64::try_from(*u)
                .map_err(|_| EvalError::Conversion(format!("{u}u does not fit in int")))?,
        ),
        (Conversion::ToInt, Value::Str(s)) => Value::Int(
            s.parse()
                .map_err(|_| EvalError::Conversion(format!("{s:?} is not an int")))?,
        ),
        (Conversion::ToUInt, Value::UInt(u)) => Value::UInt(*u),
        (Conversion::ToUInt, Value::Int(i)) => Value::UInt(
            u64::try_from(*i)
                .map_err(|_| EvalError::Conversion(format!("{i} does not fit in uint")))?,
        ),
        (Conversion::ToUInt, Value::Str(s)) => Value::UInt(
            s.parse()
                .map_err(|_| EvalError::Conversion(format!("{s:?} is not a uint")))?,
        ),
        (Conversion::ToString, Value::Bool(b)) => Value::Str(b.to_string()),
        (Conversion::ToString, Value::Int(i)) => Value::Str(i.to_string()),
        (Conversion::ToString, Value::UInt(u)) => Value::Str(u.to_string()),
        (Conversion::ToString, Value::Str(s)) => Value::Str(s.clone()),
        (conversion, other) => {
            return Err(EvalError::Conversion(format!(
                "{conversion:?} cannot be applied to {}",
                other.kind()
            )))
        }
    };
    Ok(out)
}

fn len_to_int(len: usize) -> Result<i64, EvalError> {
    i64::try_from(len).map_err(|_| EvalError::Overflow("size"))
}

fn operand_mismatch(op: &str, found: &Value) -> EvalError {
    EvalError::ShapeMismatch(format!("operator '{op}' applied to {}", found.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontend::{compile, MemberDecl, SealedRegistry, ShapeDecl};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn registry() -> SealedRegistry {
        let mut reg = TypeRegistry::new();
        reg.register_shape(ShapeDecl::new("Tag").field("key", Type::String))
            .expect("Tag");
        reg.register_shape(
            ShapeDecl::new("User")
                .field("id", Type::String)
                .field("name", Type::String)
                .field("tags", Type::list(Type::named("Tag")))
                .field("logins", Type::Int)
                .identity("id"),
        )
        .expect("User");
        reg.register_member(MemberDecl::new(
            Type::named("User"),
            "multiFactorAuthAge",
            vec![],
            Type::UInt,
        ))
        .expect("mfa");
        reg.register_member(MemberDecl::new(
            Type::named("Tag"),
            "weight",
            vec![Type::Int],
            Type::Int,
        ))
        .expect("weight");
        reg.seal().expect("seal")
    }

    fn tag(key: &str) -> Value {
        StructValue::new("Tag").with("key", Value::str(key)).into()
    }

    fn user() -> Value {
        StructValue::new("User")
            .with("id", Value::str("u-1"))
            .with("name", Value::str("JohnDoe"))
            .with("tags", Value::List(vec![tag("foo"), tag("bar")]))
            .with("logins", Value::Int(7))
            .into()
    }

    fn eval_with<R: ExtensionResolver>(src: &str, resolver: &R) -> Result<Value, EvalError> {
        let program = compile(&registry(), src, "User").expect("compile");
        run(&program, &user(), resolver)
    }

    fn eval(src: &str) -> Value {
        eval_with(src, &NoExtensions).expect("eval ok")
    }

    fn fixed_age(age: u64) -> impl Fn(&str, &Value, &[Value]) -> Result<Value, ResolveError> {
        move |member, _identity, _args| match member {
            "multiFactorAuthAge" => Ok(Value::UInt(age)),
            other => Err(format!("unexpected member {other}").into()),
        }
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(eval("1 + 2 * 3"), Value::Int(7));
        assert_eq!(eval("(1 + 2) * 3"), Value::Int(9));
        assert_eq!(eval("10 - 4 - 3"), Value::Int(3));
        assert_eq!(eval("7 % 4"), Value::Int(3));
        assert_eq!(eval("7u / 2u"), Value::UInt(3));
        assert_eq!(eval("-subject.logins"), Value::Int(-7));
    }

    #[test]
    fn field_access_and_builtins() {
        assert_eq!(eval("subject.name"), Value::str("JohnDoe"));
        assert_eq!(eval("subject.name.lowerAscii()"), Value::str("johndoe"));
        assert_eq!(eval("subject.name.upperAscii()"), Value::str("JOHNDOE"));
        assert_eq!(eval(r#""  x ".trim()"#), Value::str("x"));
        assert_eq!(eval(r#"subject.name.startsWith("John")"#), Value::Bool(true));
        assert_eq!(eval(r#"subject.name.contains("hnD")"#), Value::Bool(true));
        assert_eq!(eval(r#"subject.name.endsWith("x")"#), Value::Bool(false));
        assert_eq!(eval("subject.tags.size()"), Value::Int(2));
        assert_eq!(eval(r#""héllo".size()"#), Value::Int(5));
        assert_eq!(eval(r#"subject.name + "!""#), Value::str("JohnDoe!"));
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval(r#""abc" < "abd""#), Value::Bool(true));
        assert_eq!(eval("3u >= 3u"), Value::Bool(true));
        assert_eq!(eval("subject.logins > 7"), Value::Bool(false));
        assert_eq!(eval("subject.tags == subject.tags"), Value::Bool(true));
        assert_eq!(eval("subject.tags != subject.tags"), Value::Bool(false));
    }

    #[test]
    fn comprehensions() {
        assert_eq!(
            eval(r#"subject.tags.exists(t, t.key == "bar")"#),
            Value::Bool(true)
        );
        assert_eq!(
            eval(r#"subject.tags.all(t, t.key.size() == 3)"#),
            Value::Bool(true)
        );
        assert_eq!(
            eval(r#"subject.tags.all(t, t.key == "foo")"#),
            Value::Bool(false)
        );
        assert_eq!(
            eval(r#"subject.tags.exists_one(t, t.key.startsWith("b"))"#),
            Value::Bool(true)
        );
        assert_eq!(
            eval(r#"subject.tags.exists_one(t, t.key.size() == 3)"#),
            Value::Bool(false)
        );
        assert_eq!(
            eval(r#"subject.tags.all(a, subject.tags.exists(b, a.key == b.key))"#),
            Value::Bool(true)
        );
    }

    #[test]
    fn conditional_picks_branch() {
        assert_eq!(eval(r#"subject.logins > 3 ? "many" : "few""#), Value::str("many"));
        assert_eq!(eval("false ? 1 : true ? 2 : 3"), Value::Int(2));
    }

    #[test]
    fn conversions() {
        assert_eq!(eval("uint(3600)"), Value::UInt(3600));
        assert_eq!(eval(r#"int("-12")"#), Value::Int(-12));
        assert_eq!(eval("string(42u)"), Value::str("42"));
        assert!(matches!(
            eval_with("uint(-1)", &NoExtensions),
            Err(EvalError::Conversion(_))
        ));
        assert!(matches!(
            eval_with(r#"int("12x")"#, &NoExtensions),
            Err(EvalError::Conversion(_))
        ));
    }

    #[test]
    fn arithmetic_faults() {
        assert!(matches!(eval_with("1 / 0", &NoExtensions), Err(EvalError::DivisionByZero)));
        assert!(matches!(eval_with("1u % 0u", &NoExtensions), Err(EvalError::ModuloByZero)));
        assert!(matches!(
            eval_with("0u - 1u", &NoExtensions),
            Err(EvalError::Overflow("-"))
        ));
        assert!(matches!(
            eval_with("9223372036854775807 + 1", &NoExtensions),
            Err(EvalError::Overflow("+"))
        ));
    }

    #[test]
    fn extension_member_through_resolver() {
        let v = eval_with("subject.multiFactorAuthAge() <= 3600u", &fixed_age(1000)).expect("eval");
        assert_eq!(v, Value::Bool(true));
        let v = eval_with("subject.multiFactorAuthAge() <= 3600u", &fixed_age(7200)).expect("eval");
        assert_eq!(v, Value::Bool(false));
    }

    #[test]
    fn resolver_receives_identity_field() {
        let seen = std::sync::Mutex::new(Vec::new());
        let resolver = |member: &str, identity: &Value, _: &[Value]| {
            let mut seen = seen.lock().expect("lock");
            seen.push((member.to_string(), identity.clone()));
            Ok::<_, ResolveError>(Value::UInt(1))
        };
        eval_with("subject.multiFactorAuthAge()", &resolver).expect("eval");
        assert_eq!(
            seen.into_inner().expect("lock"),
            vec![("multiFactorAuthAge".to_string(), Value::str("u-1"))]
        );
    }

    #[test]
    fn resolver_receives_whole_struct_without_identity_and_args() {
        let resolver = |member: &str, identity: &Value, args: &[Value]| {
            assert_eq!(member, "weight");
            assert_eq!(identity, &tag("foo"));
            assert_eq!(args, &[Value::Int(2)]);
            Ok::<_, ResolveError>(Value::Int(10))
        };
        let v = eval_with("subject.tags.all(t, t.key != \"foo\" || t.weight(2) == 10)", &resolver)
            .expect("eval");
        assert_eq!(v, Value::Bool(true));
    }

    #[test]
    fn resolver_failure_is_wrapped_with_member_name() {
        let failing = |_: &str, _: &Value, _: &[Value]| -> Result<Value, ResolveError> {
            Err("store unreachable".into())
        };
        let err = eval_with("subject.multiFactorAuthAge() <= 3600u", &failing).expect_err("fails");
        assert!(matches!(
            err,
            EvalError::Resolver { ref member, .. } if member == "multiFactorAuthAge"
        ));
        assert_eq!(
            err.to_string(),
            "extension member multiFactorAuthAge failed: store unreachable"
        );
        let source = std::error::Error::source(&err).expect("source kept");
        assert_eq!(source.to_string(), "store unreachable");
    }

    #[test]
    fn resolver_result_must_match_declared_type() {
        let wrong = |_: &str, _: &Value, _: &[Value]| -> Result<Value, ResolveError> {
            Ok(Value::Int(1000))
        };
        let err =
            eval_with("subject.multiFactorAuthAge() <= 3600u", &wrong).expect_err("ill-typed");
        assert!(matches!(err, EvalError::ResolverType { .. }));
    }

    #[test]
    fn logical_operators_short_circuit() {
        let calls = Cell::new(0);
        let counting = |_: &str, _: &Value, _: &[Value]| -> Result<Value, ResolveError> {
            calls.set(calls.get() + 1);
            Ok(Value::UInt(1))
        };
        let v = eval_with("false && subject.multiFactorAuthAge() == 1u", &counting).expect("eval");
        assert_eq!(v, Value::Bool(false));
        let v = eval_with("true || subject.multiFactorAuthAge() == 1u", &counting).expect("eval");
        assert_eq!(v, Value::Bool(true));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn subject_must_conform_to_shape() {
        let program = compile(&registry(), "subject.name", "User").expect("compile");
        let short: Value = StructValue::new("User").with("id", Value::str("u")).into();
        assert!(matches!(
            run(&program, &short, &NoExtensions),
            Err(EvalError::ShapeMismatch(_))
        ));
        assert!(matches!(
            run(&program, &tag("foo"), &NoExtensions),
            Err(EvalError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn read_field_checks_position_and_name() {
        let field = TypedField {
            base: Box::new(TypedExpr {
                kind: TypedKind::Subject,
                ty: Type::named("Tag"),
                offset: 0,
            }),
            shape: "Tag".into(),
            index: 0,
            name: "label".into(),
        };
        assert!(matches!(
            read_field(&tag("foo"), &field),
            Err(EvalError::ShapeMismatch(_))
        ));
    }
}
