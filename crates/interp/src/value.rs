#![forbid(unsafe_code)]

use frontend::ast::Literal;
use frontend::{Type, TypeRegistry};
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
    List(Vec<Value>),
    Struct(StructValue),
}

/// A struct value. Fields are kept in insertion order, which must match the
/// declared order of `shape`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructValue {
    pub shape: String,
    pub fields: IndexMap<String, Value>,
}

impl StructValue {
    pub fn new(shape: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Value::Struct(s)
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int(*i),
            Literal::UInt(u) => Value::UInt(*u),
            Literal::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short description of the runtime kind, for error messages.
    pub fn kind(&self) -> String {
        match self {
            Value::Bool(_) => "bool".into(),
            Value::Int(_) => "int".into(),
            Value::UInt(_) => "uint".into(),
            Value::Str(_) => "string".into(),
            Value::List(_) => "list".into(),
            Value::Struct(s) => s.shape.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}u"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Struct(s) => {
                write!(f, "{}{{", s.shape)?;
                for (idx, (name, value)) in s.fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Checks that `value` has exactly type `ty`: same struct shape, same field
/// arity, names and order, recursively. The error names the offending path.
pub fn conforms(value: &Value, ty: &Type, registry: &TypeRegistry) -> Result<(), String> {
    conforms_at(value, ty, registry, "value")
}

fn conforms_at(
    value: &Value,
    ty: &Type,
    registry: &TypeRegistry,
    path: &str,
) -> Result<(), String> {
    match (ty, value) {
        (Type::Bool, Value::Bool(_))
        | (Type::Int, Value::Int(_))
        | (Type::UInt, Value::UInt(_))
        | (Type::String, Value::Str(_)) => Ok(()),
        (Type::List(elem), Value::List(items)) => {
            for (idx, item) in items.iter().enumerate() {
                conforms_at(item, elem, registry, &format!("{path}[{idx}]"))?;
            }
            Ok(())
        }
        (Type::Struct(shape_name), Value::Struct(s)) => {
            if &s.shape != shape_name {
                return Err(format!(
                    "{path}: expected shape {shape_name}, found {}",
                    s.shape
                ));
            }
            let shape = registry
                .shape(shape_name)
                .ok_or_else(|| format!("{path}: shape {shape_name} is not registered"))?;
            if shape.fields.len() != s.fields.len() {
                return Err(format!(
                    "{path}: shape {shape_name} declares {} fields, value has {}",
                    shape.fields.len(),
                    s.fields.len()
                ));
            }
            for (idx, ((decl_name, decl_ty), (name, field))) in
                shape.fields.iter().zip(s.fields.iter()).enumerate()
            {
                if decl_name != name {
                    return Err(format!(
                        "{path}: expected field {decl_name} at position {idx}, found {name}"
                    ));
                }
                conforms_at(field, decl_ty, registry, &format!("{path}.{name}"))?;
            }
            Ok(())
        }
        _ => Err(format!("{path}: expected {ty}, found {}", value.kind())),
    }
}
