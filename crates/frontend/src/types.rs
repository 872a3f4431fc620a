#![forbid(unsafe_code)]

use std::fmt;

/// Static type of an expression.
///
/// `Unknown` is an inference placeholder; it unifies with any type but never
/// survives into a checked program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Int,
    UInt,
    String,
    List(Box<Type>),
    Struct(String),
    Unknown,
}

impl Type {
    pub fn list(elem: Type) -> Type {
        Type::List(Box::new(elem))
    }

    pub fn named(shape: impl Into<String>) -> Type {
        Type::Struct(shape.into())
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            Type::Unknown => false,
            Type::List(elem) => elem.is_resolved(),
            _ => true,
        }
    }

    pub fn unifies_with(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Unknown, _) | (_, Type::Unknown) => true,
            (Type::List(a), Type::List(b)) => a.unifies_with(b),
            (a, b) => a == b,
        }
    }

    /// Shape name this type refers to, directly or through lists.
    pub fn referenced_shape(&self) -> Option<&str> {
        match self {
            Type::Struct(name) => Some(name),
            Type::List(elem) => elem.referenced_shape(),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::UInt => write!(f, "uint"),
            Type::String => write!(f, "string"),
            Type::List(elem) => write!(f, "list({elem})"),
            Type::Struct(name) => write!(f, "{name}"),
            Type::Unknown => write!(f, "?"),
        }
    }
}

/// Renders `(a, b, ...)` the way overload diagnostics list operand types.
pub fn format_type_list(types: &[Type]) -> String {
    let parts = types.iter().map(Type::to_string).collect::<Vec<_>>();
    format!("({})", parts.join(", "))
}
