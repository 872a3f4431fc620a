#![forbid(unsafe_code)]

//! Fixed members and functions every registry understands.
//!
//! These are resolved before registered extension members and are evaluated
//! natively rather than through an extension resolver.

use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinMember {
    LowerAscii,
    UpperAscii,
    Trim,
    Contains,
    StartsWith,
    EndsWith,
    StringSize,
    ListSize,
}

/// Receiver-less conversion functions: `int(x)`, `uint(x)`, `string(x)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    ToInt,
    ToUInt,
    ToString,
}

/// Resolves a built-in member by exact receiver and argument types.
pub fn lookup_member(receiver: &Type, name: &str, args: &[Type]) -> Option<(BuiltinMember, Type)> {
    let found = match (receiver, name, args) {
        (Type::String, "lowerAscii", []) => (BuiltinMember::LowerAscii, Type::String),
        (Type::String, "upperAscii", []) => (BuiltinMember::UpperAscii, Type::String),
        (Type::String, "trim", []) => (BuiltinMember::Trim, Type::String),
        (Type::String, "contains", [Type::String]) => (BuiltinMember::Contains, Type::Bool),
        (Type::String, "startsWith", [Type::String]) => (BuiltinMember::StartsWith, Type::Bool),
        (Type::String, "endsWith", [Type::String]) => (BuiltinMember::EndsWith, Type::Bool),
        (Type::String, "size", []) => (BuiltinMember::StringSize, Type::Int),
        (Type::List(_), "size", []) => (BuiltinMember::ListSize, Type::Int),
        _ => return None,
    };
    Some(found)
}

pub fn lookup_function(name: &str, args: &[Type]) -> Option<(Conversion, Type)> {
    let found = match (name, args) {
        ("int", [Type::Int | Type::UInt | Type::String]) => (Conversion::ToInt, Type::Int),
        ("uint", [Type::Int | Type::UInt | Type::String]) => (Conversion::ToUInt, Type::UInt),
        ("string", [Type::Bool | Type::Int | Type::UInt | Type::String]) => {
            (Conversion::ToString, Type::String)
        }
        _ => return None,
    };
    Some(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_members_require_exact_arguments() {
        assert_eq!(
            lookup_member(&Type::String, "contains", &[Type::String]),
            Some((BuiltinMember::Contains, Type::Bool))
        );
        assert_eq!(lookup_member(&Type::String, "contains", &[Type::Int]), None);
        assert_eq!(lookup_member(&Type::Int, "lowerAscii", &[]), None);
    }

    #[test]
    fn size_applies_to_any_list() {
        let tags = Type::list(Type::named("Tag"));
        assert_eq!(
            lookup_member(&tags, "size", &[]),
            Some((BuiltinMember::ListSize, Type::Int))
        );
    }

    #[test]
    fn conversions() {
        assert_eq!(
            lookup_function("uint", &[Type::Int]),
            Some((Conversion::ToUInt, Type::UInt))
        );
        assert_eq!(lookup_function("int", &[Type::Bool]), None);
        assert_eq!(lookup_function("uint", &[]), None);
        assert_eq!(lookup_function("float", &[Type::Int]), None);
    }
}
