#![forbid(unsafe_code)]

use crate::builtins;
use crate::types::{format_type_list, Type};
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("shape {0} is already registered")]
    DuplicateShape(String),
    #[error("shape {shape} declares field {field} more than once")]
    DuplicateField { shape: String, field: String },
    #[error("identity field {field} is not a field of shape {shape}")]
    UnknownIdentity { shape: String, field: String },
    #[error("member {0} is already registered")]
    DuplicateMember(String),
    #[error("member {0} collides with a built-in member")]
    BuiltinConflict(String),
    #[error("{0} uses an unresolved type")]
    UnresolvedType(String),
    #[error("{context} refers to unknown shape {shape}")]
    UnknownShape { context: String, shape: String },
}

/// Field layout of one subject kind. Field order is significant: struct values
/// of this shape carry their fields in exactly this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDecl {
    pub name: String,
    pub fields: Vec<(String, Type)>,
    pub identity: Option<String>,
}

impl ShapeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            identity: None,
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.fields.push((name.into(), ty));
        self
    }

    /// Marks `field` as the value handed to extension resolvers in place of the
    /// whole struct.
    pub fn identity(mut self, field: impl Into<String>) -> Self {
        self.identity = Some(field.into());
        self
    }

    pub fn field_index(&self, name: &str) -> Option<(usize, &Type)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, (field, _))| field == name)
            .map(|(idx, (_, ty))| (idx, ty))
    }
}

/// An extension member: `receiver.name(args) -> ret`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDecl {
    pub receiver: Type,
    pub name: String,
    pub args: Vec<Type>,
    pub ret: Type,
}

impl MemberDecl {
    pub fn new(receiver: Type, name: impl Into<String>, args: Vec<Type>, ret: Type) -> Self {
        Self {
            receiver,
            name: name.into(),
            args,
            ret,
        }
    }

    pub fn signature(&self) -> String {
        format!(
            "{}.{}{} -> {}",
            self.receiver,
            self.name,
            format_type_list(&self.args),
            self.ret
        )
    }

    fn key(&self) -> MemberKey {
        MemberKey {
            receiver: self.receiver.clone(),
            name: self.name.clone(),
            args: self.args.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemberKey {
    receiver: Type,
    name: String,
    args: Vec<Type>,
}

/// Mutable collection of shape and member declarations. Call
/// [`TypeRegistry::seal`] once registration is complete.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    shapes: HashMap<String, ShapeDecl>,
    members: HashMap<MemberKey, MemberDecl>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shape. Nothing is registered if the declaration is rejected.
    pub fn register_shape(&mut self, shape: ShapeDecl) -> Result<(), RegistrationError> {
        if self.shapes.contains_key(&shape.name) {
            return Err(RegistrationError::DuplicateShape(shape.name));
        }
        for (idx, (field, ty)) in shape.fields.iter().enumerate() {
            if shape.fields[..idx].iter().any(|(prev, _)| prev == field) {
                return Err(RegistrationError::DuplicateField {
                    shape: shape.name.clone(),
                    field: field.clone(),
                });
            }
            if !ty.is_resolved() {
                return Err(RegistrationError::UnresolvedType(format!(
                    "field {}.{field}",
                    shape.name
                )));
            }
        }
        if let Some(identity) = &shape.identity {
            if shape.field_index(identity).is_none() {
                return Err(RegistrationError::UnknownIdentity {
                    shape: shape.name.clone(),
                    field: identity.clone(),
                });
            }
        }
        tracing::debug!(shape = %shape.name, fields = shape.fields.len(), "registered shape");
        self.shapes.insert(shape.name.clone(), shape);
        Ok(())
    }

    /// Registers an extension member. Nothing is registered if the declaration
    /// is rejected.
    pub fn register_member(&mut self, member: MemberDecl) -> Result<(), RegistrationError> {
        let resolved = member.receiver.is_resolved()
            && member.ret.is_resolved()
            && member.args.iter().all(Type::is_resolved);
        if !resolved {
            return Err(RegistrationError::UnresolvedType(format!(
                "member {}",
                member.signature()
            )));
        }
        if builtins::lookup_member(&member.receiver, &member.name, &member.args).is_some() {
            return Err(RegistrationError::BuiltinConflict(member.signature()));
        }
        let key = member.key();
        if self.members.contains_key(&key) {
            return Err(RegistrationError::DuplicateMember(member.signature()));
        }
        tracing::debug!(member = %member.signature(), "registered member");
        self.members.insert(key, member);
        Ok(())
    }

    pub fn shape(&self, name: &str) -> Option<&ShapeDecl> {
        self.shapes.get(name)
    }

    /// Exact-match member lookup. No conversion is applied to receiver or
    /// argument types.
    pub fn member(&self, receiver: &Type, name: &str, args: &[Type]) -> Option<&MemberDecl> {
        let key = MemberKey {
            receiver: receiver.clone(),
            name: name.to_string(),
            args: args.to_vec(),
        };
        self.members.get(&key)
    }

    /// Checks that every referenced shape exists and freezes the registry.
    pub fn seal(self) -> Result<SealedRegistry, RegistrationError> {
        for shape in self.shapes.values() {
            for (field, ty) in &shape.fields {
                self.require_shape(ty, || format!("field {}.{field}", shape.name))?;
            }
        }
        for member in self.members.values() {
            self.require_shape(&member.receiver, || format!("member {}", member.signature()))?;
            self.require_shape(&member.ret, || format!("member {}", member.signature()))?;
            for arg in &member.args {
                self.require_shape(arg, || format!("member {}", member.signature()))?;
            }
        }
        tracing::debug!(
            shapes = self.shapes.len(),
            members = self.members.len(),
            "sealed type registry"
        );
        Ok(SealedRegistry {
            inner: Arc::new(self),
        })
    }

    fn require_shape(
        &self,
        ty: &Type,
        context: impl FnOnce() -> String,
    ) -> Result<(), RegistrationError> {
        match ty.referenced_shape() {
            Some(shape) if !self.shapes.contains_key(shape) => {
                Err(RegistrationError::UnknownShape {
                    context: context(),
                    shape: shape.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// A frozen, cheaply clonable registry that can be shared across threads.
#[derive(Debug, Clone)]
pub struct SealedRegistry {
    inner: Arc<TypeRegistry>,
}

impl Deref for SealedRegistry {
    type Target = TypeRegistry;

    fn deref(&self) -> &TypeRegistry {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user_shape() -> ShapeDecl {
        ShapeDecl::new("User")
            .field("id", Type::String)
            .field("name", Type::String)
            .identity("id")
    }

    fn mfa_age() -> MemberDecl {
        MemberDecl::new(Type::named("User"), "multiFactorAuthAge", vec![], Type::UInt)
    }

    #[test]
    fn registers_and_looks_up() {
        let mut reg = TypeRegistry::new();
        reg.register_shape(user_shape()).expect("shape");
        reg.register_member(mfa_age()).expect("member");
        let sealed = reg.seal().expect("seal");

        let shape = sealed.shape("User").expect("User registered");
        assert_eq!(shape.field_index("name"), Some((1, &Type::String)));
        assert_eq!(shape.field_index("missing"), None);
        assert_eq!(
            sealed.member(&Type::named("User"), "multiFactorAuthAge", &[]),
            Some(&mfa_age())
        );
    }

    #[test]
    fn member_lookup_is_exact() {
        let mut reg = TypeRegistry::new();
        reg.register_shape(user_shape()).expect("shape");
        reg.register_member(MemberDecl::new(
            Type::named("User"),
            "within",
            vec![Type::UInt],
            Type::Bool,
        ))
        .expect("member");
        assert!(reg
            .member(&Type::named("User"), "within", &[Type::Int])
            .is_none());
        assert!(reg
            .member(&Type::named("User"), "within", &[Type::UInt])
            .is_some());
    }

    #[test]
    fn duplicate_member_is_rejected_atomically() {
        let mut reg = TypeRegistry::new();
        reg.register_shape(user_shape()).expect("shape");
        reg.register_member(mfa_age()).expect("first");

        let mut conflicting = mfa_age();
        conflicting.ret = Type::Int;
        let err = reg.register_member(conflicting).expect_err("duplicate");
        assert_eq!(
            err,
            RegistrationError::DuplicateMember("User.multiFactorAuthAge() -> int".into())
        );
        assert_eq!(
            reg.member(&Type::named("User"), "multiFactorAuthAge", &[])
                .map(|m| &m.ret),
            Some(&Type::UInt)
        );
    }

    #[test]
    fn overloads_by_argument_types_are_allowed() {
        let mut reg = TypeRegistry::new();
        reg.register_shape(user_shape()).expect("shape");
        let user = Type::named("User");
        reg.register_member(MemberDecl::new(user.clone(), "f", vec![Type::Int], Type::Bool))
            .expect("int overload");
        reg.register_member(MemberDecl::new(user, "f", vec![Type::UInt], Type::Bool))
            .expect("uint overload");
    }

    #[test]
    fn builtin_collision_is_rejected() {
        let mut reg = TypeRegistry::new();
        let err = reg
            .register_member(MemberDecl::new(
                Type::String,
                "lowerAscii",
                vec![],
                Type::String,
            ))
            .expect_err("collides");
        assert!(matches!(err, RegistrationError::BuiltinConflict(_)));
    }

    #[test]
    fn duplicate_shape_and_field() {
        let mut reg = TypeRegistry::new();
        reg.register_shape(user_shape()).expect("shape");
        assert_eq!(
            reg.register_shape(ShapeDecl::new("User")),
            Err(RegistrationError::DuplicateShape("User".into()))
        );
        let err = reg
            .register_shape(
                ShapeDecl::new("Tag")
                    .field("key", Type::String)
                    .field("key", Type::Int),
            )
            .expect_err("duplicate field");
        assert!(matches!(err, RegistrationError::DuplicateField { .. }));
        assert!(reg.shape("Tag").is_none());
    }

    #[test]
    fn identity_must_name_a_field() {
        let mut reg = TypeRegistry::new();
        let err = reg
            .register_shape(ShapeDecl::new("User").field("name", Type::String).identity("id"))
            .expect_err("bad identity");
        assert!(matches!(err, RegistrationError::UnknownIdentity { .. }));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut reg = TypeRegistry::new();
        let err = reg
            .register_shape(ShapeDecl::new("User").field("x", Type::list(Type::Unknown)))
            .expect_err("unresolved");
        assert!(matches!(err, RegistrationError::UnresolvedType(_)));
    }

    #[test]
    fn seal_requires_referenced_shapes() {
        let mut reg = TypeRegistry::new();
        reg.register_shape(ShapeDecl::new("User").field("tags", Type::list(Type::named("Tag"))))
            .expect("shape");
        let err = reg.seal().expect_err("Tag missing");
        assert_eq!(
            err,
            RegistrationError::UnknownShape {
                context: "field User.tags".into(),
                shape: "Tag".into(),
            }
        );
    }

    #[test]
    fn sealed_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SealedRegistry>();
    }
}
