#![forbid(unsafe_code)]

use crate::store::MFA_AGE_MEMBER;
use frontend::{MemberDecl, RegistrationError, SealedRegistry, ShapeDecl, Type, TypeRegistry};
use interp::{StructValue, Value};
use thiserror::Error;

pub const USER_SHAPE: &str = "User";
pub const TAG_SHAPE: &str = "Tag";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubjectError {
    #[error("{path}: expected {expected}")]
    WrongType { path: String, expected: String },
    #[error("{path}: missing field {field}")]
    MissingField { path: String, field: String },
    #[error("{path}: unexpected field {field}")]
    UnexpectedField { path: String, field: String },
    #[error("{path}: shape {shape} is not registered")]
    UnknownShape { path: String, shape: String },
}

/// Shapes and members of the demo user subject.
pub fn demo_registry() -> Result<SealedRegistry, RegistrationError> {
    let mut reg = TypeRegistry::new();
    reg.register_shape(ShapeDecl::new(TAG_SHAPE).field("key", Type::String))?;
    reg.register_shape(
        ShapeDecl::new(USER_SHAPE)
            .field("id", Type::String)
            .field("name", Type::String)
            .field("tags", Type::list(Type::named(TAG_SHAPE)))
            .identity("id"),
    )?;
    reg.register_member(MemberDecl::new(
        Type::named(USER_SHAPE),
        MFA_AGE_MEMBER,
        vec![],
        Type::UInt,
    ))?;
    reg.seal()
}

pub fn demo_subject() -> Value {
    let tag = |key: &str| Value::from(StructValue::new(TAG_SHAPE).with("key", Value::str(key)));
    StructValue::new(USER_SHAPE)
        .with("id", Value::str("2b9c3f4e-7d1a-4c55-9e0b-6a8f1d2c3b4a"))
        .with("name", Value::str("johndoe"))
        .with("tags", Value::List(vec![tag("foo"), tag("bar")]))
        .into()
}

/// Builds a value of type `ty` from JSON. Struct fields are taken in the
/// shape's declared order regardless of their order in the document.
pub fn from_json(
    registry: &TypeRegistry,
    ty: &Type,
    json: &serde_json::Value,
) -> Result<Value, SubjectError> {
    convert(registry, ty, json, "subject")
}

fn convert(
    registry: &TypeRegistry,
    ty: &Type,
    json: &serde_json::Value,
    path: &str,
) -> Result<Value, SubjectError> {
    let wrong_type = || SubjectError::WrongType {
        path: path.to_string(),
        expected: ty.to_string(),
    };
    match ty {
        Type::Bool => json.as_bool().map(Value::Bool).ok_or_else(wrong_type),
        Type::Int => json.as_i64().map(Value::Int).ok_or_else(wrong_type),
        Type::UInt => json.as_u64().map(Value::UInt).ok_or_else(wrong_type),
        Type::String => json.as_str().map(Value::str).ok_or_else(wrong_type),
        Type::List(elem) => {
            let items = json.as_array().ok_or_else(wrong_type)?;
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| convert(registry, elem, item, &format!("{path}[{idx}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        Type::Struct(shape_name) => {
            let object = json.as_object().ok_or_else(wrong_type)?;
            let shape = registry
                .shape(shape_name)
                .ok_or_else(|| SubjectError::UnknownShape {
                    path: path.to_string(),
                    shape: shape_name.clone(),
                })?;
            if let Some(extra) = object.keys().find(|k| shape.field_index(k).is_none()) {
                return Err(SubjectError::UnexpectedField {
                    path: path.to_string(),
                    field: extra.clone(),
                });
            }
            let mut value = StructValue::new(shape_name.clone());
            for (field, field_ty) in &shape.fields {
                let raw = object.get(field).ok_or_else(|| SubjectError::MissingField {
                    path: path.to_string(),
                    field: field.clone(),
                })?;
                let converted = convert(registry, field_ty, raw, &format!("{path}.{field}"))?;
                value = value.with(field.clone(), converted);
            }
            Ok(value.into())
        }
        Type::Unknown => Err(wrong_type()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn demo_subject_conforms_to_demo_registry() {
        let registry = demo_registry().expect("registry");
        assert_eq!(
            interp::conforms(&demo_subject(), &Type::named(USER_SHAPE), &registry),
            Ok(())
        );
    }

    #[test]
    fn json_fields_follow_declared_order() {
        let registry = demo_registry().expect("registry");
        let doc = json!({
            "tags": [{"key": "foo"}],
            "name": "alice",
            "id": "u-7",
        });
        let value = from_json(&registry, &Type::named(USER_SHAPE), &doc).expect("convert");
        let Value::Struct(user) = &value else {
            panic!("expected struct");
        };
        let names = user.fields.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(names, vec!["id", "name", "tags"]);
        assert_eq!(
            interp::conforms(&value, &Type::named(USER_SHAPE), &registry),
            Ok(())
        );
    }

    #[test]
    fn missing_and_extra_fields_are_rejected() {
        let registry = demo_registry().expect("registry");
        let user = Type::named(USER_SHAPE);
        let err =
            from_json(&registry, &user, &json!({"id": "u", "name": "n"})).expect_err("missing");
        assert_eq!(
            err,
            SubjectError::MissingField {
                path: "subject".into(),
                field: "tags".into(),
            }
        );
        let err = from_json(
            &registry,
            &user,
            &json!({"id": "u", "name": "n", "tags": [], "email": "x"}),
        )
        .expect_err("extra");
        assert!(matches!(err, SubjectError::UnexpectedField { .. }));
    }

    #[test]
    fn nested_type_errors_carry_path() {
        let registry = demo_registry().expect("registry");
        let err = from_json(
            &registry,
            &Type::named(USER_SHAPE),
            &json!({"id": "u", "name": "n", "tags": [{"key": 1}]}),
        )
        .expect_err("bad key");
        assert_eq!(
            err,
            SubjectError::WrongType {
                path: "subject.tags[0].key".into(),
                expected: "string".into(),
            }
        );
    }
}
