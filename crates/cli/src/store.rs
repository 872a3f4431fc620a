#![forbid(unsafe_code)]

use interp::{ExtensionResolver, ResolveError, Value};
use thiserror::Error;

pub const MFA_AGE_MEMBER: &str = "multiFactorAuthAge";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("multi-factor auth store is unavailable")]
    Unavailable,
    #[error("no multi-factor auth record for user {0}")]
    NotFound(String),
}

/// Source of multi-factor authentication facts about users.
pub trait MultiFactorAuthStore: Send + Sync {
    /// Seconds since `user_id` last completed multi-factor authentication.
    fn multi_factor_auth_age(&self, user_id: &str) -> Result<u64, StoreError>;
}

/// Store stand-in reporting the same age for every user.
#[derive(Debug, Clone)]
pub struct SimulatedStore {
    age: Option<u64>,
}

impl SimulatedStore {
    pub fn new(age: u64) -> Self {
        Self { age: Some(age) }
    }

    pub fn unavailable() -> Self {
        Self { age: None }
    }
}

impl MultiFactorAuthStore for SimulatedStore {
    fn multi_factor_auth_age(&self, user_id: &str) -> Result<u64, StoreError> {
        if user_id.is_empty() {
            return Err(StoreError::NotFound(user_id.to_string()));
        }
        self.age.ok_or(StoreError::Unavailable)
    }
}

/// Serves extension members backed by a [`MultiFactorAuthStore`].
#[derive(Debug)]
pub struct StoreResolver<S> {
    store: S,
}

impl<S> StoreResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: MultiFactorAuthStore> ExtensionResolver for StoreResolver<S> {
    fn resolve(
        &self,
        member: &str,
        identity: &Value,
        args: &[Value],
    ) -> Result<Value, ResolveError> {
        match (member, identity, args) {
            (MFA_AGE_MEMBER, Value::Str(user_id), []) => {
                let age = self.store.multi_factor_auth_age(user_id)?;
                Ok(Value::UInt(age))
            }
            (MFA_AGE_MEMBER, other, _) => {
                Err(format!("{MFA_AGE_MEMBER} expects a user id, got {}", other.kind()).into())
            }
            (other, _, _) => Err(format!("unsupported member {other}").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_age_by_user_id() {
        let resolver = StoreResolver::new(SimulatedStore::new(1000));
        let v = resolver
            .resolve(MFA_AGE_MEMBER, &Value::str("u-1"), &[])
            .expect("age");
        assert_eq!(v, Value::UInt(1000));
    }

    #[test]
    fn unavailable_store_surfaces_as_error() {
        let resolver = StoreResolver::new(SimulatedStore::unavailable());
        let err = resolver
            .resolve(MFA_AGE_MEMBER, &Value::str("u-1"), &[])
            .expect_err("unavailable");
        assert_eq!(err.to_string(), "multi-factor auth store is unavailable");
    }

    #[test]
    fn unknown_member_is_rejected() {
        let resolver = StoreResolver::new(SimulatedStore::new(1));
        assert!(resolver.resolve("lastLogin", &Value::str("u-1"), &[]).is_err());
        assert!(resolver.resolve(MFA_AGE_MEMBER, &Value::Int(1), &[]).is_err());
    }
}
