#![forbid(unsafe_code)]

use crate::value::Value;

pub type ResolveError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies values for registered extension members.
///
/// `identity` is the receiver's identity field when its shape declares one,
/// otherwise the receiver value itself. The evaluator calls this synchronously,
/// never retries and never caches; implementations that need timeouts, retries
/// or caching must provide them and report failures as errors.
pub trait ExtensionResolver {
    fn resolve(
        &self,
        member: &str,
        identity: &Value,
        args: &[Value],
    ) -> Result<Value, ResolveError>;
}

impl<F> ExtensionResolver for F
where
    F: Fn(&str, &Value, &[Value]) -> Result<Value, ResolveError>,
{
    fn resolve(
        &self,
        member: &str,
        identity: &Value,
        args: &[Value],
    ) -> Result<Value, ResolveError> {
        self(member, identity, args)
    }
}

/// Resolver for programs that use no extension members. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtensions;

impl ExtensionResolver for NoExtensions {
    fn resolve(
        &self,
        member: &str,
        _identity: &Value,
        _args: &[Value],
    ) -> Result<Value, ResolveError> {
        Err(format!("no resolver configured for {member}").into())
    }
}
