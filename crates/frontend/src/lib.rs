#![forbid(unsafe_code)]

//! Front half of the condition engine: lexing, parsing, the type registry and
//! type checking. [`compile`] runs all of them and yields a [`Program`] that can
//! be evaluated any number of times.

pub mod ast;
pub mod builtins;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod typecheck;
pub mod typed;
pub mod types;

pub use lexer::{tokenize, LexError, Token, TokenKind};
pub use parser::{parse, ParserError, SyntaxError};
pub use registry::{MemberDecl, RegistrationError, SealedRegistry, ShapeDecl, TypeRegistry};
pub use typecheck::{TypeChecker, TypeError, SUBJECT};
pub use typed::TypedExpr;
pub use types::Type;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl CompileError {
    pub fn offset(&self) -> usize {
        match self {
            CompileError::Lex(e) => e.offset(),
            CompileError::Syntax(e) => e.offset,
            CompileError::Type(e) => e.offset(),
        }
    }

    /// Human-readable diagnostic pointing into `source`.
    pub fn render(&self, source: &str) -> String {
        diagnostic::render(source, self.offset(), &self.to_string())
    }
}

impl From<ParserError> for CompileError {
    fn from(err: ParserError) -> Self {
        match err {
            ParserError::Lexer(e) => CompileError::Lex(e),
            ParserError::Syntax(e) => CompileError::Syntax(e),
        }
    }
}

/// A checked expression bound to the registry and subject shape it was
/// compiled against. Immutable; safe to share and evaluate concurrently.
#[derive(Debug, Clone)]
pub struct Program {
    registry: SealedRegistry,
    shape: String,
    root: TypedExpr,
}

impl Program {
    pub fn registry(&self) -> &SealedRegistry {
        &self.registry
    }

    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn root(&self) -> &TypedExpr {
        &self.root
    }

    pub fn result_type(&self) -> &Type {
        &self.root.ty
    }
}

/// Parses and type-checks `source` with `subject` bound to a value of `shape`.
#[tracing::instrument(level = "debug", skip(registry, source), err)]
pub fn compile(
    registry: &SealedRegistry,
    source: &str,
    shape: &str,
) -> Result<Program, CompileError> {
    let expr = parse(source)?;
    let root = TypeChecker::new(registry, shape)?.check(&expr)?;
    tracing::debug!(result_type = %root.ty, "compiled expression");
    Ok(Program {
        registry: registry.clone(),
        shape: shape.to_string(),
        root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> SealedRegistry {
        let mut reg = TypeRegistry::new();
        reg.register_shape(ShapeDecl::new("User").field("name", Type::String))
            .expect("shape");
        reg.seal().expect("seal")
    }

    #[test]
    fn compiles_to_typed_program() {
        let program = compile(&registry(), r#"subject.name == "x""#, "User").expect("compile");
        assert_eq!(program.result_type(), &Type::Bool);
        assert_eq!(program.shape(), "User");
    }

    #[test]
    fn each_stage_reports_its_own_error() {
        let reg = registry();
        assert!(matches!(
            compile(&reg, "subject.name == \"x", "User"),
            Err(CompileError::Lex(_))
        ));
        assert!(matches!(
            compile(&reg, "subject.name ==", "User"),
            Err(CompileError::Syntax(_))
        ));
        assert!(matches!(
            compile(&reg, "subject.name > 0", "User"),
            Err(CompileError::Type(_))
        ));
    }

    #[test]
    fn renders_type_error_like_a_checker_diagnostic() {
        let src = "subject.name > 0";
        let err = compile(&registry(), src, "User").expect_err("ill-typed");
        assert_eq!(
            err.render(src),
            concat!(
                "ERROR: <input>:1:14: found no matching overload for '_>_' applied to '(string, int)'\n",
                " | subject.name > 0\n",
                " | .............^",
            )
        );
    }
}
