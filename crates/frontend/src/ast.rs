#![forbid(unsafe_code)]

/// An untyped expression node. `offset` is the byte offset of the token that
/// introduced the node: the operator for unary/binary nodes, the `.` for field
/// access and member calls, `?` for conditionals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(Ident),
    Field(FieldAccess),
    Call(Call),
    Comprehension(Comprehension),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Conditional(Box<Conditional>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccess {
    pub base: Box<Expr>,
    pub name: Ident,
}

/// `base.member(args)`, or `member(args)` when `base` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub base: Option<Box<Expr>>,
    pub member: Ident,
    pub args: Vec<Expr>,
}

/// `base.exists(var, predicate)` and friends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comprehension {
    pub base: Box<Expr>,
    pub quantifier: Quantifier,
    pub var: Ident,
    pub predicate: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Exists,
    All,
    ExistsOne,
}

impl Quantifier {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "exists" => Some(Quantifier::Exists),
            "all" => Some(Quantifier::All),
            "exists_one" => Some(Quantifier::ExistsOne),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quantifier::Exists => "exists",
            Quantifier::All => "all",
            Quantifier::ExistsOne => "exists_one",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinaryOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional {
    pub test: Expr,
    pub then_branch: Expr,
    pub else_branch: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    /// Overload name used in diagnostics.
    pub fn overload_name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-_",
            UnaryOp::Not => "!_",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Overload name used in diagnostics, e.g. `_>_`.
    pub fn overload_name(self) -> String {
        format!("_{}_", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
}
