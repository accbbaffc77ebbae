//! Operator enums shared by the parser and the evaluator.

use std::fmt;

/// Binary operator.
///
/// Boolean `and`/`or` are not here: they short-circuit, so the
/// evaluator handles them as a distinct instruction kind ([`BoolOp`]).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// True division. Always yields a float for numeric operands.
    Div,
    /// Floor division. Truncates toward negative infinity.
    FloorDiv,
    /// Modulo. The result takes the sign of the divisor.
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
}

impl BinaryOp {
    /// The operator's source-level symbol, for error messages.
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtE => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtE => ">=",
            BinaryOp::In => "in",
            BinaryOp::NotIn => "not in",
        }
    }

    /// Whether this is a comparison operator.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtE
                | BinaryOp::Gt
                | BinaryOp::GtE
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

/// Short-circuiting boolean operator.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    /// The operator's source-level symbol.
    pub fn as_symbol(self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

/// Unary operator.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation (`-x`).
    Neg,
    /// Logical negation (`not x`).
    Not,
}

impl UnaryOp {
    /// The operator's source-level symbol.
    pub fn as_symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not",
        }
    }
}
