use std::fmt::Display;

use crate::lex::TokenKind;

/// An expression tree. Every node exclusively owns its children.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'src> {
    Literal(Literal<'src>),
    Grouping {
        expr: Box<Expr<'src>>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr<'src>>,
    },
    Binary {
        left: Box<Expr<'src>>,
        op: BinaryOp,
        right: Box<Expr<'src>>,
    },
}

impl<'src> Expr<'src> {
    pub fn grouping(expr: Expr<'src>) -> Self {
        Expr::Grouping {
            expr: Box::new(expr),
        }
    }

    pub fn unary(op: UnaryOp, expr: Expr<'src>) -> Self {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn binary(left: Expr<'src>, op: BinaryOp, right: Expr<'src>) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }
}

/// Renders the tree in a parenthesized prefix form, e.g. `(+ 2 (* 3 4))`.
impl<'src> Display for Expr<'src> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Grouping { expr } => write!(f, "(group {expr})"),
            Expr::Unary { op, expr } => write!(f, "({op} {expr})"),
            Expr::Binary { left, op, right } => write!(f, "({op} {left} {right})"),
        }
    }
}

/// A literal value in the Jacaranta language.
/// Numbers keep their source text, they are only parsed when evaluated.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Literal<'src> {
    Integer(&'src str),
    Float(&'src str),
    String(&'src str),
    True,
    False,
}

impl<'src> Display for Literal<'src> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Integer(n) | Literal::Float(n) => write!(f, "{n}"),
            Literal::String(s) => write!(f, "\"{s}\""),
            Literal::True => write!(f, "true"),
            Literal::False => write!(f, "false"),
        }
    }
}

/// The unary operators in the Jacaranta language.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    LogicalNot,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::LogicalNot => "!",
        }
    }
}

impl From<TokenKind> for UnaryOp {
    /// Constructs a `UnaryOp` from it's equivalent `TokenKind` counterpart.
    /// Panics if the token is not a valid unary operator.
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::Bang => UnaryOp::LogicalNot,
            _ => unreachable!("Invalid token for unary operator"),
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The binary operators in the Jacaranta language.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    // Relational
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanEqual => ">=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanEqual => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

impl From<TokenKind> for BinaryOp {
    /// Constructs a `BinaryOp` from it's equivalent `TokenKind` counterpart.
    /// Panics if the token is not a valid binary operator.
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::EqualEqual => BinaryOp::Equal,
            TokenKind::BangEqual => BinaryOp::NotEqual,
            TokenKind::Greater => BinaryOp::GreaterThan,
            TokenKind::GreaterEqual => BinaryOp::GreaterThanEqual,
            TokenKind::Less => BinaryOp::LessThan,
            TokenKind::LessEqual => BinaryOp::LessThanEqual,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            _ => unreachable!("Invalid token for binary operator"),
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_prefix_form() {
        let expr = Expr::binary(
            Expr::grouping(Expr::binary(
                Expr::Literal(Literal::Integer("2")),
                BinaryOp::Add,
                Expr::Literal(Literal::Float("3.5")),
            )),
            BinaryOp::Mul,
            Expr::unary(UnaryOp::Minus, Expr::Literal(Literal::String("x"))),
        );

        assert_eq!(expr.to_string(), "(* (group (+ 2 3.5)) (- \"x\"))");
    }

    #[test]
    fn operators_from_tokens() {
        assert_eq!(BinaryOp::from(TokenKind::Percent), BinaryOp::Mod);
        assert_eq!(BinaryOp::from(TokenKind::LessEqual), BinaryOp::LessThanEqual);
        assert_eq!(UnaryOp::from(TokenKind::Bang), UnaryOp::LogicalNot);
        assert_eq!(UnaryOp::from(TokenKind::Minus).to_string(), "-");
    }
}
