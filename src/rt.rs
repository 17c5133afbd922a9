use std::fmt::Display;

use crate::{
    ast::{BinaryOp, Expr, Literal, UnaryOp},
    JacNumber,
};

/// A runtime representation of a Jacaranta value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'src> {
    /// A floating point number, what every arithmetic operator produces.
    Float(JacNumber),

    /// An integer, produced by integer literals and by `%`.
    Int(i64),

    /// A string, borrowed from the source it was written in.
    String(&'src str),

    /// A boolean.
    Bool(bool),
}

impl<'src> Value<'src> {
    /// The numeric projection of the value.
    /// Booleans project to `1.0` and `0.0`, strings have no projection.
    pub fn numeric(&self) -> Option<JacNumber> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as JacNumber),
            Value::Bool(b) => Some(JacNumber::from(u8::from(*b))),
            Value::String(_) => None,
        }
    }

    fn expect_numeric(&self, operator: &'static str) -> Result<JacNumber, EvalError<'src>> {
        self.numeric().ok_or_else(|| EvalError::NotNumeric {
            operand: self.clone(),
            operator,
        })
    }

    fn arithmetic(
        &self,
        right: &Value<'src>,
        op: BinaryOp,
        f: impl Fn(JacNumber, JacNumber) -> JacNumber,
    ) -> Evaluation<'src> {
        let a = self.expect_numeric(op.symbol())?;
        let b = right.expect_numeric(op.symbol())?;
        Ok(Value::Float(f(a, b)))
    }

    /// Remainder of both operands truncated toward zero.
    fn modulo(&self, right: &Value<'src>) -> Evaluation<'src> {
        // Float to integer casts truncate toward zero and saturate
        let a = self.expect_numeric(BinaryOp::Mod.symbol())? as i64;
        let b = right.expect_numeric(BinaryOp::Mod.symbol())? as i64;

        if b == 0 {
            return Err(EvalError::DivisionByZero);
        }

        // `i64::MIN % -1` overflows, its remainder is 0 either way
        Ok(Value::Int(a.wrapping_rem(b)))
    }

    /// Strings compare by code point, everything else by numeric projection.
    fn compare(&self, right: &Value<'src>, op: BinaryOp) -> Evaluation<'src> {
        let result = match (self, right) {
            (Value::String(a), Value::String(b)) => relate(op, *a, *b),
            (a, b) => relate(
                op,
                &a.expect_numeric(op.symbol())?,
                &b.expect_numeric(op.symbol())?,
            ),
        };

        Ok(Value::Bool(result))
    }
}

fn relate<T: PartialOrd + ?Sized>(op: BinaryOp, a: &T, b: &T) -> bool {
    match op {
        BinaryOp::Equal => a == b,
        BinaryOp::NotEqual => a != b,
        BinaryOp::GreaterThan => a > b,
        BinaryOp::GreaterThanEqual => a >= b,
        BinaryOp::LessThan => a < b,
        BinaryOp::LessThanEqual => a <= b,
        _ => unreachable!("Not a relational operator"),
    }
}

impl<'src> Display for Value<'src> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Debug formatting keeps the fractional part of whole floats
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError<'src> {
    #[error("Operand {operand} of operator \"{operator}\" is not numeric.")]
    NotNumeric {
        operand: Value<'src>,
        operator: &'static str,
    },

    #[error("Number literal \"{0}\" is malformed.")]
    MalformedNumber(&'src str),

    #[error("Division by zero.")]
    DivisionByZero,
}

type Evaluation<'src> = Result<Value<'src>, EvalError<'src>>;

/// Our tree-walk evaluator.
///
/// It holds no state, so the same tree can be evaluated any number of times
/// and always yields the same value.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeWalker;

impl TreeWalker {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate<'src>(&self, expr: &Expr<'src>) -> Evaluation<'src> {
        let value = self.evaluate_expression(expr)?;
        log::debug!("evaluated {expr} to {value}");
        Ok(value)
    }

    fn evaluate_expression<'src>(&self, expr: &Expr<'src>) -> Evaluation<'src> {
        match expr {
            Expr::Literal(literal) => self.evaluate_literal(*literal),
            Expr::Grouping { expr } => self.evaluate_grouping(expr),
            Expr::Unary { op, expr } => self.evaluate_unary(*op, expr),
            Expr::Binary { left, op, right } => self.evaluate_binary(left, *op, right),
        }
    }

    fn evaluate_literal<'src>(&self, literal: Literal<'src>) -> Evaluation<'src> {
        match literal {
            Literal::Integer(n) => n
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| EvalError::MalformedNumber(n)),
            Literal::Float(n) => n
                .parse::<JacNumber>()
                .map(Value::Float)
                .map_err(|_| EvalError::MalformedNumber(n)),
            Literal::String(s) => Ok(Value::String(s)),
            Literal::True => Ok(Value::Bool(true)),
            Literal::False => Ok(Value::Bool(false)),
        }
    }

    fn evaluate_grouping<'src>(&self, expr: &Expr<'src>) -> Evaluation<'src> {
        let value = self.evaluate_expression(expr)?;

        // Numeric groupings are normalized to floats, like arithmetic results
        Ok(match value.numeric() {
            Some(n) => Value::Float(n),
            None => value,
        })
    }

    fn evaluate_unary<'src>(&self, op: UnaryOp, expr: &Expr<'src>) -> Evaluation<'src> {
        let value = self.evaluate_expression(expr)?;
        let n = value.expect_numeric(op.symbol())?;

        match op {
            UnaryOp::Minus => Ok(Value::Float(-n)),
            UnaryOp::LogicalNot => Ok(Value::Bool(n == 0.0)),
        }
    }

    fn evaluate_binary<'src>(
        &self,
        left: &Expr<'src>,
        op: BinaryOp,
        right: &Expr<'src>,
    ) -> Evaluation<'src> {
        let left = self.evaluate_expression(left)?;
        let right = self.evaluate_expression(right)?;

        match op {
            // Arithmetic
            BinaryOp::Add => left.arithmetic(&right, op, |a, b| a + b),
            BinaryOp::Sub => left.arithmetic(&right, op, |a, b| a - b),
            BinaryOp::Mul => left.arithmetic(&right, op, |a, b| a * b),
            BinaryOp::Div => left.arithmetic(&right, op, |a, b| a / b),
            BinaryOp::Mod => left.modulo(&right),

            // Relational
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterThanEqual
            | BinaryOp::LessThan
            | BinaryOp::LessThanEqual => left.compare(&right, op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::Scanner, syntax::Parser};

    fn eval(source: &str) -> Evaluation<'_> {
        let tokens = Scanner::new(source).scan().unwrap();
        let expr = Parser::new(tokens).parse().unwrap();
        TreeWalker::new().evaluate(&expr)
    }

    #[test]
    fn literals_keep_their_kind() {
        assert_eq!(eval("7").unwrap(), Value::Int(7));
        assert_eq!(eval("2.5").unwrap(), Value::Float(2.5));
        assert_eq!(eval("\"abc\"").unwrap(), Value::String("abc"));
        assert_eq!(eval("True").unwrap(), Value::Bool(true));
    }

    #[test]
    fn strings_borrow_from_the_source() {
        let source = "(\"abc\") == \"abc\"";
        let Value::String(s) = eval(&source[..7]).unwrap() else {
            panic!("expected a string");
        };
        assert!(std::ptr::eq(s, &source[2..5]));
    }

    #[test]
    fn arithmetic_produces_floats() {
        assert_eq!(eval("1 + 2").unwrap(), Value::Float(3.0));
        assert_eq!(eval("1 - 2 - 3").unwrap(), Value::Float(-4.0));
        assert_eq!(eval("2 + 3 * 4").unwrap(), Value::Float(14.0));
        assert_eq!(eval("(2 + 3) * 4").unwrap(), Value::Float(20.0));
        assert_eq!(eval("7 / 2").unwrap(), Value::Float(3.5));
        assert_eq!(eval("true + true").unwrap(), Value::Float(2.0));
    }

    #[test]
    fn division_by_zero_follows_ieee() {
        assert_eq!(eval("1 / 0").unwrap(), Value::Float(JacNumber::INFINITY));
    }

    #[test]
    fn modulus_truncates() {
        assert_eq!(eval("7 % -2").unwrap(), Value::Int(1));
        assert_eq!(eval("-7 % 2").unwrap(), Value::Int(-1));
        assert_eq!(eval("7.9 % 2.5").unwrap(), Value::Int(1));
        assert_eq!(eval("7 % 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("7 % 0.5"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn unary_operators() {
        assert_eq!(eval("--5").unwrap(), Value::Float(5.0));
        assert_eq!(eval("-2").unwrap(), Value::Float(-2.0));
        assert_eq!(eval("!true").unwrap(), Value::Bool(false));
        assert_eq!(eval("!!false").unwrap(), Value::Bool(false));
        assert_eq!(eval("!0").unwrap(), Value::Bool(true));
        assert_eq!(eval("!(1 > 2)").unwrap(), Value::Bool(true));
        assert!(matches!(
            eval("-\"a\""),
            Err(EvalError::NotNumeric { operator: "-", .. })
        ));
        assert!(matches!(
            eval("!\"a\""),
            Err(EvalError::NotNumeric { operator: "!", .. })
        ));
    }

    #[test]
    fn groupings_normalize_numbers() {
        assert_eq!(eval("(3)").unwrap(), Value::Float(3.0));
        assert_eq!(eval("(true)").unwrap(), Value::Float(1.0));
        assert_eq!(eval("(\"s\")").unwrap(), Value::String("s"));
    }

    #[test]
    fn numeric_comparisons() {
        assert_eq!(eval("1 < 2").unwrap(), Value::Bool(true));
        assert_eq!(eval("2 <= 2.0").unwrap(), Value::Bool(true));
        assert_eq!(eval("3 > 4").unwrap(), Value::Bool(false));
        assert_eq!(eval("true == 1").unwrap(), Value::Bool(true));
        assert_eq!(eval("false != 0").unwrap(), Value::Bool(false));
        assert_eq!(eval("1 + 1 >= 2").unwrap(), Value::Bool(true));
    }

    #[test]
    fn string_comparisons() {
        assert_eq!(eval("\"a\" == \"a\"").unwrap(), Value::Bool(true));
        assert_eq!(eval("\"a\" != \"b\"").unwrap(), Value::Bool(true));
        assert_eq!(eval("\"a\" < \"b\"").unwrap(), Value::Bool(true));
        assert_eq!(eval("\"B\" > \"a\"").unwrap(), Value::Bool(false));
        assert_eq!(eval("\"ab\" >= \"a\"").unwrap(), Value::Bool(true));
    }

    #[test]
    fn no_coercion_between_strings_and_numbers() {
        assert_eq!(
            eval("\"a\" + 1"),
            Err(EvalError::NotNumeric {
                operand: Value::String("a"),
                operator: "+",
            })
        );
        assert!(matches!(
            eval("1 == \"1\""),
            Err(EvalError::NotNumeric { operator: "==", .. })
        ));
        assert!(matches!(
            eval("\"a\" * \"b\""),
            Err(EvalError::NotNumeric { .. })
        ));
    }

    #[test]
    fn malformed_numbers() {
        assert_eq!(eval("1.2.3"), Err(EvalError::MalformedNumber("1.2.3")));
        assert_eq!(
            eval("99999999999999999999"),
            Err(EvalError::MalformedNumber("99999999999999999999"))
        );
        assert_eq!(eval("1."), Ok(Value::Float(1.0)));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Float(14.0).to_string(), "14.0");
        assert_eq!(Value::Float(0.5).to_string(), "0.5");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::String("x").to_string(), "\"x\"");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
