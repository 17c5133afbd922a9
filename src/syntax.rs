use std::{iter::Peekable, vec::IntoIter};

use crate::{
    ast::{BinaryOp, Expr, Literal, UnaryOp},
    lex::{Token, TokenKind},
};

/// Takes a parser and a pattern over `TokenKind`, consuming and returning the next token if it matches the pattern - otherwise returns a peek of the next token.
macro_rules! chase {
    ($parser:expr, $pattern:pat $(,)?) => {{
        if let Some(token) = $parser.tokens.next_if(|next| matches!(next.kind, $pattern)) {
            Found(token)
        } else {
            NotFound($parser.current())
        }
    }};
}

/// Recursive-descent parser for a single expression.
///
/// The parser owns the token sequence and walks it with one forward cursor,
/// which only advances when a token matches what the current rule expects.
#[derive(Debug, Clone)]
pub struct Parser<'src> {
    tokens: Peekable<IntoIter<Token<'src>>>,
    // Reported in place of a missing token once the sequence is exhausted
    end: Token<'src>,
    // Unary operands and groupings currently being parsed, bounds the recursion
    depth: usize,
    // Height of the expression most recently returned by a `parse_*` rule
    height: usize,
}

/// Tallest expression tree a parse may build, and deepest it may nest.
/// Literals have height 0, every operator and grouping adds one level.
pub const MAX_DEPTH: usize = 256;

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token<'src>>) -> Self {
        let end = tokens
            .last()
            .filter(|token| token.kind == TokenKind::EndOfInput)
            .copied()
            .unwrap_or_else(Token::end_of_input);

        Parser {
            tokens: tokens.into_iter().peekable(),
            end,
            depth: 0,
            height: 0,
        }
    }

    /// Parses the whole sequence as one expression, optionally followed by a `;`.
    /// Anything left over after that is an error.
    pub fn parse(mut self) -> ParseExpr<'src> {
        let expr = self.parse_expression()?;

        // The end-of-statement marker is optional
        self.tokens
            .next_if(|next| next.kind == TokenKind::EndOfStatement);

        match chase!(self, TokenKind::EndOfInput) {
            Found(_) => {
                log::debug!("parsed {expr}");
                Ok(expr)
            }
            NotFound(token) => Err(ParseError::UnexpectedToken(token)),
        }
    }

    /// Entry point of the precedence ladder.
    /// A parser that returned an error should be discarded.
    pub fn parse_expression(&mut self) -> ParseExpr<'src> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> ParseExpr<'src> {
        let mut expr = self.parse_comparison()?;

        while let Found(token) = chase!(self, TokenKind::BangEqual | TokenKind::EqualEqual) {
            let op = BinaryOp::from(token.kind);
            let left_height = self.height;
            let right = self.parse_comparison()?;
            expr = self.fold(token, Expr::binary(expr, op, right), left_height)?;
        }

        Ok(expr)
    }

    fn parse_comparison(&mut self) -> ParseExpr<'src> {
        let mut expr = self.parse_term()?;

        while let Found(token) = chase!(
            self,
            TokenKind::Greater | TokenKind::GreaterEqual | TokenKind::Less | TokenKind::LessEqual
        ) {
            let op = BinaryOp::from(token.kind);
            let left_height = self.height;
            let right = self.parse_term()?;
            expr = self.fold(token, Expr::binary(expr, op, right), left_height)?;
        }

        Ok(expr)
    }

    fn parse_term(&mut self) -> ParseExpr<'src> {
        let mut expr = self.parse_factor()?;

        while let Found(token) = chase!(self, TokenKind::Minus | TokenKind::Plus) {
            let op = BinaryOp::from(token.kind);
            let left_height = self.height;
            let right = self.parse_factor()?;
            expr = self.fold(token, Expr::binary(expr, op, right), left_height)?;
        }

        Ok(expr)
    }

    fn parse_factor(&mut self) -> ParseExpr<'src> {
        let mut expr = self.parse_unary()?;

        while let Found(token) = chase!(
            self,
            TokenKind::Slash | TokenKind::Star | TokenKind::Percent
        ) {
            let op = BinaryOp::from(token.kind);
            let left_height = self.height;
            let right = self.parse_unary()?;
            expr = self.fold(token, Expr::binary(expr, op, right), left_height)?;
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseExpr<'src> {
        if let Found(token) = chase!(self, TokenKind::Bang | TokenKind::Minus) {
            let op = UnaryOp::from(token.kind);
            self.descend(token)?;
            let right = self.parse_unary()?;
            self.depth -= 1;
            return self.fold(token, Expr::unary(op, right), 0);
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseExpr<'src> {
        let expr = match chase!(
            self,
            TokenKind::Integer
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::True
                | TokenKind::False
                | TokenKind::LeftParen
        ) {
            Found(Token {
                kind: TokenKind::Integer,
                lexeme,
                ..
            }) => Expr::Literal(Literal::Integer(lexeme)),
            Found(Token {
                kind: TokenKind::Float,
                lexeme,
                ..
            }) => Expr::Literal(Literal::Float(lexeme)),
            Found(Token {
                kind: TokenKind::String,
                lexeme,
                ..
            }) => Expr::Literal(Literal::String(lexeme)),
            Found(Token {
                kind: TokenKind::True,
                ..
            }) => Expr::Literal(Literal::True),
            Found(Token {
                kind: TokenKind::False,
                ..
            }) => Expr::Literal(Literal::False),
            Found(
                token @ Token {
                    kind: TokenKind::LeftParen,
                    ..
                },
            ) => {
                self.descend(token)?;
                let expr = self.parse_expression()?;
                self.depth -= 1;
                return match chase!(self, TokenKind::RightParen) {
                    Found(_) => self.fold(token, Expr::grouping(expr), 0),
                    NotFound(token) => Err(ParseError::MismatchedBracket(token)),
                };
            }
            NotFound(token) => return Err(ParseError::UnexpectedToken(token)),
            _ => unreachable!(),
        };

        self.height = 0;
        Ok(expr)
    }

    /// Enters a nested unary operand or grouping, failing on `token` past `MAX_DEPTH`.
    fn descend(&mut self, token: Token<'src>) -> Result<(), ParseError<'src>> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep(token));
        }

        self.depth += 1;
        Ok(())
    }

    /// Records the height of a node built over its other children (`self.height` holds the
    /// height of the last one parsed), failing on `token` if the tree grew past `MAX_DEPTH`.
    fn fold(
        &mut self,
        token: Token<'src>,
        expr: Expr<'src>,
        other_height: usize,
    ) -> ParseExpr<'src> {
        let height = self.height.max(other_height) + 1;
        if height > MAX_DEPTH {
            return Err(ParseError::TooDeep(token));
        }

        self.height = height;
        Ok(expr)
    }

    /// The next unconsumed token, or the end of input if there is none.
    fn current(&mut self) -> Token<'src> {
        self.tokens.peek().copied().unwrap_or(self.end)
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ParseError<'src> {
    #[error("Expected closing bracket instead of {0}.")]
    MismatchedBracket(Token<'src>),

    #[error("Unexpected token {0}.")]
    UnexpectedToken(Token<'src>),

    #[error("Expression nested too deeply at {0}.")]
    TooDeep(Token<'src>),
}

/// The type returned by the `chase!` macro.
enum Chased<'src> {
    Found(Token<'src>),
    NotFound(Token<'src>),
}

use Chased::*;

type ParseExpr<'src> = Result<Expr<'src>, ParseError<'src>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::Scanner;

    fn parse(source: &str) -> ParseExpr<'_> {
        Parser::new(Scanner::new(source).scan().unwrap()).parse()
    }

    fn render(source: &str) -> String {
        parse(source).unwrap().to_string()
    }

    #[test]
    fn binary_levels_are_left_associative() {
        assert_eq!(render("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(render("8 / 4 % 3 * 2"), "(* (% (/ 8 4) 3) 2)");
        assert_eq!(render("1 < 2 == 3 >= 4"), "(== (< 1 2) (>= 3 4))");
    }

    #[test]
    fn unary_is_right_associative() {
        assert_eq!(render("--5"), "(- (- 5))");
        assert_eq!(render("!!true"), "(! (! true))");
        assert_eq!(render("-2 * 3"), "(* (- 2) 3)");
    }

    #[test]
    fn precedence_ladder() {
        assert_eq!(render("2 + 3 * 4"), "(+ 2 (* 3 4))");
        assert_eq!(render("(2 + 3) * 4"), "(* (group (+ 2 3)) 4)");
        assert_eq!(render("1 + 2 < 4 != false"), "(!= (< (+ 1 2) 4) false)");
    }

    #[test]
    fn literals() {
        assert_eq!(
            parse("\"hi\"").unwrap(),
            Expr::Literal(Literal::String("hi"))
        );
        assert_eq!(parse("2.5").unwrap(), Expr::Literal(Literal::Float("2.5")));
        assert_eq!(parse("FALSE").unwrap(), Expr::Literal(Literal::False));
    }

    #[test]
    fn trailing_end_of_statement_is_accepted() {
        assert_eq!(render("1 + 1;"), "(+ 1 1)");
    }

    #[test]
    fn missing_closing_bracket() {
        match parse("(1 + 2") {
            Err(ParseError::MismatchedBracket(token)) => {
                assert_eq!(token.kind, TokenKind::EndOfInput)
            }
            other => panic!("expected a mismatched bracket, got {other:?}"),
        }
    }

    #[test]
    fn unexpected_token_at_primary() {
        match parse("1 + )") {
            Err(ParseError::UnexpectedToken(token)) => {
                assert_eq!(token.kind, TokenKind::RightParen);
                assert_eq!(token.column, 5);
            }
            other => panic!("expected an unexpected token, got {other:?}"),
        }

        assert!(matches!(
            parse(""),
            Err(ParseError::UnexpectedToken(Token {
                kind: TokenKind::EndOfInput,
                ..
            }))
        ));
        assert!(matches!(
            parse("while"),
            Err(ParseError::UnexpectedToken(Token {
                kind: TokenKind::Identifier,
                ..
            }))
        ));
    }

    #[test]
    fn leftover_tokens_are_rejected() {
        assert!(matches!(
            parse("1 2"),
            Err(ParseError::UnexpectedToken(Token {
                kind: TokenKind::Integer,
                lexeme: "2",
                ..
            }))
        ));
        assert!(matches!(
            parse("1 && 2"),
            Err(ParseError::UnexpectedToken(Token {
                kind: TokenKind::AndAnd,
                ..
            }))
        ));
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let source = "(".repeat(10_000);
        assert!(matches!(
            parse(&source),
            Err(ParseError::TooDeep(Token {
                kind: TokenKind::LeftParen,
                ..
            }))
        ));

        let source = format!("{}1", "-".repeat(200_000));
        assert!(matches!(
            parse(&source),
            Err(ParseError::TooDeep(Token {
                kind: TokenKind::Minus,
                ..
            }))
        ));

        let source = format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000));
        assert!(matches!(parse(&source), Err(ParseError::TooDeep(_))));
    }

    #[test]
    fn nesting_up_to_the_limit_is_accepted() {
        let source = format!(
            "{}1{}",
            "(".repeat(MAX_DEPTH),
            ")".repeat(MAX_DEPTH)
        );
        assert!(parse(&source).is_ok());

        let source = format!("{}1", "!".repeat(MAX_DEPTH));
        assert!(parse(&source).is_ok());

        let source = format!("1{}", " + 1".repeat(MAX_DEPTH));
        assert!(parse(&source).is_ok());

        let source = format!("1{}", " + 1".repeat(MAX_DEPTH + 1));
        assert!(matches!(
            parse(&source),
            Err(ParseError::TooDeep(Token {
                kind: TokenKind::Plus,
                ..
            }))
        ));

        // Chains at different levels stack on top of each other
        let source = format!("(1{}){}", " + 1".repeat(199), " * 1".repeat(100));
        assert!(matches!(
            parse(&source),
            Err(ParseError::TooDeep(Token {
                kind: TokenKind::Star,
                ..
            }))
        ));

        // Sibling groupings do not add up
        let group = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let source = format!("{group} * {group}");
        assert!(parse(&source).is_ok());

        let source = format!(
            "{}1{}",
            "(".repeat(MAX_DEPTH + 1),
            ")".repeat(MAX_DEPTH + 1)
        );
        assert!(matches!(parse(&source), Err(ParseError::TooDeep(_))));
    }

    #[test]
    fn cursor_does_not_run_past_a_missing_end() {
        let tokens = vec![Token {
            kind: TokenKind::Integer,
            lexeme: "1",
            line: 1,
            column: 1,
        }];
        assert!(matches!(
            Parser::new(tokens).parse(),
            Err(ParseError::UnexpectedToken(Token {
                kind: TokenKind::EndOfInput,
                ..
            }))
        ));
    }
}
