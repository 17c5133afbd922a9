pub mod ast;
pub mod lex;
pub mod logging;
pub mod rt;
pub mod syntax;

/// The representation used by all Jacaranta floats and their arithmetic operations.
pub type JacNumber = f64;

/// Scans a source line into tokens, ending with an `EndOfInput` token.
pub fn scan(source: &str) -> Result<Vec<lex::Token<'_>>, lex::LexError<'_>> {
    lex::Scanner::new(source).scan()
}

/// Parses a token sequence into a single expression tree.
pub fn parse(tokens: Vec<lex::Token<'_>>) -> Result<ast::Expr<'_>, syntax::ParseError<'_>> {
    syntax::Parser::new(tokens).parse()
}

/// Evaluates an expression tree to a value. The tree is left untouched.
pub fn evaluate<'src>(expr: &ast::Expr<'src>) -> Result<rt::Value<'src>, rt::EvalError<'src>> {
    rt::TreeWalker::new().evaluate(expr)
}

/// Runs a source line through every stage of the pipeline.
pub fn run(source: &str) -> Result<rt::Value<'_>, Error<'_>> {
    let tokens = scan(source)?;
    let expr = parse(tokens)?;
    Ok(evaluate(&expr)?)
}

/// An error from any stage of the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error<'src> {
    #[error("[LEX ERROR] {0}")]
    Lex(lex::LexError<'src>),

    #[error("[PARSE ERROR] {0}")]
    Parse(syntax::ParseError<'src>),

    #[error("[RUNTIME ERROR] {0}")]
    Eval(rt::EvalError<'src>),
}

impl<'src> From<lex::LexError<'src>> for Error<'src> {
    fn from(error: lex::LexError<'src>) -> Self {
        Error::Lex(error)
    }
}

impl<'src> From<syntax::ParseError<'src>> for Error<'src> {
    fn from(error: syntax::ParseError<'src>) -> Self {
        Error::Parse(error)
    }
}

impl<'src> From<rt::EvalError<'src>> for Error<'src> {
    fn from(error: rt::EvalError<'src>) -> Self {
        Error::Eval(error)
    }
}
