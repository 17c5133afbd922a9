use std::{fmt::Display, iter::Peekable, str::CharIndices, sync::OnceLock};

use fnv::FnvHashMap;

#[derive(Debug, Clone)]
pub struct Scanner<'src> {
    source_data: &'src str,
    source: Peekable<CharIndices<'src>>,
    line: u32,
    // Column of the next unconsumed character
    column: u32,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Scanner {
            source_data: source,
            source: source.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Scans the whole source, stopping at the first error.
    /// On success the sequence always ends with a single `EndOfInput` token.
    pub fn scan(mut self) -> Result<Vec<Token<'src>>, LexError<'src>> {
        let mut tokens = Vec::new();

        loop {
            // The position can be modified inside `process_char` so save it here before calling it
            let (line, column) = (self.line, self.column);
            let Some((start, c)) = self.advance() else {
                break;
            };

            if let Some((kind, lexeme)) = self.process_char(start, c, column)? {
                let token = Token {
                    kind,
                    lexeme,
                    line,
                    column,
                };
                log::trace!("scanned {:?} {}", token.kind, token);
                tokens.push(token);
            }
        }

        tokens.push(Token {
            kind: TokenKind::EndOfInput,
            lexeme: "",
            line: self.line,
            column: self.column,
        });

        Ok(tokens)
    }

    fn process_char(
        &mut self,
        start: usize,
        c: char,
        column: u32,
    ) -> Result<Lexed<'src>, LexError<'src>> {
        match c {
            // Single characters
            '(' => Ok(self.emit(TokenKind::LeftParen, start)),
            ')' => Ok(self.emit(TokenKind::RightParen, start)),
            '{' => Ok(self.emit(TokenKind::LeftBrace, start)),
            '}' => Ok(self.emit(TokenKind::RightBrace, start)),
            '+' => Ok(self.emit(TokenKind::Plus, start)),
            '-' => Ok(self.emit(TokenKind::Minus, start)),
            '*' => Ok(self.emit(TokenKind::Star, start)),
            '/' => Ok(self.emit(TokenKind::Slash, start)),
            '%' => Ok(self.emit(TokenKind::Percent, start)),
            ';' => Ok(self.emit(TokenKind::EndOfStatement, start)),

            // One to two characters
            '!' if self.chase('=') => Ok(self.emit(TokenKind::BangEqual, start)),
            '!' => Ok(self.emit(TokenKind::Bang, start)),

            '=' if self.chase('=') => Ok(self.emit(TokenKind::EqualEqual, start)),
            '=' => Ok(self.emit(TokenKind::Equal, start)),

            '<' if self.chase('=') => Ok(self.emit(TokenKind::LessEqual, start)),
            '<' => Ok(self.emit(TokenKind::Less, start)),

            '>' if self.chase('=') => Ok(self.emit(TokenKind::GreaterEqual, start)),
            '>' => Ok(self.emit(TokenKind::Greater, start)),

            // Only the doubled forms mean something, a lone `&` or `|` produces no token
            '&' if self.chase('&') => Ok(self.emit(TokenKind::AndAnd, start)),
            '|' if self.chase('|') => Ok(self.emit(TokenKind::OrOr, start)),
            '&' | '|' => {
                log::debug!("dropping lone '{c}' at line {}, column {column}", self.line);
                Ok(None)
            }

            // String literals
            '"' => {
                let line = self.line;

                // Consume until we find the closing quote
                while let Some((_, c)) = self.advance_if(|c| *c != '"') {
                    if c == '\n' {
                        self.new_line();
                    }
                }

                if let Some((end, _)) = self.advance() {
                    Ok(Some((TokenKind::String, &self.source_data[start + 1..end])))
                } else {
                    Err(LexError::UnterminatedString {
                        text: &self.source_data[start..],
                        line,
                    })
                }
            }

            // Numeric literals, validated later when the literal is evaluated
            c if c.is_ascii_digit() => {
                self.consume_while(|c| c.is_ascii_digit() || *c == '.');
                let number = self.span(start);

                if number.contains('.') {
                    Ok(Some((TokenKind::Float, number)))
                } else {
                    Ok(Some((TokenKind::Integer, number)))
                }
            }

            '\n' => {
                self.new_line();
                Ok(None)
            }

            ' ' | '\t' | '\r' => Ok(None),

            // Reserved words, there are no free-form identifiers
            c if Self::is_valid_identifier_start(&c) => {
                self.consume_while(Self::is_valid_for_identifier);
                let word = self.span(start);

                match lookup_reserved(word) {
                    Some((TokenKind::Identifier, canonical)) => {
                        Ok(Some((TokenKind::Identifier, canonical)))
                    }
                    Some((kind, _)) => Ok(Some((kind, word))),
                    None => Err(LexError::UnknownIdentifier {
                        word,
                        line: self.line,
                    }),
                }
            }

            character => Err(LexError::UnknownCharacter {
                character,
                line: self.line,
                column,
            }),
        }
    }

    fn emit(&mut self, kind: TokenKind, start: usize) -> Lexed<'src> {
        Some((kind, self.span(start)))
    }

    /// The source text from `start` up to (excluding) the next unconsumed character.
    fn span(&mut self, start: usize) -> &'src str {
        if let Some((end, _)) = self.source.peek() {
            &self.source_data[start..*end]
        } else {
            &self.source_data[start..]
        }
    }

    /// Consumes the next character, keeping the column in step.
    fn advance(&mut self) -> Option<(usize, char)> {
        let next = self.source.next();
        if next.is_some() {
            self.column = self.column.saturating_add(1);
        }
        next
    }

    fn advance_if(&mut self, f: impl Fn(&char) -> bool) -> Option<(usize, char)> {
        let next = self.source.next_if(|(_, c)| f(c));
        if next.is_some() {
            self.column = self.column.saturating_add(1);
        }
        next
    }

    fn chase(&mut self, expected: char) -> bool {
        self.advance_if(|c| *c == expected).is_some()
    }

    fn consume_while(&mut self, f: impl Fn(&char) -> bool) {
        while self.advance_if(&f).is_some() {}
    }

    /// Called after consuming a `\n`.
    fn new_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }

    fn is_valid_identifier_start(c: &char) -> bool {
        c.is_ascii_alphabetic() || *c == '_'
    }

    fn is_valid_for_identifier(c: &char) -> bool {
        c.is_ascii_alphanumeric() || *c == '_'
    }
}

type Lexed<'src> = Option<(TokenKind, &'src str)>;

/// Reserved words that scan to an `Identifier` token, paired with the lexeme they are emitted with.
const KEYWORDS: &[(&str, &str)] = &[
    ("if", "IF"),
    ("else", "ELSE"),
    ("var", "VAR"),
    ("let", "LET"),
    ("be", "BE"),
    ("for", "FOR"),
    ("range", "RANGE"),
    ("while", "WHILE"),
    ("break", "BREAK"),
    ("continue", "CONTINUE"),
    ("case", "CASE"),
    ("switch", "SWITCH"),
    ("string", "STRING"),
    ("integer", "INTEGER"),
    ("float", "FLOAT"),
    ("func", "FUNC"),
    ("return", "RETURN"),
    ("exit", "EXIT"),
    ("class", "CLASS"),
    ("super", "SUPER"),
];

fn reserved_words() -> &'static FnvHashMap<&'static str, (TokenKind, &'static str)> {
    static RESERVED: OnceLock<FnvHashMap<&'static str, (TokenKind, &'static str)>> =
        OnceLock::new();

    RESERVED.get_or_init(|| {
        let mut words = FnvHashMap::default();
        words.insert("true", (TokenKind::True, "true"));
        words.insert("false", (TokenKind::False, "false"));
        for &(word, canonical) in KEYWORDS {
            words.insert(word, (TokenKind::Identifier, canonical));
        }
        words
    })
}

/// Looks a word up in the reserved-word table, ignoring case.
fn lookup_reserved(word: &str) -> Option<(TokenKind, &'static str)> {
    reserved_words()
        .get(word.to_ascii_lowercase().as_str())
        .copied()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    // Comparison
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    EqualEqual,
    BangEqual,
    // Logical
    AndAnd,
    OrOr,
    Bang,
    Equal,
    // Literals
    Integer,
    Float,
    String,
    True,
    False,
    Identifier,
    EndOfStatement,
    EndOfInput,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub line: u32,
    pub column: u32,
}

impl<'src> Token<'src> {
    /// The terminal token, positioned at the start of the source.
    pub fn end_of_input() -> Self {
        Token {
            kind: TokenKind::EndOfInput,
            lexeme: "",
            line: 1,
            column: 1,
        }
    }
}

impl<'src> Display for Token<'src> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lexeme = if let TokenKind::EndOfInput = self.kind {
            "EOF"
        } else {
            self.lexeme
        };

        write!(
            f,
            "\"{}\" @ line {}, column {}",
            lexeme, self.line, self.column
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum LexError<'src> {
    #[error("Unterminated string literal {text} starting at line {line}.")]
    UnterminatedString { text: &'src str, line: u32 },

    #[error("Unknown character \"{character}\" at line {line}, column {column}.")]
    UnknownCharacter {
        character: char,
        line: u32,
        column: u32,
    },

    #[error("Unknown identifier \"{word}\" at line {line}.")]
    UnknownIdentifier { word: &'src str, line: u32 },
}
