use crate::error::ParseError;
use logos::{self, Logos};

//===========================================================================//

struct LexerState {
    line: u32,
}

impl Default for LexerState {
    fn default() -> LexerState {
        LexerState { line: 1 }
    }
}

//===========================================================================//

fn newline_callback(lexer: &mut logos::Lexer<TokenKind>) {
    lexer.extras.line += 1;
}

#[derive(Debug, Eq, Logos, PartialEq)]
#[logos(extras = LexerState)]
#[logos(skip r"[ \t\r]+")] // whitespace
#[logos(skip r"#[^\n]*")] // comments
enum TokenKind {
    #[token(":")]
    Colon,
    #[regex(r"v2\.0[ \t]+raw")]
    Header,
    #[regex(r"[0-9A-Fa-f]+")]
    Literal,
    #[regex(r"\n", newline_callback)]
    Linebreak,
    #[token(".org")]
    Org,
    #[token("*")]
    Star,
}

impl TokenKind {
    fn into_token(self, lexer: &logos::Lexer<TokenKind>) -> Token {
        let (line, value) = match self {
            TokenKind::Colon => (lexer.extras.line, TokenValue::Colon),
            TokenKind::Header => (lexer.extras.line, TokenValue::Header),
            TokenKind::Literal => (
                lexer.extras.line,
                TokenValue::Literal(lexer.slice().to_string()),
            ),
            // The callback has already advanced to the next line.
            TokenKind::Linebreak => {
                (lexer.extras.line - 1, TokenValue::Linebreak)
            }
            TokenKind::Org => (lexer.extras.line, TokenValue::Org),
            TokenKind::Star => (lexer.extras.line, TokenValue::Star),
        };
        Token { line, value }
    }
}

//===========================================================================//

/// The contents of a single lexical token in a hex-text image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum TokenValue {
    /// A "`:`" symbol, ending a record address.
    Colon,
    /// The `v2.0 raw` format header.
    Header,
    /// A run of hex digits.
    Literal(String),
    /// A linebreak.
    Linebreak,
    /// The `.org` origin directive.
    Org,
    /// A "`*`" symbol, separating a repeat count from its value.
    Star,
}

impl TokenValue {
    /// Returns the human-readable name for this kind of token.
    pub fn name(&self) -> &str {
        match self {
            TokenValue::Colon => "colon",
            TokenValue::Header => "header",
            TokenValue::Literal(_) => "literal",
            TokenValue::Linebreak => "linebreak",
            TokenValue::Org => ".org directive",
            TokenValue::Star => "'*'",
        }
    }
}

/// A single lexical token, including the line on which it appears.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Token {
    pub line: u32,
    pub value: TokenValue,
}

//===========================================================================//

/// A lexer for tokenizing a hex-text image.
pub(crate) struct TokenLexer<'a> {
    lexer: logos::Lexer<'a, TokenKind>,
}

impl<'a> TokenLexer<'a> {
    pub fn new(input: &'a str) -> TokenLexer<'a> {
        TokenLexer { lexer: TokenKind::lexer(input) }
    }
}

impl Iterator for TokenLexer<'_> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Result<Token, ParseError>> {
        match self.lexer.next()? {
            Ok(kind) => Some(Ok(kind.into_token(&self.lexer))),
            Err(()) => {
                let message = format!(
                    "invalid character: {}",
                    self.lexer.slice().escape_debug()
                );
                Some(Err(ParseError::at_line(self.lexer.extras.line, message)))
            }
        }
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{Token, TokenLexer, TokenValue};
    use crate::error::ParseError;

    fn token(line: u32, value: TokenValue) -> Token {
        Token { line, value }
    }

    fn literal(line: u32, text: &str) -> Token {
        token(line, TokenValue::Literal(text.to_string()))
    }

    fn read_all(input: &str) -> Vec<Token> {
        TokenLexer::new(input).collect::<Result<_, _>>().unwrap()
    }

    fn expect_error(input: &str) -> ParseError {
        for result in TokenLexer::new(input) {
            if let Err(error) = result {
                return error;
            }
        }
        panic!("no error occurred");
    }

    #[test]
    fn empty_input() {
        assert_eq!(read_all(""), vec![]);
    }

    #[test]
    fn comment() {
        assert_eq!(read_all("# Hello, world: 12 34"), vec![]);
    }

    #[test]
    fn header() {
        assert_eq!(
            read_all("v2.0 raw\n"),
            vec![
                token(1, TokenValue::Header),
                token(1, TokenValue::Linebreak),
            ]
        );
    }

    #[test]
    fn record() {
        assert_eq!(
            read_all("01f0: ab 3*Cd # trailing\r\n.org 4"),
            vec![
                literal(1, "01f0"),
                token(1, TokenValue::Colon),
                literal(1, "ab"),
                literal(1, "3"),
                token(1, TokenValue::Star),
                literal(1, "Cd"),
                token(1, TokenValue::Linebreak),
                token(2, TokenValue::Org),
                literal(2, "4"),
            ]
        );
    }

    #[test]
    fn invalid_token() {
        assert_eq!(
            expect_error("\n\n12 zz\n"),
            ParseError::at_line(3, "invalid character: z".to_string())
        );
    }
}

//===========================================================================//
