#![forbid(unsafe_code)]

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("invalid escape sequence '\\{escape}' at offset {offset}")]
    InvalidEscape { offset: usize, escape: char },
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { offset: usize, found: char },
    #[error("invalid number literal '{literal}' at offset {offset}")]
    InvalidNumber { offset: usize, literal: String },
}

impl LexError {
    pub fn offset(&self) -> usize {
        match self {
            LexError::UnterminatedString { offset }
            | LexError::InvalidEscape { offset, .. }
            | LexError::UnexpectedChar { offset, .. }
            | LexError::InvalidNumber { offset, .. } => *offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Int(i64),
    UInt(u64),
    Str(String),
    Bool(bool),

    Dot,
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Question,
    Colon,

    Eof,
}

/// A lexed token. `lexeme` is the exact source slice the token was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub offset: usize,
}

/// Lazily tokenizes a source string.
///
/// Yields tokens up to and including a single `Eof` token, then stops. The first
/// error ends the sequence. Cloning a lexer (or calling [`tokenize`] again) restarts
/// from the same position and yields the same tokens.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    done: bool,
}

pub fn tokenize(src: &str) -> Lexer<'_> {
    Lexer {
        src,
        pos: 0,
        done: false,
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.lex_token();
        match &item {
            Ok(tok) if tok.kind == TokenKind::Eof => self.done = true,
            Err(_) => self.done = true,
            Ok(_) => {}
        }
        Some(item)
    }
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            lexeme: &self.src[start..self.pos],
            offset: start,
        }
    }

    fn lex_token(&mut self) -> Result<Token<'a>, LexError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }

        let start = self.pos;
        let Some(ch) = self.bump() else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        let kind = match ch {
            '.' => TokenKind::Dot,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '=' => self.pair('=', TokenKind::EqEq, start, ch)?,
            '&' => self.pair('&', TokenKind::AndAnd, start, ch)?,
            '|' => self.pair('|', TokenKind::OrOr, start, ch)?,
            '!' => self.either('=', TokenKind::NotEq, TokenKind::Bang),
            '<' => self.either('=', TokenKind::Le, TokenKind::Lt),
            '>' => self.either('=', TokenKind::Ge, TokenKind::Gt),
            '"' => self.lex_string(start)?,
            '0'..='9' => self.lex_number(start)?,
            c if is_ident_start(c) => {
                while self.peek().is_some_and(is_ident_continue) {
                    self.bump();
                }
                match &self.src[start..self.pos] {
                    "true" => TokenKind::Bool(true),
                    "false" => TokenKind::Bool(false),
                    _ => TokenKind::Ident,
                }
            }
            found => {
                return Err(LexError::UnexpectedChar {
                    offset: start,
                    found,
                })
            }
        };
        Ok(self.token(kind, start))
    }

    // Two-character operators whose first character is not a token on its own.
    fn pair(
        &mut self,
        second: char,
        kind: TokenKind,
        start: usize,
        first: char,
    ) -> Result<TokenKind, LexError> {
        if self.peek() == Some(second) {
            self.bump();
            Ok(kind)
        } else {
            Err(LexError::UnexpectedChar {
                offset: start,
                found: first,
            })
        }
    }

    fn either(&mut self, second: char, long: TokenKind, short: TokenKind) -> TokenKind {
        if self.peek() == Some(second) {
            self.bump();
            long
        } else {
            short
        }
    }

    fn lex_string(&mut self, start: usize) -> Result<TokenKind, LexError> {
        let mut s = String::new();
        loop {
            let esc_offset = self.pos;
            match self.bump() {
                None => return Err(LexError::UnterminatedString { offset: start }),
                Some('"') => break,
                Some('\\') => {
                    let Some(esc) = self.bump() else {
                        return Err(LexError::UnterminatedString { offset: start });
                    };
                    let resolved = resolve_escape(esc).ok_or(LexError::InvalidEscape {
                        offset: esc_offset,
                        escape: esc,
                    })?;
                    s.push(resolved);
                }
                Some(c) => s.push(c),
            }
        }
        Ok(TokenKind::Str(s))
    }

    fn lex_number(&mut self, start: usize) -> Result<TokenKind, LexError> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let digits_end = self.pos;
        let unsigned = matches!(self.peek(), Some('u' | 'U'));
        if unsigned {
            self.bump();
        }
        // `12abc` and `3u8` are single malformed literals, not a number and an identifier.
        if self.peek().is_some_and(is_ident_continue) {
            while self.peek().is_some_and(is_ident_continue) {
                self.bump();
            }
            return Err(self.invalid_number(start));
        }

        let digits = &self.src[start..digits_end];
        if unsigned {
            digits
                .parse::<u64>()
                .map(TokenKind::UInt)
                .map_err(|_| self.invalid_number(start))
        } else {
            digits
                .parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| self.invalid_number(start))
        }
    }

    fn invalid_number(&self, start: usize) -> LexError {
        LexError::InvalidNumber {
            offset: start,
            literal: self.src[start..self.pos].to_string(),
        }
    }
}

fn resolve_escape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '\'' => Some('\''),
        '0' => Some('\0'),
        _ => None,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
