//! Lexer (tokenizer) for LPL source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Statement keywords are upper case (`BEGIN`, `WHILE`, `PRINTLN`, ...) while the
//! type and expression keywords `int`, `new`, `length` and `null` are lower case.
//! `//` line comments and `/* */` block comments are skipped.

use super::ast::SourceLocation;
use std::fmt;

/// Token kinds, the unit the parser's lookahead decisions are made on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals and names
    IntLiteral,
    Ident,

    // Keywords
    Begin,
    End,
    Fun,
    Proc,
    If,
    Else,
    While,
    Switch,
    Case,
    Default,
    Print,
    Println,
    PrintChar,
    Newline,
    Return,
    Int,
    New,
    Length,
    Null,

    // Operators
    Plus,   // +
    Minus,  // -
    Star,   // *
    Slash,  // /
    Lt,     // <
    Le,     // <=
    EqEq,   // ==
    AndAnd, // &&
    OrOr,   // ||
    Bang,   // !
    Assign, // =

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Semicolon, // ;
    Comma,     // ,
    Dot,       // .
    Colon,     // :

    // End of file
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::IntLiteral => "integer literal",
            TokenKind::Ident => "identifier",
            TokenKind::Begin => "'BEGIN'",
            TokenKind::End => "'END'",
            TokenKind::Fun => "'FUN'",
            TokenKind::Proc => "'PROC'",
            TokenKind::If => "'IF'",
            TokenKind::Else => "'ELSE'",
            TokenKind::While => "'WHILE'",
            TokenKind::Switch => "'SWITCH'",
            TokenKind::Case => "'CASE'",
            TokenKind::Default => "'DEFAULT'",
            TokenKind::Print => "'PRINT'",
            TokenKind::Println => "'PRINTLN'",
            TokenKind::PrintChar => "'PRINTCH'",
            TokenKind::Newline => "'NEWLINE'",
            TokenKind::Return => "'RETURN'",
            TokenKind::Int => "'int'",
            TokenKind::New => "'new'",
            TokenKind::Length => "'length'",
            TokenKind::Null => "'null'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::EqEq => "'=='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::Assign => "'='",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Colon => "':'",
            TokenKind::Eof => "end of file",
        };
        f.write_str(text)
    }
}

/// A token: its kind, the source text it was read from, and where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            location,
        }
    }

    /// Shorthand for an end-of-file token
    pub fn eof(location: SourceLocation) -> Self {
        Self::new(TokenKind::Eof, "", location)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::IntLiteral => write!(f, "integer literal {}", self.lexeme),
            TokenKind::Ident => write!(f, "identifier '{}'", self.lexeme),
            kind => write!(f, "{}", kind),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

/// Lexer for LPL source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input. The result always ends with an `Eof` token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                tokens.push(Token::eof(self.current_location()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        let kind = match ch {
            '0'..='9' => return self.number_literal(ch, loc),
            'a'..='z' | 'A'..='Z' => return Ok(self.identifier_or_keyword(ch, loc)),

            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    return Ok(Token::new(TokenKind::Le, "<=", loc));
                }
                TokenKind::Lt
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    return Ok(Token::new(TokenKind::EqEq, "==", loc));
                }
                TokenKind::Assign
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    return Ok(Token::new(TokenKind::AndAnd, "&&", loc));
                }
                return Err(LexError {
                    message: "Expected '&&', found a single '&'".to_string(),
                    location: loc,
                });
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    return Ok(Token::new(TokenKind::OrOr, "||", loc));
                }
                return Err(LexError {
                    message: "Expected '||', found a single '|'".to_string(),
                    location: loc,
                });
            }
            '!' => TokenKind::Bang,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,

            _ => {
                return Err(LexError {
                    message: format!("Unexpected character: '{}'", ch),
                    location: loc,
                })
            }
        };

        Ok(Token::new(kind, ch.to_string(), loc))
    }

    /// Parse an unsigned integer literal. The value must fit in an `i32` once a
    /// leading minus sign is applied, so `2147483648` is still accepted here.
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut num_str = String::new();
        num_str.push(first_digit);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match num_str.parse::<i64>() {
            Ok(value) if value <= i64::from(i32::MAX) + 1 => {
                Ok(Token::new(TokenKind::IntLiteral, num_str, loc))
            }
            _ => Err(LexError {
                message: format!("Integer literal out of range: {}", num_str),
                location: loc,
            }),
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match ident.as_str() {
            "BEGIN" => TokenKind::Begin,
            "END" => TokenKind::End,
            "FUN" => TokenKind::Fun,
            "PROC" => TokenKind::Proc,
            "IF" => TokenKind::If,
            "ELSE" => TokenKind::Else,
            "WHILE" => TokenKind::While,
            "SWITCH" => TokenKind::Switch,
            "CASE" => TokenKind::Case,
            "DEFAULT" => TokenKind::Default,
            "PRINT" => TokenKind::Print,
            "PRINTLN" => TokenKind::Println,
            "PRINTCH" => TokenKind::PrintChar,
            "NEWLINE" => TokenKind::Newline,
            "RETURN" => TokenKind::Return,
            "int" => TokenKind::Int,
            "new" => TokenKind::New,
            "length" => TokenKind::Length,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident,
        };

        Token::new(kind, ident, loc)
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}
