// File: src/lexer.rs
//
// Lexical analyzer (scanner) for the Skiff programming language.
// Converts source text into a stream of tokens and keeps the raw source
// lines around for diagnostics.
//
// Supports:
// - Keywords: var, func, if, else, while, for, break, continue, return,
//   try, catch, throw, throws, true, false
// - Identifiers, number literals (IEEE-754 doubles), string literals
// - Operators: + += ++ - -= -- * *= ** **= / /= % %= = == ! != < <= > >=
//   && || ^^ ? :
// - Punctuation: ( ) { } [ ] ; ,
// - Line comments // ... and nestable block comments /* ... */

use std::fmt;

use crate::errors::{Diagnostic, DiagnosticKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plus,
    PlusEqual,
    PlusPlus,
    Minus,
    MinusEqual,
    MinusMinus,
    Asterisk,
    AsteriskEqual,
    AsteriskAsterisk,
    AsteriskAsteriskEqual,
    Slash,
    SlashEqual,
    Percent,
    PercentEqual,

    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,

    Equal,
    EqualEqual,
    Bang,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    AndAnd,
    OrOr,
    XorXor,

    Number,
    Str,
    Identifier,

    Semicolon,
    Comma,
    QuestionMark,
    Colon,

    True,
    False,
    Var,
    Func,
    If,
    Else,
    While,
    For,
    Break,
    Continue,
    Return,
    Try,
    Catch,
    Throw,
    Throws,

    Eof,
}

/// The parsed payload of a number, string or boolean token.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone)]
pub struct Token {
    pub line: usize,
    pub column: usize,
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "([{}:{}] {:?} {}", self.line + 1, self.column + 1, self.kind, self.lexeme)?;
        if let Some(literal) = &self.literal {
            match literal {
                Literal::Number(n) => write!(f, " {}", n)?,
                Literal::Str(s) => write!(f, " {:?}", s)?,
                Literal::Bool(b) => write!(f, " {}", b)?,
            }
        }
        write!(f, ")")
    }
}

/// Scans Skiff source code into tokens plus the source line table.
pub fn scan(source: &str) -> Result<(Vec<Token>, Vec<String>), Diagnostic> {
    let mut scanner = Scanner::new(source);
    scanner.scan()?;
    Ok((scanner.tokens, scanner.lines))
}

struct Scanner {
    lines: Vec<String>,
    chars: Vec<char>,
    // Index into `chars`; `line`/`column` track the position of the current
    // character, `token_start_*` the first character of the token in flight.
    current: usize,
    line: usize,
    column: usize,
    token_start_line: usize,
    token_start_column: usize,
    tokens: Vec<Token>,
}

impl Scanner {
    fn new(source: &str) -> Self {
        let lines: Vec<String> = source.lines().map(|l| l.to_string()).collect();
        Scanner {
            lines,
            chars: source.chars().collect(),
            current: 0,
            line: 0,
            column: 0,
            token_start_line: 0,
            token_start_column: 0,
            tokens: Vec::new(),
        }
    }

    fn scan(&mut self) -> Result<(), Diagnostic> {
        while !self.at_end() {
            self.token_start_line = self.line;
            self.token_start_column = self.column;
            let c = self.advance();
            match c {
                ' ' | '\t' | '\r' | '\n' => {}

                '+' => {
                    if self.matches('+') {
                        self.add_token(TokenKind::PlusPlus, "++", None);
                    } else if self.matches('=') {
                        self.add_token(TokenKind::PlusEqual, "+=", None);
                    } else {
                        self.add_token(TokenKind::Plus, "+", None);
                    }
                }
                '-' => {
                    if self.matches('-') {
                        self.add_token(TokenKind::MinusMinus, "--", None);
                    } else if self.matches('=') {
                        self.add_token(TokenKind::MinusEqual, "-=", None);
                    } else {
                        self.add_token(TokenKind::Minus, "-", None);
                    }
                }
                '*' => {
                    if self.matches('*') {
                        if self.matches('=') {
                            self.add_token(TokenKind::AsteriskAsteriskEqual, "**=", None);
                        } else {
                            self.add_token(TokenKind::AsteriskAsterisk, "**", None);
                        }
                    } else if self.matches('=') {
                        self.add_token(TokenKind::AsteriskEqual, "*=", None);
                    } else {
                        self.add_token(TokenKind::Asterisk, "*", None);
                    }
                }
                '%' => {
                    if self.matches('=') {
                        self.add_token(TokenKind::PercentEqual, "%=", None);
                    } else {
                        self.add_token(TokenKind::Percent, "%", None);
                    }
                }
                '/' => {
                    if self.matches('/') {
                        self.line_comment();
                    } else if self.matches('*') {
                        self.block_comment()?;
                    } else if self.matches('=') {
                        self.add_token(TokenKind::SlashEqual, "/=", None);
                    } else {
                        self.add_token(TokenKind::Slash, "/", None);
                    }
                }

                '(' => self.add_token(TokenKind::OpenParen, "(", None),
                ')' => self.add_token(TokenKind::CloseParen, ")", None),
                '{' => self.add_token(TokenKind::OpenBrace, "{", None),
                '}' => self.add_token(TokenKind::CloseBrace, "}", None),
                '[' => self.add_token(TokenKind::OpenBracket, "[", None),
                ']' => self.add_token(TokenKind::CloseBracket, "]", None),
                ';' => self.add_token(TokenKind::Semicolon, ";", None),
                ',' => self.add_token(TokenKind::Comma, ",", None),
                '?' => self.add_token(TokenKind::QuestionMark, "?", None),
                ':' => self.add_token(TokenKind::Colon, ":", None),

                '=' => {
                    if self.matches('=') {
                        self.add_token(TokenKind::EqualEqual, "==", None);
                    } else {
                        self.add_token(TokenKind::Equal, "=", None);
                    }
                }
                '!' => {
                    if self.matches('=') {
                        self.add_token(TokenKind::BangEqual, "!=", None);
                    } else {
                        self.add_token(TokenKind::Bang, "!", None);
                    }
                }
                '<' => {
                    if self.matches('=') {
                        self.add_token(TokenKind::LessEqual, "<=", None);
                    } else {
                        self.add_token(TokenKind::Less, "<", None);
                    }
                }
                '>' => {
                    if self.matches('=') {
                        self.add_token(TokenKind::GreaterEqual, ">=", None);
                    } else {
                        self.add_token(TokenKind::Greater, ">", None);
                    }
                }

                '&' => {
                    if self.matches('&') {
                        self.add_token(TokenKind::AndAnd, "&&", None);
                    } else {
                        return Err(self.error("Unexpected character '&'."));
                    }
                }
                '|' => {
                    if self.matches('|') {
                        self.add_token(TokenKind::OrOr, "||", None);
                    } else {
                        return Err(self.error("Unexpected character '|'."));
                    }
                }
                '^' => {
                    if self.matches('^') {
                        self.add_token(TokenKind::XorXor, "^^", None);
                    } else {
                        return Err(self.error("Unexpected character '^'."));
                    }
                }

                '"' => self.string()?,

                c if c.is_ascii_digit() => self.number(),
                c if is_alpha(c) => self.identifier(),

                c => return Err(self.error(format!("Unexpected character '{}'.", c))),
            }
        }

        self.tokens.push(Token {
            line: self.lines.len().saturating_sub(1),
            column: self.lines.last().map(|l| l.chars().count()).unwrap_or(0),
            kind: TokenKind::Eof,
            lexeme: String::new(),
            literal: None,
        });
        Ok(())
    }

    fn number(&mut self) {
        let mut lexeme = String::from(self.previous());
        while self.peek().is_ascii_digit() {
            lexeme.push(self.advance());
        }
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            lexeme.push(self.advance());
            while self.peek().is_ascii_digit() {
                lexeme.push(self.advance());
            }
        }

        // The lexeme contains only digits and at most one dot, so it parses.
        let value: f64 = lexeme.parse().unwrap_or(0.0);
        self.add_token(TokenKind::Number, &lexeme, Some(Literal::Number(value)));
    }

    fn string(&mut self) -> Result<(), Diagnostic> {
        let mut contents = String::new();
        while self.peek() != '"' && self.peek() != '\n' && !self.at_end() {
            contents.push(self.advance());
        }
        if !self.matches('"') {
            return Err(self.error("Unterminated string."));
        }
        let lexeme = format!("\"{}\"", contents);
        self.add_token(TokenKind::Str, &lexeme, Some(Literal::Str(contents)));
        Ok(())
    }

    fn identifier(&mut self) {
        let mut lexeme = String::from(self.previous());
        while is_alpha_num(self.peek()) {
            lexeme.push(self.advance());
        }

        let (kind, literal) = match lexeme.as_str() {
            "true" => (TokenKind::True, Some(Literal::Bool(true))),
            "false" => (TokenKind::False, Some(Literal::Bool(false))),
            "var" => (TokenKind::Var, None),
            "func" => (TokenKind::Func, None),
            "if" => (TokenKind::If, None),
            "else" => (TokenKind::Else, None),
            "while" => (TokenKind::While, None),
            "for" => (TokenKind::For, None),
            "break" => (TokenKind::Break, None),
            "continue" => (TokenKind::Continue, None),
            "return" => (TokenKind::Return, None),
            "try" => (TokenKind::Try, None),
            "catch" => (TokenKind::Catch, None),
            "throw" => (TokenKind::Throw, None),
            "throws" => (TokenKind::Throws, None),
            _ => (TokenKind::Identifier, None),
        };
        self.add_token(kind, &lexeme, literal);
    }

    fn line_comment(&mut self) {
        while self.peek() != '\n' && !self.at_end() {
            self.advance();
        }
    }

    fn block_comment(&mut self) -> Result<(), Diagnostic> {
        let mut nesting = 1;
        while nesting > 0 {
            if self.at_end() {
                return Err(self.error("Unterminated block comment."));
            }
            let c = self.advance();
            if c == '/' && self.matches('*') {
                nesting += 1;
            } else if c == '*' && self.matches('/') {
                nesting -= 1;
            }
        }
        Ok(())
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        c
    }

    fn previous(&self) -> char {
        self.chars[self.current - 1]
    }

    fn peek(&self) -> char {
        self.chars.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.chars.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            return false;
        }
        self.advance();
        true
    }

    fn at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn add_token(&mut self, kind: TokenKind, lexeme: &str, literal: Option<Literal>) {
        self.tokens.push(Token {
            line: self.token_start_line,
            column: self.token_start_column,
            kind,
            lexeme: lexeme.to_string(),
            literal,
        });
    }

    fn error(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::ScanError,
            message,
            self.token_start_line,
            self.token_start_column,
        )
        .with_source(self.lines.get(self.token_start_line).cloned().unwrap_or_default())
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alpha_num(c: char) -> bool {
    c.is_ascii_digit() || is_alpha(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, _) = scan(source).expect("scan should succeed");
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_scans_compound_operators_longest_first() {
        assert_eq!(
            kinds("+ += ++ ** **= *= - -= --"),
            vec![
                TokenKind::Plus,
                TokenKind::PlusEqual,
                TokenKind::PlusPlus,
                TokenKind::AsteriskAsterisk,
                TokenKind::AsteriskAsteriskEqual,
                TokenKind::AsteriskEqual,
                TokenKind::Minus,
                TokenKind::MinusEqual,
                TokenKind::MinusMinus,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_scans_keywords_and_identifiers() {
        let (tokens, _) = scan("var foo = true;").expect("scan should succeed");
        assert_eq!(tokens[0].kind, TokenKind::Var);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].lexeme, "foo");
        assert_eq!(tokens[3].kind, TokenKind::True);
        assert_eq!(tokens[3].literal, Some(Literal::Bool(true)));
    }

    #[test]
    fn test_scans_number_literals() {
        let (tokens, _) = scan("12 3.5").expect("scan should succeed");
        assert_eq!(tokens[0].literal, Some(Literal::Number(12.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(3.5)));
    }

    #[test]
    fn test_number_does_not_consume_trailing_dot() {
        // "1." without a following digit ends the number at "1"; the stray
        // dot is not a valid character in the language.
        let err = scan("1.").expect_err("dot should be rejected");
        assert!(err.message.contains("Unexpected character '.'."));
    }

    #[test]
    fn test_string_literal_keeps_raw_contents() {
        let (tokens, _) = scan("\"a b\"").expect("scan should succeed");
        assert_eq!(tokens[0].literal, Some(Literal::Str("a b".to_string())));
        assert_eq!(tokens[0].lexeme, "\"a b\"");
    }

    #[test]
    fn test_unterminated_string_is_a_scan_error() {
        let err = scan("\"abc").expect_err("should fail");
        assert!(err.message.contains("Unterminated string."));
    }

    #[test]
    fn test_newline_terminates_string_with_error() {
        assert!(scan("\"abc\ndef\"").is_err());
    }

    #[test]
    fn test_nested_block_comments() {
        assert_eq!(kinds("/* a /* b */ c */ 1"), vec![TokenKind::Number, TokenKind::Eof]);
    }

    #[test]
    fn test_line_comment_runs_to_end_of_line() {
        assert_eq!(
            kinds("1 // comment ** ++\n2"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_single_ampersand_is_rejected() {
        let err = scan("a & b").expect_err("should fail");
        assert!(err.message.contains("Unexpected character '&'."));
    }

    #[test]
    fn test_token_positions_are_zero_based() {
        let (tokens, lines) = scan("var x;\n  y;").expect("scan should succeed");
        assert_eq!(lines, vec!["var x;".to_string(), "  y;".to_string()]);
        let y = tokens.iter().find(|t| t.lexeme == "y").expect("y token");
        assert_eq!((y.line, y.column), (1, 2));
    }

    #[test]
    fn test_logical_operator_tokens() {
        assert_eq!(
            kinds("&& || ^^"),
            vec![TokenKind::AndAnd, TokenKind::OrOr, TokenKind::XorXor, TokenKind::Eof]
        );
    }
}
