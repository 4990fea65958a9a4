// File: src/errors.rs
//
// Diagnostics for the Skiff interpreter.
// Every stage of the pipeline (scanner, parser, checker, evaluator) reports
// problems through the same Diagnostic type, which renders as
// `[line:col]: message` followed by the offending source line with the
// bad lexeme highlighted.

use colored::Colorize;
use std::fmt;

use crate::lexer::Token;

/// Which stage produced the diagnostic. Warnings come only from the checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    ScanError,
    ParseError,
    CheckError,
    RuntimeError,
    Warning,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiagnosticKind::ScanError => write!(f, "Scan Error"),
            DiagnosticKind::ParseError => write!(f, "Parse Error"),
            DiagnosticKind::CheckError => write!(f, "Check Error"),
            DiagnosticKind::RuntimeError => write!(f, "Runtime Error"),
            DiagnosticKind::Warning => write!(f, "Warning"),
        }
    }
}

/// A structured error or warning with source location information.
///
/// `line` and `column` are 0-based (they render 1-based); `width` is the
/// character length of the highlighted lexeme. `source_line` carries the
/// text of the offending line when it is known.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub width: usize,
    pub source_line: Option<String>,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            line,
            column,
            width: 1,
            source_line: None,
        }
    }

    /// Builds a diagnostic pointing at a token, pulling the source line from
    /// the scanned line table.
    pub fn at_token(
        kind: DiagnosticKind,
        message: impl Into<String>,
        token: &Token,
        lines: &[String],
    ) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            line: token.line,
            column: token.column,
            width: token.lexeme.chars().count().max(1),
            source_line: lines.get(token.line).cloned(),
        }
    }

    /// A diagnostic with no usable location, e.g. "No main function.".
    pub fn bare(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            line: 0,
            column: 0,
            width: 0,
            source_line: None,
        }
    }

    pub fn with_source(mut self, source_line: String) -> Self {
        self.source_line = Some(source_line);
        self
    }

    pub fn is_warning(&self) -> bool {
        self.kind == DiagnosticKind::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let header = format!("[{}:{}]: {}", self.line + 1, self.column + 1, self.message);
        if self.is_warning() {
            write!(f, "{}: {}", "Warning".yellow().bold(), header)?;
        } else {
            write!(f, "{}: {}", self.kind.to_string().red().bold(), header)?;
        }

        let Some(ref source) = self.source_line else {
            return Ok(());
        };

        let chars: Vec<char> = source.chars().collect();
        let start = self.column.min(chars.len());
        let end = (self.column + self.width).min(chars.len());

        let before: String = chars[..start].iter().collect();
        let span: String = chars[start..end].iter().collect();
        let after: String = chars[end..].iter().collect();

        let highlighted = if self.is_warning() {
            span.yellow().underline().to_string()
        } else {
            span.red().underline().to_string()
        };

        let rule = "-".repeat(30);
        writeln!(f)?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{}{}{}{}",
            format!("[{}]  ", self.line + 1).dimmed(),
            before,
            highlighted,
            after
        )?;
        write!(f, "{}", rule)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Token, TokenKind};

    #[test]
    fn test_diagnostic_header_is_one_based() {
        let diag = Diagnostic::new(DiagnosticKind::ParseError, "Expected ';'.", 2, 4);
        let text = format!("{}", diag);
        assert!(text.contains("[3:5]: Expected ';'."), "got: {}", text);
    }

    #[test]
    fn test_diagnostic_at_token_carries_source_line() {
        let lines = vec!["var x = 1;".to_string()];
        let token = Token {
            line: 0,
            column: 4,
            kind: TokenKind::Identifier,
            lexeme: "x".to_string(),
            literal: None,
        };
        let diag =
            Diagnostic::at_token(DiagnosticKind::CheckError, "Undefined name.", &token, &lines);
        assert_eq!(diag.source_line.as_deref(), Some("var x = 1;"));
        assert_eq!(diag.width, 1);
        let text = format!("{}", diag);
        assert!(text.contains("var x"), "source line missing: {}", text);
    }

    #[test]
    fn test_bare_diagnostic_renders_without_source() {
        let diag = Diagnostic::bare(DiagnosticKind::CheckError, "No main function.");
        let text = format!("{}", diag);
        assert!(text.contains("No main function."));
        assert!(!text.contains("----"));
    }
}
