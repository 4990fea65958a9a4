// File: src/ast.rs
//
// Abstract syntax tree for the Skiff programming language, plus the
// pretty-printer used by the CLI's --verbose mode.
//
// Statements and expressions are two sum types; the checker and evaluator
// dispatch over them with exhaustive pattern matching. `nesting_level`
// fields start at usize::MAX ("unresolved") and are written exactly once
// by the checker.

use std::fmt::Write as _;

use crate::lexer::Token;

/// Marker for a `nesting_level` the checker has not filled in yet.
pub const UNRESOLVED: usize = usize::MAX;

/// A literal value embedded in the AST. `Null` never comes from source
/// text; the parser synthesizes it for missing `for` clauses and empty
/// initializers.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Number(f64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression {
        expr: Expr,
    },
    /// One or more names bound to a single initializer expression, which may
    /// produce multiple values. `operator` is the `=` token (or the `var`
    /// keyword when there is no initializer), kept for error reporting.
    VarDecl {
        names: Vec<Token>,
        initializer: Option<Expr>,
        operator: Token,
    },
    FuncDecl {
        name: Token,
        parameters: Vec<String>,
        body: Box<Stmt>,
        return_count: usize,
        throws: bool,
    },
    If {
        condition: Expr,
        body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    /// The parser wraps every `for` loop in a synthetic Block so the
    /// initializer is scoped to the loop.
    For {
        initializer: Box<Stmt>,
        condition: Expr,
        increment: Expr,
        body: Box<Stmt>,
    },
    /// `break` or `continue`; which one is in the keyword token.
    LoopControl {
        keyword: Token,
    },
    Return {
        keyword: Token,
        values: Vec<Expr>,
    },
    Throw {
        keyword: Token,
        value: Expr,
    },
    Try {
        body: Box<Stmt>,
        catch_body: Box<Stmt>,
        exception_name: Option<Token>,
    },
    Block {
        statements: Vec<Stmt>,
    },
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: LiteralValue,
    },
    Variable {
        name: Token,
        nesting_level: usize,
    },
    Grouping {
        expr: Box<Expr>,
    },
    List {
        values: Vec<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        open_paren: Token,
    },
    Subscript {
        object: Box<Expr>,
        index: Box<Expr>,
        open_bracket: Token,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Binary {
        operator: Token,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        operator: Token,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        left: Box<Expr>,
        operator1: Token,
        center: Box<Expr>,
        operator2: Token,
        right: Box<Expr>,
    },
    /// `a, b = rhs` and its compound/postfix desugarings. Every assignee is
    /// a Variable or Subscript node; the parser rejects anything else.
    Assign {
        operator: Token,
        assignees: Vec<Expr>,
        value: Box<Expr>,
    },
    AnonymousFunction {
        keyword: Token,
        parameters: Vec<String>,
        body: Box<Stmt>,
        return_count: usize,
        throws: bool,
    },
}

/// Pretty-prints a top-level statement for --verbose output. Statements are
/// tagged with a two-letter marker, expressions are fully parenthesized and
/// variables show their resolved nesting level as `(name:level)`.
pub fn print_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expression { expr } => format!("[ex] {};", print_expr(expr)),
        Stmt::VarDecl { names, initializer, .. } => {
            let names: Vec<&str> = names.iter().map(|n| n.lexeme.as_str()).collect();
            let init = match initializer {
                Some(expr) => print_expr(expr),
                None => "null".to_string(),
            };
            format!("[va] var {} = {};", names.join(", "), init)
        }
        Stmt::FuncDecl { name, return_count, throws, body, .. } => {
            let throws = if *throws { "throws" } else { "" };
            format!("[fn] func {}() {} {} {}", name.lexeme, return_count, throws, print_stmt(body))
        }
        Stmt::If { condition, body, else_body } => {
            let mut text =
                format!("[if] if ({})\n{}", print_expr(condition), braced(print_stmt(body)));
            if let Some(else_body) = else_body {
                let _ = write!(text, "\nelse\n{}", braced(print_stmt(else_body)));
            }
            text
        }
        Stmt::While { condition, body } => {
            format!("[wh] while ({})\n{}", print_expr(condition), braced(print_stmt(body)))
        }
        Stmt::For { initializer, condition, increment, body } => format!(
            "[fo] for ({};{};{})\n{}",
            print_stmt(initializer),
            print_expr(condition),
            print_expr(increment),
            braced(print_stmt(body))
        ),
        Stmt::LoopControl { keyword } => format!("[lc] {};", keyword.lexeme),
        Stmt::Return { values, .. } => {
            let values: Vec<String> = values.iter().map(print_expr).collect();
            if values.is_empty() {
                "[re] return;".to_string()
            } else {
                format!("[re] return {};", values.join(", "))
            }
        }
        Stmt::Throw { value, .. } => format!("throw {};", print_expr(value)),
        Stmt::Try { body, catch_body, exception_name } => {
            let catch = match exception_name {
                Some(name) => format!("catch ({})", name.lexeme),
                None => "catch".to_string(),
            };
            format!(
                "[tr] try\n{}\n{}\n{}",
                braced(print_stmt(body)),
                catch,
                braced(print_stmt(catch_body))
            )
        }
        Stmt::Block { statements } => {
            let mut text = String::from("{\n");
            for s in statements {
                let _ = writeln!(text, "{}", print_stmt(s));
            }
            text.push('}');
            text
        }
    }
}

fn braced(body: String) -> String {
    if body.starts_with('{') {
        body
    } else {
        format!("{{\n{}\n}}", body)
    }
}

pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal { value } => print_literal(value),
        Expr::Variable { name, nesting_level } => {
            if *nesting_level == UNRESOLVED {
                format!("({}:?)", name.lexeme)
            } else {
                format!("({}:{})", name.lexeme, nesting_level)
            }
        }
        Expr::Grouping { expr } => print_expr(expr),
        Expr::List { values } => {
            let values: Vec<String> = values.iter().map(print_expr).collect();
            format!("([{}])", values.join(","))
        }
        Expr::Call { callee, args, .. } => {
            let args: Vec<String> = args.iter().map(print_expr).collect();
            format!("({}({}))", print_expr(callee), args.join(","))
        }
        Expr::Subscript { object, index, .. } => {
            format!("({}[{}])", print_expr(object), print_expr(index))
        }
        Expr::Unary { operator, right } => format!("({}{})", operator.lexeme, print_expr(right)),
        Expr::Binary { operator, left, right } => {
            // Desugared compound operators keep their source lexeme; print
            // just the underlying arithmetic operator.
            let op = match operator.lexeme.as_str() {
                "+=" | "++" => "+",
                "-=" | "--" => "-",
                "*=" => "*",
                "**=" => "**",
                "/=" => "/",
                "%=" => "%",
                other => other,
            };
            format!("({} {} {})", print_expr(left), op, print_expr(right))
        }
        Expr::Logical { operator, left, right } => {
            format!("({} {} {})", print_expr(left), operator.lexeme, print_expr(right))
        }
        Expr::Ternary { left, operator1, center, operator2, right } => format!(
            "({} {} {} {} {})",
            print_expr(left),
            operator1.lexeme,
            print_expr(center),
            operator2.lexeme,
            print_expr(right)
        ),
        Expr::Assign { assignees, value, .. } => {
            let assignees: Vec<String> = assignees.iter().map(print_expr).collect();
            format!("({} = {})", assignees.join(", "), print_expr(value))
        }
        Expr::AnonymousFunction { return_count, throws, body, .. } => {
            let throws = if *throws { "throws" } else { "" };
            format!("(func() {} {} {})", return_count, throws, print_stmt(body))
        }
    }
}

fn print_literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Null => "null".to_string(),
        LiteralValue::Number(n) => format!("{}", n),
        LiteralValue::Bool(b) => format!("{}", b),
        LiteralValue::Str(s) => {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\r', "\\r")
                .replace('\n', "\\n")
                .replace('\t', "\\t")
                .replace('\x1b', "\\e");
            format!("\"{}\"", escaped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Token, TokenKind};

    fn ident(name: &str) -> Token {
        Token {
            line: 0,
            column: 0,
            kind: TokenKind::Identifier,
            lexeme: name.to_string(),
            literal: None,
        }
    }

    #[test]
    fn test_print_variable_shows_nesting_level() {
        let expr = Expr::Variable { name: ident("x"), nesting_level: 2 };
        assert_eq!(print_expr(&expr), "(x:2)");
    }

    #[test]
    fn test_print_unresolved_variable_shows_question_mark() {
        let expr = Expr::Variable { name: ident("x"), nesting_level: UNRESOLVED };
        assert_eq!(print_expr(&expr), "(x:?)");
    }

    #[test]
    fn test_print_binary_strips_compound_lexeme() {
        let op = Token {
            line: 0,
            column: 0,
            kind: TokenKind::Plus,
            lexeme: "+=".to_string(),
            literal: None,
        };
        let expr = Expr::Binary {
            operator: op,
            left: Box::new(Expr::Variable { name: ident("a"), nesting_level: 0 }),
            right: Box::new(Expr::Literal { value: LiteralValue::Number(1.0) }),
        };
        assert_eq!(print_expr(&expr), "((a:0) + 1)");
    }

    #[test]
    fn test_print_string_literal_escapes() {
        let expr = Expr::Literal { value: LiteralValue::Str("a\nb".to_string()) };
        assert_eq!(print_expr(&expr), "\"a\\nb\"");

        let expr = Expr::Literal { value: LiteralValue::Str("\x1b[0m".to_string()) };
        assert_eq!(print_expr(&expr), "\"\\e[0m\"");
    }
}
