// File: src/parser.rs
//
// Recursive-descent parser for the Skiff programming language.
// Consumes the token stream produced by the lexer and builds the AST.
//
// Precedence, lowest to highest: assignment, ternary, or, and, equality,
// comparison, term, factor, power, unary prefix, postfix, call/subscript,
// primary. Compound assignment (`a += b`), postfix increment (`a++`) and
// multi-assignment (`a, b = pair()`) are desugared here so the checker and
// evaluator only ever see plain Assign nodes.
//
// On a parse error the parser records a diagnostic and synchronizes to the
// next statement boundary, so several errors can be reported in one pass.

use crate::ast::{Expr, LiteralValue, Stmt, UNRESOLVED};
use crate::errors::{Diagnostic, DiagnosticKind};
use crate::lexer::{Literal, Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    lines: &'a [String],
    errors: Vec<Diagnostic>,
}

/// Parses a whole program. Returns the top-level statements together with
/// every parse error encountered; callers must treat a non-empty error list
/// as fatal before checking.
pub fn parse(tokens: Vec<Token>, lines: &[String]) -> (Vec<Stmt>, Vec<Diagnostic>) {
    let mut parser = Parser { tokens, current: 0, lines, errors: Vec::new() };
    let mut program = Vec::new();

    while !parser.check(TokenKind::Eof) {
        match parser.declaration() {
            Ok(stmt) => program.push(stmt),
            Err(diag) => {
                parser.errors.push(diag);
                parser.synchronize();
            }
        }
    }

    (program, parser.errors)
}

impl<'a> Parser<'a> {
    /// Top-level rule: only `var` and `func` declarations are allowed
    /// outside of blocks.
    fn declaration(&mut self) -> Result<Stmt, Diagnostic> {
        if self.matches(&[TokenKind::Var]) {
            return self.var_decl();
        }
        if self.matches(&[TokenKind::Func]) {
            return self.func_decl();
        }
        Err(self.error("Expected declaration."))
    }

    fn var_decl(&mut self) -> Result<Stmt, Diagnostic> {
        let var_keyword = self.previous().clone();
        let mut names = vec![self.consume(TokenKind::Identifier, "Expected variable name.")?];
        while self.matches(&[TokenKind::Comma]) {
            names.push(self.consume(TokenKind::Identifier, "Expected variable name.")?);
        }

        let mut operator = var_keyword;
        let mut initializer = None;
        if self.matches(&[TokenKind::Equal]) {
            operator = self.previous().clone();
            initializer = Some(self.expression()?);
        }

        self.consume(TokenKind::Semicolon, "Expected ';' after variable declaration.")?;
        Ok(Stmt::VarDecl { names, initializer, operator })
    }

    fn func_decl(&mut self) -> Result<Stmt, Diagnostic> {
        let name = self.consume(TokenKind::Identifier, "Expected function name.")?;
        let (parameters, return_count, throws, body) = self.function_rest()?;
        Ok(Stmt::FuncDecl { name, parameters, body: Box::new(body), return_count, throws })
    }

    /// Shared tail of named and anonymous functions:
    /// `( params ) digit? throws? { body }`.
    fn function_rest(&mut self) -> Result<(Vec<String>, usize, bool, Stmt), Diagnostic> {
        self.consume(TokenKind::OpenParen, "Expected '(' before parameters.")?;
        let mut parameters = Vec::new();
        if !self.check(TokenKind::CloseParen) {
            loop {
                let param = self.consume(TokenKind::Identifier, "Expected parameter name.")?;
                parameters.push(param.lexeme);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::CloseParen, "Expected ')' after parameters.")?;

        let mut return_count = 0;
        if self.check(TokenKind::Number) {
            let token = self.advance().clone();
            return_count = match token.literal {
                Some(Literal::Number(n)) if n == n.trunc() && (0.0..=4.0).contains(&n) => n as usize,
                _ => {
                    return Err(self.error_at("Expected a return value count between 0 and 4.", &token))
                }
            };
        }

        let throws = self.matches(&[TokenKind::Throws]);

        self.consume(TokenKind::OpenBrace, "Expected '{' before function body.")?;
        let body = self.finish_block()?;
        Ok((parameters, return_count, throws, body))
    }

    fn statement(&mut self) -> Result<Stmt, Diagnostic> {
        if self.matches(&[TokenKind::Var]) {
            return self.var_decl();
        }
        if self.matches(&[TokenKind::Func]) {
            // `func name(...)` is a declaration; a bare `func (...)` is an
            // anonymous function expression and falls through below.
            if self.check(TokenKind::Identifier) {
                return self.func_decl();
            }
            self.back_up();
        }
        if self.matches(&[TokenKind::If]) {
            return self.if_statement();
        }
        if self.matches(&[TokenKind::While]) {
            return self.while_statement();
        }
        if self.matches(&[TokenKind::For]) {
            return self.for_statement();
        }
        if self.matches(&[TokenKind::Break, TokenKind::Continue]) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Semicolon, "Expected ';'.")?;
            return Ok(Stmt::LoopControl { keyword });
        }
        if self.matches(&[TokenKind::Return]) {
            return self.return_statement();
        }
        if self.matches(&[TokenKind::Throw]) {
            let keyword = self.previous().clone();
            let value = self.expression()?;
            self.consume(TokenKind::Semicolon, "Expected ';'.")?;
            return Ok(Stmt::Throw { keyword, value });
        }
        if self.matches(&[TokenKind::Try]) {
            return self.try_statement();
        }
        if self.matches(&[TokenKind::OpenBrace]) {
            return self.finish_block();
        }

        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after expression.")?;
        Ok(Stmt::Expression { expr })
    }

    /// Reads statements until the closing brace. The opening brace has
    /// already been consumed.
    fn finish_block(&mut self) -> Result<Stmt, Diagnostic> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::CloseBrace) && !self.check(TokenKind::Eof) {
            statements.push(self.statement()?);
        }
        self.consume(TokenKind::CloseBrace, "Expected '}'.")?;
        Ok(Stmt::Block { statements })
    }

    fn if_statement(&mut self) -> Result<Stmt, Diagnostic> {
        self.consume(TokenKind::OpenParen, "Expected '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::CloseParen, "Expected ')' after condition.")?;
        let body = Box::new(self.statement()?);
        let else_body = if self.matches(&[TokenKind::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If { condition, body, else_body })
    }

    fn while_statement(&mut self) -> Result<Stmt, Diagnostic> {
        self.consume(TokenKind::OpenParen, "Expected '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::CloseParen, "Expected ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    /// `for (init?; cond?; incr?) body`, desugared: a missing initializer
    /// becomes an empty expression statement, a missing condition the
    /// literal `true`, a missing increment an empty literal. The whole loop
    /// is wrapped in a fresh block so the initializer is scoped to it.
    fn for_statement(&mut self) -> Result<Stmt, Diagnostic> {
        self.consume(TokenKind::OpenParen, "Expected '(' after 'for'.")?;

        let initializer = if self.matches(&[TokenKind::Semicolon]) {
            Stmt::Expression { expr: Expr::Literal { value: LiteralValue::Null } }
        } else if self.matches(&[TokenKind::Var]) {
            self.var_decl()?
        } else {
            let expr = self.expression()?;
            self.consume(TokenKind::Semicolon, "Expected ';' after loop initializer.")?;
            Stmt::Expression { expr }
        };

        let condition = if self.check(TokenKind::Semicolon) {
            Expr::Literal { value: LiteralValue::Bool(true) }
        } else {
            self.expression()?
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after loop condition.")?;

        let increment = if self.check(TokenKind::CloseParen) {
            Expr::Literal { value: LiteralValue::Null }
        } else {
            self.expression()?
        };
        self.consume(TokenKind::CloseParen, "Expected ')' after loop clauses.")?;

        let body = Box::new(self.statement()?);
        let for_stmt = Stmt::For {
            initializer: Box::new(initializer),
            condition,
            increment,
            body,
        };
        Ok(Stmt::Block { statements: vec![for_stmt] })
    }

    fn return_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.previous().clone();
        let mut values = Vec::new();
        if !self.check(TokenKind::Semicolon) {
            values.push(self.expression()?);
            while self.matches(&[TokenKind::Comma]) {
                values.push(self.expression()?);
            }
        }
        self.consume(TokenKind::Semicolon, "Expected ';'.")?;
        Ok(Stmt::Return { keyword, values })
    }

    fn try_statement(&mut self) -> Result<Stmt, Diagnostic> {
        self.consume(TokenKind::OpenBrace, "Expected '{' after 'try'.")?;
        let body = Box::new(self.finish_block()?);

        self.consume(TokenKind::Catch, "Expected 'catch' after try block.")?;
        let mut exception_name = None;
        if self.matches(&[TokenKind::OpenParen]) {
            exception_name = Some(self.consume(TokenKind::Identifier, "Expected exception name.")?);
            self.consume(TokenKind::CloseParen, "Expected ')' after exception name.")?;
        }

        self.consume(TokenKind::OpenBrace, "Expected '{' after 'catch'.")?;
        let catch_body = Box::new(self.finish_block()?);
        Ok(Stmt::Try { body, catch_body, exception_name })
    }

    // --- Expressions ---

    fn expression(&mut self) -> Result<Expr, Diagnostic> {
        self.assignment()
    }

    /// Parses assignment, including multi-target form. After the first
    /// conditional expression the parser speculatively collects further
    /// comma-separated targets; if no assignment operator follows, it
    /// rewinds so the comma is left for the caller (argument lists,
    /// `return` values).
    fn assignment(&mut self) -> Result<Expr, Diagnostic> {
        let first = self.ternary()?;

        let checkpoint = self.current;
        let mut assignees = vec![first];
        while self.matches(&[TokenKind::Comma]) {
            match self.ternary() {
                Ok(expr) => assignees.push(expr),
                Err(_) => {
                    self.current = checkpoint;
                    return Ok(assignees.swap_remove(0));
                }
            }
        }

        const ASSIGN_OPS: [TokenKind; 7] = [
            TokenKind::Equal,
            TokenKind::PlusEqual,
            TokenKind::MinusEqual,
            TokenKind::AsteriskEqual,
            TokenKind::AsteriskAsteriskEqual,
            TokenKind::SlashEqual,
            TokenKind::PercentEqual,
        ];
        if !self.matches(&ASSIGN_OPS) {
            self.current = checkpoint;
            return Ok(assignees.swap_remove(0));
        }
        let operator = self.previous().clone();

        for assignee in &assignees {
            if !matches!(assignee, Expr::Variable { .. } | Expr::Subscript { .. }) {
                return Err(self.error_at("Can only assign to variables.", &operator));
            }
        }
        if assignees.len() > 1 && operator.kind != TokenKind::Equal {
            return Err(self.error_at(
                "Compound assignment is not allowed with multiple targets.",
                &operator,
            ));
        }

        let rhs = self.assignment()?;
        let value = if operator.kind == TokenKind::Equal {
            rhs
        } else {
            // `a op= b` desugars to `a = a op b`; the synthesized operator
            // token keeps the source lexeme but carries the stripped kind.
            Expr::Binary {
                operator: strip_compound(&operator),
                left: Box::new(assignees[0].clone()),
                right: Box::new(rhs),
            }
        };

        Ok(Expr::Assign { operator, assignees, value: Box::new(value) })
    }

    fn ternary(&mut self) -> Result<Expr, Diagnostic> {
        let condition = self.or()?;
        if self.matches(&[TokenKind::QuestionMark]) {
            let operator1 = self.previous().clone();
            let center = self.ternary()?;
            self.consume(TokenKind::Colon, "Expected ':' in ternary expression.")?;
            let operator2 = self.previous().clone();
            let right = self.ternary()?;
            return Ok(Expr::Ternary {
                left: Box::new(condition),
                operator1,
                center: Box::new(center),
                operator2,
                right: Box::new(right),
            });
        }
        Ok(condition)
    }

    fn or(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.and()?;
        while self.matches(&[TokenKind::OrOr, TokenKind::XorXor]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical { operator, left: Box::new(expr), right: Box::new(right) };
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.equality()?;
        while self.matches(&[TokenKind::AndAnd]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical { operator, left: Box::new(expr), right: Box::new(right) };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.comparison()?;
        while self.matches(&[TokenKind::EqualEqual, TokenKind::BangEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary { operator, left: Box::new(expr), right: Box::new(right) };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.term()?;
        while self.matches(&[
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary { operator, left: Box::new(expr), right: Box::new(right) };
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.factor()?;
        while self.matches(&[TokenKind::Plus, TokenKind::Minus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary { operator, left: Box::new(expr), right: Box::new(right) };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.power()?;
        while self.matches(&[TokenKind::Asterisk, TokenKind::Slash, TokenKind::Percent]) {
            let operator = self.previous().clone();
            let right = self.power()?;
            expr = Expr::Binary { operator, left: Box::new(expr), right: Box::new(right) };
        }
        Ok(expr)
    }

    fn power(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.unary()?;
        while self.matches(&[TokenKind::AsteriskAsterisk]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary { operator, left: Box::new(expr), right: Box::new(right) };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, Diagnostic> {
        if self.matches(&[TokenKind::Bang, TokenKind::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary { operator, right: Box::new(right) });
        }
        self.postfix()
    }

    /// Postfix `++`/`--` desugars to `a = a ± 1`.
    fn postfix(&mut self) -> Result<Expr, Diagnostic> {
        let expr = self.call()?;
        if self.matches(&[TokenKind::PlusPlus, TokenKind::MinusMinus]) {
            let operator = self.previous().clone();
            if !matches!(expr, Expr::Variable { .. } | Expr::Subscript { .. }) {
                return Err(self.error_at("Can only assign to variables.", &operator));
            }
            let value = Expr::Binary {
                operator: strip_compound(&operator),
                left: Box::new(expr.clone()),
                right: Box::new(Expr::Literal { value: LiteralValue::Number(1.0) }),
            };
            return Ok(Expr::Assign {
                operator,
                assignees: vec![expr],
                value: Box::new(value),
            });
        }
        Ok(expr)
    }

    fn call(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.primary()?;
        loop {
            if self.matches(&[TokenKind::OpenParen]) {
                let open_paren = self.previous().clone();
                let mut args = Vec::new();
                if !self.check(TokenKind::CloseParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.matches(&[TokenKind::Comma]) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::CloseParen, "Expected ')' after arguments.")?;
                expr = Expr::Call { callee: Box::new(expr), args, open_paren };
            } else if self.matches(&[TokenKind::OpenBracket]) {
                let open_bracket = self.previous().clone();
                let index = self.expression()?;
                self.consume(TokenKind::CloseBracket, "Expected ']' after subscript.")?;
                expr = Expr::Subscript {
                    object: Box::new(expr),
                    index: Box::new(index),
                    open_bracket,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, Diagnostic> {
        if self.matches(&[TokenKind::Number, TokenKind::Str, TokenKind::True, TokenKind::False]) {
            let token = self.previous();
            let value = match &token.literal {
                Some(Literal::Number(n)) => LiteralValue::Number(*n),
                Some(Literal::Str(s)) => LiteralValue::Str(s.clone()),
                Some(Literal::Bool(b)) => LiteralValue::Bool(*b),
                None => LiteralValue::Null,
            };
            return Ok(Expr::Literal { value });
        }

        if self.matches(&[TokenKind::Identifier]) {
            return Ok(Expr::Variable {
                name: self.previous().clone(),
                nesting_level: UNRESOLVED,
            });
        }

        if self.matches(&[TokenKind::OpenParen]) {
            let open_paren = self.previous().clone();
            let expr = self.expression()?;
            if !self.matches(&[TokenKind::CloseParen]) {
                return Err(self.error_at("Parenthesis never closed.", &open_paren));
            }
            return Ok(Expr::Grouping { expr: Box::new(expr) });
        }

        if self.matches(&[TokenKind::OpenBracket]) {
            let mut values = Vec::new();
            if !self.check(TokenKind::CloseBracket) {
                loop {
                    values.push(self.expression()?);
                    if !self.matches(&[TokenKind::Comma]) {
                        break;
                    }
                }
            }
            self.consume(TokenKind::CloseBracket, "Expected ']' after list.")?;
            return Ok(Expr::List { values });
        }

        if self.matches(&[TokenKind::Func]) {
            let keyword = self.previous().clone();
            let (parameters, return_count, throws, body) = self.function_rest()?;
            return Ok(Expr::AnonymousFunction {
                keyword,
                parameters,
                body: Box::new(body),
                return_count,
                throws,
            });
        }

        Err(self.error(format!("Unexpected token '{}'.", self.peek().lexeme)))
    }

    // --- Cursor helpers ---

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.current += 1;
                return true;
            }
        }
        false
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.check(TokenKind::Eof) {
            self.current += 1;
        }
        self.previous()
    }

    fn back_up(&mut self) {
        self.current -= 1;
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            return Ok(self.advance().clone());
        }
        Err(self.error(message))
    }

    /// Skips tokens until a likely statement boundary: a consumed `;` or an
    /// upcoming declaration/statement keyword.
    fn synchronize(&mut self) {
        self.advance();
        while !self.check(TokenKind::Eof) {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Var
                | TokenKind::Func
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For => return,
                _ => {}
            }
            self.advance();
        }
    }

    fn error(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::at_token(DiagnosticKind::ParseError, message, self.peek(), self.lines)
    }

    fn error_at(&self, message: impl Into<String>, token: &Token) -> Diagnostic {
        Diagnostic::at_token(DiagnosticKind::ParseError, message, token, self.lines)
    }
}

/// Maps a compound operator token to its underlying arithmetic operator,
/// keeping the source lexeme for diagnostics and the AST printer.
fn strip_compound(token: &Token) -> Token {
    let kind = match token.kind {
        TokenKind::PlusEqual | TokenKind::PlusPlus => TokenKind::Plus,
        TokenKind::MinusEqual | TokenKind::MinusMinus => TokenKind::Minus,
        TokenKind::AsteriskEqual => TokenKind::Asterisk,
        TokenKind::AsteriskAsteriskEqual => TokenKind::AsteriskAsterisk,
        TokenKind::SlashEqual => TokenKind::Slash,
        TokenKind::PercentEqual => TokenKind::Percent,
        other => other,
    };
    Token { kind, ..token.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::print_stmt;
    use crate::lexer::scan;

    fn parse_source(source: &str) -> (Vec<Stmt>, Vec<Diagnostic>) {
        let (tokens, lines) = scan(source).expect("scan should succeed");
        parse(tokens, &lines)
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (program, errors) = parse_source(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        program
    }

    fn body_of(stmt: &Stmt) -> &[Stmt] {
        match stmt {
            Stmt::FuncDecl { body, .. } => match body.as_ref() {
                Stmt::Block { statements } => statements,
                other => panic!("function body should be a block, got {:?}", other),
            },
            other => panic!("expected a function declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_func_decl_carries_return_count_and_throws() {
        let program = parse_ok("func f(a, b) 2 throws { }");
        match &program[0] {
            Stmt::FuncDecl { name, parameters, return_count, throws, .. } => {
                assert_eq!(name.lexeme, "f");
                assert_eq!(parameters, &["a".to_string(), "b".to_string()]);
                assert_eq!(*return_count, 2);
                assert!(*throws);
            }
            other => panic!("expected FuncDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_return_count_out_of_range_is_an_error() {
        let (_, errors) = parse_source("func f() 5 { }");
        assert!(errors
            .iter()
            .any(|e| e.message.contains("return value count between 0 and 4")));
    }

    #[test]
    fn test_top_level_statement_is_rejected() {
        let (_, errors) = parse_source("1 + 2;");
        assert!(errors.iter().any(|e| e.message == "Expected declaration."));
    }

    #[test]
    fn test_compound_assignment_desugars_to_binary() {
        let program = parse_ok("func main() { var a = 1; a += 2; }");
        let body = body_of(&program[0]);
        match &body[1] {
            Stmt::Expression { expr: Expr::Assign { operator, assignees, value } } => {
                assert_eq!(operator.lexeme, "+=");
                assert_eq!(assignees.len(), 1);
                match value.as_ref() {
                    Expr::Binary { operator, .. } => {
                        assert_eq!(operator.kind, TokenKind::Plus);
                        assert_eq!(operator.lexeme, "+=");
                    }
                    other => panic!("expected desugared Binary, got {:?}", other),
                }
            }
            other => panic!("expected Assign statement, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_increment_desugars_to_assignment() {
        let program = parse_ok("func main() { var a = 1; a++; }");
        let body = body_of(&program[0]);
        match &body[1] {
            Stmt::Expression { expr: Expr::Assign { assignees, value, .. } } => {
                assert!(matches!(assignees[0], Expr::Variable { .. }));
                match value.as_ref() {
                    Expr::Binary { operator, right, .. } => {
                        assert_eq!(operator.kind, TokenKind::Plus);
                        assert!(matches!(
                            right.as_ref(),
                            Expr::Literal { value: LiteralValue::Number(n) } if *n == 1.0
                        ));
                    }
                    other => panic!("expected desugared Binary, got {:?}", other),
                }
            }
            other => panic!("expected Assign statement, got {:?}", other),
        }
    }

    #[test]
    fn test_multi_target_assignment_shape() {
        let program = parse_ok("func main() { var a = 0; var b = 0; a, b = pair(); }");
        let body = body_of(&program[0]);
        match &body[2] {
            Stmt::Expression { expr: Expr::Assign { assignees, value, .. } } => {
                assert_eq!(assignees.len(), 2);
                assert!(matches!(value.as_ref(), Expr::Call { .. }));
            }
            other => panic!("expected multi-target Assign, got {:?}", other),
        }
    }

    #[test]
    fn test_compound_with_multiple_targets_is_rejected() {
        let (_, errors) = parse_source("func main() { var a = 0; var b = 0; a, b += 1; }");
        assert!(errors
            .iter()
            .any(|e| e.message == "Compound assignment is not allowed with multiple targets."));
    }

    #[test]
    fn test_assignment_to_literal_is_rejected() {
        let (_, errors) = parse_source("func main() { 1 = 2; }");
        assert!(errors.iter().any(|e| e.message == "Can only assign to variables."));
    }

    #[test]
    fn test_call_arguments_are_not_swallowed_by_multi_assign() {
        let program = parse_ok("func main() { f(a, b); }");
        let body = body_of(&program[0]);
        match &body[0] {
            Stmt::Expression { expr: Expr::Call { args, .. } } => assert_eq!(args.len(), 2),
            other => panic!("expected Call, got {:?}", other),
        }
    }

    #[test]
    fn test_return_with_multiple_values() {
        let program = parse_ok("func pair() 2 { return 1, 2; }");
        let body = body_of(&program[0]);
        match &body[0] {
            Stmt::Return { values, .. } => assert_eq!(values.len(), 2),
            other => panic!("expected Return, got {:?}", other),
        }
    }

    #[test]
    fn test_for_loop_is_wrapped_in_block() {
        let program = parse_ok("func main() { for (var i = 0; i < 3; i++) { } }");
        let body = body_of(&program[0]);
        match &body[0] {
            Stmt::Block { statements } => {
                assert_eq!(statements.len(), 1);
                assert!(matches!(statements[0], Stmt::For { .. }));
            }
            other => panic!("expected synthetic Block, got {:?}", other),
        }
    }

    #[test]
    fn test_for_loop_missing_clauses_are_synthesized() {
        let program = parse_ok("func main() { for (;;) { break; } }");
        let body = body_of(&program[0]);
        let Stmt::Block { statements } = &body[0] else {
            panic!("expected synthetic Block");
        };
        match &statements[0] {
            Stmt::For { initializer, condition, increment, .. } => {
                assert!(matches!(initializer.as_ref(), Stmt::Expression { .. }));
                assert!(matches!(
                    condition,
                    Expr::Literal { value: LiteralValue::Bool(true) }
                ));
                assert!(matches!(increment, Expr::Literal { value: LiteralValue::Null }));
            }
            other => panic!("expected For, got {:?}", other),
        }
    }

    #[test]
    fn test_subscript_chain_is_left_associative() {
        let program = parse_ok("func main() { m[0][1]; }");
        let body = body_of(&program[0]);
        match &body[0] {
            Stmt::Expression { expr: Expr::Subscript { object, .. } } => {
                assert!(matches!(object.as_ref(), Expr::Subscript { .. }));
            }
            other => panic!("expected nested Subscript, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_power_binds_tighter_than_factor() {
        let program = parse_ok("func main() { var x = 2 * 3 ** 2; }");
        let body = body_of(&program[0]);
        let Stmt::VarDecl { initializer: Some(Expr::Binary { operator, right, .. }), .. } =
            &body[0]
        else {
            panic!("expected VarDecl with Binary initializer");
        };
        assert_eq!(operator.kind, TokenKind::Asterisk);
        assert!(matches!(
            right.as_ref(),
            Expr::Binary { operator, .. } if operator.kind == TokenKind::AsteriskAsterisk
        ));
    }

    #[test]
    fn test_anonymous_function_expression() {
        let program = parse_ok("func main() { var f = func (x) 1 { return x; }; }");
        let body = body_of(&program[0]);
        let Stmt::VarDecl { initializer: Some(init), .. } = &body[0] else {
            panic!("expected VarDecl");
        };
        match init {
            Expr::AnonymousFunction { parameters, return_count, throws, .. } => {
                assert_eq!(parameters, &["x".to_string()]);
                assert_eq!(*return_count, 1);
                assert!(!*throws);
            }
            other => panic!("expected AnonymousFunction, got {:?}", other),
        }
    }

    #[test]
    fn test_error_recovery_reports_multiple_errors() {
        let (_, errors) = parse_source("var = 1;\nvar y = ;\nfunc main() { }");
        assert!(errors.len() >= 2, "expected at least two errors, got {:?}", errors);
    }

    #[test]
    fn test_ternary_parses_right_associative() {
        let program = parse_ok("func main() { var x = true ? 1 : false ? 2 : 3; }");
        let body = body_of(&program[0]);
        let Stmt::VarDecl { initializer: Some(Expr::Ternary { right, .. }), .. } = &body[0] else {
            panic!("expected Ternary initializer");
        };
        assert!(matches!(right.as_ref(), Expr::Ternary { .. }));
    }

    #[test]
    fn test_verbose_printer_round_trip_smoke() {
        let program = parse_ok("func main() { var a = [1,2]; a[0] += 1; }");
        let text = print_stmt(&program[0]);
        assert!(text.starts_with("[fn] func main()"), "got: {}", text);
        assert!(text.contains("[va] var a"), "got: {}", text);
    }
}
