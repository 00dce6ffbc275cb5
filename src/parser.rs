// ABOUTME: Recursive-descent / precedence-climbing parser building the AST from tokens

use crate::ast::*;
use crate::error::{NumfuError, Result, Span};
use crate::lexer::{tokenize, Token, TokenKind, RESERVED};
use std::rc::Rc;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    allow_dollar: bool,
}

pub fn parse_module(source: &str) -> Result<Module> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        allow_dollar: false,
    };
    let statements = parser.parse_statements()?;
    Ok(Module {
        statements: Rc::new(statements),
    })
}

/// Parse a single expression (used by the REPL's single-line input path).
pub fn parse_expression(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        allow_dollar: false,
    };
    let expr = parser.parse_expr()?;
    parser.expect_eof()?;
    Ok(expr)
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.pos].span.clone()
    }

    fn prev_line(&self) -> usize {
        if self.pos == 0 {
            self.tokens[0].span.line
        } else {
            self.tokens[self.pos - 1].span.line
        }
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if !matches!(tok.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn expect_eof(&self) -> Result<()> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(NumfuError::syntax(format!(
                "unexpected trailing token {:?}",
                self.peek()
            ))
            .at(self.peek_span()))
        }
    }

    fn ident_is(&self, name: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(s) if s == name)
    }

    fn expect_kind(&mut self, kind: &TokenKind, what: &str) -> Result<Span> {
        if self.peek() == kind {
            Ok(self.advance().span)
        } else {
            Err(NumfuError::syntax(format!(
                "expected {what}, found {:?}",
                self.peek()
            ))
            .at(self.peek_span()))
        }
    }

    fn expect_assign(&mut self) -> Result<Span> {
        self.expect_kind(&TokenKind::Assign, "'='")
    }

    fn expect_ident_word(&mut self, word: &str) -> Result<Span> {
        if self.ident_is(word) {
            Ok(self.advance().span)
        } else {
            Err(NumfuError::syntax(format!(
                "expected '{word}', found {:?}",
                self.peek()
            ))
            .at(self.peek_span()))
        }
    }

    fn expect_ident_name(&mut self) -> Result<(String, Span)> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(NumfuError::syntax(format!(
                "expected identifier, found {:?}",
                self.peek()
            ))
            .at(self.peek_span())),
        }
    }

    fn expect_string(&mut self) -> Result<String> {
        match self.peek().clone() {
            TokenKind::Str(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(NumfuError::syntax(format!(
                "expected a string literal, found {:?}",
                self.peek()
            ))
            .at(self.peek_span())),
        }
    }

    // ---- Top-level statements ----

    fn parse_statements(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.at_eof() {
            while matches!(self.peek(), TokenKind::Semicolon) {
                self.advance();
            }
            if self.at_eof() {
                break;
            }
            stmts.push(self.parse_statement()?);
            while matches!(self.peek(), TokenKind::Semicolon) {
                self.advance();
            }
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        if self.ident_is("import") {
            return self.parse_import().map(Stmt::Import);
        }
        if self.ident_is("export") {
            return self.parse_export().map(Stmt::Export);
        }
        if self.ident_is("del") {
            let span = self.advance().span;
            let (name, _) = self.expect_ident_name()?;
            return Ok(Stmt::Del { name, span });
        }
        if self.ident_is("let") {
            return self.parse_let_statement_or_expr();
        }
        let expr = self.parse_expr()?;
        if matches!(self.peek(), TokenKind::Assert) {
            self.advance();
            let expr_span = expr.span();
            self.allow_dollar = true;
            let pred = self.parse_expr();
            self.allow_dollar = false;
            let pred = pred?;
            return Ok(Stmt::Assert {
                expr,
                pred,
                expr_span,
            });
        }
        Ok(Stmt::Expr(expr))
    }

    fn parse_let_statement_or_expr(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'let'
        let (first_name, _) = self.expect_ident_name()?;
        self.expect_assign()?;
        let first_value = self.parse_expr()?;

        if matches!(self.peek(), TokenKind::Comma) {
            let mut bindings = vec![(first_name, first_value)];
            while matches!(self.peek(), TokenKind::Comma) {
                self.advance();
                let (name, _) = self.expect_ident_name()?;
                self.expect_assign()?;
                let value = self.parse_expr()?;
                bindings.push((name, value));
            }
            self.expect_ident_word("in")?;
            let body = self.parse_expr()?;
            return Ok(Stmt::Expr(Expr::Let {
                bindings,
                body: Box::new(body),
                span,
            }));
        }

        if self.ident_is("in") {
            self.advance();
            let body = self.parse_expr()?;
            return Ok(Stmt::Expr(Expr::Let {
                bindings: vec![(first_name, first_value)],
                body: Box::new(body),
                span,
            }));
        }

        Ok(Stmt::Let {
            name: first_name,
            value: first_value,
        })
    }

    fn parse_import(&mut self) -> Result<ImportStmt> {
        let span = self.advance().span; // 'import'
        if let TokenKind::Str(path) = self.peek().clone() {
            self.advance();
            return Ok(ImportStmt::Whole { path, span });
        }
        if matches!(self.peek(), TokenKind::Star) {
            self.advance();
            self.expect_ident_word("from")?;
            let path = self.expect_string()?;
            return Ok(ImportStmt::All { path, span });
        }
        let mut names = Vec::new();
        let (first, _) = self.expect_ident_name()?;
        names.push(first);
        while matches!(self.peek(), TokenKind::Comma) {
            self.advance();
            let (name, _) = self.expect_ident_name()?;
            names.push(name);
        }
        self.expect_ident_word("from")?;
        let path = self.expect_string()?;
        Ok(ImportStmt::Named { names, path, span })
    }

    fn parse_export(&mut self) -> Result<ExportStmt> {
        self.advance(); // 'export'
        let (first, _) = self.expect_ident_name()?;
        if matches!(self.peek(), TokenKind::Assign) {
            self.advance();
            let value = self.parse_expr()?;
            return Ok(ExportStmt::Assign { name: first, value });
        }
        let mut names = vec![first];
        while matches!(self.peek(), TokenKind::Comma) {
            self.advance();
            let (name, _) = self.expect_ident_name()?;
            names.push(name);
        }
        Ok(ExportStmt::Names(names))
    }

    // ---- Expressions: precedence climbing ----

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_pipe()
    }

    fn parse_pipe(&mut self) -> Result<Expr> {
        let mut left = self.parse_compose()?;
        while matches!(self.peek(), TokenKind::PipeOp) {
            let span = self.advance().span;
            let right = self.parse_compose()?;
            left = Expr::Pipe(Box::new(left), Box::new(right), span);
        }
        Ok(left)
    }

    fn parse_compose(&mut self) -> Result<Expr> {
        let left = self.parse_or()?;
        if matches!(self.peek(), TokenKind::Compose) {
            let span = self.advance().span;
            let right = self.parse_compose()?;
            return Ok(Expr::Compose(Box::new(left), Box::new(right), span));
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), TokenKind::OrOr) {
            let span = self.advance().span;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right), span);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_compare()?;
        while matches!(self.peek(), TokenKind::AndAnd) {
            let span = self.advance().span;
            let right = self.parse_compare()?;
            left = Expr::And(Box::new(left), Box::new(right), span);
        }
        Ok(left)
    }

    /// Lowers an operand to a call argument: a bare `_` becomes a
    /// placeholder slot, anything else an ordinary value argument. This is
    /// how binary/unary operators acquire the curry/placeholder protocol —
    /// they desugar into calls against the builtin of the same name.
    fn to_call_arg(expr: Expr) -> CallArg {
        match expr {
            Expr::Placeholder(span) => CallArg::Placeholder(span),
            other => CallArg::Value(other),
        }
    }

    fn desugar_binary(op_symbol: &'static str, left: Expr, right: Expr, span: Span) -> Expr {
        Expr::Call {
            func: Box::new(Expr::Ident(op_symbol.to_string(), span.clone())),
            args: vec![Self::to_call_arg(left), Self::to_call_arg(right)],
            span,
        }
    }

    fn desugar_unary(op_symbol: &'static str, operand: Expr, span: Span) -> Expr {
        Expr::Call {
            func: Box::new(Expr::Ident(op_symbol.to_string(), span.clone())),
            args: vec![Self::to_call_arg(operand)],
            span,
        }
    }

    fn parse_compare(&mut self) -> Result<Expr> {
        let first = self.parse_add()?;
        let span = first.span();
        let mut operands = vec![first];
        let mut ops = Vec::new();
        loop {
            let op = match self.peek() {
                TokenKind::Lt => CompareOp::Lt,
                TokenKind::Gt => CompareOp::Gt,
                TokenKind::Le => CompareOp::Le,
                TokenKind::Ge => CompareOp::Ge,
                TokenKind::EqEq => CompareOp::Eq,
                TokenKind::NotEq => CompareOp::Neq,
                _ => break,
            };
            self.advance();
            let next = self.parse_add()?;
            ops.push(op);
            operands.push(next);
        }
        if ops.is_empty() {
            Ok(operands.pop().unwrap())
        } else if ops.len() == 1 {
            // A single comparison desugars into a curryable call, like any
            // other binary operator; a genuine chain (2+ operators) keeps
            // its own evaluation path so each operand is evaluated once.
            let right = operands.pop().unwrap();
            let left = operands.pop().unwrap();
            Ok(Self::desugar_binary(ops[0].symbol(), left, right, span))
        } else {
            Ok(Expr::Chain {
                operands,
                ops,
                span,
            })
        }
    }

    fn parse_add(&mut self) -> Result<Expr> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => ArithOp::Add,
                TokenKind::Minus => ArithOp::Sub,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.parse_mul()?;
            left = Self::desugar_binary(op.symbol(), left, right, span);
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => ArithOp::Mul,
                TokenKind::Slash => ArithOp::Div,
                TokenKind::Percent => ArithOp::Mod,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.parse_unary()?;
            left = Self::desugar_binary(op.symbol(), left, right, span);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            TokenKind::Minus => {
                let span = self.advance().span;
                let operand = self.parse_unary()?;
                // Unary negation reuses the binary subtraction builtin:
                // `-x` desugars to `(-)(0, x)`.
                Ok(Self::desugar_binary(
                    "-",
                    Expr::Number(crate::number::Number::zero(), span.clone()),
                    operand,
                    span,
                ))
            }
            TokenKind::Bang => {
                let span = self.advance().span;
                let operand = self.parse_unary()?;
                Ok(Self::desugar_unary("!", operand, span))
            }
            _ => self.parse_pow(),
        }
    }

    fn parse_pow(&mut self) -> Result<Expr> {
        let left = self.parse_call_index()?;
        if matches!(self.peek(), TokenKind::Caret) {
            let span = self.advance().span;
            // The right operand of `^` may itself start with a unary
            // operator (so `2^-3` parses), even though unary otherwise
            // binds looser than `^`.
            let right = self.parse_unary()?;
            return Ok(Self::desugar_binary(ArithOp::Pow.symbol(), left, right, span));
        }
        Ok(left)
    }

    fn parse_call_index(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.at_eof() {
                break;
            }
            let same_line = self.tokens[self.pos].span.line == self.prev_line();
            match self.peek() {
                TokenKind::LParen if same_line => {
                    let span = self.peek_span();
                    let args = self.parse_call_args()?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                        span,
                    };
                }
                TokenKind::LBracket if same_line => {
                    let span = self.advance().span;
                    let index = self.parse_expr()?;
                    self.expect_kind(&TokenKind::RBracket, "']'")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<CallArg>> {
        self.expect_kind(&TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if matches!(self.peek(), TokenKind::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            if matches!(self.peek(), TokenKind::Underscore) {
                let span = self.advance().span;
                args.push(CallArg::Placeholder(span));
            } else if matches!(self.peek(), TokenKind::Ellipsis) {
                let span = self.advance().span;
                if matches!(self.peek(), TokenKind::Underscore) {
                    return Err(NumfuError::syntax("cannot spread the placeholder '..._'").at(span));
                }
                let expr = self.parse_expr()?;
                args.push(CallArg::Spread(expr));
            } else {
                args.push(CallArg::Value(self.parse_expr()?));
            }
            if matches!(self.peek(), TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        self.expect_kind(&TokenKind::RParen, "')'")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.peek_span();
        match self.peek().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n, span))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Expr::Bool(b, span))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s, span))
            }
            TokenKind::Dollar => {
                self.advance();
                if !self.allow_dollar {
                    return Err(NumfuError::syntax(
                        "'$' is only valid on the right-hand side of '--->'",
                    )
                    .at(span));
                }
                Ok(Expr::Dollar(span))
            }
            TokenKind::Underscore => {
                self.advance();
                Ok(Expr::Placeholder(span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_kind(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_list_literal(),
            TokenKind::LBrace => self.parse_lambda(),
            TokenKind::Ident(name) => {
                if name == "if" {
                    return self.parse_if();
                }
                if name == "let" {
                    return self.parse_let_expr();
                }
                if RESERVED.contains(&name.as_str()) {
                    return Err(NumfuError::syntax(format!(
                        "'{name}' is a reserved word and cannot be used here"
                    ))
                    .at(span));
                }
                self.advance();
                // `PREFIX.NAME` qualified access, produced by a whole-module
                // import (spec §4.1/§4.2): folded into a single dotted
                // identifier, the same key `module.rs` binds the export
                // under.
                let mut full_name = name;
                while matches!(self.peek(), TokenKind::Dot) {
                    self.advance();
                    let (segment, _) = self.expect_ident_name()?;
                    full_name.push('.');
                    full_name.push_str(&segment);
                }
                Ok(Expr::Ident(full_name, span))
            }
            other => Err(NumfuError::syntax(format!("unexpected token {other:?}")).at(span)),
        }
    }

    fn parse_list_literal(&mut self) -> Result<Expr> {
        let span = self.advance().span; // '['
        let mut items = Vec::new();
        if matches!(self.peek(), TokenKind::RBracket) {
            self.advance();
            return Ok(Expr::ListLit(items, span));
        }
        loop {
            if matches!(self.peek(), TokenKind::Ellipsis) {
                self.advance();
                items.push(ListItem::Spread(self.parse_expr()?));
            } else {
                items.push(ListItem::Item(self.parse_expr()?));
            }
            if matches!(self.peek(), TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        self.expect_kind(&TokenKind::RBracket, "']'")?;
        Ok(Expr::ListLit(items, span))
    }

    fn parse_lambda(&mut self) -> Result<Expr> {
        let span = self.advance().span; // '{'
        let mut name = None;
        if let TokenKind::Ident(ident_name) = self.peek().clone() {
            if matches!(self.tokens[self.pos + 1].kind, TokenKind::Colon) {
                self.advance();
                self.advance();
                name = Some(ident_name);
            }
        }
        let mut params = Vec::new();
        loop {
            if matches!(self.peek(), TokenKind::Arrow) {
                break;
            }
            let is_rest = if matches!(self.peek(), TokenKind::Ellipsis) {
                self.advance();
                true
            } else {
                false
            };
            let (param_name, _) = self.expect_ident_name()?;
            params.push(Param {
                name: param_name,
                is_rest,
            });
            if matches!(self.peek(), TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        if params
            .iter()
            .take(params.len().saturating_sub(1))
            .any(|p| p.is_rest)
        {
            return Err(
                NumfuError::syntax("only the last lambda parameter may be a rest parameter")
                    .at(span),
            );
        }
        self.expect_kind(&TokenKind::Arrow, "'->'")?;
        let body = self.parse_expr()?;
        self.expect_kind(&TokenKind::RBrace, "'}'")?;
        Ok(Expr::Lambda(Rc::new(LambdaDef {
            name,
            params,
            body,
            span,
        })))
    }

    fn parse_if(&mut self) -> Result<Expr> {
        let span = self.advance().span; // 'if'
        let cond = self.parse_expr()?;
        self.expect_ident_word("then")?;
        let then_branch = self.parse_expr()?;
        self.expect_ident_word("else")?;
        let else_branch = self.parse_expr()?;
        Ok(Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            span,
        })
    }

    fn parse_let_expr(&mut self) -> Result<Expr> {
        let span = self.advance().span; // 'let'
        let mut bindings = Vec::new();
        loop {
            let (name, _) = self.expect_ident_name()?;
            self.expect_assign()?;
            let value = self.parse_expr()?;
            bindings.push((name, value));
            if matches!(self.peek(), TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        self.expect_ident_word("in")?;
        let body = self.parse_expr()?;
        Ok(Expr::Let {
            bindings,
            body: Box::new(body),
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Module {
        parse_module(src).unwrap_or_else(|e| panic!("failed to parse {src:?}: {e}"))
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let m = parse_ok("1 + 2 * 3");
        assert_eq!(m.statements.len(), 1);
        match &m.statements[0] {
            Stmt::Expr(Expr::Call { func, args, .. }) => {
                assert!(matches!(&**func, Expr::Ident(name, _) if name == "+"));
                // The right-hand operand should itself be the `2 * 3` call.
                match &args[1] {
                    CallArg::Value(Expr::Call { func, .. }) => {
                        assert!(matches!(&**func, Expr::Ident(name, _) if name == "*"));
                    }
                    other => panic!("unexpected rhs: {other:?}"),
                }
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn parses_chained_comparison() {
        let m = parse_ok("1 < 2 <= 3");
        match &m.statements[0] {
            Stmt::Expr(Expr::Chain { ops, operands, .. }) => {
                assert_eq!(ops, &[CompareOp::Lt, CompareOp::Le]);
                assert_eq!(operands.len(), 3);
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn parses_lambda_with_rest_param() {
        let m = parse_ok("{x, ...rest -> x}");
        match &m.statements[0] {
            Stmt::Expr(Expr::Lambda(def)) => {
                assert_eq!(def.params.len(), 2);
                assert!(def.params[1].is_rest);
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn parses_placeholder_call() {
        let m = parse_ok("add(_, 1)");
        match &m.statements[0] {
            Stmt::Expr(Expr::Call { args, .. }) => {
                assert!(matches!(args[0], CallArg::Placeholder(_)));
                assert!(matches!(args[1], CallArg::Value(_)));
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn index_requires_same_line() {
        let m = parse_ok("a\n[1]");
        assert_eq!(m.statements.len(), 2);
    }

    #[test]
    fn parses_let_statement_vs_let_expression() {
        let m = parse_ok("let x = 1\nlet y = x in y + 1");
        assert!(matches!(m.statements[0], Stmt::Let { .. }));
        assert!(matches!(m.statements[1], Stmt::Expr(Expr::Let { .. })));
    }

    #[test]
    fn parses_assertion_sugar() {
        let m = parse_ok("1 + 1 ---> $ == 2");
        assert!(matches!(m.statements[0], Stmt::Assert { .. }));
    }

    #[test]
    fn desugars_placeholder_operand_into_call() {
        // `_ + 1` parses as a call to the `+` builtin with a placeholder arg,
        // not a dedicated arithmetic node — this is what lets `_ + 1` curry.
        let m = parse_ok("_ + 1");
        match &m.statements[0] {
            Stmt::Expr(Expr::Call { func, args, .. }) => {
                assert!(matches!(&**func, Expr::Ident(name, _) if name == "+"));
                assert!(matches!(args[0], CallArg::Placeholder(_)));
                assert!(matches!(args[1], CallArg::Value(_)));
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn bare_placeholder_statement_still_parses() {
        // Parses fine (desugaring only triggers next to an operator); it is
        // the evaluator's job to reject a bare placeholder as a value.
        assert!(parse_module("_").is_ok());
    }

    #[test]
    fn parses_import_and_export() {
        let m = parse_ok("import a, b from \"mod\"\nexport a");
        assert!(matches!(m.statements[0], Stmt::Import(ImportStmt::Named { .. })));
        assert!(matches!(
            m.statements[1],
            Stmt::Export(ExportStmt::Names(_))
        ));
    }
}
