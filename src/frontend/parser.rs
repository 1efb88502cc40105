//! Parser for Swiftlite.
//!
//! Recursive descent with Pratt parsing for expressions. The parser never
//! aborts on a recoverable error: it records a syntactic diagnostic, discards
//! tokens up to the next statement boundary, and keeps going, so one pass
//! over the file yields the maximal diagnostic set and always a `Program`.

use crate::frontend::ast::*;
use crate::frontend::token::{Token, TokenKind};
use crate::types::Type;
use crate::utils::Diagnostic;

/// Marker for "a diagnostic was recorded, bail to the statement boundary".
struct Recover;

type PResult<T> = Result<T, Recover>;

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    /// Create a parser from a token stream. The stream is expected to end
    /// with an Eof token, as produced by the lexer.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::eof(1));
        }
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        // tokens is non-empty and pos is clamped by advance()
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Record a syntactic diagnostic at the current token. Premature end of
    /// input gets its own message instead of a token name.
    fn syntax_error(&mut self, expected: &str) -> Recover {
        let token = self.current();
        let message = if token.kind == TokenKind::Eof {
            format!("unexpected end of input, expected {}", expected)
        } else {
            format!(
                "unexpected token '{}' ({}), expected {}",
                token.kind.lexeme(),
                token.kind.name(),
                expected
            )
        };
        let line = token.line;
        self.diagnostics.push(Diagnostic::syntactic(line, message));
        Recover
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> PResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.syntax_error(expected))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> PResult<(String, u32)> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, token.line))
            }
            _ => Err(self.syntax_error(expected)),
        }
    }

    /// Discard tokens until a safe boundary: just past a `;`, before a `}`
    /// (the enclosing block owns it), before a statement-start keyword, or
    /// end of input.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            match self.current_kind() {
                TokenKind::RBrace
                | TokenKind::Var
                | TokenKind::Let
                | TokenKind::Func
                | TokenKind::Class
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return => return,
                _ => {}
            }
            if self.advance().kind == TokenKind::Semicolon {
                return;
            }
        }
    }

    // ==================== Parsing Methods ====================

    /// Parse a complete program: always returns a Program plus diagnostics.
    pub fn parse(mut self) -> (Program, Vec<Diagnostic>) {
        let mut stmts = Vec::new();

        while !self.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(Recover) => {
                    self.synchronize();
                    // A stray close brace at top level has no enclosing block
                    if self.check(&TokenKind::RBrace) {
                        self.advance();
                    }
                }
            }
        }

        log::debug!(
            "parsed {} top-level statements, {} syntactic diagnostics",
            stmts.len(),
            self.diagnostics.len()
        );
        (Program { stmts }, self.diagnostics)
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        match self.current_kind() {
            TokenKind::Var | TokenKind::Let => self.parse_var_decl().map(Stmt::Var),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for_in(),
            TokenKind::Func => self.parse_func().map(Stmt::Func),
            TokenKind::Class => self.parse_class().map(Stmt::Class),
            TokenKind::Return => self.parse_return(),
            TokenKind::Ident(_) if self.peek_kind() == Some(&TokenKind::Assign) => {
                self.parse_assignment()
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semicolon, "';' after expression")?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// var/let name [: type] [= expr] ;
    fn parse_var_decl(&mut self) -> PResult<VarDecl> {
        let keyword = self.advance();
        let mutable = keyword.kind == TokenKind::Var;

        let (name, _) = self.expect_ident("variable name")?;

        let declared_ty = if self.consume(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let init = if self.consume(&TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon, "';' after declaration")?;

        Ok(VarDecl {
            name,
            declared_ty,
            init,
            mutable,
            line: keyword.line,
        })
    }

    /// name = expr ;
    fn parse_assignment(&mut self) -> PResult<Stmt> {
        let (name, line) = self.expect_ident("assignment target")?;
        self.expect(TokenKind::Assign, "'='")?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "';' after assignment")?;
        Ok(Stmt::Assign { name, value, line })
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let keyword = self.advance();
        let cond = self.parse_expr()?;
        let then_block = self.parse_block()?;

        let else_block = if self.consume(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                // else-if chains nest as a single-statement else block
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
            line: keyword.line,
        })
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let keyword = self.advance();
        let cond = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::While {
            cond,
            body,
            line: keyword.line,
        })
    }

    /// for binding in iterable { ... }
    fn parse_for_in(&mut self) -> PResult<Stmt> {
        let keyword = self.advance();
        let (binding, _) = self.expect_ident("loop variable")?;
        self.expect(TokenKind::In, "'in'")?;
        let iterable = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::ForIn {
            binding,
            iterable,
            body,
            line: keyword.line,
        })
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        let keyword = self.advance();
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon, "';' after return")?;
        Ok(Stmt::Return {
            value,
            line: keyword.line,
        })
    }

    /// func name(params) [-> type] { ... }
    fn parse_func(&mut self) -> PResult<FuncDecl> {
        let keyword = self.advance();
        let (name, _) = self.expect_ident("function name")?;

        self.expect(TokenKind::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            params.push(self.parse_param()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')' after parameters")?;

        let ret_ty = if self.consume(&TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block()?;

        Ok(FuncDecl {
            name,
            params,
            ret_ty,
            body,
            line: keyword.line,
        })
    }

    /// name: type [= default]
    fn parse_param(&mut self) -> PResult<Param> {
        let (name, line) = self.expect_ident("parameter name")?;
        self.expect(TokenKind::Colon, "':' after parameter name")?;
        let ty = self.parse_type()?;
        let default = if self.consume(&TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Param {
            name,
            ty,
            default,
            line,
        })
    }

    /// class Name { var/let properties and func methods }
    fn parse_class(&mut self) -> PResult<ClassDecl> {
        let keyword = self.advance();
        let (name, _) = self.expect_ident("class name")?;
        self.expect(TokenKind::LBrace, "'{' after class name")?;

        let mut properties = Vec::new();
        let mut methods = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let result = match self.current_kind() {
                TokenKind::Var | TokenKind::Let => {
                    self.parse_var_decl().map(|p| properties.push(p))
                }
                TokenKind::Func => self.parse_func().map(|m| methods.push(m)),
                _ => {
                    let err = self.syntax_error("class member (var, let or func)");
                    // The offending token is consumed here so recovery
                    // cannot stall on a statement keyword.
                    self.advance();
                    Err::<(), Recover>(err)
                }
            };
            if result.is_err() {
                self.synchronize();
            }
        }

        self.expect(TokenKind::RBrace, "'}' after class body")?;

        Ok(ClassDecl {
            name,
            properties,
            methods,
            line: keyword.line,
        })
    }

    /// { stmt* } — a bad statement inside the block is recovered locally so
    /// the block itself still closes.
    fn parse_block(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(Recover) => self.synchronize(),
            }
        }

        self.expect(TokenKind::RBrace, "'}' to close block")?;
        Ok(stmts)
    }

    // ==================== Type Annotations ====================

    fn parse_type(&mut self) -> PResult<Type> {
        let token = self.current().clone();
        match &token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Type::from_name(name))
            }
            // [T] array or [K: V] dictionary
            TokenKind::LBracket => {
                self.advance();
                let first = self.parse_type()?;
                if self.consume(&TokenKind::Colon) {
                    let value = self.parse_type()?;
                    self.expect(TokenKind::RBracket, "']' after dictionary type")?;
                    Ok(Type::dictionary(first, value))
                } else {
                    self.expect(TokenKind::RBracket, "']' after array type")?;
                    Ok(Type::array(first))
                }
            }
            // () / (T) / (T, U, ...)
            TokenKind::LParen => {
                self.advance();
                if self.consume(&TokenKind::RParen) {
                    return Ok(Type::Void);
                }
                let mut elems = vec![self.parse_type()?];
                while self.consume(&TokenKind::Comma) {
                    elems.push(self.parse_type()?);
                }
                self.expect(TokenKind::RParen, "')' after tuple type")?;
                if elems.len() == 1 {
                    Ok(elems.pop().unwrap_or(Type::Unknown))
                } else {
                    Ok(Type::Tuple(elems))
                }
            }
            _ => Err(self.syntax_error("type")),
        }
    }

    // ==================== Expression Parsing (Pratt) ====================

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_expr_bp(0)
    }

    /// Parse expression with binding power (Pratt parsing)
    fn parse_expr_bp(&mut self, min_bp: u8) -> PResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let Some(bp) = self.current_kind().binary_precedence() else {
                break;
            };
            if bp < min_bp {
                break;
            }

            let line = self.current().line;
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                TokenKind::AndAnd => BinOp::And,
                TokenKind::OrOr => BinOp::Or,
                TokenKind::Ellipsis => BinOp::Range,
                _ => break,
            };
            self.advance();

            let right = self.parse_expr_bp(bp + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        match self.current_kind() {
            TokenKind::Not => {
                let line = self.advance().line;
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnOp::Not,
                    operand: Box::new(operand),
                    line,
                })
            }
            TokenKind::Minus => {
                let line = self.advance().line;
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnOp::Neg,
                    operand: Box::new(operand),
                    line,
                })
            }
            _ => {
                let primary = self.parse_primary()?;
                self.parse_postfix(primary)
            }
        }
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let token = self.current().clone();

        match &token.kind {
            TokenKind::IntLit(n) => {
                self.advance();
                Ok(Expr::Literal {
                    value: LitValue::Int(*n),
                    line: token.line,
                })
            }
            TokenKind::FloatLit(n) => {
                self.advance();
                Ok(Expr::Literal {
                    value: LitValue::Float(*n),
                    line: token.line,
                })
            }
            TokenKind::StringLit(s) => {
                self.advance();
                Ok(Expr::Literal {
                    value: LitValue::Str(s.clone()),
                    line: token.line,
                })
            }
            TokenKind::BoolLit(b) => {
                self.advance();
                Ok(Expr::Literal {
                    value: LitValue::Bool(*b),
                    line: token.line,
                })
            }

            TokenKind::Ident(name) => {
                // Single-parameter lambda: x -> expr
                if self.peek_kind() == Some(&TokenKind::Arrow) {
                    self.advance();
                    self.advance();
                    let body = self.parse_expr()?;
                    return Ok(Expr::Lambda {
                        params: vec![name.clone()],
                        body: Box::new(body),
                        line: token.line,
                    });
                }
                // Call of a named function: name(args)
                if self.peek_kind() == Some(&TokenKind::LParen) {
                    self.advance();
                    self.advance();
                    let args = self.parse_args()?;
                    return Ok(Expr::Call {
                        name: name.clone(),
                        args,
                        line: token.line,
                    });
                }
                self.advance();
                Ok(Expr::Ident {
                    name: name.clone(),
                    line: token.line,
                })
            }

            // Parenthesized expression, tuple, or lambda parameter list
            TokenKind::LParen => {
                self.advance();

                if self.consume(&TokenKind::RParen) {
                    if self.consume(&TokenKind::Arrow) {
                        let body = self.parse_expr()?;
                        return Ok(Expr::Lambda {
                            params: Vec::new(),
                            body: Box::new(body),
                            line: token.line,
                        });
                    }
                    return Ok(Expr::Tuple {
                        elements: Vec::new(),
                        line: token.line,
                    });
                }

                let mut elements = vec![self.parse_expr()?];
                while self.consume(&TokenKind::Comma) {
                    if self.check(&TokenKind::RParen) {
                        break;
                    }
                    elements.push(self.parse_expr()?);
                }
                self.expect(TokenKind::RParen, "')'")?;

                if self.consume(&TokenKind::Arrow) {
                    let params = self.lambda_params(elements, token.line)?;
                    let body = self.parse_expr()?;
                    return Ok(Expr::Lambda {
                        params,
                        body: Box::new(body),
                        line: token.line,
                    });
                }

                // One parenthesized element is just that expression
                if elements.len() == 1 {
                    Ok(elements.pop().unwrap_or(Expr::Tuple {
                        elements: Vec::new(),
                        line: token.line,
                    }))
                } else {
                    Ok(Expr::Tuple {
                        elements,
                        line: token.line,
                    })
                }
            }

            // Array or dictionary literal
            TokenKind::LBracket => {
                self.advance();

                if self.consume(&TokenKind::RBracket) {
                    return Ok(Expr::Array {
                        elements: Vec::new(),
                        line: token.line,
                    });
                }
                // Empty dictionary literal [:]
                if self.check(&TokenKind::Colon) {
                    self.advance();
                    self.expect(TokenKind::RBracket, "']' after dictionary literal")?;
                    return Ok(Expr::Dict {
                        pairs: Vec::new(),
                        line: token.line,
                    });
                }

                let first = self.parse_expr()?;
                if self.consume(&TokenKind::Colon) {
                    let value = self.parse_expr()?;
                    let mut pairs = vec![(first, value)];
                    while self.consume(&TokenKind::Comma) {
                        if self.check(&TokenKind::RBracket) {
                            break;
                        }
                        let k = self.parse_expr()?;
                        self.expect(TokenKind::Colon, "':' in dictionary literal")?;
                        let v = self.parse_expr()?;
                        pairs.push((k, v));
                    }
                    self.expect(TokenKind::RBracket, "']' after dictionary literal")?;
                    Ok(Expr::Dict {
                        pairs,
                        line: token.line,
                    })
                } else {
                    let mut elements = vec![first];
                    while self.consume(&TokenKind::Comma) {
                        if self.check(&TokenKind::RBracket) {
                            break;
                        }
                        elements.push(self.parse_expr()?);
                    }
                    self.expect(TokenKind::RBracket, "']' after array literal")?;
                    Ok(Expr::Array {
                        elements,
                        line: token.line,
                    })
                }
            }

            _ => Err(self.syntax_error("expression")),
        }
    }

    /// Postfix member access / method call: expr.member or expr.member(args)
    fn parse_postfix(&mut self, mut expr: Expr) -> PResult<Expr> {
        while self.consume(&TokenKind::Dot) {
            let (member, line) = self.expect_ident("member name")?;
            let args = if self.consume(&TokenKind::LParen) {
                Some(self.parse_args()?)
            } else {
                None
            };
            expr = Expr::Member {
                object: Box::new(expr),
                member,
                args,
                line,
            };
        }
        Ok(expr)
    }

    /// Comma-separated argument list; the opening paren is already consumed.
    fn parse_args(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_expr()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')' after arguments")?;
        Ok(args)
    }

    /// A parenthesized list followed by `->` must be all identifiers.
    fn lambda_params(&mut self, elements: Vec<Expr>, line: u32) -> PResult<Vec<String>> {
        let mut params = Vec::new();
        for element in elements {
            match element {
                Expr::Ident { name, .. } => params.push(name),
                _ => {
                    self.diagnostics.push(Diagnostic::syntactic(
                        line,
                        "lambda parameters must be identifiers",
                    ));
                    return Err(Recover);
                }
            }
        }
        Ok(params)
    }
}
