//! Recursive-descent parser from tokens to the [`super::ast::Line`] tagged
//! union (spec.md §4.9's grammar). Shared by the evaluator and
//! [`super::validate`], which walks the same AST without evaluating it.

use crate::error::SheetError;

use super::ast::{BinaryOp, Expr, Line, PostingsLiteral, Spanned, UnaryOp};
use super::lexer::{tokenize, Token};

pub fn parse_line(text: &str) -> Result<Line, SheetError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Line::Header(String::new()));
    }

    let tokens = match tokenize(trimmed) {
        Ok(tokens) => tokens,
        Err(_) => return Ok(Line::Header(trimmed.to_string())),
    };
    if tokens.is_empty() {
        return Ok(Line::Header(trimmed.to_string()));
    }

    if let Some(line) = try_parse_function_definition(&tokens)? {
        return Ok(line);
    }
    if let Some(line) = try_parse_assignment(&tokens)? {
        return Ok(line);
    }

    let mut parser = Parser { tokens: &tokens, pos: 0 };
    match parser.expression() {
        Ok(expr) if parser.pos == tokens.len() => Ok(Line::Expression(expr)),
        _ => Ok(Line::Header(trimmed.to_string())),
    }
}

fn try_parse_assignment(tokens: &[Spanned<Token>]) -> Result<Option<Line>, SheetError> {
    if tokens.len() < 3 {
        return Ok(None);
    }
    let Token::Ident(id) = &tokens[0].value else { return Ok(None) };
    if tokens[1].value != Token::Equals {
        return Ok(None);
    }
    let mut parser = Parser { tokens, pos: 2 };
    let expr = parser.expression()?;
    if parser.pos != tokens.len() {
        return Ok(None);
    }
    Ok(Some(Line::Assignment { id: id.clone(), expr }))
}

fn try_parse_function_definition(tokens: &[Spanned<Token>]) -> Result<Option<Line>, SheetError> {
    if tokens.len() < 5 {
        return Ok(None);
    }
    let Token::Ident(id) = &tokens[0].value else { return Ok(None) };
    if tokens[1].value != Token::LParen {
        return Ok(None);
    }

    let mut pos = 2;
    let mut params = Vec::new();
    while pos < tokens.len() && tokens[pos].value != Token::RParen {
        match &tokens[pos].value {
            Token::Ident(p) => params.push(p.clone()),
            _ => return Ok(None),
        }
        pos += 1;
        if pos < tokens.len() && tokens[pos].value == Token::Comma {
            pos += 1;
        }
    }
    if pos >= tokens.len() || tokens[pos].value != Token::RParen {
        return Ok(None);
    }
    pos += 1;
    if pos >= tokens.len() || tokens[pos].value != Token::Equals {
        return Ok(None);
    }
    pos += 1;

    let mut parser = Parser { tokens, pos };
    let body = parser.expression()?;
    if parser.pos != tokens.len() {
        return Ok(None);
    }
    Ok(Some(Line::FunctionDefinition { id: id.clone(), params, body }))
}

struct Parser<'a> {
    tokens: &'a [Spanned<Token>],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.value)
    }

    fn span_here(&self) -> (u32, u32) {
        self.tokens
            .get(self.pos)
            .map(|t| (t.start, t.end))
            .unwrap_or((0, 0))
    }

    fn advance(&mut self) -> Option<&Spanned<Token>> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    fn expression(&mut self) -> Result<Spanned<Expr>, SheetError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Spanned<Expr>, SheetError> {
        let mut lhs = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let rhs = self.and_expr()?;
            let (start, end) = (lhs.start, rhs.end);
            lhs = Spanned::new(
                Expr::Binary { op: BinaryOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                start,
                end,
            );
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Spanned<Expr>, SheetError> {
        let mut lhs = self.additive()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let rhs = self.additive()?;
            let (start, end) = (lhs.start, rhs.end);
            lhs = Spanned::new(
                Expr::Binary { op: BinaryOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                start,
                end,
            );
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Spanned<Expr>, SheetError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.multiplicative()?;
            let (start, end) = (lhs.start, rhs.end);
            lhs = Spanned::new(Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, start, end);
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Spanned<Expr>, SheetError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.unary()?;
            let (start, end) = (lhs.start, rhs.end);
            lhs = Spanned::new(Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, start, end);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Spanned<Expr>, SheetError> {
        let op = match self.peek() {
            Some(Token::Plus) => Some(UnaryOp::Plus),
            Some(Token::Minus) => Some(UnaryOp::Minus),
            _ => None,
        };
        if let Some(op) = op {
            let (start, _) = self.span_here();
            self.advance();
            let expr = self.unary()?;
            let end = expr.end;
            return Ok(Spanned::new(Expr::Unary { op, expr: Box::new(expr) }, start, end));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Spanned<Expr>, SheetError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.advance();
            let exponent = self.unary()?;
            let (start, end) = (base.start, exponent.end);
            return Ok(Spanned::new(
                Expr::Binary { op: BinaryOp::Pow, lhs: Box::new(base), rhs: Box::new(exponent) },
                start,
                end,
            ));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Spanned<Expr>, SheetError> {
        let (start, end) = self.span_here();
        match self.advance().map(|t| t.value.clone()) {
            Some(Token::Number(n)) => Ok(Spanned::new(Expr::Number(n), start, end)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if self.peek() == Some(&Token::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    let (_, call_end) = self.span_here();
                    self.expect(Token::RParen)?;
                    Ok(Spanned::new(Expr::Call { callee: name, args }, start, call_end + 1))
                } else {
                    Ok(Spanned::new(Expr::Identifier(name), start, end))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expression()?;
                let (_, close_end) = self.span_here();
                self.expect(Token::RParen)?;
                Ok(Spanned::new(Expr::Grouping(Box::new(inner)), start, close_end + 1))
            }
            Some(Token::Postings) => {
                self.expect(Token::LBrace)?;
                let pattern = match self.advance().map(|t| t.value.clone()) {
                    Some(Token::Str(s)) => s,
                    _ => {
                        return Err(SheetError::Parse {
                            line: 0,
                            column: start,
                            message: "expected a quoted account pattern inside postings { }".into(),
                        })
                    }
                };
                let (_, close_end) = self.span_here();
                self.expect(Token::RBrace)?;
                Ok(Spanned::new(
                    Expr::Postings(PostingsLiteral { pattern }),
                    start,
                    close_end + 1,
                ))
            }
            other => Err(SheetError::Parse {
                line: 0,
                column: start,
                message: format!("unexpected token {other:?}"),
            }),
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), SheetError> {
        let (start, _) = self.span_here();
        match self.advance() {
            Some(t) if t.value == token => Ok(()),
            _ => Err(SheetError::Parse {
                line: 0,
                column: start,
                message: format!("expected {token:?}"),
            }),
        }
    }
}
