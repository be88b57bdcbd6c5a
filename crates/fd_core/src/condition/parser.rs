//! Expression AST and recursive descent parser.

use super::lexer::Token;
use super::ConditionError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// 컴파일된 조건식
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Ident(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Index(Box<Expr>, Box<Expr>),
    Field(Box<Expr>, String),
    Call(String, Vec<Expr>),
    Method(Box<Expr>, String, Vec<Expr>),
}

impl Expr {
    /// 식 어딘가에 해당 식별자가 등장하는지 검사
    pub fn references(&self, ident: &str) -> bool {
        match self {
            Expr::Int(_) | Expr::Float(_) | Expr::Str(_) | Expr::Bool(_) => false,
            Expr::Ident(name) => name == ident,
            Expr::Unary(_, inner) => inner.references(ident),
            Expr::Binary(_, lhs, rhs) => lhs.references(ident) || rhs.references(ident),
            Expr::Index(recv, idx) => recv.references(ident) || idx.references(ident),
            Expr::Field(recv, _) => recv.references(ident),
            Expr::Call(_, args) => args.iter().any(|a| a.references(ident)),
            Expr::Method(recv, _, args) => {
                recv.references(ident) || args.iter().any(|a| a.references(ident))
            }
        }
    }
}

pub fn parse(tokens: &[Token]) -> Result<Expr, ConditionError> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(ConditionError::Syntax(format!(
            "unexpected trailing input at token {}",
            parser.pos
        )));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, context: &str) -> Result<(), ConditionError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(ConditionError::Syntax(format!("expected {expected:?} {context}")))
        }
    }

    fn or_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.and_expr()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.and_expr()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.cmp_expr()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.cmp_expr()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn cmp_expr(&mut self) -> Result<Expr, ConditionError> {
        let lhs = self.add_expr()?;
        let op = match self.peek() {
            Some(Token::Eq) => Some(BinOp::Eq),
            Some(Token::Ne) => Some(BinOp::Ne),
            Some(Token::Ge) => Some(BinOp::Ge),
            Some(Token::Le) => Some(BinOp::Le),
            Some(Token::Gt) => Some(BinOp::Gt),
            Some(Token::Lt) => Some(BinOp::Lt),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                let rhs = self.add_expr()?;
                Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
            }
            None => Ok(lhs),
        }
    }

    fn add_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.mul_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.mul_expr()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn mul_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.unary_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary_expr()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> Result<Expr, ConditionError> {
        if self.eat(&Token::Bang) {
            let inner = self.unary_expr()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(inner)));
        }
        if self.eat(&Token::Minus) {
            let inner = self.unary_expr()?;
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(inner)));
        }
        self.postfix_expr()
    }

    fn postfix_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut expr = self.primary_expr()?;
        loop {
            if self.eat(&Token::LBracket) {
                let index = self.or_expr()?;
                self.expect(Token::RBracket, "to close index")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.eat(&Token::Dot) {
                let name = match self.next_token() {
                    Some(Token::Ident(name)) => name,
                    other => {
                        return Err(ConditionError::Syntax(format!(
                            "expected member name after '.', got {other:?}"
                        )))
                    }
                };
                if self.eat(&Token::LParen) {
                    let args = self.args()?;
                    self.expect(Token::RParen, "to close method call")?;
                    expr = Expr::Method(Box::new(expr), name, args);
                } else {
                    expr = Expr::Field(Box::new(expr), name);
                }
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary_expr(&mut self) -> Result<Expr, ConditionError> {
        match self.next_token() {
            Some(Token::Int(value)) => Ok(Expr::Int(value)),
            Some(Token::Float(value)) => Ok(Expr::Float(value)),
            Some(Token::Str(value)) => Ok(Expr::Str(value)),
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::Ident(name)) => {
                if self.eat(&Token::LParen) {
                    let args = self.args()?;
                    self.expect(Token::RParen, "to close function call")?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Some(Token::LParen) => {
                let expr = self.or_expr()?;
                self.expect(Token::RParen, "to close group")?;
                Ok(expr)
            }
            other => Err(ConditionError::Syntax(format!("unexpected token {other:?}"))),
        }
    }

    fn args(&mut self) -> Result<Vec<Expr>, ConditionError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.or_expr()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(args)
    }
}
