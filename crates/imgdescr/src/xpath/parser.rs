//! Recursive-descent XPath parser

use crate::error::{Error, ErrorKind, Result, Span};
use crate::xpath::ast::{Axis, CmpOp, Expr, Function, LocationPath, NodeTest, Step};
use crate::xpath::lexer::{tokenize, Token};

/// XPath parser configuration
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Maximum expression nesting depth (0 means unlimited)
    pub max_depth: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: 128 }
    }
}

impl Config {
    pub const fn new(max_depth: u16) -> Self {
        Self { max_depth }
    }
}

/// XPath parser over a token list
#[derive(Debug)]
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    config: Config,
    depth: u16,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self> {
        Self::with_config(source, Config::default())
    }

    pub fn with_config(source: &'a str, config: Config) -> Result<Self> {
        let tokens = tokenize(source).map_err(|offset| {
            invalid(source, format!("unexpected character at offset {offset}"))
        })?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
            config,
            depth: 0,
        })
    }

    /// Parse the whole input as one expression
    pub fn parse(&mut self) -> Result<Expr> {
        if self.tokens.is_empty() {
            return Err(self.error("empty expression"));
        }
        let expr = self.parse_or()?;
        if let Some(token) = self.peek() {
            return Err(self.error(&format!("unexpected token {token:?}")));
        }
        Ok(expr)
    }

    /// One level deeper into the expression tree
    fn descend(&mut self) -> Result<()> {
        self.depth = self.depth.saturating_add(1);
        if self.config.max_depth > 0 && self.depth > self.config.max_depth {
            return Err(Error::with_message(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                Span::empty(),
                format!("expression nested too deeply in \"{}\"", self.source),
            ));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let depth = self.depth;
        self.descend()?;
        let mut lhs = self.parse_and()?;
        while self.eat_keyword("or") {
            self.descend()?;
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let depth = self.depth;
        let mut lhs = self.parse_equality()?;
        while self.eat_keyword("and") {
            self.descend()?;
            let rhs = self.parse_equality()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let depth = self.depth;
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CmpOp::Eq,
                Some(Token::NotEq) => CmpOp::NotEq,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            let rhs = self.parse_relational()?;
            lhs = Expr::Compare(Box::new(lhs), op, Box::new(rhs));
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        let depth = self.depth;
        let mut lhs = self.parse_union()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CmpOp::Lt,
                Some(Token::LtEq) => CmpOp::LtEq,
                Some(Token::Gt) => CmpOp::Gt,
                Some(Token::GtEq) => CmpOp::GtEq,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            let rhs = self.parse_union()?;
            lhs = Expr::Compare(Box::new(lhs), op, Box::new(rhs));
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_union(&mut self) -> Result<Expr> {
        let depth = self.depth;
        let mut lhs = self.parse_path_expr()?;
        while self.eat(&Token::Pipe) {
            self.descend()?;
            let rhs = self.parse_path_expr()?;
            lhs = Expr::Union(Box::new(lhs), Box::new(rhs));
        }
        self.depth = depth;
        Ok(lhs)
    }

    /// A location path, or a primary expression with optional predicates
    /// and a trailing relative path as in `(//user)[1]/@name`
    fn parse_path_expr(&mut self) -> Result<Expr> {
        if !self.starts_primary() {
            return self.parse_location_path().map(Expr::Path);
        }

        let mut expr = self.parse_primary()?;
        let predicates = self.parse_predicates()?;
        if !predicates.is_empty() {
            expr = Expr::Filter(Box::new(expr), predicates);
        }

        let mut steps = Vec::new();
        if self.parse_relative_steps(&mut steps)? {
            expr = Expr::PathFrom(Box::new(expr), steps);
        }
        Ok(expr)
    }

    fn starts_primary(&self) -> bool {
        match self.peek() {
            Some(Token::Literal(_) | Token::Number(_) | Token::LeftParen) => true,
            Some(Token::Name(name)) => {
                self.peek_at(1) == Some(&Token::LeftParen) && !is_node_type(name)
            }
            _ => false,
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek().cloned() {
            Some(Token::Literal(value)) => {
                self.pos += 1;
                Ok(Expr::Literal(value))
            }
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(Expr::Number(value))
            }
            Some(Token::LeftParen) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                self.expect(&Token::RightParen)?;
                Ok(inner)
            }
            Some(Token::Name(name)) => self.parse_function(&name),
            Some(token) => Err(self.error(&format!("unexpected token {token:?}"))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn parse_function(&mut self, name: &str) -> Result<Expr> {
        let function = Function::from_name(name)
            .ok_or_else(|| self.error(&format!("unsupported function {name}()")))?;
        self.pos += 2;

        let mut args = Vec::new();
        if !self.eat(&Token::RightParen) {
            loop {
                args.push(self.parse_or()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RightParen)?;
                break;
            }
        }

        let (min, max) = function.arity();
        if args.len() < min || args.len() > max {
            return Err(self.error(&format!("wrong number of arguments for {name}()")));
        }
        Ok(Expr::Function(function, args))
    }

    fn parse_location_path(&mut self) -> Result<LocationPath> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                if !self.starts_step() {
                    return Ok(LocationPath {
                        absolute: true,
                        steps,
                    });
                }
                true
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::AnyNode));
                true
            }
            _ => false,
        };

        steps.push(self.parse_step()?);
        self.parse_relative_steps(&mut steps)?;
        Ok(LocationPath { absolute, steps })
    }

    /// Steps introduced by `/` or `//`; `false` when there were none
    fn parse_relative_steps(&mut self, steps: &mut Vec<Step>) -> Result<bool> {
        let before = steps.len();
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.parse_step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::AnyNode));
                steps.push(self.parse_step()?);
            } else {
                return Ok(steps.len() > before);
            }
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_) | Token::Star | Token::At | Token::Dot | Token::DotDot)
        )
    }

    fn parse_step(&mut self) -> Result<Step> {
        if self.eat(&Token::Dot) {
            return Ok(Step::new(Axis::SelfAxis, NodeTest::AnyNode));
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step::new(Axis::Parent, NodeTest::AnyNode));
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::ColonColon)) =
            (self.peek(), self.peek_at(1))
        {
            let axis = Axis::from_name(name)
                .ok_or_else(|| self.error(&format!("unsupported axis {name}")))?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };

        let test = match self.peek().cloned() {
            Some(Token::Star) => {
                self.pos += 1;
                NodeTest::Wildcard
            }
            Some(Token::Name(name)) if self.peek_at(1) == Some(&Token::LeftParen) => {
                let test = match name.as_str() {
                    "text" => NodeTest::Text,
                    "node" => NodeTest::AnyNode,
                    _ => return Err(self.error(&format!("unsupported node test {name}()"))),
                };
                self.pos += 2;
                self.expect(&Token::RightParen)?;
                test
            }
            Some(Token::Name(name)) => {
                self.pos += 1;
                NodeTest::Name(name)
            }
            _ => return Err(self.error("expected node test")),
        };

        let mut step = Step::new(axis, test);
        step.predicates = self.parse_predicates()?;
        Ok(step)
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LeftBracket) {
            predicates.push(self.parse_or()?);
            self.expect(&Token::RightBracket)?;
        }
        Ok(predicates)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(Token::Name(name)) if name == keyword => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {token:?}")))
        }
    }

    fn error(&self, message: &str) -> Error {
        invalid(self.source, format!("{message} in \"{}\"", self.source))
    }
}

fn is_node_type(name: &str) -> bool {
    matches!(name, "text" | "node")
}

fn invalid(source: &str, message: String) -> Error {
    Error::with_message(
        ErrorKind::InvalidXPath {
            expr: source.to_string(),
        },
        Span::empty(),
        message,
    )
}

/// Compile an expression
pub fn parse(source: &str) -> Result<Expr> {
    Parser::new(source)?.parse()
}
