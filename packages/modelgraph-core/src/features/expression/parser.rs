//! Pratt parser for the default expression grammar

use super::lexer::{tokenize, Spanned, Token};
use crate::shared::models::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    fn binding_power(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::NotEq => 3,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    fn from_token(token: &Token) -> Option<Self> {
        Some(match token {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Rem,
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::LtEq => BinaryOp::LtEq,
            Token::Gt => BinaryOp::Gt,
            Token::GtEq => BinaryOp::GtEq,
            Token::AndAnd => BinaryOp::And,
            Token::OrOr => BinaryOp::Or,
            _ => return None,
        })
    }
}

const UNARY_POWER: u8 = 7;

/// Untyped syntax tree
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Literal(Value),
    /// Dotted name, split into segments
    Name(Vec<String>),
    Unary(UnaryOp, Box<Ast>),
    Binary(BinaryOp, Box<Ast>, Box<Ast>),
    Call(String, Vec<Ast>),
    List(Vec<Ast>),
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

type ParseResult<T> = Result<T, (String, usize)>;

pub(crate) fn parse(text: &str) -> ParseResult<Ast> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: text.chars().count(),
    };
    if parser.tokens.is_empty() {
        return Err(("Empty expression".to_string(), 0));
    }
    let ast = parser.expression(0)?;
    if let Some((token, offset)) = parser.tokens.get(parser.pos) {
        return Err((format!("Unexpected {:?}", token), *offset));
    }
    Ok(ast)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, o)| *o)
    }

    fn next(&mut self) -> ParseResult<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .map(|(t, _)| t.clone())
            .ok_or_else(|| ("Unexpected end of expression".to_string(), self.end))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let offset = self.offset();
        let token = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err((format!("Expected {:?}, found {:?}", expected, token), offset))
        }
    }

    fn expression(&mut self, min_power: u8) -> ParseResult<Ast> {
        let mut left = self.prefix()?;
        while let Some(op) = self.peek().and_then(BinaryOp::from_token) {
            let power = op.binding_power();
            if power <= min_power {
                break;
            }
            self.pos += 1;
            let right = self.expression(power)?;
            left = Ast::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn prefix(&mut self) -> ParseResult<Ast> {
        let offset = self.offset();
        match self.next()? {
            Token::Int(i) => Ok(Ast::Literal(Value::Int(i))),
            Token::Float(f) => Ok(Ast::Literal(Value::Float(f))),
            Token::Str(s) => Ok(Ast::Literal(Value::Str(s))),
            Token::True => Ok(Ast::Literal(Value::Bool(true))),
            Token::False => Ok(Ast::Literal(Value::Bool(false))),
            Token::Null => Ok(Ast::Literal(Value::Null)),
            Token::Minus => Ok(Ast::Unary(UnaryOp::Neg, Box::new(self.expression(UNARY_POWER)?))),
            Token::Bang => Ok(Ast::Unary(UnaryOp::Not, Box::new(self.expression(UNARY_POWER)?))),
            Token::LParen => {
                let inner = self.expression(0)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => Ok(Ast::List(self.arguments(Token::RBracket)?)),
            Token::Ident(first) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    return Ok(Ast::Call(first, self.arguments(Token::RParen)?));
                }
                let mut segments = vec![first];
                while self.peek() == Some(&Token::Dot) {
                    self.pos += 1;
                    let offset = self.offset();
                    match self.next()? {
                        Token::Ident(segment) => segments.push(segment),
                        other => return Err((format!("Expected a name after '.', found {:?}", other), offset)),
                    }
                }
                Ok(Ast::Name(segments))
            }
            other => Err((format!("Unexpected {:?}", other), offset)),
        }
    }

    fn arguments(&mut self, close: Token) -> ParseResult<Vec<Ast>> {
        let mut args = Vec::new();
        if self.peek() == Some(&close) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expression(0)?);
            let offset = self.offset();
            match self.next()? {
                Token::Comma => continue,
                token if token == close => return Ok(args),
                other => return Err((format!("Expected ',' or {:?}, found {:?}", close, other), offset)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(path: &str) -> Ast {
        Ast::Name(path.split('.').map(String::from).collect())
    }

    #[test]
    fn test_precedence() {
        let ast = parse("a + b * 2 == 7 || !done").unwrap();
        let expected = Ast::Binary(
            BinaryOp::Or,
            Box::new(Ast::Binary(
                BinaryOp::Eq,
                Box::new(Ast::Binary(
                    BinaryOp::Add,
                    Box::new(name("a")),
                    Box::new(Ast::Binary(
                        BinaryOp::Mul,
                        Box::new(name("b")),
                        Box::new(Ast::Literal(Value::Int(2))),
                    )),
                )),
                Box::new(Ast::Literal(Value::Int(7))),
            )),
            Box::new(Ast::Unary(UnaryOp::Not, Box::new(name("done")))),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_left_associative() {
        let ast = parse("10 - 4 - 3").unwrap();
        let expected = Ast::Binary(
            BinaryOp::Sub,
            Box::new(Ast::Binary(
                BinaryOp::Sub,
                Box::new(Ast::Literal(Value::Int(10))),
                Box::new(Ast::Literal(Value::Int(4))),
            )),
            Box::new(Ast::Literal(Value::Int(3))),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_calls_lists_and_dotted_names() {
        assert_eq!(
            parse("compare(left.name, right.name)").unwrap(),
            Ast::Call("compare".into(), vec![name("left.name"), name("right.name")])
        );
        assert_eq!(
            parse("[1, -x]").unwrap(),
            Ast::List(vec![
                Ast::Literal(Value::Int(1)),
                Ast::Unary(UnaryOp::Neg, Box::new(name("x"))),
            ])
        );
        assert_eq!(parse("len([])").unwrap(), Ast::Call("len".into(), vec![Ast::List(vec![])]));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse("").unwrap_err().1, 0);
        assert_eq!(parse("(1 + 2").unwrap_err().1, 6);
        assert_eq!(parse("1 2").unwrap_err().1, 2);
        assert!(parse("a.").is_err());
    }
}
