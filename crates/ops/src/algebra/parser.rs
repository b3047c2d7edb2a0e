//! Tokenizer and Pratt parser for raster algebra expressions

use terrakit_core::{Error, Result};

/// Parsed expression tree.
///
/// `Var(i)` is the zero-based input index; the surface syntax is
/// `raster1`, `raster2`, and so on.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Var(usize),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

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
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(BinaryOp),
    Tilde,
    Minus,
    LParen,
    RParen,
    Comma,
}

fn parse_error(msg: impl Into<String>) -> Error {
    Error::Expression(msg.into())
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut text = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        text.push(d);
                        chars.next();
                    } else if (d == 'e' || d == 'E')
                        && !text.is_empty()
                        && text.chars().all(|t| t.is_ascii_digit() || t == '.')
                    {
                        text.push(d);
                        chars.next();
                        if let Some(&s) = chars.peek() {
                            if s == '+' || s == '-' {
                                text.push(s);
                                chars.next();
                            }
                        }
                    } else {
                        break;
                    }
                }
                let value: f64 = text
                    .parse()
                    .map_err(|_| parse_error(format!("invalid number '{}'", text)))?;
                tokens.push(Token::Number(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Op(BinaryOp::Add));
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Op(BinaryOp::Pow));
                } else {
                    tokens.push(Token::Op(BinaryOp::Mul));
                }
            }
            '/' => {
                chars.next();
                tokens.push(Token::Op(BinaryOp::Div));
            }
            '%' => {
                chars.next();
                tokens.push(Token::Op(BinaryOp::Rem));
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(BinaryOp::Le));
                } else {
                    tokens.push(Token::Op(BinaryOp::Lt));
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(BinaryOp::Ge));
                } else {
                    tokens.push(Token::Op(BinaryOp::Gt));
                }
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(BinaryOp::Eq));
                } else {
                    return Err(parse_error("single '=' is not an operator, use '=='"));
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op(BinaryOp::Ne));
                } else {
                    return Err(parse_error("unexpected '!', use '~' for negation"));
                }
            }
            '&' => {
                chars.next();
                tokens.push(Token::Op(BinaryOp::And));
            }
            '|' => {
                chars.next();
                tokens.push(Token::Op(BinaryOp::Or));
            }
            '^' => {
                chars.next();
                tokens.push(Token::Op(BinaryOp::Xor));
            }
            '~' => {
                chars.next();
                tokens.push(Token::Tilde);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            other => return Err(parse_error(format!("unexpected character '{}'", other))),
        }
    }

    Ok(tokens)
}

/// Left and right binding powers for infix operators.
///
/// `**` binds tighter on the left than the right, making it
/// right-associative.
fn binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Or => (1, 2),
        BinaryOp::Xor => (3, 4),
        BinaryOp::And => (5, 6),
        BinaryOp::Eq | BinaryOp::Ne => (7, 8),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => (9, 10),
        BinaryOp::Add | BinaryOp::Sub => (11, 12),
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => (13, 14),
        BinaryOp::Pow => (18, 17),
    }
}

const UNARY_BP: u8 = 15;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, token: Token, context: &str) -> Result<()> {
        match self.next() {
            Some(t) if t == token => Ok(()),
            other => Err(parse_error(format!(
                "expected {:?} {} but found {:?}",
                token, context, other
            ))),
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let op = match self.peek() {
                Some(Token::Op(op)) => *op,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            let (left_bp, right_bp) = binding_power(op);
            if left_bp < min_bp {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_expr(right_bp)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Minus) => {
                let operand = self.parse_expr(UNARY_BP)?;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)))
            }
            Some(Token::Tilde) => {
                let operand = self.parse_expr(UNARY_BP)?;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)))
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr(0)?;
                self.expect(Token::RParen, "to close parenthesis")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => self.parse_ident(&name),
            other => Err(parse_error(format!("unexpected token {:?}", other))),
        }
    }

    fn parse_ident(&mut self, name: &str) -> Result<Expr> {
        let func = match name {
            "min" => Some(Func::Min),
            "max" => Some(Func::Max),
            _ => None,
        };
        if let Some(func) = func {
            self.expect(Token::LParen, "after function name")?;
            let mut args = vec![self.parse_expr(0)?];
            while self.peek() == Some(&Token::Comma) {
                self.pos += 1;
                args.push(self.parse_expr(0)?);
            }
            self.expect(Token::RParen, "to close argument list")?;
            if args.len() < 2 {
                return Err(parse_error(format!(
                    "{}() takes at least two arguments",
                    name
                )));
            }
            return Ok(Expr::Call(func, args));
        }

        if let Some(digits) = name.strip_prefix("raster") {
            if let Ok(index) = digits.parse::<usize>() {
                if index >= 1 {
                    return Ok(Expr::Var(index - 1));
                }
            }
        }

        Err(parse_error(format!("unknown identifier '{}'", name)))
    }
}

/// Parse an expression string into an AST.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(parse_error("empty expression"));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr(0)?;
    if parser.pos != parser.tokens.len() {
        return Err(parse_error(format!(
            "trailing input at token {:?}",
            parser.tokens[parser.pos]
        )));
    }
    Ok(expr)
}

/// Largest variable index referenced by an expression, if any.
pub fn max_var(expr: &Expr) -> Option<usize> {
    match expr {
        Expr::Number(_) => None,
        Expr::Var(i) => Some(*i),
        Expr::Unary(_, operand) => max_var(operand),
        Expr::Binary(_, lhs, rhs) => max_var(lhs).max(max_var(rhs)),
        Expr::Call(_, args) => args.iter().filter_map(max_var).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let e = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            e,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Number(1.0)),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(Expr::Number(2.0)),
                    Box::new(Expr::Number(3.0)),
                )),
            )
        );
    }

    #[test]
    fn test_power_right_associative() {
        let e = parse("2 ** 3 ** 2").unwrap();
        assert_eq!(
            e,
            Expr::Binary(
                BinaryOp::Pow,
                Box::new(Expr::Number(2.0)),
                Box::new(Expr::Binary(
                    BinaryOp::Pow,
                    Box::new(Expr::Number(3.0)),
                    Box::new(Expr::Number(2.0)),
                )),
            )
        );
    }

    #[test]
    fn test_variables_one_indexed() {
        assert_eq!(parse("raster1").unwrap(), Expr::Var(0));
        assert_eq!(parse("raster12").unwrap(), Expr::Var(11));
        assert!(parse("raster0").is_err());
        assert!(parse("rasterx").is_err());
    }

    #[test]
    fn test_comparison_binds_looser_than_arithmetic() {
        let e = parse("raster1 + 1 > 2").unwrap();
        match e {
            Expr::Binary(BinaryOp::Gt, _, _) => {}
            other => panic!("expected comparison at root, got {:?}", other),
        }
    }

    #[test]
    fn test_min_max_calls() {
        let e = parse("min(raster1, raster2, 3)").unwrap();
        match e {
            Expr::Call(Func::Min, args) => assert_eq!(args.len(), 3),
            other => panic!("expected call, got {:?}", other),
        }
        assert!(parse("min(raster1)").is_err());
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            parse("-3").unwrap(),
            Expr::Unary(UnaryOp::Neg, Box::new(Expr::Number(3.0)))
        );
        assert!(matches!(parse("~(raster1 > 1)").unwrap(), Expr::Unary(UnaryOp::Not, _)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("1 +").is_err());
        assert!(parse("(1 + 2").is_err());
        assert!(parse("1 = 2").is_err());
        assert!(parse("banana").is_err());
        assert!(parse("1 2").is_err());
    }

    #[test]
    fn test_max_var() {
        assert_eq!(max_var(&parse("raster1 + raster3").unwrap()), Some(2));
        assert_eq!(max_var(&parse("1 + 2").unwrap()), None);
    }
}
