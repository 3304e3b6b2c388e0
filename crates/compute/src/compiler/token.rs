use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::error::CompileError;

/// Numbers (with optional fraction), the four operators and parentheses.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\.?\d*|\.\d+|[-+*/()]").expect("token pattern is valid")
});

/// Arithmetic operators, including the unary minus pseudo-operator `u-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Neg,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Neg => "u-",
        }
    }

    /// Binding strength used by the postfix converter.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div => 2,
            Operator::Neg => 3,
        }
    }

    pub fn is_unary(self) -> bool {
        self == Operator::Neg
    }

    fn binary(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator '{}'", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Sub),
            "*" => Ok(Operator::Mul),
            "/" => Ok(Operator::Div),
            "u-" => Ok(Operator::Neg),
            other => Err(UnknownOperator(other.to_string())),
        }
    }
}

/// A lexical token of an infix expression, or of its postfix form.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal text; parsed when the tree is built.
    Number(String),
    Op(Operator),
    LParen,
    RParen,
}

impl Token {
    pub fn is_operator(&self) -> bool {
        matches!(self, Token::Op(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => f.write_str(n),
            Token::Op(op) => write!(f, "{op}"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

/// Split an expression into tokens, left to right.
///
/// Every `-` comes out as [`Operator::Sub`]; the converter decides which ones
/// are unary. Anything other than whitespace between matches is rejected.
pub fn tokenize(expr: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for m in TOKEN_RE.find_iter(expr) {
        reject_gap(expr, cursor, m.start())?;
        cursor = m.end();

        let text = m.as_str();
        let token = match text {
            "(" => Token::LParen,
            ")" => Token::RParen,
            _ => match text.chars().next().and_then(Operator::binary) {
                Some(op) if text.len() == 1 => Token::Op(op),
                _ => Token::Number(text.to_string()),
            },
        };
        tokens.push(token);
    }
    reject_gap(expr, cursor, expr.len())?;

    Ok(tokens)
}

fn reject_gap(expr: &str, from: usize, to: usize) -> Result<(), CompileError> {
    match expr[from..to].char_indices().find(|(_, c)| !c.is_whitespace()) {
        Some((offset, ch)) => Err(CompileError::InvalidCharacter { ch, pos: from + offset }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_decimals_and_symbols() {
        let tokens = tokenize("12.5*(3-.5)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number("12.5".into()),
                Token::Op(Operator::Mul),
                Token::LParen,
                Token::Number("3".into()),
                Token::Op(Operator::Sub),
                Token::Number(".5".into()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn whitespace_between_tokens_is_skipped() {
        let tokens = tokenize(" 1 +  2 ").unwrap();
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn stray_character_is_reported_with_position() {
        let err = tokenize("1+x").unwrap_err();
        assert_eq!(err, CompileError::InvalidCharacter { ch: 'x', pos: 2 });
    }

    #[test]
    fn operator_symbols_round_trip() {
        for op in [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div, Operator::Neg] {
            assert_eq!(op.symbol().parse::<Operator>().unwrap(), op);
        }
        assert!("%".parse::<Operator>().is_err());
    }

    #[test]
    fn unary_minus_binds_tightest() {
        assert!(Operator::Neg.precedence() > Operator::Mul.precedence());
        assert!(Operator::Mul.precedence() > Operator::Add.precedence());
        assert_eq!(Operator::Add.precedence(), Operator::Sub.precedence());
    }
}
