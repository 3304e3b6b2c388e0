//! Infix to postfix conversion (shunting-yard).

use super::error::CompileError;
use super::token::{tokenize, Operator, Token};

enum StackItem {
    Op(Operator),
    LParen,
}

/// Convert an infix expression into postfix order.
///
/// A `-` that opens the expression, or follows `(` or another operator, is
/// emitted as the unary pseudo-operator `u-` instead of being folded into the
/// next literal, so `-(3+4)` converts to `3 4 + u-`.
pub fn to_postfix(expr: &str) -> Result<Vec<Token>, CompileError> {
    let tokens = tokenize(expr)?;
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<StackItem> = Vec::new();
    let mut prev: Option<&Token> = None;

    for token in &tokens {
        match token {
            Token::Number(_) => output.push(token.clone()),
            Token::Op(op) => {
                let unary = *op == Operator::Sub
                    && matches!(prev, None | Some(Token::LParen) | Some(Token::Op(_)));
                if unary {
                    // Prefix operator: its operand has not been seen yet.
                    stack.push(StackItem::Op(Operator::Neg));
                } else {
                    while let Some(StackItem::Op(top)) = stack.last() {
                        if top.precedence() < op.precedence() {
                            break;
                        }
                        output.push(Token::Op(*top));
                        stack.pop();
                    }
                    stack.push(StackItem::Op(*op));
                }
            }
            Token::LParen => stack.push(StackItem::LParen),
            Token::RParen => loop {
                match stack.pop() {
                    Some(StackItem::Op(op)) => output.push(Token::Op(op)),
                    Some(StackItem::LParen) => break,
                    None => return Err(CompileError::MismatchedParenthesis),
                }
            },
        }
        prev = Some(token);
    }

    while let Some(item) = stack.pop() {
        match item {
            StackItem::Op(op) => output.push(Token::Op(op)),
            StackItem::LParen => return Err(CompileError::MismatchedParenthesis),
        }
    }

    Ok(output)
}

/// Render postfix tokens space-separated, for logs and tests.
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
