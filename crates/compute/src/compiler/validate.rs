//! Syntax checks run before any work is scheduled.

use super::error::CompileError;

/// What the previous significant character was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Number,
    Operator(char),
    Open,
    Close,
}

/// Pure predicate form of [`check`].
pub fn validate(expr: &str) -> bool {
    check(expr).is_ok()
}

/// Check an infix expression and describe the first problem found.
///
/// Whitespace is ignored. A `-` at the start, after `(`, or after another
/// operator is accepted as unary minus; every other operator needs a left
/// operand.
pub fn check(expr: &str) -> Result<(), CompileError> {
    let chars: Vec<(usize, char)> = expr
        .char_indices()
        .filter(|(_, c)| !c.is_whitespace())
        .collect();
    if chars.is_empty() {
        return Err(CompileError::Empty);
    }

    let mut depth = 0usize;
    let mut prev = Prev::Start;
    let mut i = 0;

    while i < chars.len() {
        let (pos, ch) = chars[i];
        match ch {
            '0'..='9' | '.' => {
                if prev == Prev::Close {
                    return Err(CompileError::MissingOperator { pos });
                }
                let mut literal = String::new();
                while let Some(&(_, c)) = chars.get(i) {
                    if !(c.is_ascii_digit() || c == '.') {
                        break;
                    }
                    literal.push(c);
                    i += 1;
                }
                let dots = literal.chars().filter(|&c| c == '.').count();
                if dots > 1 || !literal.chars().any(|c| c.is_ascii_digit()) {
                    return Err(CompileError::MalformedNumber { literal, pos });
                }
                prev = Prev::Number;
                continue;
            }
            '(' => {
                if matches!(prev, Prev::Number | Prev::Close) {
                    return Err(CompileError::MissingOperator { pos });
                }
                depth += 1;
                prev = Prev::Open;
            }
            ')' => {
                if matches!(prev, Prev::Start | Prev::Open | Prev::Operator(_)) {
                    return Err(CompileError::MisplacedClosingBracket { pos });
                }
                if depth == 0 {
                    return Err(CompileError::UnmatchedClosingBracket { pos });
                }
                depth -= 1;
                prev = Prev::Close;
            }
            '+' | '-' | '*' | '/' => {
                let unary_position = matches!(prev, Prev::Start | Prev::Open | Prev::Operator(_));
                if unary_position && ch != '-' {
                    return Err(CompileError::MisplacedOperator { op: ch, pos });
                }
                prev = Prev::Operator(ch);
            }
            other => return Err(CompileError::InvalidCharacter { ch: other, pos }),
        }
        i += 1;
    }

    match prev {
        Prev::Operator(op) => Err(CompileError::TrailingOperator(op)),
        Prev::Open => Err(CompileError::TrailingOperator('(')),
        _ if depth > 0 => Err(CompileError::UnclosedBracket(depth)),
        _ => Ok(()),
    }
}
