//! Reference evaluator and a deterministic expression generator for tests.

/// Evaluate an infix expression by recursive descent, independently of the
/// compiler. Division by zero yields zero, matching the worker policy.
pub fn reference_eval(expr: &str) -> f64 {
    let chars: Vec<char> = expr.chars().filter(|c| !c.is_whitespace()).collect();
    let mut parser = Descent { chars, pos: 0 };
    let value = parser.expr();
    assert_eq!(parser.pos, parser.chars.len(), "trailing input in {expr:?}");
    value
}

struct Descent {
    chars: Vec<char>,
    pos: usize,
}

impl Descent {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expr(&mut self) -> f64 {
        let mut acc = self.term();
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term();
            acc = if op == '+' { acc + rhs } else { acc - rhs };
        }
        acc
    }

    fn term(&mut self) -> f64 {
        let mut acc = self.unary();
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.pos += 1;
            let rhs = self.unary();
            acc = match op {
                '*' => acc * rhs,
                _ if rhs == 0.0 => 0.0,
                _ => acc / rhs,
            };
        }
        acc
    }

    fn unary(&mut self) -> f64 {
        if self.peek() == Some('-') {
            self.pos += 1;
            return -self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> f64 {
        if self.peek() == Some('(') {
            self.pos += 1;
            let v = self.expr();
            assert_eq!(self.peek(), Some(')'));
            self.pos += 1;
            return v;
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal.parse().expect("generator emits valid literals")
    }
}

/// Small linear congruential generator so expression fuzzing is reproducible.
pub struct ExprGen {
    state: u64,
}

impl ExprGen {
    pub fn new(seed: u64) -> Self {
        Self { state: seed.wrapping_mul(6364136223846793005).wrapping_add(1) }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }

    /// A syntactically valid expression of bounded nesting depth.
    pub fn expression(&mut self, depth: u32) -> String {
        let terms = 1 + self.below(3);
        let mut out = self.operand(depth);
        for _ in 1..terms {
            let op = ['+', '-', '*', '/'][self.below(4) as usize];
            out.push(op);
            out.push_str(&self.operand(depth));
        }
        out
    }

    fn operand(&mut self, depth: u32) -> String {
        match self.below(6) {
            0 if depth > 0 => format!("({})", self.expression(depth - 1)),
            1 if depth > 0 => format!("-({})", self.expression(depth - 1)),
            2 => format!("-{}", self.number()),
            _ => self.number(),
        }
    }

    fn number(&mut self) -> String {
        if self.below(4) == 0 {
            format!("{}.{}", self.below(20), self.below(10))
        } else {
            self.below(20).to_string()
        }
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= 1e-9 * scale
}
