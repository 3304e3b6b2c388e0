//! Binary expression tree built from postfix tokens.

use calc_core::TaskId;

use super::error::CompileError;
use super::token::{Operator, Token};

/// Whether a subtree has been turned into a task yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Unscheduled,
    Scheduled(TaskId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Literal(f64),
    Unary {
        op: Operator,
        operand: Box<ExprNode>,
    },
    Binary {
        op: Operator,
        left: Box<ExprNode>,
        right: Box<ExprNode>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub kind: NodeKind,
    pub state: NodeState,
}

/// Where a task gets one of its operands from.
#[derive(Debug, Clone, PartialEq)]
pub enum OperandSource {
    Value(f64),
    Task(TaskId),
}

impl ExprNode {
    pub fn literal(value: f64) -> Self {
        Self { kind: NodeKind::Literal(value), state: NodeState::Unscheduled }
    }

    pub fn unary(op: Operator, operand: ExprNode) -> Self {
        Self {
            kind: NodeKind::Unary { op, operand: Box::new(operand) },
            state: NodeState::Unscheduled,
        }
    }

    pub fn binary(op: Operator, left: ExprNode, right: ExprNode) -> Self {
        Self {
            kind: NodeKind::Binary { op, left: Box::new(left), right: Box::new(right) },
            state: NodeState::Unscheduled,
        }
    }

    pub fn literal_value(&self) -> Option<f64> {
        match self.kind {
            NodeKind::Literal(v) => Some(v),
            _ => None,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match &self.kind {
            NodeKind::Literal(_) => None,
            NodeKind::Unary { op, .. } | NodeKind::Binary { op, .. } => Some(*op),
        }
    }

    /// The operand this node supplies to its parent, if it can supply one yet.
    pub fn operand_source(&self) -> Option<OperandSource> {
        match (&self.kind, &self.state) {
            (NodeKind::Literal(v), _) => Some(OperandSource::Value(*v)),
            (_, NodeState::Scheduled(id)) => Some(OperandSource::Task(id.clone())),
            _ => None,
        }
    }
}

// Deep chains like `1+1+...+1` nest one box per operator; the derived drop
// glue would recurse once per level.
impl Drop for ExprNode {
    fn drop(&mut self) {
        let mut pending: Vec<Box<ExprNode>> = Vec::new();
        detach_children(&mut self.kind, &mut pending);
        while let Some(mut node) = pending.pop() {
            detach_children(&mut node.kind, &mut pending);
        }
    }
}

fn detach_children(kind: &mut NodeKind, into: &mut Vec<Box<ExprNode>>) {
    match std::mem::replace(kind, NodeKind::Literal(0.0)) {
        NodeKind::Literal(_) => {}
        NodeKind::Unary { operand, .. } => into.push(operand),
        NodeKind::Binary { left, right, .. } => {
            into.push(left);
            into.push(right);
        }
    }
}

/// Build a tree from postfix tokens.
pub fn build(postfix: &[Token]) -> Result<ExprNode, CompileError> {
    let mut stack: Vec<ExprNode> = Vec::new();

    for token in postfix {
        match token {
            Token::Op(op) if op.is_unary() => {
                let operand = stack
                    .pop()
                    .ok_or_else(|| CompileError::MissingOperand(op.symbol().to_string()))?;
                stack.push(ExprNode::unary(*op, operand));
            }
            Token::Op(op) => {
                if stack.len() < 2 {
                    return Err(CompileError::MissingOperand(op.symbol().to_string()));
                }
                let right = stack.pop().ok_or(CompileError::MismatchedParenthesis)?;
                let left = stack.pop().ok_or(CompileError::MismatchedParenthesis)?;
                stack.push(ExprNode::binary(*op, left, right));
            }
            Token::Number(text) => {
                let value: f64 = text
                    .parse()
                    .map_err(|_| CompileError::InvalidLiteral(text.clone()))?;
                stack.push(ExprNode::literal(value));
            }
            Token::LParen | Token::RParen => return Err(CompileError::MismatchedParenthesis),
        }
    }

    match stack.len() {
        0 => Err(CompileError::Empty),
        1 => stack.pop().ok_or(CompileError::Empty),
        n => Err(CompileError::LeftoverOperands(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::postfix::to_postfix;

    fn num(s: &str) -> Token {
        Token::Number(s.to_string())
    }

    #[test]
    fn binary_operator_pops_right_then_left() {
        let tree = build(&[num("8"), num("2"), Token::Op(Operator::Sub)]).unwrap();
        assert_eq!(tree, ExprNode::binary(Operator::Sub, ExprNode::literal(8.0), ExprNode::literal(2.0)));
    }

    #[test]
    fn unary_node_has_only_an_operand() {
        let tree = build(&to_postfix("-(3+4)").unwrap()).unwrap();
        match &tree.kind {
            NodeKind::Unary { op, operand } => {
                assert_eq!(*op, Operator::Neg);
                assert_eq!(operand.operator(), Some(Operator::Add));
            }
            other => panic!("expected unary root, got {other:?}"),
        }
    }

    #[test]
    fn too_few_operands() {
        let err = build(&[num("1"), Token::Op(Operator::Add)]).unwrap_err();
        assert_eq!(err, CompileError::MissingOperand("+".into()));
        let err = build(&[Token::Op(Operator::Neg)]).unwrap_err();
        assert_eq!(err, CompileError::MissingOperand("u-".into()));
    }

    #[test]
    fn leftover_operands_fail_loudly() {
        let err = build(&[num("1"), num("2")]).unwrap_err();
        assert_eq!(err, CompileError::LeftoverOperands(2));
    }

    #[test]
    fn bad_literal() {
        let err = build(&[num("1.2.3")]).unwrap_err();
        assert_eq!(err, CompileError::InvalidLiteral("1.2.3".into()));
    }

    #[test]
    fn operand_source_follows_state() {
        let mut tree = build(&to_postfix("(1+2)*3").unwrap()).unwrap();
        assert_eq!(tree.operand_source(), None);
        if let NodeKind::Binary { left, right, .. } = &mut tree.kind {
            assert_eq!(right.operand_source(), Some(OperandSource::Value(3.0)));
            assert_eq!(left.operand_source(), None);
            left.state = NodeState::Scheduled("7".into());
            assert_eq!(left.operand_source(), Some(OperandSource::Task("7".into())));
        }
    }

    #[test]
    fn deep_chain_drops_without_recursing() {
        let mut tree = ExprNode::literal(1.0);
        for _ in 0..200_000 {
            tree = ExprNode::unary(Operator::Neg, tree);
        }
        drop(tree);
    }
}
