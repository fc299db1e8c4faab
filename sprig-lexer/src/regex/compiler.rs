use super::{
    ast::{Ast, ExprKind},
    tokenizer::{QuantifierKind, QuantifierRangeKind},
};
use crate::fsm::Machine;

/// Regex AST to [`Machine`] compiler.
///
/// Every node is compiled bottom-up with the machine combinators, so no epsilon transitions are
/// ever created.
impl From<Ast> for Machine {
    fn from(value: Ast) -> Self {
        compile(&value.0)
    }
}

fn compile(expr: &ExprKind) -> Machine {
    match expr {
        ExprKind::Concat(exprs) => exprs
            .iter()
            .map(compile)
            .reduce(Machine::concat)
            .unwrap_or_default(),
        ExprKind::Empty => Machine::empty(),
        ExprKind::Alt(lhs, rhs) => compile(lhs).union(compile(rhs)),
        ExprKind::Lit(predicate, quantifier) => {
            quantify(Machine::single(predicate.clone()), *quantifier)
        }
        ExprKind::Group(expr, quantifier) => quantify(compile(expr), *quantifier),
    }
}

fn quantify(machine: Machine, quantifier: Option<QuantifierKind>) -> Machine {
    let Some(quantifier) = quantifier else {
        return machine;
    };

    match quantifier {
        QuantifierKind::Asterisk => machine.star(),
        QuantifierKind::Plus => machine.plus(),
        QuantifierKind::QuestionMark => machine.optional(),
        QuantifierKind::Range(QuantifierRangeKind::Exact(n)) => machine.dup(n as usize),
        QuantifierKind::Range(QuantifierRangeKind::Min(left)) => machine.ray(left as usize),
        QuantifierKind::Range(QuantifierRangeKind::Range(left, right)) => machine
            .segment(left as usize, right as usize)
            .expect("decreasing ranges are rejected by the parser"),
    }
}
