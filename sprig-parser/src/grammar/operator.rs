use super::{error::DeclarationError, FoldKind, Grammar, ProductionId, RuleId, RuleInfo, Shape};
use crate::Symbol;
use std::collections::{BTreeMap, BTreeSet};

/// Associativity of a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// Position of the sign of a unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fix {
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperatorKind {
    Binary(Assoc),
    Unary(Fix),
}

impl OperatorKind {
    /// The body ends with the operand (`a + •b`, `- •b`).
    fn ends_with_operand(self) -> bool {
        !matches!(self, OperatorKind::Unary(Fix::Suffix))
    }

    /// The sign follows an operand (`a •+ b`, `a •!`).
    fn follows_operand(self) -> bool {
        !matches!(self, OperatorKind::Unary(Fix::Prefix))
    }
}

/// Operator declaration on the operand tag `tag`. Higher priorities bind tighter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Operator {
    pub(crate) tag: String,
    pub(crate) sign: String,
    pub(crate) priority: i32,
    pub(crate) kind: OperatorKind,
}

/// Checks the operators declared on the same tag against each other.
pub(crate) fn validate(operators: &[Operator]) -> Result<(), DeclarationError> {
    let mut priorities = BTreeMap::new();
    let mut signs = BTreeSet::new();

    for op in operators {
        let kind = *priorities
            .entry((op.tag.as_str(), op.priority))
            .or_insert(op.kind);
        if kind != op.kind {
            return Err(DeclarationError::PriorityCollision {
                tag: op.tag.clone(),
                priority: op.priority,
            });
        }

        if !signs.insert((op.tag.as_str(), op.sign.as_str(), op.kind.follows_operand())) {
            return Err(DeclarationError::DuplicateSign {
                tag: op.tag.clone(),
                sign: op.sign.clone(),
            });
        }
    }

    Ok(())
}

/// Adds the production of `op` with `head` as the operand symbol and `sign` as its sign.
pub(crate) fn lower(
    grammar: &mut Grammar,
    op: &Operator,
    head: Symbol,
    sign: Symbol,
) -> (RuleId, ProductionId) {
    let (params, body) = match op.kind {
        OperatorKind::Binary(_) => (vec!["left", "sign", "right"], vec![head, sign, head]),
        OperatorKind::Unary(Fix::Prefix) => (vec!["sign", "operand"], vec![sign, head]),
        OperatorKind::Unary(Fix::Suffix) => (vec!["operand", "sign"], vec![head, sign]),
    };

    let rule = grammar.add_rule(RuleInfo {
        tag: op.tag.clone(),
        params: params.into_iter().map(String::from).collect(),
        shapes: vec![Shape::Single; body.len()],
    });
    let production = grammar.add_production(head, body, FoldKind::Rule(rule));

    (rule, production)
}

/// Whether the completed production of `o` must be folded before the sign of `q` is shifted.
fn folds_before(o: &Operator, q: &Operator) -> bool {
    o.priority > q.priority
        || (o.priority == q.priority && o.kind == OperatorKind::Binary(Assoc::Left))
}

/// Compiles priority and associativity into bans.
///
/// `lowered` pairs every operator with its production and the symbol of its sign. For every
/// operator `o` ending with an operand and every operator `q` on the same tag whose sign follows
/// an operand, the lookahead `sign(q)` either carry-bans `o` (reduce first) or fold-bans it
/// (shift first).
pub(crate) fn install_bans(grammar: &mut Grammar, lowered: &[(&Operator, ProductionId, Symbol)]) {
    for (o, production, _) in lowered.iter().filter(|(o, ..)| o.kind.ends_with_operand()) {
        for (q, _, sign) in lowered
            .iter()
            .filter(|(q, ..)| q.tag == o.tag && q.kind.follows_operand())
        {
            let production = grammar.production_mut(*production);
            match folds_before(o, q) {
                true => production.carry_bans.insert(*sign),
                false => production.folding_bans.insert(*sign),
            };
        }
    }
}
