//! Regex ast based on this grammar: <https://github.com/kean/Regex/blob/main/grammar.ebnf>
//!
//! # Grammar
//!
//! ```ebnf
//!     expression ::= sub_expression (VERTICAL expression)?;
//!     sub_expression ::= sub_expression_item*;
//!     sub_expression_item ::= match | group;
//!     group ::= LEFT_PAREN expression RIGHT_PAREN QUANTIFIER?;
//!     match ::= match_item QUANTIFIER?;
//!     match_item ::= CHARACTER_CLASS | CHARACTER | character_group;
//!     character_group ::= LEFT_BRACKET CARET? character_group_item+ RIGHT_BRACKET;
//!     character_group_item ::= CHARACTER_CLASS | NAMED_CLASS | character_range | CHARACTER;
//! ```
//!
//! Character classes are resolved while parsing, so literals are stored as the [`Predicate`] that
//! ends up on the transition of the compiled machine.

use super::tokenizer::QuantifierKind;
use crate::fsm::Predicate;

#[derive(Debug, Clone)]
pub(crate) struct Ast(pub(crate) ExprKind);

/// Regular expression kind.
#[derive(Debug, Clone)]
pub(crate) enum ExprKind {
    /// Concatenation of regular expressions.
    Concat(Vec<ExprKind>),
    /// An empty regex expression (e.g., `()`, the right side of `a|`).
    Empty,
    /// An alternative expression (e.g., `<expression> | <expression>`).
    Alt(Box<ExprKind>, Box<ExprKind>),
    /// A literal (e.g., `a`, `[^ca]`, `[a-z]`, `[0-1]*`).
    Lit(Predicate, Option<QuantifierKind>),
    /// A grouped expression (e.g., `([a-z] | foo)`, `(ab[ac]){3,}`).
    Group(Box<ExprKind>, Option<QuantifierKind>),
}
