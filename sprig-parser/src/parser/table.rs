use super::conflict::{Conflict, ConflictKind};
use crate::{
    cfsm::{Cfsm, Item, State, StateId},
    grammar::{FoldKind, Grammar, ProductionId, RuleId},
    Symbol,
};
use std::{collections::BTreeSet, fmt};

/// Action table entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(StateId),
    Fold(ProductionId),
    Accept,
    Error,
}

/// Dense action and goto tables of a [`Cfsm`], plus the error handlers bound in every state.
#[derive(Clone)]
pub struct ParseTable {
    /// Indexed by state, then terminal index.
    action: Vec<Vec<Action>>,
    /// Indexed by state, then nonterminal index.
    goto: Vec<Vec<Option<StateId>>>,
    /// `(production, dot)` positions of productions with an error handler, deepest first.
    error_bindings: Vec<Vec<(ProductionId, usize)>>,
    /// The only non-empty production completed in a state, if there is one.
    default_folds: Vec<Option<ProductionId>>,
}

impl fmt::Debug for ParseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseTable")
            .field("states", &self.action.len())
            .field("action", &self.action)
            .field("goto", &self.goto)
            .finish()
    }
}

impl ParseTable {
    /// Emits the tables of `cfsm`. `has_error_handler` tells which rules recover from errors.
    ///
    /// # Fails
    ///
    /// When a state holds a shift and a fold, or two folds, for the same lookahead that the bans
    /// of the productions did not resolve.
    pub fn new(
        grammar: &Grammar,
        cfsm: &Cfsm,
        has_error_handler: impl Fn(RuleId) -> bool,
    ) -> Result<Self, Box<Conflict>> {
        let mut action = Vec::with_capacity(cfsm.len());
        let mut goto = Vec::with_capacity(cfsm.len());
        let mut error_bindings = Vec::with_capacity(cfsm.len());
        let mut default_folds = Vec::with_capacity(cfsm.len());

        for (id, state) in cfsm.iter() {
            let mut row = Vec::with_capacity(grammar.terminal_count());

            for terminal in (0..grammar.terminal_count()).map(Symbol::terminal) {
                let shift = state.transitions.get(&terminal).copied();
                let folds = state
                    .item_set
                    .iter()
                    .filter(|item| {
                        item.lookahead == terminal
                            && item.is_complete(grammar)
                            && !grammar
                                .production(item.production)
                                .folding_bans
                                .contains(&terminal)
                    })
                    .collect::<Vec<_>>();

                let entry = match (shift, &folds[..]) {
                    (None, []) => Action::Error,
                    (Some(destination), []) => Action::Shift(destination),
                    (None, [item]) if item.production == 0 => Action::Accept,
                    (None, [item]) => Action::Fold(item.production),
                    (Some(_), [fold, ..]) => {
                        let shifted = state
                            .item_set
                            .iter()
                            .find(|item| item.cursor_symbol(grammar) == Some(terminal))
                            .expect("a shift comes from an item reading the terminal");
                        return Err(Box::new(Conflict::new(
                            ConflictKind::ShiftFold,
                            grammar,
                            cfsm,
                            id,
                            terminal,
                            [shifted, *fold],
                        )));
                    }
                    (None, [first, second, ..]) => {
                        return Err(Box::new(Conflict::new(
                            ConflictKind::FoldFold,
                            grammar,
                            cfsm,
                            id,
                            terminal,
                            [*first, *second],
                        )))
                    }
                };
                row.push(entry);
            }

            action.push(row);
            goto.push(
                (0..grammar.nonterminal_count())
                    .map(|n| state.transitions.get(&Symbol::nonterminal(n)).copied())
                    .collect(),
            );
            error_bindings.push(bindings(grammar, state.item_set.iter(), &has_error_handler));
            default_folds.push(default_fold(grammar, state));
        }

        log::debug!(
            "built parse table with {} states, {} terminals and {} nonterminals",
            action.len(),
            grammar.terminal_count(),
            grammar.nonterminal_count()
        );

        Ok(Self {
            action,
            goto,
            error_bindings,
            default_folds,
        })
    }

    pub fn action(&self, state: StateId, terminal: Symbol) -> Action {
        debug_assert!(terminal.is_terminal());
        self.action[state]
            .get(terminal.index())
            .copied()
            .unwrap_or(Action::Error)
    }

    pub fn goto(&self, state: StateId, nonterminal: Symbol) -> Option<StateId> {
        debug_assert!(nonterminal.is_nonterminal());
        self.goto[state].get(nonterminal.index()).copied().flatten()
    }

    pub fn error_bindings(&self, state: StateId) -> &[(ProductionId, usize)] {
        &self.error_bindings[state]
    }

    /// Production error recovery folds when the state has no handlers and no action for the
    /// offending token.
    pub fn default_fold(&self, state: StateId) -> Option<ProductionId> {
        self.default_folds[state]
    }

    pub fn len(&self) -> usize {
        self.action.len()
    }

    pub fn is_empty(&self) -> bool {
        self.action.is_empty()
    }
}

/// Positions inside recovering productions, deepest first. Positions at the very start of a
/// production have nothing to recover.
fn bindings<'a>(
    grammar: &Grammar,
    items: impl Iterator<Item = &'a Item>,
    has_error_handler: &impl Fn(RuleId) -> bool,
) -> Vec<(ProductionId, usize)> {
    let mut bindings = items
        .filter(|item| item.dot > 0)
        .filter(|item| match grammar.production(item.production).fold {
            FoldKind::Rule(rule) => has_error_handler(rule),
            _ => false,
        })
        .map(|item| (item.production, item.dot))
        .collect::<Vec<_>>();

    bindings.sort_by(|(lp, ld), (rp, rd)| rd.cmp(ld).then(lp.cmp(rp)));
    bindings.dedup();

    bindings
}

/// Shifts of other terminals are left out: recovery only asks for the default fold of a state
/// that has no action for the offending token.
fn default_fold(grammar: &Grammar, state: &State) -> Option<ProductionId> {
    let completed = state
        .item_set
        .iter()
        .filter(|item| {
            item.production != 0
                && item.is_complete(grammar)
                && !grammar.production(item.production).body.is_empty()
        })
        .map(|item| item.production)
        .collect::<BTreeSet<_>>();

    match completed.len() {
        1 => completed.into_iter().next(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, ParseTable};
    use crate::{
        analysis::Analysis,
        cfsm::Cfsm,
        grammar::{FoldKind, Grammar, RuleInfo, Shape, Terminal},
        parser::conflict::ConflictKind,
        Symbol,
    };

    const ID: Symbol = Symbol::terminal(1);
    const PLUS: Symbol = Symbol::terminal(2);
    const SEMI: Symbol = Symbol::terminal(3);
    const EXPR: Symbol = Symbol::nonterminal(1);

    fn grammar(bans: bool) -> Grammar {
        let mut grammar = Grammar::new(
            vec![
                Terminal::Eof,
                Terminal::Token("id".to_string()),
                Terminal::Keyword("+".to_string()),
                Terminal::Keyword(";".to_string()),
            ],
            vec!["expr".to_string()],
            EXPR,
        );
        let rule = grammar.add_rule(RuleInfo {
            tag: "expr".to_string(),
            params: vec!["left".to_string(), "sign".to_string(), "right".to_string()],
            shapes: vec![Shape::Single; 3],
        });
        let sum = grammar.add_production(EXPR, vec![EXPR, PLUS, EXPR], FoldKind::Rule(rule));
        grammar.add_production(EXPR, vec![ID], FoldKind::Group);
        if bans {
            grammar.production_mut(sum).carry_bans.insert(PLUS);
        }

        grammar
    }

    #[test]
    fn ambiguous() {
        let grammar = grammar(false);
        let cfsm = Cfsm::from_grammar(&grammar, &Analysis::new(&grammar));
        let conflict = ParseTable::new(&grammar, &cfsm, |_| false).unwrap_err();

        assert_eq!(conflict.kind, ConflictKind::ShiftFold);
        assert_eq!(conflict.lookahead, "\"+\"");
        assert_eq!(conflict.path, vec!["expr", "\"+\"", "expr"]);
        assert_eq!(
            conflict.alternatives,
            [
                "expr := left • sign right".to_string(),
                "expr := left sign right •".to_string()
            ]
        );
    }

    #[test]
    fn left_associative() {
        let grammar = grammar(true);
        let cfsm = Cfsm::from_grammar(&grammar, &Analysis::new(&grammar));
        let table = ParseTable::new(&grammar, &cfsm, |_| true).unwrap();

        let shift_id = match table.action(0, ID) {
            Action::Shift(state) => state,
            action => panic!("expected a shift, got {:?}", action),
        };
        assert_eq!(table.action(shift_id, PLUS), Action::Fold(2));
        assert_eq!(table.default_fold(shift_id), Some(2));
        assert_eq!(table.action(shift_id, SEMI), Action::Error);
        assert_eq!(table.action(0, Symbol::EOF), Action::Error);

        let after_expr = table.goto(0, EXPR).unwrap();
        assert_eq!(table.action(after_expr, Symbol::EOF), Action::Accept);
        assert!(matches!(table.action(after_expr, PLUS), Action::Shift(_)));
        assert_eq!(table.default_fold(after_expr), None);

        // `expr "+" •expr` and `expr • "+" expr` inside the sum
        let Action::Shift(after_plus) = table.action(after_expr, PLUS) else {
            unreachable!()
        };
        let right = table.goto(after_plus, EXPR).unwrap();
        assert_eq!(table.error_bindings(right), &[(1, 3), (1, 1)]);
        assert_eq!(table.action(right, PLUS), Action::Fold(1));
        assert_eq!(table.default_fold(right), Some(1));
    }
}
