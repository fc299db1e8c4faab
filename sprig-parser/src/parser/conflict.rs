use crate::{
    cfsm::{Cfsm, Item, StateId},
    grammar::Grammar,
    Symbol,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftFold,
    FoldFold,
}

impl ConflictKind {
    fn labels(self) -> (&'static str, &'static str) {
        match self {
            ConflictKind::ShiftFold => ("shift", "fold"),
            ConflictKind::FoldFold => ("fold", "fold"),
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (first, second) = self.labels();
        write!(f, "{}-{}", first, second)
    }
}

/// Two actions competing for the same state and lookahead, described in terms of the declared
/// rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub state: StateId,
    pub lookahead: String,
    /// Symbols read from the start state up to the conflicting state, helpers replaced by their
    /// shortest derivation.
    pub path: Vec<String>,
    pub alternatives: [String; 2],
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (first, second) = self.kind.labels();

        writeln!(
            f,
            "[ERROR] {} conflict in state {} on {}",
            self.kind, self.state, self.lookahead
        )?;
        writeln!(f, "  after: {}", self.path.join(" "))?;
        writeln!(f, "  {}: {}", first, self.alternatives[0])?;
        write!(f, "  {}: {}", second, self.alternatives[1])
    }
}

impl std::error::Error for Conflict {}

impl Conflict {
    pub(crate) fn new(
        kind: ConflictKind,
        grammar: &Grammar,
        cfsm: &Cfsm,
        state: StateId,
        lookahead: Symbol,
        [first, second]: [&Item; 2],
    ) -> Self {
        let expansions = shortest_expansions(grammar);
        let mut path = Vec::new();
        for symbol in cfsm.path_to(state) {
            expand(symbol, grammar, &expansions, &mut path);
        }

        Self {
            kind,
            state,
            lookahead: grammar.name(lookahead),
            path: path.into_iter().map(|s| grammar.name(s)).collect(),
            alternatives: [
                grammar.describe(first.production, first.dot),
                grammar.describe(second.production, second.dot),
            ],
        }
    }
}

fn expand(
    symbol: Symbol,
    grammar: &Grammar,
    expansions: &[Option<Vec<Symbol>>],
    path: &mut Vec<Symbol>,
) {
    match grammar.helper(symbol) {
        Some(_) => {
            for s in expansions[symbol.index()].iter().flatten() {
                expand(*s, grammar, expansions, path);
            }
        }
        None => path.push(symbol),
    }
}

/// Shortest body every helper can be replaced with, other than itself. The bodies may contain
/// other helpers with shorter expansions.
fn shortest_expansions(grammar: &Grammar) -> Vec<Option<Vec<Symbol>>> {
    let mut lengths: Vec<Option<usize>> = (0..grammar.nonterminal_count())
        .map(|n| match grammar.helper(Symbol::nonterminal(n)) {
            Some(_) => None,
            None => Some(1),
        })
        .collect();
    let mut expansions = vec![None; grammar.nonterminal_count()];

    let mut changed = true;
    while changed {
        changed = false;

        for production in grammar.productions() {
            if grammar.helper(production.head).is_none() {
                continue;
            }

            let length = production
                .body
                .iter()
                .map(|s| match s.is_terminal() {
                    true => Some(1),
                    false => lengths[s.index()],
                })
                .sum::<Option<usize>>();

            let head = production.head.index();
            match (length, lengths[head]) {
                (Some(length), Some(best)) if length >= best => (),
                (Some(length), _) => {
                    lengths[head] = Some(length);
                    expansions[head] = Some(production.body.clone());
                    changed = true;
                }
                (None, _) => (),
            }
        }
    }

    expansions
}
