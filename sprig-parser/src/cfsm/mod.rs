pub use self::item::{Item, ItemSet};

use self::trie::ItemTrie;
use crate::{analysis::Analysis, grammar::Grammar, Symbol};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

mod dot;
mod item;
mod trie;

pub type StateId = usize;

/// Canonical collection of LR(1) item sets. State `0` is the start state.
#[derive(Debug, Clone)]
pub struct Cfsm {
    states: Vec<State>,
}

/// Represents a [state](https://en.wikipedia.org/wiki/LR_parser#Finite_state_machine)
/// in the [`Cfsm`] containing an [`ItemSet`] and transitions based on symbols
/// to other states.
#[derive(Debug, Clone)]
pub struct State {
    pub item_set: ItemSet,
    pub transitions: BTreeMap<Symbol, StateId>,
}

impl Cfsm {
    pub fn from_grammar(grammar: &Grammar, analysis: &Analysis) -> Self {
        let mut trie = ItemTrie::default();

        let start_kernel = BTreeSet::from([Item::new(0, 0, Symbol::EOF)]);
        trie.insert(&start_kernel, 0);
        let mut states = vec![State {
            item_set: ItemSet::closure(start_kernel, grammar, analysis),
            transitions: BTreeMap::new(),
        }];
        let mut pending_states = VecDeque::from([0]);

        while let Some(id) = pending_states.pop_front() {
            for (symbol, kernel) in states[id].item_set.kernels_by_cursor_symbol(grammar) {
                let destination = match trie.get(&kernel) {
                    Some(destination) => destination,
                    None => {
                        // the state is complete before other kernels can find it
                        let item_set = ItemSet::closure(kernel.clone(), grammar, analysis);
                        let destination = states.len();
                        states.push(State {
                            item_set,
                            transitions: BTreeMap::new(),
                        });
                        trie.insert(&kernel, destination);
                        pending_states.push_back(destination);
                        destination
                    }
                };

                states[id].transitions.insert(symbol, destination);
            }
        }

        log::debug!(
            "built cfsm with {} states, {} trie nodes",
            states.len(),
            trie.node_count()
        );

        Self { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, &State)> + '_ {
        self.states.iter().enumerate()
    }

    /// Shortest sequence of symbols leading from the start state to `target`.
    pub fn path_to(&self, target: StateId) -> Vec<Symbol> {
        let mut parents = vec![None; self.states.len()];
        let mut visited = vec![false; self.states.len()];
        let mut queue = VecDeque::from([0]);
        visited[0] = true;

        while let Some(id) = queue.pop_front() {
            if id == target {
                break;
            }
            for (symbol, destination) in &self.states[id].transitions {
                if !std::mem::replace(&mut visited[*destination], true) {
                    parents[*destination] = Some((id, *symbol));
                    queue.push_back(*destination);
                }
            }
        }

        let mut path = Vec::new();
        let mut current = target;
        while let Some((parent, symbol)) = parents[current] {
            path.push(symbol);
            current = parent;
        }
        path.reverse();

        path
    }
}

#[cfg(test)]
mod tests {
    use super::{Cfsm, Item};
    use crate::{
        analysis::Analysis,
        grammar::{FoldKind, Grammar, Terminal},
        Symbol,
    };

    const ID: Symbol = Symbol::terminal(1);
    const LPAREN: Symbol = Symbol::terminal(2);
    const RPAREN: Symbol = Symbol::terminal(3);
    const EXPR: Symbol = Symbol::nonterminal(1);

    /// expr -> "(" expr ")" | id
    fn grammar() -> Grammar {
        let mut grammar = Grammar::new(
            vec![
                Terminal::Eof,
                Terminal::Token("id".to_string()),
                Terminal::Keyword("(".to_string()),
                Terminal::Keyword(")".to_string()),
            ],
            vec!["expr".to_string()],
            EXPR,
        );
        grammar.add_production(EXPR, vec![LPAREN, EXPR, RPAREN], FoldKind::Group);
        grammar.add_production(EXPR, vec![ID], FoldKind::Group);

        grammar
    }

    #[test]
    fn canonical_collection() {
        let grammar = grammar();
        let cfsm = Cfsm::from_grammar(&grammar, &Analysis::new(&grammar));

        // lookahead `<eof>` and `)` on every level except the start split the states
        assert_eq!(cfsm.len(), 10);
        assert!(cfsm
            .iter()
            .all(|(_, state)| !state.transitions.values().any(|d| *d == 0)));

        let start = cfsm.state(0);
        assert_eq!(start.transitions.len(), 3);
        assert!(start.item_set.iter().any(|i| *i == Item::new(2, 0, Symbol::EOF)));
    }

    #[test]
    fn deduplicated_states() {
        let grammar = grammar();
        let cfsm = Cfsm::from_grammar(&grammar, &Analysis::new(&grammar));

        // nested parentheses beyond the first level share their states
        let nested = cfsm.state(0).transitions[&LPAREN];
        let deeper = cfsm.state(nested).transitions[&LPAREN];
        assert_eq!(cfsm.state(deeper).transitions[&LPAREN], deeper);
        assert_eq!(cfsm.path_to(deeper), vec![LPAREN, LPAREN]);

        let inner = cfsm.state(deeper).transitions[&EXPR];
        let closed = cfsm.state(inner).transitions[&RPAREN];
        assert_eq!(cfsm.path_to(closed), vec![LPAREN, LPAREN, EXPR, RPAREN]);
    }
}
