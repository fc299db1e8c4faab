use crate::{grammar::Grammar, Symbol};
use std::collections::{BTreeSet, VecDeque};

/// EMPTY and FIRST of every nonterminal of a [`Grammar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Whether the nonterminal derives the empty string.
    pub empty: Vec<bool>,
    /// Terminals a derivation of the nonterminal can start with.
    pub first: Vec<BTreeSet<Symbol>>,
}

impl Analysis {
    pub fn new(grammar: &Grammar) -> Self {
        let empty = empty_set(grammar);
        let first = first_set(grammar, &empty);

        Self { empty, first }
    }

    pub fn is_empty(&self, symbol: Symbol) -> bool {
        symbol.is_nonterminal() && self.empty[symbol.index()]
    }

    /// FIRST of `symbols` followed by `lookahead`. The lookahead is only included when every
    /// symbol can be empty.
    pub fn first_of_sequence(
        &self,
        symbols: &[Symbol],
        lookahead: Option<Symbol>,
    ) -> BTreeSet<Symbol> {
        let mut result = BTreeSet::new();

        for symbol in symbols {
            if symbol.is_terminal() {
                result.insert(*symbol);
                return result;
            }

            result.extend(self.first[symbol.index()].iter().copied());
            if !self.empty[symbol.index()] {
                return result;
            }
        }

        result.extend(lookahead);
        result
    }
}

/// Least fixpoint of "a production whose body consists only of empty symbols makes its head
/// empty", found by counting down the non-empty symbols left in every body.
fn empty_set(grammar: &Grammar) -> Vec<bool> {
    let mut empty = vec![false; grammar.nonterminal_count()];
    // productions waiting on a nonterminal, once per occurrence
    let mut waiting = vec![Vec::new(); grammar.nonterminal_count()];
    let mut remaining = Vec::with_capacity(grammar.productions().len());
    let mut pending = VecDeque::new();

    for (id, production) in grammar.productions().iter().enumerate() {
        let blocked_by_terminal = production.body.iter().any(|s| s.is_terminal());
        remaining.push(production.body.len());

        if blocked_by_terminal {
            continue;
        }
        for symbol in &production.body {
            waiting[symbol.index()].push(id);
        }
        if production.body.is_empty() {
            pending.push_back(production.head);
        }
    }

    while let Some(head) = pending.pop_front() {
        if std::mem::replace(&mut empty[head.index()], true) {
            continue;
        }

        for id in &waiting[head.index()] {
            remaining[*id] -= 1;
            if remaining[*id] == 0 {
                pending.push_back(grammar.production(*id).head);
            }
        }
    }

    empty
}

/// FIRST through the strongly connected components of the "can start with" graph.
///
/// Tarjan's algorithm emits a component only after every component reachable from it, so a single
/// pass in emission order sees the complete FIRST of every successor.
fn first_set(grammar: &Grammar, empty: &[bool]) -> Vec<BTreeSet<Symbol>> {
    let n = grammar.nonterminal_count();
    let mut direct = vec![BTreeSet::new(); n];
    let mut edges = vec![BTreeSet::new(); n];

    for production in grammar.productions() {
        let head = production.head.index();
        for symbol in &production.body {
            if symbol.is_terminal() {
                direct[head].insert(*symbol);
                break;
            }

            edges[head].insert(symbol.index());
            if !empty[symbol.index()] {
                break;
            }
        }
    }

    let edges = edges
        .into_iter()
        .map(|e| e.into_iter().collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let mut first = vec![BTreeSet::new(); n];
    for component in Tarjan::components(&edges) {
        let mut set = BTreeSet::new();
        for v in &component {
            set.extend(direct[*v].iter().copied());
            for w in &edges[*v] {
                // members of the own component are still empty here, they add nothing new
                set.extend(first[*w].iter().copied());
            }
        }

        for v in component {
            first[v] = set.clone();
        }
    }

    first
}

/// Iterative Tarjan over an adjacency list.
struct Tarjan<'e> {
    edges: &'e [Vec<usize>],
    index: Vec<Option<usize>>,
    low: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

impl<'e> Tarjan<'e> {
    /// Components in reverse topological order.
    fn components(edges: &'e [Vec<usize>]) -> Vec<Vec<usize>> {
        let n = edges.len();
        let mut tarjan = Self {
            edges,
            index: vec![None; n],
            low: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        };

        for v in 0..n {
            if tarjan.index[v].is_none() {
                tarjan.visit(v);
            }
        }

        tarjan.components
    }

    fn enter(&mut self, v: usize) {
        self.index[v] = Some(self.next_index);
        self.low[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;
    }

    fn visit(&mut self, root: usize) {
        // (vertex, position of the next edge to follow)
        let mut frames = vec![(root, 0)];
        self.enter(root);

        while let Some((v, edge)) = frames.last_mut() {
            let v = *v;

            if let Some(&w) = self.edges[v].get(*edge) {
                *edge += 1;
                match self.index[w] {
                    None => {
                        self.enter(w);
                        frames.push((w, 0));
                    }
                    Some(index) if self.on_stack[w] => self.low[v] = self.low[v].min(index),
                    Some(_) => (),
                }
                continue;
            }

            frames.pop();
            if let Some((parent, _)) = frames.last() {
                self.low[*parent] = self.low[*parent].min(self.low[v]);
            }

            if Some(self.low[v]) == self.index[v] {
                let mut component = Vec::new();
                loop {
                    let w = self.stack.pop().expect("component root is on the stack");
                    self.on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                self.components.push(component);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Analysis, Tarjan};
    use crate::{
        grammar::{FoldKind, Grammar, Terminal},
        Symbol,
    };
    use std::collections::BTreeSet;

    const A: Symbol = Symbol::terminal(1);
    const B: Symbol = Symbol::terminal(2);
    const C: Symbol = Symbol::terminal(3);

    fn grammar(tags: usize, productions: &[(usize, Vec<Symbol>)]) -> Grammar {
        let mut grammar = Grammar::new(
            vec![
                Terminal::Eof,
                Terminal::Token("a".to_string()),
                Terminal::Token("b".to_string()),
                Terminal::Token("c".to_string()),
            ],
            (1..=tags).map(|i| format!("n{}", i)).collect(),
            Symbol::nonterminal(1),
        );
        for (head, body) in productions {
            grammar.add_production(Symbol::nonterminal(*head), body.clone(), FoldKind::Group);
        }

        grammar
    }

    fn n(index: usize) -> Symbol {
        Symbol::nonterminal(index)
    }

    #[test]
    fn empty_and_first() {
        // n1 -> n2 n3 c
        // n2 -> a | ε
        // n3 -> b n3 | ε
        let grammar = grammar(
            3,
            &[
                (1, vec![n(2), n(3), C]),
                (2, vec![A]),
                (2, vec![]),
                (3, vec![B, n(3)]),
                (3, vec![]),
            ],
        );
        let analysis = Analysis::new(&grammar);

        assert_eq!(analysis.empty, vec![false, false, true, true]);
        assert_eq!(analysis.first[1], BTreeSet::from([A, B, C]));
        assert_eq!(analysis.first[2], BTreeSet::from([A]));
        assert_eq!(analysis.first[3], BTreeSet::from([B]));
        assert_eq!(analysis.first[0], analysis.first[1]);
    }

    #[test]
    fn mutual_recursion() {
        // n1 -> n2 a | b
        // n2 -> n1 c | n3
        // n3 -> n2 | ε
        let grammar = grammar(
            3,
            &[
                (1, vec![n(2), A]),
                (1, vec![B]),
                (2, vec![n(1), C]),
                (2, vec![n(3)]),
                (3, vec![n(2)]),
                (3, vec![]),
            ],
        );
        let analysis = Analysis::new(&grammar);

        assert_eq!(analysis.empty, vec![false, false, true, true]);
        for i in 1..=3 {
            assert_eq!(analysis.first[i], BTreeSet::from([A, B]), "n{}", i);
        }
    }

    #[test]
    fn sequences() {
        let grammar = grammar(2, &[(1, vec![A]), (2, vec![B]), (2, vec![])]);
        let analysis = Analysis::new(&grammar);

        assert_eq!(
            analysis.first_of_sequence(&[n(2), n(2)], Some(Symbol::EOF)),
            BTreeSet::from([B, Symbol::EOF])
        );
        assert_eq!(
            analysis.first_of_sequence(&[n(2), n(1)], Some(Symbol::EOF)),
            BTreeSet::from([A, B])
        );
        assert_eq!(analysis.first_of_sequence(&[], None), BTreeSet::new());
    }

    #[test]
    fn components_in_reverse_topological_order() {
        // 0 -> 1 -> 2 -> 1, 2 -> 3
        let edges = vec![vec![1], vec![2], vec![1, 3], vec![]];
        let mut components = Tarjan::components(&edges);
        components.iter_mut().for_each(|c| c.sort());

        assert_eq!(components, vec![vec![3], vec![1, 2], vec![0]]);
    }
}
