use crate::{
    analysis::Analysis,
    grammar::{Grammar, ProductionId},
    Symbol,
};
use std::collections::{BTreeMap, BTreeSet};

/// LR(1) item: a production with a bullet/cursor and the terminal expected after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    pub production: ProductionId,
    pub dot: usize,
    pub lookahead: Symbol,
}

impl Item {
    pub fn new(production: ProductionId, dot: usize, lookahead: Symbol) -> Self {
        Self {
            production,
            dot,
            lookahead,
        }
    }

    /// Symbol the cursor is currently reading, `None` for completed items.
    pub fn cursor_symbol(&self, grammar: &Grammar) -> Option<Symbol> {
        grammar.production(self.production).body.get(self.dot).copied()
    }

    pub fn is_complete(&self, grammar: &Grammar) -> bool {
        self.cursor_symbol(grammar).is_none()
    }

    fn advance(self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self
        }
    }
}

/// Closure-complete set of [items](Item) forming a state of the [`Cfsm`](super::Cfsm).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSet {
    items: BTreeSet<Item>,
}

impl ItemSet {
    /// Constructs the closure of `kernel`.
    ///
    /// Empty productions are not added for lookaheads they are banned from folding on, nothing
    /// could be done with the item.
    pub fn closure(kernel: BTreeSet<Item>, grammar: &Grammar, analysis: &Analysis) -> Self {
        let mut pending = kernel.iter().copied().collect::<Vec<_>>();
        let mut items = kernel;

        while let Some(item) = pending.pop() {
            let Some(head) = item.cursor_symbol(grammar) else {
                continue;
            };
            if head.is_terminal() {
                continue;
            }

            let rest = &grammar.production(item.production).body[item.dot + 1..];
            let lookaheads = analysis.first_of_sequence(rest, Some(item.lookahead));

            for production in grammar.productions_of(head) {
                let candidate = grammar.production(*production);
                for lookahead in &lookaheads {
                    if candidate.body.is_empty() && candidate.folding_bans.contains(lookahead) {
                        continue;
                    }

                    let new_item = Item::new(*production, 0, *lookahead);
                    if items.insert(new_item) {
                        pending.push(new_item);
                    }
                }
            }
        }

        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Terminals a completed item of the set bans shifting on.
    pub fn carry_bans(&self, grammar: &Grammar) -> BTreeSet<Symbol> {
        self.items
            .iter()
            .filter(|item| {
                item.is_complete(grammar)
                    && grammar
                        .production(item.production)
                        .carry_bans
                        .contains(&item.lookahead)
            })
            .map(|item| item.lookahead)
            .collect()
    }

    /// Groups the items by the symbol they are currently reading and advances them over it. The
    /// result are the kernels of the successor states, carry-banned terminals are left out.
    pub fn kernels_by_cursor_symbol(&self, grammar: &Grammar) -> BTreeMap<Symbol, BTreeSet<Item>> {
        let banned = self.carry_bans(grammar);

        self.items.iter().fold(BTreeMap::new(), |mut kernels, item| {
            match item.cursor_symbol(grammar) {
                Some(symbol) if !banned.contains(&symbol) => {
                    kernels
                        .entry(symbol)
                        .or_insert_with(BTreeSet::new)
                        .insert(item.advance());
                }
                _ => (),
            }
            kernels
        })
    }
}
