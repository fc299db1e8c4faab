use super::{item::Item, Cfsm, State};
use crate::grammar::Grammar;

impl Cfsm {
    /// Converts the CFSM to dot language using the [grahviz](https://graphviz.org/docs/layouts/dot/)
    /// dot language format.
    pub fn to_dot(&self, grammar: &Grammar) -> String {
        format!(
            "digraph cfsm {{\n\
                \trankdir=LR;\n\
            \n\
                \tnode [shape=rectangle];\n\
                {}\n\
            \n\
                {}\n\
            }}",
            self.node_labels_dot(grammar)
                .map(|l| format!("\t{}\n", l))
                .collect::<String>(),
            self.transitions_dot(grammar)
                .map(|l| format!("\t{}\n", l))
                .collect::<String>(),
        )
    }

    fn node_labels_dot<'a>(&'a self, grammar: &'a Grammar) -> impl Iterator<Item = String> + 'a {
        self.iter().map(move |(id, State { item_set, .. })| {
            let label = item_set
                .iter()
                .map(|item| escape(&render_item(grammar, item)))
                .collect::<Vec<_>>()
                .join(r"\n");

            format!("{} [label=\"{}\"];", id, label)
        })
    }

    fn transitions_dot<'a>(&'a self, grammar: &'a Grammar) -> impl Iterator<Item = String> + 'a {
        self.iter().flat_map(move |(id, State { transitions, .. })| {
            transitions.iter().map(move |(symbol, state)| {
                format!(
                    "{} -> {} [label = \"{}\"]",
                    id,
                    state,
                    escape(&grammar.name(*symbol))
                )
            })
        })
    }
}

fn render_item(grammar: &Grammar, item: &Item) -> String {
    format!(
        "{}, {}",
        grammar.describe(item.production, item.dot),
        grammar.name(item.lookahead)
    )
}

fn escape(label: &str) -> String {
    label.replace('\\', r"\\").replace('"', "\\\"")
}
