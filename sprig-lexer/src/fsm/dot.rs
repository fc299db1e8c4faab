use super::machine::Machine;
use std::fmt;

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dot())
    }
}

impl Machine {
    /// Converts the machine to the [graphviz](https://graphviz.org/docs/layouts/dot/) dot language
    /// format.
    pub fn to_dot(&self) -> String {
        let final_dot = format!(
            "node [shape = doublecircle]; {}",
            self.final_states()
                .map(|id| id.to_string())
                .collect::<Vec<String>>()
                .join(" ")
        );

        format!(
            "digraph machine {{\n\
                \trankdir = LR;\n\
            \n\
                \t// final states\n\
                \t{}\n\
                \tnode [shape = circle]; 0;\n\
            \n\
                {}\n\
            }}",
            final_dot,
            self.transition_dot()
                .map(|l| format!("\t{}", l))
                .collect::<Vec<String>>()
                .join("\n")
        )
    }

    /// Converts the transitions to the dot format and returns an iterator over it.
    fn transition_dot(&self) -> impl Iterator<Item = String> + '_ {
        self.states.iter().enumerate().flat_map(|(id, state)| {
            state.transitions.iter().map(move |t| {
                format!(
                    "{} -> {} [label = \"{}\"];",
                    id,
                    t.dest,
                    t.input.to_string().replace('\\', "\\\\").replace('"', "\\\"")
                )
            })
        })
    }
}
