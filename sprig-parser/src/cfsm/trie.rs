use super::{item::Item, StateId};
use std::collections::BTreeMap;

/// Prefix tree over sorted kernel item sequences, mapping every kernel to the state built for it.
#[derive(Debug, Clone)]
pub(super) struct ItemTrie {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: BTreeMap<Item, usize>,
    state: Option<StateId>,
}

impl Default for ItemTrie {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }
}

impl ItemTrie {
    pub(super) fn get<'a>(&self, kernel: impl IntoIterator<Item = &'a Item>) -> Option<StateId> {
        let mut node = 0;
        for item in kernel {
            node = *self.nodes[node].children.get(item)?;
        }

        self.nodes[node].state
    }

    /// Registers `state` for `kernel`. Returns the state that was registered before, if any.
    pub(super) fn insert<'a>(
        &mut self,
        kernel: impl IntoIterator<Item = &'a Item>,
        state: StateId,
    ) -> Option<StateId> {
        let mut node = 0;
        for item in kernel {
            node = match self.nodes[node].children.get(item) {
                Some(child) => *child,
                None => {
                    self.nodes.push(Node::default());
                    let child = self.nodes.len() - 1;
                    self.nodes[node].children.insert(*item, child);
                    child
                }
            };
        }

        self.nodes[node].state.replace(state)
    }

    pub(super) fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
