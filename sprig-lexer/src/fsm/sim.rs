use super::{machine::Machine, traits::Simulate, StateId};
use std::collections::BTreeSet;

/// Simulator over a [`Machine`].
///
/// A machine can have several transitions accepting the same character, so the simulator keeps
/// track of the set of states it is currently in.
#[derive(Debug, Clone)]
pub struct Simulator<'a> {
    /// Machine we are simulating.
    machine: &'a Machine,
    /// States the simulator is currently in.
    current: BTreeSet<StateId>,
}

impl<'a> Simulator<'a> {
    pub(super) fn new(machine: &'a Machine) -> Self {
        Self {
            machine,
            current: BTreeSet::from([0]),
        }
    }

    /// Returns the states the simulator is currently in.
    pub fn current_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.current.iter().copied()
    }
}

impl Simulate for Simulator<'_> {
    fn is_accepting(&self) -> bool {
        self.current
            .iter()
            .any(|state_id| self.machine.states[*state_id].fin)
    }

    fn is_alive(&self) -> bool {
        !self.current.is_empty()
    }

    fn can_feed(&self, input: char) -> bool {
        self.current.iter().any(|state_id| {
            self.machine.states[*state_id]
                .transitions
                .iter()
                .any(|t| t.input.contains(input))
        })
    }

    fn feed(&mut self, input: char) -> bool {
        let machine = self.machine;

        self.current = self
            .current
            .iter()
            .flat_map(|state_id| machine.states[*state_id].transitions.iter())
            .filter(|t| t.input.contains(input))
            .map(|t| t.dest)
            .collect();

        self.is_accepting()
    }
}
