use super::{predicate::Predicate, sim::Simulator, StateId};

/// Epsilon-free finite-state machine.
///
/// The machine is stored as a list of per-state transition lists. State `0` is always the start
/// state and no transition ever points back to it. All combinators rely on this: when machines are
/// composed, the start state of an operand is replaced by splicing its outgoing transitions into
/// other states, after which it is unreachable and can be dropped.
#[derive(Debug, Clone)]
pub struct Machine {
    pub(super) states: Vec<State>,
}

/// A state in the [`Machine`].
#[derive(Debug, Clone, Default)]
pub(super) struct State {
    /// Whether the state is final.
    pub(super) fin: bool,
    /// Outgoing transitions of the state.
    pub(super) transitions: Vec<Transition>,
}

/// Transition to `dest` when the input is accepted by the predicate.
#[derive(Debug, Clone)]
pub(super) struct Transition {
    pub(super) input: Predicate,
    pub(super) dest: StateId,
}

/// Errors raised by the bounded repetition combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    #[error("invalid repetition range {{{left},{right}}}")]
    InvalidRange { left: usize, right: usize },
}

impl State {
    fn new(fin: bool) -> Self {
        Self {
            fin,
            transitions: Vec::new(),
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::empty()
    }
}

impl Machine {
    /// Single-state machine accepting only the empty string.
    pub fn empty() -> Self {
        Self {
            states: Vec::from([State::new(true)]),
        }
    }

    /// Two-state machine accepting exactly one character accepted by `input`.
    pub fn single(input: Predicate) -> Self {
        Self {
            states: Vec::from([
                State {
                    fin: false,
                    transitions: Vec::from([Transition { input, dest: 1 }]),
                },
                State::new(true),
            ]),
        }
    }

    /// Machine accepting exactly `text`.
    pub fn literal(text: &str) -> Self {
        let mut states = Vec::new();

        for (id, c) in text.chars().enumerate() {
            states.push(State {
                fin: false,
                transitions: Vec::from([Transition {
                    input: Predicate::Char(c),
                    dest: id + 1,
                }]),
            });
        }
        states.push(State::new(true));

        Self { states }
    }

    /// Amount of states in the machine.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// A machine always has a start state.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the machine accepts the empty string.
    pub fn is_nullable(&self) -> bool {
        self.states[0].fin
    }

    /// Returns a [`Simulator`] starting in the start state.
    pub fn simulator(&self) -> Simulator<'_> {
        Simulator::new(self)
    }

    /// Whether the machine accepts the whole `input`.
    pub fn matches(&self, input: &str) -> bool {
        use super::Simulate;

        self.simulator().run(input)
    }

    /// Splits the machine in the parts needed to splice it behind another machine: whether the
    /// start state is final, the start transitions and the remaining states. All state ids are
    /// moved by `shift` (the start state itself is dropped, so state `1` becomes `shift + 1`).
    fn splice(self, shift: usize) -> (bool, Vec<Transition>, impl Iterator<Item = State>) {
        let mut states = self.states.into_iter();
        let start = states.next().expect("machine always has a start state");

        let relocate = move |transitions: Vec<Transition>| {
            transitions
                .into_iter()
                .map(|mut t| {
                    t.dest += shift;
                    t
                })
                .collect::<Vec<_>>()
        };

        let start_transitions = relocate(start.transitions);
        let tail = states.map(move |State { fin, transitions }| State {
            fin,
            transitions: relocate(transitions),
        });

        (start.fin, start_transitions, tail)
    }

    /// Machine accepting the strings of either `self` or `other`.
    pub fn union(self, other: Machine) -> Self {
        // the new start state sits at 0, followed by the non-start states of both operands
        let self_shift = 0;
        let other_shift = self.states.len() - 1;

        let (self_fin, self_start, self_tail) = self.splice(self_shift);
        let (other_fin, other_start, other_tail) = other.splice(other_shift);

        let mut start = State::new(self_fin || other_fin);
        start.transitions.extend(self_start);
        start.transitions.extend(other_start);

        let mut states = Vec::from([start]);
        states.extend(self_tail);
        states.extend(other_tail);

        Self { states }
    }

    /// Machine accepting `s1·s2` for every `s1` accepted by `self` and `s2` accepted by `other`.
    ///
    /// Every final state of `self` additionally gets the start transitions of `other` and stays
    /// final only if `other` accepts the empty string.
    pub fn concat(self, other: Machine) -> Self {
        let shift = self.states.len() - 1;
        let (other_fin, other_start, other_tail) = other.splice(shift);

        let mut states = self.states;
        for state in states.iter_mut().filter(|s| s.fin) {
            state.transitions.extend(other_start.iter().cloned());
            state.fin = other_fin;
        }
        states.extend(other_tail);

        Self { states }
    }

    /// Machine accepting the strings of `self` and the empty string.
    pub fn optional(mut self) -> Self {
        // The start state is never a transition destination, so making it final adds the empty
        // string and nothing else.
        self.states[0].fin = true;
        self
    }

    /// Machine accepting one or more consecutive strings of `self`.
    pub fn plus(mut self) -> Self {
        let restart = self.states[0].transitions.clone();

        for state in self.states.iter_mut().skip(1).filter(|s| s.fin) {
            state.transitions.extend(restart.iter().cloned());
        }

        self
    }

    /// Machine accepting zero or more consecutive strings of `self`.
    pub fn star(self) -> Self {
        if self.is_nullable() {
            self.plus()
        } else {
            self.plus().optional()
        }
    }

    /// Machine accepting exactly `n` consecutive strings of `self`.
    pub fn dup(self, n: usize) -> Self {
        match n {
            0 => Self::empty(),
            1 => self,
            n => (1..n).fold(self.clone(), |acc, _| acc.concat(self.clone())),
        }
    }

    /// Machine accepting `left` or more consecutive strings of `self` (`{left,}`).
    pub fn ray(self, left: usize) -> Self {
        match left {
            0 => self.star(),
            1 => self.plus(),
            left => self.clone().dup(left - 1).concat(self.plus()),
        }
    }

    /// Machine accepting between `left` and `right` consecutive strings of `self`
    /// (`{left,right}`).
    pub fn segment(self, left: usize, right: usize) -> Result<Self, MachineError> {
        if right < left {
            return Err(MachineError::InvalidRange { left, right });
        }

        Ok(match (left, right) {
            (0, 0) => Self::empty(),
            (1, 1) => self,
            (0, 1) => self.optional(),
            (left, right) => self
                .clone()
                .dup(left)
                .concat(self.optional().dup(right - left)),
        })
    }

    /// Returns an iterator over the ids of the final states.
    pub(super) fn final_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter_map(|(id, state)| state.fin.then_some(id))
    }
}
