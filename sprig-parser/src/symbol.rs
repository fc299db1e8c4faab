use std::fmt;

/// Grammar symbol addressing either a terminal or a nonterminal with a single integer.
///
/// Terminals are stored as the bitwise complement of their index and are therefore always
/// negative, nonterminals are stored as their (non-negative) index.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(i32);

impl Symbol {
    /// End of input.
    pub const EOF: Symbol = Symbol::terminal(0);
    /// Head of the augmented start production.
    pub const ACCEPT: Symbol = Symbol::nonterminal(0);

    pub const fn terminal(index: usize) -> Self {
        Self(!(index as i32))
    }

    pub const fn nonterminal(index: usize) -> Self {
        Self(index as i32)
    }

    pub const fn is_terminal(self) -> bool {
        self.0 < 0
    }

    pub const fn is_nonterminal(self) -> bool {
        self.0 >= 0
    }

    /// Index of the symbol within its own id space.
    pub const fn index(self) -> usize {
        if self.is_terminal() {
            !self.0 as usize
        } else {
            self.0 as usize
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.is_terminal() {
            true => write!(f, "t{}", self.index()),
            false => write!(f, "n{}", self.index()),
        }
    }
}
