use crate::{grammar::Shape, Symbol};
use std::sync::Arc;

/// Token as the parser receives it, the kind is the terminal of the token.
pub type Token = sprig_lexer::Token<Symbol>;

/// Semantic action of a rule. Receives the parameters of the rule and produces its value.
pub type Handler<V> = Arc<dyn Fn(&mut Args<V>) -> V + Send + Sync>;

/// Entry of the value stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<V> {
    Token(Token),
    Value(V),
    /// Leaves collected by an optional or repeated element, expanded into parameters when the
    /// rule folds.
    Group(Vec<Slot<V>>),
}

impl<V> Slot<V> {
    pub fn into_arg(self) -> Arg<V> {
        match self {
            Slot::Token(token) => Arg::Token(token),
            Slot::Value(value) => Arg::Value(value),
            Slot::Group(slots) => Arg::List(slots.into_iter().map(Slot::into_arg).collect()),
        }
    }

    /// Leaves of the slot, a group is opened up.
    pub(crate) fn into_leaves(self) -> Vec<Slot<V>> {
        match self {
            Slot::Group(slots) => slots,
            slot => vec![slot],
        }
    }
}

/// Parameter of a rule handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<V> {
    Token(Token),
    Value(V),
    /// Element of an optional group that did not occur.
    Absent,
    /// Occurrences of a repeated element in source order.
    List(Vec<Arg<V>>),
}

impl<V> Arg<V> {
    pub fn into_value(self) -> Option<V> {
        match self {
            Arg::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_token(self) -> Option<Token> {
        match self {
            Arg::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn into_list(self) -> Vec<Arg<V>> {
        match self {
            Arg::List(args) => args,
            Arg::Absent => Vec::new(),
            arg => vec![arg],
        }
    }

    /// Source text of a token argument.
    pub fn text(&self) -> Option<&str> {
        match self {
            Arg::Token(token) => Some(&token.source),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Arg::Absent)
    }
}

/// Expands the slots of a rule body into one argument per element.
///
/// An optional group yields its elements or [`Arg::Absent`] for each of them. A repeated group of
/// `d` elements yields `d` lists, the leaves are dealt out to the lists in turn.
pub(crate) fn flatten<V>(slots: Vec<Slot<V>>, shapes: &[Shape]) -> Vec<Arg<V>> {
    let mut args = Vec::with_capacity(shapes.iter().map(|s| s.width()).sum());

    for (slot, shape) in slots.into_iter().zip(shapes.iter().copied()) {
        match (shape, slot) {
            (Shape::Single, slot) => args.push(slot.into_arg()),
            (Shape::Optional(divisor), Slot::Group(leaves)) if leaves.is_empty() => {
                args.extend((0..divisor).map(|_| Arg::Absent))
            }
            (Shape::Optional(_), Slot::Group(leaves)) => {
                args.extend(leaves.into_iter().map(Slot::into_arg))
            }
            (Shape::Many(divisor), Slot::Group(leaves)) => {
                let mut lists = (0..divisor)
                    .map(|_| Vec::with_capacity(leaves.len() / divisor))
                    .collect::<Vec<_>>();
                for (i, leaf) in leaves.into_iter().enumerate() {
                    lists[i % divisor].push(leaf.into_arg());
                }
                args.extend(lists.into_iter().map(Arg::List));
            }
            // a value folded in by error recovery in place of the group
            (shape, slot) => {
                args.push(slot.into_arg());
                args.extend((1..shape.width()).map(|_| Arg::Absent));
            }
        }
    }

    args
}

/// Arguments handed to a [`Handler`].
///
/// Arguments are taken out by index, once taken they are [`Arg::Absent`].
#[derive(Debug)]
pub struct Args<V> {
    args: Vec<Arg<V>>,
    retag: Option<String>,
}

impl<V> Args<V> {
    pub(crate) fn new(args: Vec<Arg<V>>) -> Self {
        Self { args, retag: None }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg<V>> {
        self.args.get(index)
    }

    pub fn take(&mut self, index: usize) -> Arg<V> {
        match self.args.get_mut(index) {
            Some(arg) => std::mem::replace(arg, Arg::Absent),
            None => Arg::Absent,
        }
    }

    pub fn token(&mut self, index: usize) -> Option<Token> {
        self.take(index).into_token()
    }

    pub fn value(&mut self, index: usize) -> Option<V> {
        self.take(index).into_value()
    }

    pub fn list(&mut self, index: usize) -> Vec<Arg<V>> {
        self.take(index).into_list()
    }

    /// Values of a repeated element, tokens in the list are skipped.
    pub fn values(&mut self, index: usize) -> Vec<V> {
        self.list(index)
            .into_iter()
            .filter_map(Arg::into_value)
            .collect()
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(Arg::text)
    }

    pub fn is_present(&self, index: usize) -> bool {
        self.args.get(index).map_or(false, Arg::is_present)
    }

    /// Folds the current rule into the rule of `tag` instead of its own.
    pub fn retag(&mut self, tag: impl Into<String>) {
        self.retag = Some(tag.into());
    }

    pub(crate) fn into_retag(self) -> Option<String> {
        self.retag
    }
}

#[cfg(test)]
mod tests {
    use super::{flatten, Arg, Args, Slot, Token};
    use crate::{grammar::Shape, Symbol};

    fn token(text: &str) -> Token {
        Token {
            kind: Some(Symbol::terminal(1)),
            source: text.to_string(),
            line: 1,
            column: 1,
            pos: (0, text.len()),
        }
    }

    #[test]
    fn optional_groups() {
        let slots: Vec<Slot<i32>> = vec![
            Slot::Value(1),
            Slot::Group(vec![]),
            Slot::Group(vec![Slot::Token(token("=")), Slot::Value(2)]),
        ];
        let args = flatten(
            slots,
            &[Shape::Single, Shape::Optional(2), Shape::Optional(2)],
        );

        assert_eq!(
            args,
            vec![
                Arg::Value(1),
                Arg::Absent,
                Arg::Absent,
                Arg::Token(token("=")),
                Arg::Value(2)
            ]
        );
    }

    #[test]
    fn repeated_groups() {
        // {"," item} repeated three times
        let leaves = (1..=3)
            .flat_map(|i| [Slot::Token(token(",")), Slot::Value(i)])
            .collect();
        let mut args = Args::new(flatten(vec![Slot::Group(leaves)], &[Shape::Many(2)]));

        assert_eq!(args.len(), 2);
        assert_eq!(args.list(0).len(), 3);
        assert_eq!(args.values(1), vec![1, 2, 3]);
        assert!(!args.is_present(1));
    }

    #[test]
    fn accessors() {
        let mut args = Args::new(vec![
            Arg::Token(token("x")),
            Arg::Value(4),
            Arg::Absent,
        ]);

        assert_eq!(args.text(0), Some("x"));
        assert_eq!(args.value(0), None);
        assert_eq!(args.value(1), Some(4));
        assert_eq!(args.value(1), None);
        assert!(!args.is_present(2));
        assert!(!args.is_present(7));

        args.retag("sum");
        assert_eq!(args.into_retag().as_deref(), Some("sum"));
    }
}
