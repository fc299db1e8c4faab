use super::value::{Slot, Token};
use crate::tags;
use std::sync::Arc;

/// Decides how to continue after an unexpected token inside a rule.
pub type ErrorHandler<V> = Arc<dyn Fn(&ErrorContext<'_, V>) -> Decision<V> + Send + Sync>;

/// Token made up by an error handler. The tag is resolved against the grammar when the token is
/// parsed; keywords use [`tags::KEYWORD`] with the keyword as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthetic {
    pub tag: String,
    pub text: String,
}

impl Synthetic {
    pub fn new(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
        }
    }

    pub fn keyword(text: impl Into<String>) -> Self {
        Self::new(tags::KEYWORD, text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision<V> {
    /// Drops the offending token.
    Skip,
    /// Ends the parse with a syntax error on the offending token.
    Stop,
    /// Parses the synthetic token, then the offending token again.
    PerformBefore(Synthetic),
    /// Parses the synthetic token in place of the offending token.
    PerformInstead(Synthetic),
    /// Folds the rule into the value and hands the offending token to the handlers of the state
    /// the fold ends in.
    FoldAndReraise(V),
    /// Leaves the decision to the next handler bound in the state.
    NextHandler,
}

impl<V> Decision<V> {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Decision::Skip => "skip",
            Decision::Stop => "stop",
            Decision::PerformBefore(_) => "perform before",
            Decision::PerformInstead(_) => "perform instead",
            Decision::FoldAndReraise(_) => "fold and reraise",
            Decision::NextHandler => "next handler",
        }
    }
}

/// What an [`ErrorHandler`] gets to see.
#[derive(Debug)]
pub struct ErrorContext<'a, V> {
    pub(crate) token: &'a Token,
    pub(crate) tag: &'a str,
    pub(crate) rule: &'a str,
    pub(crate) dot: usize,
    pub(crate) popped: &'a [Slot<V>],
}

impl<'a, V> ErrorContext<'a, V> {
    /// The offending token.
    pub fn token(&self) -> &'a Token {
        self.token
    }

    /// Tag the offending token is reported as.
    pub fn tag(&self) -> &'a str {
        self.tag
    }

    pub fn text(&self) -> &'a str {
        &self.token.source
    }

    /// Tag of the rule the handler belongs to.
    pub fn rule(&self) -> &'a str {
        self.rule
    }

    /// Amount of body symbols of the rule parsed before the error.
    pub fn dot(&self) -> usize {
        self.dot
    }

    /// Slots of the parsed part of the rule, in body order.
    pub fn popped(&self) -> &'a [Slot<V>] {
        self.popped
    }

    pub fn is_eof(&self) -> bool {
        self.tag == tags::EOF
    }

    pub fn synthetic(&self, tag: impl Into<String>, text: impl Into<String>) -> Synthetic {
        Synthetic::new(tag, text)
    }

    pub fn keyword(&self, text: impl Into<String>) -> Synthetic {
        Synthetic::keyword(text)
    }
}
