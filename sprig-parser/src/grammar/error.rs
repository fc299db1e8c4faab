use crate::parser::Conflict;
use sprig_lexer::regex::PatternErrors;
use thiserror::Error;

/// Mistake in the declarations handed to a [`GrammarBuilder`](crate::GrammarBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("tag `{0}` is reserved")]
    ReservedTag(String),
    #[error("tag `{0}` is declared more than once")]
    DuplicateTag(String),
    #[error("keywords cannot be empty")]
    EmptyKeyword,
    #[error("rule `{rule}` refers to the unknown tag `{tag}`")]
    UnknownTag { rule: String, tag: String },
    #[error("rule `{rule}`: element {element} accepts nothing")]
    EmptyRequirement { rule: String, element: usize },
    #[error("rule `{rule}`: element {element} is together with no optional or repeated element")]
    DanglingTogether { rule: String, element: usize },
    #[error("rule `{rule}`: element {element} cannot be greedy, it does not start a group")]
    GreedyPlain { rule: String, element: usize },
    #[error("operators of `{tag}` at priority {priority} differ in arity or associativity")]
    PriorityCollision { tag: String, priority: i32 },
    #[error("sign {sign:?} is declared twice in the same position for `{tag}`")]
    DuplicateSign { tag: String, sign: String },
    #[error("an error handler is declared before any rule")]
    DanglingErrorHandler,
    #[error("no start tag is declared")]
    MissingStart,
    #[error("start tag `{0}` is not a rule tag")]
    InvalidStart(String),
}

/// Reason a grammar could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
    #[error("token `{tag}`: {errors}")]
    Pattern { tag: String, errors: PatternErrors },
    #[error(transparent)]
    Conflict(#[from] Box<Conflict>),
}

pub type BuildResult<T> = Result<T, BuildError>;
