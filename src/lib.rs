//! Compiles declarative grammars to maximal munch lexers and LR(1) parsers with recoverable
//! syntax errors.

pub use engine::{Engine, EngineError};
pub use sprig_lexer::{fsm::CharClass, Lexer, Token};
pub use sprig_parser::{
    tags, Arg, Args, Assoc, BuildError, Conflict, ConflictKind, Decision, DeclarationError,
    Element, ErrorContext, Fix, GrammarBuilder, Parser, ParserConfig, Slot, SyntaxError,
    Synthetic,
};

mod engine;
