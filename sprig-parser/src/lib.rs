//! Grammar declarations, canonical LR(1) tables and a parser with recoverable errors.
//!
//! Rules are declared with sugared [elements](Element) on a [`GrammarBuilder`], lowered to a
//! primitive grammar and compiled to a [`Parser`] together with the lexer of their tokens.

pub use analysis::Analysis;
pub use cfsm::{Cfsm, Item, ItemSet, State, StateId};
pub use config::ParserConfig;
pub use grammar::{
    Assoc, BuildError, BuildResult, DeclarationError, Element, Fix, FoldKind, Grammar,
    GrammarBuilder, Helper, HelperId, HelperKind, HelperOrigin, Nonterminal, Production,
    ProductionId, Repetition, Requirement, RuleId, RuleInfo, Shape, Terminal,
};
pub use parser::{
    Action, Arg, Args, Conflict, ConflictKind, Decision, ErrorContext, ErrorHandler, Handler,
    ParseResult, ParseTable, Parser, Slot, SyntaxError, Synthetic, Token,
};
pub use symbol::Symbol;

// lexing is part of the interface of a grammar (char classes, prebuilt machines)
pub use sprig_lexer as lexer;

pub mod tags;

mod analysis;
mod cfsm;
mod config;
mod grammar;
mod parser;
mod symbol;
