//! Pattern language for token declarations.

pub use self::parser::error::{PatternError, PatternErrorKind, PatternErrors, PatternResult};

use self::parser::Parser;
use crate::fsm::{CharClass, Machine};

/// Largest bound a range quantifier accepts. Bounded repetitions copy their operand once per
/// count.
pub const MAX_REPETITION: u32 = 1024;

mod ast;
mod compiler;
mod parser;
mod tokenizer;


/// Compiles `pattern` to a [`Machine`]. `[:name:]` references that are not built-in resolve to
/// `classes`.
pub fn compile(pattern: &str, classes: &[CharClass]) -> PatternResult<Machine> {
    let ast = Parser::new(pattern, classes).parse()?;
    Ok(Machine::from(ast))
}
