use sprig_parser::{BuildError, GrammarBuilder, Parser, SyntaxError};
use std::{fs, io, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("[ERROR] could not read input: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// Built grammar, ready to parse.
///
/// The engine is immutable, it can be shared between threads and used for any amount of parses.
///
/// ```
/// use sprig::{Element, Engine, GrammarBuilder};
///
/// let engine = Engine::new(
///     GrammarBuilder::new()
///         .token("word", "[a-z]+")
///         .discard(r"\s+")
///         .rule("words", [Element::tag("word").many1()], |args| args.list(0).len())
///         .start("words"),
/// )
/// .unwrap();
///
/// assert_eq!(engine.parse("three little words"), Ok(3));
/// assert_eq!(engine.single_analyze("word"), Some("word"));
/// ```
#[derive(Debug)]
pub struct Engine<V> {
    parser: Parser<V>,
}

impl<V> Engine<V> {
    pub fn new(grammar: GrammarBuilder<V>) -> Result<Self, BuildError> {
        let parser = grammar.build()?;
        log::debug!("engine ready with {} states", parser.table().len());

        Ok(Self { parser })
    }

    pub fn parse(&self, input: &str) -> Result<V, SyntaxError> {
        self.parser.parse(input)
    }

    /// Parses characters as they are pulled from `input`.
    pub fn parse_chars(&self, input: impl Iterator<Item = char>) -> Result<V, SyntaxError> {
        self.parser.parse_chars(input)
    }

    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<V, EngineError> {
        let path = path.as_ref();
        log::debug!("parsing {}", path.display());

        let input = fs::read_to_string(path)?;
        Ok(self.parser.parse(&input)?)
    }

    /// Tag of the token `text` is read as, see [`Parser::single_analyze`].
    pub fn single_analyze(&self, text: &str) -> Option<&str> {
        self.parser.single_analyze(text)
    }

    pub fn parser(&self) -> &Parser<V> {
        &self.parser
    }
}

impl<V> From<Parser<V>> for Engine<V> {
    fn from(parser: Parser<V>) -> Self {
        Self { parser }
    }
}
