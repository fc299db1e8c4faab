pub use self::input::{CharStream, Checkpoint};

use crate::{
    fsm::{CharClass, Machine, Simulate, Simulator},
    regex::{self, PatternResult},
};
use std::str::Chars;

mod input;

/// Maximal munch lexer over a list of machines.
///
/// Every machine is simulated in lock-step from the same origin. The longest match wins, ties are
/// broken by registration order: keywords come first, then tokens (including discarded ones), then
/// fictive tokens.
#[derive(Debug, Clone)]
pub struct Lexer<K> {
    /// Rules in order of precedence.
    rules: Vec<Rule<K>>,
    /// Amount of rules the lexer matches against, fictive rules come after these.
    matchable: usize,
}

#[derive(Debug, Clone)]
struct Rule<K> {
    machine: Machine,
    action: Action<K>,
}

#[derive(Debug, Clone)]
enum Action<K> {
    Emit(K),
    /// The token is dropped before it reaches the consumer (e.g., whitespace).
    Discard,
}

/// [`Token`] returned by the [`Lexer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<K> {
    /// Kind of token configured by the user. `None` when no rule matched, in which case the token
    /// is exactly one character long.
    pub kind: Option<K>,
    /// Source string representation of the token.
    pub source: String,
    /// Line of the first character of the token, starting at 1.
    pub line: usize,
    /// Column of the first character of the token, starting at 1.
    pub column: usize,
    /// Position of the token in the input in characters. The end points one position beyond the
    /// end of the token.
    pub pos: (usize, usize),
}

/// Builder struct for the [`Lexer`].
#[derive(Debug, Clone)]
pub struct LexerBuilder<K> {
    keywords: Vec<Rule<K>>,
    tokens: Vec<Rule<K>>,
    fictive: Vec<Rule<K>>,
}

impl<K> Default for LexerBuilder<K> {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            tokens: Vec::new(),
            fictive: Vec::new(),
        }
    }
}

impl<K> LexerBuilder<K> {
    /// Creates a new empty [`LexerBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a keyword matching exactly `text`. Keywords take precedence over tokens of the same
    /// length.
    pub fn with_keyword(mut self, text: &str, kind: K) -> Self {
        self.add_keyword(text, kind);
        self
    }

    /// Adds a token matching the regex `pattern`.
    ///
    /// # Fails
    ///
    /// When the provided `pattern` is invalid regex.
    pub fn with_token(self, pattern: &str, kind: K) -> PatternResult<Self> {
        self.with_token_classes(pattern, &[], kind)
    }

    /// Adds a token matching the regex `pattern`, in which `[:name:]` can refer to `classes`.
    ///
    /// # Fails
    ///
    /// When the provided `pattern` is invalid regex or refers to an unknown class.
    pub fn with_token_classes(
        mut self,
        pattern: &str,
        classes: &[CharClass],
        kind: K,
    ) -> PatternResult<Self> {
        self.add_token(pattern, classes, kind)?;
        Ok(self)
    }

    /// Adds a token recognized by a prebuilt machine.
    pub fn with_machine(mut self, machine: Machine, kind: K) -> Self {
        self.add_machine(machine, kind);
        self
    }

    /// Adds a token that is matched but never emitted.
    ///
    /// # Fails
    ///
    /// When the provided `pattern` is invalid regex.
    pub fn with_discard(mut self, pattern: &str) -> PatternResult<Self> {
        self.add_discard(pattern, &[])?;
        Ok(self)
    }

    /// Adds a token that is never matched while tokenizing, but is recognized by
    /// [`Lexer::single_analyze`].
    ///
    /// # Fails
    ///
    /// When the provided `pattern` is invalid regex.
    pub fn with_fictive(mut self, pattern: &str, kind: K) -> PatternResult<Self> {
        self.add_fictive(pattern, &[], kind)?;
        Ok(self)
    }

    pub fn add_keyword(&mut self, text: &str, kind: K) {
        self.keywords.push(Rule {
            machine: Machine::literal(text),
            action: Action::Emit(kind),
        });
    }

    pub fn add_token(
        &mut self,
        pattern: &str,
        classes: &[CharClass],
        kind: K,
    ) -> PatternResult<()> {
        self.add_machine(regex::compile(pattern, classes)?, kind);
        Ok(())
    }

    pub fn add_machine(&mut self, machine: Machine, kind: K) {
        self.tokens.push(Rule {
            machine,
            action: Action::Emit(kind),
        });
    }

    pub fn add_discard(&mut self, pattern: &str, classes: &[CharClass]) -> PatternResult<()> {
        self.tokens.push(Rule {
            machine: regex::compile(pattern, classes)?,
            action: Action::Discard,
        });
        Ok(())
    }

    pub fn add_fictive(
        &mut self,
        pattern: &str,
        classes: &[CharClass],
        kind: K,
    ) -> PatternResult<()> {
        self.fictive.push(Rule {
            machine: regex::compile(pattern, classes)?,
            action: Action::Emit(kind),
        });
        Ok(())
    }

    /// Builds the [`Lexer`].
    pub fn build(self) -> Lexer<K> {
        let matchable = self.keywords.len() + self.tokens.len();
        let rules = self
            .keywords
            .into_iter()
            .chain(self.tokens)
            .chain(self.fictive)
            .collect::<Vec<_>>();

        log::debug!(
            "built lexer with {} rules ({} fictive), {} states in total",
            rules.len(),
            rules.len() - matchable,
            rules.iter().map(|r| r.machine.len()).sum::<usize>()
        );

        Lexer { rules, matchable }
    }
}

impl<K> Lexer<K> {
    /// Creates a [`LexerBuilder`].
    pub fn builder() -> LexerBuilder<K> {
        LexerBuilder::new()
    }
}

impl<K: Clone> Lexer<K> {
    /// Tokenizes `input`.
    pub fn tokenize<'l, 'i>(&'l self, input: &'i str) -> Tokens<'l, K, Chars<'i>> {
        self.tokenize_chars(input.chars())
    }

    /// Tokenizes a stream of characters. Characters are pulled only when the lexer needs them.
    pub fn tokenize_chars<I: Iterator<Item = char>>(&self, input: I) -> Tokens<'_, K, I> {
        Tokens {
            lexer: self,
            stream: CharStream::new(input),
        }
    }

    /// Classifies `text` as a whole, fictive tokens included. Returns `None` when no rule matches
    /// or the first rule that does is discarded.
    pub fn single_analyze(&self, text: &str) -> Option<K> {
        let rule = self.rules.iter().find(|rule| rule.machine.matches(text))?;

        match &rule.action {
            Action::Emit(kind) => Some(kind.clone()),
            Action::Discard => None,
        }
    }

    /// Scans the longest token at the cursor of `stream`. Returns `None` at the end of the stream.
    fn scan<I: Iterator<Item = char>>(&self, stream: &mut CharStream<I>) -> Option<Scanned<'_, K>> {
        if stream.is_eof() {
            return None;
        }

        let origin = stream.checkpoint();
        let mut sims = self.rules[..self.matchable]
            .iter()
            .enumerate()
            .map(|(id, rule)| (id, rule.machine.simulator()))
            .collect::<Vec<(usize, Simulator)>>();

        // (length, rule) of the longest match so far
        let mut best = None;
        let mut len = 0;

        while !sims.is_empty() {
            let Some(c) = stream.advance() else {
                break;
            };
            len += 1;

            sims.retain_mut(|(_, sim)| {
                sim.feed(c);
                sim.is_alive()
            });

            if let Some((id, _)) = sims.iter().find(|(_, sim)| sim.is_accepting()) {
                best = Some((len, *id));
            }
        }

        stream.rewind(origin);

        // nothing matched, take a single undefined character to make progress
        let (len, action) = match best {
            Some((len, id)) => (len, Some(&self.rules[id].action)),
            None => (1, None),
        };

        let source = stream.advance_by(len);
        stream.trim();

        Some(Scanned {
            action,
            source,
            origin,
        })
    }
}

struct Scanned<'l, K> {
    action: Option<&'l Action<K>>,
    source: String,
    origin: Checkpoint,
}

/// Iterator over the tokens of an input, see [`Lexer::tokenize`].
pub struct Tokens<'l, K, I: Iterator<Item = char>> {
    lexer: &'l Lexer<K>,
    stream: CharStream<I>,
}

impl<K: Clone, I: Iterator<Item = char>> Iterator for Tokens<'_, K, I> {
    type Item = Token<K>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Scanned {
                action,
                source,
                origin,
            } = self.lexer.scan(&mut self.stream)?;

            let kind = match action {
                Some(Action::Discard) => continue,
                Some(Action::Emit(kind)) => Some(kind.clone()),
                None => None,
            };

            let end = origin.offset + source.chars().count();
            log::trace!("token {:?} at {}:{}", source, origin.line, origin.column);

            return Some(Token {
                kind,
                source,
                line: origin.line,
                column: origin.column,
                pos: (origin.offset, end),
            });
        }
    }
}
