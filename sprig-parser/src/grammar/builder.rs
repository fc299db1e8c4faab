use super::{
    desugar::Desugarer,
    element::{Element, Requirement},
    error::{BuildError, BuildResult, DeclarationError},
    operator::{self, Assoc, Fix, Operator, OperatorKind},
    Grammar, SymbolTable, Terminal,
};
use crate::{
    analysis::Analysis,
    cfsm::Cfsm,
    config::ParserConfig,
    parser::{Args, Decision, ErrorContext, ErrorHandler, Handler, ParseTable, Parser},
    tags, Symbol,
};
use sprig_lexer::{
    fsm::{CharClass, Machine},
    LexerBuilder,
};
use std::{collections::HashSet, sync::Arc};

enum Source {
    Pattern(String, Vec<CharClass>),
    Machine(Machine),
}

enum TokenKind {
    Emit(String),
    Discard,
    Fictive(String),
}

struct TokenDeclaration {
    kind: TokenKind,
    source: Source,
}

struct RuleDeclaration<V> {
    tag: String,
    elements: Vec<Element>,
    handler: Handler<V>,
    error_handler: Option<ErrorHandler<V>>,
}

struct OperatorDeclaration<V> {
    operator: Operator,
    handler: Handler<V>,
}

/// Collects the declarations of a grammar and builds a [`Parser`] from them.
///
/// Declarations are chained, the first mistake is reported by [`GrammarBuilder::build`].
///
/// ```
/// use sprig_parser::{Element, GrammarBuilder};
///
/// let parser = GrammarBuilder::new()
///     .token("num", "[0-9]+")
///     .discard(r"\s+")
///     .rule("sum", [Element::tag("num"), Element::keyword("+"), Element::tag("num")], |args| {
///         let left: i64 = args.text(0).unwrap().parse().unwrap();
///         let right: i64 = args.text(2).unwrap().parse().unwrap();
///         left + right
///     })
///     .start("sum")
///     .build()
///     .unwrap();
///
/// assert_eq!(parser.parse("1 + 2"), Ok(3));
/// ```
pub struct GrammarBuilder<V> {
    tokens: Vec<TokenDeclaration>,
    keywords: Vec<String>,
    rules: Vec<RuleDeclaration<V>>,
    operators: Vec<OperatorDeclaration<V>>,
    /// Tags of rules and operators in order of first declaration.
    rule_tags: Vec<String>,
    start: Option<String>,
    config: ParserConfig,
    error: Option<DeclarationError>,
}

impl<V> Default for GrammarBuilder<V> {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            keywords: Vec::new(),
            rules: Vec::new(),
            operators: Vec::new(),
            rule_tags: Vec::new(),
            start: None,
            config: ParserConfig::default(),
            error: None,
        }
    }
}

impl<V> GrammarBuilder<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, error: DeclarationError) {
        self.error.get_or_insert(error);
    }

    fn rule_tag(&mut self, tag: &str) {
        if !self.rule_tags.iter().any(|t| t == tag) {
            self.rule_tags.push(tag.to_string());
        }
    }

    /// Declares the token `tag` matching the regex `pattern`.
    pub fn token(self, tag: &str, pattern: &str) -> Self {
        self.token_with_classes(tag, pattern, Vec::new())
    }

    /// Declares the token `tag`, `[:name:]` in `pattern` can refer to `classes`.
    pub fn token_with_classes(
        mut self,
        tag: &str,
        pattern: &str,
        classes: impl IntoIterator<Item = CharClass>,
    ) -> Self {
        self.tokens.push(TokenDeclaration {
            kind: TokenKind::Emit(tag.to_string()),
            source: Source::Pattern(pattern.to_string(), classes.into_iter().collect()),
        });
        self
    }

    /// Declares the token `tag` recognized by a prebuilt machine.
    pub fn token_machine(mut self, tag: &str, machine: Machine) -> Self {
        self.tokens.push(TokenDeclaration {
            kind: TokenKind::Emit(tag.to_string()),
            source: Source::Machine(machine),
        });
        self
    }

    /// Declares lexemes that are dropped before parsing, e.g. whitespace.
    pub fn discard(mut self, pattern: &str) -> Self {
        self.tokens.push(TokenDeclaration {
            kind: TokenKind::Discard,
            source: Source::Pattern(pattern.to_string(), Vec::new()),
        });
        self
    }

    /// Declares a token the lexer never produces. Error handlers can make it up, and
    /// [`Parser::single_analyze`] recognizes it.
    pub fn fictive(mut self, tag: &str, pattern: &str) -> Self {
        self.tokens.push(TokenDeclaration {
            kind: TokenKind::Fictive(tag.to_string()),
            source: Source::Pattern(pattern.to_string(), Vec::new()),
        });
        self
    }

    /// Declares a keyword. Keywords used by rules and operators are declared implicitly.
    pub fn keyword(mut self, text: &str) -> Self {
        match text.is_empty() {
            true => self.fail(DeclarationError::EmptyKeyword),
            false => self.keywords.push(text.to_string()),
        }
        self
    }

    /// Declares the rule `tag := elements`. The handler receives one argument per element.
    pub fn rule<F>(
        mut self,
        tag: &str,
        elements: impl IntoIterator<Item = Element>,
        handler: F,
    ) -> Self
    where
        F: Fn(&mut Args<V>) -> V + Send + Sync + 'static,
    {
        self.rule_tag(tag);
        self.rules.push(RuleDeclaration {
            tag: tag.to_string(),
            elements: elements.into_iter().collect(),
            handler: Arc::new(handler),
            error_handler: None,
        });
        self
    }

    /// Attaches an error handler to the rule declared last.
    ///
    /// The handler is consulted for errors after at least one element of the rule was parsed.
    /// Errors before the first element belong to the enclosing rule.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ErrorContext<'_, V>) -> Decision<V> + Send + Sync + 'static,
    {
        match self.rules.last_mut() {
            Some(rule) => rule.error_handler = Some(Arc::new(handler)),
            None => self.fail(DeclarationError::DanglingErrorHandler),
        }
        self
    }

    /// Declares the binary operator `tag := tag sign tag`. The handler receives `left`, `sign` and
    /// `right`. Higher priorities bind tighter.
    pub fn binary<F>(self, tag: &str, sign: &str, priority: i32, assoc: Assoc, handler: F) -> Self
    where
        F: Fn(&mut Args<V>) -> V + Send + Sync + 'static,
    {
        self.operator(tag, sign, priority, OperatorKind::Binary(assoc), handler)
    }

    /// Declares the unary operator `tag := sign tag` or `tag := tag sign`. The handler receives
    /// the sign and the operand in body order.
    pub fn unary<F>(self, tag: &str, sign: &str, priority: i32, fix: Fix, handler: F) -> Self
    where
        F: Fn(&mut Args<V>) -> V + Send + Sync + 'static,
    {
        self.operator(tag, sign, priority, OperatorKind::Unary(fix), handler)
    }

    fn operator<F>(
        mut self,
        tag: &str,
        sign: &str,
        priority: i32,
        kind: OperatorKind,
        handler: F,
    ) -> Self
    where
        F: Fn(&mut Args<V>) -> V + Send + Sync + 'static,
    {
        if sign.is_empty() {
            self.fail(DeclarationError::EmptyKeyword);
        }

        self.rule_tag(tag);
        self.operators.push(OperatorDeclaration {
            operator: Operator {
                tag: tag.to_string(),
                sign: sign.to_string(),
                priority,
                kind,
            },
            handler: Arc::new(handler),
        });
        self
    }

    pub fn start(mut self, tag: &str) -> Self {
        self.start = Some(tag.to_string());
        self
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Lowers the declarations and builds the parse tables.
    ///
    /// # Fails
    ///
    /// On the first declaration mistake, on an invalid token pattern, and when the grammar has a
    /// conflict the priorities of its operators do not resolve.
    pub fn build(self) -> BuildResult<Parser<V>> {
        if let Some(error) = self.error {
            return Err(error.into());
        }

        let mut symbols = SymbolTable::default();
        let mut declared = HashSet::new();
        let mut terminals = vec![Terminal::Eof];

        for token in &self.tokens {
            let (tag, terminal) = match &token.kind {
                TokenKind::Emit(tag) => (tag, Terminal::Token(tag.clone())),
                TokenKind::Fictive(tag) => (tag, Terminal::Fictive(tag.clone())),
                TokenKind::Discard => continue,
            };

            check_tag(tag, &mut declared)?;
            symbols
                .tags
                .insert(tag.clone(), Symbol::terminal(terminals.len()));
            terminals.push(terminal);
        }

        let implicit_keywords = self
            .rules
            .iter()
            .flat_map(|rule| &rule.elements)
            .flat_map(|element| match &element.requirement {
                Requirement::Keywords(keywords) => &keywords[..],
                Requirement::Tags(_) => &[][..],
            })
            .chain(self.operators.iter().map(|op| &op.operator.sign));

        for keyword in self.keywords.iter().chain(implicit_keywords) {
            if keyword.is_empty() {
                return Err(DeclarationError::EmptyKeyword.into());
            }
            if !symbols.keywords.contains_key(keyword) {
                symbols
                    .keywords
                    .insert(keyword.clone(), Symbol::terminal(terminals.len()));
                terminals.push(Terminal::Keyword(keyword.clone()));
            }
        }

        for (index, tag) in self.rule_tags.iter().enumerate() {
            check_tag(tag, &mut declared)?;
            symbols.tags.insert(tag.clone(), Symbol::nonterminal(index + 1));
        }

        let start_tag = self.start.ok_or(DeclarationError::MissingStart)?;
        let start = match symbols.tags.get(&start_tag) {
            Some(symbol) if symbol.is_nonterminal() => *symbol,
            _ => return Err(DeclarationError::InvalidStart(start_tag).into()),
        };

        let mut lexer = LexerBuilder::new();
        for (keyword, symbol) in keywords(&terminals) {
            lexer.add_keyword(keyword, symbol);
        }
        for token in self.tokens {
            let (tag, result) = match (token.kind, token.source) {
                (TokenKind::Emit(tag), Source::Machine(machine)) => {
                    lexer.add_machine(machine, symbols.tags[&tag]);
                    (tag, Ok(()))
                }
                (TokenKind::Emit(tag), Source::Pattern(pattern, classes)) => {
                    let result = lexer.add_token(&pattern, &classes, symbols.tags[&tag]);
                    (tag, result)
                }
                (TokenKind::Fictive(tag), Source::Pattern(pattern, classes)) => {
                    let result = lexer.add_fictive(&pattern, &classes, symbols.tags[&tag]);
                    (tag, result)
                }
                (TokenKind::Discard, Source::Pattern(pattern, classes)) => {
                    let result = lexer.add_discard(&pattern, &classes);
                    (tags::DISCARD.to_string(), result)
                }
                (TokenKind::Fictive(_) | TokenKind::Discard, Source::Machine(_)) => {
                    unreachable!("only tokens are declared with machines")
                }
            };

            result.map_err(|errors| BuildError::Pattern { tag, errors })?;
        }

        let rule_tags = self.rule_tags;
        let mut grammar = Grammar::new(terminals, rule_tags, start);
        let mut handlers = Vec::new();
        let mut error_handlers = Vec::new();

        let mut desugarer = Desugarer::new(&mut grammar, &symbols);
        for rule in self.rules {
            let (id, _) = desugarer.desugar(&rule.tag, symbols.tags[&rule.tag], &rule.elements)?;
            debug_assert_eq!(id, handlers.len());
            handlers.push(rule.handler);
            error_handlers.push(rule.error_handler);
        }
        let greedy = desugarer.into_greedy_rules();

        let (operators, operator_handlers): (Vec<_>, Vec<_>) = self
            .operators
            .into_iter()
            .map(|op| (op.operator, op.handler))
            .unzip();
        operator::validate(&operators)?;

        let mut lowered = Vec::with_capacity(operators.len());
        for (op, handler) in operators.iter().zip(operator_handlers) {
            let (head, sign) = (symbols.tags[&op.tag], symbols.keywords[&op.sign]);
            let (id, production) = operator::lower(&mut grammar, op, head, sign);
            debug_assert_eq!(id, handlers.len());
            handlers.push(handler);
            error_handlers.push(None);
            lowered.push((op, production, sign));
        }
        operator::install_bans(&mut grammar, &lowered);

        let analysis = Analysis::new(&grammar);
        for rule in greedy {
            let first = analysis.first_of_sequence(&rule.group, None);
            grammar
                .production_mut(rule.production)
                .folding_bans
                .extend(first);
        }

        log::debug!(
            "lowered grammar into {} productions over {} terminals and {} nonterminals ({} helpers)",
            grammar.productions().len(),
            grammar.terminal_count(),
            grammar.nonterminal_count(),
            grammar.helper_count()
        );

        let cfsm = Cfsm::from_grammar(&grammar, &analysis);
        let table = ParseTable::new(&grammar, &cfsm, |rule| error_handlers[rule].is_some())?;

        Ok(Parser::new(
            grammar,
            cfsm,
            table,
            lexer.build(),
            handlers,
            error_handlers,
            self.config,
        ))
    }
}

/// Keywords with their terminals, explicitly declared ones first.
fn keywords(terminals: &[Terminal]) -> impl Iterator<Item = (&str, Symbol)> + '_ {
    terminals
        .iter()
        .enumerate()
        .filter_map(|(index, terminal)| match terminal {
            Terminal::Keyword(keyword) => Some((keyword.as_str(), Symbol::terminal(index))),
            _ => None,
        })
}

fn check_tag(tag: &str, declared: &mut HashSet<String>) -> Result<(), DeclarationError> {
    if tags::is_reserved(tag) {
        return Err(DeclarationError::ReservedTag(tag.to_string()));
    }
    if !declared.insert(tag.to_string()) {
        return Err(DeclarationError::DuplicateTag(tag.to_string()));
    }

    Ok(())
}
