use super::{
    error::{ParseResult, SyntaxError},
    recovery::{Decision, ErrorContext, Synthetic},
    table::Action,
    value::{flatten, Args, Slot, Token},
    Parser,
};
use crate::{
    cfsm::StateId,
    grammar::{FoldKind, ProductionId},
    tags, Symbol,
};

/// Outcome of feeding a single token.
enum Fed<V> {
    Consumed,
    Accepted(V),
}

/// State of a single parse: the value stack and the state stack. The state stack holds one more
/// entry than the value stack, the start state.
pub(super) struct Run<'p, V> {
    parser: &'p Parser<V>,
    states: Vec<StateId>,
    values: Vec<Slot<V>>,
}

impl<'p, V> Run<'p, V> {
    pub(super) fn new(parser: &'p Parser<V>) -> Self {
        Self {
            parser,
            states: vec![0],
            values: Vec::new(),
        }
    }

    pub(super) fn run(mut self, tokens: impl Iterator<Item = Token>) -> ParseResult<V> {
        // (line, column, offset) right after the last token
        let mut end = (1, 1, 0);

        for token in tokens {
            end = end_of(&token);
            if let Fed::Accepted(value) = self.feed(token, 0)? {
                return Ok(value);
            }
        }

        let (line, column, offset) = end;
        let eof = Token {
            kind: Some(Symbol::EOF),
            source: String::new(),
            line,
            column,
            pos: (offset, offset),
        };

        match self.feed(eof.clone(), 0)? {
            Fed::Accepted(value) => Ok(value),
            // recovery made up tokens without ever accepting
            Fed::Consumed => Err(self.syntax_error(&eof)),
        }
    }

    fn top(&self) -> StateId {
        *self
            .states
            .last()
            .expect("the start state is never popped")
    }

    fn feed(&mut self, token: Token, depth: usize) -> ParseResult<Fed<V>> {
        let parser = self.parser;

        loop {
            let state = self.top();
            let action = match token.kind {
                Some(symbol) => parser.table.action(state, symbol),
                None => Action::Error,
            };

            match action {
                Action::Shift(destination) => {
                    if parser.config.log_actions {
                        log::trace!(
                            "state {}: shift {:?} to {}",
                            state,
                            token.source,
                            destination
                        );
                    }
                    self.values.push(Slot::Token(token));
                    self.states.push(destination);

                    return Ok(Fed::Consumed);
                }
                Action::Fold(production) => self.fold(production, &token)?,
                Action::Accept => {
                    if parser.config.log_actions {
                        log::trace!("state {}: accept", state);
                    }

                    return match self.values.pop() {
                        Some(Slot::Value(value)) => Ok(Fed::Accepted(value)),
                        _ => Err(self.syntax_error(&token)),
                    };
                }
                Action::Error => {
                    log::warn!(
                        "unexpected {} {:?} at ({}, {}) in state {}",
                        parser.tag_of(&token),
                        token.source,
                        token.line,
                        token.column,
                        state
                    );
                    return self.recover(token, depth);
                }
            }
        }
    }

    fn fold(&mut self, id: ProductionId, lookahead: &Token) -> ParseResult<()> {
        let parser = self.parser;
        let grammar = &parser.grammar;
        let production = grammar.production(id);
        let len = production.body.len();

        let mut slots = self.values.split_off(self.values.len() - len);
        self.states.truncate(self.states.len() - len);

        if parser.config.log_actions {
            log::trace!("state {}: fold {}", self.top(), grammar.describe(id, len));
        }

        let (slot, head) = match production.fold {
            FoldKind::Rule(rule) => {
                let mut args = Args::new(flatten(slots, &grammar.rule(rule).shapes));
                let value = (parser.handlers[rule])(&mut args);

                let head = match args.into_retag() {
                    Some(tag) => grammar.find_tag(&tag).ok_or_else(|| SyntaxError {
                        tag: tags::UNKNOWN.to_string(),
                        text: tag,
                        line: lookahead.line,
                        column: lookahead.column,
                    })?,
                    None => production.head,
                };

                (Slot::Value(value), head)
            }
            FoldKind::Pass => (
                slots.pop().expect("alternatives hold a single symbol"),
                production.head,
            ),
            FoldKind::Group => (Slot::Group(slots), production.head),
            FoldKind::Extend => {
                let mut slots = slots.into_iter();
                let mut leaves = slots.next().map(Slot::into_leaves).unwrap_or_default();
                leaves.extend(slots);

                (Slot::Group(leaves), production.head)
            }
            FoldKind::Prepend => {
                if let Some(rest) = slots.pop() {
                    slots.extend(rest.into_leaves());
                }

                (Slot::Group(slots), production.head)
            }
            FoldKind::Accept => unreachable!("the start production is accepted, never folded"),
        };

        let destination = parser
            .table
            .goto(self.top(), head)
            .ok_or_else(|| self.syntax_error(lookahead))?;
        self.values.push(slot);
        self.states.push(destination);

        Ok(())
    }

    /// Runs the error handlers bound in the current state, deepest binding first, until one of
    /// them decides. Without a decision the parse stops.
    fn recover(&mut self, token: Token, depth: usize) -> ParseResult<Fed<V>> {
        if depth >= self.parser.config.max_recovery_depth {
            log::warn!(
                "giving up on {:?} at ({}, {}), recovery nested {} times",
                token.source,
                token.line,
                token.column,
                depth
            );
            return Err(self.syntax_error(&token));
        }

        let parser = self.parser;
        let state = self.top();
        let mut consulted = false;

        for &(production, dot) in parser.table.error_bindings(state) {
            let FoldKind::Rule(rule) = parser.grammar.production(production).fold else {
                continue;
            };
            let Some(handler) = &parser.error_handlers[rule] else {
                continue;
            };

            let popped_values = self.values.split_off(self.values.len() - dot);
            let popped_states = self.states.split_off(self.states.len() - dot);

            consulted = true;
            let decision = handler(&ErrorContext {
                token: &token,
                tag: parser.tag_of(&token),
                rule: &parser.grammar.rule(rule).tag,
                dot,
                popped: &popped_values,
            });
            log::debug!(
                "error handler of `{}` at {} decided: {}",
                parser.grammar.rule(rule).tag,
                dot,
                decision.name()
            );

            if let Decision::FoldAndReraise(value) = decision {
                let head = parser.grammar.production(production).head;
                let destination = parser
                    .table
                    .goto(self.top(), head)
                    .ok_or_else(|| self.syntax_error(&token))?;
                self.values.push(Slot::Value(value));
                self.states.push(destination);

                return self.recover(token, depth + 1);
            }

            self.values.extend(popped_values);
            self.states.extend(popped_states);

            let is_eof = token.kind == Some(Symbol::EOF);
            match decision {
                Decision::NextHandler => continue,
                Decision::Stop => return Err(self.syntax_error(&token)),
                // the end of input cannot be dropped
                Decision::Skip if is_eof => return Err(self.syntax_error(&token)),
                Decision::Skip => return Ok(Fed::Consumed),
                Decision::PerformInstead(synthetic) if !is_eof => {
                    let synthetic = self.synthesize(synthetic, &token)?;
                    return self.feed(synthetic, depth + 1);
                }
                Decision::PerformBefore(synthetic) | Decision::PerformInstead(synthetic) => {
                    let synthetic = self.synthesize(synthetic, &token)?;
                    if let Fed::Accepted(value) = self.feed(synthetic, depth + 1)? {
                        return Ok(Fed::Accepted(value));
                    }
                    return self.feed(token, depth + 1);
                }
                Decision::FoldAndReraise(_) => unreachable!("folded above"),
            }
        }

        // the lookahead of a canonical item set rejects tokens before the folds that lead to the
        // handlers of enclosing rules. Handlers that all passed end the chain.
        if consulted {
            return Err(self.syntax_error(&token));
        }
        if let Some(production) = self.forced_fold() {
            log::debug!(
                "folding {} to recover",
                parser.grammar.describe(production, usize::MAX)
            );
            self.fold(production, &token)?;
            return self.recover(token, depth);
        }

        Err(self.syntax_error(&token))
    }

    /// Default fold of the current state, when the default folds starting with it reach a state
    /// with error handlers. Only the state stack is walked, nothing is folded.
    fn forced_fold(&self) -> Option<ProductionId> {
        let table = &self.parser.table;
        let grammar = &self.parser.grammar;
        let first = table.default_fold(self.top())?;

        let mut states = self.states.clone();
        let mut production = first;
        loop {
            let folded = grammar.production(production);
            if states.len() <= folded.body.len() {
                return None;
            }
            states.truncate(states.len() - folded.body.len());

            let top = *states.last()?;
            let destination = table.goto(top, folded.head)?;
            if !table.error_bindings(destination).is_empty() {
                return Some(first);
            }

            states.push(destination);
            production = table.default_fold(destination)?;
        }
    }

    /// Turns a synthetic token into a token at the position of `original`.
    fn synthesize(&self, synthetic: Synthetic, original: &Token) -> ParseResult<Token> {
        let Synthetic { tag, text } = synthetic;

        match self.parser.grammar.find_terminal(&tag, &text) {
            Some(symbol) => Ok(Token {
                kind: Some(symbol),
                source: text,
                line: original.line,
                column: original.column,
                pos: (original.pos.0, original.pos.0),
            }),
            None => Err(SyntaxError {
                tag: tags::UNKNOWN.to_string(),
                text,
                line: original.line,
                column: original.column,
            }),
        }
    }

    fn syntax_error(&self, token: &Token) -> SyntaxError {
        SyntaxError {
            tag: self.parser.tag_of(token).to_string(),
            text: token.source.clone(),
            line: token.line,
            column: token.column,
        }
    }
}

/// Position right after `token`.
fn end_of(token: &Token) -> (usize, usize, usize) {
    let (line, column) = token
        .source
        .chars()
        .fold((token.line, token.column), |(line, column), c| match c {
            '\n' => (line + 1, 1),
            _ => (line, column + 1),
        });

    (line, column, token.pos.1)
}
