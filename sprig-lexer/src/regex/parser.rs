//! Regex recursive descent parser based on this grammar: <https://github.com/kean/Regex/blob/main/grammar.ebnf>

pub(crate) mod error;

use self::error::{PatternError, PatternErrorKind, PatternErrors, PatternResult};
use super::{
    ast::{Ast, ExprKind},
    tokenizer::{OperatorKind, QuantifierKind, QuantifierRangeKind, Token, TokenKind, Tokenizer},
    MAX_REPETITION,
};
use crate::fsm::{CharClass, NamedClass, Predicate};
use std::iter::Peekable;

/// Recursive descent regex parser.
///
/// Errors that do not break the structure of the expression (invalid escapes, unknown classes,
/// out of order ranges, ...) are collected and parsing continues, so all of them are reported at
/// once. A missing closing parenthesis or bracket ends parsing.
pub(crate) struct Parser<'a> {
    source: &'a str,
    /// Stream of tokens being parsed.
    tokens: Peekable<Tokenizer<'a>>,
    /// Caller-supplied classes that `[:name:]` references can resolve to.
    classes: &'a [CharClass],
    errors: Vec<PatternError>,
    /// End position of the last consumed token.
    cursor: usize,
}

type Step<T> = Result<T, PatternError>;

impl<'a> Parser<'a> {
    /// Creates a new regex parser from the `source`.
    pub(crate) fn new(source: &'a str, classes: &'a [CharClass]) -> Self {
        Self {
            source,
            tokens: Tokenizer::new(source).peekable(),
            classes,
            errors: Vec::new(),
            cursor: 0,
        }
    }

    /// Parses the `source` into a regex [`Ast`].
    pub(crate) fn parse(mut self) -> PatternResult<Ast> {
        let expr = match self.expression() {
            Ok(expr) => Some(expr),
            Err(err) => {
                self.errors.push(err);
                None
            }
        };

        // `expression` only stops early at a `)`
        if expr.is_some() {
            if let Some(Token { pos, .. }) = self.next_token() {
                self.error(PatternErrorKind::UnmatchedRightParen, pos);
            }
        }

        match expr {
            Some(expr) if self.errors.is_empty() => Ok(Ast(expr)),
            _ => Err(PatternErrors::new(self.source, self.errors)),
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.next()?;
        self.cursor = token.pos.1;
        Some(token)
    }

    fn peek_kind(&mut self) -> Option<&TokenKind> {
        self.tokens.peek().map(|t| &t.kind)
    }

    fn error(&mut self, kind: PatternErrorKind, pos: (usize, usize)) {
        self.errors.push(PatternError { kind, pos });
    }

    /// Rule: `expression ::= sub_expression (VERTICAL expression)?`
    fn expression(&mut self) -> Step<ExprKind> {
        let lhs = self.sub_expression()?;

        match self.peek_kind() {
            Some(TokenKind::Operator(OperatorKind::Vertical)) => {
                self.next_token();
                Ok(ExprKind::Alt(Box::new(lhs), Box::new(self.expression()?)))
            }
            _ => Ok(lhs),
        }
    }

    /// Rule: `sub_expression ::= sub_expression_item*`
    fn sub_expression(&mut self) -> Step<ExprKind> {
        let mut items = Vec::new();

        while !matches!(
            self.peek_kind(),
            Some(TokenKind::Operator(OperatorKind::Vertical | OperatorKind::RightParen)) | None
        ) {
            items.push(self.sub_expression_item()?);
        }

        Ok(match items.len() {
            0 => ExprKind::Empty,
            1 => items.remove(0),
            _ => ExprKind::Concat(items),
        })
    }

    /// Rule: `sub_expression_item ::= match | group`
    fn sub_expression_item(&mut self) -> Step<ExprKind> {
        match self.peek_kind() {
            Some(TokenKind::Operator(OperatorKind::LeftParen)) => self.group(),
            _ => self.match_(),
        }
    }

    /// Rule: `group ::= LEFT_PAREN expression RIGHT_PAREN QUANTIFIER?`
    fn group(&mut self) -> Step<ExprKind> {
        // LEFT_PAREN
        let open = self
            .next_token()
            .expect("group is only entered on a LEFT_PAREN");

        let expr = self.expression()?;

        // RIGHT_PAREN
        match self.next_token() {
            Some(Token {
                kind: TokenKind::Operator(OperatorKind::RightParen),
                ..
            }) => (),
            _ => {
                return Err(PatternError {
                    kind: PatternErrorKind::RightParen,
                    pos: (open.pos.0, self.cursor),
                })
            }
        }

        Ok(ExprKind::Group(Box::new(expr), self.quantifier()))
    }

    /// Rule: `match ::= match_item QUANTIFIER?`
    fn match_(&mut self) -> Step<ExprKind> {
        let Some(predicate) = self.match_item()? else {
            // the error is recorded already, the expression is discarded
            return Ok(ExprKind::Empty);
        };

        Ok(ExprKind::Lit(predicate, self.quantifier()))
    }

    /// Takes an optional quantifier. Decreasing ranges and bounds above [`MAX_REPETITION`] are
    /// recorded as errors.
    fn quantifier(&mut self) -> Option<QuantifierKind> {
        let Some(TokenKind::Quantifier(quantifier)) = self.peek_kind().cloned() else {
            return None;
        };
        let Token { pos, .. } = self.next_token()?;

        let bound = match quantifier {
            QuantifierKind::Range(QuantifierRangeKind::Range(left, right)) => {
                if right < left {
                    self.error(PatternErrorKind::QuantifierRange(left, right), pos);
                }
                left.max(right)
            }
            QuantifierKind::Range(
                QuantifierRangeKind::Exact(bound) | QuantifierRangeKind::Min(bound),
            ) => bound,
            _ => 0,
        };
        if bound > MAX_REPETITION {
            self.error(PatternErrorKind::RepetitionLimit(bound), pos);
        }

        Some(quantifier)
    }

    /// Rule: `match_item ::= CHARACTER_CLASS | CHARACTER | character_group`
    ///
    /// Returns `None` when the item was invalid and an error has been recorded.
    fn match_item(&mut self) -> Step<Option<Predicate>> {
        if let Some(TokenKind::Operator(OperatorKind::LeftBracket)) = self.peek_kind() {
            return self.character_group();
        }

        let Some(Token { kind, pos }) = self.next_token() else {
            unreachable!("match_item is only entered with tokens left");
        };

        Ok(match kind {
            TokenKind::Match(c) => Some(Predicate::Char(c)),
            TokenKind::Class(class) => Some(Predicate::Class(class)),
            TokenKind::Quantifier(_) => {
                self.error(PatternErrorKind::DanglingQuantifier, pos);
                None
            }
            TokenKind::Invalid(kind) => {
                self.error(kind, pos);
                None
            }

            kind => unreachable!("token `{:?}` cannot appear outside a character group", kind),
        })
    }

    /// Rule: `character_group ::= LEFT_BRACKET CARET? character_group_item+ RIGHT_BRACKET`
    fn character_group(&mut self) -> Step<Option<Predicate>> {
        // LEFT_BRACKET
        let open = self
            .next_token()
            .expect("character_group is only entered on a LEFT_BRACKET");

        // CARET?
        let negated = match self.peek_kind() {
            Some(TokenKind::Operator(OperatorKind::Caret)) => {
                self.next_token();
                true
            }
            _ => false,
        };

        // character_group_item+
        // a `]` directly after `[` or `[^` is a plain character, so the group is never empty
        let mut items = Vec::new();
        let mut valid = true;
        loop {
            match self.peek_kind() {
                Some(TokenKind::Operator(OperatorKind::RightBracket)) => break,
                None => {
                    return Err(PatternError {
                        kind: PatternErrorKind::RightBracket,
                        pos: (open.pos.0, self.cursor),
                    })
                }
                _ => match self.character_group_item() {
                    Some(item) => items.push(item),
                    None => valid = false,
                },
            }
        }

        // RIGHT_BRACKET
        self.next_token();

        Ok(valid.then_some(Predicate::Group { negated, items }))
    }

    /// Rule: `character_group_item ::= CHARACTER_CLASS | NAMED_CLASS | character_range |
    /// CHARACTER`
    fn character_group_item(&mut self) -> Option<Predicate> {
        let Token { kind, pos } = self.next_token()?;

        match kind {
            TokenKind::Class(class) => Some(Predicate::Class(class)),
            TokenKind::NamedClass(name) => {
                let class = self.resolve_class(&name);
                if class.is_none() {
                    self.error(PatternErrorKind::UnknownClass(name), pos);
                }
                class
            }
            TokenKind::Match(begin) => {
                if !matches!(
                    self.peek_kind(),
                    Some(TokenKind::Operator(OperatorKind::Minus))
                ) {
                    return Some(Predicate::Char(begin));
                }
                self.next_token();

                match self.next_token() {
                    Some(Token {
                        kind: TokenKind::Match(end),
                        ..
                    }) if end < begin => {
                        self.error(
                            PatternErrorKind::InvalidRange(begin, end),
                            (pos.0, self.cursor),
                        );
                        None
                    }
                    Some(Token {
                        kind: TokenKind::Match(end),
                        ..
                    }) => Some(Predicate::Range(begin, end)),
                    _ => {
                        self.error(PatternErrorKind::RangeBound, (pos.0, self.cursor));
                        None
                    }
                }
            }
            // a `-` following a range (e.g., `[a-c-e]`)
            TokenKind::Operator(OperatorKind::Minus) => Some(Predicate::Char('-')),
            TokenKind::Invalid(kind) => {
                self.error(kind, pos);
                None
            }

            kind => unreachable!("token `{:?}` cannot appear inside a character group", kind),
        }
    }

    /// Resolves a `[:name:]` reference. Built-in classes take precedence over caller-supplied
    /// ones, which are looked up by name first and by their index in the class list second.
    fn resolve_class(&self, name: &str) -> Option<Predicate> {
        if let Some(class) = NamedClass::from_name(name) {
            return Some(Predicate::Named(class));
        }

        self.classes
            .iter()
            .find(|class| class.name() == name)
            .or_else(|| {
                name.parse::<usize>()
                    .ok()
                    .and_then(|index| self.classes.get(index))
            })
            .map(|class| Predicate::Custom(class.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        error::{PatternError, PatternErrorKind},
        Parser,
    };
    use crate::{
        fsm::{CharClass, NamedClass, Predicate},
        regex::ast::ExprKind,
    };

    fn errors(source: &str) -> Vec<PatternError> {
        Parser::new(source, &[])
            .parse()
            .expect_err(source)
            .errors()
            .to_vec()
    }

    #[test]
    fn parse() {
        Parser::new(r"\w\d[q-z](0|4+)*.🙃#", &[]).parse().unwrap();
        Parser::new(r"a|", &[]).parse().unwrap();
        Parser::new(r"()", &[]).parse().unwrap();
        Parser::new(r"", &[]).parse().unwrap();
    }

    #[test]
    fn resolve_classes() {
        let classes = [
            CharClass::new("vowel", |c| "aeiou".contains(c)),
            CharClass::new("hash", |c| c == '#'),
        ];

        let ast = Parser::new("[[:alpha:][:vowel:][:1:]]", &classes)
            .parse()
            .unwrap();

        let ExprKind::Lit(Predicate::Group { negated, items }, None) = ast.0 else {
            panic!("expected a single character group");
        };
        assert!(!negated);
        assert!(matches!(items[0], Predicate::Named(NamedClass::Alpha)));
        assert!(matches!(&items[1], Predicate::Custom(class) if class.name() == "vowel"));
        assert!(matches!(&items[2], Predicate::Custom(class) if class.name() == "hash"));
    }

    #[test]
    fn unknown_class() {
        assert_eq!(
            errors("ab[[:nope:]]"),
            vec![PatternError {
                kind: PatternErrorKind::UnknownClass("nope".to_string()),
                pos: (3, 11),
            }]
        );
        assert_eq!(
            errors("[[:0:]]")[0].kind,
            PatternErrorKind::UnknownClass("0".to_string())
        );
    }

    #[test]
    fn collects_errors() {
        let errors = errors(r"\q[z-a]x{3,2}");
        let kinds = errors.into_iter().map(|e| e.kind).collect::<Vec<_>>();

        assert_eq!(
            kinds,
            [
                PatternErrorKind::InvalidEscape,
                PatternErrorKind::InvalidRange('z', 'a'),
                PatternErrorKind::QuantifierRange(3, 2),
            ]
        );
    }

    #[test]
    fn repetition_limit() {
        Parser::new("a{1024}b{3,1024}c{1024,}", &[]).parse().unwrap();
        assert_eq!(
            errors("a{4000000000}"),
            vec![PatternError {
                kind: PatternErrorKind::RepetitionLimit(4_000_000_000),
                pos: (1, 13),
            }]
        );
        assert_eq!(
            errors("a{2,1025}")[0].kind,
            PatternErrorKind::RepetitionLimit(1025)
        );
    }

    #[test]
    fn structural_errors() {
        assert_eq!(
            errors("(ab"),
            vec![PatternError {
                kind: PatternErrorKind::RightParen,
                pos: (0, 3),
            }]
        );
        assert_eq!(errors("ab)")[0].kind, PatternErrorKind::UnmatchedRightParen);
        assert_eq!(errors("[ab")[0].kind, PatternErrorKind::RightBracket);
        assert_eq!(errors("*a")[0].kind, PatternErrorKind::DanglingQuantifier);
        assert_eq!(errors("[^]")[0].kind, PatternErrorKind::RightBracket);
        assert_eq!(errors("[a-\\d]")[0].kind, PatternErrorKind::RangeBound);
    }
}
