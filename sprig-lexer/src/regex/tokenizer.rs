use super::parser::error::PatternErrorKind;
use crate::fsm::ClassKind;
use std::{
    iter::{Enumerate, Peekable},
    str::Chars,
};

/// Regex tokenizer.
///
/// The meaning of a character depends on whether it appears inside a bracket expression: `^`, `-`
/// and `]` are only operators inside one, while `.`, quantifiers and parentheses are plain
/// characters there.
pub(super) struct Tokenizer<'a> {
    /// Iterator over the characters in the input (as defined in the rust `char` type), along with
    /// their position in the input.
    iter: Peekable<Enumerate<Chars<'a>>>,
    /// Position one past the last consumed character.
    cursor: usize,
    group: GroupState,
}

/// Position of the tokenizer relative to a bracket expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupState {
    Outside,
    /// Directly after `[`, where `^` negates and `]` is a plain character.
    Opened,
    /// Directly after `[^`, where `]` is a plain character.
    Negated,
    Inside,
}

/// Regex token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Token {
    /// Information about the kind of token along with the value of the token. The value is
    /// already parsed (e.g. unicode escape sequences).
    pub(super) kind: TokenKind,
    /// Start and end position of the token in the input text. The end position is one further
    /// than the end of the current token.
    pub(super) pos: (usize, usize),
}

impl Token {
    /// Creates a new [`Token`].
    pub(super) fn new(kind: TokenKind, pos: (usize, usize)) -> Self {
        Self { kind, pos }
    }
}

/// Regex token kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum TokenKind {
    Class(ClassKind),
    /// Reference to a character class by name or index (e.g., `[:alpha:]`, `[:0:]`).
    NamedClass(String),
    Operator(OperatorKind),
    Quantifier(QuantifierKind),
    Match(char),
    Invalid(PatternErrorKind),
}

/// Regex operator kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum OperatorKind {
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Caret,
    Vertical,
    Minus,
}

/// Regex quantifier kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum QuantifierKind {
    Asterisk,
    Plus,
    QuestionMark,
    Range(QuantifierRangeKind),
}

/// Regex quantifier range kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum QuantifierRangeKind {
    /// `{n}`
    Exact(u32),
    /// `{n,}`
    Min(u32),
    /// `{n,m}`
    Range(u32, u32),
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.cursor;
        let ch = self.bump()?;

        let kind = match self.group {
            GroupState::Outside => self.outside_group(ch),
            _ => self.inside_group(ch),
        };

        Some(Token::new(kind, (start, self.cursor)))
    }
}

impl<'a> Tokenizer<'a> {
    /// Creates a new tokenizer.
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            iter: input.chars().enumerate().peekable(),
            cursor: 0,
            group: GroupState::Outside,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let (pos, ch) = self.iter.next()?;
        self.cursor = pos + 1;
        Some(ch)
    }

    /// Consumes the next character only if it equals `expected`.
    fn bump_if(&mut self, expected: char) -> bool {
        self.bump_matching(|c| c == expected).is_some()
    }

    fn bump_matching(&mut self, f: impl Fn(char) -> bool) -> Option<char> {
        let (pos, ch) = self.iter.next_if(|(_, c)| f(*c))?;
        self.cursor = pos + 1;
        Some(ch)
    }

    fn outside_group(&mut self, ch: char) -> TokenKind {
        match ch {
            '\\' => self.class_or_escape_sequence(),
            '.' => TokenKind::Class(ClassKind::Wildcard),
            '[' => {
                self.group = GroupState::Opened;
                TokenKind::Operator(OperatorKind::LeftBracket)
            }
            '(' => TokenKind::Operator(OperatorKind::LeftParen),
            ')' => TokenKind::Operator(OperatorKind::RightParen),
            '|' => TokenKind::Operator(OperatorKind::Vertical),
            '*' | '+' | '?' | '{' => self.quantifier(ch),

            c => TokenKind::Match(c),
        }
    }

    fn inside_group(&mut self, ch: char) -> TokenKind {
        let state = std::mem::replace(&mut self.group, GroupState::Inside);

        match ch {
            '^' if state == GroupState::Opened => {
                self.group = GroupState::Negated;
                TokenKind::Operator(OperatorKind::Caret)
            }
            ']' if state == GroupState::Inside => {
                self.group = GroupState::Outside;
                TokenKind::Operator(OperatorKind::RightBracket)
            }
            // a trailing `-` (e.g., `[a-]`) is a plain character
            '-' if state == GroupState::Inside
                && self.iter.peek().map_or(false, |(_, c)| *c != ']') =>
            {
                TokenKind::Operator(OperatorKind::Minus)
            }
            '[' if self.bump_if(':') => self.class_reference(),
            '\\' => self.class_or_escape_sequence(),

            c => TokenKind::Match(c),
        }
    }

    /// Takes the name of a `[:name:]` reference, the `[:` being consumed already.
    fn class_reference(&mut self) -> TokenKind {
        let mut name = String::new();

        while let Some(ch) = self.bump() {
            if ch == ':' && self.bump_if(']') {
                return TokenKind::NamedClass(name);
            }
            name.push(ch);
        }

        TokenKind::Invalid(PatternErrorKind::UnterminatedClass)
    }

    fn quantifier(&mut self, ch: char) -> TokenKind {
        let quantifier_kind = match ch {
            '*' => QuantifierKind::Asterisk,
            '+' => QuantifierKind::Plus,
            '?' => QuantifierKind::QuestionMark,
            '{' => match self.range_quantifier() {
                Some(range) => QuantifierKind::Range(range),
                None => return TokenKind::Invalid(PatternErrorKind::MalformedQuantifier),
            },

            _ => unreachable!("unhandled quantifier start character (`{}`)", ch),
        };

        TokenKind::Quantifier(quantifier_kind)
    }

    /// Takes the rest of a range quantifier, the opening `{` being consumed already.
    fn range_quantifier(&mut self) -> Option<QuantifierRangeKind> {
        let left = self.decimal()?;

        if self.bump_if('}') {
            return Some(QuantifierRangeKind::Exact(left));
        }
        if !self.bump_if(',') {
            return None;
        }
        if self.bump_if('}') {
            return Some(QuantifierRangeKind::Min(left));
        }

        let right = self.decimal()?;
        self.bump_if('}')
            .then_some(QuantifierRangeKind::Range(left, right))
    }

    fn class_or_escape_sequence(&mut self) -> TokenKind {
        let Some(ch) = self.bump() else {
            // the last character of the input was a `\`
            return TokenKind::Invalid(PatternErrorKind::InvalidEscape);
        };

        let escaped = match ch {
            'w' => return TokenKind::Class(ClassKind::Word),
            'W' => return TokenKind::Class(ClassKind::NonWord),
            'd' => return TokenKind::Class(ClassKind::Digit),
            'D' => return TokenKind::Class(ClassKind::NonDigit),
            's' => return TokenKind::Class(ClassKind::Whitespace),
            'S' => return TokenKind::Class(ClassKind::NonWhitespace),

            'f' => Some('\u{c}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{b}'),
            '0' => Some('\0'),
            // `\cX` is the control character with the code point of `X` modulo 32
            'c' => self
                .bump_matching(|c| c.is_ascii_alphabetic())
                .and_then(|c| char::from_u32(c as u32 % 32)),
            'x' => self.hexadecimal(2, 2),
            'u' if self.bump_if('{') => self
                .hexadecimal(1, 6)
                .filter(|_| self.bump_if('}')),
            'u' => self.hexadecimal(4, 4),

            c if !c.is_alphanumeric() => Some(c),
            _ => None,
        };

        escaped.map_or(
            TokenKind::Invalid(PatternErrorKind::InvalidEscape),
            TokenKind::Match,
        )
    }

    /// Takes between `min` and `max` hexadecimal digits and converts them to a character.
    fn hexadecimal(&mut self, min: usize, max: usize) -> Option<char> {
        let (count, value) = self.take_digits(16, max);
        if count < min {
            return None;
        }

        char::from_u32(value?)
    }

    /// Takes a non-empty sequence of decimal digits. Overflowing the `u32` results in `None`.
    fn decimal(&mut self) -> Option<u32> {
        match self.take_digits(10, usize::MAX) {
            (0, _) => None,
            (_, value) => value,
        }
    }

    /// Takes at most `max` digits of `radix` and returns the amount of digits taken along with
    /// their value, which is `None` when it does not fit in a `u32`.
    fn take_digits(&mut self, radix: u32, max: usize) -> (usize, Option<u32>) {
        let mut count = 0;
        let mut value = Some(0u32);

        while count < max {
            let Some(digit) = self
                .bump_matching(|c| c.is_digit(radix))
                .and_then(|c| c.to_digit(radix))
            else {
                break;
            };

            count += 1;
            value = value.and_then(|v| v.checked_mul(radix)?.checked_add(digit));
        }

        (count, value)
    }
}
