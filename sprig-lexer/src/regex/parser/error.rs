use std::fmt;

/// Whether compiling a pattern succeeded.
pub type PatternResult<T> = core::result::Result<T, PatternErrors>;

/// All errors found in a single pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternErrors {
    source: String,
    errors: Vec<PatternError>,
}

/// Information about an error in a pattern. `pos` is the range of characters (not bytes) of the
/// offending construct, the end being exclusive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[ERROR] ({}, {}): {}", .pos.0, .pos.1, .kind)]
pub struct PatternError {
    pub kind: PatternErrorKind,
    pub pos: (usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternErrorKind {
    #[error("expected RIGHT_PAREN")]
    RightParen,
    #[error("unmatched RIGHT_PAREN")]
    UnmatchedRightParen,
    #[error("expected RIGHT_BRACKET")]
    RightBracket,
    #[error("expected CHARACTER as the end of a character range")]
    RangeBound,
    #[error("character range `{0}-{1}` is out of order")]
    InvalidRange(char, char),
    #[error("expected an expression before the quantifier")]
    DanglingQuantifier,
    #[error("malformed range quantifier")]
    MalformedQuantifier,
    #[error("quantifier range {{{0},{1}}} is decreasing")]
    QuantifierRange(u32, u32),
    #[error("quantifier bound {0} is larger than {max}", max = crate::regex::MAX_REPETITION)]
    RepetitionLimit(u32),
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("unterminated character class reference")]
    UnterminatedClass,
    #[error("unknown character class `{0}`")]
    UnknownClass(String),
}

impl PatternErrors {
    pub(crate) fn new(source: impl Into<String>, errors: Vec<PatternError>) -> Self {
        Self {
            source: source.into(),
            errors,
        }
    }

    /// The pattern the errors were found in.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn errors(&self) -> &[PatternError] {
        &self.errors
    }
}

impl fmt::Display for PatternErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "invalid pattern `{}`", self.source)?;
        for err in self.errors.iter() {
            writeln!(f, "{}", err)?;
        }

        Ok(())
    }
}

impl std::error::Error for PatternErrors {}

#[cfg(test)]
mod tests {
    use super::{PatternError, PatternErrorKind, PatternErrors};

    #[test]
    fn render_errors() {
        let errors = PatternErrors::new(
            "[b-a",
            vec![
                PatternError {
                    kind: PatternErrorKind::InvalidRange('b', 'a'),
                    pos: (1, 4),
                },
                PatternError {
                    kind: PatternErrorKind::RightBracket,
                    pos: (3, 4),
                },
            ],
        );

        assert_eq!(
            errors.to_string(),
            "invalid pattern `[b-a`\n\
             [ERROR] (1, 4): character range `b-a` is out of order\n\
             [ERROR] (3, 4): expected RIGHT_BRACKET\n"
        );
    }
}
