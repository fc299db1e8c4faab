//! Tags reserved by the engine. None of them can be used as the tag of a declaration.

/// Tokens that are dropped before they reach the parser.
pub const DISCARD: &str = "<discard>";
/// Lexemes that no token declaration matched.
pub const UNDEFINED: &str = "<undefined>";
/// Synthetic tokens whose tag is not declared in the grammar.
pub const UNKNOWN: &str = "<unknown>";
/// Keyword tokens, the keyword itself is the text of the token.
pub const KEYWORD: &str = "<keyword>";
/// End of input.
pub const EOF: &str = "<eof>";

pub const RESERVED: [&str; 5] = [DISCARD, UNDEFINED, UNKNOWN, KEYWORD, EOF];

pub fn is_reserved(tag: &str) -> bool {
    RESERVED.contains(&tag)
}
