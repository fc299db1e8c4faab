use dyn_clone::{clone_trait_object, DynClone};
use std::fmt;

#[cfg(test)]
use proptest_derive::Arbitrary;

// NOTE: This trait is needed because a boxed closure cannot be cloned on its own and rust does not
// allow implementing `Clone` for `Box<dyn Fn(char) -> bool>`.
pub trait ClassFn: Fn(char) -> bool + DynClone + Send + Sync {}

impl<F> ClassFn for F where F: Fn(char) -> bool + Clone + Send + Sync {}

clone_trait_object!(ClassFn);

/// Caller-supplied character class.
///
/// Classes are referenced from bracket expressions either by name (`[[:ident:]]`) or by their
/// position in the list they were declared with (`[[:0:]]`).
#[derive(Clone)]
pub struct CharClass {
    name: String,
    predicate: Box<dyn ClassFn>,
}

impl CharClass {
    /// Creates a new named [`CharClass`].
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(char) -> bool + Clone + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Name of the class as used in patterns.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `c` is an element of the class.
    pub fn contains(&self, c: char) -> bool {
        (self.predicate)(c)
    }
}

impl fmt::Debug for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CharClass").field(&self.name).finish()
    }
}

/// Shorthand character class (e.g., `.`, `\d`, `\W`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum ClassKind {
    Wildcard,
    Word,
    Whitespace,
    Digit,
    NonWord,
    NonDigit,
    NonWhitespace,
}

/// Character class usable by name inside a bracket expression (e.g., `[[:alpha:]_]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum NamedClass {
    Alnum,
    Alpha,
    Digit,
    XDigit,
    Space,
    Upper,
    Lower,
    Punct,
    Word,
    Any,
}

/// Label of a transition in a [`Machine`](super::Machine).
#[derive(Debug, Clone)]
pub enum Predicate {
    /// A single character.
    Char(char),
    /// An inclusive character range (e.g., `a-z`).
    Range(char, char),
    /// A shorthand class (e.g., `\d`).
    Class(ClassKind),
    /// A named class (e.g., `[:alpha:]`).
    Named(NamedClass),
    /// A caller-supplied class.
    Custom(CharClass),
    /// A bracket expression (e.g., `[^a-c_]`).
    Group {
        negated: bool,
        items: Vec<Predicate>,
    },
}

impl Predicate {
    /// Whether `c` is an element of the represented alphabet subset.
    pub fn contains(&self, c: char) -> bool {
        match self {
            Predicate::Char(m) => *m == c,
            Predicate::Range(begin, end) => (*begin..=*end).contains(&c),
            Predicate::Class(class) => class.contains(c),
            Predicate::Named(class) => class.contains(c),
            Predicate::Custom(class) => class.contains(c),
            // `negated` acts as a switch which is exactly what the XOR operation does.
            Predicate::Group { negated, items } => items.iter().any(|p| p.contains(c)) ^ negated,
        }
    }
}

impl ClassKind {
    /// Whether `c` is an element of the character class.
    pub fn contains(&self, c: char) -> bool {
        match *self {
            ClassKind::Wildcard => c != '\n',
            ClassKind::Word => c.is_alphanumeric() || c == '_',
            ClassKind::Whitespace => c.is_whitespace(),
            ClassKind::Digit => c.is_ascii_digit(),
            ClassKind::NonWord => !(c.is_alphanumeric() || c == '_'),
            ClassKind::NonDigit => !c.is_ascii_digit(),
            ClassKind::NonWhitespace => !c.is_whitespace(),
        }
    }
}

impl NamedClass {
    /// Looks up a built-in class by the name used in `[:name:]`.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "alnum" => NamedClass::Alnum,
            "alpha" => NamedClass::Alpha,
            "digit" => NamedClass::Digit,
            "xdigit" => NamedClass::XDigit,
            "space" => NamedClass::Space,
            "upper" => NamedClass::Upper,
            "lower" => NamedClass::Lower,
            "punct" => NamedClass::Punct,
            "word" => NamedClass::Word,
            "any" => NamedClass::Any,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            NamedClass::Alnum => "alnum",
            NamedClass::Alpha => "alpha",
            NamedClass::Digit => "digit",
            NamedClass::XDigit => "xdigit",
            NamedClass::Space => "space",
            NamedClass::Upper => "upper",
            NamedClass::Lower => "lower",
            NamedClass::Punct => "punct",
            NamedClass::Word => "word",
            NamedClass::Any => "any",
        }
    }

    /// Whether `c` is an element of the class.
    pub fn contains(&self, c: char) -> bool {
        match self {
            NamedClass::Alnum => c.is_alphanumeric(),
            NamedClass::Alpha => c.is_alphabetic(),
            NamedClass::Digit => c.is_ascii_digit(),
            NamedClass::XDigit => c.is_ascii_hexdigit(),
            NamedClass::Space => c.is_whitespace(),
            NamedClass::Upper => c.is_uppercase(),
            NamedClass::Lower => c.is_lowercase(),
            NamedClass::Punct => c.is_ascii_punctuation(),
            NamedClass::Word => c.is_alphanumeric() || c == '_',
            NamedClass::Any => true,
        }
    }
}

fn escape(c: char) -> String {
    match c {
        '\n' => r"\n".to_string(),
        '\t' => r"\t".to_string(),
        '\r' => r"\r".to_string(),
        '"' | '\\' | '[' | ']' | '-' | '^' => format!(r"\{}", c),
        c => c.to_string(),
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassKind::Wildcard => ".",
            ClassKind::Word => r"\w",
            ClassKind::Whitespace => r"\s",
            ClassKind::Digit => r"\d",
            ClassKind::NonWord => r"\W",
            ClassKind::NonDigit => r"\D",
            ClassKind::NonWhitespace => r"\S",
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Char(c) => write!(f, "{}", escape(*c)),
            Predicate::Range(begin, end) => write!(f, "{}-{}", escape(*begin), escape(*end)),
            Predicate::Class(class) => write!(f, "{}", class),
            Predicate::Named(class) => write!(f, "[:{}:]", class.name()),
            Predicate::Custom(class) => write!(f, "[:{}:]", class.name()),
            Predicate::Group { negated, items } => {
                write!(f, "[{}", if *negated { "^" } else { "" })?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}
