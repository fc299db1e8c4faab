/// Symbols an [`Element`] accepts. Exactly one of them is required at the element's position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Tags(Vec<String>),
    Keywords(Vec<String>),
}

/// How often an [`Element`] (or the group it starts) appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    Single,
    Optional,
    Many { can_be_empty: bool },
    /// Belongs to the group of the closest preceding optional or repeated element.
    Together,
}

/// Element of a rule body.
///
/// Elements are built from a requirement and refined with modifiers:
///
/// ```
/// use sprig_parser::Element;
///
/// // `{` (stmt ";")* `}`
/// let body = [
///     Element::keyword("{"),
///     Element::tag("stmt").many().named("statements"),
///     Element::keyword(";").together(),
///     Element::keyword("}"),
/// ];
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub(crate) requirement: Requirement,
    pub(crate) repetition: Repetition,
    pub(crate) greedy: bool,
    pub(crate) name: Option<String>,
}

impl Element {
    fn new(requirement: Requirement) -> Self {
        Self {
            requirement,
            repetition: Repetition::Single,
            greedy: false,
            name: None,
        }
    }

    /// Requires a token or a rule tagged `tag`.
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::new(Requirement::Tags(vec![tag.into()]))
    }

    /// Requires one of `tags`.
    pub fn tags<S: Into<String>>(tags: impl IntoIterator<Item = S>) -> Self {
        Self::new(Requirement::Tags(tags.into_iter().map(Into::into).collect()))
    }

    /// Requires the keyword `keyword`. Keywords are declared implicitly.
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self::new(Requirement::Keywords(vec![keyword.into()]))
    }

    /// Requires one of `keywords`.
    pub fn keywords<S: Into<String>>(keywords: impl IntoIterator<Item = S>) -> Self {
        Self::new(Requirement::Keywords(
            keywords.into_iter().map(Into::into).collect(),
        ))
    }

    /// The element (and the elements [`together`](Element::together) with it) may be absent.
    pub fn optional(mut self) -> Self {
        self.repetition = Repetition::Optional;
        self
    }

    /// The element (and the elements [`together`](Element::together) with it) is repeated zero or
    /// more times.
    pub fn many(mut self) -> Self {
        self.repetition = Repetition::Many { can_be_empty: true };
        self
    }

    /// The element (and the elements [`together`](Element::together) with it) is repeated at
    /// least once.
    pub fn many1(mut self) -> Self {
        self.repetition = Repetition::Many {
            can_be_empty: false,
        };
        self
    }

    /// Joins the group of the preceding optional or repeated element.
    pub fn together(mut self) -> Self {
        self.repetition = Repetition::Together;
        self
    }

    /// Prefers taking the group over leaving it out whenever both are possible.
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    /// Names the parameter in diagnostics.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name of the parameter, defaults to the requirement.
    pub(crate) fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }

        match &self.requirement {
            Requirement::Tags(tags) => tags.join("|"),
            Requirement::Keywords(keywords) => keywords
                .iter()
                .map(|k| format!("{:?}", k))
                .collect::<Vec<_>>()
                .join("|"),
        }
    }
}
