use super::{
    element::{Element, Repetition, Requirement},
    error::DeclarationError,
    FoldKind, Grammar, HelperKind, HelperOrigin, ProductionId, RuleId, RuleInfo, Shape,
    SymbolTable,
};
use crate::Symbol;

/// Folding ban that can only be resolved once FIRST is known: `production` must not be folded on
/// any lookahead that can start `group`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GreedyRule {
    pub(crate) production: ProductionId,
    pub(crate) group: Vec<Symbol>,
}

/// Lowers sugared rules into primitive productions of a [`Grammar`].
pub(crate) struct Desugarer<'g> {
    grammar: &'g mut Grammar,
    symbols: &'g SymbolTable,
    greedy: Vec<GreedyRule>,
}

impl<'g> Desugarer<'g> {
    pub(crate) fn new(grammar: &'g mut Grammar, symbols: &'g SymbolTable) -> Self {
        Self {
            grammar,
            symbols,
            greedy: Vec::new(),
        }
    }

    pub(crate) fn into_greedy_rules(self) -> Vec<GreedyRule> {
        self.greedy
    }

    /// Lowers the rule `tag := elements` with the head `head`. Returns the rule and the production
    /// it is folded by.
    pub(crate) fn desugar(
        &mut self,
        tag: &str,
        head: Symbol,
        elements: &[Element],
    ) -> Result<(RuleId, ProductionId), DeclarationError> {
        validate(tag, elements)?;

        let rule = self.grammar.add_rule(RuleInfo {
            tag: tag.to_string(),
            params: elements.iter().map(Element::display_name).collect(),
            shapes: Vec::new(),
        });

        let mut body = Vec::new();
        let mut shapes = Vec::new();
        let mut start = 0;

        while start < elements.len() {
            let element = &elements[start];
            // the group runs up to the next element that is not together with it
            let end = elements[start + 1..]
                .iter()
                .position(|e| e.repetition != Repetition::Together)
                .map_or(elements.len(), |offset| start + 1 + offset);

            let origin = |kind| HelperOrigin {
                rule,
                element: start,
                kind,
            };

            match element.repetition {
                Repetition::Single | Repetition::Together => {
                    body.push(self.requirement(rule, start, element)?);
                    shapes.push(Shape::Single);
                }
                Repetition::Optional => {
                    let group = self.group(rule, start, &elements[start..end])?;
                    let helper = self.grammar.add_helper(origin(HelperKind::Optional));

                    let empty = self
                        .grammar
                        .add_production(helper, Vec::new(), FoldKind::Group);
                    self.grammar
                        .add_production(helper, group.clone(), FoldKind::Group);

                    if element.greedy {
                        self.greedy.push(GreedyRule {
                            production: empty,
                            group,
                        });
                    }

                    body.push(helper);
                    shapes.push(Shape::Optional(end - start));
                }
                Repetition::Many { can_be_empty } => {
                    let group = self.group(rule, start, &elements[start..end])?;
                    let kind = match can_be_empty {
                        true => HelperKind::Many,
                        false => HelperKind::Many1,
                    };
                    let helper = self.grammar.add_helper(origin(kind));

                    let base = self.grammar.add_production(
                        helper,
                        match can_be_empty {
                            true => Vec::new(),
                            false => group.clone(),
                        },
                        FoldKind::Group,
                    );

                    if element.greedy {
                        // right recursion keeps the decision to continue in front of the group,
                        // where a ban on the base case can make it
                        let recursive = group.iter().copied().chain([helper]).collect();
                        self.grammar
                            .add_production(helper, recursive, FoldKind::Prepend);
                        self.greedy.push(GreedyRule {
                            production: base,
                            group,
                        });
                    } else {
                        let recursive = std::iter::once(helper).chain(group).collect();
                        self.grammar
                            .add_production(helper, recursive, FoldKind::Extend);
                    }

                    body.push(helper);
                    shapes.push(Shape::Many(end - start));
                }
            }

            start = match element.repetition {
                Repetition::Optional | Repetition::Many { .. } => end,
                Repetition::Single | Repetition::Together => start + 1,
            };
        }

        self.grammar.rules[rule].shapes = shapes;
        let production = self
            .grammar
            .add_production(head, body, FoldKind::Rule(rule));

        Ok((rule, production))
    }

    fn group(
        &mut self,
        rule: RuleId,
        start: usize,
        elements: &[Element],
    ) -> Result<Vec<Symbol>, DeclarationError> {
        elements
            .iter()
            .enumerate()
            .map(|(offset, element)| self.requirement(rule, start + offset, element))
            .collect()
    }

    /// Symbol standing for the requirement of `element`. More than one alternative is lowered
    /// into a helper with one production per alternative.
    fn requirement(
        &mut self,
        rule: RuleId,
        index: usize,
        element: &Element,
    ) -> Result<Symbol, DeclarationError> {
        let mut alternatives = match &element.requirement {
            Requirement::Tags(tags) => tags
                .iter()
                .map(|tag| {
                    self.symbols
                        .tags
                        .get(tag)
                        .copied()
                        .ok_or_else(|| DeclarationError::UnknownTag {
                            rule: self.grammar.rules[rule].tag.clone(),
                            tag: tag.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Requirement::Keywords(keywords) => keywords
                .iter()
                .map(|keyword| {
                    *self
                        .symbols
                        .keywords
                        .get(keyword)
                        .expect("keywords of rules are declared before lowering")
                })
                .collect(),
        };

        let mut seen = std::collections::BTreeSet::new();
        alternatives.retain(|s| seen.insert(*s));

        match alternatives[..] {
            [symbol] => Ok(symbol),
            _ => {
                let helper = self.grammar.add_helper(HelperOrigin {
                    rule,
                    element: index,
                    kind: HelperKind::Alternatives,
                });
                for symbol in alternatives {
                    self.grammar
                        .add_production(helper, vec![symbol], FoldKind::Pass);
                }

                Ok(helper)
            }
        }
    }
}

fn validate(tag: &str, elements: &[Element]) -> Result<(), DeclarationError> {
    let mut in_group = false;

    for (index, element) in elements.iter().enumerate() {
        let empty = match &element.requirement {
            Requirement::Tags(tags) => tags.is_empty(),
            Requirement::Keywords(keywords) => keywords.is_empty(),
        };
        if empty {
            return Err(DeclarationError::EmptyRequirement {
                rule: tag.to_string(),
                element: index,
            });
        }

        match element.repetition {
            Repetition::Together if !in_group => {
                return Err(DeclarationError::DanglingTogether {
                    rule: tag.to_string(),
                    element: index,
                })
            }
            Repetition::Single | Repetition::Together if element.greedy => {
                return Err(DeclarationError::GreedyPlain {
                    rule: tag.to_string(),
                    element: index,
                })
            }
            Repetition::Single => in_group = false,
            Repetition::Optional | Repetition::Many { .. } => in_group = true,
            Repetition::Together => (),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Desugarer, GreedyRule};
    use crate::{
        grammar::{
            element::Element, error::DeclarationError, FoldKind, Grammar, HelperKind, Shape,
            SymbolTable, Terminal,
        },
        Symbol,
    };

    const ID: Symbol = Symbol::terminal(1);
    const SEMI: Symbol = Symbol::terminal(2);
    const COMMA: Symbol = Symbol::terminal(3);
    const STMT: Symbol = Symbol::nonterminal(1);

    fn setup() -> (Grammar, SymbolTable) {
        let grammar = Grammar::new(
            vec![
                Terminal::Eof,
                Terminal::Token("id".to_string()),
                Terminal::Keyword(";".to_string()),
                Terminal::Keyword(",".to_string()),
            ],
            vec!["stmt".to_string()],
            STMT,
        );
        let mut symbols = SymbolTable::default();
        symbols.tags.insert("id".to_string(), ID);
        symbols.tags.insert("stmt".to_string(), STMT);
        symbols.keywords.insert(";".to_string(), SEMI);
        symbols.keywords.insert(",".to_string(), COMMA);

        (grammar, symbols)
    }

    fn bodies(grammar: &Grammar, head: Symbol) -> Vec<(Vec<Symbol>, FoldKind)> {
        grammar
            .productions_of(head)
            .iter()
            .map(|p| {
                let production = grammar.production(*p);
                (production.body.clone(), production.fold)
            })
            .collect()
    }

    #[test]
    fn plain() {
        let (mut grammar, symbols) = setup();
        let (rule, production) = Desugarer::new(&mut grammar, &symbols)
            .desugar("stmt", STMT, &[Element::tag("id"), Element::keyword(";")])
            .unwrap();

        assert_eq!(grammar.production(production).body, vec![ID, SEMI]);
        assert_eq!(grammar.rule(rule).shapes, vec![Shape::Single, Shape::Single]);
        assert_eq!(grammar.helper_count(), 0);
    }

    #[test]
    fn alternatives() {
        let (mut grammar, symbols) = setup();
        let (_, production) = Desugarer::new(&mut grammar, &symbols)
            .desugar("stmt", STMT, &[Element::keywords([";", ",", ";"])])
            .unwrap();

        let helper = grammar.production(production).body[0];
        assert_eq!(
            grammar.helper(helper).unwrap().origin.kind,
            HelperKind::Alternatives
        );
        assert_eq!(
            bodies(&grammar, helper),
            vec![(vec![SEMI], FoldKind::Pass), (vec![COMMA], FoldKind::Pass)]
        );
    }

    #[test]
    fn optional_group() {
        let (mut grammar, symbols) = setup();
        let (rule, production) = Desugarer::new(&mut grammar, &symbols)
            .desugar(
                "stmt",
                STMT,
                &[
                    Element::tag("id"),
                    Element::keyword(",").optional(),
                    Element::tag("id").together(),
                ],
            )
            .unwrap();

        let body = &grammar.production(production).body;
        assert_eq!(body.len(), 2);
        assert_eq!(grammar.rule(rule).shapes, vec![Shape::Single, Shape::Optional(2)]);
        assert_eq!(
            bodies(&grammar, body[1]),
            vec![
                (vec![], FoldKind::Group),
                (vec![COMMA, ID], FoldKind::Group)
            ]
        );
    }

    #[test]
    fn many() {
        let (mut grammar, symbols) = setup();
        let (rule, production) = Desugarer::new(&mut grammar, &symbols)
            .desugar(
                "stmt",
                STMT,
                &[Element::tag("id").many1(), Element::keyword(";").together()],
            )
            .unwrap();

        let helper = grammar.production(production).body[0];
        assert_eq!(grammar.rule(rule).shapes, vec![Shape::Many(2)]);
        assert_eq!(
            bodies(&grammar, helper),
            vec![
                (vec![ID, SEMI], FoldKind::Group),
                (vec![helper, ID, SEMI], FoldKind::Extend)
            ]
        );
    }

    #[test]
    fn greedy_many() {
        let (mut grammar, symbols) = setup();
        let mut desugarer = Desugarer::new(&mut grammar, &symbols);
        let (_, production) = desugarer
            .desugar("stmt", STMT, &[Element::tag("id").many().greedy()])
            .unwrap();
        let greedy = desugarer.into_greedy_rules();

        let helper = grammar.production(production).body[0];
        let base = grammar.productions_of(helper)[0];
        assert_eq!(
            bodies(&grammar, helper),
            vec![
                (vec![], FoldKind::Group),
                (vec![ID, helper], FoldKind::Prepend)
            ]
        );
        assert_eq!(
            greedy,
            vec![GreedyRule {
                production: base,
                group: vec![ID]
            }]
        );
    }

    #[test]
    fn errors() {
        let (mut grammar, symbols) = setup();
        let mut desugarer = Desugarer::new(&mut grammar, &symbols);

        assert_eq!(
            desugarer.desugar("stmt", STMT, &[Element::tag("expr")]),
            Err(DeclarationError::UnknownTag {
                rule: "stmt".to_string(),
                tag: "expr".to_string()
            })
        );
        assert_eq!(
            desugarer.desugar("stmt", STMT, &[Element::tag("id"), Element::tag("id").together()]),
            Err(DeclarationError::DanglingTogether {
                rule: "stmt".to_string(),
                element: 1
            })
        );
        assert_eq!(
            desugarer.desugar("stmt", STMT, &[Element::tag("id").greedy()]),
            Err(DeclarationError::GreedyPlain {
                rule: "stmt".to_string(),
                element: 0
            })
        );
        assert_eq!(
            desugarer.desugar("stmt", STMT, &[Element::tags(Vec::<String>::new())]),
            Err(DeclarationError::EmptyRequirement {
                rule: "stmt".to_string(),
                element: 0
            })
        );
    }
}
