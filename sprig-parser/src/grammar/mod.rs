pub use self::{
    builder::GrammarBuilder,
    element::{Element, Repetition, Requirement},
    error::{BuildError, BuildResult, DeclarationError},
    operator::{Assoc, Fix},
};

use crate::{tags, Symbol};
use std::collections::{BTreeSet, HashMap};

mod builder;
mod desugar;
mod element;
mod error;
mod operator;

pub type RuleId = usize;
pub type ProductionId = usize;

/// Primitive context-free grammar the sugared declarations are lowered to.
///
/// Production `0` is always the augmented start production `ACCEPT -> start`.
#[derive(Debug, Clone)]
pub struct Grammar {
    terminals: Vec<Terminal>,
    nonterminals: Vec<Nonterminal>,
    productions: Vec<Production>,
    rules: Vec<RuleInfo>,
    /// Productions per nonterminal index.
    by_head: Vec<Vec<ProductionId>>,
    start: Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    Eof,
    Token(String),
    /// Never produced by the lexer, only by error recovery.
    Fictive(String),
    Keyword(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nonterminal {
    Accept,
    Tag(String),
    Helper(Helper),
}

/// Synthetic nonterminal introduced while desugaring a single element of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Helper {
    pub id: HelperId,
    pub origin: HelperOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HelperId(pub usize);

/// The sugar a [`Helper`] was generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelperOrigin {
    pub rule: RuleId,
    pub element: usize,
    pub kind: HelperKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperKind {
    Alternatives,
    Optional,
    Many,
    Many1,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub head: Symbol,
    pub body: Vec<Symbol>,
    pub fold: FoldKind,
    /// Lookaheads on which the production must not be folded.
    pub folding_bans: BTreeSet<Symbol>,
    /// Lookaheads on which a state holding the completed production must not shift.
    pub carry_bans: BTreeSet<Symbol>,
}

/// What folding a [`Production`] does with the popped slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldKind {
    Accept,
    /// Hands the slots to the handler of the rule.
    Rule(RuleId),
    /// Passes the single slot on unchanged.
    Pass,
    /// Collects the slots into a group.
    Group,
    /// The first slot is a group, the remaining slots are appended to it.
    Extend,
    /// The last slot is a group, the remaining slots are prepended to it.
    Prepend,
}

/// Declared rule a [`FoldKind::Rule`] production belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInfo {
    pub tag: String,
    /// Parameter names, one per element.
    pub params: Vec<String>,
    /// Layout of the production body, one per body symbol.
    pub shapes: Vec<Shape>,
}

/// How the slot at a body position expands into handler parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Single,
    /// An optional group of the given amount of elements.
    Optional(usize),
    /// A repeated group of the given amount of elements.
    Many(usize),
}

impl Shape {
    /// Amount of parameters the shape expands into.
    pub fn width(self) -> usize {
        match self {
            Shape::Single => 1,
            Shape::Optional(divisor) | Shape::Many(divisor) => divisor,
        }
    }
}

impl Grammar {
    pub(crate) fn new(terminals: Vec<Terminal>, tags: Vec<String>, start: Symbol) -> Self {
        let nonterminals = std::iter::once(Nonterminal::Accept)
            .chain(tags.into_iter().map(Nonterminal::Tag))
            .collect::<Vec<_>>();

        let mut grammar = Self {
            terminals,
            by_head: vec![Vec::new(); nonterminals.len()],
            nonterminals,
            productions: Vec::new(),
            rules: Vec::new(),
            start,
        };
        grammar.add_production(Symbol::ACCEPT, vec![start], FoldKind::Accept);

        grammar
    }

    pub(crate) fn add_rule(&mut self, info: RuleInfo) -> RuleId {
        self.rules.push(info);
        self.rules.len() - 1
    }

    pub(crate) fn add_helper(&mut self, origin: HelperOrigin) -> Symbol {
        let id = HelperId(self.helper_count());
        self.nonterminals
            .push(Nonterminal::Helper(Helper { id, origin }));
        self.by_head.push(Vec::new());

        Symbol::nonterminal(self.nonterminals.len() - 1)
    }

    pub(crate) fn add_production(
        &mut self,
        head: Symbol,
        body: Vec<Symbol>,
        fold: FoldKind,
    ) -> ProductionId {
        debug_assert!(head.is_nonterminal(), "productions have nonterminal heads");

        let id = self.productions.len();
        self.productions.push(Production {
            head,
            body,
            fold,
            folding_bans: BTreeSet::new(),
            carry_bans: BTreeSet::new(),
        });
        self.by_head[head.index()].push(id);

        id
    }

    pub(crate) fn production_mut(&mut self, id: ProductionId) -> &mut Production {
        &mut self.productions[id]
    }

    pub fn start(&self) -> Symbol {
        self.start
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    pub fn nonterminal_count(&self) -> usize {
        self.nonterminals.len()
    }

    pub fn helper_count(&self) -> usize {
        self.nonterminals
            .iter()
            .filter(|n| matches!(n, Nonterminal::Helper(_)))
            .count()
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id]
    }

    /// Productions with `head` as their head.
    pub fn productions_of(&self, head: Symbol) -> &[ProductionId] {
        debug_assert!(head.is_nonterminal());
        &self.by_head[head.index()]
    }

    pub fn rule(&self, id: RuleId) -> &RuleInfo {
        &self.rules[id]
    }

    pub fn terminal(&self, symbol: Symbol) -> &Terminal {
        &self.terminals[symbol.index()]
    }

    pub fn nonterminal(&self, symbol: Symbol) -> &Nonterminal {
        &self.nonterminals[symbol.index()]
    }

    pub fn helper(&self, symbol: Symbol) -> Option<&Helper> {
        match symbol.is_nonterminal() {
            true => match self.nonterminal(symbol) {
                Nonterminal::Helper(helper) => Some(helper),
                _ => None,
            },
            false => None,
        }
    }

    /// Tag a token of kind `symbol` reports. Keywords report [`tags::KEYWORD`].
    pub fn terminal_tag(&self, symbol: Symbol) -> &str {
        match self.terminal(symbol) {
            Terminal::Eof => tags::EOF,
            Terminal::Token(tag) | Terminal::Fictive(tag) => tag,
            Terminal::Keyword(_) => tags::KEYWORD,
        }
    }

    /// Finds the terminal of a token reported as `tag` with source `text`.
    pub fn find_terminal(&self, tag: &str, text: &str) -> Option<Symbol> {
        let index = self.terminals.iter().position(|t| match t {
            Terminal::Eof => tag == tags::EOF,
            Terminal::Token(t) | Terminal::Fictive(t) => t == tag,
            Terminal::Keyword(k) => tag == tags::KEYWORD && k == text,
        })?;

        Some(Symbol::terminal(index))
    }

    /// Finds the nonterminal of a declared rule tag.
    pub fn find_tag(&self, tag: &str) -> Option<Symbol> {
        self.nonterminals
            .iter()
            .position(|n| matches!(n, Nonterminal::Tag(t) if t == tag))
            .map(Symbol::nonterminal)
    }

    /// Human readable name of `symbol`. Helpers are named after the element they stand for.
    pub fn name(&self, symbol: Symbol) -> String {
        if symbol.is_terminal() {
            return match self.terminal(symbol) {
                Terminal::Eof => tags::EOF.to_string(),
                Terminal::Token(tag) | Terminal::Fictive(tag) => tag.clone(),
                Terminal::Keyword(keyword) => format!("{:?}", keyword),
            };
        }

        match self.nonterminal(symbol) {
            Nonterminal::Accept => "<accept>".to_string(),
            Nonterminal::Tag(tag) => tag.clone(),
            Nonterminal::Helper(Helper { origin, .. }) => {
                let param = &self.rules[origin.rule].params[origin.element];
                match origin.kind {
                    HelperKind::Alternatives => format!("({})", param),
                    HelperKind::Optional => format!("{}?", param),
                    HelperKind::Many => format!("{}*", param),
                    HelperKind::Many1 => format!("{}+", param),
                }
            }
        }
    }

    /// Renders the item `production` with the dot at `dot`, e.g. `expr := expr • "+" expr`.
    ///
    /// Rule productions are rendered with the parameter names of the rule, helper productions
    /// mention the rule and element they belong to.
    pub fn describe(&self, production: ProductionId, dot: usize) -> String {
        let Production { head, body, fold, .. } = &self.productions[production];

        let names = match fold {
            FoldKind::Rule(rule) => {
                let RuleInfo { params, shapes, .. } = &self.rules[*rule];
                shapes
                    .iter()
                    .scan(0, |param, shape| {
                        let names = params[*param..*param + shape.width()].join(" ");
                        *param += shape.width();
                        Some(match shape {
                            Shape::Single => names,
                            Shape::Optional(_) => format!("[{}]", names),
                            Shape::Many(_) => format!("{{{}}}", names),
                        })
                    })
                    .collect::<Vec<_>>()
            }
            _ => body.iter().map(|s| self.name(*s)).collect(),
        };

        let mut rendered = names;
        rendered.insert(dot.min(rendered.len()), "•".to_string());
        let rendered = format!("{} := {}", self.name(*head), rendered.join(" "));

        match self.helper(*head) {
            Some(Helper { origin, .. }) => {
                let rule = &self.rules[origin.rule];
                format!(
                    "{} (in rule `{}`, element `{}`)",
                    rendered, rule.tag, rule.params[origin.element]
                )
            }
            None => rendered,
        }
    }
}

/// Looks up the symbols of declared names while lowering rules.
#[derive(Debug, Default)]
pub(crate) struct SymbolTable {
    pub(crate) tags: HashMap<String, Symbol>,
    pub(crate) keywords: HashMap<String, Symbol>,
}
