pub use self::{
    conflict::{Conflict, ConflictKind},
    error::{ParseResult, SyntaxError},
    recovery::{Decision, ErrorContext, ErrorHandler, Synthetic},
    table::{Action, ParseTable},
    value::{Arg, Args, Handler, Slot, Token},
};

use self::driver::Run;
use crate::{cfsm::Cfsm, config::ParserConfig, grammar::Grammar, tags, GrammarBuilder, Symbol};
use sprig_lexer::Lexer;
use std::fmt;

mod conflict;
mod driver;
mod error;
mod recovery;
mod table;
mod value;

/// Canonical LR(1) parser with the lexer of its tokens.
///
/// A parser is immutable once it is built, any amount of parses can share it.
pub struct Parser<V> {
    grammar: Grammar,
    cfsm: Cfsm,
    table: ParseTable,
    lexer: Lexer<Symbol>,
    /// Indexed by rule.
    handlers: Vec<Handler<V>>,
    /// Indexed by rule.
    error_handlers: Vec<Option<ErrorHandler<V>>>,
    config: ParserConfig,
}

impl<V> fmt::Debug for Parser<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("grammar", &self.grammar)
            .field("states", &self.table.len())
            .field("lexer", &self.lexer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<V> Parser<V> {
    pub(crate) fn new(
        grammar: Grammar,
        cfsm: Cfsm,
        table: ParseTable,
        lexer: Lexer<Symbol>,
        handlers: Vec<Handler<V>>,
        error_handlers: Vec<Option<ErrorHandler<V>>>,
        config: ParserConfig,
    ) -> Self {
        Self {
            grammar,
            cfsm,
            table,
            lexer,
            handlers,
            error_handlers,
            config,
        }
    }

    pub fn builder() -> GrammarBuilder<V> {
        GrammarBuilder::new()
    }

    pub fn parse(&self, input: &str) -> ParseResult<V> {
        self.parse_tokens(self.lexer.tokenize(input))
    }

    pub fn parse_chars(&self, input: impl Iterator<Item = char>) -> ParseResult<V> {
        self.parse_tokens(self.lexer.tokenize_chars(input))
    }

    /// Parses tokens that were produced elsewhere. The end of input is appended after the last
    /// token.
    pub fn parse_tokens(&self, tokens: impl IntoIterator<Item = Token>) -> ParseResult<V> {
        Run::new(self).run(tokens.into_iter())
    }

    /// Tag `text` is classified as when it is read as a single token.
    pub fn single_analyze(&self, text: &str) -> Option<&str> {
        self.lexer
            .single_analyze(text)
            .map(|symbol| self.grammar.terminal_tag(symbol))
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Renders the automaton of the parser in graphviz dot format.
    pub fn to_dot(&self) -> String {
        self.cfsm.to_dot(&self.grammar)
    }

    /// Tag a token is reported as.
    pub(crate) fn tag_of(&self, token: &Token) -> &str {
        match token.kind {
            Some(symbol) => self.grammar.terminal_tag(symbol),
            None => tags::UNDEFINED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Decision, Parser, Slot, SyntaxError, Synthetic};
    use crate::{tags, Element, GrammarBuilder, ParserConfig};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// stmts := {stmt}
    /// stmt := id ("=" | ":=") value ";"
    /// value := num | "[" num "]" | atom
    /// atom := "#" num
    fn statements() -> GrammarBuilder<String> {
        GrammarBuilder::new()
            .token("id", "[a-z]+")
            .token("num", "[0-9]+")
            .discard(r"\s+")
            .rule("stmts", [Element::tag("stmt").many()], |args| {
                args.values(0).join(" ")
            })
            .rule(
                "stmt",
                [
                    Element::tag("id"),
                    Element::keywords(["=", ":="]),
                    Element::tag("value"),
                    Element::keyword(";"),
                ],
                |args| {
                    let value = args.value(2).unwrap();
                    format!("{}={}", args.text(0).unwrap(), value)
                },
            )
            .with_error_handler(|ctx| match (ctx.dot(), ctx.text()) {
                (3, _) if ctx.is_eof() => Decision::PerformBefore(ctx.keyword(";")),
                (2, "=") => Decision::Skip,
                (1, ":") => Decision::PerformInstead(ctx.keyword("=")),
                (1, "!") => Decision::PerformInstead(ctx.synthetic("bang", "!")),
                _ => Decision::NextHandler,
            })
            .rule("value", [Element::tag("num")], |args| {
                args.text(0).unwrap().to_string()
            })
            .rule(
                "value",
                [
                    Element::keyword("["),
                    Element::tag("num"),
                    Element::keyword("]"),
                ],
                |args| format!("[{}]", args.text(1).unwrap()),
            )
            .with_error_handler(|ctx| match (ctx.dot(), ctx.popped()) {
                (2, [_, Slot::Token(num)]) if ctx.is_eof() => {
                    Decision::FoldAndReraise(format!("[{}?", num.source))
                }
                _ => Decision::Stop,
            })
            .rule("value", [Element::tag("atom")], |args| {
                format!("<{}>", args.value(0).unwrap())
            })
            .rule("atom", [Element::keyword("#"), Element::tag("num")], |args| {
                let num = args.text(1).unwrap().to_string();
                match num.as_str() {
                    "0" => args.retag("nothing"),
                    "1" => (),
                    _ => args.retag("value"),
                }
                format!("#{}", num)
            })
            .start("stmts")
    }

    fn error(tag: &str, text: &str, line: usize, column: usize) -> SyntaxError {
        SyntaxError {
            tag: tag.to_string(),
            text: text.to_string(),
            line,
            column,
        }
    }

    #[test]
    fn statements_in_order() {
        init();
        let parser = statements().build().unwrap();

        assert_eq!(parser.parse(""), Ok(String::new()));
        assert_eq!(
            parser.parse("x = 1; y := [2];\nz = 3;"),
            Ok("x=1 y=[2] z=3".to_string())
        );
        assert_eq!(
            parser.parse_chars("x = 1;".chars()),
            parser.parse("x = 1;")
        );
    }

    #[test]
    fn retagged_folds() {
        let parser = statements().build().unwrap();

        assert_eq!(parser.parse("x = #1;"), Ok("x=<#1>".to_string()));
        assert_eq!(parser.parse("x = #5;"), Ok("x=#5".to_string()));
        assert_eq!(
            parser.parse("x = #0;"),
            Err(error(tags::UNKNOWN, "nothing", 1, 7))
        );
    }

    #[test]
    fn recovery() {
        init();
        let parser = statements().build().unwrap();

        // missing `;`
        assert_eq!(parser.parse("x = 1"), parser.parse("x = 1;"));
        // duplicated `=`
        assert_eq!(parser.parse("x = = 1; y = 2;"), Ok("x=1 y=2".to_string()));
        // `:` is not a token of the grammar
        assert_eq!(parser.parse("x : 1;"), Ok("x=1".to_string()));
        // the unclosed bracket folds and leaves the rest to the statement
        assert_eq!(parser.parse("x = [1"), Ok("x=[1?".to_string()));
    }

    /// stmt := id "=" value ";"
    /// value := num | num "%"
    fn percentages() -> GrammarBuilder<String> {
        GrammarBuilder::new()
            .token("id", "[a-z]+")
            .token("num", "[0-9]+")
            .discard(r"\s+")
            .rule(
                "stmt",
                [
                    Element::tag("id"),
                    Element::keyword("="),
                    Element::tag("value"),
                    Element::keyword(";"),
                ],
                |args| {
                    let value = args.value(2).unwrap();
                    format!("{}={}", args.text(0).unwrap(), value)
                },
            )
            .with_error_handler(|ctx| match ctx.dot() {
                3 => Decision::Skip,
                _ => Decision::NextHandler,
            })
            .rule("value", [Element::tag("num")], |args| {
                args.text(0).unwrap().to_string()
            })
            .rule(
                "value",
                [Element::tag("num"), Element::keyword("%")],
                |args| format!("{}%", args.text(0).unwrap()),
            )
            .start("stmt")
    }

    #[test]
    fn folds_towards_handlers() {
        init();
        let parser = percentages().build().unwrap();

        assert_eq!(parser.parse("x = 1 % ;"), Ok("x=1%".to_string()));
        assert_eq!(parser.parse("x = 1 % @ ;"), Ok("x=1%".to_string()));
        // `1` folds although it could still take a `%`, then both tokens are skipped
        assert_eq!(parser.parse("x = 1 @ ;"), Ok("x=1".to_string()));
        assert_eq!(parser.parse("x = 1 @ % ;"), Ok("x=1".to_string()));
        // the handler passes at the id, nothing else is tried
        assert_eq!(
            parser.parse("x @ = 1;"),
            Err(error(tags::UNDEFINED, "@", 1, 3))
        );
    }

    #[test]
    fn syntax_errors() {
        let parser = statements().build().unwrap();

        assert_eq!(parser.parse("x 1;"), Err(error("num", "1", 1, 3)));
        assert_eq!(parser.parse("x =\n"), Err(error(tags::EOF, "", 1, 4)));
        assert_eq!(
            parser.parse("x = 1;\n y"),
            Err(error(tags::EOF, "", 2, 3))
        );
        assert_eq!(
            parser.parse("x ! 1;"),
            Err(error(tags::UNKNOWN, "!", 1, 3))
        );
        assert_eq!(
            parser.parse("x = 1; ;"),
            Err(error(tags::KEYWORD, ";", 1, 8))
        );
        assert_eq!(
            parser.parse("x = 1;").map_err(|e| e.to_string()),
            Ok("x=1".to_string())
        );
        assert_eq!(
            parser.parse("x 1;").unwrap_err().to_string(),
            "[ERROR] (1, 3): unexpected num \"1\""
        );
    }

    #[test]
    fn recovery_depth() {
        let parser = statements()
            .with_config(ParserConfig {
                max_recovery_depth: 0,
                ..ParserConfig::default()
            })
            .build()
            .unwrap();

        assert_eq!(parser.parse("x = 1"), Err(error(tags::EOF, "", 1, 6)));
    }

    #[test]
    fn analyze() {
        let parser: Parser<String> = statements().fictive("bang", "!+").build().unwrap();

        assert_eq!(parser.single_analyze("abc"), Some("id"));
        assert_eq!(parser.single_analyze("42"), Some("num"));
        assert_eq!(parser.single_analyze(":="), Some(tags::KEYWORD));
        assert_eq!(parser.single_analyze("!!"), Some("bang"));
        assert_eq!(parser.single_analyze("  "), None);
        assert_eq!(parser.single_analyze("a1"), None);
        assert!(parser.to_dot().starts_with("digraph cfsm {"));

        // made up tokens of fictive tags are parsed, `bang` is not expected after an id
        assert_eq!(
            parser.parse("x ! 1;"),
            Err(error("bang", "!", 1, 3))
        );
        assert_eq!(Synthetic::keyword(";").tag, tags::KEYWORD);
    }
}
