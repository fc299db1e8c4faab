use proptest::prelude::*;
use sprig::{
    tags, Args, Assoc, BuildError, ConflictKind, Decision, DeclarationError, Element, Engine, Fix,
    GrammarBuilder,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Engine reading a single `value` token.
fn single(pattern: &str) -> Engine<String> {
    Engine::new(
        GrammarBuilder::new()
            .token("value", pattern)
            .rule("start", [Element::tag("value")], |args| {
                args.text(0).unwrap_or_default().to_string()
            })
            .start("start"),
    )
    .unwrap()
}

fn sums() -> GrammarBuilder<String> {
    GrammarBuilder::new()
        .token("id", "[a-z]+")
        .discard(r"\s+")
        .rule("e", [Element::tag("id")], |args| {
            args.text(0).unwrap_or_default().to_string()
        })
        .binary("e", "+", 1, Assoc::Left, |args| {
            format!(
                "({}+{})",
                args.value(0).unwrap_or_default(),
                args.value(2).unwrap_or_default()
            )
        })
        .start("e")
}

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
                Element::keyword("="),
                Element::tag("num"),
                Element::keyword(";"),
            ],
            |args| {
                format!(
                    "{}={}",
                    args.text(0).unwrap_or_default(),
                    args.text(2).unwrap_or_default()
                )
            },
        )
        .with_error_handler(|ctx| match (ctx.dot(), ctx.text()) {
            (3, _) if ctx.is_eof() => Decision::PerformBefore(ctx.keyword(";")),
            (2, "=") => Decision::Skip,
            (1, ":") => Decision::PerformInstead(ctx.keyword("=")),
            _ => Decision::Stop,
        })
        .start("stmts")
}

/// Text of a token argument or the value of a folded one.
fn text(args: &mut Args<String>, index: usize) -> String {
    match args.text(index) {
        Some(text) => text.to_string(),
        None => args.value(index).unwrap_or_default(),
    }
}

/// Statements assigning sums and products, closed at the end of the input when `;` is missing.
fn assignments() -> GrammarBuilder<String> {
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
                Element::keyword("="),
                Element::tag("expr"),
                Element::keyword(";"),
            ],
            |args| format!("{}={}", text(args, 0), text(args, 2)),
        )
        .with_error_handler(|ctx| match ctx.dot() {
            3 if ctx.is_eof() => Decision::PerformBefore(ctx.keyword(";")),
            _ => Decision::Stop,
        })
        .rule("expr", [Element::tag("num")], |args| text(args, 0))
        .rule(
            "expr",
            [
                Element::keyword("("),
                Element::tag("expr"),
                Element::keyword(")"),
            ],
            |args| text(args, 1),
        )
        .binary("expr", "+", 1, Assoc::Left, |args| {
            format!("({}+{})", text(args, 0), text(args, 2))
        })
        .binary("expr", "*", 2, Assoc::Left, |args| {
            format!("({}*{})", text(args, 0), text(args, 2))
        })
        .start("stmts")
}

/// Identifiers with a binary `+`, a prefix `-` and the suffixes `!` above and `?` below both.
fn suffixes() -> GrammarBuilder<String> {
    GrammarBuilder::new()
        .token("id", "[a-z]+")
        .discard(r"\s+")
        .rule("e", [Element::tag("id")], |args| text(args, 0))
        .binary("e", "+", 2, Assoc::Left, |args| {
            format!("({}+{})", text(args, 0), text(args, 2))
        })
        .unary("e", "-", 3, Fix::Prefix, |args| format!("(-{})", text(args, 1)))
        .unary("e", "!", 4, Fix::Suffix, |args| format!("({}!)", text(args, 0)))
        .unary("e", "?", 1, Fix::Suffix, |args| format!("({}?)", text(args, 0)))
        .start("e")
}

#[test]
fn decimal_literals() {
    init();
    let engine = single("[1-9][0-9]*|0");

    assert_eq!(engine.single_analyze("0"), Some("value"));
    assert_eq!(engine.single_analyze("109"), Some("value"));
    assert_eq!(engine.single_analyze("00"), None);
    assert_eq!(engine.single_analyze("09"), None);
    assert_eq!(engine.parse("109"), Ok("109".to_string()));
    assert!(engine.parse("09").is_err());
}

#[test]
fn bounded_repetition() {
    let engine = single("x{3,4}");

    assert_eq!(engine.single_analyze("xx"), None);
    assert_eq!(engine.single_analyze("xxx"), Some("value"));
    assert_eq!(engine.single_analyze("xxxx"), Some("value"));
    assert_eq!(engine.single_analyze("xxxxx"), None);
}

#[test]
fn left_associative_sums() {
    init();
    let engine = Engine::new(sums()).unwrap();

    assert_eq!(engine.parse("a+b+c"), Ok("((a+b)+c)".to_string()));
    assert_eq!(engine.parse("a + b + c + d"), Ok("(((a+b)+c)+d)".to_string()));
}

#[test]
fn sign_declared_twice() {
    let error = Engine::new(sums().binary("e", "+", 2, Assoc::Left, |_| String::new()));

    assert!(matches!(
        error,
        Err(BuildError::Declaration(DeclarationError::DuplicateSign { ref sign, .. }))
            if sign == "+"
    ));
}

#[test]
fn ambiguous_sums() {
    let error = Engine::new(
        GrammarBuilder::new()
            .token("id", "[a-z]+")
            .rule("e", [Element::tag("id")], |_| ())
            .rule(
                "e",
                [Element::tag("e"), Element::keyword("+"), Element::tag("e")],
                |_| (),
            )
            .start("e"),
    );

    match error {
        Err(BuildError::Conflict(conflict)) => {
            assert_eq!(conflict.kind, ConflictKind::ShiftFold);
            assert_eq!(conflict.lookahead, "\"+\"");
        }
        other => panic!("expected a conflict, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn empty_and_filled_blocks() {
    init();
    let engine = Engine::new(
        GrammarBuilder::new()
            .token("id", "[a-z]+")
            .discard(r"\s+")
            .rule(
                "block",
                [
                    Element::keyword("{"),
                    Element::tag("stmt").many(),
                    Element::keyword("}"),
                ],
                |args| args.values(1).concat(),
            )
            .rule("stmt", [Element::tag("id"), Element::keyword(";")], |args| {
                vec![args.text(0).unwrap_or_default().to_string()]
            })
            .start("block"),
    )
    .unwrap();

    assert_eq!(engine.parse("{}"), Ok(Vec::<String>::new()));
    assert_eq!(
        engine.parse("{ x; y; }"),
        Ok(vec!["x".to_string(), "y".to_string()])
    );
}

#[test]
fn missing_semicolon() {
    init();
    let engine = Engine::new(statements()).unwrap();

    assert_eq!(engine.parse("x = 1"), Ok("x=1".to_string()));
    assert_eq!(engine.parse("x = 1"), engine.parse("x = 1;"));
    assert_eq!(engine.parse("x = 1; y = 2"), engine.parse("x = 1; y = 2;"));
}

#[test]
fn skipped_and_replaced_tokens() {
    init();
    let engine = Engine::new(statements()).unwrap();

    assert_eq!(engine.parse("x = = 1;"), engine.parse("x = 1;"));
    assert_eq!(engine.parse("x : 1; y = 2;"), engine.parse("x = 1; y = 2;"));

    let error = engine.parse("x = ;").unwrap_err();
    assert_eq!(
        (error.tag.as_str(), error.text.as_str(), error.line, error.column),
        (tags::KEYWORD, ";", 1, 5)
    );
}

#[test]
fn missing_semicolon_after_operators() {
    init();
    let engine = Engine::new(assignments()).unwrap();

    assert_eq!(engine.parse("x = 1 + 2"), Ok("x=(1+2)".to_string()));
    assert_eq!(engine.parse("x = 1 + 2"), engine.parse("x = 1 + 2;"));
    assert_eq!(engine.parse("x = 1 * 2"), engine.parse("x = 1 * 2;"));
    assert_eq!(engine.parse("x = 1 + 2 * 3"), Ok("x=(1+(2*3))".to_string()));
    assert_eq!(
        engine.parse("x = 1 * 2; y = (3 + 4)"),
        Ok("x=(1*2) y=(3+4)".to_string())
    );

    // an unclosed parenthesis has no handler of its own
    let error = engine.parse("x = (1 + 2").unwrap_err();
    assert_eq!((error.tag.as_str(), error.column), (tags::EOF, 11));
}

#[test]
fn unclosed_parentheses() {
    let engine = Engine::new(
        GrammarBuilder::new()
            .token("num", "[0-9]+")
            .rule("expr", [Element::tag("num")], |args| text(args, 0))
            .rule(
                "expr",
                [
                    Element::keyword("("),
                    Element::tag("expr"),
                    Element::keyword(")"),
                ],
                |args| format!("[{}]", text(args, 1)),
            )
            .with_error_handler(|ctx| match ctx.dot() {
                2 if ctx.is_eof() => Decision::PerformBefore(ctx.keyword(")")),
                _ => Decision::Stop,
            })
            .binary("expr", "+", 1, Assoc::Left, |args| {
                format!("{}+{}", text(args, 0), text(args, 2))
            })
            .binary("expr", "*", 2, Assoc::Left, |args| {
                format!("{}*{}", text(args, 0), text(args, 2))
            })
            .start("expr"),
    )
    .unwrap();

    assert_eq!(engine.parse("(1+2"), Ok("[1+2]".to_string()));
    assert_eq!(engine.parse("(1*2"), engine.parse("(1*2)"));
    assert_eq!(engine.parse("((3+4)*2"), Ok("[[3+4]*2]".to_string()));
    assert_eq!(engine.parse("((3"), Ok("[[3]]".to_string()));
}

#[test]
fn suffix_operators() {
    init();
    let engine = Engine::new(suffixes()).unwrap();

    assert_eq!(engine.parse("a + b !"), Ok("(a+(b!))".to_string()));
    assert_eq!(engine.parse("a + b ?"), Ok("((a+b)?)".to_string()));
    assert_eq!(engine.parse("a ! + b"), Ok("((a!)+b)".to_string()));
    assert_eq!(engine.parse("- a !"), Ok("(-(a!))".to_string()));
    assert_eq!(engine.parse("- a ?"), Ok("((-a)?)".to_string()));
    assert_eq!(engine.parse("a ? ? !"), Ok("(((a?)?)!)".to_string()));
    assert!(engine.parse("a !-").is_err());
}

/// Tokens of a nested expression over `+`, `*` and parentheses.
fn expression() -> impl Strategy<Value = Vec<String>> {
    let leaf = "[a-z]{1,4}".prop_map(|id| vec![id]);

    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|tokens| {
                let mut parenthesized = vec!["(".to_string()];
                parenthesized.extend(tokens);
                parenthesized.push(")".to_string());
                parenthesized
            }),
            (inner.clone(), prop_oneof![Just("+"), Just("*")], inner).prop_map(
                |(mut left, sign, right)| {
                    left.push(sign.to_string());
                    left.extend(right);
                    left
                }
            ),
        ]
    })
}

proptest! {
    #[test]
    fn nested_round_trip(
        tokens in expression(),
        gaps in prop::collection::vec("[ \t\n]{0,2}", 1..8)
    ) {
        let engine = Engine::new(
            GrammarBuilder::new()
                .token("id", "[a-z]+")
                .discard(r"\s+")
                .rule("e", [Element::tag("id")], |args| text(args, 0))
                .rule(
                    "e",
                    [
                        Element::keyword("("),
                        Element::tag("e"),
                        Element::keyword(")"),
                    ],
                    |args| format!("({})", text(args, 1)),
                )
                .binary("e", "+", 1, Assoc::Left, |args| {
                    format!("{}+{}", text(args, 0), text(args, 2))
                })
                .binary("e", "*", 2, Assoc::Left, |args| {
                    format!("{}*{}", text(args, 0), text(args, 2))
                })
                .start("e"),
        )
        .unwrap();

        let input = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| format!("{}{}", gaps[i % gaps.len()], token))
            .collect::<String>();
        prop_assert_eq!(engine.parse(&input), Ok(tokens.concat()));
    }

    #[test]
    fn words_round_trip(words in prop::collection::vec("[a-z]{1,6}", 0..8), gap in "[ \t\n]{1,3}") {
        let engine = Engine::new(
            GrammarBuilder::new()
                .token("word", "[a-z]+")
                .discard(r"\s+")
                .rule("text", [Element::tag("word").many()], |args| {
                    args.list(0)
                        .iter()
                        .filter_map(|arg| arg.text())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .start("text"),
        )
        .unwrap();

        let input = words.join(&gap);
        prop_assert_eq!(engine.parse(&input), Ok(words.join(" ")));
    }
}
